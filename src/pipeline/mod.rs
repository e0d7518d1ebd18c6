// Pipelines that run classification over batches of posts.
//
// extract: clean, classify, score, and summarize a batch (pure, synchronous)
// store: best-effort persistence of the results (async, never fails)

pub mod extract;
pub mod store;
