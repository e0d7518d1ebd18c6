pub mod classify;
pub mod extract;
pub mod posts;
pub mod rules;
pub mod stats;
