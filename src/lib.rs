// coastwatch: rule-based ocean hazard classification for social posts
//
// This is the library root. Each module corresponds to one stage of the
// classification and reporting flow.

pub mod classify;
pub mod config;
pub mod db;
pub mod output;
pub mod pipeline;
pub mod status;

#[cfg(feature = "web")]
pub mod web;
