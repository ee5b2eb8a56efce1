//! Adaptive exercise selection: complexity estimation, multi-factor scoring,
//! exploration/exploitation and the post-submission learner update.

pub mod complexity;
pub mod config;
pub mod engine;
pub mod scoring;
pub mod selector;
pub mod strategy;
pub mod types;
pub mod update;
