pub mod classify;
pub mod dedup;
pub mod normalize;
pub mod run_coordinator;
pub mod scoring;
pub mod summarize;
