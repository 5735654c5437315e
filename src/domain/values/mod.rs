pub mod classification;
pub mod intent;
pub mod priority;
pub mod raw_candidate;
pub mod run_status;
pub mod score;
pub mod source_kind;
