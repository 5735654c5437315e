pub mod clock;
pub mod lead_sink;
pub mod lock_store;
pub mod session_reporter;
pub mod source_collector;
