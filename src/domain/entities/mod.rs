pub mod lead;
pub mod run_session;
