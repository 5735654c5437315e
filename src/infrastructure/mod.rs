pub mod collectors;
pub mod export;
pub mod lock;
pub mod reporters;
pub mod sqlite;
