pub mod records_file;
pub mod reddit;
