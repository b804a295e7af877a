pub mod file_formats;
pub mod parameter;
pub mod query;
pub mod sample;
pub mod user;
