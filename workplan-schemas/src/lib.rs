pub mod command;
pub mod file_formats;
pub mod step;
