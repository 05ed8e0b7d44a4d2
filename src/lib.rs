//! tabula - Command-script front end for the tabula sheet.

pub mod config;
pub mod error;
pub mod script;
