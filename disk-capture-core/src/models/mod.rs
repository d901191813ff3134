pub mod config;
pub mod error;
pub mod report;
pub mod state;
