pub mod capture_callback;
pub mod context;
pub mod controller;
pub mod disk_writer;
