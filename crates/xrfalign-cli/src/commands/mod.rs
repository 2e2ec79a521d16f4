pub mod align;
pub mod com;
pub mod config;
pub mod info;
