pub mod config;
pub mod modes;
pub mod transform;
