//! API Routes

pub mod alarm;
pub mod config;
pub mod monitor;
