//! Wire types for the deployment service

pub mod config;
pub mod event;
pub mod status;
