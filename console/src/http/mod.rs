//! HTTP module

pub mod client;
pub mod deployment;
