//! Cluster Deploy Console Library
//!
//! Client-side modules for the cluster deployment admin console.

pub mod app;
pub mod errors;
pub mod http;
pub mod logs;
pub mod models;
pub mod monitor;
pub mod stream;
pub mod workers;
