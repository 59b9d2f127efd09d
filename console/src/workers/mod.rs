//! Worker loops

pub mod log_stream;
