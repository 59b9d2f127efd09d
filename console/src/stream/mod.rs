//! Push-channel module

pub mod sse;
pub mod transport;
