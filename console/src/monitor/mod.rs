//! Log-stream completion monitor

pub mod completion;
pub mod fsm;
pub mod sink;
pub mod source;
