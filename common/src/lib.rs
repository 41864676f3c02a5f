pub mod codec;
pub mod protocol;
pub mod simulation;

pub use protocol::*;
