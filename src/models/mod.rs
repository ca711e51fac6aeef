mod ack;
mod food;
mod order;

pub use ack::*;
pub use food::*;
pub use order::*;
