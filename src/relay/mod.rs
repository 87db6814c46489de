//! Relay module - packet-loss gate and envelope router

mod gate;
mod router;

pub use gate::PacketLossGate;
pub use router::{Route, Router};
