//! HTTP entry points split out of main.rs: health check and server wiring.

mod health;
mod server;

pub use health::*;
pub use server::*;
