//! Live auction service of the trading card game backend.
//!
//! The service runs a fixed pool of auction rooms. Sellers list cards over
//! REST, the house routes each listing to the room with the shortest queue,
//! and connected players follow and bid on the running auction of a room
//! over a websocket. Completed auctions settle against the game's money and
//! card ledger.

pub mod arguments;
pub mod domain;
pub mod infra;
mod run;

pub use run::run;
