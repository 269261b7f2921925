//! Room summaries returned by the HTTP API.

use {
    crate::RoomId,
    serde::{Deserialize, Serialize},
};

/// Point-in-time summary of a single auction room.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct RoomStatus {
    pub id: RoomId,
    pub name: String,
    /// Whether an auction is currently running.
    pub active: bool,
    /// Highest accepted bid of the running auction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_bid: Option<u64>,
    /// Seconds left on the running auction's countdown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_remaining: Option<u64>,
    pub participants: usize,
    /// Listings waiting behind the running auction.
    pub queue_length: usize,
}
