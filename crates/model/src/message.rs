//! The websocket protocol spoken between auction rooms and connected
//! players.
//!
//! Every frame is a JSON object tagged with a `type` field. Inbound frames
//! ([`ClientMessage`]) are commands from a player, outbound frames
//! ([`ServerMessage`]) are events broadcast by a room or replies addressed to
//! a single player.

use {
    crate::{Card, UserId, auction::AuctionItem},
    serde::{Deserialize, Serialize},
};

/// A frame sent by a connected player.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Bid on the item currently up for auction in this room.
    Bid { amount: u64 },
    /// Ask for a fresh snapshot of the room state.
    Status,
    /// Connection keep-alive. Answered with [`ServerMessage::Pong`].
    Ping,
}

/// A frame sent by the server to one or all players in a room.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Full snapshot of the room, sent on connect and on request.
    AuctionState {
        item: Option<AuctionItem>,
        current_bid: u64,
        current_winner: Option<UserId>,
        time_remaining: u64,
        active: bool,
        queue_length: usize,
    },
    /// A new item went up for auction.
    AuctionStarted {
        item: AuctionItem,
        time_remaining: u64,
    },
    /// A bid was accepted.
    NewBid {
        bidder: UserId,
        amount: u64,
        time_remaining: u64,
    },
    /// Periodic countdown notification.
    TimerUpdate { time_remaining: u64 },
    /// A late bid pushed the countdown back up.
    TimerExtended { new_time: u64 },
    /// A bid met the buyout price and ended the auction on the spot.
    Buyout { bidder: UserId, amount: u64 },
    /// The auction settled: coins and card changed hands.
    AuctionSettled {
        winner: UserId,
        seller: UserId,
        amount: u64,
        card: Card,
    },
    /// The auction ended without a sale.
    AuctionFailed { reason: String },
    /// The auction had a winner but settlement did not go through.
    AuctionSettlementFailed {
        reason: String,
        winner: UserId,
        seller: UserId,
        amount: u64,
    },
    /// The room has no more items queued.
    RoomIdle,
    /// A bid was rejected. Sent only to the player who placed it.
    BidError { error: String },
    /// A player joined the room.
    UserJoined { user: UserId, participants: usize },
    /// A player left the room.
    UserLeft { user: UserId, participants: usize },
    /// Reply to [`ClientMessage::Ping`].
    Pong,
}

#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    #[test]
    fn deserializes_client_messages() {
        assert_eq!(
            serde_json::from_value::<ClientMessage>(json!({
                "type": "bid",
                "amount": 50,
            }))
            .unwrap(),
            ClientMessage::Bid { amount: 50 },
        );
        assert_eq!(
            serde_json::from_value::<ClientMessage>(json!({ "type": "status" })).unwrap(),
            ClientMessage::Status,
        );
        assert_eq!(
            serde_json::from_value::<ClientMessage>(json!({ "type": "ping" })).unwrap(),
            ClientMessage::Ping,
        );
    }

    #[test]
    fn rejects_unknown_client_message() {
        assert!(serde_json::from_value::<ClientMessage>(json!({ "type": "dance" })).is_err());
        assert!(serde_json::from_value::<ClientMessage>(json!({ "type": "bid" })).is_err());
    }

    #[test]
    fn serializes_broadcasts_as_expected() {
        let message = ServerMessage::NewBid {
            bidder: "bidder_1".into(),
            amount: 15,
            time_remaining: 25,
        };
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({
                "type": "new_bid",
                "bidder": "bidder_1",
                "amount": 15,
                "time_remaining": 25,
            }),
        );

        let message = ServerMessage::AuctionSettled {
            winner: "bidder_2".into(),
            seller: "seller".into(),
            amount: 100,
            card: Card::new("Ancient Dragon", "legendary"),
        };
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({
                "type": "auction_settled",
                "winner": "bidder_2",
                "seller": "seller",
                "amount": 100,
                "card": {
                    "name": "Ancient Dragon",
                    "rarity": "legendary",
                },
            }),
        );

        assert_eq!(
            serde_json::to_value(ServerMessage::RoomIdle).unwrap(),
            json!({ "type": "room_idle" }),
        );
    }

    #[test]
    fn snapshot_of_idle_room_has_no_item() {
        let message = ServerMessage::AuctionState {
            item: None,
            current_bid: 0,
            current_winner: None,
            time_remaining: 0,
            active: false,
            queue_length: 0,
        };
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({
                "type": "auction_state",
                "item": null,
                "current_bid": 0,
                "current_winner": null,
                "time_remaining": 0,
                "active": false,
                "queue_length": 0,
            }),
        );
    }
}
