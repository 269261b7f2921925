//! Types describing a single auction listing and its bid history.

use {
    crate::{Card, UserId},
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
};

/// An item put up for sale together with the rules of its auction.
///
/// Listings are immutable once created. All mutable auction state (current
/// bid, remaining time) lives with the room that runs the auction.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct AuctionItem {
    pub card: Card,
    pub seller: UserId,
    /// Price the bidding opens at, in coins.
    pub starting_bid: u64,
    /// Price at which the auction ends immediately, in coins.
    pub buyout: u64,
    /// Countdown duration in seconds once the item goes live.
    pub time_limit: u64,
}

impl AuctionItem {
    pub fn new(
        card: Card,
        seller: UserId,
        starting_bid: u64,
        buyout: u64,
        time_limit: u64,
    ) -> Result<Self, InvalidAuctionItem> {
        if starting_bid == 0 {
            return Err(InvalidAuctionItem::StartingBidZero);
        }
        if buyout < starting_bid {
            return Err(InvalidAuctionItem::BuyoutBelowStartingBid);
        }
        if time_limit == 0 {
            return Err(InvalidAuctionItem::TimeLimitZero);
        }
        Ok(Self {
            card,
            seller,
            starting_bid,
            buyout,
            time_limit,
        })
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum InvalidAuctionItem {
    #[error("starting bid must be greater than zero")]
    StartingBidZero,
    #[error("buyout price must not be below the starting bid")]
    BuyoutBelowStartingBid,
    #[error("time limit must be greater than zero")]
    TimeLimitZero,
}

/// An accepted bid as recorded in a room's per-auction history.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct BidRecord {
    pub bidder: UserId,
    pub amount: u64,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    fn card() -> Card {
        Card::new("Ancient Dragon", "legendary")
    }

    #[test]
    fn accepts_valid_listing() {
        let item = AuctionItem::new(card(), "seller".into(), 10, 100, 30).unwrap();
        assert_eq!(item.starting_bid, 10);
        assert_eq!(item.buyout, 100);
        assert_eq!(item.time_limit, 30);
    }

    #[test]
    fn buyout_may_equal_starting_bid() {
        assert!(AuctionItem::new(card(), "seller".into(), 10, 10, 30).is_ok());
    }

    #[test]
    fn rejects_invalid_listings() {
        assert_eq!(
            AuctionItem::new(card(), "seller".into(), 0, 100, 30),
            Err(InvalidAuctionItem::StartingBidZero),
        );
        assert_eq!(
            AuctionItem::new(card(), "seller".into(), 10, 9, 30),
            Err(InvalidAuctionItem::BuyoutBelowStartingBid),
        );
        assert_eq!(
            AuctionItem::new(card(), "seller".into(), 10, 100, 0),
            Err(InvalidAuctionItem::TimeLimitZero),
        );
    }

    #[test]
    fn serializes_as_expected() {
        let item = AuctionItem::new(card(), "seller".into(), 10, 100, 30).unwrap();
        let expected = json!({
            "card": {
                "name": "Ancient Dragon",
                "rarity": "legendary",
            },
            "seller": "seller",
            "starting_bid": 10,
            "buyout": 100,
            "time_limit": 30,
        });
        assert_eq!(serde_json::to_value(&item).unwrap(), expected);
        assert_eq!(
            serde_json::from_value::<AuctionItem>(expected).unwrap(),
            item
        );
    }
}
