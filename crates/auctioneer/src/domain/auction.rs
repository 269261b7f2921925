//! State of a single running auction.

use {
    chrono::Utc,
    model::{
        UserId,
        auction::{AuctionItem, BidRecord},
    },
};

/// The auction currently running in a room: the immutable listing plus the
/// mutable bid and timer state.
#[derive(Debug)]
pub struct ActiveAuction {
    pub item: AuctionItem,
    /// Highest accepted bid, or the starting bid while nobody has bid yet.
    pub current_bid: u64,
    /// Bidder holding the highest bid. `None` until the first bid lands.
    pub winner: Option<UserId>,
    /// Seconds left on the countdown.
    pub time_remaining: u64,
    /// Accepted bids, oldest first. Dropped with the rest of this state when
    /// the auction closes.
    pub history: Vec<BidRecord>,
}

impl ActiveAuction {
    pub fn new(item: AuctionItem) -> Self {
        Self {
            current_bid: item.starting_bid,
            winner: None,
            time_remaining: item.time_limit,
            history: Vec::new(),
            item,
        }
    }

    /// Records an accepted regular bid.
    pub fn record_bid(&mut self, bidder: UserId, amount: u64) {
        self.current_bid = amount;
        self.winner = Some(bidder.clone());
        self.history.push(BidRecord {
            bidder,
            amount,
            timestamp: Utc::now(),
        });
    }

    /// Applies a buyout: the price clamps to the buyout price and the bidder
    /// wins on the spot, regardless of how much they offered.
    pub fn buy_out(&mut self, bidder: UserId) {
        self.current_bid = self.item.buyout;
        self.winner = Some(bidder);
    }

    /// Freezes the auction at its current state for settlement.
    pub fn close(self) -> ClosedAuction {
        ClosedAuction {
            amount: self.current_bid,
            winner: self.winner,
            bids: self.history.len(),
            item: self.item,
        }
    }
}

/// Snapshot of a finished auction. Settlement operates exclusively on this
/// data, leaving the room free to run its next auction.
#[derive(Clone, Debug)]
pub struct ClosedAuction {
    pub item: AuctionItem,
    /// Highest bidder, `None` when the auction expired without bids.
    pub winner: Option<UserId>,
    /// Final price. The highest bid, clamped to the buyout price when the
    /// auction ended by buyout.
    pub amount: u64,
    /// How many regular bids were accepted over the auction's lifetime.
    pub bids: usize,
}

#[cfg(test)]
mod tests {
    use {super::*, model::Card};

    fn auction() -> ActiveAuction {
        ActiveAuction::new(
            AuctionItem::new(Card::new("Goblin", "common"), "seller".into(), 10, 100, 30).unwrap(),
        )
    }

    #[test]
    fn starts_at_the_starting_bid() {
        let auction = auction();
        assert_eq!(auction.current_bid, 10);
        assert_eq!(auction.winner, None);
        assert_eq!(auction.time_remaining, 30);
    }

    #[test]
    fn bids_accumulate_in_order() {
        let mut auction = auction();
        auction.record_bid("bidder_1".into(), 15);
        auction.record_bid("bidder_2".into(), 20);
        assert_eq!(auction.current_bid, 20);
        assert_eq!(auction.winner, Some("bidder_2".into()));
        let amounts: Vec<_> = auction.history.iter().map(|bid| bid.amount).collect();
        assert_eq!(amounts, vec![15, 20]);
    }

    #[test]
    fn buyout_clamps_the_price() {
        let mut auction = auction();
        auction.buy_out("bidder_1".into());
        let closed = auction.close();
        assert_eq!(closed.amount, 100);
        assert_eq!(closed.winner, Some("bidder_1".into()));
        assert_eq!(closed.bids, 0);
    }
}
