//! Exchanges money and card once an auction has closed.
//!
//! The ledger only guarantees serializability per operation, so a sale is
//! two separate transfers: coins from the winner to the seller, then the
//! card from the seller to the winner. When the card handover fails after
//! the coins already moved, the payment is given back with a compensating
//! transfer in the opposite direction.

use {
    crate::domain::auction::ClosedAuction,
    ledger::Ledger,
    model::{UserId, message::ServerMessage},
};

/// How settling a closed auction went.
#[derive(Debug)]
pub enum Outcome {
    /// Money and card changed hands.
    Settled { winner: UserId },
    /// Nobody bid. Nothing to settle.
    NoBids,
    /// The winner could not pay. No money moved.
    PaymentFailed { winner: UserId, error: ledger::Error },
    /// The seller no longer held the card. The winner's payment was
    /// returned.
    Refunded { winner: UserId, error: ledger::Error },
    /// The card handover and the subsequent refund both failed. The coins
    /// are in the seller's account while the card stayed put; this needs an
    /// operator to resolve.
    ReversalFailed {
        winner: UserId,
        error: ledger::Error,
        refund_error: ledger::Error,
    },
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Settled { .. } => "settled",
            Self::NoBids => "no_bids",
            Self::PaymentFailed { .. } => "payment_failed",
            Self::Refunded { .. } => "refunded",
            Self::ReversalFailed { .. } => "reversal_failed",
        }
    }

    /// The event the room broadcasts to report this outcome.
    pub fn to_message(&self, auction: &ClosedAuction) -> ServerMessage {
        let failure = |winner: &UserId, reason: String| ServerMessage::AuctionSettlementFailed {
            reason,
            winner: winner.clone(),
            seller: auction.item.seller.clone(),
            amount: auction.amount,
        };
        match self {
            Self::Settled { winner } => ServerMessage::AuctionSettled {
                winner: winner.clone(),
                seller: auction.item.seller.clone(),
                amount: auction.amount,
                card: auction.item.card.clone(),
            },
            Self::NoBids => ServerMessage::AuctionFailed {
                reason: "no bids were placed".to_string(),
            },
            Self::PaymentFailed { winner, error } => {
                let reason = match error {
                    ledger::Error::InsufficientFunds { .. } => "insufficient funds".to_string(),
                    other => other.to_string(),
                };
                failure(winner, reason)
            }
            Self::Refunded { winner, .. } => {
                failure(winner, "card transfer failed; buyer refunded".to_string())
            }
            Self::ReversalFailed { winner, .. } => {
                failure(winner, "card transfer failed; refund also failed".to_string())
            }
        }
    }
}

/// Settles a closed auction against the ledger. Never touches the ledger for
/// auctions without a winner.
pub async fn settle(ledger: &dyn Ledger, auction: &ClosedAuction) -> Outcome {
    let Some(winner) = &auction.winner else {
        tracing::info!(card = %auction.item.card, "auction closed without bids");
        return Outcome::NoBids;
    };
    let seller = &auction.item.seller;

    if let Err(error) = ledger.exchange(winner, seller, auction.amount).await {
        tracing::warn!(%winner, %seller, amount = auction.amount, %error, "payment failed");
        return Outcome::PaymentFailed {
            winner: winner.clone(),
            error,
        };
    }

    match ledger
        .transfer_card_ownership(seller, winner, &auction.item.card)
        .await
    {
        Ok(()) => {
            tracing::info!(
                %winner,
                %seller,
                amount = auction.amount,
                card = %auction.item.card,
                bids = auction.bids,
                "auction settled",
            );
            Outcome::Settled {
                winner: winner.clone(),
            }
        }
        Err(error) => {
            tracing::warn!(%winner, %seller, %error, "card transfer failed, refunding the payment");
            match ledger.exchange(seller, winner, auction.amount).await {
                Ok(()) => Outcome::Refunded {
                    winner: winner.clone(),
                    error,
                },
                Err(refund_error) => {
                    tracing::error!(
                        %winner,
                        %seller,
                        amount = auction.amount,
                        %error,
                        %refund_error,
                        "refund failed, coins are stranded with the seller",
                    );
                    Outcome::ReversalFailed {
                        winner: winner.clone(),
                        error,
                        refund_error,
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        ledger::MockLedger,
        mockall::{Sequence, predicate::eq},
        model::{Card, auction::AuctionItem},
    };

    fn card() -> Card {
        Card::new("Goblin", "common")
    }

    fn closed(winner: Option<&str>, amount: u64) -> ClosedAuction {
        ClosedAuction {
            item: AuctionItem::new(card(), "seller".into(), 5, 500, 30).unwrap(),
            winner: winner.map(Into::into),
            amount,
            bids: usize::from(winner.is_some()),
        }
    }

    #[tokio::test]
    async fn pays_the_seller_then_hands_over_the_card() {
        let mut ledger = MockLedger::new();
        let mut sequence = Sequence::new();
        ledger
            .expect_exchange()
            .with(
                eq(UserId::from("winner")),
                eq(UserId::from("seller")),
                eq(100),
            )
            .once()
            .in_sequence(&mut sequence)
            .returning(|_, _, _| Ok(()));
        ledger
            .expect_transfer_card_ownership()
            .with(eq(UserId::from("seller")), eq(UserId::from("winner")), eq(card()))
            .once()
            .in_sequence(&mut sequence)
            .returning(|_, _, _| Ok(()));

        let outcome = settle(&ledger, &closed(Some("winner"), 100)).await;
        assert!(matches!(outcome, Outcome::Settled { .. }));
    }

    #[tokio::test]
    async fn skips_the_ledger_without_a_winner() {
        let ledger = MockLedger::new();
        let outcome = settle(&ledger, &closed(None, 5)).await;
        assert!(matches!(outcome, Outcome::NoBids));
    }

    #[tokio::test]
    async fn failed_payment_stops_before_the_card_moves() {
        let mut ledger = MockLedger::new();
        ledger.expect_exchange().once().returning(|from, _, amount| {
            Err(ledger::Error::InsufficientFunds {
                user: from.clone(),
                balance: 0,
                required: amount,
            })
        });

        let outcome = settle(&ledger, &closed(Some("winner"), 100)).await;
        assert!(matches!(outcome, Outcome::PaymentFailed { .. }));
    }

    #[tokio::test]
    async fn failed_card_transfer_refunds_the_winner() {
        let mut ledger = MockLedger::new();
        let mut sequence = Sequence::new();
        ledger
            .expect_exchange()
            .with(
                eq(UserId::from("winner")),
                eq(UserId::from("seller")),
                eq(100),
            )
            .once()
            .in_sequence(&mut sequence)
            .returning(|_, _, _| Ok(()));
        ledger
            .expect_transfer_card_ownership()
            .once()
            .in_sequence(&mut sequence)
            .returning(|from, _, card| {
                Err(ledger::Error::CardNotOwned {
                    user: from.clone(),
                    card: card.name.clone(),
                })
            });
        ledger
            .expect_exchange()
            .with(
                eq(UserId::from("seller")),
                eq(UserId::from("winner")),
                eq(100),
            )
            .once()
            .in_sequence(&mut sequence)
            .returning(|_, _, _| Ok(()));

        let outcome = settle(&ledger, &closed(Some("winner"), 100)).await;
        assert!(matches!(outcome, Outcome::Refunded { .. }));
    }

    #[tokio::test]
    async fn reports_when_even_the_refund_fails() {
        let mut ledger = MockLedger::new();
        let mut sequence = Sequence::new();
        ledger
            .expect_exchange()
            .once()
            .in_sequence(&mut sequence)
            .returning(|_, _, _| Ok(()));
        ledger
            .expect_transfer_card_ownership()
            .once()
            .in_sequence(&mut sequence)
            .returning(|from, _, card| {
                Err(ledger::Error::CardNotOwned {
                    user: from.clone(),
                    card: card.name.clone(),
                })
            });
        ledger
            .expect_exchange()
            .once()
            .in_sequence(&mut sequence)
            .returning(|_, _, _| Err(anyhow::anyhow!("ledger offline").into()));

        let outcome = settle(&ledger, &closed(Some("winner"), 100)).await;
        assert!(matches!(outcome, Outcome::ReversalFailed { .. }));
    }
}
