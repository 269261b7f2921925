//! Account book of the game backend: player coin balances and card
//! collections.
//!
//! The auction service treats the ledger as an external system with
//! serializable single-operation semantics. Each call either fully applies
//! or fully fails, and there are no cross-call transactions. Settlement
//! therefore compensates a failed card handover with an explicit reverse
//! `exchange` instead of relying on a rollback.

use {
    model::{Card, UserId},
    std::{collections::HashMap, sync::Mutex},
};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("insufficient funds: {user} holds {balance} of {required} coins")]
    InsufficientFunds {
        user: UserId,
        balance: u64,
        required: u64,
    },
    #[error("{user} does not own a copy of {card}")]
    CardNotOwned { user: UserId, card: String },
    #[error("no account for {0}")]
    UnknownUser(UserId),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[mockall::automock]
#[async_trait::async_trait]
pub trait Ledger: Send + Sync {
    /// Moves `amount` coins from `from` to `to`. Applies fully or not at all.
    async fn exchange(&self, from: &UserId, to: &UserId, amount: u64) -> Result<()>;

    /// Moves one copy of `card` from `from`'s collection to `to`'s.
    async fn transfer_card_ownership(&self, from: &UserId, to: &UserId, card: &Card) -> Result<()>;
}

/// Process-local [`Ledger`] backing the binary and the tests. Accounts are
/// created with a configurable starting balance the first time a user shows
/// up in any operation.
pub struct InMemoryLedger {
    starting_balance: u64,
    accounts: Mutex<HashMap<UserId, Account>>,
}

#[derive(Debug)]
struct Account {
    balance: u64,
    cards: Vec<Card>,
}

impl InMemoryLedger {
    pub fn new(starting_balance: u64) -> Self {
        Self {
            starting_balance,
            accounts: Mutex::new(HashMap::new()),
        }
    }

    /// Adds coins to a user's account. Intended for seeding game state.
    pub fn deposit(&self, user: &UserId, amount: u64) {
        let mut accounts = self.accounts.lock().unwrap();
        self.account(&mut accounts, user).balance += amount;
    }

    /// Adds a card to a user's collection. Intended for seeding game state.
    pub fn grant_card(&self, user: &UserId, card: Card) {
        let mut accounts = self.accounts.lock().unwrap();
        self.account(&mut accounts, user).cards.push(card);
    }

    pub fn balance(&self, user: &UserId) -> u64 {
        let mut accounts = self.accounts.lock().unwrap();
        self.account(&mut accounts, user).balance
    }

    pub fn collection(&self, user: &UserId) -> Vec<Card> {
        let mut accounts = self.accounts.lock().unwrap();
        self.account(&mut accounts, user).cards.clone()
    }

    fn account<'a>(
        &self,
        accounts: &'a mut HashMap<UserId, Account>,
        user: &UserId,
    ) -> &'a mut Account {
        accounts.entry(user.clone()).or_insert_with(|| Account {
            balance: self.starting_balance,
            cards: Vec::new(),
        })
    }
}

#[async_trait::async_trait]
impl Ledger for InMemoryLedger {
    async fn exchange(&self, from: &UserId, to: &UserId, amount: u64) -> Result<()> {
        let mut accounts = self.accounts.lock().unwrap();
        let payer = self.account(&mut accounts, from);
        if payer.balance < amount {
            return Err(Error::InsufficientFunds {
                user: from.clone(),
                balance: payer.balance,
                required: amount,
            });
        }
        payer.balance -= amount;
        self.account(&mut accounts, to).balance += amount;
        tracing::debug!(%from, %to, amount, "exchanged coins");
        Ok(())
    }

    async fn transfer_card_ownership(&self, from: &UserId, to: &UserId, card: &Card) -> Result<()> {
        let mut accounts = self.accounts.lock().unwrap();
        let owner = self.account(&mut accounts, from);
        let Some(index) = owner.cards.iter().position(|owned| owned == card) else {
            return Err(Error::CardNotOwned {
                user: from.clone(),
                card: card.name.clone(),
            });
        };
        let card = owner.cards.remove(index);
        tracing::debug!(%from, %to, %card, "transferred card");
        self.account(&mut accounts, to).cards.push(card);
        Ok(())
    }
}
