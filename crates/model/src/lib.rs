//! Serializable types shared between the auction service, its HTTP API and
//! the websocket protocol.

pub mod auction;
pub mod message;
pub mod room;

use {
    serde::{Deserialize, Serialize},
    std::fmt::{self, Display, Formatter},
};

/// Name a player goes by. Doubles as the account identifier on the ledger.
#[derive(Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for UserId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Index of an auction room in the fixed pool the service starts with.
#[derive(
    Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize,
)]
#[serde(transparent)]
pub struct RoomId(pub u16);

impl Display for RoomId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A collectible card. Cards are identified by name; the ledger tracks which
/// player owns which copies.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct Card {
    pub name: String,
    pub rarity: String,
}

impl Card {
    pub fn new(name: impl Into<String>, rarity: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rarity: rarity.into(),
        }
    }
}

impl Display for Card {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.rarity)
    }
}
