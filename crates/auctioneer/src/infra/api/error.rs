//! The errors the REST endpoints answer with.
//!
//! Each response carries a machine readable `kind` and a human readable
//! `description`.

use {
    crate::domain::house::NoRoomAvailable,
    axum::http::StatusCode,
    model::auction::InvalidAuctionItem,
    serde::Serialize,
};

#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(in crate::infra::api) enum Kind {
    UnknownRoom,
    InvalidStartingBid,
    InvalidBuyout,
    InvalidTimeLimit,
    NoRoomAvailable,
}

#[derive(Debug, Serialize)]
pub(in crate::infra::api) struct Error {
    kind: Kind,
    description: &'static str,
}

impl From<Kind> for (StatusCode, axum::Json<Error>) {
    fn from(kind: Kind) -> Self {
        let (status, description) = match kind {
            Kind::UnknownRoom => (StatusCode::NOT_FOUND, "no room with this id exists"),
            Kind::InvalidStartingBid => (
                StatusCode::BAD_REQUEST,
                "starting bid must be greater than zero",
            ),
            Kind::InvalidBuyout => (
                StatusCode::BAD_REQUEST,
                "buyout price must not be below the starting bid",
            ),
            Kind::InvalidTimeLimit => (
                StatusCode::BAD_REQUEST,
                "time limit must be greater than zero",
            ),
            Kind::NoRoomAvailable => (StatusCode::SERVICE_UNAVAILABLE, "no auction room available"),
        };
        (status, axum::Json(Error { kind, description }))
    }
}

impl From<InvalidAuctionItem> for Kind {
    fn from(error: InvalidAuctionItem) -> Self {
        match error {
            InvalidAuctionItem::StartingBidZero => Self::InvalidStartingBid,
            InvalidAuctionItem::BuyoutBelowStartingBid => Self::InvalidBuyout,
            InvalidAuctionItem::TimeLimitZero => Self::InvalidTimeLimit,
        }
    }
}

impl From<NoRoomAvailable> for (StatusCode, axum::Json<Error>) {
    fn from(_: NoRoomAvailable) -> Self {
        Kind::NoRoomAvailable.into()
    }
}
