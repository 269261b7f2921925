use {
    crate::infra::api::{State, error},
    axum::http::StatusCode,
    model::{Card, RoomId, UserId, auction::AuctionItem},
    serde::{Deserialize, Serialize},
};

pub(in crate::infra::api) fn auctions(router: axum::Router<State>) -> axum::Router<State> {
    router.route("/api/v1/auctions", axum::routing::post(route))
}

/// A listing as submitted by a seller.
#[derive(Debug, Deserialize)]
struct NewListing {
    card: Card,
    seller: UserId,
    starting_bid: u64,
    buyout: u64,
    time_limit: u64,
}

/// Where the listing was queued.
#[derive(Debug, Serialize)]
struct Placed {
    room: RoomId,
    queue_position: usize,
}

async fn route(
    state: axum::extract::State<State>,
    axum::Json(listing): axum::Json<NewListing>,
) -> Result<axum::Json<Placed>, (StatusCode, axum::Json<error::Error>)> {
    let item = AuctionItem::new(
        listing.card,
        listing.seller,
        listing.starting_bid,
        listing.buyout,
        listing.time_limit,
    )
    .map_err(error::Kind::from)?;
    let placement = state.house().place(item).await?;
    Ok(axum::Json(Placed {
        room: placement.room,
        queue_position: placement.queue_position,
    }))
}
