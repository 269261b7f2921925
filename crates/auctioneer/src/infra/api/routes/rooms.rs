use {
    crate::infra::api::{State, error},
    axum::http::StatusCode,
    model::{RoomId, room::RoomStatus},
};

pub(in crate::infra::api) fn rooms(router: axum::Router<State>) -> axum::Router<State> {
    router
        .route("/api/v1/rooms", axum::routing::get(list))
        .route("/api/v1/rooms/{room}", axum::routing::get(status))
}

async fn list(state: axum::extract::State<State>) -> axum::Json<Vec<RoomStatus>> {
    axum::Json(state.house().statuses().await)
}

async fn status(
    state: axum::extract::State<State>,
    axum::extract::Path(room): axum::extract::Path<RoomId>,
) -> Result<axum::Json<RoomStatus>, (StatusCode, axum::Json<error::Error>)> {
    let room = state.house().room(room).ok_or(error::Kind::UnknownRoom)?;
    Ok(axum::Json(room.status().await))
}
