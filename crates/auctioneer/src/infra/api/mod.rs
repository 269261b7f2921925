//! Serving of the REST and websocket interface.

mod error;
mod routes;

use {
    crate::domain::AuctionHouse,
    futures::Future,
    std::{net::SocketAddr, sync::Arc},
    tokio::sync::oneshot,
};

pub struct Api {
    pub house: AuctionHouse,
    pub addr: SocketAddr,
    /// If this channel is specified, the bound address will be sent to it
    /// when the server starts.
    pub addr_sender: Option<oneshot::Sender<SocketAddr>>,
}

impl Api {
    /// Serves the API until the given future resolves.
    pub async fn serve(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> std::io::Result<()> {
        let app = axum::Router::new();
        let app = routes::rooms(app);
        let app = routes::auctions(app);
        let app = routes::session(app);
        let app = app
            .layer(
                tower::ServiceBuilder::new().layer(tower_http::trace::TraceLayer::new_for_http()),
            )
            .with_state(State(Arc::new(Inner { house: self.house })));

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        if let Some(addr_sender) = self.addr_sender {
            let _ = addr_sender.send(listener.local_addr()?);
        }
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
    }
}

#[derive(Clone)]
struct State(Arc<Inner>);

impl State {
    fn house(&self) -> &AuctionHouse {
        &self.0.house
    }
}

struct Inner {
    house: AuctionHouse,
}
