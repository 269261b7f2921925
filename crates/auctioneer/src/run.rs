use {
    crate::{
        arguments::Arguments,
        domain::{AuctionHouse, room},
        infra::api::Api,
    },
    ledger::InMemoryLedger,
    std::{net::SocketAddr, sync::Arc, time::Duration},
    tokio::sync::oneshot,
};

/// Assembles the service and serves it until a shutdown signal arrives.
///
/// If `addr_sender` is specified, the address the API ended up bound to is
/// sent to it when the server starts. This exists so tests can bind port 0.
pub async fn run(args: Arguments, addr_sender: Option<oneshot::Sender<SocketAddr>>) {
    observe::metrics::setup_registry_reentrant(Some("tcg_auctioneer".into()), None);

    let ledger = Arc::new(InMemoryLedger::new(args.starting_balance));
    let house = AuctionHouse::new(
        args.rooms,
        room::Config {
            grace_period: args.grace_period,
            snipe_window: args.snipe_window,
        },
        ledger,
    );
    observe::metrics::serve_metrics(Arc::new(Liveness), args.metrics_address);

    let (shutdown_sender, shutdown_receiver) = oneshot::channel();
    let serve = Api {
        house,
        addr: args.bind_address,
        addr_sender,
    }
    .serve(async {
        let _ = shutdown_receiver.await;
    });
    tracing::info!(address = %args.bind_address, rooms = args.rooms, "serving auctioneer");

    futures::pin_mut!(serve);
    tokio::select! {
        result = &mut serve => panic!("API task exited: {result:?}"),
        _ = shutdown_signal() => {
            shutdown_sender.send(()).expect("failed to send shutdown signal");
            match tokio::time::timeout(Duration::from_secs(10), serve).await {
                Ok(inner) => inner.expect("API failed during shutdown"),
                Err(_) => panic!("API shutdown exceeded timeout"),
            }
        }
    };
}

/// There is no external dependency whose death the service could report; the
/// process answering at all is the liveness signal.
struct Liveness;

#[async_trait::async_trait]
impl observe::metrics::LivenessChecking for Liveness {
    async fn is_alive(&self) -> bool {
        true
    }
}

#[cfg(unix)]
async fn shutdown_signal() {
    // Container orchestrators stop the service with sigterm; ctrl-c in a
    // terminal sends sigint.
    let mut interrupt =
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt()).unwrap();
    let mut terminate =
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()).unwrap();
    tokio::select! {
        _ = interrupt.recv() => (),
        _ = terminate.recv() => (),
    };
}

#[cfg(windows)]
async fn shutdown_signal() {
    // We don't support signal handling on Windows.
    std::future::pending().await
}
