use {
    prometheus::Encoder,
    std::{
        collections::HashMap,
        net::SocketAddr,
        sync::{Arc, OnceLock},
    },
    tokio::task::{self, JoinHandle},
};

/// Global metrics registry used by all components.
static REGISTRY: OnceLock<prometheus_metric_storage::StorageRegistry> = OnceLock::new();

/// Configures the global metrics registry with an optional common prefix for
/// all metric names and optional common labels.
///
/// Must be called before any call to [`get_registry`], ideally at the very
/// beginning of `main`. Can be called multiple times in a row; later calls
/// are ignored, so tests may boot the full service repeatedly in one
/// process.
///
/// # Panics
///
/// Panics if the registry configuration is invalid.
pub fn setup_registry_reentrant(prefix: Option<String>, labels: Option<HashMap<String, String>>) {
    let registry = prometheus::Registry::new_custom(prefix, labels).unwrap();
    let storage_registry = prometheus_metric_storage::StorageRegistry::new(registry);
    REGISTRY.set(storage_registry).ok();
}

/// Get the global instance of the metrics registry.
pub fn get_registry() -> &'static prometheus::Registry {
    get_storage_registry().registry()
}

/// Get the global instance of the metric storage registry.
///
/// If the registry was not configured with [`setup_registry_reentrant`] it is
/// initialized with a default value. Panicking instead would create troubles
/// for unit tests, where there is no way to run setup code before every test.
pub fn get_storage_registry() -> &'static prometheus_metric_storage::StorageRegistry {
    REGISTRY.get_or_init(prometheus_metric_storage::StorageRegistry::default)
}

pub fn encode(registry: &prometheus::Registry) -> String {
    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&registry.gather(), &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

#[async_trait::async_trait]
pub trait LivenessChecking: Send + Sync {
    async fn is_alive(&self) -> bool;
}

/// Spawns a server exposing `/metrics` and `/liveness` on the given address.
pub fn serve_metrics(liveness: Arc<dyn LivenessChecking>, address: SocketAddr) -> JoinHandle<()> {
    let app = axum::Router::new()
        .route("/metrics", axum::routing::get(handle_metrics))
        .route("/liveness", axum::routing::get(handle_liveness))
        .with_state(liveness);
    tracing::info!(%address, "serving metrics");
    task::spawn(async move {
        let listener = tokio::net::TcpListener::bind(address)
            .await
            .expect("bind metrics address");
        axum::serve(listener, app)
            .await
            .expect("serve metrics endpoint");
    })
}

// `/metrics` route exposing encoded prometheus data to the monitoring system.
async fn handle_metrics() -> String {
    encode(get_registry())
}

async fn handle_liveness(
    axum::extract::State(liveness): axum::extract::State<Arc<dyn LivenessChecking>>,
) -> axum::http::StatusCode {
    if liveness.is_alive().await {
        axum::http::StatusCode::OK
    } else {
        axum::http::StatusCode::SERVICE_UNAVAILABLE
    }
}
