//! Code required to provide or improve the observability of the service.
//! That includes initialization logic for metrics and logging as well as the
//! liveness probe plumbing.

pub mod metrics;
pub mod tracing;
