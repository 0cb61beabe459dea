use std::sync::Arc;

use crate::config::Config;
use crate::intake::pipeline::Pipeline;

/// Shared application state injected into all route handlers via Axum
/// extractors. The pipeline is stateless; handlers only share the config and
/// the extractor backends it wraps.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub pipeline: Arc<Pipeline>,
}
