//! Application state shared across request handlers.

use std::sync::Arc;

use coldwatch_auth::TokenService;
use coldwatch_storage::MemoryStore;
use coldwatch_workflow::{IncidentLifecycle, IngestionPipeline, SessionFlow};

pub(crate) struct AppState {
    pub(crate) store: Arc<MemoryStore>,
    pub(crate) tokens: Arc<TokenService>,
    pub(crate) sessions: SessionFlow<MemoryStore>,
    pub(crate) pipeline: IngestionPipeline<MemoryStore>,
    pub(crate) incidents: IncidentLifecycle<MemoryStore>,
}
