use std::path::PathBuf;
use std::sync::Arc;

use crate::content::store::ContentStore;
use crate::presence::PresenceRegistry;
use crate::uploads::store::UploadLog;
use crate::ws::ConnectionRegistry;

/// Shared application state passed to all handlers via axum State extractor.
#[derive(Clone)]
pub struct AppState {
    /// Persisted content log
    pub content: Arc<ContentStore>,
    /// Persisted upload record log
    pub uploads: Arc<UploadLog>,
    /// In-memory registry of joined clients
    pub presence: Arc<PresenceRegistry>,
    /// Live WebSocket connections, keyed by connection id
    pub connections: ConnectionRegistry,
    /// Directory holding the JSON snapshots and the uploads subdirectory
    pub data_dir: PathBuf,
    /// Maximum accepted request body size in megabytes
    pub max_upload_size_mb: u32,
}
