use std::sync::Arc;
use std::time::Duration;

use murmur_db::{Database, StorageError};
use tracing::error;

use crate::dispatcher::Dispatcher;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub dispatcher: Dispatcher,
    pub config: GatewayConfig,
}

impl AppStateInner {
    pub fn new(db: Database, config: GatewayConfig) -> AppState {
        Arc::new(Self {
            db,
            dispatcher: Dispatcher::new(),
            config,
        })
    }
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Require active participation before serving conversation history.
    pub history_requires_membership: bool,
    /// Upper bound applied to the `limit` of history requests.
    pub max_page_size: u32,
    /// Ping interval; two missed pongs drop the connection.
    pub heartbeat_interval: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            history_requires_membership: false,
            max_page_size: 200,
            heartbeat_interval: Duration::from_secs(15),
        }
    }
}

/// Run blocking DB work off the async runtime.
pub(crate) async fn with_db<F, T>(state: &AppState, f: F) -> Result<T, StorageError>
where
    F: FnOnce(&Database) -> Result<T, StorageError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StorageError::Task(e.to_string())
        })?
}
