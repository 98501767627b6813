pub mod channels;
pub mod connection;
pub mod conversations;
pub mod dispatcher;
pub mod error;
pub mod identity;
pub mod messages;
pub mod routes;
pub mod state;

pub use error::{ErrorKind, GatewayError};
pub use state::{AppState, AppStateInner, GatewayConfig};
