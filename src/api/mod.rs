//! HTTP API layer: shared state, route handlers, SSE streaming, and server
//! setup.

pub mod handlers;
pub mod server;
pub mod sse;
pub mod state;

pub use server::{spawn_api_server, ApiServer, ServerConfig};
pub use state::{AppState, DeckEvent, PanelBoard};
