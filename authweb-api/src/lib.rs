// AuthWeb HTTP API
//
// Routes the OAuth2 sign-in flow and keeps per-user sessions

pub mod http;

pub use http::{create_router, AppState};
