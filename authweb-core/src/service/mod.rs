pub mod callback;
pub mod oauth2;

pub use callback::{CallbackOrchestrator, CallbackOutcome, CallbackParams, CallbackState};
pub use oauth2::OAuth2Service;
