//! `OAuth2` sign-in HTTP handlers
//!
//! Every step of the browser flow ends in a `302 Found`, except the success
//! and failure pages which render JSON.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use tracing::{debug, info, warn};

use authweb_core::oauth2::ProviderKind;
use authweb_core::service::CallbackParams;

use super::{AppError, AppResult, AppState};

pub const HOME_PATH: &str = "/";
pub const SUCCESS_PATH: &str = "/oauth2/success";
pub const FAILURE_PATH: &str = "/oauth2/failure";

pub fn create_oauth2_router() -> Router<AppState> {
    Router::new()
        .route(HOME_PATH, get(home))
        .route("/oauth2/authorize", get(authorize))
        .route("/oauth2/callback", get(callback))
        .route(SUCCESS_PATH, get(success))
        .route(FAILURE_PATH, get(failure))
        .route("/logout", get(logout))
}

#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub signed_in: bool,
    pub provider: ProviderKind,
}

fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// GET /
pub async fn home(State(state): State<AppState>, jar: CookieJar) -> Json<HomeResponse> {
    let handle = state.sessions.load(&jar);
    Json(HomeResponse {
        signed_in: state.oauth2_service.is_signed_in(&handle.session),
        provider: state.oauth2_service.provider_kind(),
    })
}

/// GET /oauth2/authorize
pub async fn authorize(State(state): State<AppState>) -> AppResult<Response> {
    let url = state.oauth2_service.authorization_url()?;
    debug!(
        provider = %state.oauth2_service.provider_kind(),
        "Redirecting to authorization endpoint"
    );
    Ok(found(url.as_str()))
}

/// GET /oauth2/callback?code=xxx or ?error=xxx
///
/// The session is only written, and its cookie only issued, once a token
/// has been stored in it. Signing in always moves the session to a new id.
pub async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    query: Result<Query<CallbackParams>, QueryRejection>,
) -> Response {
    let params = match query {
        Ok(Query(params)) => params,
        Err(e) => {
            warn!(error = %e, "Unreadable callback query");
            return found(FAILURE_PATH);
        }
    };

    let mut handle = state.sessions.load(&jar);
    let cancel = state.shutdown.child_token();

    let outcome = state
        .oauth2_service
        .handle_callback(&params, &mut handle.session, &cancel)
        .await;

    if outcome.is_authenticated() {
        state.sessions.rotate(&mut handle);
        let jar = state.sessions.commit(jar, handle);
        return (jar, found(SUCCESS_PATH)).into_response();
    }

    debug!(trail = ?outcome.trail, "Sign-in did not complete");
    found(FAILURE_PATH)
}

/// GET /oauth2/success
pub async fn success(State(state): State<AppState>, jar: CookieJar) -> Response {
    let handle = state.sessions.load(&jar);
    let cancel = state.shutdown.child_token();

    match state
        .oauth2_service
        .current_profile(&handle.session, &cancel)
        .await
    {
        Ok(profile) => {
            info!(provider = %profile.kind(), "Rendered user profile");
            Json(profile).into_response()
        }
        Err(e) if e.is_session() => {
            debug!(error = %e, "No usable token in session");
            found(HOME_PATH)
        }
        Err(e) => {
            warn!(error = %e, category = ?e.category(), "Failed to fetch user profile");
            found(FAILURE_PATH)
        }
    }
}

/// GET /oauth2/failure
pub async fn failure() -> AppError {
    AppError::unauthorized("sign-in failed")
}

/// GET /logout
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    let mut handle = state.sessions.load(&jar);
    if handle.is_new() {
        return found(HOME_PATH);
    }

    state.oauth2_service.sign_out(&mut handle.session);
    let jar = state.sessions.commit(jar, handle);
    info!("User signed out");
    (jar, found(HOME_PATH)).into_response()
}
