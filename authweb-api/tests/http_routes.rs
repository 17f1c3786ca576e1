//! Browser sign-in flow through the router, against a mock provider

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use wiremock::matchers::{header as header_eq, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use authweb_api::http::SessionManager;
use authweb_api::{create_router, AppState};
use authweb_core::bootstrap::init_services;
use authweb_core::config::OAuth2Config;
use authweb_core::oauth2::ProviderKind;
use authweb_core::Config;

fn app(server: &MockServer) -> Router {
    let config = Config {
        oauth2: OAuth2Config {
            provider: ProviderKind::Microsoft,
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            redirect_url: "http://localhost:8080/oauth2/callback".to_string(),
            auth_url: Some(format!("{}/authorize", server.uri())),
            token_url: Some(format!("{}/token", server.uri())),
            profile_url: Some(format!("{}/me", server.uri())),
            ..OAuth2Config::default()
        },
        ..Config::default()
    };
    let services = init_services(&config).unwrap();
    let sessions = SessionManager::new(&config.session);
    create_router(AppState::new(&services, sessions, CancellationToken::new()))
}

async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response<Body> {
    let mut request = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
}

/// `name=value` part of the Set-Cookie header, ready to send back
fn session_cookie(response: &Response<Body>) -> Option<String> {
    let raw = response.headers().get(header::SET_COOKIE)?.to_str().ok()?;
    raw.split(';').next().map(str::to_string)
}

async fn json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn mount_token(server: &MockServer, status: u16, expect: u64) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(status).set_body_json(serde_json::json!({
            "access_token": "abc",
            "token_type": "Bearer",
            "expires_in": 3600,
            "refresh_token": "r",
            "scope": "openid email profile"
        })))
        .expect(expect)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_health() {
    let server = MockServer::start().await;
    let response = get(&app(&server), "/health", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"OK");
}

#[tokio::test]
async fn test_authorize_redirects_to_provider() {
    let server = MockServer::start().await;
    let response = get(&app(&server), "/oauth2/authorize", None).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    let target = location(&response);
    assert!(target.starts_with(&format!("{}/authorize?", server.uri())));
    assert!(target.contains("response_type=code"));
    assert!(target.contains("scope=openid+email+profile"));
}

#[tokio::test]
async fn test_callback_with_provider_error() {
    let server = MockServer::start().await;
    mount_token(&server, 200, 0).await;

    let response = get(
        &app(&server),
        "/oauth2/callback?error=access_denied&error_description=denied",
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/oauth2/failure");
    assert!(session_cookie(&response).is_none());
}

#[tokio::test]
async fn test_callback_without_code() {
    let server = MockServer::start().await;
    mount_token(&server, 200, 0).await;

    let response = get(&app(&server), "/oauth2/callback", None).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/oauth2/failure");
}

#[tokio::test]
async fn test_callback_with_duplicated_params() {
    let server = MockServer::start().await;
    mount_token(&server, 200, 0).await;

    let response = get(
        &app(&server),
        "/oauth2/callback?error=access_denied&error=x",
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/oauth2/failure");
    assert!(session_cookie(&response).is_none());
}

#[tokio::test]
async fn test_sign_in_rotates_session_id() {
    let server = MockServer::start().await;
    mount_token(&server, 200, 2).await;
    let app = app(&server);

    let response = get(&app, "/oauth2/callback?code=first", None).await;
    let planted = session_cookie(&response).unwrap();

    let response = get(&app, "/oauth2/callback?code=second", Some(&planted)).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/oauth2/success");
    let issued = session_cookie(&response).unwrap();
    assert_ne!(issued, planted);

    let body = json(get(&app, "/", Some(&planted)).await).await;
    assert_eq!(body["signed_in"], false);
    let body = json(get(&app, "/", Some(&issued)).await).await;
    assert_eq!(body["signed_in"], true);
}

#[tokio::test]
async fn test_callback_token_endpoint_rejects_code() {
    let server = MockServer::start().await;
    mount_token(&server, 400, 1).await;

    let response = get(&app(&server), "/oauth2/callback?code=stale", None).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/oauth2/failure");
    assert!(session_cookie(&response).is_none());
}

#[tokio::test]
async fn test_full_sign_in_flow() {
    let server = MockServer::start().await;
    mount_token(&server, 200, 1).await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header_eq("authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "87d349ed",
            "displayName": "Adele Vance",
            "mail": "AdeleV@contoso.com"
        })))
        .mount(&server)
        .await;
    let app = app(&server);

    let response = get(&app, "/oauth2/callback?code=4%2F0Ad", None).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/oauth2/success");
    let cookie = session_cookie(&response).unwrap();
    assert!(cookie.starts_with("session="));

    let response = get(&app, "/oauth2/success", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json(response).await;
    assert_eq!(body["provider"], "microsoft");
    assert_eq!(body["profile"]["displayName"], "Adele Vance");

    let body = json(get(&app, "/", Some(&cookie)).await).await;
    assert_eq!(body["signed_in"], true);
    assert_eq!(body["provider"], "microsoft");

    let response = get(&app, "/logout", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/");

    let response = get(&app, "/oauth2/success", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_success_without_session_goes_home() {
    let server = MockServer::start().await;
    let response = get(&app(&server), "/oauth2/success", None).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_success_with_rejected_token_fails() {
    let server = MockServer::start().await;
    mount_token(&server, 200, 1).await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(401).set_body_string("InvalidAuthenticationToken"))
        .mount(&server)
        .await;
    let app = app(&server);

    let response = get(&app, "/oauth2/callback?code=abc", None).await;
    let cookie = session_cookie(&response).unwrap();

    let response = get(&app, "/oauth2/success", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/oauth2/failure");
}

#[tokio::test]
async fn test_failure_page() {
    let server = MockServer::start().await;
    let response = get(&app(&server), "/oauth2/failure", None).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json(response).await["error"], "sign-in failed");
}

#[tokio::test]
async fn test_home_when_signed_out() {
    let server = MockServer::start().await;
    let body = json(get(&app(&server), "/", None).await).await;

    assert_eq!(body["signed_in"], false);
}
