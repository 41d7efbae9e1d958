// In Google Cloud console
// Set
// - Authorized JavaScript origins: http://localhost
// - Authorized redirect URIs: http://localhost/auth/one-tap
// Put your client ID in demos/resources/application.yml (or application.properties).
// finally ```cargo run --example axum_server -- yaml```
// The argument selects the config file: "yaml" or anything else for properties.
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    Form, Json, Router,
    extract::State,
    response::{Html, IntoResponse},
    routing::{get, post},
};
use axum_extra::extract::{CookieJar, cookie::Cookie};
use http::StatusCode;
use serde::Deserialize;
use tiny_google_signin::{
    client::GoogleApiClient,
    config::Config,
    config_reader::{ConfigReader, ConfigSource},
    csrf_token::{CSRF_TOKEN_NAME, verify_one_tap_csrf},
    error::ErrorKind,
    id_token::OneTapCallback,
    nonce::Nonce,
    userinfo::{AccessToken, UserInfo},
};
use tracing::error;
use uuid::Uuid;

extern crate tiny_google_signin;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Log settings
    tracing_subscriber::fmt::init();

    // Select config file
    let config_type = std::env::args().nth(1).unwrap_or_else(|| "yaml".to_string());
    let source = ConfigSource::from_config_type(&config_type);
    let reader = ConfigReader::new(concat!(env!("CARGO_MANIFEST_DIR"), "/demos/resources"));

    // The transport and verifier are built here once and shared by every request
    let client = GoogleApiClient::from_source(&reader, &source, Config::builder())?;

    let app_state = AppState::new(client);
    let listener = tokio::net::TcpListener::bind("0.0.0.0:80").await?;
    // '/': Page rendering the One Tap prompt
    // '/auth/one-tap': login_uri that Google posts the credential to
    // '/auth/button': Exchange a button access token for the user's profile
    let app = Router::new()
        .route("/", get(index))
        .route("/auth/one-tap", post(one_tap))
        .route("/auth/button", post(button))
        .with_state(Arc::new(app_state));

    axum::serve(listener, app).await?;
    anyhow::Ok(())
}

static COOKIE_KEY: &str = "nonce_key";

async fn index(State(app_state): State<Arc<AppState>>, jar: CookieJar) -> impl IntoResponse {
    // Nonce for each prompt, kept in memory (Redis) behind a cookie key
    let nonce = Nonce::new();
    let nonce_key = Uuid::new_v4().to_string();
    {
        app_state
            .nonce
            .lock()
            .unwrap()
            .insert(nonce_key.clone(), nonce.clone());
    }
    let page = format!(
        r#"<script src="https://accounts.google.com/gsi/client" async></script>
<div id="g_id_onload"
     data-client_id="{}"
     data-login_uri="/auth/one-tap"
     data-nonce="{}">
</div>"#,
        app_state.client.config().client_id().as_str(),
        nonce.value(),
    );
    (jar.add(Cookie::new(COOKIE_KEY, nonce_key)), Html(page))
}

async fn one_tap(
    State(app_state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(callback): Form<OneTapCallback>,
) -> Result<impl IntoResponse, StatusCode> {
    // Double-submit cookie set by Google
    let csrf_cookie = jar.get(CSRF_TOKEN_NAME).map(|c| c.value());
    verify_one_tap_csrf(csrf_cookie, callback.g_csrf_token.as_deref())
        .map_err(|_| StatusCode::BAD_REQUEST)?;

    // Get nonce that was inserted by index
    let nonce_key = jar.get(COOKIE_KEY).ok_or(StatusCode::BAD_REQUEST)?;
    let nonce = {
        // This block for early unlock
        let mut lock = app_state.nonce.lock().unwrap();
        lock.remove(nonce_key.value()).ok_or(StatusCode::BAD_REQUEST)?
    };

    let id_token = app_state
        .client
        .one_tap_google_data_with_nonce(&callback.credential, &nonce)
        .await
        .map_err(|e| {
            error!("One Tap sign-in failed: {}", e);
            match e.kind() {
                ErrorKind::TokenInvalid => StatusCode::UNAUTHORIZED,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            }
        })?;
    Ok((StatusCode::OK, Json(id_token.into_payload())))
}

async fn button(
    State(app_state): State<Arc<AppState>>,
    Json(token): Json<Token>,
) -> Result<impl IntoResponse, StatusCode> {
    let access_token = AccessToken::new(&token.access_token);
    let res = app_state
        .client
        .button_google_data(&access_token)
        .await
        .map_err(|_| StatusCode::BAD_GATEWAY)?;
    let profile = UserInfo::from_response(&res).map_err(|_| StatusCode::UNAUTHORIZED)?;
    Ok((StatusCode::OK, Json(profile)))
}

struct AppState {
    client: GoogleApiClient,
    nonce: Mutex<HashMap<String, Nonce>>,
}

impl AppState {
    fn new(client: GoogleApiClient) -> Self {
        Self {
            client,
            nonce: Mutex::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct Token {
    access_token: String,
}
