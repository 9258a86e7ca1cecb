mod utilities;

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use utilities::ApiError;
use vapid_native::{Claims, HeaderStyle, KeyPair, RawClaims, VapidBuilder, VapidHeaders, Verifier};

const DEFAULT_LISTEN: &str = "0.0.0.0:3030";

type SharedState = Arc<AppState>;

struct AppState {
    builder: VapidBuilder,
    verifier: Verifier,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Style {
    Split,
    Combined,
}

#[derive(Debug, Deserialize)]
struct SignQuery {
    style: Option<Style>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyRequest {
    authorization: String,
    crypto_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let key_pair = match std::env::var("VAPID_PRIVATE_KEY") {
        Ok(encoded) => KeyPair::from_base64(&encoded)?,
        Err(_) => {
            warn!("VAPID_PRIVATE_KEY unset, generating an ephemeral key");
            KeyPair::generate()?
        }
    };
    info!(public_key = %key_pair.public_key().to_base64(), "loaded VAPID key");

    let state = SharedState::new(AppState {
        builder: VapidBuilder::new(key_pair),
        verifier: Verifier::new(),
    });
    let app = api_routes().with_state(state);

    let listen = std::env::var("VAPID_LISTEN").unwrap_or_else(|_| DEFAULT_LISTEN.to_owned());
    let listener = tokio::net::TcpListener::bind(&listen).await?;
    info!(%listen, "serving VAPID demo");
    axum::serve(listener, app).await?;

    Ok(())
}

fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/vapid.json", get(public_key))
        .route("/sign", post(sign))
        .route("/verify", post(verify))
}

async fn public_key(State(state): State<SharedState>) -> Json<Value> {
    Json(json!({ "publicKey": state.builder.public_key() }))
}

async fn sign(
    State(state): State<SharedState>,
    Query(query): Query<SignQuery>,
    Json(claims): Json<RawClaims>,
) -> Result<Json<VapidHeaders>, ApiError> {
    let style = match query.style {
        Some(Style::Split) => HeaderStyle::Split,
        Some(Style::Combined) | None => HeaderStyle::Combined,
    };
    let headers = state
        .builder
        .clone()
        .with_header_style(style)
        .sign(&claims)?;

    Ok(Json(headers))
}

async fn verify(
    State(state): State<SharedState>,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<Claims>, ApiError> {
    let claims = state
        .verifier
        .verify_header(&request.authorization, request.crypto_key.as_deref())?;
    info!(aud = claims.aud(), sub = claims.sub(), "verified sender");

    Ok(Json(claims))
}
