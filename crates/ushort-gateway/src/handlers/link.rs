use crate::error::Result;
use crate::model::{ShortenRequest, ShortenResponse};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use tracing::debug;

/// `POST /shorten`
pub async fn shorten_handler(
    State(state): State<AppState>,
    request: std::result::Result<Json<ShortenRequest>, JsonRejection>,
) -> Result<Json<ShortenResponse>> {
    let Json(request) = request?;
    let token = state.shortener().shorten(&request.url).await?;

    Ok(Json(ShortenResponse {
        short_url: state.short_url(&token),
        token: token.to_string(),
        original_url: request.url,
    }))
}

/// `GET /{token}`, answered with `302 Found`.
pub async fn redirect_handler(
    Path(token): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse> {
    let original_url = state.redirector().resolve(&token).await?;
    debug!(%token, location = %original_url, "redirecting");

    Ok((StatusCode::FOUND, [(header::LOCATION, original_url)]))
}
