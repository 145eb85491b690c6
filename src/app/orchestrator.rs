//! Service A: the caller-facing entry point. Validates the CEP locally and
//! relays whatever the wrapper answers.

use crate::adapters::{http_client, RelayedResponse, WrapperClient};
use crate::app::decode_request;
use crate::config::OrchestratorSettings;
use crate::domain::model::ErrorPayload;
use crate::utils::error::Result;
use crate::utils::trace::Tracer;
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use std::sync::Arc;
use tracing::Instrument;

#[derive(Clone)]
pub struct OrchestratorState {
    client: Arc<WrapperClient>,
    tracer: Tracer,
}

impl OrchestratorState {
    pub fn new(client: WrapperClient, tracer: Tracer) -> Self {
        Self {
            client: Arc::new(client),
            tracer,
        }
    }

    pub fn from_settings(settings: &OrchestratorSettings, tracer: Tracer) -> Result<Self> {
        let client = http_client(settings.request_timeout)?;
        Ok(Self::new(
            WrapperClient::new(client, settings.wrapper_url.clone()),
            tracer,
        ))
    }
}

pub fn router(state: OrchestratorState) -> Router {
    Router::new()
        .route("/", post(handle_zip_code))
        .with_state(state)
}

impl IntoResponse for RelayedResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

async fn handle_zip_code(
    State(state): State<OrchestratorState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let ctx = state.tracer.start(&headers, "fetch-weather-from-wrapper");
    let span = ctx.span().clone();

    async move {
        let Some(request) = decode_request(&body) else {
            return StatusCode::BAD_REQUEST.into_response();
        };

        if !request.is_well_formed() {
            tracing::info!(code = %request.code, "Rejected malformed postal code");
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorPayload::invalid_postal_code()),
            )
                .into_response();
        }

        match state.client.forward(&ctx, &request).await {
            Ok(relayed) => relayed.into_response(),
            Err(e) => {
                tracing::error!(
                    category = ?e.category(),
                    "Wrapper call failed: {}",
                    e
                );
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
    .instrument(span)
    .await
}
