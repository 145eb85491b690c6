//! Service B: resolves the CEP, fetches the temperature and answers with all
//! three scales.

use crate::adapters::{http_client, ViaCepDirectory, WeatherApiSource};
use crate::app::decode_request;
use crate::config::WrapperSettings;
use crate::core::{LookupOutcome, WeatherPipeline};
use crate::domain::model::ErrorPayload;
use crate::utils::error::Result;
use crate::utils::trace::Tracer;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use std::sync::Arc;
use tracing::Instrument;

#[derive(Clone)]
pub struct WrapperState {
    pipeline: WeatherPipeline,
    tracer: Tracer,
}

impl WrapperState {
    pub fn new(pipeline: WeatherPipeline, tracer: Tracer) -> Self {
        Self { pipeline, tracer }
    }

    /// Wire the real ViaCEP and WeatherAPI adapters from settings.
    pub fn from_settings(settings: &WrapperSettings, tracer: Tracer) -> Result<Self> {
        let client = http_client(settings.request_timeout)?;
        let directory = ViaCepDirectory::new(client.clone(), settings.directory_url.clone());
        let weather = WeatherApiSource::new(
            client,
            settings.weather_url.clone(),
            settings.weather_api_key.clone(),
        );
        let pipeline = WeatherPipeline::new(Arc::new(directory), Arc::new(weather));
        Ok(Self::new(pipeline, tracer))
    }
}

pub fn router(state: WrapperState) -> Router {
    Router::new()
        .route("/", post(handle_weather))
        .with_state(state)
}

async fn handle_weather(
    State(state): State<WrapperState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let ctx = state.tracer.start(&headers, "fetch-real-weather");
    let span = ctx.span().clone();

    async move {
        let Some(request) = decode_request(&body) else {
            return StatusCode::BAD_REQUEST.into_response();
        };

        match state.pipeline.run(&ctx, &request.code).await {
            Ok(LookupOutcome::Found(result)) => (StatusCode::OK, Json(result)).into_response(),
            Ok(LookupOutcome::NotFound) => (
                StatusCode::NOT_FOUND,
                Json(ErrorPayload::postal_code_not_found()),
            )
                .into_response(),
            Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
    .instrument(span)
    .await
}
