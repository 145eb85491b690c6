use crate::adapters::join_segments;
use crate::domain::model::TemperatureReading;
use crate::domain::ports::WeatherSource;
use crate::utils::error::{Result, WeatherError};
use crate::utils::trace::RequestContext;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use tracing::Instrument;
use url::Url;

const SERVICE: &str = "weather";

#[derive(Debug, Deserialize)]
struct WeatherApiResponse {
    current: CurrentConditions,
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    temp_c: f64,
}

#[derive(Clone)]
pub struct WeatherApiSource {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl fmt::Debug for WeatherApiSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherApiSource")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl WeatherApiSource {
    pub fn new(client: Client, base_url: Url, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url,
            api_key: api_key.into(),
        }
    }

    fn current_url(&self, locality: &str) -> Result<Url> {
        let mut url = join_segments(&self.base_url, &["v1", "current.json"])?;
        url.query_pairs_mut()
            .append_pair("key", &self.api_key)
            .append_pair("q", locality);
        Ok(url)
    }

    async fn fetch(&self, locality: &str) -> Result<TemperatureReading> {
        let url = self.current_url(locality)?;
        // The URL carries the API key; log the locality only.
        tracing::debug!(locality, "Requesting current weather");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        tracing::debug!("Weather response status: {}", status);

        if !status.is_success() {
            return Err(WeatherError::UpstreamStatusError {
                service: SERVICE,
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let parsed: WeatherApiResponse = serde_json::from_slice(&body)?;
        Ok(TemperatureReading {
            celsius: parsed.current.temp_c,
        })
    }
}

#[async_trait]
impl WeatherSource for WeatherApiSource {
    async fn current_temperature(
        &self,
        ctx: &RequestContext,
        locality: &str,
    ) -> Result<TemperatureReading> {
        let call = ctx.child("weather-request");
        self.fetch(locality).instrument(call.span().clone()).await
    }
}
