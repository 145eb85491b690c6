// Adapters layer: concrete HTTP clients for the external systems.

pub mod directory;
pub mod downstream;
pub mod weather;

pub use directory::ViaCepDirectory;
pub use downstream::{RelayedResponse, WrapperClient};
pub use weather::WeatherApiSource;

use crate::utils::error::{Result, WeatherError};
use reqwest::Client;
use std::time::Duration;
use url::Url;

const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared outbound client. Every request made through it is bounded by `timeout`.
pub fn http_client(timeout: Duration) -> Result<Client> {
    let client = Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(MAX_CONNECT_TIMEOUT))
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// `base` with `segments` appended to its path, each segment percent-encoded.
pub(crate) fn join_segments(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| WeatherError::ConfigError {
            message: format!("{} cannot be used as a base URL", base),
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
