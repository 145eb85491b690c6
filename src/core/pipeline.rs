use crate::core::{LocalityDirectory, WeatherSource};
use crate::domain::model::WeatherResult;
use crate::utils::error::Result;
use crate::utils::trace::RequestContext;
use std::fmt;
use std::sync::Arc;

/// Where a wrapper request currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ResolvingLocality,
    FetchingWeather,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::ResolvingLocality => f.write_str("resolving_locality"),
            Stage::FetchingWeather => f.write_str("fetching_weather"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Found(WeatherResult),
    /// The directory does not know the code. Not a fault.
    NotFound,
}

/// Postal code → locality → temperature, strictly in that order, no retries.
#[derive(Clone)]
pub struct WeatherPipeline {
    directory: Arc<dyn LocalityDirectory>,
    weather: Arc<dyn WeatherSource>,
}

impl WeatherPipeline {
    pub fn new(directory: Arc<dyn LocalityDirectory>, weather: Arc<dyn WeatherSource>) -> Self {
        Self { directory, weather }
    }

    pub async fn run(&self, ctx: &RequestContext, code: &str) -> Result<LookupOutcome> {
        let locality = self
            .directory
            .resolve(ctx, code)
            .await
            .inspect_err(|e| log_failure(Stage::ResolvingLocality, e))?;

        if !locality.found {
            tracing::info!(code, "Postal code not found");
            return Ok(LookupOutcome::NotFound);
        }

        let reading = self
            .weather
            .current_temperature(ctx, &locality.name)
            .await
            .inspect_err(|e| log_failure(Stage::FetchingWeather, e))?;

        tracing::info!(
            city = %locality.name,
            celsius = reading.celsius,
            "Resolved current temperature"
        );
        Ok(LookupOutcome::Found(WeatherResult::from_reading(
            locality.name,
            reading,
        )))
    }
}

fn log_failure(stage: Stage, error: &crate::utils::error::WeatherError) {
    tracing::error!(
        %stage,
        category = ?error.category(),
        "Pipeline failed: {}",
        error
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{LocalityResult, TemperatureReading};
    use crate::utils::error::WeatherError;
    use crate::utils::trace::Tracer;
    use async_trait::async_trait;
    use axum::http::HeaderMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    struct MockDirectory {
        result: fn() -> Result<LocalityResult>,
        calls: AtomicUsize,
    }

    impl MockDirectory {
        fn new(result: fn() -> Result<LocalityResult>) -> Arc<Self> {
            Arc::new(Self {
                result,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl LocalityDirectory for MockDirectory {
        async fn resolve(&self, _ctx: &RequestContext, _code: &str) -> Result<LocalityResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.result)()
        }
    }

    struct MockWeather {
        result: fn() -> Result<TemperatureReading>,
        localities: Mutex<Vec<String>>,
    }

    impl MockWeather {
        fn new(result: fn() -> Result<TemperatureReading>) -> Arc<Self> {
            Arc::new(Self {
                result,
                localities: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl WeatherSource for MockWeather {
        async fn current_temperature(
            &self,
            _ctx: &RequestContext,
            locality: &str,
        ) -> Result<TemperatureReading> {
            self.localities.lock().await.push(locality.to_string());
            (self.result)()
        }
    }

    fn context() -> RequestContext {
        Tracer::new("test").start(&HeaderMap::new(), "test")
    }

    #[tokio::test]
    async fn test_found_locality_is_converted() {
        let directory = MockDirectory::new(|| Ok(LocalityResult::found("São Paulo")));
        let weather = MockWeather::new(|| Ok(TemperatureReading { celsius: 25.0 }));
        let pipeline = WeatherPipeline::new(directory.clone(), weather.clone());

        let outcome = pipeline.run(&context(), "01001000").await.unwrap();

        assert_eq!(
            outcome,
            LookupOutcome::Found(WeatherResult {
                city: "São Paulo".to_string(),
                celsius: 25.0,
                fahrenheit: 77.0,
                kelvin: 298.0,
            })
        );
        assert_eq!(*weather.localities.lock().await, vec!["São Paulo"]);
    }

    #[tokio::test]
    async fn test_not_found_skips_weather() {
        let directory = MockDirectory::new(|| Ok(LocalityResult::not_found()));
        let weather = MockWeather::new(|| Ok(TemperatureReading { celsius: 25.0 }));
        let pipeline = WeatherPipeline::new(directory.clone(), weather.clone());

        let outcome = pipeline.run(&context(), "99999999").await.unwrap();

        assert_eq!(outcome, LookupOutcome::NotFound);
        assert_eq!(directory.calls.load(Ordering::SeqCst), 1);
        assert!(weather.localities.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_directory_fault_is_terminal() {
        let directory = MockDirectory::new(|| {
            Err(WeatherError::UpstreamStatusError {
                service: "directory",
                status: 503,
            })
        });
        let weather = MockWeather::new(|| Ok(TemperatureReading { celsius: 25.0 }));
        let pipeline = WeatherPipeline::new(directory.clone(), weather.clone());

        let result = pipeline.run(&context(), "01001000").await;

        assert!(matches!(
            result,
            Err(WeatherError::UpstreamStatusError { status: 503, .. })
        ));
        assert_eq!(directory.calls.load(Ordering::SeqCst), 1);
        assert!(weather.localities.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_weather_fault_is_terminal() {
        let directory = MockDirectory::new(|| Ok(LocalityResult::found("Recife")));
        let weather = MockWeather::new(|| {
            Err(WeatherError::UpstreamStatusError {
                service: "weather",
                status: 401,
            })
        });
        let pipeline = WeatherPipeline::new(directory.clone(), weather.clone());

        let result = pipeline.run(&context(), "50010000").await;

        assert!(matches!(
            result,
            Err(WeatherError::UpstreamStatusError {
                service: "weather",
                ..
            })
        ));
        assert_eq!(weather.localities.lock().await.len(), 1);
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::ResolvingLocality.to_string(), "resolving_locality");
        assert_eq!(Stage::FetchingWeather.to_string(), "fetching_weather");
    }
}
