pub mod toml_config;

pub use toml_config::TomlConfig;

use crate::utils::error::{Result, WeatherError};
use crate::utils::logger::LogOptions;
use crate::utils::validation::{validate_non_empty_string, validate_range, validate_url, Validate};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_ORCHESTRATOR_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_WRAPPER_ADDR: &str = "0.0.0.0:8081";
pub const DEFAULT_WRAPPER_URL: &str = "http://localhost:8081/";
pub const DEFAULT_DIRECTORY_URL: &str = "https://viacep.com.br/";
pub const DEFAULT_WEATHER_URL: &str = "https://api.weatherapi.com/";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, Default, Parser)]
#[command(name = "weather-man")]
#[command(about = "Validates a CEP and relays the temperature lookup to the wrapper service")]
pub struct OrchestratorCli {
    #[arg(long, env = "LISTEN_ADDR", help = "Address to listen on [default: 0.0.0.0:8080]")]
    pub listen_addr: Option<String>,

    #[arg(long, env = "WRAPPER_URL", help = "Wrapper service endpoint")]
    pub wrapper_url: Option<String>,

    #[arg(long, env = "REQUEST_TIMEOUT_SECS", help = "Timeout for the wrapper call")]
    pub request_timeout_secs: Option<u64>,

    #[arg(long, short, help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[arg(
        long,
        env = "OTEL_EXPORTER_OTLP_TRACES_ENDPOINT",
        help = "OTLP/HTTP traces URL, e.g. http://localhost:4318/v1/traces"
    )]
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone, Default, Parser)]
#[command(name = "weather-api-wrapper")]
#[command(about = "Resolves a CEP to a city and returns its current temperature")]
pub struct WrapperCli {
    #[arg(long, env = "LISTEN_ADDR", help = "Address to listen on [default: 0.0.0.0:8081]")]
    pub listen_addr: Option<String>,

    #[arg(long, env = "DIRECTORY_URL", help = "Postal code directory base URL")]
    pub directory_url: Option<String>,

    #[arg(long, env = "WEATHER_URL", help = "Weather provider base URL")]
    pub weather_url: Option<String>,

    #[arg(long, env = "WEATHER_API_KEY", hide_env_values = true)]
    pub weather_api_key: Option<String>,

    #[arg(long, env = "REQUEST_TIMEOUT_SECS", help = "Timeout for each provider call")]
    pub request_timeout_secs: Option<u64>,

    #[arg(long, short, help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[arg(
        long,
        env = "OTEL_EXPORTER_OTLP_TRACES_ENDPOINT",
        help = "OTLP/HTTP traces URL, e.g. http://localhost:4318/v1/traces"
    )]
    pub otlp_endpoint: Option<String>,
}

/// Load the `--config` file, if one was given.
pub fn load_file(path: Option<&PathBuf>) -> Result<Option<TomlConfig>> {
    path.map(TomlConfig::from_file).transpose()
}

pub fn log_options(verbose: bool, json: bool, file: Option<&TomlConfig>) -> LogOptions {
    let logging = file.map(|f| &f.logging);
    LogOptions {
        verbose: verbose || logging.and_then(|l| l.verbose).unwrap_or(false),
        json: json || logging.and_then(|l| l.json).unwrap_or(false),
    }
}

/// Where spans are exported, if anywhere. Command line (or env) first, then
/// the file.
pub fn otlp_endpoint(cli: Option<&str>, file: Option<&TomlConfig>) -> Result<Option<String>> {
    let endpoint = cli.or(file.and_then(|f| f.tracing.otlp_endpoint.as_deref()));
    if let Some(endpoint) = endpoint {
        validate_url("otlp_endpoint", endpoint)?;
    }
    Ok(endpoint.map(str::to_string))
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorSettings {
    pub listen_addr: SocketAddr,
    pub wrapper_url: Url,
    pub request_timeout: Duration,
}

impl OrchestratorSettings {
    /// Command line (or env) first, then the file, then built-in defaults.
    pub fn resolve(cli: &OrchestratorCli, file: Option<&TomlConfig>) -> Result<Self> {
        let listen_addr = pick(
            cli.listen_addr.as_deref(),
            file.and_then(|f| f.server.listen_addr.as_deref()),
            DEFAULT_ORCHESTRATOR_ADDR,
        );
        let wrapper_url = pick(
            cli.wrapper_url.as_deref(),
            file.and_then(|f| f.downstream.wrapper_url.as_deref()),
            DEFAULT_WRAPPER_URL,
        );
        let timeout = cli
            .request_timeout_secs
            .or(file.and_then(|f| f.http.request_timeout_seconds))
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        validate_url("wrapper_url", wrapper_url)?;
        validate_range("request_timeout_secs", timeout, 1, MAX_REQUEST_TIMEOUT_SECS)?;

        Ok(Self {
            listen_addr: parse_addr("listen_addr", listen_addr)?,
            wrapper_url: Url::parse(wrapper_url)?,
            request_timeout: Duration::from_secs(timeout),
        })
    }
}

impl Validate for OrchestratorSettings {
    fn validate(&self) -> Result<()> {
        validate_url("wrapper_url", self.wrapper_url.as_str())?;
        validate_range(
            "request_timeout_secs",
            self.request_timeout.as_secs(),
            1,
            MAX_REQUEST_TIMEOUT_SECS,
        )?;
        tracing::debug!("Orchestrator configuration validation passed");
        Ok(())
    }
}

#[derive(Clone, PartialEq)]
pub struct WrapperSettings {
    pub listen_addr: SocketAddr,
    pub directory_url: Url,
    pub weather_url: Url,
    pub weather_api_key: String,
    pub request_timeout: Duration,
}

impl std::fmt::Debug for WrapperSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WrapperSettings")
            .field("listen_addr", &self.listen_addr)
            .field("directory_url", &self.directory_url.as_str())
            .field("weather_url", &self.weather_url.as_str())
            .field("weather_api_key", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl WrapperSettings {
    /// Command line (or env) first, then the file, then built-in defaults.
    /// There is no default API key.
    pub fn resolve(cli: &WrapperCli, file: Option<&TomlConfig>) -> Result<Self> {
        let providers = file.map(|f| &f.providers);
        let listen_addr = pick(
            cli.listen_addr.as_deref(),
            file.and_then(|f| f.server.listen_addr.as_deref()),
            DEFAULT_WRAPPER_ADDR,
        );
        let directory_url = pick(
            cli.directory_url.as_deref(),
            providers.and_then(|p| p.directory_url.as_deref()),
            DEFAULT_DIRECTORY_URL,
        );
        let weather_url = pick(
            cli.weather_url.as_deref(),
            providers.and_then(|p| p.weather_url.as_deref()),
            DEFAULT_WEATHER_URL,
        );
        let weather_api_key = cli
            .weather_api_key
            .as_deref()
            .or(providers.and_then(|p| p.weather_api_key.as_deref()))
            .ok_or_else(|| WeatherError::MissingConfigError {
                field: "weather_api_key".to_string(),
            })?;
        let timeout = cli
            .request_timeout_secs
            .or(file.and_then(|f| f.http.request_timeout_seconds))
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        validate_url("directory_url", directory_url)?;
        validate_url("weather_url", weather_url)?;
        validate_range("request_timeout_secs", timeout, 1, MAX_REQUEST_TIMEOUT_SECS)?;

        Ok(Self {
            listen_addr: parse_addr("listen_addr", listen_addr)?,
            directory_url: Url::parse(directory_url)?,
            weather_url: Url::parse(weather_url)?,
            weather_api_key: weather_api_key.to_string(),
            request_timeout: Duration::from_secs(timeout),
        })
    }
}

impl Validate for WrapperSettings {
    fn validate(&self) -> Result<()> {
        validate_url("directory_url", self.directory_url.as_str())?;
        validate_url("weather_url", self.weather_url.as_str())?;
        // Unresolved ${VAR} placeholders count as missing.
        if self.weather_api_key.starts_with("${") {
            return Err(WeatherError::MissingConfigError {
                field: "weather_api_key".to_string(),
            });
        }
        validate_non_empty_string("weather_api_key", &self.weather_api_key)?;
        validate_range(
            "request_timeout_secs",
            self.request_timeout.as_secs(),
            1,
            MAX_REQUEST_TIMEOUT_SECS,
        )?;
        tracing::debug!("Wrapper configuration validation passed");
        Ok(())
    }
}

fn pick<'a>(cli: Option<&'a str>, file: Option<&'a str>, default: &'a str) -> &'a str {
    cli.or(file).unwrap_or(default)
}

fn parse_addr(field: &str, value: &str) -> Result<SocketAddr> {
    value
        .parse()
        .map_err(|e: std::net::AddrParseError| WeatherError::InvalidConfigValueError {
            field: field.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::toml_config::{HttpSection, LoggingSection, ProvidersSection, TracingSection};

    fn wrapper_cli_with_key() -> WrapperCli {
        WrapperCli {
            weather_api_key: Some("key-123".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_orchestrator_defaults() {
        let settings = OrchestratorSettings::resolve(&OrchestratorCli::default(), None).unwrap();
        assert_eq!(settings.listen_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(settings.wrapper_url.as_str(), DEFAULT_WRAPPER_URL);
        assert_eq!(settings.request_timeout, Duration::from_secs(10));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_cli_overrides_file() {
        let cli = OrchestratorCli {
            wrapper_url: Some("http://cli-wrapper:9000/".to_string()),
            ..Default::default()
        };
        let file = TomlConfig {
            downstream: toml_config::DownstreamSection {
                wrapper_url: Some("http://file-wrapper:9000/".to_string()),
            },
            http: HttpSection {
                request_timeout_seconds: Some(4),
            },
            ..Default::default()
        };

        let settings = OrchestratorSettings::resolve(&cli, Some(&file)).unwrap();
        assert_eq!(settings.wrapper_url.as_str(), "http://cli-wrapper:9000/");
        assert_eq!(settings.request_timeout, Duration::from_secs(4));
    }

    #[test]
    fn test_invalid_listen_addr() {
        let cli = OrchestratorCli {
            listen_addr: Some("not-an-addr".to_string()),
            ..Default::default()
        };
        let err = OrchestratorSettings::resolve(&cli, None).unwrap_err();
        assert!(matches!(err, WeatherError::InvalidConfigValueError { field, .. } if field == "listen_addr"));
    }

    #[test]
    fn test_timeout_out_of_range() {
        let cli = OrchestratorCli {
            request_timeout_secs: Some(0),
            ..Default::default()
        };
        assert!(OrchestratorSettings::resolve(&cli, None).is_err());
    }

    #[test]
    fn test_wrapper_requires_api_key() {
        let err = WrapperSettings::resolve(&WrapperCli::default(), None).unwrap_err();
        assert!(matches!(err, WeatherError::MissingConfigError { field } if field == "weather_api_key"));
    }

    #[test]
    fn test_wrapper_defaults() {
        let settings = WrapperSettings::resolve(&wrapper_cli_with_key(), None).unwrap();
        assert_eq!(settings.listen_addr, "0.0.0.0:8081".parse().unwrap());
        assert_eq!(settings.directory_url.as_str(), DEFAULT_DIRECTORY_URL);
        assert_eq!(settings.weather_url.as_str(), DEFAULT_WEATHER_URL);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_wrapper_key_from_file() {
        let file = TomlConfig {
            providers: ProvidersSection {
                weather_api_key: Some("file-key".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let settings = WrapperSettings::resolve(&WrapperCli::default(), Some(&file)).unwrap();
        assert_eq!(settings.weather_api_key, "file-key");
    }

    #[test]
    fn test_wrapper_rejects_placeholder_and_blank_key() {
        let mut cli = wrapper_cli_with_key();
        cli.weather_api_key = Some("${WEATHER_API_KEY}".to_string());
        let settings = WrapperSettings::resolve(&cli, None).unwrap();
        assert!(settings.validate().is_err());

        cli.weather_api_key = Some("  ".to_string());
        let settings = WrapperSettings::resolve(&cli, None).unwrap();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_wrapper_rejects_bad_provider_url() {
        let mut cli = wrapper_cli_with_key();
        cli.weather_url = Some("ftp://weather".to_string());
        assert!(WrapperSettings::resolve(&cli, None).is_err());
    }

    #[test]
    fn test_debug_hides_api_key() {
        let settings = WrapperSettings::resolve(&wrapper_cli_with_key(), None).unwrap();
        assert!(!format!("{:?}", settings).contains("key-123"));
    }

    #[test]
    fn test_log_options_merge() {
        let file = TomlConfig {
            logging: LoggingSection {
                verbose: None,
                json: Some(true),
            },
            ..Default::default()
        };
        let options = log_options(true, false, Some(&file));
        assert!(options.verbose);
        assert!(options.json);
        assert_eq!(log_options(false, false, None), LogOptions::default());
    }

    #[test]
    fn test_otlp_endpoint_resolution() {
        assert_eq!(otlp_endpoint(None, None).unwrap(), None);

        let file = TomlConfig {
            tracing: TracingSection {
                otlp_endpoint: Some("http://collector:4318/v1/traces".to_string()),
            },
            ..Default::default()
        };
        assert_eq!(
            otlp_endpoint(None, Some(&file)).unwrap().as_deref(),
            Some("http://collector:4318/v1/traces")
        );
        assert_eq!(
            otlp_endpoint(Some("http://cli:4318/v1/traces"), Some(&file))
                .unwrap()
                .as_deref(),
            Some("http://cli:4318/v1/traces")
        );
        assert!(otlp_endpoint(Some("collector:4318"), None).is_err());
    }

    #[test]
    fn test_cli_parses_flags() {
        let cli = WrapperCli::parse_from([
            "weather-api-wrapper",
            "--weather-api-key",
            "k",
            "--request-timeout-secs",
            "5",
            "--verbose",
        ]);
        assert_eq!(cli.weather_api_key.as_deref(), Some("k"));
        assert_eq!(cli.request_timeout_secs, Some(5));
        assert!(cli.verbose);
    }
}
