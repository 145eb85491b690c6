use anyhow::Context;
use cep_weather::app::{self, wrapper};
use cep_weather::config::{self, WrapperCli, WrapperSettings};
use cep_weather::utils::logger::Telemetry;
use cep_weather::utils::validation::Validate;
use clap::Parser;
use tokio::net::TcpListener;

const SERVICE_NAME: &str = "weather-api-wrapper";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = WrapperCli::parse();

    let file = config::load_file(cli.config.as_ref()).context("failed to load configuration file")?;
    let otlp_endpoint = config::otlp_endpoint(cli.otlp_endpoint.as_deref(), file.as_ref())
        .context("invalid tracing configuration")?;
    let telemetry = Telemetry::init(
        SERVICE_NAME,
        config::log_options(cli.verbose, cli.json_logs, file.as_ref()),
        otlp_endpoint.as_deref(),
    )
    .context("failed to initialise telemetry")?;

    // No listener is bound until the configuration is known to be usable.
    let settings = WrapperSettings::resolve(&cli, file.as_ref())
        .and_then(|settings| settings.validate().map(|_| settings))
        .context("invalid configuration")?;
    tracing::info!(
        directory_url = %settings.directory_url,
        weather_url = %settings.weather_url,
        timeout = ?settings.request_timeout,
        "Starting {}",
        SERVICE_NAME
    );

    let state = wrapper::WrapperState::from_settings(&settings, telemetry.tracer())
        .context("failed to build provider clients")?;
    let listener = TcpListener::bind(settings.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.listen_addr))?;

    app::serve(listener, wrapper::router(state), app::shutdown_signal()).await?;

    telemetry.shutdown();
    Ok(())
}
