use crate::utils::error::{Result, WeatherError};
use crate::utils::trace::Tracer;
use opentelemetry::{global, trace::TracerProvider as _, KeyValue};
use opentelemetry_otlp::{Protocol, WithExportConfig};
use opentelemetry_sdk::{
    propagation::TraceContextPropagator,
    trace::{Sampler, SdkTracerProvider},
    Resource,
};
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{
    layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt, EnvFilter,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogOptions {
    pub verbose: bool,
    pub json: bool,
}

fn env_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("cep_weather=debug,info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cep_weather=info"))
    }
}

/// Build the span pipeline for `service` and install the W3C propagator.
/// Every span is sampled. Spans are batch-exported over OTLP/HTTP when an
/// endpoint is given; without one they still carry trace ids for propagation
/// and log correlation.
pub fn init_tracer_provider(service: &str, otlp_endpoint: Option<&str>) -> Result<SdkTracerProvider> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    let resource = Resource::builder_empty()
        .with_attributes([KeyValue::new("service.name", service.to_string())])
        .build();
    let mut builder = SdkTracerProvider::builder()
        .with_sampler(Sampler::AlwaysOn)
        .with_resource(resource);

    if let Some(endpoint) = otlp_endpoint {
        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_http()
            .with_protocol(Protocol::HttpBinary)
            .with_endpoint(endpoint)
            .build()
            .map_err(|e| WeatherError::TelemetryError {
                message: format!("OTLP exporter build failed: {}", e),
            })?;
        builder = builder.with_batch_exporter(exporter);
    }

    Ok(builder.build())
}

/// Layer that turns `tracing` spans into OpenTelemetry spans of `provider`.
pub fn otel_layer<S>(
    provider: &SdkTracerProvider,
    service: &str,
) -> OpenTelemetryLayer<S, opentelemetry_sdk::trace::Tracer>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    tracing_opentelemetry::layer().with_tracer(provider.tracer(service.to_string()))
}

/// Install the global subscriber. Log lines go through a background writer;
/// the returned guard flushes it when dropped.
pub fn init_logger(options: LogOptions, provider: &SdkTracerProvider, service: &str) -> WorkerGuard {
    let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
    let filter = env_filter(options.verbose);

    if options.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(otel_layer(provider, service))
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_target(false)
                    .json()
                    .with_current_span(true),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(otel_layer(provider, service))
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .compact(),
            )
            .init();
    }

    guard
}

/// Process-wide observability handle: the log writer, the span exporter and
/// the service's [`Tracer`]. Created once in `main` before anything else and
/// shut down last.
pub struct Telemetry {
    tracer: Tracer,
    provider: SdkTracerProvider,
    guard: Option<WorkerGuard>,
}

impl Telemetry {
    pub fn init(service: &str, options: LogOptions, otlp_endpoint: Option<&str>) -> Result<Self> {
        let provider = init_tracer_provider(service, otlp_endpoint)?;
        let guard = init_logger(options, &provider, service);
        tracing::debug!(service, ?options, ?otlp_endpoint, "telemetry initialised");
        Ok(Self {
            tracer: Tracer::new(service),
            provider,
            guard: Some(guard),
        })
    }

    pub fn tracer(&self) -> Tracer {
        self.tracer.clone()
    }

    /// Export pending spans, then flush buffered log lines.
    pub fn shutdown(mut self) {
        tracing::info!(service = self.tracer.service(), "telemetry shutting down");
        if let Err(e) = self.provider.shutdown() {
            tracing::warn!("Span exporter shutdown failed: {}", e);
        }
        self.guard.take();
    }
}
