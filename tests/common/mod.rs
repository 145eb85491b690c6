use cep_weather::utils::logger::{init_tracer_provider, otel_layer};
use opentelemetry_sdk::trace::SdkTracerProvider;
use std::sync::OnceLock;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

static PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();

/// Install a span pipeline without an exporter so requests carry real trace
/// context, as they do in the binaries.
pub fn init_tracing() {
    PROVIDER.get_or_init(|| {
        let provider = init_tracer_provider("integration-test", None).unwrap();
        let _ = tracing_subscriber::registry()
            .with(otel_layer(&provider, "integration-test"))
            .try_init();
        provider
    });
}
