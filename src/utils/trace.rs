//! W3C Trace Context propagation and per-request context.
//!
//! Every inbound request gets a [`RequestContext`] wrapping a `tracing` span
//! that the OpenTelemetry layer turns into an exported span. The remote parent
//! is taken from the inbound `traceparent` header, and outbound calls to the
//! wrapper carry the current span's context in the same header.

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use opentelemetry::{
    global,
    propagation::{Extractor, Injector},
    trace::TraceContextExt,
};
use std::sync::Arc;
use tracing::{field, Span};
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// W3C Trace Context header name
pub const TRACEPARENT: &str = "traceparent";

struct HeadersExtractor<'a>(&'a HeaderMap);

impl<'a> Extractor for HeadersExtractor<'a> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|k| k.as_str()).collect()
    }
}

struct HeadersInjector<'a>(&'a mut HeaderMap);

impl<'a> Injector for HeadersInjector<'a> {
    fn set(&mut self, key: &str, value: String) {
        if let Ok(name) = HeaderName::from_bytes(key.as_bytes()) {
            if let Ok(val) = HeaderValue::from_str(&value) {
                self.0.insert(name, val);
            }
        }
    }
}

/// Parent `span` on the trace carried by `headers`. Without a valid
/// `traceparent` the span stays a root.
pub fn set_parent_from_headers(span: &Span, headers: &HeaderMap) {
    let parent_cx =
        global::get_text_map_propagator(|propagator| propagator.extract(&HeadersExtractor(headers)));
    let _ = span.set_parent(parent_cx);
}

/// Write `span`'s context into outbound headers.
pub fn inject_span(span: &Span, headers: &mut HeaderMap) {
    let cx = span.context();
    global::get_text_map_propagator(|propagator| {
        propagator.inject_context(&cx, &mut HeadersInjector(headers));
    });
}

/// Hex trace id of `span`, if the OpenTelemetry layer has assigned one.
pub fn trace_id(span: &Span) -> Option<String> {
    let cx = span.context();
    let span_ref = cx.span();
    let span_context = span_ref.span_context();
    span_context
        .is_valid()
        .then(|| span_context.trace_id().to_string())
}

/// Per-request state threaded through every stage of a service.
#[derive(Debug, Clone)]
pub struct RequestContext {
    service: Arc<str>,
    span: Span,
}

impl RequestContext {
    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn trace_id(&self) -> Option<String> {
        trace_id(&self.span)
    }

    /// Context for an outbound call: a client span parented to this one.
    pub fn child(&self, operation: &'static str) -> Self {
        let span = tracing::info_span!(
            parent: &self.span,
            "call",
            otel.name = operation,
            otel.kind = "client",
            service = %self.service,
            operation,
        );
        Self {
            service: Arc::clone(&self.service),
            span,
        }
    }

    /// Carry this context's trace in `headers`.
    pub fn inject(&self, headers: &mut HeaderMap) {
        inject_span(&self.span, headers);
    }
}

/// Builds request contexts for one service. Constructed once at startup and
/// handed to the router state.
#[derive(Debug, Clone)]
pub struct Tracer {
    service: Arc<str>,
}

impl Tracer {
    pub fn new(service: &str) -> Self {
        Self {
            service: Arc::from(service),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Begin handling an inbound request, continuing the caller's trace when
    /// `headers` carry one.
    pub fn start(&self, headers: &HeaderMap, operation: &'static str) -> RequestContext {
        let span = tracing::info_span!(
            "request",
            otel.name = operation,
            otel.kind = "server",
            service = %self.service,
            operation,
            trace_id = field::Empty,
        );
        set_parent_from_headers(&span, headers);
        if let Some(id) = trace_id(&span) {
            span.record("trace_id", id.as_str());
        }

        RequestContext {
            service: Arc::clone(&self.service),
            span,
        }
    }
}
