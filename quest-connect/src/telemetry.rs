//! Logging and `OpenTelemetry` export for the CLI.
//!
//! [`Telemetry`] installs a `tracing` subscriber with an [`EnvFilter`] and a
//! stderr console layer. When `OTEL_EXPORTER_OTLP_ENDPOINT` is set, spans and
//! metrics are also exported over OTLP/HTTP. Only available with the
//! `telemetry` feature.

use std::env;
use std::time::Duration;

use opentelemetry::trace::TracerProvider;
use opentelemetry::{KeyValue, global};
use opentelemetry_otlp::{MetricExporter, SpanExporter};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_semantic_conventions::attribute::SERVICE_VERSION;
use tracing_opentelemetry::{MetricsLayer, OpenTelemetryLayer};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Metric export interval; CLI runs are short.
const METRIC_INTERVAL: Duration = Duration::from_secs(5);

fn otlp_configured() -> bool {
    env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok_and(|v| !v.trim().is_empty())
}

/// Service identity and log level for the subscriber.
#[derive(Debug, Default)]
pub struct Telemetry {
    name: &'static str,
    version: &'static str,
    log_level: Option<String>,
}

impl Telemetry {
    /// Creates a new, empty [`Telemetry`] instance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the service name reported to the collector.
    #[must_use]
    pub const fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Sets the service version reported to the collector.
    #[must_use]
    pub const fn with_version(mut self, version: &'static str) -> Self {
        self.version = version;
        self
    }

    /// Sets the log filter used when `RUST_LOG` is not set
    /// (e.g. `"quest_connect=debug"`).
    #[must_use]
    pub fn with_log_level(mut self, level: Option<impl Into<String>>) -> Self {
        self.log_level = level.map(Into::into);
        self
    }

    fn resource(&self) -> Resource {
        Resource::builder()
            .with_service_name(self.name)
            .with_attribute(KeyValue::new(SERVICE_VERSION, self.version))
            .build()
    }

    fn exporters(&self) -> Option<(SdkTracerProvider, SdkMeterProvider)> {
        let spans = SpanExporter::builder().with_http().build().ok()?;
        let metrics = MetricExporter::builder().with_http().build().ok()?;

        let tracer = SdkTracerProvider::builder()
            .with_resource(self.resource())
            .with_batch_exporter(spans)
            .build();
        let reader = PeriodicReader::builder(metrics)
            .with_interval(METRIC_INTERVAL)
            .build();
        let meter = SdkMeterProvider::builder()
            .with_resource(self.resource())
            .with_reader(reader)
            .build();
        global::set_meter_provider(meter.clone());
        Some((tracer, meter))
    }

    /// Installs the global subscriber.
    ///
    /// Returns a [`TelemetryGuard`] that flushes exporters on drop; keep it
    /// alive until the command finishes.
    pub fn register(self) -> TelemetryGuard {
        let providers = if otlp_configured() {
            self.exporters()
        } else {
            None
        };

        let otel_layer = providers
            .as_ref()
            .map(|(tp, _)| OpenTelemetryLayer::new(tp.tracer(self.name)));
        let metrics_layer = providers
            .as_ref()
            .map(|(_, mp)| MetricsLayer::new(mp.clone()));

        let fallback = self.log_level.as_deref().unwrap_or("warn");
        tracing_subscriber::registry()
            .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .with(metrics_layer)
            .with(otel_layer)
            .init();

        if providers.is_some() {
            tracing::debug!("OTLP export enabled");
        }
        TelemetryGuard { providers }
    }
}

/// Flushes and shuts the OTLP providers down on drop.
#[derive(Debug)]
pub struct TelemetryGuard {
    providers: Option<(SdkTracerProvider, SdkMeterProvider)>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        let Some((tracer, meter)) = &self.providers else {
            return;
        };
        if let Err(err) = tracer.shutdown() {
            tracing::error!(?err, "tracer provider shutdown error");
        }
        if let Err(err) = meter.shutdown() {
            tracing::error!(?err, "meter provider shutdown error");
        }
    }
}
