//! Tracing and OpenTelemetry setup for the notifier.
//!
//! Hook logs always go to stderr through a fmt layer, so CLI output on
//! stdout stays machine-readable. With an OTLP endpoint configured, hook
//! spans, notifier metrics and log records are exported there too.

pub mod hook;
pub mod metrics;

use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;

use crate::config::Config;
use crate::error::{Error, Result};

/// Service name reported on the OTLP resource.
pub const SERVICE_NAME: &str = "erpspace";

/// Instrumentation scope shared by the tracer and the meter.
pub const SCOPE: &str = "erpspace-rs";

pub struct TelemetryConfig {
    /// OTLP gRPC endpoint, e.g. "http://localhost:4317". `None` keeps
    /// everything local.
    pub endpoint: Option<String>,
    pub service_name: String,
    /// Filter used when `RUST_LOG` is unset (e.g. "info", "erpspace_rs=debug").
    pub log_level: String,
}

impl TelemetryConfig {
    pub fn new(endpoint: Option<String>, log_level: impl Into<String>) -> Self {
        Self {
            endpoint,
            service_name: SERVICE_NAME.to_string(),
            log_level: log_level.into(),
        }
    }

    /// `OTEL_ENDPOINT` and `LOG_LEVEL` only, for commands that run without
    /// a database. Quieter than the hook default so dry-run output stays
    /// readable.
    pub fn from_env() -> Self {
        Self::new(
            std::env::var("OTEL_ENDPOINT").ok(),
            std::env::var("LOG_LEVEL").unwrap_or_else(|_| "warn".to_string()),
        )
    }
}

impl From<&Config> for TelemetryConfig {
    fn from(config: &Config) -> Self {
        Self::new(config.otel_endpoint.clone(), config.log_level.clone())
    }
}

/// The three OTLP providers, built together against one endpoint.
struct OtlpPipelines {
    tracer: SdkTracerProvider,
    meter: SdkMeterProvider,
    logger: SdkLoggerProvider,
}

impl OtlpPipelines {
    fn build(endpoint: &str, service_name: String) -> Result<Self> {
        use opentelemetry_otlp::{LogExporter, MetricExporter, SpanExporter, WithExportConfig as _};

        let resource = opentelemetry_sdk::Resource::builder()
            .with_service_name(service_name)
            .with_attribute(opentelemetry::KeyValue::new(
                opentelemetry_semantic_conventions::resource::SERVICE_VERSION,
                env!("CARGO_PKG_VERSION"),
            ))
            .build();

        let spans = SpanExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint)
            .build()
            .map_err(|e| exporter_error("span", e))?;
        let metrics = MetricExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint)
            .build()
            .map_err(|e| exporter_error("metric", e))?;
        let logs = LogExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint)
            .build()
            .map_err(|e| exporter_error("log", e))?;

        Ok(Self {
            tracer: SdkTracerProvider::builder()
                .with_batch_exporter(spans)
                .with_resource(resource.clone())
                .build(),
            meter: SdkMeterProvider::builder()
                .with_periodic_exporter(metrics)
                .with_resource(resource.clone())
                .build(),
            logger: SdkLoggerProvider::builder()
                .with_batch_exporter(logs)
                .with_resource(resource)
                .build(),
        })
    }

    fn flush(&self) {
        let _ = self.tracer.force_flush();
        let _ = self.meter.force_flush();
        let _ = self.logger.force_flush();
    }

    /// Logs first, so records emitted while spans close still get out.
    fn shutdown(self) {
        let _ = self.logger.shutdown();
        let _ = self.meter.shutdown();
        let _ = self.tracer.shutdown();
    }
}

/// Keeps the OTLP pipelines alive; flushes and shuts them down on drop.
/// Hold it for as long as hooks may run.
pub struct TelemetryGuard {
    otlp: Option<OtlpPipelines>,
}

impl TelemetryGuard {
    /// Whether spans and metrics leave the process.
    pub fn is_exporting(&self) -> bool {
        self.otlp.is_some()
    }

    pub fn force_flush(&self) {
        if let Some(ref otlp) = self.otlp {
            otlp.flush();
        }
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(otlp) = self.otlp.take() {
            otlp.shutdown();
        }
    }
}

/// Install the global subscriber, and the OTLP pipelines when an endpoint
/// is configured.
///
/// # Errors
///
/// Fails if an OTLP exporter cannot be built or a global subscriber is
/// already installed.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard> {
    use opentelemetry::trace::TracerProvider as _;
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::layer::SubscriberExt as _;
    use tracing_subscriber::util::SubscriberInitExt as _;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let stderr = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let Some(endpoint) = config.endpoint.as_deref() else {
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr)
            .try_init()
            .map_err(subscriber_error)?;
        return Ok(TelemetryGuard { otlp: None });
    };

    let otlp = OtlpPipelines::build(endpoint, config.service_name)?;
    opentelemetry::global::set_meter_provider(otlp.meter.clone());

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr.compact())
        .with(tracing_opentelemetry::layer().with_tracer(otlp.tracer.tracer(SCOPE)))
        .with(opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge::new(&otlp.logger))
        .try_init()
        .map_err(subscriber_error)?;

    Ok(TelemetryGuard { otlp: Some(otlp) })
}

fn exporter_error(signal: &str, err: impl std::fmt::Display) -> Error {
    Error::Other(format!("failed to create OTLP {signal} exporter: {err}"))
}

fn subscriber_error(err: impl std::fmt::Display) -> Error {
    Error::Other(format!("failed to init tracing subscriber: {err}"))
}
