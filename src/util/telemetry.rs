use std::time::Duration;

use opentelemetry::trace::TracerProvider;
use opentelemetry::{KeyValue, global};
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::{self, ExporterBuildError, Protocol, WithExportConfig};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use thiserror::Error;
use tracing::Subscriber;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::constants::TRACER_NAME;
use crate::util::env::Config;

const DEFAULT_FILTER: &str = "crewrank=debug,tower_http=debug,axum=debug,info";
const EXPORT_TIMEOUT: Duration = Duration::from_secs(5);

pub type TelemetryResult<T> = core::result::Result<T, TelemetryErr>;

#[derive(Debug, Error)]
pub enum TelemetryErr {
    #[error(transparent)]
    Exporter(#[from] ExporterBuildError),

    #[error(transparent)]
    Init(#[from] TryInitError),
}

/// Console logging, plus OTLP export of traces/logs/metrics when a collector is configured.
#[derive(Debug)]
pub struct Telemetry {
    providers: Option<OtlpProviders>,
}

#[derive(Debug, Clone)]
struct OtlpProviders {
    logger_provider: SdkLoggerProvider,
    tracer_provider: SdkTracerProvider,
    meter_provider: SdkMeterProvider,
}

impl Telemetry {
    pub fn new(config: &Config) -> TelemetryResult<Telemetry> {
        let Some(collector_url) = config.otlp_endpoint() else {
            return Ok(Self { providers: None });
        };

        let base_resource = base_attrs(
            config.api_service_name.clone(),
            env!("CARGO_PKG_VERSION"),
        );

        Ok(Self {
            providers: Some(OtlpProviders {
                logger_provider: build_logger_provider(collector_url, base_resource.clone())?,
                tracer_provider: build_tracer_provider(collector_url, base_resource.clone())?,
                meter_provider: build_meter_provider(collector_url, base_resource)?,
            }),
        })
    }

    pub fn register(self) -> TelemetryResult<Self> {
        match &self.providers {
            Some(p) => {
                global::set_tracer_provider(p.tracer_provider.clone());
                let tracer = p.tracer_provider.tracer(TRACER_NAME);

                tracing_subscriber::registry()
                    .with(tracing_opentelemetry::layer().with_tracer(tracer))
                    .with(OpenTelemetryTracingBridge::new(&p.logger_provider))
                    .with(tracing_opentelemetry::MetricsLayer::new(
                        p.meter_provider.clone(),
                    ))
                    .with(env_filter())
                    .with(fmt_layer())
                    .try_init()?;
            }

            None => {
                tracing_subscriber::registry()
                    .with(env_filter())
                    .with(fmt_layer())
                    .try_init()?;
            }
        }

        tracing::debug!(otlp = self.providers.is_some(), "telemetry registered");
        Ok(self)
    }

    pub fn shutdown(self) {
        let Some(p) = self.providers else {
            return;
        };

        if let Err(e) = p.meter_provider.shutdown() {
            eprintln!("error during metering shutdown: {e:?}");
        }

        if let Err(e) = p.logger_provider.shutdown() {
            eprintln!("error during logging shutdown: {e:?}");
        }

        if let Err(e) = p.tracer_provider.shutdown() {
            eprintln!("error during tracing shutdown: {e:?}");
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn fmt_layer<S>() -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
}

fn build_logger_provider(
    collector_url: &str,
    base_resource: Resource,
) -> TelemetryResult<SdkLoggerProvider> {
    let exporter = opentelemetry_otlp::LogExporter::builder()
        .with_tonic()
        .with_protocol(Protocol::Grpc)
        .with_endpoint(collector_url)
        .with_timeout(EXPORT_TIMEOUT)
        .build()?;

    Ok(SdkLoggerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(base_resource)
        .build())
}

fn build_tracer_provider(
    collector_url: &str,
    base_resource: Resource,
) -> TelemetryResult<SdkTracerProvider> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_protocol(Protocol::Grpc)
        .with_endpoint(collector_url)
        .with_timeout(EXPORT_TIMEOUT)
        .build()?;

    Ok(SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(base_resource)
        .build())
}

fn build_meter_provider(
    collector_url: &str,
    base_resource: Resource,
) -> TelemetryResult<SdkMeterProvider> {
    let exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_protocol(Protocol::Grpc)
        .with_endpoint(collector_url)
        .with_timeout(EXPORT_TIMEOUT)
        .build()?;

    Ok(SdkMeterProvider::builder()
        .with_periodic_exporter(exporter)
        .with_resource(base_resource)
        .build())
}

fn base_attrs(name: String, version: &'static str) -> Resource {
    Resource::builder()
        .with_attributes([
            KeyValue::new("service.name", name),
            KeyValue::new("service.version", version),
        ])
        .build()
}
