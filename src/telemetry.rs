use std::path::Path;

use anyhow::{Context, anyhow};
use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::SpanExporter;
use opentelemetry_sdk::{Resource, trace::SdkTracerProvider};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::Layer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt as _, util::SubscriberInitExt as _};

/// Setting this enables OTLP trace export
const OTLP_ENDPOINT_ENV: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

const DEFAULT_FILTER: &str = "site2md=info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn init_traces() -> anyhow::Result<SdkTracerProvider> {
    let exporter = SpanExporter::builder()
        .with_http()
        .build()
        .context("Failed to create trace exporter")?;

    Ok(SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(Resource::builder().with_service_name("site2md").build())
        .build())
}

// Console logging always; a file layer when `log_file` is given; OTLP export
// when the endpoint variable is set.
pub fn init_tracing_subscriber(log_file: Option<&Path>) -> anyhow::Result<TelemetryGuard> {
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(env_filter());

    let (file_layer, file_guard) = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| anyhow!("log file path has no file name: {}", path.display()))?;
            std::fs::create_dir_all(dir)?;

            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(env_filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let tracer_provider = match std::env::var_os(OTLP_ENDPOINT_ENV) {
        Some(_) => Some(init_traces()?),
        None => None,
    };
    let otel_layer = tracer_provider
        .as_ref()
        .map(|provider| OpenTelemetryLayer::new(provider.tracer("site2md")));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(otel_layer)
        .init();

    Ok(TelemetryGuard {
        tracer_provider,
        _file_guard: file_guard,
    })
}

/// Flushes exporters and file logging on drop
pub struct TelemetryGuard {
    tracer_provider: Option<SdkTracerProvider>,
    _file_guard: Option<WorkerGuard>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.tracer_provider.take() {
            if let Err(err) = provider.shutdown() {
                eprintln!("{err:?}");
            }
        }
    }
}
