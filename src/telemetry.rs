use once_cell::sync::Lazy;
use opentelemetry::{KeyValue, trace::TracerProvider as _};
use opentelemetry_otlp::{Protocol, WithExportConfig, WithTonicConfig};
use opentelemetry_sdk::{
    Resource,
    trace::{RandomIdGenerator, Sampler, SdkTracerProvider},
};
use opentelemetry_semantic_conventions::{
    SCHEMA_URL,
    attribute::{SERVICE_NAME, SERVICE_VERSION},
    resource::DEPLOYMENT_ENVIRONMENT_NAME,
};
use rocket::{
    Data, Orbit, Request, Response, Rocket,
    fairing::{Fairing, Info, Kind},
};
use std::sync::Mutex;
use std::time::Instant;
use tonic::metadata::MetadataMap;
use tracing::info_span;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

static TELEMETRY_GUARD: Lazy<Mutex<Option<OtelGuard>>> = Lazy::new(|| Mutex::new(None));

pub struct TelemetryFairing;

#[rocket::async_trait]
impl Fairing for TelemetryFairing {
    fn info(&self) -> Info {
        Info {
            name: "OpenTelemetry",
            kind: Kind::Request | Kind::Response | Kind::Shutdown,
        }
    }

    async fn on_shutdown(&self, _rocket: &Rocket<Orbit>) {
        shutdown_telemetry();
    }

    async fn on_request(&self, request: &mut Request<'_>, _: &mut Data<'_>) {
        let method = request.method().to_string();
        let uri = request.uri().path().to_string();

        let start_time = Instant::now();

        let span = info_span!(
            "http_request",
            otel.name = format!("{} {}", method, uri),
            http.method = method,
            http.uri = uri,
            http.status_code = tracing::field::Empty,
            http.duration_ms = tracing::field::Empty,
        );

        request.local_cache(|| (span, start_time));
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        let (span, start_time) = request.local_cache(|| {
            let span = info_span!("http_request");
            (span, Instant::now())
        });

        let elapsed_ms = start_time.elapsed().as_millis() as i64;
        let status = response.status().code;

        span.record("http.status_code", status);
        span.record("http.duration_ms", elapsed_ms);

        let _entered = span.enter();
        if status >= 500 {
            tracing::warn!(status, elapsed_ms, "Request failed");
        } else {
            tracing::info!(status, elapsed_ms, "Request completed");
        }
    }
}

fn resource() -> Resource {
    let environment = dotenvy::var("ROCKET_PROFILE").unwrap_or_else(|_| "develop".to_string());
    Resource::builder()
        .with_schema_url(
            [
                KeyValue::new(SERVICE_NAME, env!("CARGO_PKG_NAME")),
                KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
                KeyValue::new(DEPLOYMENT_ENVIRONMENT_NAME, environment),
            ],
            SCHEMA_URL,
        )
        .build()
}

fn init_tracer_provider(honeycomb_api_key: &str) -> anyhow::Result<SdkTracerProvider> {
    let mut metadata = MetadataMap::new();
    metadata.insert("x-honeycomb-team", honeycomb_api_key.parse()?);

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint("https://api.honeycomb.io:443")
        .with_tls_config(tonic::transport::ClientTlsConfig::new().with_native_roots())
        .with_protocol(Protocol::Grpc)
        .with_metadata(metadata)
        .build()?;

    let tracer_provider = SdkTracerProvider::builder()
        .with_sampler(Sampler::AlwaysOn)
        .with_id_generator(RandomIdGenerator::default())
        .with_resource(resource())
        .with_batch_exporter(exporter)
        .build();

    Ok(tracer_provider)
}

pub struct OtelGuard {
    tracer_provider: SdkTracerProvider,
}

impl Drop for OtelGuard {
    fn drop(&mut self) {
        if let Err(err) = self.tracer_provider.shutdown() {
            eprintln!("Failed to shut down tracer provider: {:?}", err);
        }
    }
}

/// Installs the global subscriber: an env filter and fmt output, plus an OTLP exporter
/// to Honeycomb when `HONEYCOMB_API_KEY` is set.
pub fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let exporter = match dotenvy::var("HONEYCOMB_API_KEY") {
        Ok(key) if !key.is_empty() => match init_tracer_provider(&key) {
            Ok(provider) => Some(provider),
            Err(err) => {
                eprintln!("Honeycomb exporter disabled: {}", err);
                None
            }
        },
        _ => None,
    };

    let otel_layer = exporter
        .as_ref()
        .map(|provider| OpenTelemetryLayer::new(provider.tracer("fittrack")));

    let initialised = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(otel_layer)
        .try_init();

    if let Err(err) = initialised {
        eprintln!("Tracing subscriber already set: {}", err);
        return;
    }

    if let Some(tracer_provider) = exporter {
        if let Ok(mut guard) = TELEMETRY_GUARD.lock() {
            *guard = Some(OtelGuard { tracer_provider });
        }
    }
}

pub fn shutdown_telemetry() {
    tracing::info!("Shutting down telemetry...");

    let guard = TELEMETRY_GUARD.lock().ok().and_then(|mut g| g.take());
    drop(guard);
}
