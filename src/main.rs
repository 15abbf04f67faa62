// src/main.rs
use anyhow::{Context, Result};
use hyper::{Body, Request, Response, Server, StatusCode};
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

use gateway_status::{
    config::{self, Config},
    metrics::MetricsRegistry,
    probe,
    server::{RequestHandler, ServerBuilder},
    status::StatusService,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gateway_status=debug".parse()?)
                .add_directive("access=info".parse()?)
                .add_directive("hyper=info".parse()?),
        )
        .init();

    // Load configuration
    let config = match std::env::args().nth(1) {
        Some(path) => {
            info!("Loading configuration from: {}", path);
            config::load_config(&path).await?
        }
        None => {
            info!("No configuration file given, using built-in defaults");
            Config::with_defaults()
        }
    };
    let config = Arc::new(config);

    let probe = probe::create_probe(&config);
    info!(
        probe = probe.name(),
        timeout = ?config.probe.timeout(),
        "Probing gateway on port {}",
        config.gateway.port
    );

    let mut service = StatusService::new(config.clone(), probe);

    // Start metrics server if enabled
    if config.metrics.enabled {
        let metrics_registry = MetricsRegistry::new()?;
        service = service.with_metrics(metrics_registry.collector());

        let ip: IpAddr = config.server.host.parse().context("Invalid server host")?;
        let metrics_addr = SocketAddr::new(ip, config.metrics.port);
        start_metrics_server(metrics_addr, metrics_registry, config.metrics.path.clone())?;
    }

    let handler = RequestHandler::new(service);

    let ip: IpAddr = config.server.host.parse().context("Invalid server host")?;
    let addr = SocketAddr::new(ip, config.server.port);
    info!("🚀 Gateway status server running on http://localhost:{}", addr.port());
    info!("   API: http://localhost:{}/api/status", addr.port());
    info!("   Health: http://localhost:{}/health", addr.port());

    ServerBuilder::new(addr)
        .with_handler(handler)
        .serve_with_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn start_metrics_server(addr: SocketAddr, registry: MetricsRegistry, path: String) -> Result<()> {
    let registry = Arc::new(registry);
    let metrics_path = Arc::new(path);
    let service_path = metrics_path.clone();

    let make_service = hyper::service::make_service_fn(move |_| {
        let registry = registry.clone();
        let path = service_path.clone();

        async move {
            Ok::<_, Infallible>(hyper::service::service_fn(move |req: Request<Body>| {
                let registry = registry.clone();
                let path = path.clone();

                async move {
                    let mut response = Response::new(Body::empty());
                    if req.uri().path() != path.as_str() {
                        *response.status_mut() = StatusCode::NOT_FOUND;
                        return Ok::<_, Infallible>(response);
                    }

                    match registry.gather() {
                        Ok(metrics) => {
                            *response.body_mut() = Body::from(metrics);
                            response.headers_mut().insert(
                                hyper::header::CONTENT_TYPE,
                                hyper::header::HeaderValue::from_static("text/plain; version=0.0.4"),
                            );
                        }
                        Err(e) => {
                            error!("Failed to encode metrics: {}", e);
                            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                        }
                    }
                    Ok(response)
                }
            }))
        }
    });

    let server = Server::try_bind(&addr)
        .with_context(|| format!("Failed to bind metrics server on {}", addr))?
        .serve(make_service);

    info!(
        "Metrics server listening on http://{}{}",
        addr,
        metrics_path.as_str()
    );

    tokio::spawn(async move {
        if let Err(e) = server.await {
            error!("Metrics server error: {}", e);
        }
    });

    Ok(())
}

// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
