use anyhow::{Context, Result, bail};
use smartdoc::{api, config, logging, processing::DocumentService};
use std::{net::Ipv4Addr, ops::RangeInclusive, sync::Arc};
use tokio::net::TcpListener;

/// Ports probed when `SERVER_PORT` is unset.
const FALLBACK_PORTS: RangeInclusive<u16> = 4100..=4199;

#[tokio::main]
async fn main() -> Result<()> {
    config::init_config();
    logging::init_tracing();

    let config = config::get_config();
    let service = DocumentService::initialize(config)
        .await
        .context("failed to initialize document service")?;
    let app = api::create_router(Arc::new(service));

    let (listener, port) = bind_listener(config.server_port).await?;
    tracing::info!(
        port,
        chunk_max_chars = config.chunk_max_chars,
        top_k = config.retrieval_top_k,
        "SmartDoc listening on http://0.0.0.0:{port}"
    );
    axum::serve(listener, app)
        .await
        .context("HTTP server terminated unexpectedly")
}

async fn bind_listener(fixed: Option<u16>) -> Result<(TcpListener, u16)> {
    if let Some(port) = fixed {
        let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
            .await
            .with_context(|| format!("failed to bind SERVER_PORT {port}"))?;
        return Ok((listener, port));
    }

    for port in FALLBACK_PORTS {
        match TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).await {
            Ok(listener) => return Ok((listener, port)),
            Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
                tracing::debug!(port, "Port already in use; trying next");
            }
            Err(err) => return Err(err).with_context(|| format!("failed to bind port {port}")),
        }
    }

    bail!(
        "no available port in {}-{}",
        FALLBACK_PORTS.start(),
        FALLBACK_PORTS.end()
    )
}
