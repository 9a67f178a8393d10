//! Chat dispatch service binary.
//!
//! Accepts outbound chat messages over HTTP and forwards them one at a time,
//! with randomized pacing, to the messaging session.

use clap::Parser;
use dispatch_api::{serve, ApiServerConfig, DispatchContext};
use dispatch_queue::{DispatchQueueConfig, PacingWindow};
use dispatch_session::{run_event_processor, DryRunGateway, SessionGateway, SharedSessionState};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod logging;

use config::DispatchConfig;
use logging::DispatchLogFormatter;

/// HTTP-fronted chat message dispatcher
#[derive(Parser, Debug)]
#[command(name = "chat-dispatch", version, about = "Paced, session-gated chat message dispatcher")]
struct Args {
    /// Configuration file path
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// HTTP bind address, e.g. 0.0.0.0:3000 (overrides the config file)
    #[arg(long)]
    listen: Option<SocketAddr>,

    /// Minimum delay between messages, e.g. 5s (overrides the config file)
    #[arg(long)]
    min_delay: Option<humantime::Duration>,

    /// Maximum delay between messages, e.g. 12s (overrides the config file)
    #[arg(long)]
    max_delay: Option<humantime::Duration>,

    /// Suffix appended to bare phone numbers (overrides the config file)
    #[arg(long)]
    chat_suffix: Option<String>,

    /// Require a handshake scan before the session becomes ready
    #[arg(long)]
    require_scan: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let env_filter = EnvFilter::new("info")
        .add_directive(format!("chat_dispatch={}", args.log_level).parse()?)
        .add_directive(format!("dispatch_session={}", args.log_level).parse()?)
        .add_directive(format!("dispatch_queue={}", args.log_level).parse()?)
        .add_directive(format!("dispatch_api={}", args.log_level).parse()?);

    let formatter = DispatchLogFormatter::new("dispatch".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_ansi(true)
        .event_format(formatter)
        .init();

    info!("Starting chat dispatch service v{}", env!("CARGO_PKG_VERSION"));

    let mut dispatch_config = DispatchConfig::load_from_file(&args.config)?;
    apply_cli_overrides(&mut dispatch_config, &args);
    dispatch_config.validate()?;

    let bind_addr = match args.listen {
        Some(addr) => addr,
        None => {
            let host: IpAddr = dispatch_config.bind_host.parse()?;
            SocketAddr::new(host, dispatch_config.http_port)
        }
    };

    let pacing = PacingWindow::new(
        dispatch_config.min_delay,
        dispatch_config.max_delay,
    )?;
    let queue_config = DispatchQueueConfig {
        pacing,
        chat_suffix: dispatch_config.chat_suffix.clone(),
    };

    info!(
        "Dispatch config: delay window {:?}..={:?}, chat suffix {}",
        pacing.min(),
        pacing.max(),
        queue_config.chat_suffix
    );

    // Session lifecycle events flow through a single processor task
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let session = SharedSessionState::new();
    let event_processor = tokio::spawn(run_event_processor(event_rx, session.clone()));

    component_warn!(
        "session",
        "No messaging backend linked; using the dry-run gateway (messages are logged, not delivered)"
    );
    let gateway: Arc<dyn SessionGateway> =
        Arc::new(DryRunGateway::new(event_tx.clone()).with_required_scan(dispatch_config.require_scan));

    let ctx = DispatchContext::new(session, gateway.clone(), event_tx, queue_config);

    let init_ctx = ctx.clone();
    tokio::spawn(async move {
        if init_ctx.initialize().await.is_ok() {
            component_info!("session", "Messaging session initialization started");
        }
    });

    let server_config = ApiServerConfig { bind_addr };
    serve(server_config, ctx.clone(), shutdown_signal()).await?;

    info!("Dispatch service shutting down");

    let stats = ctx.queue_stats().await;
    if stats.pending > 0 {
        component_warn!("queue", "{} queued messages will not be sent", stats.pending);
    }
    info!(
        "Final dispatch counters: queued={}, sent={}, dropped={}, failed={}",
        stats.queued, stats.sent, stats.dropped, stats.failed
    );

    if let Err(e) = gateway.teardown().await {
        component_error!("session", "Failed to tear down messaging session: {}", e);
    }

    drop(ctx);
    drop(gateway);
    event_processor.abort();

    info!("Dispatch service shutdown complete");
    Ok(())
}

/// Command line flags win over file and environment settings
fn apply_cli_overrides(config: &mut DispatchConfig, args: &Args) {
    if let Some(min_delay) = &args.min_delay {
        config.min_delay = **min_delay;
    }
    if let Some(max_delay) = &args.max_delay {
        config.max_delay = **max_delay;
    }
    if let Some(suffix) = &args.chat_suffix {
        config.chat_suffix = suffix.clone();
    }
    if args.require_scan {
        config.require_scan = true;
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        component_error!("api", "Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
