//! QRP node executable: serves a demo `Echo`/`Ping` service until interrupted.

use anyhow::Context;
use qrp_node::infrastructure::{config::Settings, telemetry::TelemetryBuilder};
use qrp_node::{MessageCodec, Node, Service, ServiceMethods};
use serde::{Deserialize, Serialize};
use tokio::signal;
use tracing::{error, info};

/// Text payload shared by the demo procedures.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Text {
    #[serde(rename = "Text")]
    text: String,
}

/// Demo service answering `Echo` and `Ping`.
struct Demo;

impl Service for Demo {
    fn procedures<C: MessageCodec>(methods: &mut ServiceMethods<Self, C>) {
        methods
            .method("Echo", |_: &Demo, args: Text, reply: &mut Text| {
                reply.text = args.text;
            })
            .method("Ping", |_: &Demo, _: Text, reply: &mut Text| {
                reply.text = "pong".to_string();
            });
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Settings::new().context("Failed to load configuration")?;

    TelemetryBuilder::from_settings(&config.telemetry, env!("CARGO_PKG_VERSION"))
        .init()
        .context("Failed to initialize telemetry")?;

    info!("QRP Node Starting...");

    let node = Node::from_settings(&config.node)
        .await
        .with_context(|| format!("Failed to bind {}", config.node.listen_address))?;
    let report = node.register(Demo);
    info!(procedures = ?report.registered, "Registered demo service");

    let mut server = tokio::spawn({
        let node = node.clone();
        async move { node.serve().await }
    });

    info!(local_addr = %node.local_addr()?, "Listening for datagrams");

    let finished = tokio::select! {
        () = shutdown_signal() => {
            info!("Shutdown signal received, cleaning up...");
            node.shutdown();
            None
        }
        result = &mut server => Some(result),
    };
    let result = match finished {
        Some(result) => result,
        None => server.await,
    };
    result.context("Receive loop task panicked")??;

    info!("QRP Node Shutdown Complete.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
