//! Gateway client entry point
//!
//! Run with:
//! ```bash
//! LEMON_TOKEN=... cargo run -p lemon-gateway
//! ```
//!
//! Configuration is loaded from environment variables.

use std::sync::Arc;

use lemon_common::{
    try_init_tracing_with_config, ClientConfig, ClientError, ClientResult, Environment,
    TracingConfig,
};
use lemon_gateway::{Client, GatewayEvent};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let telemetry = TracingConfig::for_environment(Environment::from_env());
    if let Err(e) = try_init_tracing_with_config(telemetry) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    if let Err(e) = run().await {
        error!(error = %e, "Gateway client stopped");
        std::process::exit(1);
    }
}

async fn run() -> ClientResult<()> {
    info!("Starting lemon gateway client...");

    let config = ClientConfig::from_env().map_err(|e| {
        error!(error = %e, "Failed to load configuration");
        e
    })?;

    info!(
        env = ?config.env,
        gateway = %config.gateway.url,
        intents = config.gateway.intents.bits(),
        "Configuration loaded"
    );

    let client = Client::builder(config)
        .on("ready", |event: Arc<GatewayEvent>| async move {
            if let GatewayEvent::Ready(ready) = event.as_ref() {
                info!(user = %ready.user.tag(), guilds = ready.guilds.len(), "Logged in");
            }
        })
        .on("message_create", |event: Arc<GatewayEvent>| async move {
            if let GatewayEvent::MessageCreate(message) = event.as_ref() {
                info!(
                    channel_id = %message.channel_id,
                    author = %message.author.tag(),
                    "Message received"
                );
            }
        })
        .build();

    let handle = client.handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            if let Err(e) = handle.shutdown().await {
                error!(error = %e, "Failed to request shutdown");
            }
        }
    });

    client.run().await.map_err(ClientError::gateway)
}
