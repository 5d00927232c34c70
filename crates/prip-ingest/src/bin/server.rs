//! PRIP ingest server binary
//!
//! Run with: cargo run -p prip-ingest --bin prip-ingest-server

use prip_ingest::{config::PripConfig, server::PripServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "prip_ingest=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = PripConfig::from_env()?;
    config.validate()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Storage backend: {:?}", config.storage.backend);
    tracing::info!("  - Sections: {}", config.classifier.sections.len());
    tracing::info!("  - Description cap: {} chars", config.pipeline.max_desc_chars);

    let server = PripServer::new(config)?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/messages        - Text notices and commands");
    println!("  POST /api/documents       - Upload DOCX/RTF/DOC");
    println!("  POST /api/documents/link  - Ingest a document by URL");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
