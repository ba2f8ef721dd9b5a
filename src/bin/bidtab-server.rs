//! bidtab HTTP server binary

use bidtab::{default_topics, BidEngine, ChatConfig, HttpChatClient};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    println!("bidtab - Construction Bid Table Extractor");
    println!("   Version: {}", env!("CARGO_PKG_VERSION"));
    println!();

    let cfg = ChatConfig::from_env()?;
    println!("✓ Chat endpoint: {}", cfg.base_url);
    println!("✓ Model: {}", cfg.model);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8081);

    let client = Arc::new(HttpChatClient::new(cfg));
    let engine = BidEngine::new(default_topics(), client);

    println!("✓ Engine initialized with {} topics", engine.topics().len());
    println!("✓ Starting HTTP server on port {}...", port);
    println!();

    bidtab::server::run_server(engine, port).await?;

    Ok(())
}
