//! Campusly server
//!
//! Entry point for the campus assistant chat widget.

use std::sync::Arc;

use mimalloc::MiMalloc;

use campusly::config::AppConfig;
use campusly::{server, telemetry};

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present)
    let _ = dotenvy::dotenv();

    // Initialize tracing (M-LOG-STRUCTURED)
    telemetry::init();

    let config = Arc::new(AppConfig::load()?);

    server::start_server(config).await
}
