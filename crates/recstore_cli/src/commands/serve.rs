//! Serve command implementation.

use recstore_server::{ServerConfig, StoreServer};
use tracing::info;

/// Runs the reference server until Ctrl-C.
pub fn run(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let server = StoreServer::new(config);
        let listener = server.bind().await?;
        info!(
            pattern_syntax = %server.config().pattern_syntax,
            max_connections = server.config().max_connections,
            "starting server"
        );
        server
            .serve(listener, async {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("interrupt received, shutting down");
                }
            })
            .await?;
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
