//! Reference store server: `aether serve`.

use anyhow::Result;

use aether::config::AetherConfig;
use aether::server::start_server;

pub async fn cmd_serve(
    config: &AetherConfig,
    port: Option<u16>,
    host: Option<String>,
    seed: bool,
    cors: bool,
) -> Result<()> {
    let mut server = config.server_config();
    if let Some(port) = port {
        server.port = port;
    }
    if let Some(host) = host {
        server.host = host;
    }
    if seed && server.seed_org.is_none() {
        server.seed_org = Some(config.org_id().to_string());
    }
    server.cors |= cors;
    start_server(server).await
}
