use log::{info, warn};
use std::path::Path;
use std::sync::Arc;

use crate::api::OpenDartClient;
use crate::cli::args::ServeArgs;
use crate::config::Config;
use crate::error::{GatewayError, Result};
use crate::gateway::{AuthKey, Gateway};
use crate::server;

/// Execute serve command
pub async fn execute(args: ServeArgs, config_path: Option<&Path>) -> Result<()> {
    let mut config = Config::load(config_path)?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    config.validate()?;

    let auth_key = config
        .auth_key()
        .ok_or_else(|| GatewayError::Config("auth.key is not set".to_string()))?;
    if config.dart.api_key.is_none() {
        warn!("dart.api_key is not set; upstream queries will fail until DART_API_KEY is provided");
    }

    let client = OpenDartClient::new(config.client_config())?;
    let gateway = Gateway::new(Arc::new(client), AuthKey::new(auth_key));

    info!("Upstream: {}", config.dart.base_url);
    server::serve(gateway, &config.server.host, config.server.port).await
}
