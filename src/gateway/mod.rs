pub mod auth;
pub mod dispatch;
pub mod request;
pub mod response;

pub use auth::AuthKey;
pub use request::{Field, QueryRequest};
pub use response::Envelope;

use log::{error, info, warn};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

use crate::api::{viewer, DisclosureClient};
use crate::error::{ErrorKind, GatewayError, Result};
use dispatch::Ctx;

/// Request router: authenticates, dispatches by query type and shapes the
/// response envelope.
#[derive(Clone)]
pub struct Gateway {
    client: Arc<dyn DisclosureClient>,
    auth: AuthKey,
}

impl Gateway {
    pub fn new(client: Arc<dyn DisclosureClient>, auth: AuthKey) -> Self {
        Self { client, auth }
    }

    /// Handle a raw JSON body. The secret is checked before the body's shape,
    /// so a missing or wrong `auth_key` is unauthorized even when other
    /// fields are missing.
    pub async fn query_value(&self, body: Value) -> Result<Envelope> {
        let auth_key = body.get("auth_key").and_then(Value::as_str).unwrap_or_default();
        self.auth.verify(auth_key)?;

        let request: QueryRequest = serde_json::from_value(body)
            .map_err(|e| GatewayError::InvalidInput(format!("Invalid request body: {}", e)))?;
        self.query(&request).await
    }

    /// Handle one unified query
    pub async fn query(&self, request: &QueryRequest) -> Result<Envelope> {
        self.auth.verify(&request.auth_key)?;

        let tag = request.query_type.trim();
        let route = dispatch::find_route(tag)
            .ok_or_else(|| GatewayError::UnsupportedQueryType(tag.to_string()))?;
        route.validate(request)?;

        info!("query_type={} company={}", route.query_type, request.company);
        let started = Instant::now();
        let cx = Ctx {
            client: self.client.as_ref(),
            request,
            query_type: route.query_type,
        };
        let result = (route.run)(cx).await;

        match &result {
            Ok(_) => info!(
                "query_type={} completed in {}ms",
                route.query_type,
                started.elapsed().as_millis()
            ),
            Err(e) if e.kind() == ErrorKind::Upstream => {
                error!("query_type={} failed upstream: {}", route.query_type, e)
            }
            Err(e) => warn!("query_type={} rejected: {}", route.query_type, e),
        }
        result
    }

    /// Viewer URL for a receipt number, behind the shared secret
    pub fn file_url(&self, rcp_no: &str, auth_key: Option<&str>) -> Result<Envelope> {
        self.auth.verify(auth_key.unwrap_or_default())?;
        Ok(Envelope::download(viewer::build_url(rcp_no.trim())))
    }
}
