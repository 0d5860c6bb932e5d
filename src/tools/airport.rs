use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};

use crate::clients::FlightProvider;
use crate::core::error::GatewayError;
use crate::core::tool::{Resource, ResourceSpec};
use crate::domain::airport_code;
use crate::domain::uri::UriParams;

pub const URI_TEMPLATE: &str = "schema://airport-<code>";

/// `schema://airport-<code>`: provider reference data for one airport.
#[derive(Clone)]
pub struct AirportResource {
    provider: Arc<dyn FlightProvider>,
}

impl AirportResource {
    pub fn new(provider: Arc<dyn FlightProvider>) -> Self {
        Self { provider }
    }
}

impl ResourceSpec for AirportResource {
    fn name(&self) -> &'static str {
        "airport"
    }
    fn description(&self) -> &'static str {
        "Airport reference data (name, city, country, coordinates) by IATA code"
    }
    fn uri_template(&self) -> &'static str {
        URI_TEMPLATE
    }
}

#[async_trait]
impl Resource for AirportResource {
    async fn read(&self, uri: &str, params: &UriParams) -> Result<JsonValue, GatewayError> {
        let raw = params
            .get("code")
            .ok_or_else(|| GatewayError::ResourceNotFound(uri.to_string()))?;
        // Anything that is not an IATA code cannot name an airport.
        let code = airport_code("airport code", raw)
            .map_err(|_| GatewayError::ResourceNotFound(uri.to_string()))?;
        match self.provider.airport(&code).await? {
            Some(airport) => Ok(json!({ "code": code, "airport": airport })),
            None => Err(GatewayError::ResourceNotFound(uri.to_string())),
        }
    }
}
