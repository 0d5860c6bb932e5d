pub mod airport;
pub mod flight_offers;
pub mod registry;

use std::sync::Arc;

use crate::clients::FlightProvider;
use crate::core::error::RegistryError;
use airport::AirportResource;
use flight_offers::FlightOffersTool;
use registry::Registry;

/// The gateway's tool and resource table, bound to one provider.
pub fn build_registry(provider: Arc<dyn FlightProvider>) -> Result<Registry, RegistryError> {
    let mut builder = Registry::builder();
    builder
        .register_tool(Arc::new(FlightOffersTool::new(provider.clone())))?
        .register_resource(Arc::new(AirportResource::new(provider)))?;
    Ok(builder.build())
}
