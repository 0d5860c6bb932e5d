//! Flight-search provider clients.

pub mod amadeus;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::core::error::ProviderError;
use crate::domain::normalize::RawFlightOffersResponse;
use crate::domain::query::FlightQuery;

/// Provider seam used by the tool and resource handlers.
///
/// Implementations never retry; transient vs permanent classification is
/// carried by `ProviderError` so an outer layer can decide.
#[async_trait]
pub trait FlightProvider: Send + Sync + 'static {
    async fn flight_offers(&self, query: &FlightQuery) -> Result<RawFlightOffersResponse, ProviderError>;

    /// Reference record for an airport by IATA code, `None` if unknown.
    async fn airport(&self, code: &str) -> Result<Option<JsonValue>, ProviderError>;
}
