use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};

use crate::clients::FlightProvider;
use crate::core::error::{GatewayError, ProviderError};
use crate::core::tool::{Tool, ToolSpec};
use crate::domain::normalize::normalize;
use crate::domain::query::FlightQuery;
use crate::domain::{parse_date, SearchRequest, TravelClass};

pub const TOOL_NAME: &str = "search_flight_offers";

/// Raw tool arguments as the caller sends them.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightOffersArgs {
    pub origin: String,
    pub destination: String,
    pub departure_date: String,
    pub return_date: String,
    #[serde(default)]
    pub adults: Option<u32>,
    #[serde(default)]
    pub children: Option<u32>,
    #[serde(default)]
    pub infants: Option<u32>,
    #[serde(default)]
    pub travel_class: Option<TravelClass>,
    #[serde(default)]
    pub max_price: Option<f64>,
    #[serde(default)]
    pub max_duration: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl FlightOffersArgs {
    pub fn into_request(self) -> Result<SearchRequest, GatewayError> {
        let departure = parse_date("departureDate", &self.departure_date)?;
        let mut req = SearchRequest::new(self.origin, self.destination, departure);
        req.return_date = Some(parse_date("returnDate", &self.return_date)?);
        req.adults = self.adults;
        req.children = self.children;
        req.infants = self.infants;
        req.travel_class = self.travel_class;
        req.max_price = self.max_price;
        req.max_duration = self.max_duration;
        req.currency = self.currency;
        req.validate()?;
        Ok(req)
    }
}

/// Flight offers search: build query, call provider, normalize.
#[derive(Clone)]
pub struct FlightOffersTool {
    provider: Arc<dyn FlightProvider>,
}

impl FlightOffersTool {
    pub fn new(provider: Arc<dyn FlightProvider>) -> Self {
        Self { provider }
    }

    pub async fn search(&self, req: &SearchRequest) -> Result<JsonValue, GatewayError> {
        let query = FlightQuery::build(req);
        tracing::info!(
            origin = %query.origin,
            destination = %query.destination,
            departure = %query.departure_date,
            travel_class = %query.travel_class,
            "searching flight offers"
        );
        let raw = self.provider.flight_offers(&query).await?;
        let result = normalize(&raw)?;
        tracing::debug!(offers = result.offers.len(), "normalized flight offers");
        serde_json::to_value(&result).map_err(|e| ProviderError::Permanent(e.to_string()).into())
    }
}

impl ToolSpec for FlightOffersTool {
    fn name(&self) -> &'static str {
        TOOL_NAME
    }
    fn description(&self) -> &'static str {
        "Search flight offers between two airports for a date range. Returns {\"offers\": [...], \"dictionary\": {\"aircraft\", \"airlines\", \"locations\", \"currencies\"}} where the dictionary explains the codes used in the offers."
    }
    fn input_schema(&self) -> JsonValue {
        json!({
            "type": "object",
            "properties": {
                "origin": { "type": "string", "description": "Origin IATA airport code, e.g. BOS" },
                "destination": { "type": "string", "description": "Destination IATA airport code, e.g. LAX" },
                "departureDate": { "type": "string", "description": "Departure date, YYYY-MM-DD" },
                "returnDate": { "type": "string", "description": "Return date, YYYY-MM-DD" },
                "adults": { "type": "integer", "minimum": 1, "maximum": 9, "default": 1 },
                "children": { "type": "integer", "minimum": 0, "maximum": 8, "default": 0 },
                "infants": { "type": "integer", "minimum": 0, "maximum": 9, "default": 0 },
                "travelClass": {
                    "type": "string",
                    "enum": ["ECONOMY", "PREMIUM_ECONOMY", "BUSINESS", "FIRST"],
                    "default": "ECONOMY"
                },
                "maxPrice": { "type": "number", "exclusiveMinimum": 0 },
                "maxDuration": { "type": "number", "exclusiveMinimum": 0 },
                "currency": { "type": "string", "description": "ISO 4217 code", "default": "USD" }
            },
            "required": ["origin", "destination", "departureDate", "returnDate"]
        })
    }
}

#[async_trait]
impl Tool for FlightOffersTool {
    async fn call(&self, arguments: &JsonValue) -> Result<JsonValue, GatewayError> {
        let args: FlightOffersArgs = serde_json::from_value(arguments.clone())
            .map_err(|e| GatewayError::invalid_input(e.to_string()))?;
        let req = args.into_request()?;
        self.search(&req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::normalize::RawFlightOffersResponse;
    use std::sync::Mutex;

    /// Records the last query and replays a canned response.
    struct Canned {
        body: Result<JsonValue, ProviderError>,
        seen: Mutex<Option<FlightQuery>>,
    }

    impl Canned {
        fn ok(body: JsonValue) -> Arc<Self> {
            Arc::new(Self { body: Ok(body), seen: Mutex::new(None) })
        }
        fn failing(e: ProviderError) -> Arc<Self> {
            Arc::new(Self { body: Err(e), seen: Mutex::new(None) })
        }
    }

    #[async_trait]
    impl FlightProvider for Canned {
        async fn flight_offers(&self, query: &FlightQuery) -> Result<RawFlightOffersResponse, ProviderError> {
            *self.seen.lock().unwrap() = Some(query.clone());
            let body = self.body.clone()?;
            Ok(serde_json::from_value(body).unwrap())
        }
        async fn airport(&self, _code: &str) -> Result<Option<JsonValue>, ProviderError> {
            Ok(None)
        }
    }

    fn offer(id: &str) -> JsonValue {
        json!({
            "id": id,
            "numberOfBookableSeats": 9,
            "itineraries": [{ "segments": [{ "carrierCode": "AA", "number": "1" }] }],
            "price": { "currency": "USD", "total": "199.00" }
        })
    }

    fn args() -> JsonValue {
        json!({
            "origin": "BOS",
            "destination": "LAX",
            "departureDate": "2025-07-01",
            "returnDate": "2025-07-08"
        })
    }

    #[tokio::test]
    async fn applies_defaults_and_shapes_output() {
        let provider = Canned::ok(json!({
            "data": [offer("1"), offer("2")],
            "dictionaries": { "carriers": { "AA": "AMERICAN AIRLINES" } }
        }));
        let tool = FlightOffersTool::new(provider.clone());
        let out = tool.call(&args()).await.unwrap();

        let q = provider.seen.lock().unwrap().clone().unwrap();
        assert_eq!(q.adults, 1);
        assert_eq!(q.travel_class, TravelClass::Economy);
        assert_eq!(q.currency, "USD");
        assert!(q.max_price.is_none() && q.max_duration.is_none());

        assert_eq!(out["offers"].as_array().unwrap().len(), 2);
        assert_eq!(out["offers"][1]["id"], "2");
        assert_eq!(out["dictionary"]["airlines"]["AA"], "AMERICAN AIRLINES");
        assert_eq!(out["dictionary"]["aircraft"], json!({}));
    }

    #[tokio::test]
    async fn passes_explicit_constraints_through() {
        let provider = Canned::ok(json!({ "data": [] }));
        let tool = FlightOffersTool::new(provider.clone());
        let mut a = args();
        a["maxPrice"] = json!(750);
        a["travelClass"] = json!("BUSINESS");
        a["currency"] = json!("eur");
        tool.call(&a).await.unwrap();
        let q = provider.seen.lock().unwrap().clone().unwrap();
        assert_eq!(q.max_price, Some(750.0));
        assert!(q.max_duration.is_none());
        assert_eq!(q.travel_class, TravelClass::Business);
        assert_eq!(q.currency, "EUR");
    }

    #[tokio::test]
    async fn semantic_violations_are_input_errors() {
        let provider = Canned::ok(json!({ "data": [] }));
        let tool = FlightOffersTool::new(provider.clone());
        let mut a = args();
        a["destination"] = json!("BOS");
        let err = tool.call(&a).await.unwrap_err();
        assert!(matches!(err, GatewayError::InputValidation(_)));

        let mut a = args();
        a["returnDate"] = json!("July 8th");
        assert!(matches!(tool.call(&a).await.unwrap_err(), GatewayError::InputValidation(_)));
        assert!(provider.seen.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn oversized_traveler_counts_never_reach_provider() {
        let provider = Canned::ok(json!({ "data": [] }));
        let mut a = args();
        a["adults"] = json!(4_294_967_295u64);
        a["children"] = json!(1);

        let tool = FlightOffersTool::new(provider.clone());
        let err = tool.call(&a).await.unwrap_err();
        assert!(matches!(err, GatewayError::InputValidation(_)));

        let registry = crate::tools::build_registry(provider.clone()).unwrap();
        let err = registry.call_tool(TOOL_NAME, &a).await.unwrap_err();
        assert!(matches!(err, GatewayError::InputValidation(_)));
        assert!(provider.seen.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn provider_failures_propagate_typed() {
        let tool = FlightOffersTool::new(Canned::failing(ProviderError::Transient("503".into())));
        let err = tool.call(&args()).await.unwrap_err();
        assert_eq!(err.kind(), "provider_error_transient");
    }

    #[tokio::test]
    async fn malformed_provider_offer_yields_no_partial_result() {
        let provider = Canned::ok(json!({ "data": [offer("1"), { "id": "2", "price": {} }] }));
        let err = FlightOffersTool::new(provider).call(&args()).await.unwrap_err();
        assert_eq!(err.kind(), "provider_error_permanent");
    }

    #[test]
    fn schema_requires_trip_fields() {
        let tool = FlightOffersTool::new(Canned::ok(json!({})));
        let schema = tool.input_schema();
        assert_eq!(
            schema["required"],
            json!(["origin", "destination", "departureDate", "returnDate"])
        );
        assert_eq!(schema["properties"]["travelClass"]["enum"][1], "PREMIUM_ECONOMY");
    }
}
