use chrono::NaiveDate;

use super::{SearchRequest, TravelClass};

pub const DEFAULT_ADULTS: u32 = 1;
pub const DEFAULT_CHILDREN: u32 = 0;
pub const DEFAULT_INFANTS: u32 = 0;
pub const DEFAULT_CURRENCY: &str = "USD";

/// Provider-ready flight offers query.
///
/// Defaults are resolved; `max_price` and `max_duration` stay `None` unless
/// the caller set them, and are then left out of the wire form entirely.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightQuery {
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub adults: u32,
    pub children: u32,
    pub infants: u32,
    pub travel_class: TravelClass,
    pub currency: String,
    pub max_price: Option<f64>,
    pub max_duration: Option<f64>,
}

impl FlightQuery {
    /// Build from a request that has passed `SearchRequest::validate`.
    pub fn build(req: &SearchRequest) -> Self {
        Self {
            origin: req.origin.trim().to_ascii_uppercase(),
            destination: req.destination.trim().to_ascii_uppercase(),
            departure_date: req.departure_date,
            return_date: req.return_date,
            adults: req.adults.unwrap_or(DEFAULT_ADULTS),
            children: req.children.unwrap_or(DEFAULT_CHILDREN),
            infants: req.infants.unwrap_or(DEFAULT_INFANTS),
            travel_class: req.travel_class.unwrap_or_default(),
            currency: req
                .currency
                .as_deref()
                .map(|c| c.trim().to_ascii_uppercase())
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            max_price: req.max_price,
            max_duration: req.max_duration,
        }
    }

    /// Query-string pairs in the provider's vocabulary.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("originLocationCode", self.origin.clone()),
            ("destinationLocationCode", self.destination.clone()),
            ("departureDate", self.departure_date.format("%Y-%m-%d").to_string()),
        ];
        if let Some(ret) = self.return_date {
            pairs.push(("returnDate", ret.format("%Y-%m-%d").to_string()));
        }
        pairs.extend([
            ("adults", self.adults.to_string()),
            ("children", self.children.to_string()),
            ("infants", self.infants.to_string()),
            ("travelClass", self.travel_class.as_str().to_string()),
            ("currencyCode", self.currency.clone()),
        ]);
        if let Some(price) = self.max_price {
            pairs.push(("maxPrice", price.to_string()));
        }
        if let Some(duration) = self.max_duration {
            pairs.push(("maxDuration", duration.to_string()));
        }
        pairs
    }
}
