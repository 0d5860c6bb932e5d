//! Flight-search domain: request model, provider query, normalized output.

pub mod normalize;
pub mod query;
pub mod uri;

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::error::GatewayError;

/// Provider limit on seated travellers (adults + children) per search.
pub const MAX_SEATED_TRAVELERS: u32 = 9;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TravelClass {
    #[default]
    Economy,
    PremiumEconomy,
    Business,
    First,
}

impl TravelClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelClass::Economy => "ECONOMY",
            TravelClass::PremiumEconomy => "PREMIUM_ECONOMY",
            TravelClass::Business => "BUSINESS",
            TravelClass::First => "FIRST",
        }
    }

    pub const ALL: [TravelClass; 4] = [
        TravelClass::Economy,
        TravelClass::PremiumEconomy,
        TravelClass::Business,
        TravelClass::First,
    ];
}

impl fmt::Display for TravelClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TravelClass {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase().replace('-', "_");
        TravelClass::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| GatewayError::invalid_input(format!("unknown travel class: {s}")))
    }
}

/// A caller-supplied flight search. Optional fields stay `None` until the
/// query builder applies defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub adults: Option<u32>,
    pub children: Option<u32>,
    pub infants: Option<u32>,
    pub travel_class: Option<TravelClass>,
    pub max_price: Option<f64>,
    pub max_duration: Option<f64>,
    pub currency: Option<String>,
}

impl SearchRequest {
    pub fn new(
        origin: impl Into<String>,
        destination: impl Into<String>,
        departure_date: NaiveDate,
    ) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            departure_date,
            return_date: None,
            adults: None,
            children: None,
            infants: None,
            travel_class: None,
            max_price: None,
            max_duration: None,
            currency: None,
        }
    }

    /// Check the request invariants. Codes are compared case-insensitively.
    pub fn validate(&self) -> Result<(), GatewayError> {
        let origin = airport_code("origin", &self.origin)?;
        let destination = airport_code("destination", &self.destination)?;
        if origin == destination {
            return Err(GatewayError::invalid_input(
                "origin and destination must differ",
            ));
        }
        if let Some(ret) = self.return_date {
            if ret <= self.departure_date {
                return Err(GatewayError::invalid_input(format!(
                    "returnDate {ret} must be after departureDate {}",
                    self.departure_date
                )));
            }
        }

        let adults = self.adults.unwrap_or(1);
        let children = self.children.unwrap_or(0);
        let infants = self.infants.unwrap_or(0);
        if adults < 1 {
            return Err(GatewayError::invalid_input("adults must be at least 1"));
        }
        if adults
            .checked_add(children)
            .map_or(true, |seated| seated > MAX_SEATED_TRAVELERS)
        {
            return Err(GatewayError::invalid_input(format!(
                "adults + children must not exceed {MAX_SEATED_TRAVELERS}"
            )));
        }
        if infants > adults {
            return Err(GatewayError::invalid_input(
                "infants must not outnumber adults",
            ));
        }

        for (field, value) in [("maxPrice", self.max_price), ("maxDuration", self.max_duration)] {
            if let Some(v) = value {
                if !v.is_finite() || v <= 0.0 {
                    return Err(GatewayError::invalid_input(format!(
                        "{field} must be a positive number"
                    )));
                }
            }
        }

        if let Some(currency) = &self.currency {
            currency_code(currency)?;
        }
        Ok(())
    }
}

/// Upper-cased three-letter IATA code.
pub fn airport_code(field: &str, raw: &str) -> Result<String, GatewayError> {
    let code = raw.trim();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(GatewayError::invalid_input(format!(
            "{field} must be a three-letter IATA airport code, got `{raw}`"
        )));
    }
    Ok(code.to_ascii_uppercase())
}

/// Upper-cased three-letter ISO 4217 code.
pub fn currency_code(raw: &str) -> Result<String, GatewayError> {
    let code = raw.trim();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(GatewayError::invalid_input(format!(
            "currency must be a three-letter ISO 4217 code, got `{raw}`"
        )));
    }
    Ok(code.to_ascii_uppercase())
}

/// Parse an ISO `YYYY-MM-DD` date.
pub fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, GatewayError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        GatewayError::invalid_input(format!("{field} must be a YYYY-MM-DD date, got `{raw}`"))
    })
}
