//! Offer normalization: provider response -> `{ offers, dictionary }`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::core::error::ProviderError;

/// Code -> description table. Ordered so serialization is deterministic.
pub type CodeTable = BTreeMap<String, JsonValue>;

/// Body of a flight-offers search as returned by the provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawFlightOffersResponse {
    #[serde(default)]
    pub data: Vec<RawOffer>,
    #[serde(default)]
    pub dictionaries: Option<RawDictionaries>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOffer {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub price: JsonValue,
    #[serde(default)]
    pub itineraries: Vec<JsonValue>,
    #[serde(default)]
    pub number_of_bookable_seats: Option<u32>,
}

/// Provider reference dictionaries; any category may be missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDictionaries {
    pub aircraft: Option<CodeTable>,
    pub carriers: Option<CodeTable>,
    pub locations: Option<CodeTable>,
    pub currencies: Option<CodeTable>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedOffer {
    pub id: String,
    pub price: JsonValue,
    pub itineraries: Vec<JsonValue>,
    /// Absent when the provider does not report it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_bookable_seats: Option<u32>,
}

/// All four categories are always present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedDictionary {
    pub aircraft: CodeTable,
    pub airlines: CodeTable,
    pub locations: CodeTable,
    pub currencies: CodeTable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightOffers {
    pub offers: Vec<NormalizedOffer>,
    pub dictionary: NormalizedDictionary,
}

pub fn normalize(raw: &RawFlightOffersResponse) -> Result<FlightOffers, ProviderError> {
    let offers = raw
        .data
        .iter()
        .enumerate()
        .map(|(idx, offer)| normalize_offer(idx, offer))
        .collect::<Result<Vec<_>, _>>()?;
    let dictionary = raw
        .dictionaries
        .as_ref()
        .map(normalize_dictionary)
        .unwrap_or_default();
    Ok(FlightOffers { offers, dictionary })
}

fn normalize_offer(idx: usize, offer: &RawOffer) -> Result<NormalizedOffer, ProviderError> {
    let malformed = |what: &str| {
        ProviderError::Permanent(format!("malformed offer at position {idx}: {what}"))
    };
    if offer.id.trim().is_empty() {
        return Err(malformed("missing id"));
    }
    if !offer.price.is_object() {
        return Err(malformed("price is not an object"));
    }
    if offer.itineraries.is_empty() {
        return Err(malformed("no itineraries"));
    }
    for itinerary in &offer.itineraries {
        let has_segments = itinerary
            .get("segments")
            .and_then(JsonValue::as_array)
            .is_some_and(|s| !s.is_empty());
        if !has_segments {
            return Err(malformed("itinerary without segments"));
        }
    }
    Ok(NormalizedOffer {
        id: offer.id.clone(),
        price: offer.price.clone(),
        itineraries: offer.itineraries.clone(),
        number_of_bookable_seats: offer.number_of_bookable_seats,
    })
}

/// Provider vocabulary -> stable output vocabulary. `carriers` is the only
/// category the provider names differently.
fn normalize_dictionary(raw: &RawDictionaries) -> NormalizedDictionary {
    NormalizedDictionary {
        aircraft: raw.aircraft.clone().unwrap_or_default(),
        airlines: raw.carriers.clone().unwrap_or_default(),
        locations: raw.locations.clone().unwrap_or_default(),
        currencies: raw.currencies.clone().unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn offer(id: &str) -> JsonValue {
        json!({
            "type": "flight-offer",
            "id": id,
            "source": "GDS",
            "numberOfBookableSeats": 4,
            "itineraries": [{
                "duration": "PT6H10M",
                "segments": [{
                    "departure": {"iataCode": "BOS", "at": "2025-07-01T08:00:00"},
                    "arrival": {"iataCode": "LAX", "at": "2025-07-01T11:10:00"},
                    "carrierCode": "B6",
                    "number": "187",
                    "aircraft": {"code": "32N"}
                }]
            }],
            "price": {"currency": "USD", "total": "312.40", "base": "268.00", "grandTotal": "312.40"},
            "validatingAirlineCodes": ["B6"]
        })
    }

    fn raw(body: JsonValue) -> RawFlightOffersResponse {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn keeps_order_and_drops_provider_noise() {
        let r = raw(json!({ "data": [offer("3"), offer("1"), offer("2")] }));
        let out = normalize(&r).unwrap();
        let ids: Vec<_> = out.offers.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, ["3", "1", "2"]);

        let v = serde_json::to_value(&out.offers[0]).unwrap();
        let mut keys: Vec<_> = v.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, ["id", "itineraries", "numberOfBookableSeats", "price"]);
        assert_eq!(v["itineraries"][0]["segments"][0]["carrierCode"], "B6");
        assert_eq!(v["numberOfBookableSeats"], 4);
    }

    #[test]
    fn missing_seat_count_is_omitted_not_zeroed() {
        let mut bare = offer("1");
        bare.as_object_mut().unwrap().remove("numberOfBookableSeats");
        let out = normalize(&raw(json!({ "data": [bare, offer("2")] }))).unwrap();
        assert_eq!(out.offers[0].number_of_bookable_seats, None);
        assert_eq!(out.offers[1].number_of_bookable_seats, Some(4));

        let v = serde_json::to_value(&out.offers[0]).unwrap();
        assert!(v.get("numberOfBookableSeats").is_none());
    }

    #[test]
    fn renames_carriers_and_fills_missing_categories() {
        let r = raw(json!({
            "data": [offer("1")],
            "dictionaries": {
                "carriers": {"B6": "JETBLUE AIRWAYS"},
                "locations": {"BOS": {"cityCode": "BOS", "countryCode": "US"}}
            }
        }));
        let out = normalize(&r).unwrap();
        let v = serde_json::to_value(&out.dictionary).unwrap();
        assert_eq!(v["airlines"]["B6"], "JETBLUE AIRWAYS");
        assert_eq!(v["locations"]["BOS"]["countryCode"], "US");
        assert_eq!(v["aircraft"], json!({}));
        assert_eq!(v["currencies"], json!({}));
        assert!(v.get("carriers").is_none());
    }

    #[test]
    fn dictionary_always_has_four_keys() {
        let bodies = [
            json!({ "data": [] }),
            json!({ "data": [], "dictionaries": {} }),
            json!({ "data": [], "dictionaries": {"aircraft": {"32N": "AIRBUS A320NEO"}} }),
            json!({ "data": [], "dictionaries": {
                "aircraft": {}, "carriers": {}, "locations": {}, "currencies": {"USD": "US DOLLAR"}
            }}),
        ];
        for body in bodies {
            let out = normalize(&raw(body)).unwrap();
            let v = serde_json::to_value(&out.dictionary).unwrap();
            for key in ["aircraft", "airlines", "locations", "currencies"] {
                assert!(v[key].is_object(), "missing {key}");
            }
        }
    }

    #[test]
    fn normalizing_twice_is_byte_identical() {
        let r = raw(json!({
            "data": [offer("1"), offer("2")],
            "dictionaries": {"carriers": {"B6": "JETBLUE AIRWAYS", "AA": "AMERICAN AIRLINES"}}
        }));
        let a = serde_json::to_vec(&normalize(&r).unwrap()).unwrap();
        let b = serde_json::to_vec(&normalize(&r).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn malformed_offer_fails_the_whole_response() {
        let mut bad = offer("2");
        bad["itineraries"] = json!([{ "segments": [] }]);
        let r = raw(json!({ "data": [offer("1"), bad] }));
        let err = normalize(&r).unwrap_err();
        assert!(!err.is_transient());
        assert!(err.to_string().contains("position 1"));

        let mut no_price = offer("3");
        no_price["price"] = JsonValue::Null;
        assert!(normalize(&raw(json!({ "data": [no_price] }))).is_err());
    }
}
