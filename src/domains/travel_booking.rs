//! Travel bookings: flights, hotels or both.

use rand_chacha::ChaCha8Rng;
use serde_json::Value;

use super::{choice_param, param, pick, render, DomainInfo, RecordDomain};
use crate::error::{ConfigError, ValidationError};
use crate::pipeline::enrich::Enricher;
use crate::record::{DomainParams, GenerationRequest, OutputFormat, ParsedRecord};

pub const NAME: &str = "travel-booking";

pub const REQUIRED_FIELDS: &[&str] = &[
    "booking_id",
    "created_at",
    "trip_type",
    "region",
    "traveler",
    "itinerary",
    "total_cost",
];

pub const INFO: DomainInfo = DomainInfo {
    name: NAME,
    description: "Flight and hotel bookings with itinerary and cost breakdown",
    required_fields: REQUIRED_FIELDS,
};

pub const TRIP_TYPES: &[&str] = &["flight", "hotel", "flight+hotel"];
pub const STATUSES: &[&str] = &["confirmed", "pending", "canceled"];

pub const AIRLINES: &[&str] = &[
    "SkyWays",
    "AeroLink",
    "BlueJet",
    "Northwind Air",
    "Coastal Airlines",
    "Summit Air",
    "Polar Express Air",
    "Sunline",
];

pub const HOTEL_CHAINS: &[&str] = &[
    "Grand Stay",
    "Urban Inn",
    "Harbor Suites",
    "Maple Lodge",
    "Riverside Hotels",
    "Sunset Resorts",
    "Cityline Hotels",
    "Oak & Stone",
];

const DEFAULT_REGION: &str = "global";

const SYSTEM_MESSAGE: &str =
    "You are a travel booking assistant producing fictional booking records as structured data.";

const PROMPT_HEADER: &str = "You are a helpful travel booking assistant generating REALISTIC BUT ENTIRELY FICTIONAL travel bookings for demonstrations.

## BOOKING DETAILS

Booking ID (immutable): {{booking_id}}
Created At: {{created_at}}
Trip Type: {{trip_type}}
Region: {{region}}
Status: {{status}}
{% if airline %}Preferred Airline: {{airline}}
{% endif %}{% if hotel_chain %}Preferred Hotel Chain: {{hotel_chain}}
{% endif %}Use ISO-8601 timestamps, plausible airport codes and do NOT invent real PII.

## BOOKING GUIDELINES

Include traveler details, an itinerary matching the trip type, a cost breakdown that sums to the total, and cancellation terms. All names, emails and confirmation codes must be fictional.
";

const YAML_SKELETON: &str = "Return VALID YAML ONLY (no markdown fences).

booking_id: (echo above)
created_at: (echo above)
trip_type: (echo above)
region: (echo above)
status: confirmed|pending|canceled
traveler:
  name: fictional name
  email: realistic but fake email
  loyalty_number: text (optional)
itinerary:
  flights:  # omit for hotel-only trips
    - airline: text
      flight_number: text
      from: airport code
      to: airport code
      depart_at: ISO 8601
      arrive_at: ISO 8601
  hotel:  # omit for flight-only trips
    name: text
    check_in: ISO 8601 date
    check_out: ISO 8601 date
    room_type: text
total_cost:
  amount: decimal
  currency: USD
cancellation_policy: text
";

const JSON_SKELETON: &str = r#"Return VALID JSON ONLY (no markdown fences).

{
  "booking_id": "(echo above)",
  "created_at": "(echo above)",
  "trip_type": "(echo above)",
  "region": "(echo above)",
  "status": "confirmed|pending|canceled",
  "traveler": {
    "name": "fictional name",
    "email": "realistic but fake email",
    "loyalty_number": "text (optional)"
  },
  "itinerary": {
    "flights": [
      {
        "airline": "text",
        "flight_number": "text",
        "from": "airport code",
        "to": "airport code",
        "depart_at": "ISO 8601",
        "arrive_at": "ISO 8601"
      }
    ],
    "hotel": {
      "name": "text",
      "check_in": "ISO 8601 date",
      "check_out": "ISO 8601 date",
      "room_type": "text"
    }
  },
  "total_cost": {
    "amount": 123.45,
    "currency": "USD"
  },
  "cancellation_policy": "text"
}
"#;

const TEXT_SKELETON: &str = "Return plain text WITHOUT any YAML/JSON formatting markers.

Booking ID: (echo above)
Created At: (echo above)
Trip Type: (echo above)
Region: (echo above)
Status: confirmed|pending|canceled
Traveler: fictional name <realistic but fake email>
Itinerary:
  Flight: airline flight_number from -> to, depart_at to arrive_at
  Hotel: name, check_in to check_out, room_type
Total Cost: amount currency
Cancellation Policy: text
";

/// Bookings of one trip type within a region.
#[derive(Debug, Clone)]
pub struct TravelBooking {
    trip_type: &'static str,
    region: String,
}

impl TravelBooking {
    pub fn new(trip_type: &'static str, region: impl Into<String>) -> Self {
        Self {
            trip_type,
            region: region.into(),
        }
    }

    /// `trip_type` is flight, hotel or flight+hotel (the default);
    /// `region` defaults to "global".
    pub fn from_params(params: &DomainParams) -> Result<Self, ConfigError> {
        let trip_type = choice_param(params, "trip_type", TRIP_TYPES)?.unwrap_or("flight+hotel");
        Ok(Self::new(
            trip_type,
            param(params, "region").unwrap_or(DEFAULT_REGION),
        ))
    }

    fn includes_flight(&self) -> bool {
        self.trip_type != "hotel"
    }

    fn includes_hotel(&self) -> bool {
        self.trip_type != "flight"
    }
}

impl RecordDomain for TravelBooking {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        INFO.description
    }

    fn required_fields(&self) -> &'static [&'static str] {
        REQUIRED_FIELDS
    }

    fn system_message(&self) -> &'static str {
        SYSTEM_MESSAGE
    }

    fn item_params(&self, rng: &mut ChaCha8Rng) -> DomainParams {
        let mut params = DomainParams::new();
        params.insert("trip_type".to_string(), self.trip_type.to_string());
        params.insert("region".to_string(), self.region.clone());
        params.insert("status".to_string(), pick(rng, STATUSES).to_string());
        if self.includes_flight() {
            params.insert("airline".to_string(), pick(rng, AIRLINES).to_string());
        }
        if self.includes_hotel() {
            params.insert("hotel_chain".to_string(), pick(rng, HOTEL_CHAINS).to_string());
        }
        params
    }

    fn build_prompt(&self, request: &GenerationRequest) -> Result<String, ConfigError> {
        let booking_id = request.unique_id().to_string();
        let created_at = request.created_at_rfc3339();

        let skeleton = match request.output_format() {
            OutputFormat::Yaml => YAML_SKELETON,
            OutputFormat::Json => JSON_SKELETON,
            OutputFormat::Text => TEXT_SKELETON,
        };

        // An empty hint is falsy and drops its line.
        render(
            &format!("{}\n{}", PROMPT_HEADER, skeleton),
            &[
                ("booking_id", booking_id.as_str()),
                ("created_at", created_at.as_str()),
                ("trip_type", request.param("trip_type").unwrap_or(self.trip_type)),
                ("region", request.param("region").unwrap_or(self.region.as_str())),
                ("status", request.param("status").unwrap_or("confirmed")),
                ("airline", request.param("airline").unwrap_or("")),
                ("hotel_chain", request.param("hotel_chain").unwrap_or("")),
            ],
        )
    }

    fn check_record(&self, record: &ParsedRecord) -> Result<(), ValidationError> {
        match record.get("itinerary") {
            Some(Value::Object(_)) => Ok(()),
            _ => Err(ValidationError::Constraint(
                "itinerary must be a mapping".to_string(),
            )),
        }
    }

    fn enricher(&self, request: &GenerationRequest) -> Enricher {
        match request.param("status") {
            Some(status) => {
                Enricher::new().with_constant("status", Value::String(status.to_string()))
            }
            None => Enricher::new(),
        }
    }
}
