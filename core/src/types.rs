//! Domain DTOs for the reservations API.
//!
//! # Design
//! The backend owns the record shapes. The structs name the fields the
//! client and its callers read, and everything else lands in `extra` so it
//! survives a read-modify-write cycle unchanged. Named fields default when
//! absent because partial records (a status update echo, for example) come
//! back from some routes.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Lifecycle state of a reservation. Transitions are decided by the backend.
///
/// Statuses this client does not know are kept as `Other` and sent back
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReservationStatus {
    Booked,
    Seated,
    Finished,
    Cancelled,
    Other(String),
}

impl ReservationStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ReservationStatus::Booked => "booked",
            ReservationStatus::Seated => "seated",
            ReservationStatus::Finished => "finished",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::Other(status) => status,
        }
    }

    fn from_wire(s: String) -> Self {
        s.parse().unwrap_or(ReservationStatus::Other(s))
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts only the statuses the backend documents; `Other` is never
/// produced here.
impl FromStr for ReservationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "booked" => Ok(ReservationStatus::Booked),
            "seated" => Ok(ReservationStatus::Seated),
            "finished" => Ok(ReservationStatus::Finished),
            "cancelled" => Ok(ReservationStatus::Cancelled),
            other => Err(format!("unknown reservation status: {other}")),
        }
    }
}

impl Serialize for ReservationStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ReservationStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(ReservationStatus::from_wire)
    }
}

/// `null` reads as the empty string.
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Counts arrive as numbers, numeric strings or `null` depending on the
/// backend's column types.
fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| D::Error::custom(format!("invalid count: {n}"))),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("invalid count: {s:?}"))),
        Some(other) => Err(D::Error::custom(format!("invalid count: {other}"))),
    }
}

/// A reservation record as exchanged with the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reservation_id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub first_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub last_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub mobile_number: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub reservation_date: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub reservation_time: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub people: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ReservationStatus>,
    /// Backend fields the client does not interpret (timestamps and so on).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A dining table. `reservation_id` is the reservation currently seated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub table_name: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub capacity: u32,
    #[serde(default)]
    pub reservation_id: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Table {
    pub fn is_occupied(&self) -> bool {
        self.reservation_id.is_some()
    }
}

/// Request wrapper: every body sent to the backend is `{"data": ...}`.
#[derive(Debug, Serialize)]
pub struct DataEnvelope<'a, T: Serialize> {
    pub data: &'a T,
}

/// Body of the seat-table request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatRequest {
    pub reservation_id: i64,
}

/// Body of the status-update request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusRequest {
    pub status: ReservationStatus,
}
