//! Stateless HTTP request builder and response parser for the reservations API.
//!
//! # Design
//! `ReservationsClient` holds only its immutable `ClientConfig`. Each backend
//! operation is split into a `build_*` method that produces an `HttpRequest`
//! and a `parse_*` method that consumes an `HttpResponse`. All parsers go
//! through `parse_envelope`, which unwraps the backend's `{data}`/`{error}`
//! convention. `ApiClient` in `executor` runs the round-trip in between.

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::format::format_reservations;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{DataEnvelope, Reservation, ReservationStatus, SeatRequest, StatusRequest, Table};

/// Synchronous, stateless client for the reservations API.
#[derive(Debug, Clone)]
pub struct ReservationsClient {
    config: ClientConfig,
}

impl ReservationsClient {
    pub fn new(base_url: &str) -> Self {
        Self::from_config(ClientConfig::new(base_url))
    }

    pub fn from_config(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Reservations
    // -----------------------------------------------------------------------

    /// `GET /reservations` with `params` appended verbatim as the query string.
    pub fn build_list_reservations<K, V>(&self, params: &[(K, V)]) -> Result<HttpRequest, ApiError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let url = self.url_with_query("/reservations", params)?;
        Ok(self.request(HttpMethod::Get, url, None))
    }

    pub fn build_search_reservations(&self, mobile_number: &str) -> Result<HttpRequest, ApiError> {
        self.build_list_reservations(&[("mobile_number", mobile_number)])
    }

    pub fn build_create_reservation(
        &self,
        reservation: &Reservation,
    ) -> Result<HttpRequest, ApiError> {
        if reservation.reservation_id.is_some() {
            return Err(ApiError::UnexpectedIdentifier { resource: "reservation" });
        }
        let body = wrap_data(reservation)?;
        Ok(self.request(HttpMethod::Post, self.url("/reservations"), Some(body)))
    }

    pub fn build_read_reservation(&self, reservation_id: i64) -> HttpRequest {
        self.request(
            HttpMethod::Get,
            self.url(&format!("/reservations/{reservation_id}")),
            None,
        )
    }

    /// `PUT /reservations/:id`, taking the id from the record itself.
    pub fn build_update_reservation(
        &self,
        reservation: &Reservation,
    ) -> Result<HttpRequest, ApiError> {
        let reservation_id = reservation
            .reservation_id
            .ok_or(ApiError::MissingIdentifier { resource: "reservation" })?;
        let body = wrap_data(reservation)?;
        Ok(self.request(
            HttpMethod::Put,
            self.url(&format!("/reservations/{reservation_id}")),
            Some(body),
        ))
    }

    pub fn build_update_reservation_status(
        &self,
        reservation_id: i64,
        status: ReservationStatus,
    ) -> Result<HttpRequest, ApiError> {
        let body = wrap_data(&StatusRequest { status })?;
        Ok(self.request(
            HttpMethod::Put,
            self.url(&format!("/reservations/{reservation_id}/status")),
            Some(body),
        ))
    }

    pub fn parse_list_reservations(
        &self,
        response: HttpResponse,
    ) -> Result<Vec<Reservation>, ApiError> {
        let reservations: Vec<Reservation> = self.parse_envelope(&response)?;
        Ok(format_reservations(reservations))
    }

    pub fn parse_search_reservations(
        &self,
        response: HttpResponse,
    ) -> Result<Vec<Reservation>, ApiError> {
        self.parse_envelope(&response)
    }

    pub fn parse_create_reservation(
        &self,
        response: HttpResponse,
    ) -> Result<Option<Reservation>, ApiError> {
        let created: Option<Reservation> = self.parse_envelope(&response)?;
        match created {
            Some(reservation) if reservation.reservation_id.is_none() => {
                Err(ApiError::MissingIdentifier { resource: "reservation" })
            }
            other => Ok(other),
        }
    }

    pub fn parse_read_reservation(
        &self,
        response: HttpResponse,
    ) -> Result<Option<Reservation>, ApiError> {
        self.parse_envelope(&response)
    }

    pub fn parse_update_reservation(
        &self,
        response: HttpResponse,
    ) -> Result<Option<Reservation>, ApiError> {
        self.parse_envelope(&response)
    }

    pub fn parse_update_reservation_status(
        &self,
        response: HttpResponse,
    ) -> Result<Option<Reservation>, ApiError> {
        self.parse_envelope(&response)
    }

    // -----------------------------------------------------------------------
    // Tables
    // -----------------------------------------------------------------------

    pub fn build_list_tables(&self) -> HttpRequest {
        self.request(HttpMethod::Get, self.url("/tables"), None)
    }

    pub fn build_create_table(&self, table: &Table) -> Result<HttpRequest, ApiError> {
        if table.table_id.is_some() {
            return Err(ApiError::UnexpectedIdentifier { resource: "table" });
        }
        let body = wrap_data(table)?;
        Ok(self.request(HttpMethod::Post, self.url("/tables"), Some(body)))
    }

    pub fn build_read_table_by_reservation(&self, reservation_id: i64) -> HttpRequest {
        self.request(
            HttpMethod::Get,
            self.url(&format!("/tables/seated/{reservation_id}")),
            None,
        )
    }

    pub fn build_seat_reservation(
        &self,
        table_id: i64,
        reservation_id: i64,
    ) -> Result<HttpRequest, ApiError> {
        let body = wrap_data(&SeatRequest { reservation_id })?;
        Ok(self.request(
            HttpMethod::Put,
            self.url(&format!("/tables/{table_id}/seat")),
            Some(body),
        ))
    }

    pub fn build_finish_table(&self, table_id: i64) -> HttpRequest {
        self.request(
            HttpMethod::Delete,
            self.url(&format!("/tables/{table_id}/seat")),
            None,
        )
    }

    pub fn parse_list_tables(&self, response: HttpResponse) -> Result<Vec<Table>, ApiError> {
        self.parse_envelope(&response)
    }

    pub fn parse_create_table(&self, response: HttpResponse) -> Result<Option<Table>, ApiError> {
        let created: Option<Table> = self.parse_envelope(&response)?;
        match created {
            Some(table) if table.table_id.is_none() => {
                Err(ApiError::MissingIdentifier { resource: "table" })
            }
            other => Ok(other),
        }
    }

    pub fn parse_read_table_by_reservation(
        &self,
        response: HttpResponse,
    ) -> Result<Option<Table>, ApiError> {
        self.parse_envelope(&response)
    }

    pub fn parse_seat_reservation(
        &self,
        response: HttpResponse,
    ) -> Result<Option<Value>, ApiError> {
        self.parse_envelope(&response)
    }

    pub fn parse_finish_table(&self, response: HttpResponse) -> Result<Option<Value>, ApiError> {
        self.parse_envelope(&response)
    }

    // -----------------------------------------------------------------------
    // Envelope
    // -----------------------------------------------------------------------

    /// Unwraps a `{data}`/`{error}` response into `T`.
    ///
    /// 204, a missing `data` field and `"data": null` all produce
    /// `T::default()`. An `error` field wins over the HTTP status.
    pub fn parse_envelope<T>(&self, response: &HttpResponse) -> Result<T, ApiError>
    where
        T: DeserializeOwned + Default,
    {
        if response.status == 204 {
            return Ok(T::default());
        }

        let envelope: ResponseEnvelope = serde_json::from_str(&response.body)
            .map_err(|e| ApiError::DeserializationError(e.to_string()))?;

        if let Some(message) = envelope.error_message() {
            return Err(ApiError::Payload {
                status: response.status,
                message,
            });
        }

        if !response.is_success() {
            if self.config.strict_status {
                return Err(ApiError::HttpError {
                    status: response.status,
                    body: response.body.clone(),
                });
            }
            warn!(
                status = response.status,
                "non-success response without an error field, using its data"
            );
        }

        match envelope.data {
            None | Some(Value::Null) => Ok(T::default()),
            Some(data) => serde_json::from_value(data)
                .map_err(|e| ApiError::DeserializationError(e.to_string())),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    fn url_with_query<K, V>(&self, path: &str, params: &[(K, V)]) -> Result<String, ApiError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut url = Url::parse(&self.url(path)).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        if !params.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(params.iter().map(|(k, v)| (k.as_ref(), v.as_ref())));
        }
        Ok(url.into())
    }

    fn request(&self, method: HttpMethod, url: String, body: Option<String>) -> HttpRequest {
        HttpRequest {
            method,
            url,
            headers: self.config.default_headers.clone(),
            body,
        }
    }
}

/// The backend's response wrapper. Either field may be absent.
#[derive(Debug, Deserialize)]
struct ResponseEnvelope {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

impl ResponseEnvelope {
    /// The `error` field as display text, if it is set to something non-empty.
    fn error_message(&self) -> Option<String> {
        match self.error.as_ref()? {
            Value::Null | Value::Bool(false) => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

fn wrap_data<T: Serialize>(payload: &T) -> Result<String, ApiError> {
    serde_json::to_string(&DataEnvelope { data: payload })
        .map_err(|e| ApiError::SerializationError(e.to_string()))
}
