//! Async host for `ReservationsClient`: runs each built request over
//! `reqwest`, races it against an optional `AbortSignal`, and hands the
//! response to the matching parser.
//!
//! # Design
//! Every operation has the same shape: build, exchange, parse. The exchange
//! covers both sending and reading the body, so an abort that lands while
//! the body is still streaming also resolves with the fallback. A signal
//! that is already aborted short-circuits before anything is sent.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use crate::client::ReservationsClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::signal::AbortSignal;
use crate::types::{Reservation, ReservationStatus, Table};

/// Async client for the reservations API. Cheap to clone; clones share the
/// connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    core: ReservationsClient,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_http_client(config, reqwest::Client::new())
    }

    pub fn with_http_client(config: ClientConfig, http: reqwest::Client) -> Self {
        Self {
            core: ReservationsClient::from_config(config),
            http,
        }
    }

    pub fn core(&self) -> &ReservationsClient {
        &self.core
    }

    /// Shared executor: sends `request`, unwraps the envelope into `T`, and
    /// resolves with `on_abort` if `signal` fires first.
    pub async fn fetch_json<T>(
        &self,
        request: HttpRequest,
        signal: Option<&AbortSignal>,
        on_abort: T,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned + Default,
    {
        self.run(request, signal, on_abort, |response| self.core.parse_envelope(&response))
            .await
    }

    // -----------------------------------------------------------------------
    // Reservations
    // -----------------------------------------------------------------------

    /// Lists reservations matching `params`, with dates as `YYYY-MM-DD` and
    /// times as `HH:MM`.
    pub async fn list_reservations<K, V>(
        &self,
        params: &[(K, V)],
        signal: Option<&AbortSignal>,
    ) -> Result<Vec<Reservation>, ApiError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let request = self.core.build_list_reservations(params)?;
        self.run(request, signal, Vec::new(), |r| self.core.parse_list_reservations(r))
            .await
    }

    pub async fn search_reservations(
        &self,
        mobile_number: &str,
        signal: Option<&AbortSignal>,
    ) -> Result<Vec<Reservation>, ApiError> {
        let request = self.core.build_search_reservations(mobile_number)?;
        self.run(request, signal, Vec::new(), |r| self.core.parse_search_reservations(r))
            .await
    }

    pub async fn create_reservation(
        &self,
        reservation: &Reservation,
        signal: Option<&AbortSignal>,
    ) -> Result<Option<Reservation>, ApiError> {
        let request = self.core.build_create_reservation(reservation)?;
        self.run(request, signal, None, |r| self.core.parse_create_reservation(r))
            .await
    }

    pub async fn read_reservation(
        &self,
        reservation_id: i64,
        signal: Option<&AbortSignal>,
    ) -> Result<Option<Reservation>, ApiError> {
        let request = self.core.build_read_reservation(reservation_id);
        self.run(request, signal, None, |r| self.core.parse_read_reservation(r))
            .await
    }

    pub async fn update_reservation(
        &self,
        reservation: &Reservation,
        signal: Option<&AbortSignal>,
    ) -> Result<Option<Reservation>, ApiError> {
        let request = self.core.build_update_reservation(reservation)?;
        self.run(request, signal, None, |r| self.core.parse_update_reservation(r))
            .await
    }

    pub async fn update_reservation_status(
        &self,
        reservation_id: i64,
        status: ReservationStatus,
        signal: Option<&AbortSignal>,
    ) -> Result<Option<Reservation>, ApiError> {
        let request = self.core.build_update_reservation_status(reservation_id, status)?;
        self.run(request, signal, None, |r| self.core.parse_update_reservation_status(r))
            .await
    }

    // -----------------------------------------------------------------------
    // Tables
    // -----------------------------------------------------------------------

    pub async fn list_tables(&self, signal: Option<&AbortSignal>) -> Result<Vec<Table>, ApiError> {
        let request = self.core.build_list_tables();
        self.run(request, signal, Vec::new(), |r| self.core.parse_list_tables(r))
            .await
    }

    pub async fn create_table(
        &self,
        table: &Table,
        signal: Option<&AbortSignal>,
    ) -> Result<Option<Table>, ApiError> {
        let request = self.core.build_create_table(table)?;
        self.run(request, signal, None, |r| self.core.parse_create_table(r))
            .await
    }

    pub async fn read_table_by_reservation(
        &self,
        reservation_id: i64,
        signal: Option<&AbortSignal>,
    ) -> Result<Option<Table>, ApiError> {
        let request = self.core.build_read_table_by_reservation(reservation_id);
        self.run(request, signal, None, |r| self.core.parse_read_table_by_reservation(r))
            .await
    }

    pub async fn seat_reservation(
        &self,
        table_id: i64,
        reservation_id: i64,
        signal: Option<&AbortSignal>,
    ) -> Result<Option<Value>, ApiError> {
        let request = self.core.build_seat_reservation(table_id, reservation_id)?;
        self.run(request, signal, None, |r| self.core.parse_seat_reservation(r))
            .await
    }

    /// Frees the table; the backend marks its reservation finished.
    pub async fn finish_table(
        &self,
        table_id: i64,
        signal: Option<&AbortSignal>,
    ) -> Result<Option<Value>, ApiError> {
        let request = self.core.build_finish_table(table_id);
        self.run(request, signal, None, |r| self.core.parse_finish_table(r))
            .await
    }

    // -----------------------------------------------------------------------
    // Exchange
    // -----------------------------------------------------------------------

    async fn run<T, F>(
        &self,
        request: HttpRequest,
        signal: Option<&AbortSignal>,
        on_abort: T,
        parse: F,
    ) -> Result<T, ApiError>
    where
        F: FnOnce(HttpResponse) -> Result<T, ApiError>,
    {
        let method = request.method;
        let url = request.url.clone();

        let response = match signal {
            Some(signal) if signal.is_aborted() => {
                debug!(%method, %url, "signal already aborted, request not sent");
                return Ok(on_abort);
            }
            Some(signal) => tokio::select! {
                biased;
                _ = signal.aborted() => {
                    debug!(%method, %url, "request aborted");
                    return Ok(on_abort);
                }
                result = self.exchange(request) => result,
            },
            None => self.exchange(request).await,
        };

        let response =
            response.inspect_err(|e| error!(%method, %url, error = %e, "request failed"))?;
        debug!(%method, %url, status = response.status, "response received");

        parse(response).inspect_err(|e| {
            // The backend's own error messages are expected traffic, not failures to log.
            if !matches!(e, ApiError::Payload { .. }) {
                error!(%method, %url, error = %e, "could not handle response");
            }
        })
    }

    async fn exchange(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let mut builder = self.http.request(request.method.into(), &request.url);
        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
            .collect();
        let body = response.text().await?;

        Ok(HttpResponse { status, headers, body })
    }
}
