//! Client core for the restaurant reservations backend.
//!
//! # Overview
//! `ReservationsClient` builds `HttpRequest` values and parses
//! `HttpResponse` values without touching the network (host-does-IO
//! pattern). `ApiClient` is the async host: it runs the exchange over
//! `reqwest` and lets the caller cancel it through an `AbortSignal`.
//!
//! # Design
//! - Both clients are stateless apart from an immutable `ClientConfig`.
//! - Each backend operation is split into `build_*` and `parse_*`, so the
//!   I/O boundary is explicit and every parser can be tested with literal
//!   responses.
//! - The backend wraps bodies as `{"data": ...}` and reports failures as
//!   `{"error": "..."}`; `parse_envelope` is the single place that unwraps it.
//! - A cancelled request is not an error: it resolves with the operation's
//!   empty value.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod format;
pub mod http;
pub mod signal;
pub mod types;

pub use client::ReservationsClient;
pub use config::ClientConfig;
pub use error::ApiError;
pub use executor::ApiClient;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use signal::{AbortController, AbortSignal};
pub use types::{Reservation, ReservationStatus, Table};
