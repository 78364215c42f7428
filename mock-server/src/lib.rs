use std::{collections::BTreeMap, collections::HashMap, sync::Arc};

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;

pub const STATUSES: [&str; 4] = ["booked", "seated", "finished", "cancelled"];

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Reservation {
    pub reservation_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub mobile_number: String,
    pub reservation_date: String,
    pub reservation_time: String,
    pub people: u32,
    pub status: String,
}

impl Reservation {
    /// The record as a SQL-backed server would emit it: the date as a UTC
    /// timestamp and the time with seconds.
    fn to_wire(&self) -> Reservation {
        let mut wire = self.clone();
        if wire.reservation_date.len() == 10 {
            wire.reservation_date = format!("{}T00:00:00.000Z", wire.reservation_date);
        }
        if wire.reservation_time.len() == 5 {
            wire.reservation_time = format!("{}:00", wire.reservation_time);
        }
        wire
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Table {
    pub table_id: i64,
    pub table_name: String,
    pub capacity: u32,
    pub reservation_id: Option<i64>,
}

#[derive(Debug, Default)]
pub struct Store {
    reservations: BTreeMap<i64, Reservation>,
    tables: BTreeMap<i64, Table>,
    next_reservation_id: i64,
    next_table_id: i64,
}

impl Store {
    /// The four tables a fresh restaurant starts with.
    pub fn seeded() -> Self {
        let mut store = Store::default();
        for (name, capacity) in [("Bar #1", 1), ("Bar #2", 1), ("#1", 6), ("#2", 6)] {
            store.insert_table(name.to_string(), capacity);
        }
        store
    }

    fn insert_table(&mut self, table_name: String, capacity: u32) -> Table {
        self.next_table_id += 1;
        let table = Table {
            table_id: self.next_table_id,
            table_name,
            capacity,
            reservation_id: None,
        };
        self.tables.insert(table.table_id, table.clone());
        table
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    app_with_store(Store::default())
}

pub fn app_with_store(store: Store) -> Router {
    let db: Db = Arc::new(RwLock::new(store));
    Router::new()
        .route("/reservations", get(list_reservations).post(create_reservation))
        .route("/reservations/{id}", get(read_reservation).put(update_reservation))
        .route("/reservations/{id}/status", put(update_status))
        .route("/tables", get(list_tables).post(create_table))
        .route("/tables/seated/{reservation_id}", get(read_seated_table))
        .route("/tables/{id}/seat", put(seat_table).delete(finish_table))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_store(listener, Store::default()).await
}

pub async fn run_with_store(listener: TcpListener, store: Store) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_store(store)).await
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ApiFailure {
    status: StatusCode,
    message: String,
}

impl ApiFailure {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

type ApiResult = Result<Response, ApiFailure>;

fn respond<T: Serialize>(status: StatusCode, data: T) -> ApiResult {
    Ok((status, Json(json!({ "data": data }))).into_response())
}

/// Pulls `data` out of a `{"data": ...}` request body.
fn request_data(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiFailure> {
    let Json(mut body) = body.map_err(|e| ApiFailure::bad_request(e.body_text()))?;
    match body.get_mut("data").map(Value::take) {
        Some(Value::Object(map)) => Ok(Value::Object(map)),
        _ => Err(ApiFailure::bad_request("data is missing")),
    }
}

fn required_str(data: &Value, field: &str) -> Result<String, ApiFailure> {
    match data.get(field).and_then(Value::as_str) {
        Some(s) if !s.trim().is_empty() => Ok(s.to_string()),
        _ => Err(ApiFailure::bad_request(format!("{field} is required"))),
    }
}

fn is_date(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes.iter().enumerate().all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit())
}

fn is_time(s: &str) -> bool {
    let bytes = s.as_bytes();
    matches!(bytes.len(), 5 | 8)
        && bytes[2] == b':'
        && bytes.iter().enumerate().all(|(i, b)| i == 2 || i == 5 || b.is_ascii_digit())
        && (bytes.len() == 5 || bytes[5] == b':')
}

fn digits(s: &str) -> String {
    s.chars().filter(char::is_ascii_digit).collect()
}

/// Validates the writable reservation fields. `reservation_date` accepts a
/// full timestamp so that records read back from this server can be sent
/// straight back.
fn reservation_fields(data: &Value) -> Result<Reservation, ApiFailure> {
    let first_name = required_str(data, "first_name")?;
    let last_name = required_str(data, "last_name")?;
    let mobile_number = required_str(data, "mobile_number")?;
    let reservation_date = required_str(data, "reservation_date")?;
    let mut reservation_time = required_str(data, "reservation_time")?;

    let reservation_date = reservation_date
        .get(..10)
        .filter(|date| is_date(date))
        .map(str::to_string)
        .ok_or_else(|| ApiFailure::bad_request("reservation_date must be a date"))?;
    if !is_time(&reservation_time) {
        return Err(ApiFailure::bad_request("reservation_time must be a time"));
    }
    reservation_time.truncate(5);

    let people = match data.get("people").and_then(Value::as_u64) {
        Some(n) if n >= 1 => n as u32,
        _ => return Err(ApiFailure::bad_request("people must be a positive number")),
    };

    Ok(Reservation {
        reservation_id: 0,
        first_name,
        last_name,
        mobile_number,
        reservation_date,
        reservation_time,
        people,
        status: "booked".to_string(),
    })
}

fn reservation_not_found(id: i64) -> ApiFailure {
    ApiFailure::not_found(format!("Reservation {id} cannot be found."))
}

fn table_not_found(id: i64) -> ApiFailure {
    ApiFailure::not_found(format!("Table {id} cannot be found."))
}

// ---------------------------------------------------------------------------
// Reservations
// ---------------------------------------------------------------------------

async fn list_reservations(
    State(db): State<Db>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult {
    let store = db.read().await;
    let mut found: Vec<&Reservation> = store.reservations.values().collect();

    if let Some(date) = params.get("date") {
        found.retain(|r| {
            &r.reservation_date == date && r.status != "finished" && r.status != "cancelled"
        });
    }
    if let Some(mobile_number) = params.get("mobile_number") {
        let wanted = digits(mobile_number);
        found.retain(|r| digits(&r.mobile_number).contains(&wanted));
    }
    found.sort_by(|a, b| {
        (&a.reservation_date, &a.reservation_time, a.reservation_id).cmp(&(
            &b.reservation_date,
            &b.reservation_time,
            b.reservation_id,
        ))
    });

    let data: Vec<Reservation> = found.into_iter().map(Reservation::to_wire).collect();
    respond(StatusCode::OK, data)
}

async fn create_reservation(
    State(db): State<Db>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult {
    let data = request_data(body)?;
    if !data.get("reservation_id").unwrap_or(&Value::Null).is_null() {
        return Err(ApiFailure::bad_request("reservation_id must not be provided"));
    }
    if let Some(status) = data.get("status").and_then(Value::as_str) {
        if status != "booked" {
            return Err(ApiFailure::bad_request(format!("status cannot be {status}")));
        }
    }
    let mut reservation = reservation_fields(&data)?;

    let mut store = db.write().await;
    store.next_reservation_id += 1;
    reservation.reservation_id = store.next_reservation_id;
    store.reservations.insert(reservation.reservation_id, reservation.clone());
    info!(reservation_id = reservation.reservation_id, "reservation created");

    respond(StatusCode::CREATED, reservation.to_wire())
}

async fn read_reservation(State(db): State<Db>, Path(id): Path<i64>) -> ApiResult {
    let store = db.read().await;
    let reservation = store.reservations.get(&id).ok_or_else(|| reservation_not_found(id))?;
    respond(StatusCode::OK, reservation.to_wire())
}

async fn update_reservation(
    State(db): State<Db>,
    Path(id): Path<i64>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult {
    let data = request_data(body)?;
    let fields = reservation_fields(&data)?;

    let mut store = db.write().await;
    let reservation = store.reservations.get_mut(&id).ok_or_else(|| reservation_not_found(id))?;
    if reservation.status != "booked" {
        return Err(ApiFailure::bad_request(format!(
            "a {} reservation cannot be edited",
            reservation.status
        )));
    }
    *reservation = Reservation {
        reservation_id: id,
        status: reservation.status.clone(),
        ..fields
    };
    respond(StatusCode::OK, reservation.to_wire())
}

async fn update_status(
    State(db): State<Db>,
    Path(id): Path<i64>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult {
    let data = request_data(body)?;
    let status = data.get("status").and_then(Value::as_str).unwrap_or_default();
    if !STATUSES.contains(&status) {
        return Err(ApiFailure::bad_request(format!("unknown status: {status}")));
    }

    let mut store = db.write().await;
    let reservation = store.reservations.get_mut(&id).ok_or_else(|| reservation_not_found(id))?;
    if reservation.status == "finished" {
        return Err(ApiFailure::bad_request("a finished reservation cannot be updated"));
    }
    reservation.status = status.to_string();
    info!(reservation_id = id, status, "reservation status changed");
    respond(StatusCode::OK, reservation.to_wire())
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

async fn list_tables(State(db): State<Db>) -> ApiResult {
    let store = db.read().await;
    let mut tables: Vec<Table> = store.tables.values().cloned().collect();
    tables.sort_by(|a, b| a.table_name.cmp(&b.table_name));
    respond(StatusCode::OK, tables)
}

async fn create_table(State(db): State<Db>, body: Result<Json<Value>, JsonRejection>) -> ApiResult {
    let data = request_data(body)?;
    if !data.get("table_id").unwrap_or(&Value::Null).is_null() {
        return Err(ApiFailure::bad_request("table_id must not be provided"));
    }
    let table_name = match data.get("table_name").and_then(Value::as_str) {
        Some(name) if name.chars().count() >= 2 => name.to_string(),
        _ => return Err(ApiFailure::bad_request("table_name must be at least 2 characters")),
    };
    let capacity = match data.get("capacity").and_then(Value::as_u64) {
        Some(n) if n >= 1 => n as u32,
        _ => return Err(ApiFailure::bad_request("capacity must be at least 1")),
    };

    let table = db.write().await.insert_table(table_name, capacity);
    info!(table_id = table.table_id, "table created");
    respond(StatusCode::CREATED, table)
}

async fn read_seated_table(State(db): State<Db>, Path(reservation_id): Path<i64>) -> ApiResult {
    let store = db.read().await;
    let table = store
        .tables
        .values()
        .find(|t| t.reservation_id == Some(reservation_id))
        .ok_or_else(|| {
            ApiFailure::not_found(format!("No table is seated with reservation {reservation_id}"))
        })?;
    respond(StatusCode::OK, table)
}

async fn seat_table(
    State(db): State<Db>,
    Path(id): Path<i64>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult {
    let data = request_data(body)?;
    let reservation_id = data
        .get("reservation_id")
        .and_then(Value::as_i64)
        .ok_or_else(|| ApiFailure::bad_request("reservation_id is required"))?;

    let mut store = db.write().await;
    let table = store.tables.get(&id).ok_or_else(|| table_not_found(id))?.clone();
    let reservation = store
        .reservations
        .get(&reservation_id)
        .ok_or_else(|| reservation_not_found(reservation_id))?;

    if reservation.people > table.capacity {
        return Err(ApiFailure::bad_request("table capacity is too small for this party"));
    }
    if table.reservation_id.is_some() {
        return Err(ApiFailure::bad_request("table is occupied"));
    }
    if reservation.status != "booked" {
        return Err(ApiFailure::bad_request(format!(
            "reservation is already {}",
            reservation.status
        )));
    }

    if let Some(reservation) = store.reservations.get_mut(&reservation_id) {
        reservation.status = "seated".to_string();
    }
    let table = store.tables.entry(id).or_insert(table);
    table.reservation_id = Some(reservation_id);
    info!(table_id = id, reservation_id, "reservation seated");
    respond(StatusCode::OK, table.clone())
}

async fn finish_table(State(db): State<Db>, Path(id): Path<i64>) -> ApiResult {
    let mut store = db.write().await;
    let table = store.tables.get_mut(&id).ok_or_else(|| table_not_found(id))?;
    let reservation_id = table
        .reservation_id
        .take()
        .ok_or_else(|| ApiFailure::bad_request("table is not occupied"))?;

    if let Some(reservation) = store.reservations.get_mut(&reservation_id) {
        reservation.status = "finished".to_string();
    }
    info!(table_id = id, reservation_id, "table finished");
    Ok(StatusCode::NO_CONTENT.into_response())
}
