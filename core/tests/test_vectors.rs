//! Verify build/parse methods against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector names an operation and describes its input, the expected
//! request, a simulated response, and either the expected parse result or
//! the expected error. Comparing parsed JSON (not raw strings) avoids false
//! negatives from field-ordering differences.

use reservations_core::{
    ApiError, HttpMethod, HttpRequest, HttpResponse, Reservation, ReservationsClient, Table,
};
use serde::Serialize;
use serde_json::Value;

const BASE_URL: &str = "http://localhost:5001";

fn client() -> ReservationsClient {
    ReservationsClient::new(BASE_URL)
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn id(input: &Value, field: &str) -> i64 {
    input[field].as_i64().unwrap()
}

fn build(c: &ReservationsClient, operation: &str, input: &Value) -> HttpRequest {
    match operation {
        "list_reservations" => {
            let params: Vec<(String, String)> =
                serde_json::from_value(input["params"].clone()).unwrap();
            c.build_list_reservations(&params).unwrap()
        }
        "search_reservations" => c
            .build_search_reservations(input["mobile_number"].as_str().unwrap())
            .unwrap(),
        "create_reservation" => {
            let reservation: Reservation =
                serde_json::from_value(input["reservation"].clone()).unwrap();
            c.build_create_reservation(&reservation).unwrap()
        }
        "read_reservation" => c.build_read_reservation(id(input, "reservation_id")),
        "update_reservation" => {
            let reservation: Reservation =
                serde_json::from_value(input["reservation"].clone()).unwrap();
            c.build_update_reservation(&reservation).unwrap()
        }
        "update_reservation_status" => {
            let status = input["status"].as_str().unwrap().parse().unwrap();
            c.build_update_reservation_status(id(input, "reservation_id"), status)
                .unwrap()
        }
        "list_tables" => c.build_list_tables(),
        "create_table" => {
            let table: Table = serde_json::from_value(input["table"].clone()).unwrap();
            c.build_create_table(&table).unwrap()
        }
        "read_table_by_reservation" => {
            c.build_read_table_by_reservation(id(input, "reservation_id"))
        }
        "seat_reservation" => c
            .build_seat_reservation(id(input, "table_id"), id(input, "reservation_id"))
            .unwrap(),
        "finish_table" => c.build_finish_table(id(input, "table_id")),
        other => panic!("unknown operation: {other}"),
    }
}

fn to_value<T: Serialize>(result: Result<T, ApiError>) -> Result<Value, ApiError> {
    result.map(|v| serde_json::to_value(v).unwrap())
}

fn parse(
    c: &ReservationsClient,
    operation: &str,
    response: HttpResponse,
) -> Result<Value, ApiError> {
    match operation {
        "list_reservations" => to_value(c.parse_list_reservations(response)),
        "search_reservations" => to_value(c.parse_search_reservations(response)),
        "create_reservation" => to_value(c.parse_create_reservation(response)),
        "read_reservation" => to_value(c.parse_read_reservation(response)),
        "update_reservation" => to_value(c.parse_update_reservation(response)),
        "update_reservation_status" => to_value(c.parse_update_reservation_status(response)),
        "list_tables" => to_value(c.parse_list_tables(response)),
        "create_table" => to_value(c.parse_create_table(response)),
        "read_table_by_reservation" => to_value(c.parse_read_table_by_reservation(response)),
        "seat_reservation" => to_value(c.parse_seat_reservation(response)),
        "finish_table" => to_value(c.parse_finish_table(response)),
        other => panic!("unknown operation: {other}"),
    }
}

fn check_vectors(raw: &str) {
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let operation = case["operation"].as_str().unwrap();
        let expected_req = &case["expected_request"];

        // Verify build
        let req = build(&c, operation, &case["input"]);
        let expected_method = parse_method(expected_req["method"].as_str().unwrap());
        let expected_url = format!("{BASE_URL}{}", expected_req["path"].as_str().unwrap());
        assert_eq!(req.method, expected_method, "{name}: method");
        assert_eq!(req.url, expected_url, "{name}: url");

        let expected_headers: Vec<(String, String)> =
            serde_json::from_value(expected_req["headers"].clone()).unwrap();
        assert_eq!(req.headers, expected_headers, "{name}: headers");

        let req_body = match req.body.as_deref() {
            Some(body) => serde_json::from_str(body).unwrap(),
            None => Value::Null,
        };
        assert_eq!(req_body, expected_req["body"], "{name}: body");

        // Verify parse
        let sim = &case["simulated_response"];
        let response = HttpResponse {
            status: sim["status"].as_u64().unwrap() as u16,
            headers: Vec::new(),
            body: sim["body"].as_str().unwrap().to_string(),
        };
        let result = parse(&c, operation, response);

        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            match expected_error["kind"].as_str().unwrap() {
                "Payload" => match err {
                    ApiError::Payload { status, message } => {
                        let expected_status = expected_error["status"].as_u64().unwrap();
                        let expected_message = expected_error["message"].as_str().unwrap();
                        assert_eq!(status as u64, expected_status, "{name}: status");
                        assert_eq!(message, expected_message, "{name}: message");
                    }
                    other => panic!("{name}: expected Payload, got {other:?}"),
                },
                other => panic!("{name}: unknown expected_error kind: {other}"),
            }
        } else {
            assert_eq!(result.unwrap(), case["expected_result"], "{name}: parsed result");
        }
    }
}

#[test]
fn reservation_test_vectors() {
    check_vectors(include_str!("../../test-vectors/reservations.json"));
}

#[test]
fn table_test_vectors() {
    check_vectors(include_str!("../../test-vectors/tables.json"));
}
