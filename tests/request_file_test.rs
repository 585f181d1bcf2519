//! Request envelope parsing round-trips.

#![allow(clippy::unwrap_used)]

use std::io::Write;
use std::path::Path;

use serde_json::json;

use rampart::request::{RequestType, ResourceRequest};

#[test]
fn test_request_round_trips_through_a_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let payload = json!({
        "RequestType": "Create",
        "ResourceType": "Custom::RateBasedRule",
        "RequestId": "req-42",
        "LogicalResourceId": "RateBasedRule",
        "ResourceProperties": {
            "Name": "r1",
            "MetricName": "r1-m",
            "RateKey": "IP",
            "RateLimit": "2000"
        }
    });
    write!(file, "{payload}").unwrap();

    let request = ResourceRequest::from_file(file.path()).unwrap();
    assert_eq!(request.request_type, RequestType::Create);
    assert_eq!(request.resource_type, "Custom::RateBasedRule");
    assert_eq!(request.request_id.as_deref(), Some("req-42"));
    assert_eq!(
        request.resource_properties.get("RateLimit"),
        Some(&json!("2000"))
    );
}

#[test]
fn test_missing_file_is_a_read_error() {
    let err = ResourceRequest::from_file(Path::new("/no/such/request.json")).unwrap_err();
    assert!(err.to_string().starts_with("failed to read request"));
}

#[test]
fn test_malformed_file_is_a_parse_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{{ definitely not json").unwrap();

    let err = ResourceRequest::from_file(file.path()).unwrap_err();
    assert!(err.to_string().starts_with("JSON parse error"));
}
