//! Wiremock-backed tests for the ip-api client.

use std::net::IpAddr;

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use boreal_geo::{GeolocationProvider, IpApiClient};

const PUBLIC_IP: &str = "203.0.113.10";

fn public_ip() -> IpAddr {
    PUBLIC_IP.parse().unwrap()
}

#[tokio::test]
async fn successful_lookup_returns_region_and_coordinates() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/{}", PUBLIC_IP)))
        .and(query_param("fields", "status,regionName,lat,lon"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "regionName": "Nagano",
            "lat": 36.2,
            "lon": 137.9
        })))
        .mount(&server)
        .await;

    let client = IpApiClient::with_config(server.uri());
    let resolved = client.lookup(public_ip()).await.unwrap().unwrap();

    assert_eq!(resolved.region, "Nagano");
    assert_eq!(resolved.lat, 36.2);
    assert_eq!(resolved.lon, 137.9);
}

#[tokio::test]
async fn provider_failure_status_is_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "fail"
        })))
        .mount(&server)
        .await;

    let client = IpApiClient::with_config(server.uri());
    assert!(client.lookup(public_ip()).await.unwrap().is_none());
}

#[tokio::test]
async fn http_error_is_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = IpApiClient::with_config(server.uri());
    assert!(client.lookup(public_ip()).await.unwrap().is_none());
}

#[tokio::test]
async fn malformed_body_is_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = IpApiClient::with_config(server.uri());
    assert!(client.lookup(public_ip()).await.unwrap().is_none());
}

#[tokio::test]
async fn private_ip_short_circuits_without_network_call() {
    let server = MockServer::start().await;

    // No mock mounted: any request would 404, but none must be made.
    let client = IpApiClient::with_config(server.uri());
    let result = client.lookup("192.168.1.20".parse().unwrap()).await.unwrap();
    assert!(result.is_none());

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn unreachable_endpoint_is_unavailable_not_error() {
    // Nothing listens on this port.
    let client = IpApiClient::with_config("http://127.0.0.1:9".to_string());
    assert!(client.lookup(public_ip()).await.unwrap().is_none());
}
