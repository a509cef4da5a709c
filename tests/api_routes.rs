/// End-to-end tests for the HTTP endpoint
///
/// These tests bind the real tiny_http server on an ephemeral port, serve
/// a temporary SQLite store through the thread pool, and drive it with a
/// blocking HTTP client.
///
/// Run with: cargo test --test api_routes

mod common;

use climate_service::db::Store;
use climate_service::endpoint;
use climate_service::query::QueryService;
use serde_json::{Value, json};

/// Starts a server over `store` and returns its base URL.
fn spawn_server(store: &common::FixtureStore) -> String {
    let service = QueryService::new(Store::open(store.path(), 2).expect("open test store"));
    let server = endpoint::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = server
        .server_addr()
        .to_ip()
        .expect("server listens on an IP address");

    std::thread::spawn(move || endpoint::serve(server, service, 2));
    format!("http://{}", addr)
}

fn get(base: &str, path: &str) -> (u16, Value) {
    let response = reqwest::blocking::get(format!("{}{}", base, path)).expect("request succeeds");
    let status = response.status().as_u16();
    let body = response.json().expect("body is JSON");
    (status, body)
}

#[test]
fn test_index_is_plain_route_listing() {
    let store = common::hawaii_sample();
    let base = spawn_server(&store);

    let response = reqwest::blocking::get(format!("{}/", base)).unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/html"));

    let body = response.text().unwrap();
    assert!(body.starts_with("Available Routes:"));
    assert!(body.contains("/api/v1.0/<start>/<end>"));
}

#[test]
fn test_precipitation_window_over_http() {
    let store = common::hawaii_sample();
    let base = spawn_server(&store);

    let (status, body) = get(&base, "/api/v1.0/precipitations");
    assert_eq!(status, 200);

    let keys: Vec<&String> = body.as_object().unwrap().keys().collect();
    assert_eq!(keys.len(), 9);
    assert!(body.get("2016-08-22").is_none(), "day before cutoff excluded");
    assert_eq!(body["2016-08-23"], 1.79);
    assert_eq!(body["2017-08-23"], 0.45);
    assert_eq!(body["2017-01-15"], 0.0);
    assert!(body["2017-01-01"].is_null(), "missing precipitation is null, not 0");
}

#[test]
fn test_stations_and_tobs_over_http() {
    let store = common::hawaii_sample();
    let base = spawn_server(&store);

    let (status, stations) = get(&base, "/api/v1.0/stations");
    assert_eq!(status, 200);
    assert_eq!(stations, json!(["USC00519397", "USC00513117", "USC00519281", "USC00516128"]));

    // USC00519281 has seven readings; its trailing-year window starts at 2016-08-23.
    let (status, tobs) = get(&base, "/api/v1.0/tobs");
    assert_eq!(status, 200);
    assert_eq!(
        tobs,
        json!({
            "2016-08-23": 77.0,
            "2017-01-01": 62.0,
            "2017-01-15": 70.0,
            "2017-01-31": 68.0,
            "2017-02-01": 71.0,
            "2017-08-23": 79.0
        })
    );
}

#[test]
fn test_temperature_ranges_over_http() {
    let store = common::hawaii_sample();
    let base = spawn_server(&store);

    let (status, january) = get(&base, "/api/v1.0/2017-01-01/2017-01-31");
    assert_eq!(status, 200);
    assert_eq!(january, json!({ "Tmin": 62.0, "Tavg": 66.5, "Tmax": 70.0 }));

    let (status, tail) = get(&base, "/api/v1.0/2017-02-01");
    assert_eq!(status, 200);
    assert_eq!(tail, json!({ "Tmin": 71.0, "Tavg": 76.5, "Tmax": 80.0 }));

    let (status, empty) = get(&base, "/api/v1.0/2020-01-01");
    assert_eq!(status, 200);
    assert_eq!(empty, json!({ "Tmin": null, "Tavg": null, "Tmax": null }));
}

#[test]
fn test_bad_requests_over_http() {
    let store = common::hawaii_sample();
    let base = spawn_server(&store);

    let (status, body) = get(&base, "/api/v1.0/2020-13-40");
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("2020-13-40"));

    let (status, _) = get(&base, "/api/v1.0/2017-01-01/not-a-date");
    assert_eq!(status, 400);

    let (status, _) = get(&base, "/api/v1.0/+2017-01-01");
    assert_eq!(status, 400);

    let (status, body) = get(&base, "/api/v1.0/%FF");
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("UTF-8"));

    let (status, body) = get(&base, "/api/v2/stations");
    assert_eq!(status, 404);
    assert!(body["available_endpoints"].is_array());

    let client = reqwest::blocking::Client::new();
    let response = client.post(format!("{}/api/v1.0/stations", base)).send().unwrap();
    assert_eq!(response.status().as_u16(), 405);
}

#[test]
fn test_concurrent_requests_share_the_pool() {
    let store = common::hawaii_sample();
    let base = spawn_server(&store);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let base = base.clone();
            std::thread::spawn(move || get(&base, "/api/v1.0/stations").0)
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 200);
    }
}
