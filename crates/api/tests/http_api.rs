//! Integration tests for the coldwatch HTTP API.
//!
//! Each test starts the server as a child process on a unique port with the
//! demo fixtures seeded, makes raw HTTP requests, and verifies status codes
//! and envelope bodies.

use std::io::Read;
use std::net::TcpStream;
use std::process::{Child, Command};
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

/// Atomic port counter to avoid port conflicts between parallel tests.
/// Base port is derived from process ID so parallel `cargo test --workspace`
/// runs (separate test binaries) don't collide on the same port range.
static NEXT_PORT: AtomicU16 = AtomicU16::new(0);
static PORT_INIT: std::sync::Once = std::sync::Once::new();

fn next_port() -> u16 {
    PORT_INIT.call_once(|| {
        let base = 21000 + (std::process::id() as u16 % 20000);
        NEXT_PORT.store(base, Ordering::SeqCst);
    });
    NEXT_PORT.fetch_add(1, Ordering::SeqCst)
}

struct Server {
    child: Child,
    port: u16,
}

impl Drop for Server {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Start a seeded server and wait until it accepts connections.
fn start_server(extra_args: &[&str]) -> Server {
    let port = next_port();
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_coldwatch"));
    cmd.arg("serve")
        .arg("--port")
        .arg(port.to_string())
        .arg("--seed-demo");
    for arg in extra_args {
        cmd.arg(arg);
    }
    cmd.env("COLDWATCH_JWT_SECRET", "integration-test-secret");
    cmd.stdout(std::process::Stdio::piped());
    cmd.stderr(std::process::Stdio::piped());

    let child = cmd.spawn().expect("failed to start coldwatch serve");
    for _ in 0..50 {
        if TcpStream::connect(format!("127.0.0.1:{}", port)).is_ok() {
            return Server { child, port };
        }
        std::thread::sleep(Duration::from_millis(100));
    }
    Server { child, port }
}

/// Make one HTTP request with optional body and headers; return
/// (status, parsed JSON body).
fn request(
    port: u16,
    method: &str,
    path: &str,
    headers: &[(&str, &str)],
    body: Option<&str>,
) -> (u16, serde_json::Value) {
    let mut stream =
        TcpStream::connect(format!("127.0.0.1:{}", port)).expect("failed to connect");
    stream
        .set_read_timeout(Some(Duration::from_secs(10)))
        .expect("set_read_timeout");

    let mut header_lines = String::new();
    for (name, value) in headers {
        header_lines.push_str(&format!("{}: {}\r\n", name, value));
    }
    let body = body.unwrap_or("");
    let raw = format!(
        "{} {} HTTP/1.1\r\nHost: localhost:{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n{}Connection: close\r\n\r\n{}",
        method, path, port, body.len(), header_lines, body
    );
    std::io::Write::write_all(&mut stream, raw.as_bytes()).expect("failed to write");

    let mut response = String::new();
    let _ = stream.read_to_string(&mut response);

    let parts: Vec<&str> = response.splitn(2, "\r\n\r\n").collect();
    let status_line = parts.first().and_then(|h| h.lines().next()).unwrap_or("");
    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    let body = parts
        .get(1)
        .and_then(|b| serde_json::from_str(b).ok())
        .unwrap_or(serde_json::Value::Null);
    (status, body)
}

fn get(port: u16, path: &str, headers: &[(&str, &str)]) -> (u16, serde_json::Value) {
    request(port, "GET", path, headers, None)
}

fn post(
    port: u16,
    path: &str,
    headers: &[(&str, &str)],
    body: &str,
) -> (u16, serde_json::Value) {
    request(port, "POST", path, headers, Some(body))
}

/// Log in as the seeded admin and return a bearer Authorization value.
fn admin_bearer(port: u16) -> String {
    let (status, body) = post(
        port,
        "/auth/login",
        &[],
        r#"{"email":"admin@coldwatch.dev","password":"admin-password"}"#,
    );
    assert_eq!(status, 200, "admin login failed: {}", body);
    format!("Bearer {}", body["data"]["access_token"].as_str().unwrap())
}

/// Find the seeded device with the given serial via the API.
fn device_id_by_serial(port: u16, bearer: &str, serial: &str) -> i64 {
    let (status, body) = get(port, "/devices", &[("Authorization", bearer)]);
    assert_eq!(status, 200);
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|d| d["serial"] == serial)
        .and_then(|d| d["id"].as_i64())
        .expect("seeded device not found")
}

#[test]
fn health_needs_no_auth() {
    let server = start_server(&[]);
    let (status, body) = get(server.port, "/health", &[]);
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
}

#[test]
fn login_and_refresh_round_trip() {
    let server = start_server(&[]);

    let (status, body) = post(
        server.port,
        "/auth/login",
        &[],
        r#"{"email":"admin@coldwatch.dev","password":"admin-password"}"#,
    );
    assert_eq!(status, 200);
    assert_eq!(body["data"]["token_type"], "Bearer");
    let access = body["data"]["access_token"].as_str().unwrap().to_string();
    let refresh = body["data"]["refresh_token"].as_str().unwrap().to_string();

    // Refresh with the refresh token succeeds.
    let (status, body) = post(
        server.port,
        "/auth/refresh",
        &[],
        &format!(r#"{{"refresh_token":"{}"}}"#, refresh),
    );
    assert_eq!(status, 200);
    assert!(body["data"]["access_token"].is_string());

    // Refresh with the access token is rejected.
    let (status, body) = post(
        server.port,
        "/auth/refresh",
        &[],
        &format!(r#"{{"refresh_token":"{}"}}"#, access),
    );
    assert_eq!(status, 401);
    assert_eq!(body["error_code"], "UNAUTHORIZED");
}

#[test]
fn bad_credentials_are_unauthorized() {
    let server = start_server(&[]);
    let (status, body) = post(
        server.port,
        "/auth/login",
        &[],
        r#"{"email":"admin@coldwatch.dev","password":"wrong"}"#,
    );
    assert_eq!(status, 401);
    assert_eq!(body["success"], false);
    assert_eq!(body["error_code"], "UNAUTHORIZED");
}

#[test]
fn protected_routes_require_auth() {
    let server = start_server(&[]);

    let (status, body) = get(server.port, "/incidents", &[]);
    assert_eq!(status, 401);
    assert_eq!(body["error_code"], "UNAUTHORIZED");

    let (status, _) = get(server.port, "/incidents", &[("Authorization", "Bearer junk")]);
    assert_eq!(status, 401);

    let (status, body) = post(
        server.port,
        "/telemetry",
        &[("X-Device-Key", "not-a-real-key")],
        r#"{"device_id":1,"temperature":4.0}"#,
    );
    assert_eq!(status, 401);
    assert_eq!(body["error_code"], "UNAUTHORIZED");
}

#[test]
fn telemetry_flow_creates_an_incident_once() {
    let server = start_server(&[]);
    let bearer = admin_bearer(server.port);
    let device_id = device_id_by_serial(server.port, &bearer, "CHL-001");
    let key = ("X-Device-Key", "demo-key-chl-001");

    // In-band reading: recorded, no incident.
    let (status, body) = post(
        server.port,
        "/telemetry",
        &[key],
        &format!(r#"{{"device_id":{},"temperature":4.5}}"#, device_id),
    );
    assert_eq!(status, 201, "{}", body);
    assert_eq!(body["data"]["is_alert"], false);
    assert_eq!(body["message"], "telemetry recorded");

    // Out-of-band reading: incident created, device goes FAULT.
    let (status, body) = post(
        server.port,
        "/telemetry",
        &[key],
        &format!(r#"{{"device_id":{},"temperature":15.0}}"#, device_id),
    );
    assert_eq!(status, 201);
    assert_eq!(body["data"]["is_alert"], true);
    assert_eq!(body["message"], "temperature threshold exceeded, incident created");

    // A second alert folds into the existing OPEN incident.
    let (status, body) = post(
        server.port,
        "/telemetry",
        &[key],
        &format!(r#"{{"device_id":{},"temperature":20.0}}"#, device_id),
    );
    assert_eq!(status, 201);
    assert_eq!(
        body["message"],
        "temperature threshold exceeded, incident already open"
    );

    let (status, body) = get(
        server.port,
        &format!("/incidents?device_id={}", device_id),
        &[("Authorization", &bearer)],
    );
    assert_eq!(status, 200);
    let incidents = body["data"].as_array().unwrap();
    assert_eq!(incidents.len(), 1);
    assert_eq!(incidents[0]["status"], "OPEN");
    assert_eq!(incidents[0]["incident_type"], "HIGH_TEMPERATURE");

    let (status, body) = get(
        server.port,
        &format!("/devices/{}", device_id),
        &[("Authorization", &bearer)],
    );
    assert_eq!(status, 200);
    assert_eq!(body["data"]["status"], "FAULT");
}

#[test]
fn bearer_cannot_ingest_and_device_cannot_list() {
    let server = start_server(&[]);
    let bearer = admin_bearer(server.port);
    let device_id = device_id_by_serial(server.port, &bearer, "CHL-002");

    let (status, body) = post(
        server.port,
        "/telemetry",
        &[("Authorization", &bearer)],
        &format!(r#"{{"device_id":{},"temperature":4.0}}"#, device_id),
    );
    assert_eq!(status, 403);
    assert_eq!(body["error_code"], "FORBIDDEN");

    let (status, body) = get(
        server.port,
        "/incidents",
        &[("X-Device-Key", "demo-key-chl-002")],
    );
    assert_eq!(status, 403);
    assert_eq!(body["error_code"], "FORBIDDEN");
}

#[test]
fn rate_limit_rejects_and_persists_nothing() {
    let server = start_server(&["--rate-limit", "2"]);
    let bearer = admin_bearer(server.port);
    let device_id = device_id_by_serial(server.port, &bearer, "CHL-001");
    let key = ("X-Device-Key", "demo-key-chl-001");
    let body_json = format!(r#"{{"device_id":{},"temperature":4.0}}"#, device_id);

    for _ in 0..2 {
        let (status, _) = post(server.port, "/telemetry", &[key], &body_json);
        assert_eq!(status, 201);
    }
    let (status, body) = post(server.port, "/telemetry", &[key], &body_json);
    assert_eq!(status, 429);
    assert_eq!(body["error_code"], "RATE_LIMITED");

    let (status, body) = get(
        server.port,
        &format!("/devices/{}/telemetry", device_id),
        &[("Authorization", &bearer)],
    );
    assert_eq!(status, 200);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[test]
fn incident_lifecycle_over_http() {
    let server = start_server(&[]);
    let bearer = admin_bearer(server.port);
    let auth = ("Authorization", bearer.as_str());
    let device_id = device_id_by_serial(server.port, &bearer, "FRZ-001");

    // Manual create.
    let (status, body) = post(
        server.port,
        "/incidents",
        &[auth],
        &format!(
            r#"{{"device_id":{},"incident_type":"SENSOR_FAULT","description":"no data for 6h"}}"#,
            device_id
        ),
    );
    assert_eq!(status, 201, "{}", body);
    let incident_id = body["data"]["id"].as_i64().unwrap();

    // A second manual create for the same device conflicts.
    let (status, body) = post(
        server.port,
        "/incidents",
        &[auth],
        &format!(
            r#"{{"device_id":{},"incident_type":"OTHER","description":"duplicate"}}"#,
            device_id
        ),
    );
    assert_eq!(status, 409);
    assert_eq!(body["error_code"], "CONFLICT");

    // Assign a technician.
    let (_, body) = get(server.port, "/technicians", &[auth]);
    let technician_id = body["data"][0]["id"].as_i64().unwrap();
    let (status, body) = post(
        server.port,
        &format!("/incidents/{}/assign", incident_id),
        &[auth],
        &format!(
            r#"{{"technician_id":{},"notes":"check compressor"}}"#,
            technician_id
        ),
    );
    assert_eq!(status, 200);
    assert_eq!(body["data"]["status"], "ASSIGNED");
    assert_eq!(body["data"]["assignments"].as_array().unwrap().len(), 1);

    // Resolve, then verify RESOLVED is terminal.
    let (status, body) = request(
        server.port,
        "PUT",
        &format!("/incidents/{}/status", incident_id),
        &[auth],
        Some(r#"{"status":"RESOLVED"}"#),
    );
    assert_eq!(status, 200);
    assert_eq!(body["data"]["status"], "RESOLVED");
    assert!(body["data"]["resolved_at"].is_string());

    let (status, body) = request(
        server.port,
        "PUT",
        &format!("/incidents/{}/status", incident_id),
        &[auth],
        Some(r#"{"status":"OPEN"}"#),
    );
    assert_eq!(status, 400);
    assert_eq!(body["error_code"], "VALIDATION_ERROR");
}

#[test]
fn validation_errors_carry_a_field_map() {
    let server = start_server(&[]);
    let bearer = admin_bearer(server.port);
    let device_id = device_id_by_serial(server.port, &bearer, "HVC-001");

    let (status, body) = post(
        server.port,
        "/telemetry",
        &[("X-Device-Key", "demo-key-hvc-001")],
        &format!(
            r#"{{"device_id":{},"temperature":21.0,"recorded_at":"yesterday"}}"#,
            device_id
        ),
    );
    assert_eq!(status, 400);
    assert_eq!(body["error_code"], "VALIDATION_ERROR");
    assert!(body["data"]["recorded_at"].is_string());
}

#[test]
fn malformed_json_body_gets_the_error_envelope() {
    let server = start_server(&[]);
    let (status, body) = post(server.port, "/auth/login", &[], "{not json");
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
    assert_eq!(body["error_code"], "VALIDATION_ERROR");
    assert!(body["message"].is_string());
}

#[test]
fn store_lookup_and_alert_roster() {
    let server = start_server(&[]);
    let bearer = admin_bearer(server.port);
    let auth = ("Authorization", bearer.as_str());
    let device_id = device_id_by_serial(server.port, &bearer, "CHL-001");

    // Nothing alerting yet.
    let (status, body) = get(server.port, "/dashboard/alerts", &[auth]);
    assert_eq!(status, 200);
    assert!(body["data"].as_array().unwrap().is_empty());

    let (status, _) = post(
        server.port,
        "/telemetry",
        &[("X-Device-Key", "demo-key-chl-001")],
        &format!(r#"{{"device_id":{},"temperature":15.0}}"#, device_id),
    );
    assert_eq!(status, 201);

    let (status, body) = get(server.port, "/dashboard/alerts", &[auth]);
    assert_eq!(status, 200);
    let alerts = body["data"].as_array().unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0]["serial"], "CHL-001");
    assert_eq!(alerts[0]["status"], "FAULT");
    assert_eq!(alerts[0]["latest_reading"]["temperature"], 15.0);

    // Single-store lookup; unknown id is 404, not an empty body.
    let (_, body) = get(server.port, "/stores", &[auth]);
    let store_id = body["data"][0]["id"].as_i64().unwrap();
    let (status, body) = get(server.port, &format!("/stores/{}", store_id), &[auth]);
    assert_eq!(status, 200);
    assert!(body["data"]["code"].is_string());

    let (status, body) = get(server.port, "/stores/999999", &[auth]);
    assert_eq!(status, 404);
    assert_eq!(body["error_code"], "NOT_FOUND");
}

#[test]
fn dashboard_summarizes_counts() {
    let server = start_server(&[]);
    let bearer = admin_bearer(server.port);
    let device_id = device_id_by_serial(server.port, &bearer, "CHL-001");

    let (status, _) = post(
        server.port,
        "/telemetry",
        &[("X-Device-Key", "demo-key-chl-001")],
        &format!(r#"{{"device_id":{},"temperature":15.0}}"#, device_id),
    );
    assert_eq!(status, 201);

    let (status, body) = get(
        server.port,
        "/dashboard/summary",
        &[("Authorization", &bearer)],
    );
    assert_eq!(status, 200);
    assert_eq!(body["data"]["total_stores"], 2);
    assert_eq!(body["data"]["faulty_devices"], 1);
    assert_eq!(body["data"]["open_incidents"], 1);
    assert_eq!(body["data"]["alerts_last_hour"], 1);
}
