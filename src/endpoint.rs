/// HTTP endpoint for the climate observations API
///
/// Endpoints (GET only):
/// - GET / - Human-readable list of routes
/// - GET /api/v1.0/precipitations - Trailing-year precipitation by date
/// - GET /api/v1.0/stations - All station codes
/// - GET /api/v1.0/tobs - Trailing-year temperatures of the most active station
/// - GET /api/v1.0/{start} - Tmin/Tavg/Tmax from start onwards
/// - GET /api/v1.0/{start}/{end} - Tmin/Tavg/Tmax between start and end inclusive
///
/// Routing is a pure function (`route`) so it can be exercised without a
/// socket; `serve` only moves requests onto worker threads and writes back
/// whatever `route` produced.

use serde::Serialize;
use thiserror::Error;
use threadpool::ThreadPool;
use tiny_http::{Header, Method, Request, Response, Server};
use tracing::{debug, error, info, warn};

use crate::query::{QueryError, QueryService};

pub const API_PREFIX: &str = "/api/v1.0";

/// Routes listed on the index page, in display order.
pub const AVAILABLE_ROUTES: &[&str] = &[
    "/api/v1.0/precipitations",
    "/api/v1.0/stations",
    "/api/v1.0/tobs",
    "/api/v1.0/<start>",
    "/api/v1.0/<start>/<end>",
];

#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("failed to start HTTP server on {addr}: {message}")]
    Bind { addr: String, message: String },
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// A fully rendered response, independent of the HTTP library.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl ApiResponse {
    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_string_pretty(value) {
            Ok(body) => Self { status, content_type: "application/json", body },
            Err(e) => {
                error!(error = %e, "failed to serialize response");
                Self::error(500, "failed to serialize response")
            }
        }
    }

    fn error(status: u16, message: &str) -> Self {
        let body = serde_json::json!({ "error": message }).to_string();
        Self { status, content_type: "application/json", body }
    }

    fn html(body: String) -> Self {
        Self { status: 200, content_type: "text/html; charset=utf-8", body }
    }

    #[cfg(test)]
    fn json_body(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_str(&self.body)
    }
}

/// Renders a query result, mapping bad input to 400 and everything else to 500.
fn from_query<T: Serialize>(result: Result<T, QueryError>) -> ApiResponse {
    match result {
        Ok(value) => ApiResponse::json(200, &value),
        Err(e) if e.is_client_error() => {
            debug!(error = %e, "rejected request");
            ApiResponse::error(400, &e.to_string())
        }
        Err(e) => {
            error!(error = %e, "query failed");
            ApiResponse::error(500, &e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// Maps one request to its response.
pub fn route(method: &Method, url: &str, service: &QueryService) -> ApiResponse {
    if *method != Method::Get {
        return ApiResponse::error(405, "method not allowed; only GET is supported");
    }

    // Query strings carry nothing for this API.
    let path = url.split(['?', '#']).next().unwrap_or("");
    let path = if path.len() > 1 { path.trim_end_matches('/') } else { path };

    if path.is_empty() || path == "/" {
        return handle_index();
    }

    let Some(rest) = path.strip_prefix(API_PREFIX).and_then(|r| r.strip_prefix('/')) else {
        return not_found();
    };

    let segments: Vec<String> = match rest.split('/').map(decode_segment).collect::<Option<_>>() {
        Some(segments) => segments,
        None => return ApiResponse::error(400, "path segment is not valid UTF-8"),
    };
    if segments.iter().any(String::is_empty) {
        return not_found();
    }

    match segments.as_slice() {
        [one] if one == "precipitations" => from_query(service.precipitations()),
        [one] if one == "stations" => from_query(service.stations()),
        [one] if one == "tobs" => from_query(service.tobs()),
        [start] => from_query(service.range_from(start)),
        [start, end] => from_query(service.range_between(start, end)),
        _ => not_found(),
    }
}

fn decode_segment(raw: &str) -> Option<String> {
    urlencoding::decode(raw).ok().map(|s| s.into_owned())
}

/// Handle / endpoint
fn handle_index() -> ApiResponse {
    let mut body = String::from("Available Routes:<br/>");
    for route in AVAILABLE_ROUTES {
        body.push_str(route);
        body.push_str("<br/>");
    }
    ApiResponse::html(body)
}

fn not_found() -> ApiResponse {
    ApiResponse::json(
        404,
        &serde_json::json!({
            "error": "Not found",
            "available_endpoints": AVAILABLE_ROUTES,
        }),
    )
}

// ---------------------------------------------------------------------------
// HTTP Server
// ---------------------------------------------------------------------------

/// Binds the listening socket. Use port 0 to let the OS pick one.
pub fn bind(addr: &str) -> Result<Server, EndpointError> {
    Server::http(addr).map_err(|e| EndpointError::Bind {
        addr: addr.to_string(),
        message: e.to_string(),
    })
}

/// Serves requests until the server shuts down, `workers` at a time.
pub fn serve(server: Server, service: QueryService, workers: usize) {
    let pool = ThreadPool::new(workers.max(1));

    for request in server.incoming_requests() {
        let service = service.clone();
        pool.execute(move || handle_request(request, &service));
    }

    pool.join();
}

/// Binds `addr` and serves until the process exits.
pub fn start_endpoint_server(addr: &str, service: QueryService, workers: usize) -> Result<(), EndpointError> {
    let server = bind(addr)?;
    info!(%addr, workers, "HTTP endpoint listening");
    serve(server, service, workers);
    Ok(())
}

fn handle_request(request: Request, service: &QueryService) {
    let api = route(request.method(), request.url(), service);
    debug!(method = %request.method(), url = %request.url(), status = api.status, "handled request");

    if let Err(e) = request.respond(into_http(api)) {
        warn!(error = %e, "failed to send response");
    }
}

fn into_http(api: ApiResponse) -> Response<std::io::Cursor<Vec<u8>>> {
    let mut response = Response::from_data(api.body.into_bytes()).with_status_code(api.status);
    if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], api.content_type.as_bytes()) {
        response.add_header(header);
    }
    response
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
