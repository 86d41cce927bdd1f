//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method check, resolution,
//! response building, and access logging.

use crate::config::AppState;
use crate::handler::Resolution;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, SERVER, USER_AGENT};
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    // the daemon never reads request bodies
    let (parts, body) = req.into_parts();
    drop(body);
    let path = parts.uri.path();

    let mut response = if parts.method == Method::GET {
        respond(&state, path).await
    } else {
        logger::log_warning(&format!("Method not allowed: {}", parts.method));
        http::build_405_response()
    };

    if let Ok(value) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(SERVER, value);
    }

    if state.access_log_enabled() {
        let mut entry =
            AccessLogEntry::new(peer_addr.to_string(), parts.method.to_string(), path.to_string());
        entry.http_version = http_version(parts.version).to_string();
        entry.status = response.status().as_u16();
        entry.body_bytes = body_len(&response);
        entry.user_agent = parts
            .headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Resolve `path` and turn the outcome into a response
async fn respond(state: &AppState, path: &str) -> Response<Full<Bytes>> {
    match state.resolver.resolve(path).await {
        Ok(Resolution::File { target, body }) => {
            logger::log_debug(&format!("Serving {} ({} bytes)", target.display(), body.len()));
            http::build_file_response(body, &state.config.http.content_type)
        }
        Ok(Resolution::Empty) => http::build_empty_response(),
        Err(err) => {
            if err.is_suspicious() {
                logger::log_warning(&format!("Refused path outside package: {err:?}"));
            } else {
                logger::log_request_failed(path, &format!("{err} ({})", err.kind()));
            }
            if let Some(target) = err.target() {
                logger::log_debug(&format!("Resolved target: {}", target.display()));
            }
            http::build_error_response(err.status(), &err.to_string())
        }
    }
}

fn body_len(response: &Response<Full<Bytes>>) -> usize {
    response
        .headers()
        .get("Content-Length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

fn http_version(version: hyper::Version) -> &'static str {
    match version {
        hyper::Version::HTTP_09 => "0.9",
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        hyper::Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
