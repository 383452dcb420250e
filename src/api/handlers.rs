//! Request dispatch and JSON rendering for the dashboard API.
//!
//! Platform-independent: the HTTP server in `main` only moves bytes in and
//! out of [`handle_request`].

use log::{debug, warn};
use serde::Serialize;

use super::channels::{self, QueueFull};
use super::form::parse_settings_form;
use crate::app::commands::{AppCommand, CommandReply};
use crate::app::status::StatusSnapshot;

/// How long a handler waits for the control loop to answer.
pub const REPLY_TIMEOUT_MS: u32 = 2_000;
/// Poll period while waiting.
pub const REPLY_POLL_MS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Every path the server registers.
pub const ROUTES: [(Method, &str); 9] = [
    (Method::Get, "/api/status"),
    (Method::Post, "/api/update"),
    (Method::Post, "/api/drop"),
    (Method::Post, "/api/peltier/toggle"),
    (Method::Post, "/api/test/peltier"),
    (Method::Post, "/api/test/led"),
    (Method::Post, "/api/test/audio"),
    (Method::Post, "/api/system/toggle"),
    (Method::Post, "/api/reset"),
];

#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Status,
    Command(AppCommand),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyBody<'a> {
    status: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    running: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    drop_count: Option<u32>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

fn json<T: Serialize>(status: u16, value: &T) -> ApiResponse {
    match serde_json::to_string(value) {
        Ok(body) => ApiResponse { status, body },
        Err(_) => ApiResponse {
            status: 500,
            body: String::from(r#"{"error":"serialization failed"}"#),
        },
    }
}

pub fn error_response(status: u16, error: &str) -> ApiResponse {
    json(status, &ErrorBody { error })
}

pub fn not_found() -> ApiResponse {
    error_response(404, "Not found")
}

pub fn busy() -> ApiResponse {
    error_response(503, "Command queue full")
}

/// `{status,message[,running][,dropCount]}`; a refused command is a 400.
pub fn reply_response(reply: &CommandReply) -> ApiResponse {
    let body = ReplyBody {
        status: if reply.ok { "ok" } else { "error" },
        message: reply.message,
        running: reply.running,
        drop_count: reply.drop_count,
    };
    json(if reply.ok { 200 } else { 400 }, &body)
}

/// Snapshot JSON, or 503 before the loop has published one.
pub fn status_response(snapshot: Option<&StatusSnapshot>) -> ApiResponse {
    match snapshot {
        Some(s) => json(200, s),
        None => error_response(503, "Status not ready"),
    }
}

/// Map a request onto a route.  Errors are complete responses.
pub fn parse_request(method: Method, path: &str, body: &str) -> Result<Route, ApiResponse> {
    let path = path.split('?').next().unwrap_or(path);
    let cmd = match (method, path) {
        (Method::Get, "/api/status") => return Ok(Route::Status),
        (Method::Post, "/api/update") => match parse_settings_form(body) {
            Ok(update) => AppCommand::UpdateSettings(update),
            Err(e) => {
                let msg = e.to_string();
                return Err(error_response(400, &msg));
            }
        },
        (Method::Post, "/api/drop") => AppCommand::TriggerDrop,
        (Method::Post, "/api/peltier/toggle") => AppCommand::ToggleCooling,
        (Method::Post, "/api/test/peltier") => AppCommand::ForceCooling,
        (Method::Post, "/api/test/led") => AppCommand::TestLight,
        (Method::Post, "/api/test/audio") => AppCommand::TestAudio,
        (Method::Post, "/api/system/toggle") => AppCommand::TogglePause,
        (Method::Post, "/api/reset") => AppCommand::ResetSettings,
        _ => return Err(not_found()),
    };
    Ok(Route::Command(cmd))
}

/// Full request cycle: route, enqueue, wait for the loop's reply.
/// `sleep_ms` is called between reply polls.
pub fn handle_request(
    method: Method,
    path: &str,
    body: &str,
    mut sleep_ms: impl FnMut(u32),
) -> ApiResponse {
    debug!("API: {:?} {}", method, path);
    let cmd = match parse_request(method, path, body) {
        Ok(Route::Status) => return status_response(channels::latest_status().as_ref()),
        Ok(Route::Command(cmd)) => cmd,
        Err(resp) => return resp,
    };

    let id = match channels::submit(cmd) {
        Ok(id) => id,
        Err(QueueFull) => {
            warn!("API: command queue full");
            return busy();
        }
    };

    let mut waited = 0;
    loop {
        if let Some(reply) = channels::take_reply(id) {
            return reply_response(&reply);
        }
        if waited >= REPLY_TIMEOUT_MS {
            warn!("API: no reply for request {}", id);
            return error_response(504, "Control loop timeout");
        }
        sleep_ms(REPLY_POLL_MS);
        waited += REPLY_POLL_MS;
    }
}
