//! Inter-task communication between the HTTP server and the control loop.
//!
//! Uses `embassy-sync` bounded channels so the HTTP handlers never touch
//! core state directly.  The control loop drains commands at the top of
//! each tick and publishes a fresh [`StatusSnapshot`] after it.
//!
//! ```text
//! ┌──────────────┐  ApiRequest  ┌──────────────┐
//! │  HTTP Task   │────────────▶│ Control Loop │
//! │  (handlers)  │◀────────────│  (sync)      │
//! └──────────────┘   ApiReply   └──────────────┘
//!        ▲                             │
//!        └──────── STATUS mutex ───────┘
//! ```

use core::cell::RefCell;
use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

use crate::app::commands::{AppCommand, CommandReply};
use crate::app::status::StatusSnapshot;

/// Inbound command from an HTTP handler.
pub struct ApiRequest {
    /// Correlates the reply with the waiting handler.
    pub id: u32,
    pub cmd: AppCommand,
}

/// Outcome of one [`ApiRequest`].
pub struct ApiReply {
    pub id: u32,
    pub reply: CommandReply,
}

/// Channel depth for inbound commands.
const CMD_DEPTH: usize = 8;

/// Channel depth for replies.
const REPLY_DEPTH: usize = 8;

/// HTTP task → control loop.
pub static API_COMMANDS: Channel<CriticalSectionRawMutex, ApiRequest, CMD_DEPTH> = Channel::new();

/// Control loop → HTTP task.
pub static API_REPLIES: Channel<CriticalSectionRawMutex, ApiReply, REPLY_DEPTH> = Channel::new();

/// Latest snapshot published by the control loop.
static STATUS: Mutex<CriticalSectionRawMutex, RefCell<Option<StatusSnapshot>>> =
    Mutex::new(RefCell::new(None));

static NEXT_ID: AtomicU32 = AtomicU32::new(1);

/// The command queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFull;

/// Enqueue a command; returns the id to wait on.
pub fn submit(cmd: AppCommand) -> Result<u32, QueueFull> {
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    API_COMMANDS
        .try_send(ApiRequest { id, cmd })
        .map(|()| id)
        .map_err(|_| QueueFull)
}

/// Non-blocking check for the reply to `id`.  Replies to older requests
/// (whose handler gave up waiting) are discarded on the way.
pub fn take_reply(id: u32) -> Option<CommandReply> {
    while let Ok(r) = API_REPLIES.try_receive() {
        if r.id == id {
            return Some(r.reply);
        }
        if r.id > id {
            // A newer handler's reply; hand it back for them.
            if API_REPLIES.try_send(r).is_err() {
                warn!("API: reply queue full, dropped reply");
            }
            return None;
        }
    }
    None
}

/// Control-loop side: run every queued command through `handle`.
/// Returns how many were processed.
pub fn drain_commands(mut handle: impl FnMut(AppCommand) -> CommandReply) -> usize {
    let mut n = 0;
    while let Ok(req) = API_COMMANDS.try_receive() {
        let reply = handle(req.cmd);
        if API_REPLIES.try_send(ApiReply { id: req.id, reply }).is_err() {
            warn!("API: reply queue full, dropped reply {}", req.id);
        }
        n += 1;
    }
    n
}

pub fn publish_status(snapshot: StatusSnapshot) {
    STATUS.lock(|cell| *cell.borrow_mut() = Some(snapshot));
}

/// `None` until the control loop has published once.
pub fn latest_status() -> Option<StatusSnapshot> {
    STATUS.lock(|cell| *cell.borrow())
}
