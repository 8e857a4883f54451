// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire protocol between `sw` and `swd`.
//!
//! Every message is a 4-byte big-endian length followed by a JSON body.
//! A connection carries one request and one response, except `Watch`, which
//! keeps the connection open and streams `Response::Event` until the client
//! hangs up.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sw_core::{Event, Site, SiteId};
use sw_engine::Scheduled;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Bumped whenever a request or response changes shape
pub const PROTOCOL_VERSION: &str = "1";

/// Default read/write timeout for a single message
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Largest body accepted from the wire
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Requests from the CLI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    Ping,
    Hello { version: String },
    Status,
    Shutdown,
    Query { query: Query },
    /// Store a new site and check it right away
    AddSite { site: Site },
    /// Replace a saved site's configuration and re-check it
    UpdateSite { site: Site },
    RemoveSite { id: SiteId },
    CheckNow { id: SiteId },
    SetDisabled { id: SiteId, disabled: bool },
    /// Stream status updates until the connection closes
    Watch,
}

/// Read-only lookups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Query {
    ListSites { tag: Option<String> },
    GetSite { id: SiteId },
}

/// Responses from the daemon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    Ok,
    Pong,
    Hello {
        version: String,
    },
    ShuttingDown,
    Status {
        uptime_secs: u64,
        sites: usize,
        pending_jobs: usize,
        watchers: usize,
    },
    Sites {
        sites: Vec<Site>,
    },
    Site {
        site: Option<Box<Site>>,
    },
    Saved {
        site: Box<Site>,
        scheduled: ScheduleOutcome,
    },
    Removed {
        id: SiteId,
    },
    Scheduled {
        scheduled: ScheduleOutcome,
    },
    /// First response on a `Watch` connection
    Watching,
    Event {
        event: Event,
    },
    Error {
        message: String,
    },
}

/// What happened to a scheduling request, as reported to the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScheduleOutcome {
    Submitted { delay_ms: u64 },
    Skipped,
    Rejected,
}

impl From<Scheduled> for ScheduleOutcome {
    fn from(scheduled: Scheduled) -> Self {
        match scheduled {
            Scheduled::Submitted { delay } => ScheduleOutcome::Submitted {
                delay_ms: delay.as_millis() as u64,
            },
            Scheduled::Skipped => ScheduleOutcome::Skipped,
            Scheduled::Rejected => ScheduleOutcome::Rejected,
        }
    }
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Timed out")]
    Timeout,

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Message of {size} bytes exceeds limit of {max} bytes")]
    MessageTooLarge { size: usize, max: usize },
}

/// Serialize to a JSON body (no length prefix)
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, ProtocolError> {
    Ok(serde_json::to_vec(value)?)
}

/// Deserialize a JSON body
pub fn decode<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T, ProtocolError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Read one length-prefixed message
pub async fn read_message<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, ProtocolError> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(ProtocolError::ConnectionClosed)
        }
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: len,
            max: MAX_MESSAGE_SIZE,
        });
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(body)
}

/// Write one length-prefixed message
pub async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    data: &[u8],
) -> Result<(), ProtocolError> {
    if data.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: data.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }
    writer.write_all(&(data.len() as u32).to_be_bytes()).await?;
    writer.write_all(data).await?;
    writer.flush().await?;
    Ok(())
}

pub async fn read_request<R: AsyncRead + Unpin>(
    reader: &mut R,
    timeout: Duration,
) -> Result<Request, ProtocolError> {
    let bytes = tokio::time::timeout(timeout, read_message(reader))
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    decode(&bytes)
}

pub async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &Response,
    timeout: Duration,
) -> Result<(), ProtocolError> {
    let data = encode(response)?;
    tokio::time::timeout(timeout, write_message(writer, &data))
        .await
        .map_err(|_| ProtocolError::Timeout)?
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
