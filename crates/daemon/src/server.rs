// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket server and connection handling.

use sw_core::Site;
use sw_daemon::protocol::{
    self, Query, Request, Response, DEFAULT_TIMEOUT, PROTOCOL_VERSION,
};
use sw_engine::EngineError;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, error, info};

use crate::lifecycle::ServerContext;

/// Handle a single client connection
pub async fn handle_connection<S>(ctx: ServerContext, stream: S) -> Result<(), ServerError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (mut reader, mut writer) = tokio::io::split(stream);

    let request = match protocol::read_request(&mut reader, DEFAULT_TIMEOUT).await {
        Ok(req) => req,
        Err(protocol::ProtocolError::Timeout) => {
            error!("Request read timeout");
            return Err(ServerError::Timeout);
        }
        Err(protocol::ProtocolError::ConnectionClosed) => {
            debug!("Client disconnected before sending request");
            return Ok(());
        }
        Err(e) => {
            error!("Failed to read request: {}", e);
            return Err(ServerError::Protocol(e));
        }
    };

    debug!("Received request: {:?}", request);

    if request == Request::Watch {
        return watch(ctx, reader, writer).await;
    }

    let response = handle_request(&ctx, request).await;

    debug!("Sending response: {:?}", response);

    protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT)
        .await
        .map_err(ServerError::Protocol)?;

    Ok(())
}

/// Handle a single request and return a response
async fn handle_request(ctx: &ServerContext, request: Request) -> Response {
    let manager = &ctx.manager;
    match request {
        Request::Ping => Response::Pong,

        Request::Hello { version: _ } => Response::Hello {
            version: PROTOCOL_VERSION.to_string(),
        },

        Request::Shutdown => {
            ctx.shutdown.notify_one();
            Response::ShuttingDown
        }

        Request::Status => match manager.list_sites(None).await {
            Ok(sites) => Response::Status {
                uptime_secs: ctx.start_time.elapsed().as_secs(),
                sites: sites.len(),
                pending_jobs: manager.jobs().inner().pending_count(),
                watchers: manager.events().subscriber_count(),
            },
            Err(e) => error_response(e),
        },

        Request::Query { query } => handle_query(ctx, query).await,

        Request::AddSite { site } => match manager.add_site(site).await {
            Ok((site, scheduled)) => saved(site, scheduled),
            Err(e) => error_response(e),
        },

        Request::UpdateSite { site } => match manager.update_site(site).await {
            Ok((site, scheduled)) => saved(site, scheduled),
            Err(e) => error_response(e),
        },

        Request::RemoveSite { id } => match manager.remove_site(id).await {
            Ok(site) => Response::Removed { id: site.id },
            Err(e) => error_response(e),
        },

        Request::CheckNow { id } => match manager.check_now(id).await {
            Ok(scheduled) => Response::Scheduled {
                scheduled: scheduled.into(),
            },
            Err(e) => error_response(e),
        },

        Request::SetDisabled { id, disabled } => match manager.set_disabled(id, disabled).await {
            Ok(site) => Response::Site {
                site: Some(Box::new(site)),
            },
            Err(e) => error_response(e),
        },

        // Routed to `watch` before we get here
        Request::Watch => Response::Error {
            message: "watch must be the only request on its connection".to_string(),
        },
    }
}

async fn handle_query(ctx: &ServerContext, query: Query) -> Response {
    match query {
        Query::ListSites { tag } => match ctx.manager.list_sites(tag).await {
            Ok(sites) => Response::Sites { sites },
            Err(e) => error_response(e),
        },
        Query::GetSite { id } => match ctx.manager.get_site(id).await {
            Ok(site) => Response::Site {
                site: site.map(Box::new),
            },
            Err(e) => error_response(e),
        },
    }
}

/// Stream events until the client hangs up.
///
/// The connection counts as the app being in the foreground, so failure
/// notifications are held back while it stays open.
async fn watch<R, W>(ctx: ServerContext, mut reader: R, mut writer: W) -> Result<(), ServerError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let _foreground = ctx.gate.attach();
    let events = ctx.manager.events().clone();
    let (subscriber, mut rx) = events.subscribe();
    info!(subscriber, "watch client attached");

    let result = async {
        protocol::write_response(&mut writer, &Response::Watching, DEFAULT_TIMEOUT).await?;
        loop {
            tokio::select! {
                event = rx.recv() => {
                    let Some(event) = event else { break };
                    protocol::write_response(&mut writer, &Response::Event { event }, DEFAULT_TIMEOUT)
                        .await?;
                }
                // Clients never send after `Watch`; any read result means they left
                _ = protocol::read_message(&mut reader) => break,
            }
        }
        Ok::<(), protocol::ProtocolError>(())
    }
    .await;

    events.unsubscribe(subscriber);
    info!(subscriber, "watch client detached");
    result.map_err(ServerError::Protocol)
}

fn saved(site: Site, scheduled: sw_engine::Scheduled) -> Response {
    Response::Saved {
        site: Box::new(site),
        scheduled: scheduled.into(),
    }
}

fn error_response(e: EngineError) -> Response {
    Response::Error {
        message: e.to_string(),
    }
}

/// Server errors
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),

    #[error("Request timeout")]
    Timeout,
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
