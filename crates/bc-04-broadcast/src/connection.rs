//! Per-connection task.
//!
//! 1. Register (`Connecting`) and send the open packet (`CatchingUp`)
//! 2. Send the current blocks snapshot and the pending transactions
//! 3. Go `Live`: the held-back broadcasts are flushed, then new ones follow
//! 4. Answer keep-alive pings until the client leaves, goes idle, or the
//!    server shuts down, then close
//!
//! Between steps 1 and 3 broadcasts for this connection are held in the
//! registry, so catch-up frames always precede them.

use crate::domain::{
    event_frame, open_packet, ClientPacket, ConnectionId, ConnectionState, Frame, ServerConfig,
};
use crate::ports::CatchUpSource;
use crate::dispatcher::stop_requested;
use crate::registry::SubscriberRegistry;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Everything a connection task needs, cloned per connection.
#[derive(Clone)]
pub struct ConnectionContext {
    pub registry: Arc<SubscriberRegistry>,
    pub catch_up: Arc<dyn CatchUpSource>,
    pub config: Arc<ServerConfig>,
    pub shutdown: watch::Receiver<bool>,
}

/// Why a connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CloseReason {
    ClientClosed,
    Idle,
    SendFailed,
    Evicted,
    Shutdown,
}

type Sink = SplitSink<WebSocket, Message>;
type Source = SplitStream<WebSocket>;

pub async fn serve_connection(socket: WebSocket, ctx: ConnectionContext, peer: Option<SocketAddr>) {
    let (id, outbound) = ctx.registry.register();
    info!(connection_id = %id, peer = ?peer, "Socket opened");

    let (mut sink, source) = socket.split();
    let reason = match catch_up(&mut sink, id, &ctx).await {
        Ok(()) => run_live(&mut sink, source, outbound, id, &ctx).await,
        Err(reason) => reason,
    };

    ctx.registry.transition(&id, ConnectionState::Closed).ok();
    let _ = sink.close().await;
    info!(connection_id = %id, reason = ?reason, "Socket closed");
}

async fn send(sink: &mut Sink, frame: &str) -> Result<(), CloseReason> {
    sink.send(Message::Text(frame.to_string()))
        .await
        .map_err(|_| CloseReason::SendFailed)
}

async fn catch_up(sink: &mut Sink, id: ConnectionId, ctx: &ConnectionContext) -> Result<(), CloseReason> {
    let open = open_packet(&id, ctx.config.ping_interval, ctx.config.idle_timeout)
        .map_err(|_| CloseReason::SendFailed)?;
    send(sink, &open).await?;
    ctx.registry
        .transition(&id, ConnectionState::CatchingUp)
        .map_err(|_| CloseReason::Evicted)?;

    let snapshot = ctx.catch_up.blocks();
    if !snapshot.is_empty() {
        match event_frame("blocks", snapshot.as_ref()) {
            Ok(frame) => send(sink, &frame).await?,
            Err(e) => warn!(connection_id = %id, error = %e, "Skipping blocks catch-up"),
        }
    }

    let pending = ctx.catch_up.mempool().await;
    for summary in &pending {
        match event_frame("tx", summary.as_ref()) {
            Ok(frame) => send(sink, &frame).await?,
            Err(e) => warn!(connection_id = %id, error = %e, "Skipping tx catch-up"),
        }
    }

    ctx.registry
        .transition(&id, ConnectionState::Live)
        .map_err(|_| CloseReason::Evicted)?;
    debug!(
        connection_id = %id,
        blocks = snapshot.len(),
        transactions = pending.len(),
        "Catch-up complete"
    );
    Ok(())
}

async fn run_live(
    sink: &mut Sink,
    mut source: Source,
    mut outbound: mpsc::Receiver<Frame>,
    id: ConnectionId,
    ctx: &ConnectionContext,
) -> CloseReason {
    let idle_timeout = ctx.config.idle_timeout;
    let idle = tokio::time::sleep(idle_timeout);
    tokio::pin!(idle);
    let mut shutdown = ctx.shutdown.clone();

    loop {
        tokio::select! {
            frame = outbound.recv() => {
                let Some(frame) = frame else { return CloseReason::Evicted };
                if let Err(reason) = send(sink, &frame).await {
                    return reason;
                }
            }
            incoming = source.next() => {
                let text = match incoming {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | None => return CloseReason::ClientClosed,
                    Some(Ok(_)) => {
                        idle.as_mut().reset(Instant::now() + idle_timeout);
                        continue;
                    }
                    Some(Err(e)) => {
                        debug!(connection_id = %id, error = %e, "Socket read failed");
                        return CloseReason::ClientClosed;
                    }
                };
                idle.as_mut().reset(Instant::now() + idle_timeout);

                let packet = ClientPacket::parse(&text);
                if packet == ClientPacket::Close {
                    return CloseReason::ClientClosed;
                }
                if let Some(reply) = packet.reply() {
                    if let Err(reason) = send(sink, &reply).await {
                        return reason;
                    }
                }
            }
            () = &mut idle => return CloseReason::Idle,
            () = stop_requested(&mut shutdown) => return CloseReason::Shutdown,
        }
    }
}
