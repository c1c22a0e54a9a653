//! Per-connection session: bridges one socket's lines into the shared game

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::app::AppState;
use crate::game::{CommandError, SessionId};
use crate::lobby::Inbox;
use crate::net::protocol::ServerMsg;
use crate::util::rate_limit::SessionRateLimiter;

/// Run a session to completion. Returns once the client quit or the
/// stream closed; the player is always released from the world.
pub async fn handle_connection<S>(stream: S, session_id: SessionId, state: AppState)
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (reader, mut writer) = tokio::io::split(stream);

    let inbox = match state.game.connect(session_id) {
        Ok(inbox) => inbox,
        Err(e) => {
            let line = ServerMsg::fail(e).to_line();
            if let Err(e) = writer.write_all(line.as_bytes()).await {
                debug!(session_id = %session_id, error = %e, "Failed to send join rejection");
            }
            let _ = writer.shutdown().await;
            return;
        }
    };

    info!(
        session_id = %session_id,
        players = state.game.player_count(),
        "Session started"
    );

    // Writer task: outbox -> socket, ends when the outbox is dropped
    let writer_handle = tokio::spawn(write_loop(session_id, writer, inbox));

    read_loop(session_id, reader, &state).await;

    // Implicit QUIT for dropped connections; no-op after an explicit one
    state.game.disconnect(session_id);

    if let Err(e) = writer_handle.await {
        warn!(session_id = %session_id, error = %e, "Writer task failed");
    }

    info!(
        session_id = %session_id,
        players = state.game.player_count(),
        "Session closed"
    );
}

async fn read_loop<R>(session_id: SessionId, reader: R, state: &AppState)
where
    R: AsyncRead + Unpin,
{
    let limiter = SessionRateLimiter::new(state.config.command_rate_limit);
    let mut lines = BufReader::new(reader).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if !limiter.check_command() {
                    warn!(session_id = %session_id, "Rate limited command");
                    state.game.reject(session_id, CommandError::RateLimited);
                    continue;
                }

                debug!(session_id = %session_id, command = %line.trim(), "Command received");
                if !state.game.submit(session_id, &line) {
                    info!(session_id = %session_id, "Player quit");
                    break;
                }
            }
            Ok(None) => {
                debug!(session_id = %session_id, "Client closed connection");
                break;
            }
            Err(e) => {
                debug!(session_id = %session_id, error = %e, "Read failed");
                break;
            }
        }
    }
}

async fn write_loop<W>(session_id: SessionId, mut writer: W, mut inbox: Inbox)
where
    W: AsyncWrite + Unpin,
{
    while let Some(msg) = inbox.recv().await {
        if let Err(e) = writer.write_all(msg.to_line().as_bytes()).await {
            debug!(session_id = %session_id, error = %e, "Socket write failed");
            return;
        }
    }
    let _ = writer.shutdown().await;
}
