//! Line-oriented JSON channel loop: one `[id, request]` per input line, one
//! `[id, result]` per output line.

use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::runner::ReviewCli;
use crate::session::{Request, Session};

/// Serve requests until the reader hits EOF.
pub async fn serve<C, R, W>(session: &mut Session<C>, reader: R, mut writer: W) -> Result<()>
where
    C: ReviewCli,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!("serve loop started");
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(reply) = handle_line(session, &line).await {
            writer.write_all(reply.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
    }

    info!("stdin closed, serve loop exiting");
    Ok(())
}

/// Answer one input line. Returns `None` when the line carries no usable id.
pub async fn handle_line<C: ReviewCli>(session: &mut Session<C>, line: &str) -> Option<String> {
    let (id, request) = match parse_message(line) {
        Ok(message) => message,
        Err((id, e)) => {
            warn!(error = %e, "malformed request");
            return id.map(|id| error_reply(id, &e));
        }
    };

    debug!(%id, method = %request.method, "request");
    let reply = match session.dispatch(request).await {
        Ok(result) => json!([id, result]),
        Err(e) => {
            warn!(%id, error = %e, "request failed");
            return Some(error_reply(id, &e));
        }
    };
    Some(reply.to_string())
}

fn error_reply(id: Value, e: &Error) -> String {
    json!([id, { "error": e.to_string() }]).to_string()
}

/// Split a channel message into its id and request. On failure the id is
/// still handed back when one could be read.
fn parse_message(line: &str) -> std::result::Result<(Value, Request), (Option<Value>, Error)> {
    let value: Value = serde_json::from_str(line).map_err(|e| (None, Error::from(e)))?;

    let Value::Array(mut parts) = value else {
        return Err((None, protocol("expected [id, request]")));
    };
    if parts.len() != 2 || !parts[0].is_number() {
        let id = parts.first().filter(|v| v.is_number()).cloned();
        return Err((id, protocol("expected [id, request]")));
    }

    let body = parts.pop().unwrap_or_default();
    let id = parts.pop().unwrap_or_default();
    match serde_json::from_value::<Request>(body) {
        Ok(request) => Ok((id, request)),
        Err(e) => Err((Some(id), protocol(&format!("invalid request: {e}")))),
    }
}

fn protocol(msg: &str) -> Error {
    Error::Protocol(msg.to_string())
}
