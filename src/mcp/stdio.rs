//! Stdio transport: newline-delimited JSON-RPC on one pipe.
//!
//! The process lifetime is the session lifetime, so there is no registry
//! here. Each line is dispatched on its own task; responses are funneled
//! through a single writer so frames never interleave.

use std::io;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::dispatcher::Dispatcher;
use crate::rpc::{RpcResponse, parse_request};
use crate::search::SearchBackend;

/// Serve JSON-RPC over `reader`/`writer` until `reader` hits EOF.
///
/// Dispatches still in flight at EOF are allowed to finish and their
/// responses are written before this returns.
pub async fn serve_stdio<B, R, W>(
    dispatcher: Arc<Dispatcher<B>>,
    reader: R,
    mut writer: W,
) -> io::Result<()>
where
    B: SearchBackend + 'static,
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!("MCP server running on stdio");

    let (tx, mut rx) = mpsc::unbounded_channel::<RpcResponse>();

    let read_loop = async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }

            // Raw bytes: invalid UTF-8 becomes a parse error response.
            let line = buf.trim_ascii();
            if line.is_empty() {
                continue;
            }
            debug!("Received: {}", String::from_utf8_lossy(line));

            match parse_request(line) {
                Ok(request) => {
                    let dispatcher = Arc::clone(&dispatcher);
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        if let Some(response) = dispatcher.handle(request).await {
                            let _ = tx.send(response);
                        }
                    });
                }
                Err(response) => {
                    warn!("Failed to parse message");
                    let _ = tx.send(response);
                }
            }
        }

        info!("stdin closed, draining in-flight requests");
        Ok::<(), io::Error>(())
    };

    let write_loop = async move {
        while let Some(response) = rx.recv().await {
            let mut frame = serde_json::to_vec(&response).map_err(io::Error::other)?;
            frame.push(b'\n');
            writer.write_all(&frame).await?;
            writer.flush().await?;
        }
        Ok::<(), io::Error>(())
    };

    let (read, write) = tokio::join!(read_loop, write_loop);
    read?;
    write
}
