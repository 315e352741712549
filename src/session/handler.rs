//! Control connection handler
//!
//! Greets the client, then reads one line at a time and handles it to
//! completion before reading the next, so replies go out in request order.
//! A command still running when the client hangs up is dropped along with
//! its passive channel.

use log::{debug, error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::protocol::responses::COMMAND_TOO_LONG;
use crate::protocol::{handle_command, parse_command};
use crate::server::{ServerContext, ServerEvent};
use crate::session::Session;

/// Outcome of reading one control line
#[derive(Debug, PartialEq, Eq)]
enum ControlLine {
    Line,
    TooLong,
    Closed,
}

/// Run the session of one accepted control connection until the client
/// disconnects.
pub async fn handle_session(
    stream: TcpStream,
    client_addr: SocketAddr,
    context: Arc<ServerContext>,
) -> Result<(), std::io::Error> {
    let local_addr = stream.local_addr()?;
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    write_half
        .write_all(context.config.greeting().as_bytes())
        .await?;
    write_half.flush().await?;

    let mut session = Session::new(client_addr, local_addr, context.root.clone());
    let mut buffer = Vec::new();

    loop {
        buffer.clear();
        let line = match read_control_line(
            &mut reader,
            &mut buffer,
            context.config.max_command_length,
        )
        .await
        {
            Ok(line) => line,
            Err(e) => {
                error!("Error reading from client {}: {}", client_addr, e);
                break;
            }
        };

        match line {
            ControlLine::Closed => {
                info!("Client {} disconnected", client_addr);
                break;
            }
            ControlLine::TooLong => {
                warn!("Client {} sent an oversized command", client_addr);
                write_half.write_all(COMMAND_TOO_LONG.as_bytes()).await?;
                continue;
            }
            ControlLine::Line => {}
        }

        session.touch();
        let request = String::from_utf8_lossy(&buffer).into_owned();
        info!("Received from {}: [{}]", client_addr, request.trim_end());
        context.publish(ServerEvent::CommandArrived {
            peer: client_addr,
            request: request.clone(),
        });

        let command = parse_command(&request);
        let reply = tokio::select! {
            reply = handle_command(&context, &mut session, &command, &mut write_half) => reply,
            _ = wait_for_close(&mut reader) => {
                // Dropping the handler closes its data channel and file stream.
                info!(
                    "Client {} disconnected during {}, transfer cancelled",
                    client_addr, command.verb
                );
                break;
            }
        };

        debug!("Sending response to client {}: {}", client_addr, reply.trim_end());
        write_half.write_all(reply.as_bytes()).await?;
        write_half.flush().await?;
    }

    log_session_end(&session);
    Ok(())
}

fn log_session_end(session: &Session) {
    let idle = session
        .last_request_at()
        .map(|at| at.elapsed())
        .unwrap_or_default();
    info!(
        "Session of {} ended after {:?} ({:?} idle)",
        session.peer_addr(),
        session.accepted_at().elapsed(),
        idle
    );
    if session.is_anonymous() {
        info!(
            "Anonymous user {} left password {:?}",
            session.peer_addr(),
            session.anonymous_password().unwrap_or_default()
        );
    }
    if session.has_data_channel() {
        debug!("Closing unused passive channel of {}", session.peer_addr());
    }
}

/// Resolves once the client has closed the control connection.
///
/// Input that is already buffered means the client is still talking; it is
/// left for the next read and this future stays pending.
async fn wait_for_close<R>(reader: &mut R)
where
    R: AsyncBufRead + Unpin,
{
    match reader.fill_buf().await {
        Ok(buffered) if !buffered.is_empty() => std::future::pending::<()>().await,
        Ok(_) => {}
        Err(e) => debug!("Control connection failed: {}", e),
    }
}

/// Read one `\n`-terminated line of at most `limit` bytes into `buffer`.
///
/// An oversized line is discarded up to and including its terminator.
async fn read_control_line<R>(
    reader: &mut R,
    buffer: &mut Vec<u8>,
    limit: usize,
) -> std::io::Result<ControlLine>
where
    R: AsyncBufRead + Unpin,
{
    let n = (&mut *reader)
        .take(limit as u64)
        .read_until(b'\n', buffer)
        .await?;

    if n == 0 {
        return Ok(ControlLine::Closed);
    }
    if buffer.ends_with(b"\n") {
        return Ok(ControlLine::Line);
    }
    if n < limit {
        // Peer closed mid-line.
        return Ok(ControlLine::Line);
    }

    let mut discarded = Vec::new();
    loop {
        discarded.clear();
        let n = (&mut *reader)
            .take(limit as u64)
            .read_until(b'\n', &mut discarded)
            .await?;
        if n == 0 {
            return Ok(ControlLine::Closed);
        }
        if discarded.ends_with(b"\n") {
            return Ok(ControlLine::TooLong);
        }
    }
}
