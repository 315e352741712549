//! FTP command handlers
//!
//! Dispatches parsed commands to their handlers and turns handler results
//! into reply text. LIST and RETR write their `150` preliminary reply to the
//! control connection themselves; every handler returns the final reply.

use log::{info, warn};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::handlers::{error_to_ftp_code, handle_error};
use crate::error::{FtpServerError, NavigateError, ProtocolError};
use crate::navigate::{change_directory, display_path, quote_path, resolve_file};
use crate::protocol::commands::{Command, Verb};
use crate::protocol::responses::*;
use crate::server::ServerContext;
use crate::session::Session;
use crate::storage::{DirectoryEntry, Entry, format_listing};
use crate::transfer::{FileChunks, PassiveDataChannel, TransferType, send_listing, stream_file};

/// Handle one command and return the final reply.
///
/// Invalid lines get a `501`, unknown verbs a `502`. A handler error is
/// logged and answered with `451 Server error.`; only a handler that
/// returned normally becomes the session's last command.
pub async fn handle_command<W>(
    server: &ServerContext,
    session: &mut Session,
    command: &Command,
    control: &mut W,
) -> String
where
    W: AsyncWrite + Unpin + Send,
{
    if !command.valid {
        let err = ProtocolError::InvalidCommand(command.fragment().to_string());
        info!("Client {}: {}", session.peer_addr(), err);
        return format_response(SYNTAX_ERROR, &err.to_string());
    }

    let Some(verb) = Verb::lookup(&command.verb.to_ascii_lowercase()) else {
        let err = ProtocolError::NotImplemented(command.verb.clone());
        info!("Client {}: {}", session.peer_addr(), err);
        return COMMAND_NOT_IMPLEMENTED.to_string();
    };

    match dispatch(server, session, verb, &command.argument, control).await {
        Ok(reply) => {
            session.set_last_command_verb(&command.verb);
            reply
        }
        Err(e) => {
            handle_error(&e);
            SERVER_ERROR.to_string()
        }
    }
}

async fn dispatch<W>(
    server: &ServerContext,
    session: &mut Session,
    verb: Verb,
    arg: &str,
    control: &mut W,
) -> Result<String, FtpServerError>
where
    W: AsyncWrite + Unpin + Send,
{
    if server.config.require_login && verb.requires_login() && !session.is_authenticated() {
        return Ok(format_response(NOT_LOGGED_IN, "Not logged in."));
    }

    match verb {
        Verb::User => handle_cmd_user(server, session, arg),
        Verb::Pass => handle_cmd_pass(server, session, arg),
        Verb::Pwd | Verb::Xpwd => handle_cmd_pwd(server, session),
        Verb::Cwd => handle_cmd_cwd(server, session, arg).await,
        Verb::Type => handle_cmd_type(session, arg),
        Verb::Syst => Ok(format_response(SYSTEM_TYPE, "UNIX Type: L8")),
        Verb::Pasv => handle_cmd_pasv(session).await,
        Verb::List => handle_cmd_list(server, session, control).await,
        Verb::Retr => handle_cmd_retr(server, session, arg, control).await,
    }
}

pub fn handle_cmd_user(
    server: &ServerContext,
    session: &mut Session,
    arg: &str,
) -> Result<String, FtpServerError> {
    if session.is_authenticated() || session.username().is_some() {
        return Ok(format_response(BAD_SEQUENCE, "USER already set."));
    }

    // Only a fresh connection or a failed PASS may start a login.
    if matches!(session.last_command_verb(), Some(last) if last != "PASS") {
        return Ok(USER_REQUIRED_FIRST.to_string());
    }

    let auth = &server.config.auth;
    if auth.allow_anonymous_login {
        session.set_username(Some(auth.username.clone()));
        info!("Client {} logging in anonymously as {:?}", session.peer_addr(), arg);
        Ok(format_response(PASSWORD_REQUIRED, "Anonymous login is allowed."))
    } else {
        session.set_username(Some(arg.to_string()));
        Ok(format_response(PASSWORD_REQUIRED, "Anonymous login is not allowed."))
    }
}

pub fn handle_cmd_pass(
    server: &ServerContext,
    session: &mut Session,
    arg: &str,
) -> Result<String, FtpServerError> {
    if session.last_command_verb() != Some("USER") {
        return Ok(USER_REQUIRED_FIRST.to_string());
    }

    let auth = &server.config.auth;
    if auth.allow_anonymous_login {
        session.login_anonymous(arg);
    } else if session.username() == Some(auth.username.as_str()) && arg == auth.password {
        session.login();
    } else {
        warn!("Failed login from {}", session.peer_addr());
        session.set_username(None);
        return Ok(format_response(
            NOT_LOGGED_IN,
            "Username and/or password is incorrect.",
        ));
    }

    info!(
        "Client {} logged in as {}",
        session.peer_addr(),
        session.username().unwrap_or_default()
    );
    Ok(format_multiline(
        LOGIN_SUCCESS,
        &auth.login_message.lines(),
        "User logged in, proceed.",
    ))
}

pub fn handle_cmd_pwd(server: &ServerContext, session: &Session) -> Result<String, FtpServerError> {
    let path = display_path(&server.root, session.current_directory());
    Ok(format!("{} \"{}\"\r\n", PATH_CREATED, quote_path(&path)))
}

pub async fn handle_cmd_cwd(
    server: &ServerContext,
    session: &mut Session,
    arg: &str,
) -> Result<String, FtpServerError> {
    let result = change_directory(
        server.fs.as_ref(),
        &server.root,
        session.current_directory(),
        arg,
    )
    .await;

    match result {
        Ok(dir) => {
            let path = display_path(&server.root, &dir);
            info!("Client {} changed directory to {}", session.peer_addr(), path);
            session.set_current_directory(dir);
            Ok(format_response(
                FILE_ACTION_OK,
                &format!("directory changed to {}", quote_path(&path)),
            ))
        }
        Err(e @ FtpServerError::Navigate(NavigateError::NotFound(_))) => {
            info!("CWD {:?} failed: {}", arg, e);
            Ok(format_response(error_to_ftp_code(&e), ""))
        }
        Err(FtpServerError::Navigate(e @ NavigateError::OutsideRoot { .. })) => {
            warn!("Client {} tried to leave the sandbox: {}", session.peer_addr(), e);
            Ok(OUTSIDE_ROOT.to_string())
        }
        Err(e) => Err(e),
    }
}

pub fn handle_cmd_type(session: &mut Session, arg: &str) -> Result<String, FtpServerError> {
    match TransferType::from_type_code(arg) {
        Some(transfer_type) => {
            session.set_transfer_type(transfer_type);
            Ok(format_response(OK, ""))
        }
        None => Ok(format_response(NOT_IMPLEMENTED, "")),
    }
}

pub async fn handle_cmd_pasv(session: &mut Session) -> Result<String, FtpServerError> {
    let channel =
        PassiveDataChannel::open(session.local_addr().ip(), session.transfer_type()).await?;
    let reply = channel.pasv_reply();
    info!(
        "Client {} opened passive channel on port {}",
        session.peer_addr(),
        channel.port()
    );
    session.set_data_channel(channel);
    Ok(reply)
}

pub async fn handle_cmd_list<W>(
    server: &ServerContext,
    session: &mut Session,
    control: &mut W,
) -> Result<String, FtpServerError>
where
    W: AsyncWrite + Unpin + Send,
{
    let Some(mut channel) = session.take_data_channel() else {
        return Ok(format_response(CANT_OPEN_DATA_CONNECTION, "Use PASV first."));
    };

    let preliminary = format_response(
        FILE_STATUS_OK,
        &format!(
            "Opening {} mode data connection for /bin/ls.",
            channel.transfer_type().label()
        ),
    );
    control.write_all(preliminary.as_bytes()).await?;

    let result = list_over_channel(server, session.current_directory(), &mut channel).await;
    drop(channel);

    match result {
        Ok(()) => Ok(format_response(TRANSFER_COMPLETE, "Transfer complete")),
        Err(e) => {
            handle_error(&e);
            Ok(LIST_ERROR.to_string())
        }
    }
}

async fn list_over_channel(
    server: &ServerContext,
    dir: &Entry,
    channel: &mut PassiveDataChannel,
) -> Result<(), FtpServerError> {
    let mut data_stream = channel.accept(server.config.data_connection_timeout()).await?;

    let mut rows = Vec::new();
    for entry in server.fs.list_directory_entries(dir).await? {
        let size_in_bytes = if entry.is_directory {
            None
        } else {
            Some(server.fs.metadata(&entry).await?.size_in_bytes)
        };
        rows.push(DirectoryEntry {
            name: entry.name,
            is_directory: entry.is_directory,
            size_in_bytes,
        });
    }

    let listing = format_listing(&rows);
    send_listing(&mut data_stream, &listing, channel.transfer_type()).await?;
    Ok(())
}

pub async fn handle_cmd_retr<W>(
    server: &ServerContext,
    session: &mut Session,
    arg: &str,
    control: &mut W,
) -> Result<String, FtpServerError>
where
    W: AsyncWrite + Unpin + Send,
{
    let Some(mut channel) = session.take_data_channel() else {
        return Ok(format_response(CANT_OPEN_DATA_CONNECTION, "Use PASV first."));
    };

    let file = match resolve_file(
        server.fs.as_ref(),
        &server.root,
        session.current_directory(),
        arg,
    )
    .await
    {
        Ok(file) => file,
        Err(e) => {
            handle_error(&e);
            return Ok(RETR_ERROR.to_string());
        }
    };

    let opened = match server.fs.metadata(&file).await {
        Ok(metadata) => server
            .fs
            .open_file_for_read(&file)
            .await
            .map(|reader| (metadata, reader)),
        Err(e) => Err(e),
    };
    let (metadata, reader) = match opened {
        Ok(opened) => opened,
        Err(e) => {
            handle_error(&FtpServerError::from(e));
            return Ok(RETR_ERROR.to_string());
        }
    };

    let preliminary = format_response(
        FILE_STATUS_OK,
        &format!(
            "Opening {} mode data connection for {} ({} bytes).",
            channel.transfer_type().label(),
            file.name,
            metadata.size_in_bytes
        ),
    );
    control.write_all(preliminary.as_bytes()).await?;

    let mut chunks = FileChunks::new(
        reader,
        metadata.size_in_bytes,
        server.config.stream_buffer_size,
    );
    let result = send_over_channel(server, &mut channel, &mut chunks).await;
    drop(channel);

    match result {
        Ok(sent) => {
            info!(
                "Client {} retrieved {} ({} bytes)",
                session.peer_addr(),
                file.full_path,
                sent
            );
            Ok(format_response(TRANSFER_COMPLETE, "Transfer complete"))
        }
        Err(e) => {
            handle_error(&e);
            Ok(RETR_ERROR.to_string())
        }
    }
}

async fn send_over_channel<R>(
    server: &ServerContext,
    channel: &mut PassiveDataChannel,
    chunks: &mut FileChunks<R>,
) -> Result<u64, FtpServerError>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut data_stream = channel.accept(server.config.data_connection_timeout()).await?;
    Ok(stream_file(chunks, &mut data_stream).await?)
}
