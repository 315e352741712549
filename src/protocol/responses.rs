//! FTP Response handling
//!
//! Defines FTP response codes and formatting.

/// Standard FTP response codes
pub const FILE_STATUS_OK: u16 = 150;
pub const OK: u16 = 200;
pub const SYSTEM_TYPE: u16 = 215;
pub const TRANSFER_COMPLETE: u16 = 226;
pub const LOGIN_SUCCESS: u16 = 230;
pub const FILE_ACTION_OK: u16 = 250;
pub const PATH_CREATED: u16 = 257;
pub const PASSWORD_REQUIRED: u16 = 331;
pub const CANT_OPEN_DATA_CONNECTION: u16 = 425;
pub const SYNTAX_ERROR: u16 = 501;
pub const NOT_IMPLEMENTED: u16 = 502;
pub const BAD_SEQUENCE: u16 = 503;
pub const NOT_LOGGED_IN: u16 = 530;

pub const SERVER_ERROR: &str = "451 Server error.\r\n";
pub const LIST_ERROR: &str = "451 Server LIST error.\r\n";
pub const RETR_ERROR: &str = "451 Server RETR error.\r\n";
pub const COMMAND_NOT_IMPLEMENTED: &str = "502 Command not implemented.\r\n";
pub const USER_REQUIRED_FIRST: &str = "503 USER required first.\r\n";
pub const TOO_MANY_CONNECTIONS: &str = "421 Too many connections. Try again later.\r\n";
pub const COMMAND_TOO_LONG: &str = "500 Command too long.\r\n";
pub const OUTSIDE_ROOT: &str = "550 Requested path is outside the root.\r\n";

/// Format an FTP response message
pub fn format_response(code: u16, message: &str) -> String {
    format!("{} {}\r\n", code, message)
}

/// Format a multi-line reply: every line but the last uses `code-`.
pub fn format_multiline(code: u16, lines: &[&str], last: &str) -> String {
    let mut reply = String::new();
    for line in lines {
        reply.push_str(&format!("{}-{}\r\n", code, line));
    }
    reply.push_str(&format_response(code, last));
    reply
}
