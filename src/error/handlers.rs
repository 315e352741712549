//! Error handlers
//!
//! Maps server errors onto FTP reply codes and logs them.

use crate::error::types::{FtpServerError, NavigateError};
use log::error;

/// Handle an FTP server error by logging it with its reply category.
pub fn handle_error(err: &FtpServerError) {
    error!("FTP Server Error ({}): {}", error_to_ftp_code(err), err);
}

/// Convert error to FTP response code
pub fn error_to_ftp_code(err: &FtpServerError) -> u16 {
    match err {
        FtpServerError::Navigate(NavigateError::NotFound(_)) => 400,
        FtpServerError::Navigate(NavigateError::OutsideRoot { .. }) => 550,
        FtpServerError::Storage(_) => 550,
        FtpServerError::Transfer(_) => 425,
        FtpServerError::Protocol(_) => 501,
        FtpServerError::Config(_) => 451,
        FtpServerError::IoError(_) => 451,
    }
}
