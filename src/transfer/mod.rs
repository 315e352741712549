//! Transfer module for FTP server
//!
//! Passive data channels, the transfer type flag and the byte-level work
//! of pushing listings and files over a data connection.

pub mod data_channel;
pub mod file_ops;
pub mod modes;

pub use data_channel::{PassiveDataChannel, format_pasv_reply};
pub use file_ops::{FileChunks, encode_for_transfer, send_listing, stream_file};
pub use modes::TransferType;
