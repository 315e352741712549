//! Module `file_ops`
//!
//! Pushes directory listings and file contents over an accepted data
//! connection. Files are pulled lazily in fixed-size chunks; the pull ends
//! once the read offset reaches the file size.

use log::{debug, info};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::transfer::TransferType;

/// Encode listing text for the wire. Binary sends UTF-8; ASCII sends one
/// byte per character, truncating each code point.
pub fn encode_for_transfer(text: &str, transfer_type: TransferType) -> Vec<u8> {
    if transfer_type.is_binary() {
        text.as_bytes().to_vec()
    } else {
        text.chars().map(|c| c as u32 as u8).collect()
    }
}

/// Send a whole listing and close the write side of the data connection.
pub async fn send_listing<W>(
    data_stream: &mut W,
    listing: &str,
    transfer_type: TransferType,
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let payload = encode_for_transfer(listing, transfer_type);
    data_stream.write_all(&payload).await?;
    data_stream.flush().await?;
    data_stream.shutdown().await?;
    debug!("Sent {} byte listing", payload.len());
    Ok(())
}

/// Lazy chunk source over a file of known size
pub struct FileChunks<R> {
    reader: R,
    offset: u64,
    size: u64,
    chunk_size: usize,
}

impl<R: AsyncRead + Unpin> FileChunks<R> {
    pub fn new(reader: R, size: u64, chunk_size: usize) -> Self {
        Self {
            reader,
            offset: 0,
            size,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Bytes pulled so far
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Next chunk, or `None` once `offset` has reached the file size.
    pub async fn next_chunk(&mut self) -> std::io::Result<Option<Vec<u8>>> {
        if self.offset >= self.size {
            return Ok(None);
        }

        let wanted = (self.size - self.offset).min(self.chunk_size as u64) as usize;
        let mut buffer = vec![0u8; wanted];
        let mut filled = 0;
        while filled < wanted {
            let n = self.reader.read(&mut buffer[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        if filled == 0 {
            // File shrank underneath us.
            self.size = self.offset;
            return Ok(None);
        }

        buffer.truncate(filled);
        self.offset += filled as u64;
        Ok(Some(buffer))
    }
}

/// Stream every chunk to `data_stream`, then close its write side.
/// Returns the number of bytes sent.
pub async fn stream_file<R, W>(
    chunks: &mut FileChunks<R>,
    data_stream: &mut W,
) -> std::io::Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    while let Some(chunk) = chunks.next_chunk().await? {
        data_stream.write_all(&chunk).await?;
    }
    data_stream.flush().await?;
    data_stream.shutdown().await?;

    info!("File transfer finished ({} bytes)", chunks.offset());
    Ok(chunks.offset())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn ascii_truncates_code_points() {
        assert_eq!(encode_for_transfer("ab\r\n", TransferType::Ascii), b"ab\r\n");
        assert_eq!(encode_for_transfer("é", TransferType::Ascii), vec![0xE9]);
        assert_eq!(encode_for_transfer("é", TransferType::Binary), vec![0xC3, 0xA9]);
        assert_eq!(encode_for_transfer("€", TransferType::Ascii), vec![0xAC]);
    }

    #[tokio::test]
    async fn pulls_fixed_size_chunks_until_size() {
        let data: Vec<u8> = (0..25u8).collect();
        let mut chunks = FileChunks::new(Cursor::new(data.clone()), 25, 10);

        let mut sizes = Vec::new();
        while let Some(chunk) = chunks.next_chunk().await.unwrap() {
            sizes.push(chunk.len());
        }
        assert_eq!(sizes, vec![10, 10, 5]);
        assert_eq!(chunks.offset(), 25);
        assert!(chunks.next_chunk().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_file_has_no_chunks() {
        let mut chunks = FileChunks::new(Cursor::new(Vec::new()), 0, 10);
        assert!(chunks.next_chunk().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn streams_all_bytes() {
        let data: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let mut chunks = FileChunks::new(Cursor::new(data.clone()), data.len() as u64, 64);
        let mut sink = Vec::new();

        let sent = stream_file(&mut chunks, &mut sink).await.unwrap();
        assert_eq!(sent, 1000);
        assert_eq!(sink, data);
    }

    #[tokio::test]
    async fn listing_is_written_whole() {
        let mut sink = Vec::new();
        send_listing(&mut sink, "a\r\nb\r\n", TransferType::Binary)
            .await
            .unwrap();
        assert_eq!(sink, b"a\r\nb\r\n");
    }
}
