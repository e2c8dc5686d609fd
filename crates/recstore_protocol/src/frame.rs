//! Length-prefixed framing.
//!
//! ```text
//! +----------------+------------------+
//! | length: u32 BE | body: CBOR bytes |
//! +----------------+------------------+
//! ```

use crate::error::{ProtocolError, ProtocolResult};
use std::io::{Read, Write};

/// Size of the frame header in bytes.
pub const FRAME_HEADER_LEN: usize = 4;

/// Default upper bound on a frame body.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Builds the header for a body of `len` bytes.
pub fn frame_header(len: usize) -> ProtocolResult<[u8; FRAME_HEADER_LEN]> {
    let len = u32::try_from(len).map_err(|_| ProtocolError::FrameTooLarge {
        size: len,
        limit: u32::MAX as usize,
    })?;
    Ok(len.to_be_bytes())
}

/// Parses a header and checks the announced length against `max_size`.
pub fn frame_len(header: [u8; FRAME_HEADER_LEN], max_size: usize) -> ProtocolResult<usize> {
    let len = u32::from_be_bytes(header) as usize;
    if len > max_size {
        return Err(ProtocolError::FrameTooLarge {
            size: len,
            limit: max_size,
        });
    }
    Ok(len)
}

/// Writes one frame and flushes.
pub fn write_frame<W: Write>(writer: &mut W, body: &[u8]) -> ProtocolResult<()> {
    let header = frame_header(body.len())?;
    writer.write_all(&header)?;
    writer.write_all(body)?;
    writer.flush()?;
    Ok(())
}

/// Reads one frame body.
pub fn read_frame<R: Read>(reader: &mut R, max_size: usize) -> ProtocolResult<Vec<u8>> {
    let mut header = [0u8; FRAME_HEADER_LEN];
    reader.read_exact(&mut header)?;
    let len = frame_len(header, max_size)?;
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body)?;
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn write_then_read() {
        let mut buffer = Vec::new();
        write_frame(&mut buffer, b"hello").unwrap();
        write_frame(&mut buffer, b"").unwrap();
        assert_eq!(&buffer[..4], &[0, 0, 0, 5]);

        let mut cursor = Cursor::new(buffer);
        assert_eq!(read_frame(&mut cursor, 1024).unwrap(), b"hello");
        assert!(read_frame(&mut cursor, 1024).unwrap().is_empty());
    }

    #[test]
    fn oversized_frame_is_rejected() {
        let mut buffer = Vec::new();
        write_frame(&mut buffer, &[0u8; 64]).unwrap();
        let err = read_frame(&mut Cursor::new(buffer), 32).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::FrameTooLarge { size: 64, limit: 32 }
        ));
    }

    #[test]
    fn truncated_body_is_an_io_error() {
        let mut buffer = Vec::new();
        write_frame(&mut buffer, b"hello").unwrap();
        buffer.truncate(6);
        let err = read_frame(&mut Cursor::new(buffer), 1024).unwrap_err();
        match err {
            ProtocolError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof),
            other => panic!("expected io error, got {:?}", other),
        }
    }
}
