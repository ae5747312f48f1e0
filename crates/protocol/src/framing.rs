//! Varint length-prefixed framing.
//!
//! ```text
//! +-------------------------------+------------------+
//! | Length (LEB128 varint, 1-10B) | Payload          |
//! +-------------------------------+------------------+
//! ```
//!
//! The length counts payload bytes only. There is no terminator and no upper
//! bound on the payload size at this layer.

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Result, TransportError};

/// Longest valid encoding of a `u64` varint.
pub const MAX_VARINT_LEN: usize = 10;

/// Upper bound on buffer growth per read, so a claimed length is never
/// allocated before the bytes arrive.
const READ_CHUNK: usize = 64 * 1024;

/// Frame a payload: `varint(len) || payload`.
pub fn encode(payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(prost::length_delimiter_len(payload.len()) + payload.len());
    prost::encoding::encode_varint(payload.len() as u64, &mut buf);
    buf.put_slice(payload);
    buf.freeze()
}

/// Read exactly one frame.
///
/// Returns `Ok(None)` when the stream ends cleanly before the first length
/// byte. A stream that ends anywhere inside a frame is an error.
pub async fn read_frame<R>(reader: &mut R) -> std::result::Result<Option<Bytes>, TransportError>
where
    R: AsyncRead + Unpin,
{
    let Some(length) = read_length(reader).await? else {
        return Ok(None);
    };
    let length = usize::try_from(length).map_err(|_| TransportError::MalformedLength)?;

    let mut payload = BytesMut::with_capacity(length.min(READ_CHUNK));
    while payload.len() < length {
        let remaining = length - payload.len();
        payload.reserve(remaining.min(READ_CHUNK));
        let n = (&mut *reader)
            .take(remaining as u64)
            .read_buf(&mut payload)
            .await?;
        if n == 0 {
            return Err(TransportError::TruncatedPayload {
                expected: length,
                received: payload.len(),
            });
        }
    }

    Ok(Some(payload.freeze()))
}

async fn read_length<R>(reader: &mut R) -> std::result::Result<Option<u64>, TransportError>
where
    R: AsyncRead + Unpin,
{
    let mut value: u64 = 0;

    for index in 0..MAX_VARINT_LEN {
        let byte = match reader.read_u8().await {
            Ok(byte) => byte,
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return if index == 0 {
                    Ok(None)
                } else {
                    Err(TransportError::TruncatedLength)
                };
            }
            Err(e) => return Err(e.into()),
        };

        // The tenth byte may only carry the top bit of a u64.
        if index == MAX_VARINT_LEN - 1 && byte > 0x01 {
            return Err(TransportError::MalformedLength);
        }
        value |= u64::from(byte & 0x7f) << (7 * index);
        if byte & 0x80 == 0 {
            return Ok(Some(value));
        }
    }

    Err(TransportError::MalformedLength)
}

/// Write one frame and flush it.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> std::result::Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&encode(payload)).await?;
    writer.flush().await?;
    Ok(())
}

pub async fn write_message<W, M>(writer: &mut W, message: &M) -> std::result::Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
    M: prost::Message,
{
    write_frame(writer, &message.encode_to_vec()).await
}

pub async fn read_message<R, M>(reader: &mut R) -> Result<Option<M>>
where
    R: AsyncRead + Unpin,
    M: prost::Message + Default,
{
    match read_frame(reader).await? {
        Some(payload) => Ok(Some(M::decode(payload).map_err(crate::ProtocolError::from)?)),
        None => Ok(None),
    }
}
