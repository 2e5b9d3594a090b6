//! Length-prefixed wire framing shared by the control, pool and receive
//! connections to the agreement engine.
//!
//! Every message on the wire is `[8-byte big-endian length][payload]`. The
//! typed write helpers below each produce exactly one frame; reads consume
//! exactly one frame. Nothing is buffered or coalesced across frames.

use crate::Result;

use byteorder::{BigEndian, ByteOrder};
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite, LengthDelimitedCodec};

/// Width of the length prefix preceding every payload.
pub const LENGTH_PREFIX_BYTES: usize = 8;

/// Upper bound on a single frame's payload. A peer announcing more than
/// this desynchronises the stream and the read errors out.
pub const MAX_FRAME_BYTES: usize = 8 * 1024 * 1024;

pub type FrameWriter<W> = FramedWrite<W, LengthDelimitedCodec>;
pub type FrameReader<R> = FramedRead<R, LengthDelimitedCodec>;

fn frame_codec() -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder()
        .big_endian()
        .length_field_length(LENGTH_PREFIX_BYTES)
        .max_frame_length(MAX_FRAME_BYTES)
        .new_codec()
}

pub fn writer<W: AsyncWrite + Unpin>(io: W) -> FrameWriter<W> {
    FramedWrite::new(io, frame_codec())
}

pub fn reader<R: AsyncRead + Unpin>(io: R) -> FrameReader<R> {
    FramedRead::new(io, frame_codec())
}

/// Writes a `u32` as a single frame (payload length 4).
pub async fn write_u32<W: AsyncWrite + Unpin>(writer: &mut FrameWriter<W>, v: u32) -> Result<()> {
    let mut buf = [0u8; 4];
    BigEndian::write_u32(&mut buf, v);
    Ok(writer.send(Bytes::copy_from_slice(&buf)).await?)
}

/// Writes a `u64` as a single frame (payload length 8).
pub async fn write_u64<W: AsyncWrite + Unpin>(writer: &mut FrameWriter<W>, v: u64) -> Result<()> {
    let mut buf = [0u8; 8];
    BigEndian::write_u64(&mut buf, v);
    Ok(writer.send(Bytes::copy_from_slice(&buf)).await?)
}

/// Writes a boolean as a single frame (payload length 1, `1` or `0`).
pub async fn write_bool<W: AsyncWrite + Unpin>(writer: &mut FrameWriter<W>, b: bool) -> Result<()> {
    let buf = if b { [1u8] } else { [0u8] };
    Ok(writer.send(Bytes::copy_from_slice(&buf)).await?)
}

/// Writes a string's UTF-8 bytes as a single frame.
pub async fn write_string<W: AsyncWrite + Unpin>(writer: &mut FrameWriter<W>, s: &str) -> Result<()> {
    Ok(writer.send(Bytes::copy_from_slice(s.as_bytes())).await?)
}

/// Writes a byte slice as a single frame.
pub async fn write_bytes<W: AsyncWrite + Unpin>(writer: &mut FrameWriter<W>, bytes: &[u8]) -> Result<()> {
    Ok(writer.send(Bytes::copy_from_slice(bytes)).await?)
}

/// Reads one frame, blocking until the full payload is available.
///
/// Returns `Ok(None)` once the peer has closed the connection at a frame
/// boundary; the length prefix itself is consumed by the codec.
pub async fn read_bytes<R: AsyncRead + Unpin>(reader: &mut FrameReader<R>) -> Result<Option<Vec<u8>>> {
    match reader.next().await {
        Some(Ok(frame)) => Ok(Some(frame.to_vec())),
        Some(Err(err)) => Err(err.into()),
        None => Ok(None),
    }
}
