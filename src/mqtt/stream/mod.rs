/**
 * MIT License
 *
 * Copyright (c) 2025 Takatoshi Kondo
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all
 * copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 */
mod buffer;
mod socket;

pub use buffer::{BufferInputStream, BufferOutputStream};
pub use socket::{SocketInputStream, SocketOutputStream};

use crate::mqtt::result_code::MqttError;

/// Size hint reported by streams whose length is not known in advance
/// (socket-backed bindings).
pub const UNBOUNDED: usize = usize::MAX;

/// Byte-oriented input capability.
///
/// The codec speaks only to this trait, never to sockets, so every decoder
/// in this crate can be exercised against literal byte vectors. Reads are
/// exact-count: `read` either fills the whole buffer or fails without a
/// partial result being observable through the counter.
///
/// Implementations carry a size hint ([`UNBOUNDED`] for socket bindings), a
/// running counter of consumed bytes, and a last-error slot recording the
/// most recent failure.
pub trait InputStream {
    /// Read exactly `buf.len()` bytes into `buf`.
    fn read(&mut self, buf: &mut [u8]) -> Result<(), MqttError>;

    /// Total bytes successfully read since creation or the last reset.
    fn bytes_read(&self) -> usize;

    /// Bytes known to remain, or [`UNBOUNDED`] when the stream cannot tell.
    fn size(&self) -> usize;

    /// Most recent error raised by this stream, if any.
    fn last_error(&self) -> Option<MqttError>;

    /// Rewind the stream to its initial position where supported.
    fn reset(&mut self) -> Result<(), MqttError>;
}

/// Byte-oriented output capability, mirror of [`InputStream`].
pub trait OutputStream {
    /// Write all of `buf`.
    fn write(&mut self, buf: &[u8]) -> Result<(), MqttError>;

    /// Total bytes successfully written since creation or the last reset.
    fn bytes_written(&self) -> usize;

    /// Remaining capacity, or [`UNBOUNDED`] when the stream cannot tell.
    fn size(&self) -> usize;

    /// Most recent error raised by this stream, if any.
    fn last_error(&self) -> Option<MqttError>;

    /// Rewind the stream to its initial position where supported.
    fn reset(&mut self) -> Result<(), MqttError>;
}
