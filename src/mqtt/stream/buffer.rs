// MIT License
//
// Copyright (c) 2025 Takatoshi Kondo
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.
use crate::mqtt::result_code::MqttError;
use crate::mqtt::stream::{InputStream, OutputStream};

/// Input stream over a fixed byte slice.
///
/// Reading past the end fails with [`MqttError::InputStreamEmpty`] and leaves
/// the cursor untouched; `reset` rewinds to the start of the slice.
#[derive(Debug)]
pub struct BufferInputStream<'a> {
    buf: &'a [u8],
    pos: usize,
    last_error: Option<MqttError>,
}

impl<'a> BufferInputStream<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            last_error: None,
        }
    }

    /// Current cursor position.
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl InputStream for BufferInputStream<'_> {
    fn read(&mut self, buf: &mut [u8]) -> Result<(), MqttError> {
        if self.pos + buf.len() > self.buf.len() {
            self.last_error = Some(MqttError::InputStreamEmpty);
            return Err(MqttError::InputStreamEmpty);
        }
        buf.copy_from_slice(&self.buf[self.pos..self.pos + buf.len()]);
        self.pos += buf.len();
        Ok(())
    }

    fn bytes_read(&self) -> usize {
        self.pos
    }

    fn size(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn last_error(&self) -> Option<MqttError> {
        self.last_error
    }

    fn reset(&mut self) -> Result<(), MqttError> {
        self.pos = 0;
        self.last_error = None;
        Ok(())
    }
}

/// Output stream over a fixed mutable byte slice.
///
/// Writing past capacity fails with [`MqttError::OutputStreamFull`] without
/// a partial write; `reset` rewinds so the buffer can be reused. The broker
/// uses this binding to frame a packet into a scratch buffer before
/// dispatching it to session sockets.
#[derive(Debug)]
pub struct BufferOutputStream<'a> {
    buf: &'a mut [u8],
    pos: usize,
    last_error: Option<MqttError>,
}

impl<'a> BufferOutputStream<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            last_error: None,
        }
    }

    /// Number of valid bytes written so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// The written prefix of the underlying buffer.
    pub fn written(&self) -> &[u8] {
        &self.buf[..self.pos]
    }
}

impl OutputStream for BufferOutputStream<'_> {
    fn write(&mut self, buf: &[u8]) -> Result<(), MqttError> {
        if self.pos + buf.len() > self.buf.len() {
            self.last_error = Some(MqttError::OutputStreamFull);
            return Err(MqttError::OutputStreamFull);
        }
        self.buf[self.pos..self.pos + buf.len()].copy_from_slice(buf);
        self.pos += buf.len();
        Ok(())
    }

    fn bytes_written(&self) -> usize {
        self.pos
    }

    fn size(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn last_error(&self) -> Option<MqttError> {
        self.last_error
    }

    fn reset(&mut self) -> Result<(), MqttError> {
        self.pos = 0;
        self.last_error = None;
        Ok(())
    }
}
