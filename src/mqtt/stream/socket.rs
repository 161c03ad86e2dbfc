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
use std::io::{ErrorKind, Read, Write};
use std::net::TcpStream;

use crate::mqtt::result_code::MqttError;
use crate::mqtt::stream::{InputStream, OutputStream, UNBOUNDED};

fn map_io_error(err: &std::io::Error) -> MqttError {
    match err.kind() {
        ErrorKind::WouldBlock | ErrorKind::TimedOut => MqttError::SocketPending,
        _ => MqttError::SocketFailed,
    }
}

/// Input stream over a TCP socket.
///
/// `read` loops over the socket primitive until the requested count is
/// satisfied or the socket reports a non-transient condition. `SocketPending`
/// (would-block / timeout) surfaces upward unchanged so callers can
/// distinguish "try again later" from "broken"; it is only raised before any
/// byte of the current request has been consumed. Once a read has started,
/// the loop insists on completing it and a timeout mid-request is
/// `SocketFailed`. A 0-byte read (peer EOF) is `SocketFailed`.
pub struct SocketInputStream<'a> {
    socket: &'a TcpStream,
    read: usize,
    last_error: Option<MqttError>,
}

impl<'a> SocketInputStream<'a> {
    pub fn new(socket: &'a TcpStream) -> Self {
        Self {
            socket,
            read: 0,
            last_error: None,
        }
    }

    fn fail(&mut self, err: MqttError) -> MqttError {
        self.last_error = Some(err);
        err
    }
}

impl InputStream for SocketInputStream<'_> {
    fn read(&mut self, buf: &mut [u8]) -> Result<(), MqttError> {
        let mut done = 0usize;
        while done < buf.len() {
            match self.socket.read(&mut buf[done..]) {
                Ok(0) => return Err(self.fail(MqttError::SocketFailed)),
                Ok(n) => {
                    done += n;
                    self.read += n;
                }
                Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(ref e) => {
                    let mapped = map_io_error(e);
                    if mapped == MqttError::SocketPending && done == 0 {
                        return Err(self.fail(MqttError::SocketPending));
                    }
                    // partial packet reads must not silently stall
                    return Err(self.fail(MqttError::SocketFailed));
                }
            }
        }
        Ok(())
    }

    fn bytes_read(&self) -> usize {
        self.read
    }

    fn size(&self) -> usize {
        UNBOUNDED
    }

    fn last_error(&self) -> Option<MqttError> {
        self.last_error
    }

    fn reset(&mut self) -> Result<(), MqttError> {
        self.read = 0;
        self.last_error = None;
        Ok(())
    }
}

/// Output stream over a TCP socket; see [`SocketInputStream`] for the
/// pending/failed mapping.
pub struct SocketOutputStream<'a> {
    socket: &'a TcpStream,
    written: usize,
    last_error: Option<MqttError>,
}

impl<'a> SocketOutputStream<'a> {
    pub fn new(socket: &'a TcpStream) -> Self {
        Self {
            socket,
            written: 0,
            last_error: None,
        }
    }

    fn fail(&mut self, err: MqttError) -> MqttError {
        self.last_error = Some(err);
        err
    }
}

impl OutputStream for SocketOutputStream<'_> {
    fn write(&mut self, buf: &[u8]) -> Result<(), MqttError> {
        let mut done = 0usize;
        while done < buf.len() {
            match self.socket.write(&buf[done..]) {
                Ok(0) => return Err(self.fail(MqttError::SocketFailed)),
                Ok(n) => {
                    done += n;
                    self.written += n;
                }
                Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(ref e) => {
                    let mapped = map_io_error(e);
                    if mapped == MqttError::SocketPending && done == 0 {
                        return Err(self.fail(MqttError::SocketPending));
                    }
                    return Err(self.fail(MqttError::SocketFailed));
                }
            }
        }
        Ok(())
    }

    fn bytes_written(&self) -> usize {
        self.written
    }

    fn size(&self) -> usize {
        UNBOUNDED
    }

    fn last_error(&self) -> Option<MqttError> {
        self.last_error
    }

    fn reset(&mut self) -> Result<(), MqttError> {
        self.written = 0;
        self.last_error = None;
        Ok(())
    }
}
