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
use crate::mqtt::packet::packet_type::{PacketHeader, PacketType};
use crate::mqtt::result_code::MqttError;
use crate::mqtt::stream::{InputStream, OutputStream};

/// Frame reading state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    /// Waiting for the first fixed-header byte
    AwaitType,
    /// Accumulating the remaining-length variable byte integer
    AwaitLength,
    /// Copying payload bytes through to the output stream
    AwaitPayload,
    /// A whole packet has been framed
    Complete,
}

/// Result of one [`FrameDecoder::feed`] step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameProgress {
    /// All currently available input has been consumed; call again when the
    /// stream has more bytes.
    InProgress,
    /// One whole packet has been framed; its variable header and payload
    /// were copied to the output stream.
    Complete(PacketHeader),
}

/// Resumable whole-packet decoder.
///
/// Separates framing from interpretation: each `feed` consumes whatever
/// bytes the input stream currently has and copies variable-header and
/// payload bytes through to a caller-supplied output stream without
/// interpreting them. The broker uses this to frame a packet from a
/// non-blocking session socket into a scratch buffer across any number of
/// task steps, then parse the buffer once the frame is complete.
///
/// `InputStreamEmpty` and `SocketPending` from the input are not errors at
/// this boundary; they become [`FrameProgress::InProgress`]. Everything is
/// consumed one byte at a time so a starved input can never tear a frame.
#[derive(Debug)]
pub struct FrameDecoder {
    state: FrameState,
    packet_type: PacketType,
    flags: u8,
    remaining_length: u32,
    multiplier: u32,
    bytes_left: u32,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            state: FrameState::AwaitType,
            packet_type: PacketType::Connect,
            flags: 0,
            remaining_length: 0,
            multiplier: 1,
            bytes_left: 0,
        }
    }

    /// Current framing state.
    pub fn state(&self) -> FrameState {
        self.state
    }

    /// Make the decoder ready for the next packet.
    pub fn reset(&mut self) {
        self.state = FrameState::AwaitType;
        self.flags = 0;
        self.remaining_length = 0;
        self.multiplier = 1;
        self.bytes_left = 0;
    }

    fn header(&self) -> PacketHeader {
        PacketHeader {
            packet_type: self.packet_type,
            flags: self.flags,
            remaining_length: self.remaining_length,
        }
    }

    /// Advance the frame with whatever the input stream can deliver.
    ///
    /// Wire violations (`InvalidPacketType`, `InvalidPacketSize`) reset the
    /// decoder and are returned as errors; the output stream's own failures
    /// (for example `OutputStreamFull` when the scratch buffer is smaller
    /// than the announced frame) pass through unchanged.
    pub fn feed(
        &mut self,
        input: &mut dyn InputStream,
        output: &mut dyn OutputStream,
    ) -> Result<FrameProgress, MqttError> {
        if self.state == FrameState::Complete {
            self.reset();
        }

        let mut byte = [0u8; 1];
        loop {
            match self.state {
                FrameState::AwaitType => {
                    match input.read(&mut byte) {
                        Ok(()) => {}
                        Err(MqttError::InputStreamEmpty) | Err(MqttError::SocketPending) => {
                            return Ok(FrameProgress::InProgress);
                        }
                        Err(e) => return Err(e),
                    }
                    let packet_type = PacketType::try_from(byte[0] >> 4)
                        .map_err(|_| MqttError::InvalidPacketType)
                        .inspect_err(|_| self.reset())?;
                    let flags = byte[0] & 0x0F;
                    packet_type
                        .validate_flags(flags)
                        .inspect_err(|_| self.reset())?;
                    self.packet_type = packet_type;
                    self.flags = flags;
                    self.state = FrameState::AwaitLength;
                }

                FrameState::AwaitLength => {
                    match input.read(&mut byte) {
                        Ok(()) => {}
                        Err(MqttError::InputStreamEmpty) | Err(MqttError::SocketPending) => {
                            return Ok(FrameProgress::InProgress);
                        }
                        Err(e) => return Err(e),
                    }
                    // 1-4 length bytes; a fifth is malformed
                    if self.multiplier > 128 * 128 * 128 {
                        self.reset();
                        return Err(MqttError::InvalidPacketSize);
                    }
                    self.remaining_length += u32::from(byte[0] & 0x7F) * self.multiplier;
                    self.multiplier *= 128;

                    if byte[0] & 0x80 == 0 {
                        if self.remaining_length == 0 {
                            self.state = FrameState::Complete;
                            return Ok(FrameProgress::Complete(self.header()));
                        }
                        self.bytes_left = self.remaining_length;
                        self.state = FrameState::AwaitPayload;
                    }
                }

                FrameState::AwaitPayload => {
                    match input.read(&mut byte) {
                        Ok(()) => {}
                        Err(MqttError::InputStreamEmpty) | Err(MqttError::SocketPending) => {
                            return Ok(FrameProgress::InProgress);
                        }
                        Err(e) => return Err(e),
                    }
                    output.write(&byte)?;
                    self.bytes_left -= 1;
                    if self.bytes_left == 0 {
                        self.state = FrameState::Complete;
                        return Ok(FrameProgress::Complete(self.header()));
                    }
                }

                FrameState::Complete => unreachable!("reset on entry"),
            }
        }
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mqtt::stream::{BufferInputStream, BufferOutputStream};

    #[test]
    fn zero_length_packet_completes_without_payload() {
        let wire = [0xC0u8, 0x00]; // PINGREQ
        let mut input = BufferInputStream::new(&wire);
        let mut scratch = [0u8; 8];
        let mut output = BufferOutputStream::new(&mut scratch);

        let mut decoder = FrameDecoder::new();
        match decoder.feed(&mut input, &mut output).unwrap() {
            FrameProgress::Complete(header) => {
                assert_eq!(header.packet_type, PacketType::Pingreq);
                assert_eq!(header.remaining_length, 0);
            }
            other => panic!("expected Complete, got {other:?}"),
        }
        assert_eq!(output.position(), 0);
        assert_eq!(decoder.state(), FrameState::Complete);
    }

    #[test]
    fn starved_input_reports_in_progress_and_resumes() {
        let wire = [0x30u8, 0x05, 0x00, 0x01, b't', b'h', b'i'];
        let mut scratch = [0u8; 16];
        let mut output = BufferOutputStream::new(&mut scratch);
        let mut decoder = FrameDecoder::new();

        for (i, byte) in wire.iter().enumerate() {
            let one = [*byte];
            let mut input = BufferInputStream::new(&one);
            let progress = decoder.feed(&mut input, &mut output).unwrap();
            if i + 1 < wire.len() {
                assert_eq!(progress, FrameProgress::InProgress);
            } else {
                match progress {
                    FrameProgress::Complete(header) => {
                        assert_eq!(header.packet_type, PacketType::Publish);
                        assert_eq!(header.remaining_length, 5);
                    }
                    other => panic!("expected Complete, got {other:?}"),
                }
            }
        }
        assert_eq!(output.written(), &wire[2..]);
    }

    #[test]
    fn invalid_type_resets_the_decoder() {
        let wire = [0x00u8]; // type nibble 0 is not a packet
        let mut input = BufferInputStream::new(&wire);
        let mut scratch = [0u8; 4];
        let mut output = BufferOutputStream::new(&mut scratch);

        let mut decoder = FrameDecoder::new();
        assert_eq!(
            decoder.feed(&mut input, &mut output),
            Err(MqttError::InvalidPacketType)
        );
        assert_eq!(decoder.state(), FrameState::AwaitType);
    }

    #[test]
    fn five_length_bytes_are_malformed() {
        let wire = [0x30u8, 0x80, 0x80, 0x80, 0x80, 0x01];
        let mut input = BufferInputStream::new(&wire);
        let mut scratch = [0u8; 4];
        let mut output = BufferOutputStream::new(&mut scratch);

        let mut decoder = FrameDecoder::new();
        assert_eq!(
            decoder.feed(&mut input, &mut output),
            Err(MqttError::InvalidPacketSize)
        );
    }
}
