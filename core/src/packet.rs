//! Text <-> fixed-size packet conversion

use crate::error::Result;
use crate::fec::{FecDecoder, FecEncoder, FecReport};

/// One protected codeword: payload bytes followed by parity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    codeword: Vec<u8>,
}

impl Packet {
    /// UTF-8 encode `text`, zero-pad it to the payload size and append parity.
    ///
    /// Bytes past the payload size are dropped; callers that care check the
    /// length first (see `Encoder::validate_text`).
    pub fn from_text(text: &str, fec: &FecEncoder) -> Self {
        let block = pad_payload(text.as_bytes(), fec.payload_bytes());
        Self {
            codeword: fec.encode_block(&block),
        }
    }

    /// Rebuild a packet from received bits, MSB first.
    pub fn from_bits(bits: &[bool]) -> Self {
        Self {
            codeword: bits_to_bytes(bits),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.codeword
    }

    pub fn to_bits(&self) -> Vec<bool> {
        bytes_to_bits(&self.codeword)
    }

    /// Run error correction and decode the payload as text.
    pub fn into_text(self, fec: &FecDecoder) -> Result<(String, FecReport)> {
        let report = fec.decode_with_report(&self.codeword)?;
        Ok((payload_to_text(&report.payload), report))
    }
}

/// Zero-pad (or cut) `bytes` to exactly `len`.
pub fn pad_payload(bytes: &[u8], len: usize) -> Vec<u8> {
    let mut out = bytes[..bytes.len().min(len)].to_vec();
    out.resize(len, 0);
    out
}

/// Strip trailing NUL padding and decode as UTF-8, skipping invalid bytes.
///
/// Text that itself ends in NUL characters loses them.
pub fn payload_to_text(payload: &[u8]) -> String {
    let end = payload.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    let mut rest = &payload[..end];
    let mut text = String::with_capacity(rest.len());

    loop {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                text.push_str(valid);
                break;
            }
            Err(e) => {
                let (valid, after) = rest.split_at(e.valid_up_to());
                // valid_up_to marks a UTF-8 boundary
                text.push_str(std::str::from_utf8(valid).unwrap_or_default());
                match e.error_len() {
                    Some(skip) => rest = &after[skip..],
                    None => break, // truncated sequence at the end
                }
            }
        }
    }

    text
}

pub fn bytes_to_bits(bytes: &[u8]) -> Vec<bool> {
    bytes
        .iter()
        .flat_map(|&byte| (0..8).rev().map(move |i| (byte >> i) & 1 == 1))
        .collect()
}

/// Pack bits MSB first; a trailing partial byte is zero-filled.
pub fn bits_to_bytes(bits: &[bool]) -> Vec<u8> {
    bits.chunks(8)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .fold(0u8, |acc, (i, &bit)| acc | ((bit as u8) << (7 - i)))
        })
        .collect()
}
