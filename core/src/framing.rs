use crate::config::ModemConfig;
use crate::error::FramingError;
use log::debug;

/// Parse a `'0'`/`'1'` literal. Returns `None` on any other character.
pub fn bits_from_str(pattern: &str) -> Option<Vec<bool>> {
    pattern
        .chars()
        .map(|c| match c {
            '0' => Some(false),
            '1' => Some(true),
            _ => None,
        })
        .collect()
}

pub fn bits_to_string(bits: &[bool]) -> String {
    bits.iter().map(|&b| if b { '1' } else { '0' }).collect()
}

/// Builds the on-air bit sequence around an interleaved codeword:
/// preamble, sync marker, payload, then zero trailer bits.
#[derive(Debug, Clone)]
pub struct FrameEncoder {
    preamble: Vec<bool>,
    sync: Vec<bool>,
    trailer_bits: usize,
}

impl FrameEncoder {
    pub fn new(config: &ModemConfig) -> Self {
        Self {
            preamble: config.preamble.clone(),
            sync: config.sync_pattern.clone(),
            trailer_bits: config.trailer_bits,
        }
    }

    pub fn build(&self, payload: &[bool]) -> Vec<bool> {
        let mut frame =
            Vec::with_capacity(self.preamble.len() + self.sync.len() + payload.len() + self.trailer_bits);
        frame.extend_from_slice(&self.preamble);
        frame.extend_from_slice(&self.sync);
        frame.extend_from_slice(payload);
        frame.resize(frame.len() + self.trailer_bits, false);
        frame
    }
}

/// Where a frame was found in a demodulated bit stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHit {
    /// Bit index of the first sync bit
    pub sync_index: usize,
    /// Bit index of the first payload bit
    pub payload_start: usize,
    pub payload: Vec<bool>,
}

#[derive(Debug, Clone)]
pub struct FrameDecoder {
    sync: Vec<bool>,
    payload_bits: usize,
}

impl FrameDecoder {
    pub fn new(config: &ModemConfig) -> Self {
        Self {
            sync: config.sync_pattern.clone(),
            payload_bits: config.payload_bits(),
        }
    }

    /// Index of the earliest exact occurrence of the sync marker.
    pub fn find_sync(&self, bits: &[bool]) -> Option<usize> {
        if self.sync.is_empty() || bits.len() < self.sync.len() {
            return None;
        }
        bits.windows(self.sync.len()).position(|w| w == self.sync.as_slice())
    }

    /// Locate the sync marker and slice out the payload that follows it.
    pub fn locate(&self, bits: &[bool]) -> Result<FrameHit, FramingError> {
        let sync_index = self.find_sync(bits).ok_or(FramingError::NoSyncFound)?;
        let payload_start = sync_index + self.sync.len();
        let available = bits.len() - payload_start;

        debug!("sync marker at bit {}", sync_index);

        if available < self.payload_bits {
            return Err(FramingError::TruncatedPayload {
                needed: self.payload_bits,
                available,
            });
        }

        Ok(FrameHit {
            sync_index,
            payload_start,
            payload: bits[payload_start..payload_start + self.payload_bits].to_vec(),
        })
    }
}
