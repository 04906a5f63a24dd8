//! Brightness modulation of `(secret, timestamp)`
//!
//! Frame layout, one symbol per `frames_per_symbol(fps)` frames:
//!
//! ```text
//! +-------------+------------------------------+------------+
//! | sync 1011   | secret:64 || timestamp:64    | checksum:8 |
//! +-------------+------------------------------+------------+
//! ```
//!
//! Payload bits are sent most significant first. A `1` is sent at the high
//! level and a `0` at the low level; the decoder averages each symbol's frames
//! and compares against the decision threshold.

use rand::Rng;

use crate::config::{limits, TvcConfig};
use crate::error::{Result, ZkError};

/// Symbols preceding the payload
pub const SYNC_HEADER: [bool; 4] = [true, false, true, true];

const PAYLOAD_BITS: usize = 128;
const CHECKSUM_BITS: usize = 8;

/// Symbols in one transmission
pub const SIGNAL_SYMBOLS: usize = SYNC_HEADER.len() + PAYLOAD_BITS + CHECKSUM_BITS;

/// Encoder/decoder for the Temporal Visual Code
#[derive(Debug, Clone, Default)]
pub struct TvcCodec {
    config: TvcConfig,
}

impl TvcCodec {
    pub fn new(config: TvcConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TvcConfig {
        &self.config
    }

    /// Frames in one transmission at `fps`
    pub fn signal_len(&self, fps: u32) -> usize {
        SIGNAL_SYMBOLS * self.config.frames_per_symbol(fps)
    }

    /// Modulate `(secret, timestamp)` into brightness samples
    pub fn encode(&self, secret: u64, timestamp: u64, fps: u32) -> Result<Vec<f32>> {
        self.check(fps)?;
        let per_symbol = self.config.frames_per_symbol(fps);
        let mut frames = Vec::with_capacity(SIGNAL_SYMBOLS * per_symbol);
        for bit in symbols(secret, timestamp) {
            let level = if bit {
                self.config.high_level
            } else {
                self.config.low_level
            };
            frames.extend(std::iter::repeat(level).take(per_symbol));
        }
        Ok(frames)
    }

    /// Encode, then add uniform jitter in `[-amplitude, amplitude)` to every frame
    ///
    /// Samples are clamped to `[0, 1]`.
    pub fn encode_with_noise<R: Rng + ?Sized>(
        &self,
        secret: u64,
        timestamp: u64,
        fps: u32,
        amplitude: f32,
        rng: &mut R,
    ) -> Result<Vec<f32>> {
        if !amplitude.is_finite() || !(0.0..=1.0).contains(&amplitude) {
            return Err(ZkError::InvalidInput(format!(
                "noise amplitude {} not in [0, 1]",
                amplitude
            )));
        }
        let mut frames = self.encode(secret, timestamp, fps)?;
        if amplitude > 0.0 {
            for frame in frames.iter_mut() {
                *frame = (*frame + rng.gen_range(-amplitude..amplitude)).clamp(0.0, 1.0);
            }
        }
        Ok(frames)
    }

    /// Recover `(secret, timestamp)` from a captured frame sequence
    pub fn decode(&self, frames: &[f32], fps: u32) -> Result<(u64, u64)> {
        self.check(fps)?;
        let per_symbol = self.config.frames_per_symbol(fps);
        let expected = SIGNAL_SYMBOLS * per_symbol;
        if frames.len() != expected {
            return Err(ZkError::MalformedSignal(format!(
                "expected {} frames at {} fps, got {}",
                expected,
                fps,
                frames.len()
            )));
        }
        if let Some(bad) = frames
            .iter()
            .find(|f| !f.is_finite() || !(0.0..=1.0).contains(*f))
        {
            return Err(ZkError::MalformedSignal(format!(
                "sample {} outside [0, 1]",
                bad
            )));
        }

        let bits: Vec<bool> = frames
            .chunks_exact(per_symbol)
            .map(|chunk| {
                let mean = chunk.iter().sum::<f32>() / chunk.len() as f32;
                mean > self.config.decision_threshold
            })
            .collect();

        let (header, rest) = bits.split_at(SYNC_HEADER.len());
        if header != SYNC_HEADER {
            return Err(ZkError::MalformedSignal("sync header not found".into()));
        }
        let (payload_bits, checksum_bits) = rest.split_at(PAYLOAD_BITS);

        let payload = payload_bits
            .iter()
            .fold(0u128, |acc, bit| (acc << 1) | *bit as u128);
        let received = checksum_bits
            .iter()
            .fold(0u8, |acc, bit| (acc << 1) | *bit as u8);
        if received != checksum(payload) {
            return Err(ZkError::MalformedSignal("payload checksum mismatch".into()));
        }

        Ok(((payload >> 64) as u64, payload as u64))
    }

    fn check(&self, fps: u32) -> Result<()> {
        if fps == 0 {
            return Err(ZkError::InvalidInput("frame rate must be positive".into()));
        }
        if fps > limits::MAX_TVC_FPS {
            return Err(ZkError::InvalidInput(format!(
                "frame rate {} exceeds limit {}",
                fps,
                limits::MAX_TVC_FPS
            )));
        }
        let c = &self.config;
        let ordered = c.low_level < c.decision_threshold && c.decision_threshold < c.high_level;
        let bounded = (0.0..=1.0).contains(&c.low_level) && (0.0..=1.0).contains(&c.high_level);
        if !ordered || !bounded {
            return Err(ZkError::InvalidInput(
                "signal levels must satisfy 0 <= low < threshold < high <= 1".into(),
            ));
        }
        Ok(())
    }
}

fn checksum(payload: u128) -> u8 {
    blake3::hash(&payload.to_be_bytes()).as_bytes()[0]
}

/// Header, payload and checksum bits in transmission order
fn symbols(secret: u64, timestamp: u64) -> Vec<bool> {
    let payload = ((secret as u128) << 64) | timestamp as u128;
    let check = checksum(payload);
    SYNC_HEADER
        .iter()
        .copied()
        .chain((0..PAYLOAD_BITS).rev().map(|i| (payload >> i) & 1 == 1))
        .chain((0..CHECKSUM_BITS).rev().map(|i| (check >> i) & 1 == 1))
        .collect()
}
