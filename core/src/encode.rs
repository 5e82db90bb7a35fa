//! Outbound message encoding
//!
//! A reading becomes one line-protocol record:
//!
//! ```text
//! <topic>,location=<location> <field>=<int>.<tenth>
//! probes,location=living_room temperature=21.9
//! ```
//!
//! The value keeps exactly one decimal digit and is truncated toward zero,
//! never rounded: 21.96 is sent as `21.9`.
//!
//! # Memory Management
//!
//! The record is assembled in a `heapless::String` of [`MESSAGE_CAPACITY`]
//! bytes. Anything that does not fit is cut off (on a UTF-8 boundary) and
//! the message is flagged as truncated; nothing is ever written past the
//! buffer.

use core::fmt::{self, Write};

use heapless::String;

use crate::error::EncodeError;

/// Maximum encoded message size in bytes
pub const MESSAGE_CAPACITY: usize = 64;

/// A reading split into sign, integer part and first decimal digit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SplitValue {
    /// Value is below zero (and not truncated to zero)
    pub negative: bool,
    /// Integer part of the magnitude
    pub integer: u64,
    /// First decimal digit of the magnitude (0..=9)
    pub tenths: u8,
}

impl SplitValue {
    /// Split a reading, truncating toward zero after the first decimal
    ///
    /// The integer part is taken from the value exactly. For small
    /// magnitudes the tenths digit comes from scaling in `f32`, so that the
    /// product rounds to the decimal the sensor reported (21.9f32 is
    /// 21.8999996..., but 21.9f32 * 10.0 is exactly 219.0). From 2^20 up
    /// the product would lose bits, and the digit comes from the exact
    /// fractional remainder instead. Magnitudes beyond `u64` saturate.
    pub fn from_f32(value: f32) -> Result<Self, EncodeError> {
        if !value.is_finite() {
            return Err(EncodeError::NonFinite);
        }

        let magnitude = value.abs();
        // `as` truncates toward zero and saturates
        let integer = magnitude as u64;

        let tenths = if magnitude < SCALED_TENTHS_LIMIT {
            let scaled = (magnitude * 10.0) as u64;
            // The product may round up into the next integer
            scaled.saturating_sub(integer * 10).min(9) as u8
        } else if magnitude < WHOLE_NUMBERS_FROM {
            // Exact: at this size the fraction has at most three bits
            let fraction = magnitude - integer as f32;
            ((fraction * 10.0) as u8).min(9)
        } else {
            0
        };

        Ok(Self {
            negative: value < 0.0 && (integer != 0 || tenths != 0),
            integer,
            tenths,
        })
    }
}

/// Magnitude (2^20) from which the tenths digit is no longer scaled in `f32`
const SCALED_TENTHS_LIMIT: f32 = 1_048_576.0;

/// Magnitude (2^23) from which every `f32` is a whole number
const WHOLE_NUMBERS_FROM: f32 = 8_388_608.0;

impl fmt::Display for SplitValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            f.write_char('-')?;
        }
        write!(f, "{}.{}", self.integer, self.tenths)
    }
}

/// Encoded reading, ready to be published
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    text: String<MESSAGE_CAPACITY>,
    truncated: bool,
}

impl OutboundMessage {
    /// Encode one reading
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::NonFinite`] for NaN and infinite values.
    /// Oversized input is not an error: the message is truncated to
    /// [`MESSAGE_CAPACITY`] and [`is_truncated`](Self::is_truncated) is set.
    pub fn encode(
        topic: &str,
        location: &str,
        field: &str,
        value: f32,
    ) -> Result<Self, EncodeError> {
        let value = SplitValue::from_f32(value)?;

        let mut writer = BoundedWriter::default();
        // BoundedWriter drops the overflow instead of failing, and the
        // Display impls involved never fail on their own
        let _ = write!(writer, "{},location={} {}={}", topic, location, field, value);

        Ok(Self {
            text: writer.text,
            truncated: writer.truncated,
        })
    }

    /// Encoded text
    pub fn as_str(&self) -> &str {
        self.text.as_str()
    }

    /// Encoded text as payload bytes
    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    /// Length in bytes, never above [`MESSAGE_CAPACITY`]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether nothing was encoded
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Whether the record was cut to fit the buffer
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

/// `fmt::Write` sink that keeps the longest prefix fitting its capacity
#[derive(Default)]
struct BoundedWriter {
    text: String<MESSAGE_CAPACITY>,
    truncated: bool,
}

impl Write for BoundedWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.truncated {
            return Ok(());
        }

        let room = MESSAGE_CAPACITY - self.text.len();
        if s.len() <= room {
            return self.text.push_str(s).map_err(|_| fmt::Error);
        }

        let mut end = room;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        self.truncated = true;
        self.text.push_str(&s[..end]).map_err(|_| fmt::Error)
    }
}
