//! Command parameter container
//!
//! Commands exchange input and output through one fixed-capacity tagged
//! value. The same container crosses three boundaries with different
//! representations:
//!
//! - the remote wire (little-endian, sized by [`ParamKind::min_static_len`])
//! - the storage backends (fixed-width records, zero-padded)
//! - the console (decimal/hex text)
//!
//! A container is created fresh per command invocation and never retained
//! across commands.

use crate::core::modules::Severity;
use crate::terminal::command::CommandError;
use core::fmt::Write;
use heapless::{String, Vec};

/// Maximum length of a string parameter
pub const PARAM_STR_MAX_LEN: usize = 64;
/// Maximum length of a byte-array parameter
pub const PARAM_BYTES_MAX_LEN: usize = 32;

/// Parameter kind declared by a command node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// No parameter
    None,
    /// Boolean (one byte on the wire, non-zero = true)
    Bool,
    /// Unsigned byte
    Byte,
    /// Signed byte
    Int8,
    /// Module id + severity pair
    ModuleId,
    /// Signed 32-bit integer
    Int32,
    /// Unsigned 32-bit integer
    UInt32,
    /// Pair of signed 32-bit integers
    Int32Pair,
    /// NUL-terminated string
    Str,
    /// Length-carrying byte array
    Bytes,
}

impl ParamKind {
    /// Minimum number of wire bytes a parameter of this kind occupies
    ///
    /// Variable-length kinds (string, byte array) report their minimum:
    /// one byte of terminator for strings, nothing for byte arrays.
    pub fn min_static_len(self) -> usize {
        match self {
            ParamKind::None => 0,
            ParamKind::Bool => 1,
            ParamKind::Byte => 1,
            ParamKind::Int8 => 1,
            ParamKind::ModuleId => 3,
            ParamKind::Int32 => 4,
            ParamKind::UInt32 => 4,
            ParamKind::Int32Pair => 8,
            ParamKind::Str => 1,
            ParamKind::Bytes => 0,
        }
    }
}

/// Tagged parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// No value
    None,
    /// Boolean
    Bool(bool),
    /// Unsigned byte
    Byte(u8),
    /// Signed byte
    Int8(i8),
    /// Module id + severity pair
    ModuleId {
        /// Wire module identifier
        id: u16,
        /// Requested severity
        severity: Severity,
    },
    /// Signed 32-bit integer
    Int32(i32),
    /// Unsigned 32-bit integer
    UInt32(u32),
    /// Pair of signed 32-bit integers
    Int32Pair(i32, i32),
    /// String value
    Str(String<PARAM_STR_MAX_LEN>),
    /// Byte-array value with explicit length
    Bytes(Vec<u8, PARAM_BYTES_MAX_LEN>),
}

impl ParamValue {
    /// Decode a value of `kind` from wire bytes
    ///
    /// The caller has already verified `bytes.len() >= kind.min_static_len()`;
    /// decoding is still bounds-checked and never reads past `bytes`.
    pub fn decode(kind: ParamKind, bytes: &[u8]) -> Result<Self, CommandError> {
        let need = kind.min_static_len();
        if bytes.len() < need {
            return Err(CommandError::InvalidParams);
        }

        Ok(match kind {
            ParamKind::None => ParamValue::None,
            ParamKind::Bool => ParamValue::Bool(bytes[0] != 0),
            ParamKind::Byte => ParamValue::Byte(bytes[0]),
            ParamKind::Int8 => ParamValue::Int8(bytes[0] as i8),
            ParamKind::ModuleId => ParamValue::ModuleId {
                id: u16::from_le_bytes([bytes[0], bytes[1]]),
                severity: Severity::from_bits(bytes[2]),
            },
            ParamKind::Int32 => {
                ParamValue::Int32(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
            }
            ParamKind::UInt32 => {
                ParamValue::UInt32(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
            }
            ParamKind::Int32Pair => ParamValue::Int32Pair(
                i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
                i32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            ),
            ParamKind::Str => {
                let end = bytes
                    .iter()
                    .position(|&b| b == 0)
                    .unwrap_or(bytes.len())
                    .min(PARAM_STR_MAX_LEN);
                let text = core::str::from_utf8(&bytes[..end])
                    .map_err(|_| CommandError::InvalidParams)?;
                let mut s = String::new();
                s.push_str(text).map_err(|_| CommandError::InvalidParams)?;
                ParamValue::Str(s)
            }
            ParamKind::Bytes => {
                let len = bytes.len().min(PARAM_BYTES_MAX_LEN);
                let mut v = Vec::new();
                v.extend_from_slice(&bytes[..len]).ok();
                ParamValue::Bytes(v)
            }
        })
    }

    /// Number of bytes [`ParamValue::encode`] will produce
    pub fn encoded_len(&self) -> usize {
        match self {
            ParamValue::None => 0,
            ParamValue::Bool(_) | ParamValue::Byte(_) | ParamValue::Int8(_) => 1,
            ParamValue::ModuleId { .. } => 3,
            ParamValue::Int32(_) | ParamValue::UInt32(_) => 4,
            ParamValue::Int32Pair(..) => 8,
            ParamValue::Str(s) => s.len(),
            ParamValue::Bytes(v) => v.len(),
        }
    }

    /// Encode for the wire into `out`; returns the number of bytes written
    ///
    /// `out` must hold at least [`ParamValue::encoded_len`] bytes.
    pub fn encode(&self, out: &mut [u8]) -> usize {
        match self {
            ParamValue::None => 0,
            ParamValue::Bool(b) => {
                out[0] = *b as u8;
                1
            }
            ParamValue::Byte(b) => {
                out[0] = *b;
                1
            }
            ParamValue::Int8(b) => {
                out[0] = *b as u8;
                1
            }
            ParamValue::ModuleId { id, severity } => {
                out[..2].copy_from_slice(&id.to_le_bytes());
                out[2] = *severity as u8;
                3
            }
            ParamValue::Int32(v) => {
                out[..4].copy_from_slice(&v.to_le_bytes());
                4
            }
            ParamValue::UInt32(v) => {
                out[..4].copy_from_slice(&v.to_le_bytes());
                4
            }
            ParamValue::Int32Pair(a, b) => {
                out[..4].copy_from_slice(&a.to_le_bytes());
                out[4..8].copy_from_slice(&b.to_le_bytes());
                8
            }
            ParamValue::Str(s) => {
                out[..s.len()].copy_from_slice(s.as_bytes());
                s.len()
            }
            ParamValue::Bytes(v) => {
                out[..v.len()].copy_from_slice(v);
                v.len()
            }
        }
    }

    /// Render into a fixed-width storage record, zero-padding `out`
    ///
    /// Used by the generic accessor to write configuration variables; the
    /// record width comes from the variable descriptor, not the value.
    pub fn to_store_bytes(&self, out: &mut [u8]) {
        out.fill(0);
        let mut scratch = [0u8; PARAM_STR_MAX_LEN];
        let n = self.encode(&mut scratch);
        let take = n.min(out.len());
        out[..take].copy_from_slice(&scratch[..take]);
    }

    /// Rebuild a value of the declared output kind from storage bytes
    ///
    /// Applies the output coercions: booleans from the first byte, strings
    /// forced to terminate within the maximum length, byte arrays recording
    /// the exact record length. Fixed-width kinds are read little-endian.
    pub fn from_store_bytes(kind: ParamKind, data: &[u8]) -> Self {
        let mut padded = [0u8; PARAM_STR_MAX_LEN];
        let take = data.len().min(PARAM_STR_MAX_LEN);
        padded[..take].copy_from_slice(&data[..take]);

        match kind {
            ParamKind::None => ParamValue::None,
            ParamKind::Bool => ParamValue::Bool(padded[0] != 0),
            ParamKind::Byte => ParamValue::Byte(padded[0]),
            ParamKind::Int8 => ParamValue::Int8(padded[0] as i8),
            ParamKind::ModuleId => ParamValue::ModuleId {
                id: u16::from_le_bytes([padded[0], padded[1]]),
                severity: Severity::from_bits(padded[2]),
            },
            ParamKind::Int32 => ParamValue::Int32(i32::from_le_bytes([
                padded[0], padded[1], padded[2], padded[3],
            ])),
            ParamKind::UInt32 => ParamValue::UInt32(u32::from_le_bytes([
                padded[0], padded[1], padded[2], padded[3],
            ])),
            ParamKind::Int32Pair => ParamValue::Int32Pair(
                i32::from_le_bytes([padded[0], padded[1], padded[2], padded[3]]),
                i32::from_le_bytes([padded[4], padded[5], padded[6], padded[7]]),
            ),
            ParamKind::Str => {
                let end = padded[..take].iter().position(|&b| b == 0).unwrap_or(take);
                let mut s = String::new();
                if let Ok(text) = core::str::from_utf8(&padded[..end]) {
                    s.push_str(text).ok();
                }
                ParamValue::Str(s)
            }
            ParamKind::Bytes => {
                let len = data.len().min(PARAM_BYTES_MAX_LEN);
                let mut v = Vec::new();
                v.extend_from_slice(&data[..len]).ok();
                ParamValue::Bytes(v)
            }
        }
    }

    /// Parse console text into a value of `kind`
    ///
    /// Numbers are decimal, byte arrays are contiguous hex pairs. Module-id
    /// parameters are resolved by name in the console layer and rejected
    /// here.
    pub fn parse_text(kind: ParamKind, text: &str) -> Result<Self, CommandError> {
        let text = text.trim();

        Ok(match kind {
            ParamKind::None => ParamValue::None,
            ParamKind::Bool => {
                let v: i32 = parse_int(text)?;
                ParamValue::Bool(v != 0)
            }
            ParamKind::Byte => ParamValue::Byte(parse_int(text)?),
            ParamKind::Int8 => ParamValue::Int8(parse_int(text)?),
            ParamKind::Int32 => ParamValue::Int32(parse_int(text)?),
            ParamKind::UInt32 => ParamValue::UInt32(parse_int(text)?),
            ParamKind::Int32Pair => {
                let mut parts = text.splitn(2, [' ', ',']);
                let first = parse_int(parts.next().unwrap_or(""))?;
                let second = parse_int(parts.next().unwrap_or("").trim())?;
                ParamValue::Int32Pair(first, second)
            }
            ParamKind::Str => {
                let mut s = String::new();
                let take = text.len().min(PARAM_STR_MAX_LEN);
                s.push_str(&text[..take]).ok();
                ParamValue::Str(s)
            }
            ParamKind::Bytes => ParamValue::Bytes(parse_hex(text)?),
            ParamKind::ModuleId => return Err(CommandError::InvalidParams),
        })
    }

    /// Render for console output
    pub fn format(&self, out: &mut dyn Write) -> core::fmt::Result {
        match self {
            ParamValue::None => Ok(()),
            ParamValue::Bool(b) => write!(out, "{}", if *b { "TRUE" } else { "FALSE" }),
            ParamValue::Byte(b) => write!(out, "{}", b),
            ParamValue::Int8(b) => write!(out, "{}", b),
            ParamValue::ModuleId { id, severity } => {
                write!(out, "{} ({})", id, severity.as_str())
            }
            ParamValue::Int32(v) => write!(out, "{}", v),
            ParamValue::UInt32(v) => write!(out, "{}", v),
            ParamValue::Int32Pair(a, b) => write!(out, "{} {}", a, b),
            ParamValue::Str(s) => write!(out, "{}", s),
            ParamValue::Bytes(v) => {
                for (i, b) in v.iter().enumerate() {
                    if i > 0 {
                        write!(out, "-")?;
                    }
                    write!(out, "{:02X}", b)?;
                }
                Ok(())
            }
        }
    }
}

fn parse_int<T: core::str::FromStr>(text: &str) -> Result<T, CommandError> {
    text.parse().map_err(|_| CommandError::InvalidParams)
}

/// Parse contiguous hex pairs (separating dashes allowed) into bytes
fn parse_hex(text: &str) -> Result<Vec<u8, PARAM_BYTES_MAX_LEN>, CommandError> {
    let mut out = Vec::new();
    let mut nibbles = text.chars().filter(|c| *c != '-');
    loop {
        let Some(hi) = nibbles.next() else { break };
        let lo = nibbles.next().ok_or(CommandError::InvalidParams)?;
        let hi = hi.to_digit(16).ok_or(CommandError::InvalidParams)?;
        let lo = lo.to_digit(16).ok_or(CommandError::InvalidParams)?;
        out.push(((hi << 4) | lo) as u8)
            .map_err(|_| CommandError::InvalidParams)?;
    }
    Ok(out)
}
