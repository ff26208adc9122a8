use crate::types::{SensorKind, SensorSample};
use glam::Vec3;
use std::collections::VecDeque;
use thiserror::Error;

/// Fields per sample line: kind, timestamp, x, y, z.
const FIELD_COUNT: usize = 5;

/// Longest accepted line, newline excluded. Real sample lines are well under 100 bytes.
pub const MAX_LINE_LEN: usize = 256;

#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    #[error("Line is not valid UTF-8")]
    InvalidUtf8,
    #[error("Unknown sensor tag {0:?}")]
    UnknownSensor(String),
    #[error("Expected 5 comma-separated fields, found {0}")]
    FieldCount(usize),
    #[error("Invalid number {0:?}")]
    InvalidNumber(String),
    #[error("Line exceeds {max} bytes", max = MAX_LINE_LEN)]
    LineTooLong,
}

/// Streaming parser for newline-delimited sensor samples.
///
/// Each line reads `<kind>,<timestamp_ns>,<x>,<y>,<z>`, where kind is one of
/// `G`/`gyro`, `A`/`acc`, `M`/`mag`. Blank lines and `#` comments are skipped.
/// Feed raw bytes via `push_data`, then drain parsed samples via `next_sample`.
pub struct ProtocolParser {
    buffer: VecDeque<u8>,
    /// Dropping bytes of an oversized line until its newline arrives.
    discarding: bool,
}

impl ProtocolParser {
    pub fn new() -> Self {
        Self {
            buffer: VecDeque::with_capacity(8192),
            discarding: false,
        }
    }

    /// Append received bytes to the internal buffer.
    pub fn push_data(&mut self, data: &[u8]) {
        self.buffer.extend(data);
    }

    /// Try to extract the next complete sample from the buffer.
    /// Returns `None` if no complete line is available yet.
    pub fn next_sample(&mut self) -> Option<Result<SensorSample, ProtocolError>> {
        loop {
            let Some(end) = self.buffer.iter().position(|&b| b == b'\n') else {
                if self.buffer.len() > MAX_LINE_LEN {
                    self.buffer.clear();
                    if !self.discarding {
                        self.discarding = true;
                        return Some(Err(ProtocolError::LineTooLong));
                    }
                }
                return None;
            };

            if self.discarding {
                // Tail of a line already reported as too long.
                self.buffer.drain(..=end);
                self.discarding = false;
                continue;
            }
            if end > MAX_LINE_LEN {
                self.buffer.drain(..=end);
                return Some(Err(ProtocolError::LineTooLong));
            }

            let line: Vec<u8> = self.buffer.drain(..=end).take(end).collect();

            let Ok(text) = std::str::from_utf8(&line) else {
                return Some(Err(ProtocolError::InvalidUtf8));
            };
            let text = text.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }
            return Some(parse_line(text));
        }
    }

    /// Parse whatever is left after the stream ended without a trailing newline.
    pub fn finish(&mut self) -> Option<Result<SensorSample, ProtocolError>> {
        if self.discarding || !self.buffer.iter().any(|b| !b.is_ascii_whitespace()) {
            self.discarding = false;
            self.buffer.clear();
            return None;
        }
        self.buffer.push_back(b'\n');
        self.next_sample()
    }
}

impl Default for ProtocolParser {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_line(line: &str) -> Result<SensorSample, ProtocolError> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != FIELD_COUNT {
        return Err(ProtocolError::FieldCount(fields.len()));
    }

    let kind = parse_kind(fields[0])?;
    let timestamp_ns = fields[1]
        .parse::<i64>()
        .map_err(|_| ProtocolError::InvalidNumber(fields[1].to_string()))?;
    let f = |s: &str| -> Result<f32, ProtocolError> {
        s.parse::<f32>()
            .map_err(|_| ProtocolError::InvalidNumber(s.to_string()))
    };

    Ok(SensorSample {
        kind,
        timestamp_ns,
        values: Vec3::new(f(fields[2])?, f(fields[3])?, f(fields[4])?),
    })
}

fn parse_kind(tag: &str) -> Result<SensorKind, ProtocolError> {
    match tag.to_ascii_lowercase().as_str() {
        "g" | "gyro" => Ok(SensorKind::Gyroscope),
        "a" | "acc" => Ok(SensorKind::Accelerometer),
        "m" | "mag" => Ok(SensorKind::Magnetometer),
        _ => Err(ProtocolError::UnknownSensor(tag.to_string())),
    }
}
