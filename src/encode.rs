//! Encoding collaborator boundary.
//!
//! Symbol construction and Reed–Solomon coding are owned by an external
//! encoder; the renderers only ever see the finished [`BitMatrix`].

use qrcode::types::QrError;
use qrcode::{Color, QrCode};
use thiserror::Error;
use tracing::debug;

use crate::models::{BitMatrix, EcLevel};

/// Encoding failures surfaced as-is to the caller
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    /// Content does not fit any symbol at the chosen level
    #[error("content of {len} bytes is too long for error correction level {level}")]
    DataTooLong {
        /// Content length in bytes
        len: usize,
        /// Requested level
        level: EcLevel,
    },
    /// Any other encoder failure
    #[error("QR encode error: {0}")]
    Encoder(String),
}

/// Turns content into a QR module matrix
pub trait Encoder {
    /// Encode `content` at the given error correction level
    fn encode(&self, content: &str, level: EcLevel) -> Result<BitMatrix, EncodeError>;
}

/// [`Encoder`] backed by the `qrcode` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct QrcodeEncoder;

impl Encoder for QrcodeEncoder {
    fn encode(&self, content: &str, level: EcLevel) -> Result<BitMatrix, EncodeError> {
        let code = QrCode::with_error_correction_level(content.as_bytes(), to_qrcode_level(level))
            .map_err(|err| match err {
                QrError::DataTooLong => EncodeError::DataTooLong {
                    len: content.len(),
                    level,
                },
                other => EncodeError::Encoder(other.to_string()),
            })?;

        let width = code.width();
        let colors = code.to_colors();
        debug!(width, %level, "encoded QR matrix");
        Ok(BitMatrix::from_fn(width, width, |x, y| {
            colors[y * width + x] == Color::Dark
        }))
    }
}

fn to_qrcode_level(level: EcLevel) -> qrcode::EcLevel {
    match level {
        EcLevel::L => qrcode::EcLevel::L,
        EcLevel::M => qrcode::EcLevel::M,
        EcLevel::Q => qrcode::EcLevel::Q,
        EcLevel::H => qrcode::EcLevel::H,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_version1() {
        let matrix = QrcodeEncoder.encode("hello", EcLevel::L).unwrap();
        assert_eq!(matrix.width(), 21);
        assert_eq!(matrix.height(), 21);
        // Finder pattern corners are always dark
        assert!(matrix.get(0, 0));
        assert!(matrix.get(20, 0));
        assert!(matrix.get(0, 20));
        // Separator next to the top-left finder is always light
        assert!(!matrix.get(7, 0));
    }

    #[test]
    fn test_higher_level_needs_larger_symbol() {
        let content = "https://example.com/a/fairly/long/path?with=query&and=more";
        let low = QrcodeEncoder.encode(content, EcLevel::L).unwrap();
        let high = QrcodeEncoder.encode(content, EcLevel::H).unwrap();
        assert!(high.width() > low.width());
    }

    #[test]
    fn test_too_long() {
        let content = "x".repeat(4000);
        let err = QrcodeEncoder.encode(&content, EcLevel::H).unwrap_err();
        assert_eq!(
            err,
            EncodeError::DataTooLong {
                len: 4000,
                level: EcLevel::H
            }
        );
    }
}
