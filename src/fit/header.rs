//! FIT file preamble validation.

use super::FitDecodeError;

/// Decoded FIT file header.
///
/// The first byte of a FIT file declares the header's own size (12 bytes, or
/// 14 when a header CRC is appended). Bytes 8–11 must spell `.FIT`.
#[derive(Debug, Clone, Copy)]
pub struct FileHeader {
    pub header_size: u8,
    pub protocol_version: u8,
    pub profile_version: u16,
    pub data_size: u32,
}

impl FileHeader {
    /// Validate the preamble of `bytes` and return the decoded header.
    ///
    /// Any failure here is fatal for the whole file: a buffer shorter than 12
    /// bytes, a declared header size below 12, or a missing `.FIT` signature
    /// all mean the input is not FIT data.
    pub fn parse(bytes: &[u8]) -> Result<Self, FitDecodeError> {
        if bytes.len() < 12 {
            return Err(FitDecodeError::TruncatedHeader(bytes.len()));
        }

        if &bytes[8..12] != b".FIT" {
            return Err(FitDecodeError::NotFitData);
        }

        let header_size = bytes[0];
        if header_size < 12 {
            return Err(FitDecodeError::UnknownHeaderLength(header_size));
        }

        let profile_version = u16::from_le_bytes([bytes[2], bytes[3]]);
        let data_size = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);

        Ok(FileHeader {
            header_size,
            protocol_version: bytes[1],
            profile_version,
            data_size,
        })
    }

    /// Byte range of the message stream within the file buffer.
    ///
    /// A declared data size running past the end of the buffer is clamped;
    /// the stream decoder recovers whatever records fit in what is actually
    /// present.
    pub fn stream_span(&self, buffer_len: usize) -> std::ops::Range<usize> {
        let start = (self.header_size as usize).min(buffer_len);
        let end = (start + self.data_size as usize).min(buffer_len);
        start..end
    }
}
