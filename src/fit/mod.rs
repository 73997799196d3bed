//! Decoding FIT activity files into running-biomechanics samples.
//!
//! The implementation follows the FIT file layout:
//!
//! * A header whose first byte declares its own size, followed by a 4-byte
//!   data payload length and the `.FIT` signature.
//! * A data section containing a stream of definition records and data
//!   records. Data records are keyed by the "local message number" declared
//!   in the most recent definition record with the same local ID.
//! * A trailing two-byte CRC, which this decoder does not validate.
//!
//! Only the header can fail the caller. Everything below it — unknown local
//! types, truncated messages, fields whose values fail their type or
//! plausibility checks — is absorbed: the stream decoder skips what it cannot
//! read and the output simply contains fewer records or fewer filled fields.

pub mod codec;
pub mod developer;
pub mod header;
pub mod record;
pub mod stream;
pub mod units;

use thiserror::Error;

pub use header::FileHeader;
pub use record::RunningDataPoint;
pub use stream::{DataMessage, DecodedMessage, MessageDecoder};

use record::PointAssembler;

/// Whole-file decode failures. All are header-level: once the header is
/// accepted, decoding always produces a (possibly empty) point sequence.
#[derive(Debug, Error)]
pub enum FitDecodeError {
    /// Fewer than the 12 mandatory header bytes.
    #[error("file too short for a FIT header ({0} bytes)")]
    TruncatedHeader(usize),
    /// Signature bytes 8–11 are not `.FIT`.
    #[error("incorrect file type marker")]
    NotFitData,
    /// The header claims a size below the 12-byte minimum.
    #[error("unknown header length ({0})")]
    UnknownHeaderLength(u8),
}

/// Decode a FIT buffer into its ordered sequence of running samples.
///
/// Record messages (global number 20) become [`RunningDataPoint`]s when they
/// carry a viable speed; all other message kinds are walked for stream
/// correctness, with field-description messages (206) feeding the
/// developer-field resolver along the way.
pub fn decode_running_points(bytes: &[u8]) -> Result<Vec<RunningDataPoint>, FitDecodeError> {
    let header = FileHeader::parse(bytes)?;
    let stream_bytes = &bytes[header.stream_span(bytes.len())];

    let mut decoder = MessageDecoder::new(stream_bytes);
    let mut assembler = PointAssembler::default();
    let mut record_messages = 0usize;
    let mut points = Vec::new();

    while let Some(message) = decoder.next_message() {
        let DecodedMessage::Data(data) = message else {
            continue;
        };
        if data.global_message_number != stream::RECORD_MESSAGE {
            continue;
        }
        record_messages += 1;
        if let Some(point) = assembler.assemble(&data) {
            points.push(point);
        }
    }

    tracing::debug!(
        record_messages,
        accepted = points.len(),
        resyncs = decoder.resync_count(),
        developer_metadata = decoder.has_developer_metadata(),
        "decoded FIT stream"
    );

    Ok(points)
}
