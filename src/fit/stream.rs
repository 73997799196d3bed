//! The stateful walk over the FIT message stream.
//!
//! A FIT data section is a sequence of records of two kinds. Definition
//! records declare the schema for a small "local message type" (0–15); data
//! records reference that schema by the same number. Local types are reused:
//! a later definition for the same number silently replaces the earlier one,
//! so decoding is a single forward pass carrying a mutable table.
//!
//! The walk is best-effort. A message that cannot be decoded (unknown local
//! type, offset running past the buffer) contributes nothing; the decoder
//! backs up to the byte after the failed message's header and resumes
//! scanning. Recovering most of a damaged file beats rejecting all of it.

use std::collections::HashMap;

use super::codec;
use super::developer::DeveloperFieldRegistry;

/// Global message number of record (sample) messages.
pub const RECORD_MESSAGE: u16 = 20;
/// Global message number of developer field-description messages.
pub const FIELD_DESCRIPTION_MESSAGE: u16 = 206;
/// Global message number of developer-data-id messages. These announce an
/// application for a developer index; field descriptions already carry the
/// index, so nothing from them feeds resolution.
pub const DEVELOPER_DATA_ID_MESSAGE: u16 = 207;

#[derive(Debug, Clone)]
pub struct FieldDefinition {
    pub field_def_num: u8,
    pub byte_size: u8,
    pub base_type: u8,
}

#[derive(Debug, Clone)]
pub struct DevFieldDefinition {
    pub field_slot: u8,
    pub byte_size: u8,
    pub developer_data_index: u8,
}

/// Schema for one local message type, valid until redefined.
#[derive(Debug, Clone)]
pub struct MessageDefinition {
    pub global_message_number: u16,
    pub little_endian: bool,
    pub fields: Vec<FieldDefinition>,
    pub dev_fields: Vec<DevFieldDefinition>,
}

impl MessageDefinition {
    /// Total payload size of a data message using this definition.
    pub fn byte_size(&self) -> usize {
        self.fields.iter().map(|f| f.byte_size as usize).sum::<usize>()
            + self.dev_fields.iter().map(|f| f.byte_size as usize).sum::<usize>()
    }
}

/// One decoded data message.
///
/// Native fields are keyed by their profile field number; developer fields by
/// the name the resolver assigned them. Keeping the two namespaces apart lets
/// the assembler state its vendor preferences explicitly.
#[derive(Debug, Default)]
pub struct DataMessage {
    pub global_message_number: u16,
    pub fields: HashMap<u8, f64>,
    pub dev_fields: HashMap<String, f64>,
}

#[derive(Debug)]
pub enum DecodedMessage {
    Definition { local_type: u8 },
    Data(DataMessage),
}

/// Marker for a per-message decode failure; the walk resumes one byte past
/// the failed message's header.
struct Resync;

/// Single-pass decoder over a FIT data section.
///
/// Owns the definition table and the developer-field registry for one parse,
/// so concurrent decodes of independent buffers never share state.
pub struct MessageDecoder<'a> {
    buf: &'a [u8],
    offset: usize,
    definitions: HashMap<u8, MessageDefinition>,
    registry: DeveloperFieldRegistry,
    resyncs: usize,
}

impl<'a> MessageDecoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        MessageDecoder {
            buf,
            offset: 0,
            definitions: HashMap::new(),
            registry: DeveloperFieldRegistry::default(),
            resyncs: 0,
        }
    }

    /// Decode the next message, skipping over undecodable bytes.
    pub fn next_message(&mut self) -> Option<DecodedMessage> {
        while self.offset < self.buf.len() {
            let start = self.offset;
            match self.decode_one() {
                Ok(message) => return Some(message),
                Err(Resync) => {
                    self.offset = start + 1;
                    self.resyncs += 1;
                    tracing::debug!(offset = start, "skipping undecodable message byte");
                }
            }
        }
        None
    }

    /// Number of one-byte skips performed so far.
    pub fn resync_count(&self) -> usize {
        self.resyncs
    }

    /// Whether any field-description message has named a developer field,
    /// i.e. whether developer resolution ran on metadata or on the
    /// range heuristic alone.
    pub fn has_developer_metadata(&self) -> bool {
        self.registry.has_metadata()
    }

    fn decode_one(&mut self) -> Result<DecodedMessage, Resync> {
        let header = self.take(1)?[0];

        if header & 0x80 != 0 {
            // Compressed-timestamp header: always a data message, with a
            // 2-bit local type. The 5-bit time delta is discarded; records
            // carry a full timestamp field that supersedes it.
            let local_type = (header >> 5) & 0x03;
            return self.decode_data(local_type).map(DecodedMessage::Data);
        }

        let local_type = header & 0x0F;
        if header & 0x40 != 0 {
            let has_dev_fields = header & 0x20 != 0;
            self.decode_definition(local_type, has_dev_fields)?;
            Ok(DecodedMessage::Definition { local_type })
        } else {
            self.decode_data(local_type).map(DecodedMessage::Data)
        }
    }

    fn decode_definition(&mut self, local_type: u8, has_dev_fields: bool) -> Result<(), Resync> {
        let fixed = self.take(5)?;
        let little_endian = fixed[1] == 0;
        let global_bytes = [fixed[2], fixed[3]];
        let global_message_number = if little_endian {
            u16::from_le_bytes(global_bytes)
        } else {
            u16::from_be_bytes(global_bytes)
        };
        let field_count = fixed[4] as usize;

        let mut fields = Vec::with_capacity(field_count);
        for _ in 0..field_count {
            let triple = self.take(3)?;
            fields.push(FieldDefinition {
                field_def_num: triple[0],
                byte_size: triple[1],
                base_type: triple[2],
            });
        }

        let mut dev_fields = Vec::new();
        if has_dev_fields {
            let dev_count = self.take(1)?[0] as usize;
            dev_fields.reserve(dev_count);
            for _ in 0..dev_count {
                let triple = self.take(3)?;
                dev_fields.push(DevFieldDefinition {
                    field_slot: triple[0],
                    byte_size: triple[1],
                    developer_data_index: triple[2],
                });
            }
        }

        // A later definition for the same local type replaces the earlier
        // one; that reuse is part of the format, not a malformation.
        self.definitions.insert(
            local_type,
            MessageDefinition {
                global_message_number,
                little_endian,
                fields,
                dev_fields,
            },
        );
        Ok(())
    }

    fn decode_data(&mut self, local_type: u8) -> Result<DataMessage, Resync> {
        // A data message referencing a never-defined local type cannot be
        // sized, let alone decoded.
        let definition = self.definitions.get(&local_type).ok_or(Resync)?.clone();

        if self.offset + definition.byte_size() > self.buf.len() {
            return Err(Resync);
        }

        let mut message = DataMessage {
            global_message_number: definition.global_message_number,
            ..DataMessage::default()
        };
        let mut raw_spans = Vec::new();

        for field in &definition.fields {
            let size = field.byte_size as usize;
            raw_spans.push((field.field_def_num, self.offset..self.offset + size));
            if let Some(value) = codec::read_value(
                self.buf,
                self.offset,
                field.byte_size,
                field.base_type,
                definition.little_endian,
            ) {
                message.fields.insert(field.field_def_num, value);
            }
            // The cursor advances by the declared size whether or not a
            // value came out, keeping sibling offsets correct.
            self.offset += size;
        }

        for dev_field in &definition.dev_fields {
            let base_type = self
                .registry
                .base_type_hint(dev_field.developer_data_index, dev_field.field_slot)
                .unwrap_or_else(|| base_type_for_size(dev_field.byte_size));
            if let Some(value) = codec::read_value(
                self.buf,
                self.offset,
                dev_field.byte_size,
                base_type,
                definition.little_endian,
            ) {
                let name = self.registry.resolve(
                    dev_field.developer_data_index,
                    dev_field.field_slot,
                    value,
                );
                message.dev_fields.insert(name, value);
            }
            self.offset += dev_field.byte_size as usize;
        }

        if message.global_message_number == FIELD_DESCRIPTION_MESSAGE {
            self.ingest_field_description(&raw_spans);
        }

        Ok(message)
    }

    fn ingest_field_description(&mut self, raw_spans: &[(u8, std::ops::Range<usize>)]) {
        let buf = self.buf;
        self.registry.ingest_description(
            raw_spans
                .iter()
                .map(|(field_def_num, span)| (*field_def_num, &buf[span.clone()])),
        );
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], Resync> {
        let bytes = self.buf.get(self.offset..self.offset + n).ok_or(Resync)?;
        self.offset += n;
        Ok(bytes)
    }
}

/// Developer slots declare a size but no type. Without a description
/// message's hint, read the widths a Stryd field can occupy.
fn base_type_for_size(byte_size: u8) -> u8 {
    match byte_size {
        1 => 0x02, // uint8
        2 => 0x84, // uint16
        4 => 0x88, // float32
        8 => 0x89, // float64
        _ => 0x0D, // opaque; codec yields absent
    }
}
