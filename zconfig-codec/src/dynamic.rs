//! Schema-driven records.
//!
//! A `DynamicMessage` is decoded and encoded purely from a `MessageDescriptor`
//! of the static schema table. Scalars holding their proto3 zero-value are
//! never stored, so a field set to its default and an unset field compare
//! equal; message-typed fields keep their presence.

use std::collections::BTreeMap;

use prost::encoding::{encode_varint, WireType};
use tracing::trace;
use zconfig_core::schema::{FieldDescriptor, FieldKind, MessageDescriptor};

use crate::config::{CodecConfig, UnknownFieldPolicy};
use crate::errors::{DecodeError, FieldError, Result};
use crate::wire::{self, UnknownField, WireReader};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    U32(u32),
    String(String),
    Message(DynamicMessage),
    /// Elements of a repeated field, in wire order.
    List(Vec<Value>),
}

impl Value {
    fn is_default(&self) -> bool {
        match self {
            Value::Bool(value) => !value,
            Value::U32(value) => *value == 0,
            Value::String(value) => value.is_empty(),
            Value::Message(_) => false,
            Value::List(values) => values.is_empty(),
        }
    }

    fn matches(&self, kind: FieldKind) -> bool {
        match (kind, self) {
            (FieldKind::Bool, Value::Bool(_))
            | (FieldKind::Uint32, Value::U32(_))
            | (FieldKind::String, Value::String(_)) => true,
            (FieldKind::Message(expected), Value::Message(message)) => {
                message.descriptor() == expected
            }
            _ => false,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Value::U32(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_message(&self) -> Option<&DynamicMessage> {
        match self {
            Value::Message(message) => Some(message),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(values) => Some(values),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::U32(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<DynamicMessage> for Value {
    fn from(value: DynamicMessage) -> Self {
        Value::Message(value)
    }
}

/// A record of any message in the schema table.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicMessage {
    descriptor: &'static MessageDescriptor,
    // keyed by field number, so encoding follows field-number order
    fields: BTreeMap<u32, Value>,
    unknown: Vec<UnknownField>,
}

impl DynamicMessage {
    pub fn new(descriptor: &'static MessageDescriptor) -> Self {
        DynamicMessage {
            descriptor,
            fields: BTreeMap::new(),
            unknown: Vec::new(),
        }
    }

    pub fn descriptor(&self) -> &'static MessageDescriptor {
        self.descriptor
    }

    /// Value of a field by proto or JSON name; `None` when the field is unset.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let field = self.descriptor.field_by_name(name)?;
        self.fields.get(&field.number)
    }

    pub fn get_by_number(&self, number: u32) -> Option<&Value> {
        self.fields.get(&number)
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Set a field. Repeated fields take a `Value::List`; setting a scalar to
    /// its zero-value or a repeated field to an empty list clears it.
    pub fn set(
        &mut self,
        name: &str,
        value: impl Into<Value>,
    ) -> std::result::Result<(), FieldError> {
        let field = self.lookup(name)?;
        let value = value.into();

        let valid = match (&value, field.is_repeated()) {
            (Value::List(values), true) => values.iter().all(|element| element.matches(field.kind)),
            (Value::List(_), false) | (_, true) => false,
            (value, false) => value.matches(field.kind),
        };
        if !valid {
            return Err(self.kind_mismatch(field));
        }

        if value.is_default() {
            self.fields.remove(&field.number);
        } else {
            self.fields.insert(field.number, value);
        }
        Ok(())
    }

    /// Builder form of [`DynamicMessage::set`].
    pub fn with(
        mut self,
        name: &str,
        value: impl Into<Value>,
    ) -> std::result::Result<Self, FieldError> {
        self.set(name, value)?;
        Ok(self)
    }

    /// Append one element to a repeated field.
    pub fn push(
        &mut self,
        name: &str,
        value: impl Into<Value>,
    ) -> std::result::Result<(), FieldError> {
        let field = self.lookup(name)?;
        if !field.is_repeated() {
            return Err(FieldError::NotRepeated {
                message: self.descriptor.name,
                field: field.name,
            });
        }
        let value = value.into();
        if !value.matches(field.kind) {
            return Err(self.kind_mismatch(field));
        }
        self.append(field.number, value);
        Ok(())
    }

    pub fn clear_field(&mut self, name: &str) -> std::result::Result<(), FieldError> {
        let field = self.lookup(name)?;
        self.fields.remove(&field.number);
        Ok(())
    }

    /// Set fields with their descriptors, in field-number order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static FieldDescriptor, &Value)> + '_ {
        self.fields.iter().filter_map(|(number, value)| {
            self.descriptor.field(*number).map(|field| (field, value))
        })
    }

    /// Fields kept because they are not in the schema table, in wire order.
    pub fn unknown_fields(&self) -> &[UnknownField] {
        &self.unknown
    }

    /// True when the record would encode to an empty byte sequence.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.unknown.is_empty()
    }

    pub fn encode_to_vec(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode(&mut buf);
        buf
    }

    pub(crate) fn encode(&self, buf: &mut Vec<u8>) {
        for (field, value) in self.fields() {
            match value {
                // proto3 packs repeated scalars
                Value::List(values) if field.kind.is_packable() => {
                    let mut packed = Vec::new();
                    for element in values {
                        encode_packed_element(element, &mut packed);
                    }
                    wire::write_bytes_field(field.number, &packed, buf);
                }
                value => encode_value(field.number, value, buf),
            }
        }
        for unknown in &self.unknown {
            unknown.encode(buf);
        }
    }

    fn lookup(&self, name: &str) -> std::result::Result<&'static FieldDescriptor, FieldError> {
        self.descriptor
            .field_by_name(name)
            .ok_or_else(|| FieldError::NoSuchField {
                message: self.descriptor.name,
                field: name.to_string(),
            })
    }

    fn kind_mismatch(&self, field: &'static FieldDescriptor) -> FieldError {
        FieldError::KindMismatch {
            message: self.descriptor.name,
            field: field.name,
            expected: field.kind.proto_type(),
        }
    }

    fn append(&mut self, number: u32, value: Value) {
        match self.fields.get_mut(&number) {
            Some(Value::List(values)) => values.push(value),
            _ => {
                self.fields.insert(number, Value::List(vec![value]));
            }
        }
    }

    // Scalar occurrence on the wire: last one wins, zero clears.
    fn store_scalar(&mut self, field: &FieldDescriptor, value: Value) {
        if field.is_repeated() {
            self.append(field.number, value);
        } else if value.is_default() {
            self.fields.remove(&field.number);
        } else {
            self.fields.insert(field.number, value);
        }
    }
}

fn encode_value(number: u32, value: &Value, buf: &mut Vec<u8>) {
    match value {
        Value::Bool(value) => wire::write_varint_field(number, u64::from(*value), buf),
        Value::U32(value) => wire::write_varint_field(number, u64::from(*value), buf),
        Value::String(value) => wire::write_bytes_field(number, value.as_bytes(), buf),
        Value::Message(message) => wire::write_bytes_field(number, &message.encode_to_vec(), buf),
        Value::List(values) => {
            for element in values {
                encode_value(number, element, buf);
            }
        }
    }
}

fn encode_packed_element(value: &Value, buf: &mut Vec<u8>) {
    match value {
        Value::Bool(value) => encode_varint(u64::from(*value), buf),
        Value::U32(value) => encode_varint(u64::from(*value), buf),
        _ => {}
    }
}

/// Decode a complete top-level message. Nothing is returned unless every
/// byte was accepted.
pub(crate) fn decode(
    bytes: &[u8],
    descriptor: &'static MessageDescriptor,
    config: &CodecConfig,
) -> Result<DynamicMessage> {
    let mut message = DynamicMessage::new(descriptor);
    decode_into(&mut WireReader::new(bytes), &mut message, 0, config)?;
    Ok(message)
}

fn decode_into(
    reader: &mut WireReader<'_>,
    message: &mut DynamicMessage,
    depth: usize,
    config: &CodecConfig,
) -> Result<()> {
    let descriptor = message.descriptor;
    while !reader.is_empty() {
        let key_start = reader.offset();
        let (number, wire_type) = reader.read_key()?;
        match descriptor.field(number) {
            Some(field) => decode_field(reader, message, field, wire_type, depth, config)?,
            None => {
                let value = reader.read_unknown(number, wire_type, depth, config.max_depth)?;
                // opaque bodies are made only of fields the table does not declare
                if descriptor.opaque || config.unknown_fields == UnknownFieldPolicy::Retain {
                    trace!("retaining unknown field {} of {}", number, descriptor.name);
                    let raw = reader.consumed_since(key_start);
                    message.unknown.push(UnknownField::from_wire(number, value, raw));
                } else {
                    trace!("skipping unknown field {} of {}", number, descriptor.name);
                }
            }
        }
    }
    Ok(())
}

fn decode_field(
    reader: &mut WireReader<'_>,
    message: &mut DynamicMessage,
    field: &'static FieldDescriptor,
    wire_type: WireType,
    depth: usize,
    config: &CodecConfig,
) -> Result<()> {
    if field.is_repeated() && field.kind.is_packable() && wire_type == WireType::LengthDelimited {
        let mut packed = WireReader::new(reader.read_bytes()?);
        while !packed.is_empty() {
            let value = read_varint_scalar(&mut packed, field.kind)?;
            message.append(field.number, value);
        }
        return Ok(());
    }

    let expected = field.kind.wire_type();
    if wire_type != expected {
        return Err(DecodeError::WireTypeMismatch {
            message: message.descriptor.name,
            field: field.name,
            expected,
            found: wire_type,
        });
    }

    match field.kind {
        FieldKind::Bool | FieldKind::Uint32 => {
            let value = read_varint_scalar(reader, field.kind)?;
            message.store_scalar(field, value);
        }
        FieldKind::String => {
            let bytes = reader.read_bytes()?;
            let value = std::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8 {
                message: message.descriptor.name,
                field: field.name,
            })?;
            message.store_scalar(field, Value::String(value.to_string()));
        }
        FieldKind::Message(nested) => {
            let payload = reader.read_bytes()?;
            if depth + 1 > config.max_depth {
                return Err(DecodeError::DepthExceeded(config.max_depth));
            }
            let mut inner = WireReader::new(payload);
            if field.is_repeated() {
                let mut element = DynamicMessage::new(nested);
                decode_into(&mut inner, &mut element, depth + 1, config)?;
                message.append(field.number, Value::Message(element));
            } else {
                // a singular message seen again is merged into the earlier one
                let mut element = match message.fields.remove(&field.number) {
                    Some(Value::Message(existing)) => existing,
                    _ => DynamicMessage::new(nested),
                };
                decode_into(&mut inner, &mut element, depth + 1, config)?;
                message.fields.insert(field.number, Value::Message(element));
            }
        }
    }
    Ok(())
}

fn read_varint_scalar(reader: &mut WireReader<'_>, kind: FieldKind) -> Result<Value> {
    let raw = reader.read_varint()?;
    Ok(match kind {
        FieldKind::Bool => Value::Bool(raw != 0),
        // uint32 keeps the low 32 bits of the varint
        _ => Value::U32(raw as u32),
    })
}
