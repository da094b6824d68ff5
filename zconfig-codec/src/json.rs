//! Proto3 JSON mapping for schema-driven records.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{Map, Number, Value as JsonValue};
use zconfig_core::schema::{FieldDescriptor, FieldKind, MessageDescriptor};

use crate::config::CodecConfig;
use crate::dynamic::{self, DynamicMessage, Value};
use crate::errors::JsonError;

/// Render a record with proto3 JSON names. Unset fields are omitted, opaque
/// messages become the base64 of their body and retained unknown fields are
/// not rendered.
pub fn to_json(message: &DynamicMessage) -> JsonValue {
    if message.descriptor().opaque {
        return JsonValue::String(STANDARD.encode(message.encode_to_vec()));
    }
    let mut object = Map::new();
    for (field, value) in message.fields() {
        object.insert(field.json_name.to_string(), value_to_json(value));
    }
    JsonValue::Object(object)
}

fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Bool(value) => JsonValue::Bool(*value),
        Value::U32(value) => JsonValue::Number(Number::from(*value)),
        Value::String(value) => JsonValue::String(value.clone()),
        Value::Message(message) => to_json(message),
        Value::List(values) => JsonValue::Array(values.iter().map(value_to_json).collect()),
    }
}

/// Build a record from its JSON form. Keys may use proto or JSON names and
/// `null` leaves a field unset.
pub fn from_json(
    value: &JsonValue,
    descriptor: &'static MessageDescriptor,
    config: &CodecConfig,
) -> Result<DynamicMessage, JsonError> {
    if descriptor.opaque {
        return opaque_from_json(value, descriptor, descriptor.name, "body", config);
    }
    message_from_json(value, descriptor, 0, config)
}

fn message_from_json(
    value: &JsonValue,
    descriptor: &'static MessageDescriptor,
    depth: usize,
    config: &CodecConfig,
) -> Result<DynamicMessage, JsonError> {
    if depth > config.max_depth {
        return Err(JsonError::DepthExceeded(config.max_depth));
    }
    let JsonValue::Object(object) = value else {
        return Err(JsonError::ExpectedObject {
            message: descriptor.name,
        });
    };

    let mut message = DynamicMessage::new(descriptor);
    for (key, item) in object {
        let field = descriptor
            .field_by_name(key)
            .ok_or_else(|| JsonError::UnknownField {
                message: descriptor.name,
                field: key.clone(),
            })?;
        if item.is_null() {
            continue;
        }

        if field.is_repeated() {
            let JsonValue::Array(items) = item else {
                return Err(type_mismatch(descriptor, field, "an array"));
            };
            for element in items {
                let value = field_value_from_json(element, descriptor, field, depth, config)?;
                message.push(field.name, value)?;
            }
        } else {
            let value = field_value_from_json(item, descriptor, field, depth, config)?;
            message.set(field.name, value)?;
        }
    }
    Ok(message)
}

fn field_value_from_json(
    item: &JsonValue,
    descriptor: &'static MessageDescriptor,
    field: &'static FieldDescriptor,
    depth: usize,
    config: &CodecConfig,
) -> Result<Value, JsonError> {
    match field.kind {
        FieldKind::Bool => item
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| type_mismatch(descriptor, field, "a boolean")),
        FieldKind::Uint32 => uint32_from_json(item, descriptor, field).map(Value::U32),
        FieldKind::String => item
            .as_str()
            .map(Value::from)
            .ok_or_else(|| type_mismatch(descriptor, field, "a string")),
        FieldKind::Message(nested) if nested.opaque => {
            if depth + 1 > config.max_depth {
                return Err(JsonError::DepthExceeded(config.max_depth));
            }
            opaque_from_json(item, nested, descriptor.name, field.name, config)
                .map(Value::Message)
        }
        FieldKind::Message(nested) => {
            message_from_json(item, nested, depth + 1, config).map(Value::Message)
        }
    }
}

// proto3 JSON accepts uint32 both as a number and as a decimal string
fn uint32_from_json(
    item: &JsonValue,
    descriptor: &'static MessageDescriptor,
    field: &'static FieldDescriptor,
) -> Result<u32, JsonError> {
    let out_of_range = |value: String| JsonError::OutOfRange {
        message: descriptor.name,
        field: field.name,
        value,
    };
    match item {
        JsonValue::Number(number) => {
            if let Some(value) = number.as_u64() {
                return u32::try_from(value).map_err(|_| out_of_range(number.to_string()));
            }
            // integral floats such as `100.0` are accepted as well
            match number.as_f64() {
                Some(value) if value.fract() != 0.0 => {
                    Err(type_mismatch(descriptor, field, "an unsigned integer"))
                }
                Some(value) if (0.0..=f64::from(u32::MAX)).contains(&value) => Ok(value as u32),
                _ => Err(out_of_range(number.to_string())),
            }
        }
        JsonValue::String(text) => match text.parse::<u32>() {
            Ok(value) => Ok(value),
            Err(_) if text.parse::<i128>().is_ok() => Err(out_of_range(text.clone())),
            Err(_) => Err(type_mismatch(descriptor, field, "an unsigned integer")),
        },
        _ => Err(type_mismatch(descriptor, field, "an unsigned integer")),
    }
}

fn opaque_from_json(
    item: &JsonValue,
    nested: &'static MessageDescriptor,
    owner: &'static str,
    field: &'static str,
    config: &CodecConfig,
) -> Result<DynamicMessage, JsonError> {
    let encoded = item.as_str().ok_or(JsonError::TypeMismatch {
        message: owner,
        field,
        expected: "a base64 string",
    })?;
    let body = STANDARD.decode(encoded).map_err(|_| JsonError::InvalidBase64 {
        message: owner,
        field,
    })?;
    dynamic::decode(&body, nested, config).map_err(|source| JsonError::InvalidBody {
        message: owner,
        field,
        source,
    })
}

fn type_mismatch(
    descriptor: &'static MessageDescriptor,
    field: &'static FieldDescriptor,
    expected: &'static str,
) -> JsonError {
    JsonError::TypeMismatch {
        message: descriptor.name,
        field: field.name,
        expected,
    }
}
