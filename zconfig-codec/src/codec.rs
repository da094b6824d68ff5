use tracing::debug;
use zconfig_core::schema::{self, MessageDescriptor};
use zconfig_core::SchemaMessage;

use crate::config::CodecConfig;
use crate::dynamic::{self, DynamicMessage};
use crate::errors::{DecodeError, JsonError, Result};
use crate::json;

/// Encoder/decoder for every message in the schema table.
///
/// A `Codec` only holds its configuration, so it is cheap to clone and safe to
/// share between threads; every operation is a pure function of its input.
#[derive(Debug, Clone, Default)]
pub struct Codec {
    config: CodecConfig,
}

impl Codec {
    /// Out-of-range bounds are clamped the way the `CodecConfig` builders do.
    pub fn new(config: CodecConfig) -> Self {
        let config = config
            .with_max_depth(config.max_depth)
            .with_max_message_size(config.max_message_size);
        Codec { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Encode a typed record. Only non-default scalars, present messages and
    /// non-empty repeated fields are emitted.
    pub fn encode<M: SchemaMessage>(&self, message: &M) -> Vec<u8> {
        message.encode_to_vec()
    }

    /// Decode a typed record.
    ///
    /// The bytes are first walked against the schema table, which enforces the
    /// size and depth bounds and reports failures with a precise reason. Typed
    /// records never keep unknown fields, whatever the configured policy.
    pub fn decode<M: SchemaMessage>(&self, bytes: &[u8]) -> Result<M> {
        let descriptor = M::descriptor();
        self.decode_dynamic(bytes, descriptor)?;
        M::decode(bytes).map_err(|err| {
            debug!("rejected {} payload of {} bytes: {}", descriptor.name, bytes.len(), err);
            DecodeError::from(err)
        })
    }

    /// Decode against a message named in the schema table, e.g. `"ACE"`.
    pub fn decode_named(&self, bytes: &[u8], name: &str) -> Result<DynamicMessage> {
        let descriptor = schema::find_message(name)
            .ok_or_else(|| DecodeError::UnknownSchema(name.to_string()))?;
        self.decode_dynamic(bytes, descriptor)
    }

    pub fn decode_dynamic(
        &self,
        bytes: &[u8],
        descriptor: &'static MessageDescriptor,
    ) -> Result<DynamicMessage> {
        if bytes.len() > self.config.max_message_size {
            let err = DecodeError::MessageTooLarge {
                size: bytes.len(),
                limit: self.config.max_message_size,
            };
            debug!("rejected {} payload: {}", descriptor.name, err);
            return Err(err);
        }
        dynamic::decode(bytes, descriptor, &self.config).map_err(|err| {
            debug!("rejected {} payload of {} bytes: {}", descriptor.name, bytes.len(), err);
            err
        })
    }

    pub fn encode_dynamic(&self, message: &DynamicMessage) -> Vec<u8> {
        message.encode_to_vec()
    }

    /// Schema-driven view of a typed record.
    pub fn to_dynamic<M: SchemaMessage>(&self, message: &M) -> Result<DynamicMessage> {
        self.decode_dynamic(&message.encode_to_vec(), M::descriptor())
    }

    /// Typed view of a schema-driven record of the same message type.
    pub fn from_dynamic<M: SchemaMessage>(&self, message: &DynamicMessage) -> Result<M> {
        let expected = M::descriptor();
        if message.descriptor() != expected {
            return Err(DecodeError::SchemaMismatch {
                expected: expected.name,
                found: message.descriptor().name,
            });
        }
        self.decode(&message.encode_to_vec())
    }

    pub fn to_json(&self, message: &DynamicMessage) -> serde_json::Value {
        json::to_json(message)
    }

    pub fn from_json(
        &self,
        value: &serde_json::Value,
        descriptor: &'static MessageDescriptor,
    ) -> std::result::Result<DynamicMessage, JsonError> {
        json::from_json(value, descriptor, &self.config)
    }
}
