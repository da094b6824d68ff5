//! Schema codec for the zconfig device-configuration messages.
//!
//! Two ways in:
//! - typed prost records (`proto::Ace`, `proto::BaseOsConfig`, ...) through
//!   [`Codec::encode`] and [`Codec::decode`];
//! - schema-driven [`DynamicMessage`] records through [`Codec::decode_named`]
//!   and [`Codec::encode_dynamic`], which can also keep unknown fields when
//!   configured with [`UnknownFieldPolicy::Retain`].

mod codec;
pub use codec::Codec;

pub mod config;
pub use config::{CodecConfig, LoadCodecConfig, UnknownFieldPolicy};

mod dynamic;
pub use dynamic::{DynamicMessage, Value};

mod errors;
pub use errors::{ConfigError, DecodeError, FieldError, JsonError, Result};

pub mod json;

mod wire;
pub use wire::{UnknownField, UnknownValue};

pub use zconfig_core::{proto, schema, Drive, SchemaMessage};

/// Encode a typed record.
pub fn encode<M: SchemaMessage>(message: &M) -> Vec<u8> {
    message.encode_to_vec()
}

/// Decode a typed record with the default configuration.
pub fn decode<M: SchemaMessage>(bytes: &[u8]) -> Result<M> {
    Codec::default().decode(bytes)
}

/// Decode against a named schema with the default configuration.
pub fn decode_named(bytes: &[u8], name: &str) -> Result<DynamicMessage> {
    Codec::default().decode_named(bytes, name)
}
