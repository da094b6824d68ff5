use prost::encoding::WireType;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DecodeError>;

/// Why a byte sequence was rejected by the decoder.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("truncated input at offset {offset}: {needed} more bytes needed")]
    Truncated { offset: usize, needed: usize },

    #[error("invalid varint at offset {0}")]
    InvalidVarint(usize),

    #[error("invalid field number {number} at offset {offset}")]
    InvalidFieldNumber { offset: usize, number: u64 },

    #[error("invalid wire type {wire_type} at offset {offset}")]
    InvalidWireType { offset: usize, wire_type: u64 },

    #[error("{message}.{field}: expected wire type {expected:?}, found {found:?}")]
    WireTypeMismatch {
        message: &'static str,
        field: &'static str,
        expected: WireType,
        found: WireType,
    },

    #[error("{message}.{field}: invalid UTF-8 in string field")]
    InvalidUtf8 {
        message: &'static str,
        field: &'static str,
    },

    #[error("unbalanced group for field {number} at offset {offset}")]
    UnbalancedGroup { offset: usize, number: u32 },

    #[error("nesting depth exceeds limit of {0}")]
    DepthExceeded(usize),

    #[error("message of {size} bytes exceeds limit of {limit} bytes")]
    MessageTooLarge { size: usize, limit: usize },

    #[error("unknown schema: {0}")]
    UnknownSchema(String),

    #[error("record of type {found} cannot be read as {expected}")]
    SchemaMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("protobuf decode error: {0}")]
    Prost(#[from] prost::DecodeError),
}

/// Rejected update of a schema-driven record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("{message} has no field named {field}")]
    NoSuchField { message: &'static str, field: String },

    #[error("{message}.{field}: expected a {expected} value")]
    KindMismatch {
        message: &'static str,
        field: &'static str,
        expected: &'static str,
    },

    #[error("{message}.{field} is not a repeated field")]
    NotRepeated {
        message: &'static str,
        field: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum JsonError {
    #[error("{message}: expected a JSON object")]
    ExpectedObject { message: &'static str },

    #[error("{message} has no field named {field}")]
    UnknownField { message: &'static str, field: String },

    #[error("{message}.{field}: expected {expected}")]
    TypeMismatch {
        message: &'static str,
        field: &'static str,
        expected: &'static str,
    },

    #[error("{message}.{field}: value {value} is out of range")]
    OutOfRange {
        message: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("{message}.{field}: invalid base64 body")]
    InvalidBase64 {
        message: &'static str,
        field: &'static str,
    },

    #[error("{message}.{field}: invalid embedded body: {source}")]
    InvalidBody {
        message: &'static str,
        field: &'static str,
        #[source]
        source: DecodeError,
    },

    #[error("nesting depth exceeds limit of {0}")]
    DepthExceeded(usize),

    #[error(transparent)]
    Field(#[from] FieldError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid codec configuration: {0}")]
    Invalid(String),
}
