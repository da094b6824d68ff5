pub mod message;
pub mod opaque;
pub mod schema;

/// prost bindings generated from `proto/` (see `build.rs`).
pub mod proto {
    include!("proto/zconfig.rs");
}

pub use message::SchemaMessage;
pub use opaque::Drive;
