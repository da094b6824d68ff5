use prost::Message;

use crate::opaque::Drive;
use crate::proto::{Ace, AceAction, AceMatch, BaseOsConfig, OsKeyTags, OsVerDetails, UuiDandVersion};
use crate::schema::{self, MessageDescriptor};

/// A prost message type backed by an entry in the static schema table.
pub trait SchemaMessage: Message + Default {
    fn descriptor() -> &'static MessageDescriptor;
}

macro_rules! schema_message {
    ($($ty:ty => $descriptor:path),* $(,)?) => {
        $(
            impl SchemaMessage for $ty {
                fn descriptor() -> &'static MessageDescriptor {
                    &$descriptor
                }
            }
        )*
    };
}

schema_message! {
    UuiDandVersion => schema::UUID_AND_VERSION,
    Drive => schema::DRIVE,
    OsKeyTags => schema::OS_KEY_TAGS,
    OsVerDetails => schema::OS_VER_DETAILS,
    BaseOsConfig => schema::BASE_OS_CONFIG,
    AceMatch => schema::ACE_MATCH,
    AceAction => schema::ACE_ACTION,
    Ace => schema::ACE,
}
