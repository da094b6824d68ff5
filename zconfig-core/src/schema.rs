//! Static schema table for the zconfig message families.
//!
//! Every message the codec knows about is described here as plain `'static`
//! data: its name, and for each field the wire-contract field number, the
//! proto and JSON names, the value kind and whether it repeats. The table is
//! built at compile time, so lookups never touch shared mutable state.

use std::fmt;

use prost::encoding::WireType;

/// Smallest valid protobuf field number.
pub const MIN_FIELD_NUMBER: u32 = 1;
/// Largest valid protobuf field number (2^29 - 1).
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

/// Value kind of a declared field.
#[derive(Clone, Copy)]
pub enum FieldKind {
    Bool,
    Uint32,
    String,
    Message(&'static MessageDescriptor),
}

impl FieldKind {
    /// Wire type a single (unpacked) value of this kind is encoded with.
    pub fn wire_type(&self) -> WireType {
        match self {
            FieldKind::Bool | FieldKind::Uint32 => WireType::Varint,
            FieldKind::String | FieldKind::Message(_) => WireType::LengthDelimited,
        }
    }

    /// Repeated fields of packable kinds may arrive as a single packed entry.
    pub fn is_packable(&self) -> bool {
        matches!(self, FieldKind::Bool | FieldKind::Uint32)
    }

    /// Type name as written in a `.proto` file.
    pub fn proto_type(&self) -> &'static str {
        match self {
            FieldKind::Bool => "bool",
            FieldKind::Uint32 => "uint32",
            FieldKind::String => "string",
            FieldKind::Message(message) => message.name,
        }
    }
}

// Message kinds compare and print by name so self-referencing schemas stay finite.
impl PartialEq for FieldKind {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldKind::Bool, FieldKind::Bool)
            | (FieldKind::Uint32, FieldKind::Uint32)
            | (FieldKind::String, FieldKind::String) => true,
            (FieldKind::Message(a), FieldKind::Message(b)) => {
                std::ptr::eq(*a, *b) || a.name == b.name
            }
            _ => false,
        }
    }
}

impl Eq for FieldKind {}

impl fmt::Debug for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Bool => write!(f, "Bool"),
            FieldKind::Uint32 => write!(f, "Uint32"),
            FieldKind::String => write!(f, "String"),
            FieldKind::Message(message) => write!(f, "Message({})", message.name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Singular,
    Repeated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Wire-contract field number; never reassigned across schema versions.
    pub number: u32,
    /// Field name as declared in the `.proto` source.
    pub name: &'static str,
    /// Proto3 JSON name.
    pub json_name: &'static str,
    pub kind: FieldKind,
    pub label: Label,
}

impl FieldDescriptor {
    pub const fn singular(
        number: u32,
        name: &'static str,
        json_name: &'static str,
        kind: FieldKind,
    ) -> Self {
        Self {
            number,
            name,
            json_name,
            kind,
            label: Label::Singular,
        }
    }

    pub const fn repeated(
        number: u32,
        name: &'static str,
        json_name: &'static str,
        kind: FieldKind,
    ) -> Self {
        Self {
            number,
            name,
            json_name,
            kind,
            label: Label::Repeated,
        }
    }

    pub fn is_repeated(&self) -> bool {
        self.label == Label::Repeated
    }
}

#[derive(Debug, Eq)]
pub struct MessageDescriptor {
    pub name: &'static str,
    pub fields: &'static [FieldDescriptor],
    /// Opaque messages belong to another schema family; their bodies are
    /// carried verbatim instead of being interpreted field by field.
    pub opaque: bool,
}

impl MessageDescriptor {
    pub fn field(&self, number: u32) -> Option<&'static FieldDescriptor> {
        self.fields.iter().find(|field| field.number == number)
    }

    /// Looks a field up by its proto name or its JSON name.
    pub fn field_by_name(&self, name: &str) -> Option<&'static FieldDescriptor> {
        self.fields
            .iter()
            .find(|field| field.name == name || field.json_name == name)
    }
}

impl PartialEq for MessageDescriptor {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
            || (self.name == other.name
                && self.opaque == other.opaque
                && self.fields == other.fields)
    }
}

impl fmt::Display for MessageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A `.proto` source file and the messages it declares.
#[derive(Debug)]
pub struct FileDescriptor {
    pub name: &'static str,
    pub imports: &'static [&'static str],
    pub java_package: Option<&'static str>,
    pub go_package: Option<&'static str>,
    pub messages: &'static [&'static MessageDescriptor],
}

impl FileDescriptor {
    /// Render the proto3 source this file was declared from.
    pub fn to_proto_source(&self) -> String {
        let mut out = String::from("syntax = \"proto3\";\n");

        if !self.imports.is_empty() {
            out.push('\n');
            for import in self.imports {
                out.push_str(&format!("import \"{import}\";\n"));
            }
        }

        if self.java_package.is_some() || self.go_package.is_some() {
            out.push('\n');
            if let Some(java_package) = self.java_package {
                out.push_str(&format!("option java_package = \"{java_package}\";\n"));
            }
            if let Some(go_package) = self.go_package {
                out.push_str(&format!("option go_package = \"{go_package}\";\n"));
            }
        }

        for message in self.messages {
            out.push('\n');
            if message.fields.is_empty() {
                out.push_str(&format!("message {} {{}}\n", message.name));
                continue;
            }
            out.push_str(&format!("message {} {{\n", message.name));
            for field in message.fields {
                let label = if field.is_repeated() { "repeated " } else { "" };
                out.push_str(&format!(
                    "  {label}{} {} = {};\n",
                    field.kind.proto_type(),
                    field.name,
                    field.number
                ));
            }
            out.push_str("}\n");
        }

        out
    }
}

const JAVA_PACKAGE: &str = "com.zededa.cloud.uservice.proto";
const GO_PACKAGE: &str = "github.com/zededa/eve/sdk/go/zconfig";

// ---- devcommon.proto ----

pub static UUID_AND_VERSION: MessageDescriptor = MessageDescriptor {
    name: "UUIDandVersion",
    fields: &[
        FieldDescriptor::singular(1, "uuid", "uuid", FieldKind::String),
        FieldDescriptor::singular(2, "version", "version", FieldKind::String),
    ],
    opaque: false,
};

pub static DEVCOMMON_FILE: FileDescriptor = FileDescriptor {
    name: "devcommon.proto",
    imports: &[],
    java_package: Some(JAVA_PACKAGE),
    go_package: Some(GO_PACKAGE),
    messages: &[&UUID_AND_VERSION],
};

// ---- storage.proto ----

pub static DRIVE: MessageDescriptor = MessageDescriptor {
    name: "Drive",
    fields: &[],
    opaque: true,
};

pub static STORAGE_FILE: FileDescriptor = FileDescriptor {
    name: "storage.proto",
    imports: &[],
    java_package: Some(JAVA_PACKAGE),
    go_package: Some(GO_PACKAGE),
    messages: &[&DRIVE],
};

// ---- baseosconfig.proto ----

pub static OS_KEY_TAGS: MessageDescriptor = MessageDescriptor {
    name: "OSKeyTags",
    fields: &[
        FieldDescriptor::singular(1, "OSVerKey", "OSVerKey", FieldKind::String),
        FieldDescriptor::singular(2, "OSVerValue", "OSVerValue", FieldKind::String),
    ],
    opaque: false,
};

pub static OS_VER_DETAILS: MessageDescriptor = MessageDescriptor {
    name: "OSVerDetails",
    fields: &[FieldDescriptor::repeated(
        12,
        "baseOSParams",
        "baseOSParams",
        FieldKind::Message(&OS_KEY_TAGS),
    )],
    opaque: false,
};

pub static BASE_OS_CONFIG: MessageDescriptor = MessageDescriptor {
    name: "BaseOSConfig",
    fields: &[
        FieldDescriptor::singular(
            1,
            "uuidandversion",
            "uuidandversion",
            FieldKind::Message(&UUID_AND_VERSION),
        ),
        FieldDescriptor::repeated(3, "drives", "drives", FieldKind::Message(&DRIVE)),
        FieldDescriptor::singular(4, "activate", "activate", FieldKind::Bool),
        FieldDescriptor::singular(10, "baseOSVersion", "baseOSVersion", FieldKind::String),
        FieldDescriptor::singular(
            11,
            "baseOSDetails",
            "baseOSDetails",
            FieldKind::Message(&OS_VER_DETAILS),
        ),
    ],
    opaque: false,
};

pub static BASEOSCONFIG_FILE: FileDescriptor = FileDescriptor {
    name: "baseosconfig.proto",
    imports: &["devcommon.proto", "storage.proto"],
    java_package: Some(JAVA_PACKAGE),
    go_package: Some(GO_PACKAGE),
    messages: &[&OS_KEY_TAGS, &OS_VER_DETAILS, &BASE_OS_CONFIG],
};

// ---- fw.proto ----

pub static ACE_MATCH: MessageDescriptor = MessageDescriptor {
    name: "ACEMatch",
    fields: &[
        FieldDescriptor::singular(1, "type", "type", FieldKind::String),
        FieldDescriptor::singular(2, "value", "value", FieldKind::String),
    ],
    opaque: false,
};

pub static ACE_ACTION: MessageDescriptor = MessageDescriptor {
    name: "ACEAction",
    fields: &[
        FieldDescriptor::singular(1, "drop", "drop", FieldKind::Bool),
        FieldDescriptor::singular(2, "limit", "limit", FieldKind::Bool),
        FieldDescriptor::singular(3, "limitrate", "limitrate", FieldKind::Uint32),
        FieldDescriptor::singular(4, "limitunit", "limitunit", FieldKind::String),
        FieldDescriptor::singular(5, "limitburst", "limitburst", FieldKind::Uint32),
        FieldDescriptor::singular(6, "portmap", "portmap", FieldKind::Bool),
        FieldDescriptor::singular(7, "appPort", "appPort", FieldKind::Uint32),
    ],
    opaque: false,
};

pub static ACE: MessageDescriptor = MessageDescriptor {
    name: "ACE",
    fields: &[
        FieldDescriptor::repeated(1, "matches", "matches", FieldKind::Message(&ACE_MATCH)),
        FieldDescriptor::repeated(2, "actions", "actions", FieldKind::Message(&ACE_ACTION)),
    ],
    opaque: false,
};

pub static FW_FILE: FileDescriptor = FileDescriptor {
    name: "fw.proto",
    imports: &[],
    java_package: Some(JAVA_PACKAGE),
    go_package: Some(GO_PACKAGE),
    messages: &[&ACE_MATCH, &ACE_ACTION, &ACE],
};

/// Every schema file known to the codec.
pub static FILES: &[&FileDescriptor] = &[
    &DEVCOMMON_FILE,
    &STORAGE_FILE,
    &BASEOSCONFIG_FILE,
    &FW_FILE,
];

/// All declared messages, file by file in declaration order.
pub fn messages() -> impl Iterator<Item = &'static MessageDescriptor> {
    FILES.iter().flat_map(|file| file.messages.iter().copied())
}

/// Find a message by name. A leading `.` (fully qualified, empty package) is accepted.
pub fn find_message(name: &str) -> Option<&'static MessageDescriptor> {
    let name = name.strip_prefix('.').unwrap_or(name);
    messages().find(|message| message.name == name)
}

pub fn find_file(name: &str) -> Option<&'static FileDescriptor> {
    FILES.iter().copied().find(|file| file.name == name)
}
