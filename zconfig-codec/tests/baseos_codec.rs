//! Base OS Codec Tests
//!
//! Tests the base OS configuration family (BaseOSConfig, OSVerDetails, OSKeyTags):
//! - The external UUIDandVersion record nests like any declared message
//! - Absent and present-but-empty messages stay distinguishable
//! - Opaque Drive bodies are carried byte for byte on every path

use zconfig_codec::proto::{BaseOsConfig, OsKeyTags, OsVerDetails, UuiDandVersion};
use zconfig_codec::{decode, decode_named, encode, Codec, DecodeError, Drive, Value};

// image (1, length-delimited "disk0"), readonly (5) = true
const DRIVE_BODY: &[u8] = &[0x0a, 0x05, b'd', b'i', b's', b'k', b'0', 0x28, 0x01];

fn os_tag(key: &str, value: &str) -> OsKeyTags {
    OsKeyTags {
        os_ver_key: key.to_string(),
        os_ver_value: value.to_string(),
    }
}

fn sample_config() -> BaseOsConfig {
    BaseOsConfig {
        uuidandversion: Some(UuiDandVersion {
            uuid: "5c5c3f8e-5f3a-4ef4-9b9e-2b8a1d2e4f10".to_string(),
            version: "3".to_string(),
        }),
        drives: vec![Drive::from_body(DRIVE_BODY).unwrap()],
        activate: true,
        base_os_version: "5.1.2".to_string(),
        base_os_details: Some(OsVerDetails {
            base_os_params: vec![os_tag("release", "5.1"), os_tag("arch", "amd64")],
        }),
    }
}

/// Test 1: Single OSKeyTags entry round trip
///
/// **What:** Encodes OSVerDetails holding one ("release", "5.1") pair and decodes it.
/// **Why:** A one-element repeated field must come back as exactly that one element.
#[test]
fn test_single_os_tag_roundtrip() {
    let details = OsVerDetails {
        base_os_params: vec![os_tag("release", "5.1")],
    };
    let decoded: OsVerDetails = decode(&encode(&details)).unwrap();
    assert_eq!(decoded.base_os_params.len(), 1);
    assert_eq!(decoded.base_os_params[0], os_tag("release", "5.1"));
}

/// Test 2: baseOSParams keeps order and duplicates
#[test]
fn test_os_params_keep_order_and_duplicates() {
    let details = OsVerDetails {
        base_os_params: vec![os_tag("b", "2"), os_tag("a", "1"), os_tag("b", "2")],
    };
    let decoded: OsVerDetails = decode(&encode(&details)).unwrap();
    assert_eq!(decoded, details);

    let dynamic = decode_named(&encode(&details), "OSVerDetails").unwrap();
    let keys: Vec<&str> = dynamic
        .get("baseOSParams")
        .and_then(Value::as_list)
        .unwrap()
        .iter()
        .filter_map(|tag| tag.as_message()?.get("OSVerKey")?.as_str())
        .collect();
    assert_eq!(keys, vec!["b", "a", "b"]);
}

/// Test 3: BaseOSConfig round trip
#[test]
fn test_config_roundtrip() {
    let config = sample_config();
    let decoded: BaseOsConfig = decode(&encode(&config)).unwrap();
    assert_eq!(decoded, config);
    assert_eq!(decoded.drives[0].body(), DRIVE_BODY);
}

/// Test 4: Absent versus empty embedded messages
///
/// **What:** Decodes a config without embedded messages, then one with an empty baseOSDetails.
/// **Why:** An unset message field is absent, while a present empty one is still emitted.
#[test]
fn test_absent_messages_stay_absent() {
    let config = BaseOsConfig {
        base_os_version: "5.1.2".to_string(),
        ..Default::default()
    };
    let decoded: BaseOsConfig = decode(&encode(&config)).unwrap();
    assert!(decoded.uuidandversion.is_none());
    assert!(decoded.base_os_details.is_none());

    // present but empty is not the same as absent
    let config = BaseOsConfig {
        base_os_details: Some(OsVerDetails::default()),
        ..Default::default()
    };
    let bytes = encode(&config);
    assert_eq!(bytes, vec![0x5a, 0x00]);
    let decoded: BaseOsConfig = decode(&bytes).unwrap();
    assert_eq!(decoded.base_os_details, Some(OsVerDetails::default()));

    let dynamic = decode_named(&bytes, "BaseOSConfig").unwrap();
    assert!(dynamic.has("baseOSDetails"));
    assert!(!dynamic.has("uuidandversion"));
}

/// Test 5: Field numbers on the wire
#[test]
fn test_field_numbers_on_the_wire() {
    let config = BaseOsConfig {
        activate: true,
        base_os_version: "v".to_string(),
        ..Default::default()
    };
    // activate is field 4, baseOSVersion field 10
    assert_eq!(encode(&config), vec![0x20, 0x01, 0x52, 0x01, b'v']);
}

/// Test 6: Schema-driven view of BaseOSConfig
///
/// **What:** Decodes a typed config by name and reads nested values and drive bodies.
/// **Why:** The dynamic record must expose the same data and re-encode to the same bytes.
#[test]
fn test_dynamic_view_of_config() {
    let codec = Codec::default();
    let bytes = encode(&sample_config());
    let dynamic = codec.decode_named(&bytes, "BaseOSConfig").unwrap();

    assert_eq!(dynamic.get("activate"), Some(&Value::Bool(true)));
    let uuid = dynamic.get("uuidandversion").and_then(Value::as_message).unwrap();
    assert_eq!(uuid.get("version").and_then(Value::as_str), Some("3"));

    // opaque drive bodies survive byte for byte
    let drives = dynamic.get("drives").and_then(Value::as_list).unwrap();
    assert_eq!(drives[0].as_message().unwrap().encode_to_vec(), DRIVE_BODY);
    assert_eq!(codec.encode_dynamic(&dynamic), bytes);
}

/// Test 7: Malformed drive body
#[test]
fn test_malformed_drive_is_rejected() {
    // drives entry whose body truncates its own length-delimited field
    let bytes = [0x1a, 0x03, 0x0a, 0x05, b'x'];
    assert!(matches!(
        decode::<BaseOsConfig>(&bytes),
        Err(DecodeError::Truncated { .. })
    ));
}

/// Test 8: Drive on its own
///
/// **What:** Decodes a drive body as a top-level typed and named record.
/// **Why:** Drive has its own encode/decode contract that must preserve the body.
#[test]
fn test_drive_standalone_contract() {
    let drive: Drive = decode(DRIVE_BODY).unwrap();
    assert_eq!(encode(&drive), DRIVE_BODY);

    let dynamic = decode_named(DRIVE_BODY, "Drive").unwrap();
    assert_eq!(dynamic.unknown_fields().len(), 2);
    assert_eq!(dynamic.encode_to_vec(), DRIVE_BODY);
}

/// Test 9: Non-canonical drive bodies
///
/// **What:** Carries a drive whose varint value is written in two bytes through the typed
/// and schema-driven decoders, both standalone and inside a BaseOSConfig.
/// **Why:** The body belongs to another service; re-encoding it canonically would change
/// bytes the codec does not own.
#[test]
fn test_non_canonical_drive_body_is_kept() {
    // readonly (5) = 1 with a padded varint
    let body = [0x28, 0x81, 0x00];

    let drive = Drive::from_body(&body).unwrap();
    assert_eq!(drive.body(), &body);
    let dynamic = decode_named(&body, "Drive").unwrap();
    assert_eq!(dynamic.encode_to_vec(), body);

    let config = BaseOsConfig {
        drives: vec![drive],
        ..Default::default()
    };
    let bytes = encode(&config);
    assert_eq!(bytes, vec![0x1a, 0x03, 0x28, 0x81, 0x00]);

    let typed: BaseOsConfig = decode(&bytes).unwrap();
    assert_eq!(typed.drives[0].body(), &body);
    assert_eq!(encode(&typed), bytes);

    let dynamic = decode_named(&bytes, "BaseOSConfig").unwrap();
    assert_eq!(dynamic.encode_to_vec(), bytes);
}

/// Test 10: JSON form of BaseOSConfig
#[test]
fn test_json_of_config() {
    let codec = Codec::default();
    let dynamic = codec.to_dynamic(&sample_config()).unwrap();
    let json = codec.to_json(&dynamic);

    assert_eq!(json["baseOSVersion"], "5.1.2");
    assert_eq!(json["baseOSDetails"]["baseOSParams"][1]["OSVerValue"], "amd64");
    assert!(json["drives"][0].is_string());

    let back: BaseOsConfig = codec
        .from_dynamic(&codec.from_json(&json, dynamic.descriptor()).unwrap())
        .unwrap();
    assert_eq!(back, sample_config());
}
