use std::collections::BTreeMap;

use eo_codec_compiler::{compile_protocol, EoError, PacketId, Protocol};
use eo_codec_schema::{CaseTag, EnumValue, Value, WireError};

const CATALOGUE: &str = r#"{
  "enums": [
    {
      "name": "Direction",
      "type": "char",
      "values": [
        { "name": "Down", "value": 0 },
        { "name": "Left", "value": 1 },
        { "name": "Up", "value": 2 },
        { "name": "Right", "value": 3 }
      ]
    },
    {
      "name": "ReplyCode",
      "type": "char",
      "values": [
        { "name": "Ok", "value": 1 },
        { "name": "Busy", "value": 2 },
        { "name": "Banned", "value": 3 }
      ]
    }
  ],
  "structs": [
    {
      "name": "Coords",
      "instructions": [
        { "kind": "field", "name": "x", "type": "char" },
        { "kind": "field", "name": "y", "type": "char" }
      ]
    },
    {
      "name": "Nameplate",
      "instructions": [
        { "kind": "field", "name": "name", "type": "string", "length": 6, "padded": true },
        { "kind": "field", "name": "secret", "type": "encoded_string", "length": 6, "padded": true }
      ]
    },
    {
      "name": "Tag",
      "instructions": [
        { "kind": "field", "name": "text", "type": "string", "length": 4 }
      ]
    }
  ],
  "packets": [
    {
      "family": "Walk",
      "action": "Player",
      "instructions": [
        { "kind": "field", "name": "direction", "type": "Direction" },
        { "kind": "field", "name": "timestamp", "type": "three" },
        { "kind": "field", "name": "coords", "type": "Coords" }
      ]
    },
    {
      "family": "Talk",
      "action": "Report",
      "instructions": [
        { "kind": "length", "name": "message_length", "type": "char", "offset": 1 },
        { "kind": "field", "name": "message", "type": "string", "length": "message_length" },
        { "kind": "field", "name": "after", "type": "char" }
      ]
    },
    {
      "family": "Welcome",
      "action": "Reply",
      "instructions": [
        { "kind": "field", "name": "reply_code", "type": "ReplyCode" },
        {
          "kind": "switch",
          "field": "reply_code",
          "cases": [
            { "value": "Ok", "instructions": [{ "kind": "field", "name": "player_id", "type": "short" }] },
            { "value": "Busy" },
            { "default": true, "instructions": [{ "kind": "field", "name": "reason", "type": "string" }] }
          ]
        }
      ]
    },
    {
      "family": "Players",
      "action": "List",
      "instructions": [
        {
          "kind": "chunked",
          "instructions": [
            { "kind": "length", "name": "count", "type": "short" },
            { "kind": "field", "name": "title", "type": "string" },
            { "kind": "break" },
            { "kind": "array", "name": "names", "type": "string", "length": "count", "delimited": true }
          ]
        }
      ]
    },
    {
      "family": "Map",
      "action": "Coords",
      "instructions": [
        { "kind": "array", "name": "coords", "type": "Coords" }
      ]
    },
    {
      "family": "Account",
      "action": "Create",
      "instructions": [
        { "kind": "field", "name": "id", "type": "short" },
        { "kind": "field", "name": "nick", "type": "string", "optional": true }
      ]
    },
    {
      "family": "Connection",
      "action": "Ping",
      "instructions": [
        { "kind": "field", "type": "char", "value": 7 },
        { "kind": "field", "name": "seq", "type": "short" },
        { "kind": "dummy", "type": "char", "value": 0 }
      ]
    },
    {
      "family": "Door",
      "action": "Open",
      "instructions": [
        { "kind": "field", "name": "open", "type": "bool:short" },
        { "kind": "field", "name": "facing", "type": "Direction:short" }
      ]
    },
    {
      "family": "Chest",
      "action": "Words",
      "instructions": [
        {
          "kind": "chunked",
          "instructions": [
            { "kind": "array", "name": "words", "type": "string", "delimited": true, "trailing_delimiter": false }
          ]
        }
      ]
    }
  ]
}"#;

fn protocol() -> Protocol {
    compile_protocol(CATALOGUE).expect("compile_protocol failed")
}

fn id(family: &str, action: &str) -> PacketId {
    PacketId::new(family, action)
}

fn string(text: &str) -> Value {
    Value::String(text.to_owned())
}

fn coords(x: u32, y: u32) -> Value {
    Value::object("Coords")
        .with("x", Value::Number(x))
        .with("y", Value::Number(y))
}

fn verifier_error(json: &str) -> String {
    match compile_protocol(json) {
        Err(EoError::VerifierError(message)) => message,
        other => panic!("expected a verifier error, got {:?}", other),
    }
}

fn packet_catalogue(instructions: &str) -> String {
    format!(
        r#"{{
          "enums": [{{ "name": "Kind", "type": "char", "values": [{{ "name": "A", "value": 1 }}] }}],
          "structs": [{{ "name": "Point", "instructions": [{{ "kind": "field", "name": "x", "type": "char" }}] }}],
          "packets": [{{ "family": "Test", "action": "Packet", "instructions": {} }}]
        }}"#,
        instructions
    )
}

#[test]
fn test_numbers_enums_and_structs() {
    let protocol = protocol();
    let walk = Value::object("Walk_Player")
        .with("direction", Value::variant("Direction", "Up"))
        .with("timestamp", Value::Number(1000))
        .with("coords", coords(5, 7));

    let bytes = protocol.serialize_packet(&id("Walk", "Player"), &walk).unwrap();
    assert_eq!(bytes, [0x03, 0xF2, 0x04, 0xFE, 0x06, 0x08]);
    assert_eq!(protocol.deserialize_packet(&id("Walk", "Player"), &bytes).unwrap(), walk);
}

#[test]
fn test_unrecognized_enum_value_survives() {
    let protocol = protocol();
    let bytes = [0x0A, 0x01, 0x01, 0x01, 0x01, 0x01];

    let value = protocol.deserialize_packet(&id("Walk", "Player"), &bytes).unwrap();
    assert_eq!(
        value.get("direction"),
        Some(&Value::Enum("Direction".to_owned(), EnumValue::Unrecognized(9)))
    );
    assert_eq!(value.get("timestamp"), Some(&Value::Number(0)));
    assert_eq!(protocol.serialize_packet(&id("Walk", "Player"), &value).unwrap()[0], 0x0A);
}

#[test]
fn test_width_overrides() {
    let protocol = protocol();
    let door = Value::object("Door_Open")
        .with("open", Value::Bool(true))
        .with("facing", Value::variant("Direction", "Right"));

    let bytes = protocol.serialize_packet(&id("Door", "Open"), &door).unwrap();
    assert_eq!(bytes, [0x02, 0xFE, 0x04, 0xFE]);
    assert_eq!(protocol.deserialize_packet(&id("Door", "Open"), &bytes).unwrap(), door);
}

#[test]
fn test_length_is_derived_with_offset() {
    let protocol = protocol();
    let report = Value::object("Talk_Report")
        .with("message", string("hi"))
        .with("after", Value::Number(5));

    let bytes = protocol.serialize_packet(&id("Talk", "Report"), &report).unwrap();
    assert_eq!(bytes, [0x04, b'h', b'i', 0x06]);

    // The length itself never shows up in the value.
    let read = protocol.deserialize_packet(&id("Talk", "Report"), &bytes).unwrap();
    assert_eq!(read, report);
    assert_eq!(read.get("message_length"), None);
}

#[test]
fn test_length_below_offset_reads_as_zero() {
    let protocol = protocol();
    let read = protocol
        .deserialize_packet(&id("Talk", "Report"), &[0xFE, 0x06])
        .unwrap();
    assert_eq!(read.get("message"), Some(&string("")));
    assert_eq!(read.get("after"), Some(&Value::Number(5)));
}

#[test]
fn test_switch_selects_declared_case() {
    let protocol = protocol();
    let reply = Value::object("Welcome_Reply")
        .with("reply_code", Value::variant("ReplyCode", "Ok"))
        .with(
            "reply_code_data",
            Value::case(CaseTag::Value(1)).with("player_id", Value::Number(300)),
        );

    let bytes = protocol.serialize_packet(&id("Welcome", "Reply"), &reply).unwrap();
    assert_eq!(bytes, [0x02, 0x30, 0x02]);
    assert_eq!(protocol.deserialize_packet(&id("Welcome", "Reply"), &bytes).unwrap(), reply);
}

#[test]
fn test_switch_empty_case() {
    let protocol = protocol();
    let reply = Value::object("Welcome_Reply").with("reply_code", Value::variant("ReplyCode", "Busy"));

    let bytes = protocol.serialize_packet(&id("Welcome", "Reply"), &reply).unwrap();
    assert_eq!(bytes, [0x03]);

    let read = protocol.deserialize_packet(&id("Welcome", "Reply"), &bytes).unwrap();
    assert_eq!(read.get("reply_code_data"), Some(&Value::case(CaseTag::Value(2))));
}

#[test]
fn test_switch_falls_back_to_default() {
    let protocol = protocol();
    let reply = Value::object("Welcome_Reply")
        .with("reply_code", Value::variant("ReplyCode", "Banned"))
        .with("reply_code_data", Value::case(CaseTag::Default).with("reason", string("x")));

    let bytes = protocol.serialize_packet(&id("Welcome", "Reply"), &reply).unwrap();
    assert_eq!(bytes, [0x04, b'x']);
    assert_eq!(protocol.deserialize_packet(&id("Welcome", "Reply"), &bytes).unwrap(), reply);

    let read = protocol
        .deserialize_packet(&id("Welcome", "Reply"), &[0x0A, b'a', b'b'])
        .unwrap();
    assert_eq!(
        read.get("reply_code"),
        Some(&Value::Enum("ReplyCode".to_owned(), EnumValue::Unrecognized(9)))
    );
    assert_eq!(
        read.get("reply_code_data"),
        Some(&Value::case(CaseTag::Default).with("reason", string("ab")))
    );
}

#[test]
fn test_switch_payload_must_match_discriminator() {
    let protocol = protocol();
    let wrong_case = Value::object("Welcome_Reply")
        .with("reply_code", Value::variant("ReplyCode", "Ok"))
        .with("reply_code_data", Value::case(CaseTag::Default).with("reason", string("x")));
    assert!(matches!(
        protocol.serialize_packet(&id("Welcome", "Reply"), &wrong_case),
        Err(EoError::StructuralError(_))
    ));

    let missing = Value::object("Welcome_Reply").with("reply_code", Value::variant("ReplyCode", "Ok"));
    assert!(matches!(
        protocol.serialize_packet(&id("Welcome", "Reply"), &missing),
        Err(EoError::StructuralError(_))
    ));
}

#[test]
fn test_chunked_break_and_delimited_array() {
    let protocol = protocol();
    let list = Value::object("Players_List")
        .with("title", string("Online"))
        .with("names", Value::Array(vec![string("ann"), string("bob")]));

    let bytes = protocol.serialize_packet(&id("Players", "List"), &list).unwrap();
    let mut expected = vec![0x03, 0xFE];
    expected.extend_from_slice(b"Online");
    expected.push(0xFF);
    expected.extend_from_slice(b"ann");
    expected.push(0xFF);
    expected.extend_from_slice(b"bob");
    expected.push(0xFF);
    assert_eq!(bytes, expected);

    assert_eq!(protocol.deserialize_packet(&id("Players", "List"), &bytes).unwrap(), list);
}

#[test]
fn test_missing_break_is_an_error() {
    let protocol = protocol();
    let mut bytes = vec![0x03, 0xFE];
    bytes.extend_from_slice(b"Online");

    assert!(matches!(
        protocol.deserialize_packet(&id("Players", "List"), &bytes),
        Err(EoError::StructuralError(_))
    ));
}

#[test]
fn test_chunked_strings_are_sanitized() {
    let protocol = protocol();
    let list = Value::object("Players_List")
        .with("title", string("a\u{FF}b"))
        .with("names", Value::Array(vec![]));

    let bytes = protocol.serialize_packet(&id("Players", "List"), &list).unwrap();
    assert_eq!(bytes, [0xFE, 0xFE, b'a', b'y', b'b', 0xFF]);

    // Outside a chunked section the byte is kept.
    let create = Value::object("Account_Create")
        .with("id", Value::Number(1))
        .with("nick", string("\u{FF}"));
    let bytes = protocol.serialize_packet(&id("Account", "Create"), &create).unwrap();
    assert_eq!(bytes, [0x02, 0xFE, 0xFF]);
}

#[test]
fn test_delimited_array_without_trailing_delimiter() {
    let protocol = protocol();
    let words = Value::object("Chest_Words")
        .with("words", Value::Array(vec![string("a"), string("bc"), string("d")]));

    let bytes = protocol.serialize_packet(&id("Chest", "Words"), &words).unwrap();
    assert_eq!(bytes, [b'a', 0xFF, b'b', b'c', 0xFF, b'd']);
    assert_eq!(protocol.deserialize_packet(&id("Chest", "Words"), &bytes).unwrap(), words);
}

#[test]
fn test_implicit_array_fills_the_rest() {
    let protocol = protocol();
    let map = Value::object("Map_Coords").with("coords", Value::Array(vec![coords(1, 2), coords(3, 4)]));

    let bytes = protocol.serialize_packet(&id("Map", "Coords"), &map).unwrap();
    assert_eq!(bytes, [0x02, 0x03, 0x04, 0x05]);
    assert_eq!(protocol.deserialize_packet(&id("Map", "Coords"), &bytes).unwrap(), map);

    let empty = protocol.deserialize_packet(&id("Map", "Coords"), &[]).unwrap();
    assert_eq!(empty.get("coords"), Some(&Value::Array(vec![])));
}

#[test]
fn test_optional_trailing_field() {
    let protocol = protocol();
    let without = Value::object("Account_Create").with("id", Value::Number(1));

    let bytes = protocol.serialize_packet(&id("Account", "Create"), &without).unwrap();
    assert_eq!(bytes, [0x02, 0xFE]);
    assert_eq!(protocol.deserialize_packet(&id("Account", "Create"), &bytes).unwrap(), without);

    let with = without.clone().with("nick", string("x"));
    let bytes = protocol.serialize_packet(&id("Account", "Create"), &with).unwrap();
    assert_eq!(bytes, [0x02, 0xFE, b'x']);
    assert_eq!(protocol.deserialize_packet(&id("Account", "Create"), &bytes).unwrap(), with);
}

#[test]
fn test_missing_required_field() {
    let protocol = protocol();
    let create = Value::object("Account_Create").with("nick", string("x"));
    assert!(matches!(
        protocol.serialize_packet(&id("Account", "Create"), &create),
        Err(EoError::MissingField(name)) if name == "id"
    ));
}

#[test]
fn test_type_mismatch() {
    let protocol = protocol();
    let create = Value::object("Account_Create").with("id", string("one"));
    assert!(matches!(
        protocol.serialize_packet(&id("Account", "Create"), &create),
        Err(EoError::TypeMismatch { .. })
    ));
}

#[test]
fn test_constants_and_dummies() {
    let protocol = protocol();
    let ping = Value::object("Connection_Ping").with("seq", Value::Number(1));

    let bytes = protocol.serialize_packet(&id("Connection", "Ping"), &ping).unwrap();
    assert_eq!(bytes, [0x08, 0x02, 0xFE, 0xFE]);
    assert_eq!(protocol.deserialize_packet(&id("Connection", "Ping"), &bytes).unwrap(), ping);
}

#[test]
fn test_padded_strings() {
    let protocol = protocol();
    let plate = Value::object("Nameplate")
        .with("name", string("bob"))
        .with("secret", string("bar"));

    let bytes = protocol.serialize_struct("Nameplate", &plate).unwrap();
    assert_eq!(
        bytes,
        [b'b', b'o', b'b', 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, b'-', b'l', b'=']
    );
    assert_eq!(protocol.deserialize_struct("Nameplate", &bytes).unwrap(), plate);
}

#[test]
fn test_fixed_string_length_must_match() {
    let protocol = protocol();
    let tag = Value::object("Tag").with("text", string("hello"));
    assert!(matches!(
        protocol.serialize_struct("Tag", &tag),
        Err(EoError::Wire(WireError::FixedStringLength { expected: 4, .. }))
    ));
}

#[test]
fn test_number_out_of_range() {
    let protocol = protocol();
    assert!(matches!(
        protocol.serialize_struct("Coords", &coords(253, 0)),
        Err(EoError::Wire(WireError::NumberOutOfRange { value: 253, .. }))
    ));
}

#[test]
fn test_unknown_packet() {
    let protocol = protocol();
    assert!(matches!(
        protocol.serialize_packet(&id("Nope", "Nope"), &Value::object("Nope")),
        Err(EoError::UnknownDefinition(_))
    ));
    assert!(matches!(
        protocol.deserialize_struct("Nope", &[]),
        Err(EoError::UnknownDefinition(_))
    ));
}

#[test]
fn test_fixed_sizes() {
    let protocol = protocol();
    let size = |name: &str| {
        protocol
            .struct_definition(name)
            .and_then(|def| protocol.instructions_fixed_size(&def.instructions))
    };
    assert_eq!(size("Coords"), Some(2));
    assert_eq!(size("Nameplate"), Some(12));
    assert_eq!(size("Tag"), Some(4));
}

#[test]
fn test_protocol_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Protocol>();
}

#[test]
fn test_catalogue_must_be_json() {
    assert!(matches!(compile_protocol("enum Foo {}"), Err(EoError::Load(_))));
    assert!(matches!(
        compile_protocol(&packet_catalogue(r#"[{ "kind": "teleport" }]"#)),
        Err(EoError::Load(_))
    ));
}

#[test]
fn test_valid_catalogue() {
    let protocol = compile_protocol(&packet_catalogue(
        r#"[{ "kind": "field", "name": "kind", "type": "Kind" }, { "kind": "field", "name": "at", "type": "Point" }]"#,
    ))
    .expect("compile_protocol failed");
    assert_eq!(protocol.catalogue().packets.len(), 1);
    assert!(protocol.enum_definition("Kind").is_some());
}

#[test]
fn test_verify_lengths() {
    verifier_error(&packet_catalogue(r#"[{ "kind": "length", "name": "n", "type": "char" }]"#));

    verifier_error(&packet_catalogue(
        r#"[
          { "kind": "length", "name": "n", "type": "char" },
          { "kind": "field", "name": "a", "type": "string", "length": "n" },
          { "kind": "field", "name": "b", "type": "string", "length": "n" }
        ]"#,
    ));

    verifier_error(&packet_catalogue(
        r#"[
          { "kind": "field", "name": "a", "type": "string", "length": "n" },
          { "kind": "length", "name": "n", "type": "char" }
        ]"#,
    ));

    verifier_error(&packet_catalogue(
        r#"[
          { "kind": "length", "name": "n", "type": "string" },
          { "kind": "field", "name": "a", "type": "string", "length": "n" }
        ]"#,
    ));

    verifier_error(&packet_catalogue(
        r#"[{ "kind": "field", "name": "a", "type": "char", "length": 2 }]"#,
    ));
}

#[test]
fn test_verify_lengths_do_not_cross_switch_cases() {
    verifier_error(&packet_catalogue(
        r#"[
          { "kind": "length", "name": "n", "type": "char" },
          { "kind": "field", "name": "k", "type": "char" },
          {
            "kind": "switch",
            "field": "k",
            "cases": [{ "value": 1, "instructions": [{ "kind": "field", "name": "a", "type": "string", "length": "n" }] }]
          }
        ]"#,
    ));
}

#[test]
fn test_verify_chunked_only_instructions() {
    let message = verifier_error(&packet_catalogue(r#"[{ "kind": "break" }]"#));
    assert!(message.contains("break"));

    verifier_error(&packet_catalogue(
        r#"[{ "kind": "array", "name": "a", "type": "string", "delimited": true }]"#,
    ));

    verifier_error(&packet_catalogue(r#"[{ "kind": "chunked", "instructions": [] }]"#));
}

#[test]
fn test_verify_switches() {
    // Discriminator declared after the switch.
    verifier_error(&packet_catalogue(
        r#"[
          { "kind": "switch", "field": "k", "cases": [{ "value": 1 }] },
          { "kind": "field", "name": "k", "type": "char" }
        ]"#,
    ));

    // No cases.
    verifier_error(&packet_catalogue(
        r#"[{ "kind": "field", "name": "k", "type": "char" }, { "kind": "switch", "field": "k", "cases": [] }]"#,
    ));

    // Default before another case.
    verifier_error(&packet_catalogue(
        r#"[
          { "kind": "field", "name": "k", "type": "char" },
          { "kind": "switch", "field": "k", "cases": [{ "default": true }, { "value": 1 }] }
        ]"#,
    ));

    // Not a variant of the discriminator's enum.
    verifier_error(&packet_catalogue(
        r#"[
          { "kind": "field", "name": "k", "type": "Kind" },
          { "kind": "switch", "field": "k", "cases": [{ "value": "B" }] }
        ]"#,
    ));

    // String discriminator.
    verifier_error(&packet_catalogue(
        r#"[
          { "kind": "field", "name": "k", "type": "string" },
          { "kind": "switch", "field": "k", "cases": [{ "value": 1 }] }
        ]"#,
    ));
}

#[test]
fn test_verify_fields() {
    verifier_error(&packet_catalogue(r#"[{ "kind": "field", "type": "char" }]"#));
    verifier_error(&packet_catalogue(r#"[{ "kind": "field", "name": "a", "type": "char", "value": 1 }]"#));
    verifier_error(&packet_catalogue(
        r#"[{ "kind": "field", "name": "a", "type": "char" }, { "kind": "field", "name": "a", "type": "char" }]"#,
    ));
    verifier_error(&packet_catalogue(
        r#"[
          { "kind": "field", "name": "a", "type": "char", "optional": true },
          { "kind": "field", "name": "b", "type": "char" }
        ]"#,
    ));
    verifier_error(&packet_catalogue(r#"[{ "kind": "field", "name": "a", "type": "Point:short" }]"#));
    verifier_error(&packet_catalogue(r#"[{ "kind": "field", "name": "a", "type": "char:huge" }]"#));

    assert!(matches!(
        compile_protocol(&packet_catalogue(r#"[{ "kind": "field", "name": "a", "type": "Missing" }]"#)),
        Err(EoError::UnknownDefinition(name)) if name == "Missing"
    ));
}

#[test]
fn test_verify_definitions() {
    verifier_error(
        r#"{ "structs": [
          { "name": "A", "instructions": [] },
          { "name": "A", "instructions": [] }
        ] }"#,
    );

    verifier_error(
        r#"{ "packets": [
          { "family": "F", "action": "A", "instructions": [] },
          { "family": "F", "action": "A", "instructions": [] }
        ] }"#,
    );

    verifier_error(r#"{ "structs": [{ "name": "short", "instructions": [] }] }"#);

    verifier_error(
        r#"{ "enums": [{ "name": "E", "type": "char", "values": [{ "name": "A", "value": 1 }, { "name": "B", "value": 1 }] }] }"#,
    );

    verifier_error(r#"{ "enums": [{ "name": "E", "type": "char", "values": [{ "name": "A", "value": 253 }] }] }"#);

    verifier_error(r#"{ "enums": [{ "name": "E", "type": "string", "values": [] }] }"#);
}

#[test]
fn test_verify_recursion() {
    let message = verifier_error(
        r#"{ "structs": [
          { "name": "A", "instructions": [{ "kind": "field", "name": "b", "type": "B" }] },
          { "name": "B", "instructions": [{ "kind": "field", "name": "a", "type": "A" }] }
        ] }"#,
    );
    assert!(message.contains("Recursive"));

    // Arrays that can be empty may hold their own struct.
    compile_protocol(
        r#"{ "structs": [
          { "name": "Node", "instructions": [{ "kind": "array", "name": "children", "type": "Node" }] }
        ] }"#,
    )
    .expect("compile_protocol failed");

    verifier_error(
        r#"{ "structs": [
          { "name": "Node", "instructions": [{ "kind": "array", "name": "children", "type": "Node", "length": 2 }] }
        ] }"#,
    );
}

#[test]
fn test_struct_inside_chunk_keeps_modes() {
    let protocol = compile_protocol(
        r#"{
          "structs": [
            { "name": "Pair", "instructions": [{ "kind": "field", "name": "a", "type": "char" }, { "kind": "field", "name": "b", "type": "string" }] }
          ],
          "packets": [
            {
              "family": "Pair",
              "action": "List",
              "instructions": [
                { "kind": "chunked", "instructions": [
                  { "kind": "field", "name": "first", "type": "Pair" },
                  { "kind": "break" },
                  { "kind": "field", "name": "second", "type": "Pair" }
                ] }
              ]
            }
          ]
        }"#,
    )
    .expect("compile_protocol failed");

    let pair = |a: u32, b: &str| {
        Value::Object(
            "Pair".to_owned(),
            BTreeMap::from([("a".to_owned(), Value::Number(a)), ("b".to_owned(), string(b))]),
        )
    };
    let list = Value::object("Pair_List")
        .with("first", pair(1, "x"))
        .with("second", pair(2, "yz"));

    let bytes = protocol.serialize_packet(&id("Pair", "List"), &list).unwrap();
    assert_eq!(bytes, [0x02, b'x', 0xFF, 0x03, b'y', b'z']);
    assert_eq!(protocol.deserialize_packet(&id("Pair", "List"), &bytes).unwrap(), list);
}

#[test]
fn test_zero_length_self_array() {
    let protocol = compile_protocol(
        r#"{
          "structs": [
            { "name": "Node", "instructions": [
              { "kind": "field", "name": "x", "type": "char" },
              { "kind": "array", "name": "kids", "type": "Node", "length": 0 }
            ] }
          ],
          "packets": [
            { "family": "Tree", "action": "List", "instructions": [{ "kind": "array", "name": "nodes", "type": "Node" }] }
          ]
        }"#,
    )
    .expect("compile_protocol failed");

    let node = protocol.resolve_type("Node").unwrap();
    assert_eq!(protocol.fixed_size(node, None), Some(1));

    let leaf = |x: u32| {
        Value::object("Node")
            .with("x", Value::Number(x))
            .with("kids", Value::Array(vec![]))
    };
    let value = protocol.deserialize_packet(&id("Tree", "List"), &[0x02, 0x03]).unwrap();
    assert_eq!(value, Value::object("Tree_List").with("nodes", Value::Array(vec![leaf(1), leaf(2)])));
}

#[test]
fn test_huge_length_over_empty_tail() {
    let protocol = compile_protocol(&packet_catalogue(
        r#"[
          { "kind": "length", "name": "n", "type": "int" },
          { "kind": "array", "name": "items", "type": "char", "length": "n" }
        ]"#,
    ))
    .expect("compile_protocol failed");

    let value = protocol
        .deserialize_packet(&id("Test", "Packet"), &[0xFD, 0xFD, 0xFD, 0x20])
        .unwrap();
    assert_eq!(value, Value::object("Test_Packet").with("items", Value::Array(vec![Value::Number(0)])));
}
