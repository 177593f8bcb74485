use serde::{Deserialize, Serialize};

/// Everything one side of the protocol can send: enumerations, structs used
/// as nested field types, and packets.
///
/// Client and server packets share family/action pairs, so each direction
/// is loaded as its own catalogue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Catalogue {
    #[serde(default)]
    pub enums:   Vec<EnumDefinition>,
    #[serde(default)]
    pub structs: Vec<StructDefinition>,
    #[serde(default)]
    pub packets: Vec<PacketDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnumDefinition {
    pub name:   String,
    #[serde(rename = "type")]
    pub type_:  String,
    pub values: Vec<EnumVariant>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnumVariant {
    pub name:  String,
    pub value: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StructDefinition {
    pub name:         String,
    pub instructions: Vec<Instruction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PacketDefinition {
    pub family:       String,
    pub action:       String,
    pub instructions: Vec<Instruction>,
}

/// The two-part identifier of a packet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PacketId {
    pub family: String,
    pub action: String,
}

impl PacketId {
    pub fn new(family: &str, action: &str) -> PacketId {
        PacketId {
            family: family.to_owned(),
            action: action.to_owned(),
        }
    }
}

impl std::fmt::Display for PacketId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}_{}", self.family, self.action)
    }
}

/// One element of a packet or struct's wire layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Instruction {
    Field(FieldInstruction),
    Array(ArrayInstruction),
    Length(LengthInstruction),
    Switch(SwitchInstruction),
    Chunked(ChunkedInstruction),
    Dummy(DummyInstruction),
    Break,
}

/// A single value. Unnamed fields must carry a constant `value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldInstruction {
    #[serde(default)]
    pub name:     Option<String>,
    /// A primitive, enum or struct name, optionally followed by `:width`.
    #[serde(rename = "type")]
    pub type_:    String,
    #[serde(default)]
    pub length:   Option<LengthSource>,
    #[serde(default)]
    pub padded:   bool,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub value:    Option<Literal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArrayInstruction {
    pub name:               String,
    #[serde(rename = "type")]
    pub type_:              String,
    #[serde(default)]
    pub length:             Option<LengthSource>,
    #[serde(default)]
    pub optional:           bool,
    #[serde(default)]
    pub delimited:          bool,
    #[serde(default = "default_trailing_delimiter")]
    pub trailing_delimiter: bool,
}

fn default_trailing_delimiter() -> bool {
    true
}

/// The size of the instruction that names it in its `length`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LengthInstruction {
    pub name:     String,
    #[serde(rename = "type")]
    pub type_:    String,
    #[serde(default)]
    pub offset:   i32,
    #[serde(default)]
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SwitchInstruction {
    /// The earlier field whose value selects the case.
    pub field: String,
    /// Where the payload is stored. Defaults to `<field>_data`.
    #[serde(default)]
    pub name:  Option<String>,
    pub cases: Vec<SwitchCase>,
}

impl SwitchInstruction {
    pub fn payload_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| format!("{}_data", self.field))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SwitchCase {
    /// An enum variant name or a number. Absent on the default case.
    #[serde(default)]
    pub value:        Option<Literal>,
    #[serde(default)]
    pub default:      bool,
    #[serde(default)]
    pub instructions: Vec<Instruction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChunkedInstruction {
    pub instructions: Vec<Instruction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DummyInstruction {
    #[serde(rename = "type")]
    pub type_: String,
    pub value: Literal,
}

/// Either a fixed size or the name of a `length` instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LengthSource {
    Fixed(u32),
    Reference(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Number(u32),
    Text(String),
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{}", n),
            Literal::Text(text) => write!(f, "{:?}", text),
        }
    }
}
