use std::collections::HashMap;

use eo_codec_schema::{byte_len, CaseTag, EnumValue, NumberWidth, Value};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::{
    error::EoError,
    types::{
        Catalogue, EnumDefinition, FieldInstruction, Instruction, LengthSource, Literal,
        PacketDefinition, PacketId, StructDefinition, SwitchCase, SwitchInstruction,
    },
    utils::quote,
    verifier::verify_protocol,
};

lazy_static! {
    static ref TYPE_REF: Regex = Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)(?::([a-z]+))?$").unwrap();
}

pub const PRIMITIVE_TYPES: [&str; 9] = [
    "byte", "char", "short", "three", "int", "bool", "string", "encoded_string", "blob",
];

/// What a type reference resolves to on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Byte,
    Number(NumberWidth),
    Bool(NumberWidth),
    String,
    EncodedString,
    Blob,
    /// Index into the catalogue's enums, and the width it is written with.
    Enum(usize, NumberWidth),
    /// Index into the catalogue's structs.
    Struct(usize),
}

impl DataType {
    pub fn is_numeric(self) -> bool {
        matches!(self, DataType::Byte | DataType::Number(_))
    }

    pub fn is_string(self) -> bool {
        matches!(self, DataType::String | DataType::EncodedString)
    }
}

/// A validated, indexed catalogue. Immutable once built and safe to share
/// between threads.
#[derive(Debug)]
pub struct Protocol {
    catalogue:    Catalogue,
    enum_index:   HashMap<String, usize>,
    struct_index: HashMap<String, usize>,
    packet_index: HashMap<PacketId, usize>,
}

/// Load a JSON catalogue and validate it.
/// Returns `Err(EoError)` if the JSON does not describe a catalogue (unknown
/// instruction kinds included) or if verification fails.
pub fn compile_protocol(text: &str) -> Result<Protocol, EoError> {
    let catalogue: Catalogue = serde_json::from_str(text)?;
    Protocol::new(catalogue)
}

impl Protocol {
    /// Index and verify `catalogue`.
    pub fn new(catalogue: Catalogue) -> Result<Protocol, EoError> {
        let enum_index = catalogue
            .enums
            .iter()
            .enumerate()
            .map(|(i, def)| (def.name.clone(), i))
            .collect();
        let struct_index = catalogue
            .structs
            .iter()
            .enumerate()
            .map(|(i, def)| (def.name.clone(), i))
            .collect();
        let packet_index = catalogue
            .packets
            .iter()
            .enumerate()
            .map(|(i, def)| (PacketId::new(&def.family, &def.action), i))
            .collect();

        let protocol = Protocol {
            catalogue,
            enum_index,
            struct_index,
            packet_index,
        };
        verify_protocol(&protocol)?;

        debug!(
            enums = protocol.catalogue.enums.len(),
            structs = protocol.catalogue.structs.len(),
            packets = protocol.catalogue.packets.len(),
            "compiled protocol catalogue"
        );
        Ok(protocol)
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    pub fn packet(&self, id: &PacketId) -> Option<&PacketDefinition> {
        self.packet_index.get(id).map(|&i| &self.catalogue.packets[i])
    }

    pub fn struct_definition(&self, name: &str) -> Option<&StructDefinition> {
        self.struct_index.get(name).map(|&i| &self.catalogue.structs[i])
    }

    pub fn enum_definition(&self, name: &str) -> Option<&EnumDefinition> {
        self.enum_index.get(name).map(|&i| &self.catalogue.enums[i])
    }

    pub(crate) fn struct_at(&self, index: usize) -> &StructDefinition {
        &self.catalogue.structs[index]
    }

    pub(crate) fn enum_at(&self, index: usize) -> &EnumDefinition {
        &self.catalogue.enums[index]
    }

    /// Resolve a type reference such as `short`, `Coords` or `Direction:char`.
    pub fn resolve_type(&self, type_ref: &str) -> Result<DataType, EoError> {
        let captures = TYPE_REF.captures(type_ref).ok_or_else(|| {
            EoError::VerifierError(format!("Invalid type reference {}", quote(type_ref)))
        })?;
        let name = captures.get(1).map_or("", |m| m.as_str());
        let width = match captures.get(2) {
            Some(m) => Some(NumberWidth::from_name(m.as_str()).ok_or_else(|| {
                EoError::VerifierError(format!(
                    "Invalid width {} in type {}",
                    quote(m.as_str()),
                    quote(type_ref)
                ))
            })?),
            None => None,
        };

        let no_override = |data_type: DataType| {
            if width.is_some() {
                Err(EoError::VerifierError(format!(
                    "The type {} cannot be given a width",
                    quote(name)
                )))
            } else {
                Ok(data_type)
            }
        };

        match name {
            "byte" => no_override(DataType::Byte),
            "bool" => Ok(DataType::Bool(width.unwrap_or(NumberWidth::Char))),
            "string" => no_override(DataType::String),
            "encoded_string" => no_override(DataType::EncodedString),
            "blob" => no_override(DataType::Blob),
            other => {
                if let Some(number_width) = NumberWidth::from_name(other) {
                    return no_override(DataType::Number(number_width));
                }
                if let Some(&index) = self.enum_index.get(other) {
                    let own_width = NumberWidth::from_name(&self.catalogue.enums[index].type_)
                        .ok_or_else(|| {
                            EoError::VerifierError(format!(
                                "The enum {} must have a numeric type",
                                quote(other)
                            ))
                        })?;
                    return Ok(DataType::Enum(index, width.unwrap_or(own_width)));
                }
                if let Some(&index) = self.struct_index.get(other) {
                    return no_override(DataType::Struct(index));
                }
                Err(EoError::UnknownDefinition(other.to_owned()))
            }
        }
    }

    /// Look up the number of an enum variant.
    pub fn enum_number(&self, index: usize, variant: &str) -> Option<u32> {
        self.enum_at(index)
            .values
            .iter()
            .find(|v| v.name == variant)
            .map(|v| v.value)
    }

    /// Map a number read off the wire to a variant of the enum.
    pub fn enum_variant(&self, index: usize, number: u32) -> EnumValue {
        let definition = self.enum_at(index);
        match definition.values.iter().find(|v| v.value == number) {
            Some(variant) => EnumValue::Known(variant.name.clone()),
            None => {
                debug!(enum_name = %definition.name, number, "unrecognized enum value");
                EnumValue::Unrecognized(number)
            }
        }
    }

    /// The number a switch discriminator value stands for, if it is a value
    /// of `data_type`.
    pub fn discriminant(&self, data_type: DataType, value: &Value) -> Option<u32> {
        match (data_type, value) {
            (DataType::Byte, Value::Number(n)) | (DataType::Number(_), Value::Number(n)) => Some(*n),
            (DataType::Bool(_), Value::Bool(b)) => Some(*b as u32),
            (DataType::Enum(_, _), Value::Number(n)) => Some(*n),
            (DataType::Enum(_, _), Value::Enum(_, EnumValue::Unrecognized(n))) => Some(*n),
            (DataType::Enum(index, _), Value::Enum(_, EnumValue::Known(variant))) => {
                self.enum_number(index, variant)
            }
            _ => None,
        }
    }

    /// The number a case label stands for, given the discriminator type.
    pub fn case_number(&self, data_type: DataType, label: &Literal) -> Result<u32, EoError> {
        match (data_type, label) {
            (_, Literal::Number(n)) => Ok(*n),
            (DataType::Enum(index, _), Literal::Text(variant)) => {
                self.enum_number(index, variant).ok_or_else(|| {
                    EoError::VerifierError(format!(
                        "{} is not a value of enum {}",
                        quote(variant),
                        quote(&self.enum_at(index).name)
                    ))
                })
            }
            (DataType::Bool(_), Literal::Text(text)) if text == "true" || text == "false" => {
                Ok((text == "true") as u32)
            }
            (_, Literal::Text(text)) => Err(EoError::VerifierError(format!(
                "Case value {} does not match the discriminator type",
                quote(text)
            ))),
        }
    }

    /// Pick the case a discriminator number selects: the case declared for
    /// that number, or else the default case, or else none.
    pub fn select_case<'s>(
        &self,
        switch: &'s SwitchInstruction,
        data_type: DataType,
        number: u32,
    ) -> Result<Option<(&'s SwitchCase, CaseTag)>, EoError> {
        for case in switch.cases.iter().filter(|c| !c.default) {
            if let Some(label) = &case.value {
                if self.case_number(data_type, label)? == number {
                    return Ok(Some((case, CaseTag::Value(number))));
                }
            }
        }
        Ok(switch
            .cases
            .iter()
            .find(|c| c.default)
            .map(|case| (case, CaseTag::Default)))
    }

    /// Wire size of a value of `data_type` when every value has the same
    /// size, or `None` if it varies.
    pub fn fixed_size(&self, data_type: DataType, length: Option<&LengthSource>) -> Option<usize> {
        match data_type {
            DataType::Byte => Some(1),
            DataType::Number(width) | DataType::Bool(width) | DataType::Enum(_, width) => {
                Some(width.size())
            }
            DataType::String | DataType::EncodedString => match length {
                Some(LengthSource::Fixed(n)) => Some(*n as usize),
                _ => None,
            },
            DataType::Blob => None,
            DataType::Struct(index) => self.instructions_fixed_size(&self.struct_at(index).instructions),
        }
    }

    /// Wire size of an instruction list when it never varies.
    pub fn instructions_fixed_size(&self, instructions: &[Instruction]) -> Option<usize> {
        instructions
            .iter()
            .map(|instruction| self.instruction_fixed_size(instruction))
            .sum()
    }

    fn instruction_fixed_size(&self, instruction: &Instruction) -> Option<usize> {
        match instruction {
            Instruction::Field(field) if !field.optional => {
                self.fixed_size(self.resolve_type(&field.type_).ok()?, field.length.as_ref())
            }
            Instruction::Array(array) if !array.optional && !array.delimited => match array.length {
                Some(LengthSource::Fixed(0)) => Some(0),
                Some(LengthSource::Fixed(n)) => {
                    let element = self.fixed_size(self.resolve_type(&array.type_).ok()?, None)?;
                    Some(element * n as usize)
                }
                _ => None,
            },
            Instruction::Length(length) if !length.optional => {
                self.fixed_size(self.resolve_type(&length.type_).ok()?, None)
            }
            Instruction::Dummy(dummy) => match (self.resolve_type(&dummy.type_).ok()?, &dummy.value) {
                (DataType::String, Literal::Text(text))
                | (DataType::EncodedString, Literal::Text(text)) => {
                    Some(byte_len(text))
                }
                (data_type, _) => self.fixed_size(data_type, None),
            },
            _ => None,
        }
    }
}

/// Find the field named `name` declared in `scope`, looking inside chunked
/// sections but not inside switch cases.
pub fn find_field<'s>(scope: &'s [Instruction], name: &str) -> Option<&'s FieldInstruction> {
    scope.iter().find_map(|instruction| match instruction {
        Instruction::Field(field) if field.name.as_deref() == Some(name) => Some(field),
        Instruction::Chunked(chunked) => find_field(&chunked.instructions, name),
        _ => None,
    })
}

/// Find the field or array whose `length` names the length instruction
/// `name`, looking inside chunked sections but not inside switch cases.
pub fn find_length_user<'s>(scope: &'s [Instruction], name: &str) -> Option<&'s Instruction> {
    let refers = |length: &Option<LengthSource>| {
        matches!(length, Some(LengthSource::Reference(r)) if r == name)
    };
    scope.iter().find_map(|instruction| match instruction {
        Instruction::Field(field) if refers(&field.length) => Some(instruction),
        Instruction::Array(array) if refers(&array.length) => Some(instruction),
        Instruction::Chunked(chunked) => find_length_user(&chunked.instructions, name),
        _ => None,
    })
}
