use std::collections::BTreeMap;

use eo_codec_schema::{byte_len, EoWriter, EnumValue, Value, WireError, BREAK_BYTE};
use tracing::trace;

use crate::{
    compiler::{find_field, find_length_user, DataType, Protocol},
    error::EoError,
    types::{
        ArrayInstruction, FieldInstruction, Instruction, LengthInstruction, LengthSource, Literal,
        PacketId, SwitchInstruction,
    },
};

type Fields = BTreeMap<String, Value>;

fn mismatch(field: &str, expected: &'static str, found: &Value) -> EoError {
    EoError::TypeMismatch {
        field: field.to_owned(),
        expected,
        found: format!("{:?}", found),
    }
}

fn add_byte(writer: &mut EoWriter, value: u32) -> Result<(), EoError> {
    if value > u8::MAX as u32 {
        return Err(WireError::NumberOutOfRange {
            value: value as u64,
            max:   u8::MAX as u64,
        }
        .into());
    }
    writer.add_byte(value as u8);
    Ok(())
}

impl Protocol {
    /// Write a packet's value and return the bytes.
    pub fn serialize_packet(&self, id: &PacketId, value: &Value) -> Result<Vec<u8>, EoError> {
        let mut writer = EoWriter::new();
        self.write_packet(id, value, &mut writer)?;
        trace!(packet = %id, bytes = writer.len(), "serialized packet");
        Ok(writer.into_bytes())
    }

    pub fn write_packet(&self, id: &PacketId, value: &Value, writer: &mut EoWriter) -> Result<(), EoError> {
        let packet = self
            .packet(id)
            .ok_or_else(|| EoError::UnknownDefinition(id.to_string()))?;
        Serializer { protocol: self }.write_object(&id.to_string(), &packet.instructions, value, writer)
    }

    /// Write a struct's value and return the bytes.
    pub fn serialize_struct(&self, name: &str, value: &Value) -> Result<Vec<u8>, EoError> {
        let mut writer = EoWriter::new();
        self.write_struct(name, value, &mut writer)?;
        Ok(writer.into_bytes())
    }

    pub fn write_struct(&self, name: &str, value: &Value, writer: &mut EoWriter) -> Result<(), EoError> {
        let definition = self
            .struct_definition(name)
            .ok_or_else(|| EoError::UnknownDefinition(name.to_owned()))?;
        Serializer { protocol: self }.write_object(name, &definition.instructions, value, writer)
    }
}

struct Serializer<'p> {
    protocol: &'p Protocol,
}

impl<'p> Serializer<'p> {
    fn write_object(
        &self,
        name: &str,
        instructions: &[Instruction],
        value: &Value,
        writer: &mut EoWriter,
    ) -> Result<(), EoError> {
        let fields = match value {
            Value::Object(_, fields) => fields,
            other => return Err(mismatch(name, "an object", other)),
        };
        // Modes set inside an object never leak into the enclosing one.
        let mut writer = writer.scope();
        self.write_list(instructions, instructions, fields, &mut writer)
    }

    fn write_list(
        &self,
        scope: &[Instruction],
        list: &[Instruction],
        fields: &Fields,
        writer: &mut EoWriter,
    ) -> Result<(), EoError> {
        for instruction in list {
            match instruction {
                Instruction::Field(field) => self.write_field(field, fields, writer)?,
                Instruction::Array(array) => self.write_array(array, fields, writer)?,
                Instruction::Length(length) => self.write_length(length, scope, fields, writer)?,
                Instruction::Switch(switch) => self.write_switch(switch, scope, fields, writer)?,
                Instruction::Chunked(chunked) => {
                    let mut writer = writer.sanitized();
                    self.write_list(scope, &chunked.instructions, fields, &mut writer)?;
                }
                Instruction::Dummy(dummy) => {
                    let data_type = self.protocol.resolve_type(&dummy.type_)?;
                    self.write_literal(data_type, &dummy.value, None, false, writer)?;
                }
                Instruction::Break => writer.add_byte(BREAK_BYTE),
            }
        }
        Ok(())
    }

    fn write_field(&self, field: &FieldInstruction, fields: &Fields, writer: &mut EoWriter) -> Result<(), EoError> {
        let data_type = self.protocol.resolve_type(&field.type_)?;
        let fixed = match field.length {
            Some(LengthSource::Fixed(n)) => Some(n as usize),
            _ => None,
        };

        let name = match (&field.name, &field.value) {
            (_, Some(literal)) => return self.write_literal(data_type, literal, fixed, field.padded, writer),
            (Some(name), None) => name,
            (None, None) => return Ok(()),
        };

        match fields.get(name) {
            Some(value) => self.write_value(name, data_type, value, fixed, field.padded, writer),
            None if field.optional => Ok(()),
            None => Err(EoError::MissingField(name.clone())),
        }
    }

    fn write_array(&self, array: &ArrayInstruction, fields: &Fields, writer: &mut EoWriter) -> Result<(), EoError> {
        let values = match fields.get(&array.name) {
            Some(Value::Array(values)) => values,
            Some(other) => return Err(mismatch(&array.name, "an array", other)),
            None if array.optional => return Ok(()),
            None => return Err(EoError::MissingField(array.name.clone())),
        };
        if let Some(LengthSource::Fixed(n)) = array.length {
            if values.len() != n as usize {
                return Err(EoError::StructuralError(format!(
                    "The array \"{}\" must have exactly {} elements, not {}",
                    array.name,
                    n,
                    values.len()
                )));
            }
        }

        let element = self.protocol.resolve_type(&array.type_)?;
        for (i, value) in values.iter().enumerate() {
            if array.delimited && !array.trailing_delimiter && i > 0 {
                writer.add_byte(BREAK_BYTE);
            }
            self.write_value(&array.name, element, value, None, false, writer)?;
            if array.delimited && array.trailing_delimiter {
                writer.add_byte(BREAK_BYTE);
            }
        }
        Ok(())
    }

    /// Lengths are never taken from the value: they are measured from the
    /// field or array that refers to them.
    fn write_length(
        &self,
        length: &LengthInstruction,
        scope: &[Instruction],
        fields: &Fields,
        writer: &mut EoWriter,
    ) -> Result<(), EoError> {
        let size = match find_length_user(scope, &length.name) {
            Some(Instruction::Field(field)) => {
                let name = field.name.as_deref().unwrap_or_default();
                match fields.get(name) {
                    Some(Value::String(text)) => Some(byte_len(text)),
                    Some(Value::Blob(bytes)) => Some(bytes.len()),
                    Some(other) => return Err(mismatch(name, "a string", other)),
                    None => None,
                }
            }
            Some(Instruction::Array(array)) => match fields.get(&array.name) {
                Some(Value::Array(values)) => Some(values.len()),
                Some(other) => return Err(mismatch(&array.name, "an array", other)),
                None => None,
            },
            _ => None,
        };

        let size = match size {
            Some(size) => size,
            None if length.optional => return Ok(()),
            None => 0,
        };
        let wire = size as i64 + length.offset as i64;
        if wire < 0 || wire > u32::MAX as i64 {
            return Err(EoError::StructuralError(format!(
                "The length \"{}\" is {} after its offset of {}",
                length.name, wire, length.offset
            )));
        }

        match self.protocol.resolve_type(&length.type_)? {
            DataType::Byte => add_byte(writer, wire as u32),
            DataType::Number(width) => Ok(writer.add_number(wire as u32, width)?),
            _ => Err(EoError::StructuralError(format!(
                "The length \"{}\" is not numeric",
                length.name
            ))),
        }
    }

    fn write_switch(
        &self,
        switch: &SwitchInstruction,
        scope: &[Instruction],
        fields: &Fields,
        writer: &mut EoWriter,
    ) -> Result<(), EoError> {
        let discriminator = find_field(scope, &switch.field)
            .ok_or_else(|| EoError::UnknownDefinition(switch.field.clone()))?;
        let data_type = self.protocol.resolve_type(&discriminator.type_)?;
        let value = fields
            .get(&switch.field)
            .ok_or_else(|| EoError::MissingField(switch.field.clone()))?;
        let number = self
            .protocol
            .discriminant(data_type, value)
            .ok_or_else(|| mismatch(&switch.field, "a switch discriminator", value))?;

        let payload_name = switch.payload_name();
        let payload = fields.get(&payload_name);
        match (self.protocol.select_case(switch, data_type, number)?, payload) {
            (None, None) => Ok(()),
            (None, Some(_)) => Err(EoError::StructuralError(format!(
                "No case of the switch on \"{}\" matches {}, but \"{}\" is set",
                switch.field, number, payload_name
            ))),
            (Some((case, tag)), Some(Value::Case(payload_tag, payload_fields))) => {
                if *payload_tag != tag {
                    return Err(EoError::StructuralError(format!(
                        "\"{}\" holds {:?} but \"{}\" selects {:?}",
                        payload_name, payload_tag, switch.field, tag
                    )));
                }
                self.write_list(&case.instructions, &case.instructions, payload_fields, writer)
            }
            (Some((case, _)), None) if case.instructions.is_empty() => Ok(()),
            (Some((_, tag)), None) => Err(EoError::StructuralError(format!(
                "\"{}\" selects {:?} but \"{}\" is missing",
                switch.field, tag, payload_name
            ))),
            (Some(_), Some(other)) => Err(mismatch(&payload_name, "a switch case", other)),
        }
    }

    fn write_value(
        &self,
        name: &str,
        data_type: DataType,
        value: &Value,
        fixed: Option<usize>,
        padded: bool,
        writer: &mut EoWriter,
    ) -> Result<(), EoError> {
        match (data_type, value) {
            (DataType::Byte, Value::Number(n)) => add_byte(writer, *n),
            (DataType::Number(width), Value::Number(n)) => Ok(writer.add_number(*n, width)?),
            (DataType::Bool(width), Value::Bool(b)) => Ok(writer.add_number(*b as u32, width)?),

            (DataType::String, Value::String(text)) => match fixed {
                Some(len) => Ok(writer.add_fixed_string(text, len, padded)?),
                None => {
                    writer.add_string(text);
                    Ok(())
                }
            },

            (DataType::EncodedString, Value::String(text)) => match fixed {
                Some(len) => Ok(writer.add_fixed_encoded_string(text, len, padded)?),
                None => {
                    writer.add_encoded_string(text);
                    Ok(())
                }
            },

            (DataType::Blob, Value::Blob(bytes)) => {
                writer.add_bytes(bytes);
                Ok(())
            }

            (DataType::Enum(index, width), _) => {
                let number = match value {
                    Value::Number(n) | Value::Enum(_, EnumValue::Unrecognized(n)) => *n,
                    Value::Enum(_, EnumValue::Known(variant)) => {
                        self.protocol.enum_number(index, variant).ok_or_else(|| {
                            EoError::UnknownDefinition(format!(
                                "{}::{}",
                                self.protocol.enum_at(index).name,
                                variant
                            ))
                        })?
                    }
                    other => return Err(mismatch(name, "an enum value", other)),
                };
                Ok(writer.add_number(number, width)?)
            }

            (DataType::Struct(index), _) => {
                let definition = self.protocol.struct_at(index);
                self.write_object(&definition.name, &definition.instructions, value, writer)
            }

            (DataType::Byte, other) | (DataType::Number(_), other) => Err(mismatch(name, "a number", other)),
            (DataType::Bool(_), other) => Err(mismatch(name, "a bool", other)),
            (DataType::String, other) | (DataType::EncodedString, other) => Err(mismatch(name, "a string", other)),
            (DataType::Blob, other) => Err(mismatch(name, "a blob", other)),
        }
    }

    fn write_literal(
        &self,
        data_type: DataType,
        literal: &Literal,
        fixed: Option<usize>,
        padded: bool,
        writer: &mut EoWriter,
    ) -> Result<(), EoError> {
        match (data_type, literal) {
            (DataType::Byte, Literal::Number(n)) => add_byte(writer, *n),
            (DataType::Number(width), Literal::Number(n)) | (DataType::Bool(width), Literal::Number(n)) => {
                Ok(writer.add_number(*n, width)?)
            }
            (_, Literal::Text(text)) => {
                let value = Value::String(text.clone());
                self.write_value("constant", data_type, &value, fixed, padded, writer)
            }
            (_, literal) => Err(EoError::StructuralError(format!(
                "The constant {} does not suit its type",
                literal
            ))),
        }
    }
}
