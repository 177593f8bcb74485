use std::collections::{BTreeMap, HashMap};

use eo_codec_schema::{byte_len, EoReader, Value};
use tracing::trace;

use crate::{
    compiler::{find_field, DataType, Protocol},
    error::EoError,
    types::{
        ArrayInstruction, FieldInstruction, Instruction, LengthInstruction, LengthSource, Literal,
        PacketId, SwitchInstruction,
    },
};

type Fields = BTreeMap<String, Value>;

/// Lengths read so far in one object, after their offset is applied.
type Lengths = HashMap<String, usize>;

impl Protocol {
    /// Read a whole packet body.
    pub fn deserialize_packet(&self, id: &PacketId, bytes: &[u8]) -> Result<Value, EoError> {
        let mut reader = EoReader::new(bytes);
        let value = self.read_packet(id, &mut reader)?;
        trace!(packet = %id, bytes = bytes.len(), "deserialized packet");
        Ok(value)
    }

    pub fn read_packet(&self, id: &PacketId, reader: &mut EoReader) -> Result<Value, EoError> {
        let packet = self
            .packet(id)
            .ok_or_else(|| EoError::UnknownDefinition(id.to_string()))?;
        Deserializer { protocol: self }.read_object(&id.to_string(), &packet.instructions, reader)
    }

    pub fn deserialize_struct(&self, name: &str, bytes: &[u8]) -> Result<Value, EoError> {
        self.read_struct(name, &mut EoReader::new(bytes))
    }

    pub fn read_struct(&self, name: &str, reader: &mut EoReader) -> Result<Value, EoError> {
        let definition = self
            .struct_definition(name)
            .ok_or_else(|| EoError::UnknownDefinition(name.to_owned()))?;
        Deserializer { protocol: self }.read_object(name, &definition.instructions, reader)
    }
}

struct Deserializer<'p> {
    protocol: &'p Protocol,
}

impl<'p> Deserializer<'p> {
    fn read_object(&self, name: &str, instructions: &[Instruction], reader: &mut EoReader) -> Result<Value, EoError> {
        let mut fields = Fields::new();
        let mut lengths = Lengths::new();
        let mut reader = reader.scope();
        self.read_list(instructions, instructions, &mut fields, &mut lengths, &mut reader)?;
        Ok(Value::Object(name.to_owned(), fields))
    }

    fn read_list(
        &self,
        scope: &[Instruction],
        list: &[Instruction],
        fields: &mut Fields,
        lengths: &mut Lengths,
        reader: &mut EoReader,
    ) -> Result<(), EoError> {
        for instruction in list {
            match instruction {
                Instruction::Field(field) => self.read_field(field, fields, lengths, reader)?,
                Instruction::Array(array) => self.read_array(array, fields, lengths, reader)?,
                Instruction::Length(length) => self.read_length(length, lengths, reader)?,
                Instruction::Switch(switch) => self.read_switch(switch, scope, fields, reader)?,
                Instruction::Chunked(chunked) => {
                    let mut reader = reader.chunked();
                    self.read_list(scope, &chunked.instructions, fields, lengths, &mut reader)?;
                }
                Instruction::Dummy(dummy) => {
                    let data_type = self.protocol.resolve_type(&dummy.type_)?;
                    let fixed = match &dummy.value {
                        Literal::Text(text) => Some(byte_len(text)),
                        Literal::Number(_) => None,
                    };
                    self.read_value(data_type, fixed, false, reader)?;
                }
                Instruction::Break => {
                    if !reader.chunk_has_break() {
                        return Err(EoError::StructuralError(format!(
                            "Expected a break at position {}",
                            reader.position()
                        )));
                    }
                    reader.next_chunk()?;
                }
            }
        }
        Ok(())
    }

    fn read_field(
        &self,
        field: &FieldInstruction,
        fields: &mut Fields,
        lengths: &Lengths,
        reader: &mut EoReader,
    ) -> Result<(), EoError> {
        if field.optional && reader.remaining() == 0 {
            return Ok(());
        }
        let data_type = self.protocol.resolve_type(&field.type_)?;
        let fixed = match &field.length {
            Some(LengthSource::Fixed(n)) => Some(*n as usize),
            Some(LengthSource::Reference(name)) => lengths.get(name).copied(),
            None => None,
        };
        let value = self.read_value(data_type, fixed, field.padded, reader)?;
        // Constants are read and discarded.
        if let Some(name) = &field.name {
            fields.insert(name.clone(), value);
        }
        Ok(())
    }

    fn read_array(
        &self,
        array: &ArrayInstruction,
        fields: &mut Fields,
        lengths: &Lengths,
        reader: &mut EoReader,
    ) -> Result<(), EoError> {
        if array.optional && reader.remaining() == 0 {
            return Ok(());
        }
        let element = self.protocol.resolve_type(&array.type_)?;
        let count = match &array.length {
            Some(LengthSource::Fixed(n)) => Some(*n as usize),
            Some(LengthSource::Reference(name)) => Some(lengths.get(name).copied().unwrap_or(0)),
            None if array.delimited => None,
            // Fixed-size elements fill whatever is left of the chunk.
            None => match self.protocol.fixed_size(element, None) {
                Some(size) if size > 0 => Some(reader.remaining() / size),
                _ => None,
            },
        };

        let mut values = Vec::new();
        match count {
            Some(count) => {
                // The count comes off the wire, so stop once the data runs out.
                for i in 0..count {
                    let start = reader.position();
                    values.push(self.read_value(element, None, false, reader)?);
                    if array.delimited && (array.trailing_delimiter || i + 1 < count) {
                        reader.next_chunk()?;
                    }
                    if reader.position() == start && reader.remaining() == 0 {
                        break;
                    }
                }
            }
            None => {
                while reader.remaining() > 0 {
                    let start = reader.position();
                    values.push(self.read_value(element, None, false, reader)?);
                    if array.delimited {
                        reader.next_chunk()?;
                    } else if reader.position() == start {
                        break;
                    }
                }
            }
        }

        fields.insert(array.name.clone(), Value::Array(values));
        Ok(())
    }

    fn read_length(&self, length: &LengthInstruction, lengths: &mut Lengths, reader: &mut EoReader) -> Result<(), EoError> {
        if length.optional && reader.remaining() == 0 {
            return Ok(());
        }
        let wire = match self.protocol.resolve_type(&length.type_)? {
            DataType::Byte => reader.get_byte() as u32,
            DataType::Number(width) => reader.get_number(width),
            _ => {
                return Err(EoError::StructuralError(format!(
                    "The length \"{}\" is not numeric",
                    length.name
                )))
            }
        };
        let value = (wire as i64 - length.offset as i64).max(0);
        lengths.insert(length.name.clone(), value as usize);
        Ok(())
    }

    fn read_switch(
        &self,
        switch: &SwitchInstruction,
        scope: &[Instruction],
        fields: &mut Fields,
        reader: &mut EoReader,
    ) -> Result<(), EoError> {
        let discriminator = find_field(scope, &switch.field)
            .ok_or_else(|| EoError::UnknownDefinition(switch.field.clone()))?;
        let data_type = self.protocol.resolve_type(&discriminator.type_)?;
        let number = match fields.get(&switch.field) {
            Some(value) => self.protocol.discriminant(data_type, value),
            None => None,
        };
        // An optional discriminator that was absent selects nothing.
        let number = match number {
            Some(number) => number,
            None => return Ok(()),
        };

        if let Some((case, tag)) = self.protocol.select_case(switch, data_type, number)? {
            let mut payload = Fields::new();
            let mut lengths = Lengths::new();
            self.read_list(&case.instructions, &case.instructions, &mut payload, &mut lengths, reader)?;
            fields.insert(switch.payload_name(), Value::Case(tag, payload));
        }
        Ok(())
    }

    fn read_value(
        &self,
        data_type: DataType,
        fixed: Option<usize>,
        padded: bool,
        reader: &mut EoReader,
    ) -> Result<Value, EoError> {
        Ok(match data_type {
            DataType::Byte => Value::Number(reader.get_byte() as u32),
            DataType::Number(width) => Value::Number(reader.get_number(width)),
            DataType::Bool(width) => Value::Bool(reader.get_number(width) != 0),
            DataType::String => Value::String(match fixed {
                Some(len) => reader.get_fixed_string(len, padded),
                None => reader.get_string(),
            }),
            DataType::EncodedString => Value::String(match fixed {
                Some(len) => reader.get_fixed_encoded_string(len, padded),
                None => reader.get_encoded_string(),
            }),
            DataType::Blob => {
                let len = reader.remaining();
                Value::Blob(reader.get_bytes(len).to_vec())
            }
            DataType::Enum(index, width) => {
                let number = reader.get_number(width);
                Value::Enum(
                    self.protocol.enum_at(index).name.clone(),
                    self.protocol.enum_variant(index, number),
                )
            }
            DataType::Struct(index) => {
                let definition = self.protocol.struct_at(index);
                self.read_object(&definition.name, &definition.instructions, reader)?
            }
        })
    }
}
