use std::collections::{HashMap, HashSet};

use eo_codec_schema::byte_len;
use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    compiler::{DataType, Protocol, PRIMITIVE_TYPES},
    error::EoError,
    types::{Instruction, LengthSource, Literal, SwitchInstruction},
    utils::{quote, verifier_error},
};

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

fn check_identifier(what: &str, name: &str) -> Result<(), EoError> {
    if IDENTIFIER.is_match(name) {
        Ok(())
    } else {
        Err(verifier_error(format!("Invalid {} name {}", what, quote(name))))
    }
}

/// Returns `Ok(())` if verification passed, or `Err(EoError::VerifierError(_))` otherwise.
pub fn verify_protocol(protocol: &Protocol) -> Result<(), EoError> {
    let catalogue = protocol.catalogue();
    let mut defined_types: HashSet<&str> = PRIMITIVE_TYPES.iter().copied().collect();

    // 1) Check duplicate / reserved type names
    for name in catalogue
        .enums
        .iter()
        .map(|e| e.name.as_str())
        .chain(catalogue.structs.iter().map(|s| s.name.as_str()))
    {
        check_identifier("type", name)?;
        if PRIMITIVE_TYPES.contains(&name) {
            return Err(verifier_error(format!("The type name {} is reserved", quote(name))));
        }
        if !defined_types.insert(name) {
            return Err(verifier_error(format!("The type {} is defined twice", quote(name))));
        }
    }

    let mut packet_ids = HashSet::new();
    for packet in &catalogue.packets {
        check_identifier("family", &packet.family)?;
        check_identifier("action", &packet.action)?;
        if !packet_ids.insert((packet.family.as_str(), packet.action.as_str())) {
            return Err(verifier_error(format!(
                "The packet {}_{} is defined twice",
                packet.family, packet.action
            )));
        }
    }

    // 2) Check enumerations
    for def in &catalogue.enums {
        let width = match protocol.resolve_type(&def.type_)? {
            DataType::Number(width) => width,
            _ => {
                return Err(verifier_error(format!(
                    "The enum {} must have a numeric type",
                    quote(&def.name)
                )))
            }
        };
        let mut names = HashSet::new();
        let mut values = HashSet::new();
        for variant in &def.values {
            check_identifier("variant", &variant.name)?;
            if !names.insert(variant.name.as_str()) {
                return Err(verifier_error(format!(
                    "The variant {} of {} is defined twice",
                    quote(&variant.name),
                    quote(&def.name)
                )));
            }
            if !values.insert(variant.value) {
                return Err(verifier_error(format!(
                    "The value {} is used twice in {}",
                    variant.value,
                    quote(&def.name)
                )));
            }
            if variant.value >= width.max() {
                return Err(verifier_error(format!(
                    "The value of {} does not fit in a {}",
                    quote(&variant.name),
                    width.name()
                )));
            }
        }
    }

    // 3) Check instruction lists
    for def in &catalogue.structs {
        Scope::new(protocol, format!("struct {}", quote(&def.name))).verify(&def.instructions, false)?;
    }
    for def in &catalogue.packets {
        Scope::new(protocol, format!("packet {}_{}", def.family, def.action))
            .verify(&def.instructions, false)?;
    }

    // 4) Check that structs do not contain themselves recursively
    let mut state: HashMap<usize, u8> = HashMap::new();
    fn check_recursion(
        index: usize,
        protocol: &Protocol,
        state: &mut HashMap<usize, u8>,
    ) -> Result<(), EoError> {
        match state.get(&index) {
            Some(1) => {
                return Err(verifier_error(format!(
                    "Recursive nesting of {} is not allowed",
                    quote(&protocol.struct_at(index).name)
                )))
            }
            Some(_) => return Ok(()),
            None => {}
        }
        state.insert(index, 1);
        let mut nested = Vec::new();
        nested_structs(protocol, &protocol.struct_at(index).instructions, &mut nested);
        for child in nested {
            check_recursion(child, protocol, state)?;
        }
        state.insert(index, 2);
        Ok(())
    }

    for index in 0..catalogue.structs.len() {
        check_recursion(index, protocol, &mut state)?;
    }

    Ok(())
}

/// Structs embedded by fields and fixed-length arrays. Other arrays may
/// hold their own struct since they can be empty.
fn nested_structs(protocol: &Protocol, instructions: &[Instruction], out: &mut Vec<usize>) {
    for instruction in instructions {
        match instruction {
            Instruction::Field(field) => {
                if let Ok(DataType::Struct(index)) = protocol.resolve_type(&field.type_) {
                    out.push(index);
                }
            }
            Instruction::Array(array) => {
                if let (Ok(DataType::Struct(index)), Some(LengthSource::Fixed(n))) =
                    (protocol.resolve_type(&array.type_), &array.length)
                {
                    if !array.optional && *n > 0 {
                        out.push(index);
                    }
                }
            }
            Instruction::Chunked(chunked) => nested_structs(protocol, &chunked.instructions, out),
            Instruction::Switch(switch) => {
                for case in &switch.cases {
                    nested_structs(protocol, &case.instructions, out);
                }
            }
            _ => {}
        }
    }
}

/// Names and lengths visible to one object: a struct, a packet, or a
/// switch case. Chunked sections share the scope they appear in.
struct Scope<'p> {
    protocol: &'p Protocol,
    owner:    String,
    names:    HashSet<String>,
    fields:   HashMap<String, DataType>,
    lengths:  Vec<(String, usize)>,
}

impl<'p> Scope<'p> {
    fn new(protocol: &'p Protocol, owner: String) -> Scope<'p> {
        Scope {
            protocol,
            owner,
            names: HashSet::new(),
            fields: HashMap::new(),
            lengths: Vec::new(),
        }
    }

    fn error(&self, message: String) -> EoError {
        verifier_error(format!("{} in {}", message, self.owner))
    }

    fn verify(mut self, instructions: &[Instruction], in_chunked: bool) -> Result<(), EoError> {
        self.walk(instructions, in_chunked)?;
        for (name, uses) in &self.lengths {
            if *uses != 1 {
                return Err(self.error(format!(
                    "The length {} must be used by exactly one field, not {}",
                    quote(name),
                    uses
                )));
            }
        }
        Ok(())
    }

    fn declare(&mut self, name: &str) -> Result<(), EoError> {
        check_identifier("field", name)?;
        if !self.names.insert(name.to_owned()) {
            return Err(self.error(format!("The name {} is used twice", quote(name))));
        }
        Ok(())
    }

    fn use_length(&mut self, length: &Option<LengthSource>, user: &str) -> Result<(), EoError> {
        if let Some(LengthSource::Reference(name)) = length {
            match self.lengths.iter_mut().find(|(n, _)| n == name) {
                Some((_, uses)) => *uses += 1,
                None => {
                    return Err(self.error(format!(
                        "The field {} refers to {}, which is not a length declared before it",
                        quote(user),
                        quote(name)
                    )))
                }
            }
        }
        Ok(())
    }

    fn walk(&mut self, instructions: &[Instruction], in_chunked: bool) -> Result<(), EoError> {
        let mut seen_optional = false;
        for instruction in instructions {
            let optional = match instruction {
                Instruction::Field(field) => field.optional,
                Instruction::Array(array) => array.optional,
                Instruction::Length(length) => length.optional,
                _ => false,
            };
            if seen_optional && !optional {
                return Err(self.error("Only optional instructions may follow an optional one".to_owned()));
            }
            seen_optional |= optional;

            match instruction {
                Instruction::Field(field) => {
                    let data_type = self.protocol.resolve_type(&field.type_)?;
                    let label = field.name.clone().unwrap_or_else(|| field.type_.clone());

                    match (&field.name, &field.value) {
                        (None, None) => {
                            return Err(self.error(format!(
                                "An unnamed {} field must have a value",
                                quote(&field.type_)
                            )))
                        }
                        (Some(name), Some(_)) => {
                            return Err(self.error(format!(
                                "The named field {} cannot have a value",
                                quote(name)
                            )))
                        }
                        _ => {}
                    }

                    if field.length.is_some() && !data_type.is_string() {
                        return Err(self.error(format!(
                            "Only string fields can have a length, not {}",
                            quote(&label)
                        )));
                    }
                    if field.padded && field.length.is_none() {
                        return Err(self.error(format!(
                            "The padded field {} must have a length",
                            quote(&label)
                        )));
                    }
                    self.use_length(&field.length, &label)?;

                    if let Some(value) = &field.value {
                        self.check_literal(data_type, value, field.length.as_ref(), field.padded)?;
                    }
                    if let Some(name) = &field.name {
                        self.declare(name)?;
                        self.fields.insert(name.clone(), data_type);
                    }
                }

                Instruction::Array(array) => {
                    let element = self.protocol.resolve_type(&array.type_)?;
                    if element == DataType::Blob {
                        return Err(self.error(format!(
                            "The array {} cannot hold blobs",
                            quote(&array.name)
                        )));
                    }
                    if array.delimited && !in_chunked {
                        return Err(self.error(format!(
                            "The delimited array {} must be inside a chunked section",
                            quote(&array.name)
                        )));
                    }
                    self.use_length(&array.length, &array.name)?;
                    self.declare(&array.name)?;
                }

                Instruction::Length(length) => {
                    if !self.protocol.resolve_type(&length.type_)?.is_numeric() {
                        return Err(self.error(format!(
                            "The length {} must have a numeric type",
                            quote(&length.name)
                        )));
                    }
                    self.declare(&length.name)?;
                    self.lengths.push((length.name.clone(), 0));
                }

                Instruction::Switch(switch) => self.verify_switch(switch, in_chunked)?,

                Instruction::Chunked(chunked) => {
                    if chunked.instructions.is_empty() {
                        return Err(self.error("A chunked section cannot be empty".to_owned()));
                    }
                    self.walk(&chunked.instructions, true)?;
                }

                Instruction::Dummy(dummy) => {
                    let data_type = self.protocol.resolve_type(&dummy.type_)?;
                    self.check_literal(data_type, &dummy.value, None, false)?;
                }

                Instruction::Break => {
                    if !in_chunked {
                        return Err(self.error("A break must be inside a chunked section".to_owned()));
                    }
                }
            }
        }
        Ok(())
    }

    fn verify_switch(&mut self, switch: &SwitchInstruction, in_chunked: bool) -> Result<(), EoError> {
        let data_type = match self.fields.get(&switch.field) {
            Some(&data_type) => data_type,
            None => {
                return Err(self.error(format!(
                    "The switch on {} must follow that field",
                    quote(&switch.field)
                )))
            }
        };
        if !matches!(
            data_type,
            DataType::Byte | DataType::Number(_) | DataType::Bool(_) | DataType::Enum(_, _)
        ) {
            return Err(self.error(format!(
                "The switch field {} must be a number or an enum",
                quote(&switch.field)
            )));
        }
        if switch.cases.is_empty() {
            return Err(self.error(format!(
                "The switch on {} has no cases",
                quote(&switch.field)
            )));
        }

        let mut numbers = HashSet::new();
        for (i, case) in switch.cases.iter().enumerate() {
            match (&case.value, case.default) {
                (Some(_), true) | (None, false) => {
                    return Err(self.error(format!(
                        "Each case of the switch on {} needs either a value or default",
                        quote(&switch.field)
                    )))
                }
                (None, true) => {
                    if i + 1 != switch.cases.len() {
                        return Err(self.error(format!(
                            "The default case of the switch on {} must come last",
                            quote(&switch.field)
                        )));
                    }
                }
                (Some(label), false) => {
                    let number = self
                        .protocol
                        .case_number(data_type, label)
                        .map_err(|e| self.error(e.to_string()))?;
                    if !numbers.insert(number) {
                        return Err(self.error(format!(
                            "The case {} of the switch on {} is used twice",
                            label,
                            quote(&switch.field)
                        )));
                    }
                }
            }

            Scope::new(
                self.protocol,
                format!("a case of the switch on {} in {}", quote(&switch.field), self.owner),
            )
            .verify(&case.instructions, in_chunked)?;
        }

        self.declare(&switch.payload_name())
    }

    fn check_literal(
        &self,
        data_type: DataType,
        value: &Literal,
        length: Option<&LengthSource>,
        padded: bool,
    ) -> Result<(), EoError> {
        match (data_type, value) {
            (DataType::Byte, Literal::Number(n)) if *n <= u8::MAX as u32 => Ok(()),
            (DataType::Number(width), Literal::Number(n))
            | (DataType::Bool(width), Literal::Number(n))
                if *n < width.max() =>
            {
                Ok(())
            }
            (DataType::String, Literal::Text(text)) | (DataType::EncodedString, Literal::Text(text)) => {
                match length {
                    Some(LengthSource::Fixed(n)) => {
                        let len = byte_len(text);
                        let n = *n as usize;
                        if len == n || (padded && len < n) {
                            Ok(())
                        } else {
                            Err(self.error(format!("The value {} does not fit in {} bytes", value, n)))
                        }
                    }
                    Some(LengthSource::Reference(_)) => {
                        Err(self.error(format!("The constant {} cannot have a length field", value)))
                    }
                    None => Ok(()),
                }
            }
            _ => Err(self.error(format!("The value {} does not suit its type", value))),
        }
    }
}
