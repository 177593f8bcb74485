//! eo-codec
//!
//! This crate provides runtime support for working with EO packets.
//!
//! - `EoSerialize` trait and `EoError` (re-exported from compiler)
//! - `Protocol` for packets described by a JSON catalogue
//! - `PacketRegistry` for routing incoming hand-written packets
//! - Readers and writers for the chunked byte stream, etc.

pub mod registry;

pub use eo_codec_compiler::{compile_protocol, traits::EoSerialize, EoError, PacketId, Protocol};
pub use eo_codec_schema::{CaseTag, EnumValue, EoReader, EoWriter, NumberWidth, Value, WireError, BREAK_BYTE};
pub use registry::{construct, write_packet, Constructor, DynPacket, Packet, PacketKey, PacketRegistry};

/// Decode a packet body with `protocol` into a pretty‐printed JSON string.
pub fn packet_to_json(protocol: &Protocol, id: &PacketId, bytes: &[u8]) -> Result<String, EoError> {
    let value = protocol.deserialize_packet(id, bytes)?;
    Ok(serde_json::to_string_pretty(&value)?)
}

pub mod traits {
    pub use eo_codec_compiler::traits::EoSerialize;
}

pub mod error {
    pub use eo_codec_compiler::error::EoError;
    pub use eo_codec_schema::WireError;
}

pub mod types {
    pub use eo_codec_compiler::types::*;
}
