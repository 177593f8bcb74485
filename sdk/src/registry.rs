use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use eo_codec_compiler::{traits::EoSerialize, EoError};
use eo_codec_schema::{EoReader, EoWriter};
use tracing::debug;

/// The two header bytes that identify a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PacketKey {
    pub family: u8,
    pub action: u8,
}

impl PacketKey {
    pub const fn new(family: u8, action: u8) -> PacketKey {
        PacketKey { family, action }
    }
}

impl fmt::Display for PacketKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}_{}", self.family, self.action)
    }
}

/// A hand-written packet type.
pub trait Packet: EoSerialize + fmt::Debug + 'static {
    const FAMILY: u8;
    const ACTION: u8;

    fn packet_key() -> PacketKey {
        PacketKey::new(Self::FAMILY, Self::ACTION)
    }
}

/// Object-safe view of any [`Packet`], as handed out by a [`PacketRegistry`].
pub trait DynPacket: fmt::Debug {
    fn key(&self) -> PacketKey;
    fn write_body(&self, writer: &mut EoWriter) -> Result<(), EoError>;
    fn as_any(&self) -> &dyn Any;
}

impl<T: Packet> DynPacket for T {
    fn key(&self) -> PacketKey {
        T::packet_key()
    }

    fn write_body(&self, writer: &mut EoWriter) -> Result<(), EoError> {
        EoSerialize::serialize(self, writer)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl dyn DynPacket {
    pub fn downcast_ref<T: Packet>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

pub type Constructor = fn(&mut EoReader) -> Result<Box<dyn DynPacket>, EoError>;

/// A [`Constructor`] for `T`.
pub fn construct<T: Packet>(reader: &mut EoReader) -> Result<Box<dyn DynPacket>, EoError> {
    Ok(Box::new(T::deserialize(reader)?))
}

/// Routes incoming packets to their constructor by family and action.
pub struct PacketRegistry {
    constructors: HashMap<PacketKey, Constructor>,
}

impl PacketRegistry {
    /// Build the table from `(family, action, constructor)` triples.
    /// Returns `Err(EoError::DuplicatePacket)` if a pair is listed twice.
    pub fn new(entries: &[(u8, u8, Constructor)]) -> Result<PacketRegistry, EoError> {
        let mut constructors = HashMap::with_capacity(entries.len());
        for &(family, action, constructor) in entries {
            let key = PacketKey::new(family, action);
            if constructors.insert(key, constructor).is_some() {
                return Err(EoError::DuplicatePacket {
                    family: family.to_string(),
                    action: action.to_string(),
                });
            }
        }
        debug!(packets = constructors.len(), "built packet registry");
        Ok(PacketRegistry { constructors })
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    pub fn contains(&self, key: PacketKey) -> bool {
        self.constructors.contains_key(&key)
    }

    /// Read the packet registered for `key` from the rest of `reader`.
    pub fn deserialize(&self, key: PacketKey, reader: &mut EoReader) -> Result<Box<dyn DynPacket>, EoError> {
        let constructor = self
            .constructors
            .get(&key)
            .ok_or_else(|| EoError::UnknownDefinition(key.to_string()))?;
        constructor(reader)
    }

    /// Read a whole packet: the family and action bytes, then the body.
    pub fn read_packet(&self, bytes: &[u8]) -> Result<Box<dyn DynPacket>, EoError> {
        let mut reader = EoReader::new(bytes);
        let action = reader.get_byte();
        let family = reader.get_byte();
        self.deserialize(PacketKey::new(family, action), &mut reader)
    }
}

/// Write a packet with its action and family bytes in front.
pub fn write_packet(packet: &dyn DynPacket) -> Result<Vec<u8>, EoError> {
    let key = packet.key();
    let mut writer = EoWriter::new();
    writer.add_byte(key.action);
    writer.add_byte(key.family);
    packet.write_body(&mut writer)?;
    Ok(writer.into_bytes())
}
