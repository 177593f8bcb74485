use crate::error::EoError;
use eo_codec_schema::{EoReader, EoWriter};

/// Types with a hand-written wire layout.
/// We require `Sized` so that `Self` can be constructed.
pub trait EoSerialize: Sized {
    fn serialize(&self, writer: &mut EoWriter) -> Result<(), EoError>;
    fn deserialize(reader: &mut EoReader) -> Result<Self, EoError>;

    /// Write into a fresh buffer and return its bytes.
    fn to_bytes(&self) -> Result<Vec<u8>, EoError> {
        let mut writer = EoWriter::new();
        self.serialize(&mut writer)?;
        Ok(writer.into_bytes())
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, EoError> {
        Self::deserialize(&mut EoReader::new(bytes))
    }
}
