use eo_codec_schema::WireError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EoError {
    #[error("Wire error: {0}")]
    Wire(#[from] WireError),

    #[error("Schema load error: {0}")]
    Load(#[from] serde_json::Error),

    #[error("Verifier error: {0}")]
    VerifierError(String),

    #[error("Unknown definition \"{0}\"")]
    UnknownDefinition(String),

    #[error("Missing required field \"{0}\"")]
    MissingField(String),

    #[error("Field \"{field}\" expected {expected} but found {found}")]
    TypeMismatch {
        field:    String,
        expected: &'static str,
        found:    String,
    },

    #[error("Structural error: {0}")]
    StructuralError(String),

    #[error("Packet {family}_{action} is registered twice")]
    DuplicatePacket {
        family: String,
        action: String,
    },
}
