//! eo-codec-compiler
//!
//! This crate implements:
//!  1) The JSON catalogue model (`types`) of enums, structs and packets,
//!  2) A catalogue verifier (names, type references, length back-references, switch cases, recursion),
//!  3) `compile_protocol` → [`Protocol`], which writes and reads packets by walking their instructions,
//!  4) Error types (`EoError`), and the `EoSerialize` trait for hand-written packets.

pub mod error;
pub mod types;
pub mod utils;
pub mod verifier;
pub mod compiler;
pub mod serialize;
pub mod deserialize;
pub mod traits;

pub use compiler::{compile_protocol, DataType, Protocol};
pub use error::EoError;
pub use traits::EoSerialize;
pub use types::PacketId;
