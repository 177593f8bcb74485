//! Wire primitives of the EO protocol: the base-253 number encoding, the
//! Windows-1252 and "encoded" string forms, and the chunked byte buffers
//! that packets are read from and written to.
//!
//! ```
//! use eo_codec_schema::*;
//!
//! let mut writer = EoWriter::new();
//! writer.add_char(123).unwrap();
//! writer.add_byte(BREAK_BYTE);
//! writer.add_short(12345).unwrap();
//! let bytes = writer.into_bytes();
//! assert_eq!(bytes, [0x7C, 0xFF, 0xCA, 0x31]);
//!
//! let mut reader = EoReader::new(&bytes);
//! reader.set_chunked(true);
//! assert_eq!(reader.get_short(), 123);
//! reader.next_chunk().unwrap();
//! assert_eq!(reader.get_short(), 12345);
//! ```

pub mod bb;
pub mod error;
pub mod number;
pub mod string;
pub mod value;

pub use bb::*;
pub use error::*;
pub use number::*;
pub use string::*;
pub use value::*;
