//! Object identifier (SHA-1 digest)
//!
//! Object IDs are 40-character lower-case hexadecimal strings. They uniquely
//! identify every stored blob, tree and commit.
//!
//! ## Storage
//!
//! Objects are stored in `objects/<first-2-chars>/<remaining-38-chars>`

use crate::artifacts::objects::{OBJECT_ID_LENGTH, OBJECT_ID_RAW_LENGTH};
use crate::errors::{Error, Result};
use std::io;
use std::path::PathBuf;
use std::str::FromStr;

/// Length of the abbreviated form shown to users
pub const SHORT_OBJECT_ID_LENGTH: usize = 7;

/// Object identifier (SHA-1 digest, hex encoded)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(String);

impl ObjectId {
    /// Parse and validate an object ID from a string
    ///
    /// Upper-case digits are accepted and normalized to lower case.
    pub fn try_parse(id: impl AsRef<str>) -> Result<Self> {
        let id = id.as_ref();

        if id.len() != OBJECT_ID_LENGTH {
            return Err(Error::InvalidObjectId(format!(
                "expected {OBJECT_ID_LENGTH} characters, got {}",
                id.len()
            )));
        }
        if !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidObjectId(id.to_string()));
        }

        Ok(Self(id.to_ascii_lowercase()))
    }

    /// Build an object ID from a raw 20-byte digest
    pub fn from_raw(raw: &[u8; OBJECT_ID_RAW_LENGTH]) -> Self {
        Self(raw.iter().map(|byte| format!("{byte:02x}")).collect())
    }

    /// Raw 20-byte form, as embedded in tree entries and the index
    pub fn to_raw(&self) -> [u8; OBJECT_ID_RAW_LENGTH] {
        let mut raw = [0u8; OBJECT_ID_RAW_LENGTH];
        let hex = self.0.as_bytes();

        for (i, byte) in raw.iter_mut().enumerate() {
            *byte = (hex_value(hex[2 * i]) << 4) | hex_value(hex[2 * i + 1]);
        }

        raw
    }

    /// Write the object ID in binary format (20 bytes)
    pub fn write_h40_to<W: io::Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.to_raw())?;
        Ok(())
    }

    /// Read an object ID from binary format (20 bytes)
    pub fn read_h40_from<R: io::Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let mut raw = [0u8; OBJECT_ID_RAW_LENGTH];
        reader.read_exact(&mut raw)?;

        Ok(Self::from_raw(&raw))
    }

    /// Convert to the object's location inside the object store
    ///
    /// Splits the hash as `XX/YYYYYY...` where XX is the first 2 chars.
    pub fn to_path(&self) -> PathBuf {
        let (dir, file) = self.0.split_at(2);
        PathBuf::from(dir).join(file)
    }

    /// First 7 characters of the hash
    pub fn to_short_oid(&self) -> String {
        self.0[..SHORT_OBJECT_ID_LENGTH].to_string()
    }
}

// validated on construction, so only hex digits reach here
fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        _ => 0,
    }
}

impl FromStr for ObjectId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::try_parse(s)
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
