//! Stable 128-bit identifiers for addressing entities across their lifetime.
//!
//! A [`Guid`] survives serialization of its owner and outlives any particular
//! in-memory incarnation of the entity it names. The all-zero value is the
//! distinguished "unassigned" sentinel and is never a valid directory key.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserialize, Deserializer, Visitor};
use serde::ser::{Serialize, Serializer};
use uuid::Uuid;

/// Stable 128-bit identifier for one logical entity.
///
/// Equality is bitwise. The encoding is a fixed 16 bytes; see
/// [`Guid::to_bytes`] and [`Guid::from_slice`] for the persistence rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Guid(Uuid);

impl Guid {
	/// The unassigned sentinel. All 16 bytes are zero.
	pub const EMPTY: Guid = Guid(Uuid::nil());

	/// Generates a fresh process-unique identifier.
	pub fn random() -> Self {
		Guid(Uuid::new_v4())
	}

	/// Returns true for the unassigned sentinel.
	#[inline]
	pub fn is_empty(self) -> bool {
		self.0.is_nil()
	}

	/// Fixed-width 16-byte encoding.
	#[inline]
	pub fn to_bytes(self) -> [u8; 16] {
		*self.0.as_bytes()
	}

	/// Decodes the fixed-width encoding. Inverse of [`Guid::to_bytes`].
	#[inline]
	pub fn from_bytes(bytes: [u8; 16]) -> Self {
		Guid(Uuid::from_bytes(bytes))
	}

	/// Decodes a persisted buffer.
	///
	/// A buffer that is not exactly 16 bytes means the identifier was lost
	/// and must be regenerated, so this returns `None` rather than a decode
	/// error.
	pub fn from_slice(bytes: &[u8]) -> Option<Self> {
		let bytes: [u8; 16] = bytes.try_into().ok()?;
		Some(Self::from_bytes(bytes))
	}
}

impl fmt::Display for Guid {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.hyphenated().fmt(f)
	}
}

/// Failure to parse the hyphenated display form back into a [`Guid`].
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid guid string: {text:?}")]
pub struct ParseGuidError {
	text: Box<str>,
}

impl FromStr for Guid {
	type Err = ParseGuidError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Uuid::parse_str(s).map(Guid).map_err(|_| ParseGuidError { text: s.into() })
	}
}

impl Serialize for Guid {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_bytes(&self.to_bytes())
	}
}

impl<'de> Deserialize<'de> for Guid {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		deserializer.deserialize_bytes(GuidVisitor)
	}
}

struct GuidVisitor;

impl<'de> Visitor<'de> for GuidVisitor {
	type Value = Guid;

	fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("16 guid bytes")
	}

	fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Guid, E> {
		// Wrong-width buffers mean "absent, regenerate", not a decode error.
		Ok(Guid::from_slice(v).unwrap_or(Guid::EMPTY))
	}

	fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Guid, E> {
		self.visit_bytes(&v)
	}

	fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Guid, A::Error> {
		let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or(16));
		while let Some(b) = seq.next_element::<u8>()? {
			bytes.push(b);
		}
		Ok(Guid::from_slice(&bytes).unwrap_or(Guid::EMPTY))
	}
}
