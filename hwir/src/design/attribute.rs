use std::collections::BTreeMap;
use std::fmt;

use num_bigint::BigInt;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use super::Type;

/// Compile-time value attached to IR operations.
///
/// Attributes are totally ordered and hashable, so maps of attributes can be
/// used as lookup keys.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Attribute {
	/// Presence-only attribute
	Unit,
	Bool(bool),
	Int(BigInt),
	Str(String),
	Type(Type),
	List(Vec<Attribute>),
	Dict(BTreeMap<String, Attribute>),
}

impl Attribute {
	/// Name of the attribute kind, used in parameter declarations
	pub fn type_name(&self) -> &'static str {
		use Attribute::*;
		match self {
			Unit => "none",
			Bool(_) => "i1",
			Int(_) => "i64",
			Str(_) => "string",
			Type(_) => "type",
			List(_) => "array",
			Dict(_) => "dict",
		}
	}

	pub fn as_int(&self) -> Option<&BigInt> {
		match self {
			Attribute::Int(v) => Some(v),
			_ => None,
		}
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Attribute::Bool(v) => Some(*v),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Attribute::Str(v) => Some(v),
			_ => None,
		}
	}

	pub fn as_type(&self) -> Option<&Type> {
		match self {
			Attribute::Type(t) => Some(t),
			_ => None,
		}
	}
}

impl fmt::Display for Attribute {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		use Attribute::*;
		match self {
			Unit => write!(f, "unit"),
			Bool(v) => write!(f, "{}", v),
			Int(v) => write!(f, "{}", v),
			Str(v) => write!(f, "{:?}", v),
			Type(t) => write!(f, "{}", t),
			List(items) => {
				write!(f, "[")?;
				for (n, item) in items.iter().enumerate() {
					if n > 0 {
						write!(f, ", ")?;
					}
					write!(f, "{}", item)?;
				}
				write!(f, "]")
			},
			Dict(entries) => {
				write!(f, "{{")?;
				for (n, (name, value)) in entries.iter().enumerate() {
					if n > 0 {
						write!(f, ", ")?;
					}
					write!(f, "{} = {}", name, value)?;
				}
				write!(f, "}}")
			},
		}
	}
}

impl Serialize for Attribute {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		use Attribute::*;
		match self {
			Unit => serializer.serialize_unit(),
			Bool(v) => serializer.serialize_bool(*v),
			Int(v) => match i64::try_from(v) {
				Ok(v) => serializer.serialize_i64(v),
				Err(_) => serializer.collect_str(v),
			},
			Str(v) => serializer.serialize_str(v),
			Type(t) => t.serialize(serializer),
			List(items) => {
				let mut seq = serializer.serialize_seq(Some(items.len()))?;
				for item in items {
					seq.serialize_element(item)?;
				}
				seq.end()
			},
			Dict(entries) => {
				let mut map = serializer.serialize_map(Some(entries.len()))?;
				for (name, value) in entries {
					map.serialize_entry(name, value)?;
				}
				map.end()
			},
		}
	}
}

macro_rules! impl_int_attribute {
	($($t: ty),*) => {
		$(
			impl From<$t> for Attribute {
				fn from(value: $t) -> Self {
					Attribute::Int(BigInt::from(value))
				}
			}
		)*
	}
}

impl_int_attribute!(i32, i64, u32, u64, usize);

impl From<BigInt> for Attribute {
	fn from(value: BigInt) -> Self {
		Attribute::Int(value)
	}
}

impl From<bool> for Attribute {
	fn from(value: bool) -> Self {
		Attribute::Bool(value)
	}
}

impl From<&str> for Attribute {
	fn from(value: &str) -> Self {
		Attribute::Str(value.into())
	}
}

impl From<String> for Attribute {
	fn from(value: String) -> Self {
		Attribute::Str(value)
	}
}

impl From<Type> for Attribute {
	fn from(value: Type) -> Self {
		Attribute::Type(value)
	}
}

impl<T: Into<Attribute>> From<Vec<T>> for Attribute {
	fn from(value: Vec<T>) -> Self {
		Attribute::List(value.into_iter().map(Into::into).collect())
	}
}
