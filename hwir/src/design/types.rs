use std::fmt;

use serde::{Serialize, Serializer};

/// Hardware type of a value or a port
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Type {
	/// Untyped bit vector with given width
	Bits(u32),

	/// Unsigned integer with given width
	UInt(u32),

	/// Signed integer with given width
	SInt(u32),

	/// Clock signal
	Clock,
}

impl Type {
	/// Bit width of the type
	pub fn width(&self) -> u32 {
		use Type::*;
		match self {
			Bits(w) | UInt(w) | SInt(w) => *w,
			Clock => 1,
		}
	}

	pub fn is_clock(&self) -> bool {
		matches!(self, Type::Clock)
	}

	pub fn is_signed(&self) -> bool {
		matches!(self, Type::SInt(_))
	}

	/// Checks whether values of this type can take part in arithmetic
	pub fn is_arithmetic(&self) -> bool {
		matches!(self, Type::Bits(_) | Type::UInt(_) | Type::SInt(_))
	}
}

impl fmt::Display for Type {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		use Type::*;
		match self {
			Bits(w) => write!(f, "i{}", w),
			UInt(w) => write!(f, "ui{}", w),
			SInt(w) => write!(f, "si{}", w),
			Clock => write!(f, "clock"),
		}
	}
}

impl Serialize for Type {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_type_names() {
		assert_eq!(Type::Bits(4).to_string(), "i4");
		assert_eq!(Type::UInt(8).to_string(), "ui8");
		assert_eq!(Type::SInt(16).to_string(), "si16");
		assert_eq!(Type::Clock.to_string(), "clock");
	}

	#[test]
	fn test_widths() {
		assert_eq!(Type::UInt(8).width(), 8);
		assert_eq!(Type::Clock.width(), 1);
		assert!(!Type::Clock.is_arithmetic());
		assert!(Type::SInt(3).is_signed());
	}
}
