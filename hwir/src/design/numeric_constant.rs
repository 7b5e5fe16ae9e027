use std::fmt;

use num_bigint::BigInt;

use super::{IrError, Type};

/// Represents a numeric constant value of a given hardware type
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NumericConstant {
	value: BigInt,
	ty: Type,
}

impl NumericConstant {
	/// Creates a new constant, checking that the value fits in the type
	pub fn new(value: BigInt, ty: Type) -> Result<Self, IrError> {
		let (min, max) = Self::range(&ty);
		if value < min || value > max {
			return Err(IrError::ConstantOutOfRange { value, ty });
		}

		Ok(Self { value, ty })
	}

	/// Zero value of the given type
	pub fn zero(ty: Type) -> Self {
		Self {
			value: BigInt::from(0),
			ty,
		}
	}

	/// Inclusive range of values representable in the given type
	pub fn range(ty: &Type) -> (BigInt, BigInt) {
		let width = ty.width() as usize;
		let one = BigInt::from(1);
		match ty {
			Type::SInt(_) if width > 0 => {
				let half = one.clone() << (width - 1);
				(-half.clone(), half - one)
			},
			Type::SInt(_) => (BigInt::from(0), BigInt::from(0)),
			_ => (BigInt::from(0), (one.clone() << width) - one),
		}
	}

	pub fn value(&self) -> &BigInt {
		&self.value
	}

	pub fn ty(&self) -> &Type {
		&self.ty
	}

	pub fn width(&self) -> u32 {
		self.ty.width()
	}

	pub fn try_into_u64(&self) -> Option<u64> {
		u64::try_from(&self.value).ok()
	}

	pub fn try_into_i64(&self) -> Option<i64> {
		i64::try_from(&self.value).ok()
	}
}

impl fmt::Display for NumericConstant {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{} : {}", self.value, self.ty)
	}
}
