use super::{Type, ValueId};

/// Typed reference to an IR value
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signal {
	value: ValueId,
	ty: Type,
}

impl Signal {
	pub fn new(value: ValueId, ty: Type) -> Self {
		Self { value, ty }
	}

	pub fn value(&self) -> ValueId {
		self.value
	}

	pub fn ty(&self) -> &Type {
		&self.ty
	}
}

/// A signal known to carry a clock
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClockSignal(Signal);

impl ClockSignal {
	/// Wraps the value as a clock, regardless of its declared type
	pub fn new(value: ValueId) -> Self {
		Self(Signal::new(value, Type::Clock))
	}

	pub fn signal(&self) -> &Signal {
		&self.0
	}

	pub fn value(&self) -> ValueId {
		self.0.value()
	}
}

impl From<ClockSignal> for Signal {
	fn from(clock: ClockSignal) -> Self {
		clock.0
	}
}
