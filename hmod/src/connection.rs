use hwir::{ClockSignal, Design, NumericConstant, Signal};
use num_bigint::BigInt;

use crate::scan::PortSpec;
use crate::{BuildError, TypeMismatchError};

/// Value supplied for a port, either when assigning a module output or
/// when binding an instance input
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Connection {
	Signal(Signal),

	/// Integer converted to a constant of the port type
	Literal(BigInt),

	/// Deliberately disconnected port
	Absent,
}

impl Connection {
	/// Checks the connection against the port without touching the design
	pub(crate) fn check(&self, module: &str, port: &PortSpec) -> Result<(), BuildError> {
		match self {
			Connection::Signal(signal) if *signal.ty() != port.ty => Err(TypeMismatchError {
				module: module.into(),
				port: port.name.clone(),
				expected: port.ty.clone(),
				found: signal.ty().clone(),
			}
			.into()),
			Connection::Literal(value) => {
				NumericConstant::new(value.clone(), port.ty.clone())?;
				Ok(())
			},
			_ => Ok(()),
		}
	}

	/// Turns the connection into a signal for the given port. Literals are
	/// materialized as constants at the current insertion point.
	///
	/// Returns `None` for absent connections.
	pub(crate) fn resolve(
		&self,
		design: &mut Design,
		module: &str,
		port: &PortSpec,
	) -> Result<Option<Signal>, BuildError> {
		match self {
			Connection::Signal(signal) => {
				self.check(module, port)?;
				Ok(Some(signal.clone()))
			},
			Connection::Literal(value) => Ok(Some(design.constant(&port.ty, value.clone())?)),
			Connection::Absent => Ok(None),
		}
	}
}

impl From<Signal> for Connection {
	fn from(signal: Signal) -> Self {
		Connection::Signal(signal)
	}
}

impl From<&Signal> for Connection {
	fn from(signal: &Signal) -> Self {
		Connection::Signal(signal.clone())
	}
}

impl From<ClockSignal> for Connection {
	fn from(clock: ClockSignal) -> Self {
		Connection::Signal(clock.into())
	}
}

impl From<&ClockSignal> for Connection {
	fn from(clock: &ClockSignal) -> Self {
		Connection::Signal(clock.signal().clone())
	}
}

impl From<Option<Signal>> for Connection {
	fn from(signal: Option<Signal>) -> Self {
		signal.map_or(Connection::Absent, Connection::Signal)
	}
}

impl From<BigInt> for Connection {
	fn from(value: BigInt) -> Self {
		Connection::Literal(value)
	}
}

impl From<bool> for Connection {
	fn from(value: bool) -> Self {
		Connection::Literal(BigInt::from(value as u8))
	}
}

macro_rules! impl_literal_connection {
	($($t: ty),*) => {
		$(
			impl From<$t> for Connection {
				fn from(value: $t) -> Self {
					Connection::Literal(BigInt::from(value))
				}
			}
		)*
	}
}

impl_literal_connection!(i32, i64, u32, u64, usize);

#[cfg(test)]
mod test {
	use super::*;
	use hwir::{IrError, Location, Type};
	use std::collections::BTreeMap;

	use crate::scan::{Direction, PortRole};

	fn port(ty: Type) -> PortSpec {
		PortSpec {
			name: "a".into(),
			direction: Direction::Input,
			index: 0,
			ty,
			role: PortRole::Plain,
		}
	}

	fn design_with_body() -> Design {
		let mut d = Design::new();
		let m = d
			.new_module("M", vec![], vec![], BTreeMap::new(), Location::unknown())
			.unwrap();
		d.add_entry_block(m).unwrap();
		d.push_insertion_point(m).unwrap();
		d
	}

	#[test]
	fn test_literal_becomes_constant() -> Result<(), BuildError> {
		let mut d = design_with_body();
		let signal = Connection::from(5).resolve(&mut d, "M", &port(Type::UInt(4)))?.unwrap();
		assert_eq!(signal.ty(), &Type::UInt(4));
		Ok(())
	}

	#[test]
	fn test_literal_out_of_range() {
		let mut d = design_with_body();
		let err = Connection::from(16).resolve(&mut d, "M", &port(Type::UInt(4)));
		assert!(matches!(err, Err(BuildError::Ir(IrError::ConstantOutOfRange { .. }))));
	}

	#[test]
	fn test_signal_type_checked() -> Result<(), BuildError> {
		let mut d = design_with_body();
		let s = d.constant(&Type::UInt(8), 1)?;
		let err = Connection::from(&s).resolve(&mut d, "M", &port(Type::UInt(4)));
		assert!(matches!(err, Err(BuildError::TypeMismatch(..))));
		assert!(Connection::from(&s).resolve(&mut d, "M", &port(Type::UInt(8)))?.is_some());
		Ok(())
	}

	#[test]
	fn test_check_emits_nothing() -> Result<(), BuildError> {
		let d = design_with_body();
		Connection::from(15).check("M", &port(Type::UInt(4)))?;
		assert!(matches!(
			Connection::from(16).check("M", &port(Type::UInt(4))),
			Err(BuildError::Ir(IrError::ConstantOutOfRange { .. }))
		));
		let m = d.insertion_point().unwrap();
		assert!(d.module(m).unwrap().body().unwrap().ops.is_empty());
		Ok(())
	}

	#[test]
	fn test_absent() -> Result<(), BuildError> {
		let mut d = design_with_body();
		assert_eq!(Connection::from(None::<Signal>), Connection::Absent);
		assert!(Connection::Absent.resolve(&mut d, "M", &port(Type::Bits(1)))?.is_none());
		Ok(())
	}
}
