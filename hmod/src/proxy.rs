use std::collections::{HashMap, HashSet};

use hwir::{ClockSignal, Design, Location, ModuleId, Signal, Type, ValueId};
use log::warn;
use num_bigint::BigInt;

use crate::config::ReassignPolicy;
use crate::scan::{PortRole, PortSpec, Scan};
use crate::{BuildError, Connection, Definition, InstanceBuilder, System};

/// Name-to-index port lookup of a definition, built once when the
/// definition is created
#[derive(Clone, Debug, Default)]
pub struct PortProxy {
	inputs: HashMap<String, usize>,
	outputs: HashMap<String, usize>,
	clocks: HashSet<usize>,
}

impl PortProxy {
	pub fn synthesize(scan: &Scan) -> Self {
		let mut proxy = Self::default();
		for port in scan.inputs() {
			proxy.inputs.insert(port.name.clone(), port.index);
			if port.role == PortRole::Clock {
				proxy.clocks.insert(port.index);
			}
		}
		for port in scan.outputs() {
			proxy.outputs.insert(port.name.clone(), port.index);
		}
		proxy
	}

	pub fn input_index(&self, name: &str) -> Option<usize> {
		self.inputs.get(name).copied()
	}

	pub fn output_index(&self, name: &str) -> Option<usize> {
		self.outputs.get(name).copied()
	}

	pub fn is_clock(&self, index: usize) -> bool {
		self.clocks.contains(&index)
	}

	pub fn input_count(&self) -> usize {
		self.inputs.len()
	}

	pub fn output_count(&self) -> usize {
		self.outputs.len()
	}
}

/// Ports of the module being generated.
///
/// Inputs are readable as signals, outputs are assignable. A `Ports` handle
/// only exists for the duration of a generator call.
pub struct Ports<'a> {
	sys: &'a mut System,
	def: Definition,
	module: ModuleId,
	args: Vec<ValueId>,
	outputs: Vec<Option<Signal>>,
}

impl<'a> Ports<'a> {
	pub(crate) fn new(sys: &'a mut System, def: Definition, module: ModuleId, args: Vec<ValueId>) -> Self {
		let outputs = vec![None; def.proxy().output_count()];
		Self {
			sys,
			def,
			module,
			args,
			outputs,
		}
	}

	pub fn definition(&self) -> &Definition {
		&self.def
	}

	/// IR module being generated
	pub fn module(&self) -> ModuleId {
		self.module
	}

	/// Session the module is generated in. Changes go through the port
	/// methods and [`Ports::instance`].
	pub fn system(&self) -> &System {
		self.sys
	}

	pub fn design(&self) -> &Design {
		self.sys.design()
	}

	fn unknown_port(&self, port: &str) -> BuildError {
		BuildError::PortResolution {
			module: self.def.name(),
			port: port.into(),
		}
	}

	fn input_port(&self, index: usize) -> Result<&PortSpec, BuildError> {
		self.def
			.inputs()
			.nth(index)
			.ok_or_else(|| self.unknown_port(&format!("#{}", index)))
	}

	fn output_port(&self, index: usize) -> Result<&PortSpec, BuildError> {
		self.def
			.outputs()
			.nth(index)
			.ok_or_else(|| self.unknown_port(&format!("#{}", index)))
	}

	pub fn input(&self, name: &str) -> Result<Signal, BuildError> {
		let index = self.def.proxy().input_index(name).ok_or_else(|| self.unknown_port(name))?;
		self.input_at(index)
	}

	pub fn input_at(&self, index: usize) -> Result<Signal, BuildError> {
		let port = self.input_port(index)?;
		let value = self.args[index];
		if self.def.proxy().is_clock(index) {
			return Ok(ClockSignal::new(value).into());
		}
		Ok(Signal::new(value, port.ty.clone()))
	}

	/// Input port tagged as a clock
	pub fn clock(&self, name: &str) -> Result<ClockSignal, BuildError> {
		let index = self.def.proxy().input_index(name).ok_or_else(|| self.unknown_port(name))?;
		if !self.def.proxy().is_clock(index) {
			return Err(BuildError::ConfigurationType(format!(
				"Port '{}' of module '{}' is not a clock",
				name,
				self.def.name()
			)));
		}
		Ok(ClockSignal::new(self.args[index]))
	}

	pub fn set(&mut self, name: &str, value: impl Into<Connection>) -> Result<(), BuildError> {
		let index = self.def.proxy().output_index(name).ok_or_else(|| self.unknown_port(name))?;
		self.set_at(index, value)
	}

	/// Assigns a signal to the output at the given index
	pub fn set_at(&mut self, index: usize, value: impl Into<Connection>) -> Result<(), BuildError> {
		let port = self.output_port(index)?.clone();
		let module = self.def.name();

		let connection: Connection = value.into();
		if connection == Connection::Absent {
			return Err(BuildError::ConfigurationType(format!(
				"Output '{}' of module '{}' cannot be left absent",
				port.name, module
			)));
		}
		connection.check(&module, &port)?;

		let reassigned = self.outputs[index].is_some();
		if reassigned && self.sys.config().reassign == ReassignPolicy::Deny {
			return Err(BuildError::OutputReassigned {
				module,
				port: port.name,
			});
		}

		let signal = connection.resolve(self.sys.design_mut(), &module, &port)?;
		if reassigned && self.sys.config().reassign == ReassignPolicy::Warn {
			warn!("Output '{}' of module '{}' reassigned", port.name, module);
		}
		self.outputs[index] = signal;
		Ok(())
	}

	/// Assigns several outputs by name
	pub fn set_outputs<'n, I, C>(&mut self, values: I) -> Result<(), BuildError>
	where
		I: IntoIterator<Item = (&'n str, C)>,
		C: Into<Connection>,
	{
		for (name, value) in values {
			self.set(name, value)?;
		}
		Ok(())
	}

	/// Starts instantiating a module inside the module being generated
	#[track_caller]
	pub fn instance(&mut self, def: &Definition) -> InstanceBuilder<'_> {
		InstanceBuilder::new(&mut *self.sys, def.clone(), Location::caller())
	}

	pub fn constant(&mut self, ty: &Type, value: impl Into<BigInt>) -> Result<Signal, BuildError> {
		Ok(self.sys.design_mut().constant(ty, value)?)
	}

	pub fn add(&mut self, lhs: &Signal, rhs: &Signal) -> Result<Signal, BuildError> {
		Ok(self.sys.design_mut().add(lhs, rhs)?)
	}

	/// Registers a signal with the module's clock
	pub fn reg(&mut self, input: &Signal) -> Result<Signal, BuildError> {
		Ok(self.sys.design_mut().reg(input)?)
	}

	/// Checks that all outputs are assigned and terminates the body
	pub(crate) fn finish(self) -> Result<(), BuildError> {
		let unconnected: Vec<String> = self
			.def
			.outputs()
			.zip(&self.outputs)
			.filter(|(_, signal)| signal.is_none())
			.map(|(port, _)| port.name.clone())
			.collect();

		if !unconnected.is_empty() {
			return Err(BuildError::UnconnectedOutput {
				module: self.def.name(),
				ports: unconnected,
			});
		}

		let values: Vec<Signal> = self.outputs.into_iter().flatten().collect();
		self.sys.design_mut().output(&values)?;
		Ok(())
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::scan::{scan, Declaration};

	#[test]
	fn test_lookup() -> Result<(), BuildError> {
		let decls = vec![
			("clk".to_string(), Declaration::clock()),
			("x".to_string(), Declaration::input(Type::UInt(2))),
			("y".to_string(), Declaration::output(Type::UInt(2))),
		];
		let proxy = PortProxy::synthesize(&scan("M", &decls)?);
		assert_eq!(proxy.input_index("clk"), Some(0));
		assert_eq!(proxy.input_index("x"), Some(1));
		assert_eq!(proxy.output_index("y"), Some(0));
		assert_eq!(proxy.output_index("x"), None);
		assert!(proxy.is_clock(0));
		assert!(!proxy.is_clock(1));
		assert_eq!((proxy.input_count(), proxy.output_count()), (2, 1));
		Ok(())
	}
}
