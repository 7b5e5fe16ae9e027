use std::collections::{BTreeMap, HashSet};

use hwir::{Attribute, Location, ModuleId, OpId, Signal};
use log::debug;

use crate::{BuildError, Connection, Definition, System};

/// Identifies an instance registered in a session
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub(crate) usize);

/// Application-level identifier of an instance, attached to the instance op
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppId {
	pub name: String,
	pub index: Option<u64>,
}

impl AppId {
	pub fn new(name: &str) -> Self {
		Self {
			name: name.into(),
			index: None,
		}
	}

	pub fn indexed(name: &str, index: u64) -> Self {
		Self {
			name: name.into(),
			index: Some(index),
		}
	}

	pub fn to_attribute(&self) -> Attribute {
		let mut dict = BTreeMap::new();
		dict.insert("name".to_string(), Attribute::from(self.name.as_str()));
		if let Some(index) = self.index {
			dict.insert("index".to_string(), Attribute::from(index));
		}
		Attribute::Dict(dict)
	}
}

/// Instance as seen by the session
#[derive(Clone, Debug)]
pub struct InstanceRecord {
	pub id: InstanceId,
	pub name: String,
	pub module: ModuleId,

	/// Module containing the instance
	pub parent: ModuleId,
	pub op: OpId,
}

/// Placed instance of a module definition
#[derive(Clone, Debug)]
pub struct ModuleInstance {
	id: InstanceId,
	name: String,
	definition: Definition,
	op: OpId,
	outputs: Vec<Signal>,
}

impl ModuleInstance {
	pub fn id(&self) -> InstanceId {
		self.id
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn definition(&self) -> &Definition {
		&self.definition
	}

	pub fn op(&self) -> OpId {
		self.op
	}

	/// Signal driven by the named output port
	pub fn output(&self, name: &str) -> Result<Signal, BuildError> {
		let port = self.definition.output(name).ok_or_else(|| BuildError::PortResolution {
			module: self.definition.name(),
			port: name.into(),
		})?;
		Ok(self.outputs[port.index].clone())
	}

	/// Output signals by port name, in port order
	pub fn outputs(&self) -> impl Iterator<Item = (&str, &Signal)> {
		self.definition.outputs().map(|p| p.name.as_str()).zip(&self.outputs)
	}
}

/// Collects connections of a new instance.
///
/// Nothing is emitted until [`InstanceBuilder::build`] is called.
pub struct InstanceBuilder<'a> {
	sys: &'a mut System,
	def: Definition,
	bindings: Vec<(String, Connection)>,
	name: Option<String>,
	appid: Option<AppId>,
	loc: Location,
}

impl<'a> InstanceBuilder<'a> {
	pub(crate) fn new(sys: &'a mut System, def: Definition, loc: Location) -> Self {
		Self {
			sys,
			def,
			bindings: vec![],
			name: None,
			appid: None,
			loc,
		}
	}

	/// Connects an input port
	pub fn bind(mut self, port: &str, value: impl Into<Connection>) -> Self {
		self.bindings.push((port.into(), value.into()));
		self
	}

	pub fn name(mut self, name: &str) -> Self {
		self.name = Some(name.into());
		self
	}

	pub fn appid(mut self, appid: AppId) -> Self {
		self.appid = Some(appid);
		self
	}

	/// Checks the connections against the definition and emits the instance
	pub fn build(self) -> Result<ModuleInstance, BuildError> {
		let Self {
			sys,
			def,
			bindings,
			name,
			appid,
			loc,
		} = self;
		let module_name = def.name();

		if !sys.has_block() {
			return Err(BuildError::NoActiveScope);
		}

		let mut bound = HashSet::new();
		for (port, _) in &bindings {
			if !bound.insert(port.as_str()) {
				return Err(BuildError::DuplicateBinding {
					module: module_name,
					port: port.clone(),
				});
			}
		}

		for (port, _) in &bindings {
			if def.input(port).is_none() {
				return Err(BuildError::PortResolution {
					module: module_name,
					port: port.clone(),
				});
			}
		}

		let is_extern = def.generator().is_none();
		let mut connections: Vec<Option<&Connection>> = vec![None; def.inputs().count()];
		for (port, connection) in &bindings {
			let Some(spec) = def.input(port) else { continue };
			if *connection == Connection::Absent && !is_extern {
				return Err(BuildError::AbsentInput {
					module: module_name,
					port: port.clone(),
				});
			}
			connection.check(&module_name, spec)?;
			connections[spec.index] = Some(connection);
		}

		let missing: Vec<String> = def
			.inputs()
			.zip(&connections)
			.filter(|(_, connection)| connection.is_none())
			.map(|(port, _)| port.name.clone())
			.collect();
		if !missing.is_empty() {
			return Err(BuildError::MissingInput {
				module: module_name,
				ports: missing,
			});
		}

		let module = sys.materialize(&def)?;
		let name = sys.uniquify_instance_name(name.as_deref().unwrap_or(def.instance_name()))?;

		let mut values = Vec::with_capacity(connections.len());
		for (spec, connection) in def.inputs().zip(connections.into_iter().flatten()) {
			let signal = match connection.resolve(sys.design_mut(), &module_name, spec)? {
				Some(signal) => signal,
				None => {
					debug!("Tying absent input '{}' of '{}' to zero", spec.name, module_name);
					sys.design_mut().zero(&spec.ty)?
				},
			};
			values.push(signal.value());
		}

		let parameters = match (is_extern, def.parameters()) {
			(true, Some(params)) => params.as_map().clone(),
			_ => BTreeMap::new(),
		};
		let design = sys.design_mut();
		let op = design.instance(module, &name, values, parameters, loc)?;
		design.verify_op(op)?;
		if let Some(appid) = &appid {
			design.set_op_attribute(op, "appid", appid.to_attribute())?;
		}
		let outputs = design.results(op)?;

		let id = sys.register_instance(&name, module, op)?;
		Ok(ModuleInstance {
			id,
			name,
			definition: def,
			op,
			outputs,
		})
	}
}
