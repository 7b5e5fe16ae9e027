use std::collections::BTreeMap;

use super::{Attribute, Location, ModuleId, NumericConstant, OpId, ValueId};

/// Operation kinds which can appear in a module body
#[derive(Clone, Debug)]
pub enum OpKind {
	Constant(NumericConstant),

	Add {
		lhs: ValueId,
		rhs: ValueId,
	},

	/// Register clocked by the given clock
	Reg {
		input: ValueId,
		clock: ValueId,
	},

	Instance {
		module: ModuleId,
		name: String,
		inputs: Vec<ValueId>,
		parameters: BTreeMap<String, Attribute>,
	},

	/// Body terminator carrying output values in port order
	Output(Vec<ValueId>),
}

/// Operation inside a module body
#[derive(Clone, Debug)]
pub struct Op {
	pub(super) id: OpId,

	/// Module whose body contains the operation
	pub parent: ModuleId,

	pub kind: OpKind,
	pub results: Vec<ValueId>,
	pub attributes: BTreeMap<String, Attribute>,
	pub loc: Location,
}

impl Op {
	pub fn id(&self) -> OpId {
		self.id
	}
}
