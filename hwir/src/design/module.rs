use std::collections::BTreeMap;

use super::{Attribute, Location, ModuleId, OpId, Type, ValueId};

/// Port in a module signature
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Port {
	pub name: String,
	pub ty: Type,
}

impl Port {
	pub fn new(name: &str, ty: Type) -> Self {
		Self { name: name.into(), ty }
	}
}

/// Parameter declared by an external module
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParamDecl {
	pub name: String,

	/// Attribute kind of the parameter value (see [`Attribute::type_name`])
	pub kind: String,
}

/// Entry block of a module
#[derive(Clone, Debug)]
pub struct Body {
	/// Block arguments, one per input port
	pub arguments: Vec<ValueId>,

	/// Operations in insertion order
	pub ops: Vec<OpId>,

	/// Set once the output operation has been inserted
	pub terminated: bool,
}

#[derive(Clone, Debug)]
pub enum ModuleKind {
	/// Module with a generated body (created lazily)
	Generated(Option<Body>),

	/// Module implemented outside of the design
	Extern { parameters: Vec<ParamDecl> },
}

/// Module-level IR operation
#[derive(Clone, Debug)]
pub struct ModuleOp {
	/// Self-reference
	pub(super) id: ModuleId,

	/// Symbol of the module, unique in the design
	pub symbol: String,

	pub inputs: Vec<Port>,
	pub outputs: Vec<Port>,
	pub attributes: BTreeMap<String, Attribute>,
	pub kind: ModuleKind,
	pub loc: Location,
}

impl ModuleOp {
	pub fn id(&self) -> ModuleId {
		self.id
	}

	pub fn is_extern(&self) -> bool {
		matches!(self.kind, ModuleKind::Extern { .. })
	}

	pub fn body(&self) -> Option<&Body> {
		match &self.kind {
			ModuleKind::Generated(body) => body.as_ref(),
			ModuleKind::Extern { .. } => None,
		}
	}

	pub(super) fn body_mut(&mut self) -> Option<&mut Body> {
		match &mut self.kind {
			ModuleKind::Generated(body) => body.as_mut(),
			ModuleKind::Extern { .. } => None,
		}
	}

	/// Checks if the module body has been generated and terminated
	pub fn is_complete(&self) -> bool {
		self.body().map_or(false, |b| b.terminated)
	}
}
