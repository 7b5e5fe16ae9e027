use std::collections::BTreeMap;

use super::{Attribute, Location, OpKind, ParamDecl, Port, Type};

/// Operation of a module image. Operands refer to values by their position
/// in the image: block arguments first, then operation results in order.
#[derive(Clone, Debug)]
pub(super) struct ImageOp {
	pub kind: OpKind,

	/// Symbol of the instantiated module
	pub callee: Option<String>,
	pub result_types: Vec<Type>,
	pub attributes: BTreeMap<String, Attribute>,
	pub loc: Location,
}

#[derive(Clone, Debug)]
pub(super) enum ImageContents {
	Extern(Vec<ParamDecl>),
	Body(Vec<ImageOp>),
}

/// Copy of a module op detached from the design it was taken from.
///
/// Instances inside the body refer to their modules by symbol, so an image
/// can only be inserted into a design which already has those modules.
#[derive(Clone, Debug)]
pub struct ModuleImage {
	pub symbol: String,
	pub inputs: Vec<Port>,
	pub outputs: Vec<Port>,
	pub attributes: BTreeMap<String, Attribute>,
	pub loc: Location,
	pub(super) contents: ImageContents,
}

impl ModuleImage {
	pub fn is_extern(&self) -> bool {
		matches!(self.contents, ImageContents::Extern(..))
	}

	/// Number of operations in the body
	pub fn op_count(&self) -> usize {
		match &self.contents {
			ImageContents::Extern(..) => 0,
			ImageContents::Body(ops) => ops.len(),
		}
	}

	/// Symbols of modules instantiated in the body
	pub fn callees(&self) -> impl Iterator<Item = &str> {
		let ops = match &self.contents {
			ImageContents::Extern(..) => &[][..],
			ImageContents::Body(ops) => &ops[..],
		};
		ops.iter().filter_map(|op| op.callee.as_deref())
	}
}
