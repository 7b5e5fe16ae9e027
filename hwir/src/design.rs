pub mod attribute;
pub mod design_error;
pub mod image;
pub mod module;
pub mod numeric_constant;
pub mod op;
pub mod scope;
pub mod signal;
pub mod types;
pub mod utils;

pub use attribute::Attribute;
pub use design_error::{InstanceInputTypeError, IrError, OutputTypeError};
pub use image::ModuleImage;
pub use module::{Body, ModuleKind, ModuleOp, ParamDecl, Port};
pub use numeric_constant::NumericConstant;
pub use op::{Op, OpKind};
pub use scope::Location;
pub use signal::{ClockSignal, Signal};
pub use types::Type;
pub use utils::is_name_valid;

use std::collections::{BTreeMap, HashMap};

use log::debug;
use num_bigint::BigInt;

use self::image::{ImageContents, ImageOp};
use self::scope::ScopeStack;

/// References a module in a design
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct ModuleId {
	id: usize,
}

/// References an operation in a design
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct OpId {
	id: usize,
}

/// References a value in a design
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct ValueId {
	id: usize,
}

impl ValueId {
	/// Position of the value in the design's value table
	pub fn index(&self) -> usize {
		self.id
	}
}

/// Where a value comes from
#[derive(Clone, Debug)]
pub enum ValueDef {
	/// Block argument of a module body
	Argument { module: ModuleId, index: usize },

	/// Result of an operation
	Result { op: OpId, index: usize },
}

#[derive(Clone, Debug)]
pub struct Value {
	pub ty: Type,
	pub def: ValueDef,
}

/// Hardware design in IR form.
///
/// Modules are created by symbol and filled through the insertion point
/// stack: operations are always appended to the body of the module on top
/// of that stack.
#[derive(Debug, Default)]
pub struct Design {
	modules: Vec<Option<ModuleOp>>,
	ops: Vec<Op>,
	values: Vec<Value>,
	scopes: ScopeStack,
}

impl Design {
	/// Creates a new empty design
	pub fn new() -> Self {
		Self::default()
	}

	/// Checks symbol validity and uniqueness
	fn check_symbol(&self, symbol: &str) -> Result<(), IrError> {
		if !is_name_valid(symbol) {
			return Err(IrError::InvalidName(symbol.into()));
		}

		if self.find_module(symbol).is_some() {
			return Err(IrError::ModuleNameConflict(symbol.into()));
		}

		Ok(())
	}

	fn add_module(
		&mut self,
		symbol: &str,
		inputs: Vec<Port>,
		outputs: Vec<Port>,
		attributes: BTreeMap<String, Attribute>,
		kind: ModuleKind,
		loc: Location,
	) -> Result<ModuleId, IrError> {
		self.check_symbol(symbol)?;
		let id = ModuleId { id: self.modules.len() };
		debug!("Creating module op '{}' ({:?})", symbol, id);
		self.modules.push(Some(ModuleOp {
			id,
			symbol: symbol.into(),
			inputs,
			outputs,
			attributes,
			kind,
			loc,
		}));
		Ok(id)
	}

	/// Creates a module whose body will be generated
	pub fn new_module(
		&mut self,
		symbol: &str,
		inputs: Vec<Port>,
		outputs: Vec<Port>,
		attributes: BTreeMap<String, Attribute>,
		loc: Location,
	) -> Result<ModuleId, IrError> {
		self.add_module(symbol, inputs, outputs, attributes, ModuleKind::Generated(None), loc)
	}

	/// Creates an external module declaration
	pub fn new_extern_module(
		&mut self,
		symbol: &str,
		inputs: Vec<Port>,
		outputs: Vec<Port>,
		parameters: Vec<ParamDecl>,
		attributes: BTreeMap<String, Attribute>,
		loc: Location,
	) -> Result<ModuleId, IrError> {
		self.add_module(symbol, inputs, outputs, attributes, ModuleKind::Extern { parameters }, loc)
	}

	/// Removes a module from the design. Operations in its body are orphaned.
	pub fn erase_module(&mut self, module: ModuleId) -> Option<ModuleOp> {
		debug!("Erasing module op {:?}", module);
		self.modules.get_mut(module.id)?.take()
	}

	pub fn module(&self, module: ModuleId) -> Option<&ModuleOp> {
		self.modules.get(module.id)?.as_ref()
	}

	fn module_mut(&mut self, module: ModuleId) -> Result<&mut ModuleOp, IrError> {
		self.modules
			.get_mut(module.id)
			.and_then(Option::as_mut)
			.ok_or(IrError::InvalidModuleId(module))
	}

	/// Iterates over all live modules in creation order
	pub fn modules(&self) -> impl Iterator<Item = &ModuleOp> {
		self.modules.iter().flatten()
	}

	pub fn find_module(&self, symbol: &str) -> Option<ModuleId> {
		self.modules().find(|m| m.symbol == symbol).map(|m| m.id)
	}

	pub fn op(&self, op: OpId) -> Option<&Op> {
		self.ops.get(op.id)
	}

	pub fn value(&self, value: ValueId) -> Option<&Value> {
		self.values.get(value.id)
	}

	pub fn value_type(&self, value: ValueId) -> Option<&Type> {
		self.value(value).map(|v| &v.ty)
	}

	fn new_value(&mut self, ty: Type, def: ValueDef) -> ValueId {
		let id = ValueId { id: self.values.len() };
		self.values.push(Value { ty, def });
		id
	}

	/// Creates the entry block of a generated module. Returns one block
	/// argument per input port.
	pub fn add_entry_block(&mut self, module: ModuleId) -> Result<Vec<ValueId>, IrError> {
		let m = self.module(module).ok_or(IrError::InvalidModuleId(module))?;
		match &m.kind {
			ModuleKind::Extern { .. } => return Err(IrError::ExternModuleBody(m.symbol.clone())),
			ModuleKind::Generated(Some(_)) => return Err(IrError::BodyAlreadyExists(m.symbol.clone())),
			ModuleKind::Generated(None) => {},
		}

		let input_types: Vec<Type> = m.inputs.iter().map(|p| p.ty.clone()).collect();
		let arguments: Vec<ValueId> = input_types
			.into_iter()
			.enumerate()
			.map(|(index, ty)| self.new_value(ty, ValueDef::Argument { module, index }))
			.collect();

		self.module_mut(module)?.kind = ModuleKind::Generated(Some(Body {
			arguments: arguments.clone(),
			ops: vec![],
			terminated: false,
		}));
		Ok(arguments)
	}

	/// Module whose body defines the value
	fn value_owner(&self, value: ValueId) -> Option<ModuleId> {
		match self.value(value)?.def {
			ValueDef::Argument { module, .. } => Some(module),
			ValueDef::Result { op, .. } => self.op(op).map(|op| op.parent),
		}
	}

	/// Appends an operation at the current insertion point
	fn insert_op(&mut self, kind: OpKind, result_types: Vec<Type>, loc: Option<Location>) -> Result<OpId, IrError> {
		let parent = self.scopes.insertion_point().ok_or(IrError::NoInsertionPoint)?;
		let loc = loc.unwrap_or_else(|| self.scopes.location());
		self.append_op(parent, kind, result_types, BTreeMap::new(), loc)
	}

	/// Appends an operation to the body of a module. All operands must be
	/// defined in the same body. An output operation terminates the body.
	fn append_op(
		&mut self,
		parent: ModuleId,
		kind: OpKind,
		result_types: Vec<Type>,
		attributes: BTreeMap<String, Attribute>,
		loc: Location,
	) -> Result<OpId, IrError> {
		for value in self.operands(&kind) {
			match self.value_owner(value) {
				Some(owner) if owner == parent => {},
				Some(_) => {
					let m = self.module(parent).ok_or(IrError::InvalidModuleId(parent))?;
					return Err(IrError::ForeignValue { module: m.symbol.clone() });
				},
				None => return Err(IrError::InvalidValueId(value)),
			}
		}

		let id = OpId { id: self.ops.len() };
		let terminator = matches!(kind, OpKind::Output(..));
		let m = self.module_mut(parent)?;
		let symbol = m.symbol.clone();
		let body = m.body_mut().ok_or(IrError::NoInsertionPoint)?;
		if body.terminated {
			return Err(IrError::BodyTerminated(symbol));
		}
		body.ops.push(id);
		body.terminated = terminator;

		let results: Vec<ValueId> = result_types
			.into_iter()
			.enumerate()
			.map(|(index, ty)| self.new_value(ty, ValueDef::Result { op: id, index }))
			.collect();

		self.ops.push(Op {
			id,
			parent,
			kind,
			results,
			attributes,
			loc,
		});
		Ok(id)
	}

	fn signal(&self, value: ValueId) -> Result<Signal, IrError> {
		let ty = self.value_type(value).ok_or(IrError::InvalidValueId(value))?;
		Ok(Signal::new(value, ty.clone()))
	}

	/// Creates a constant of the given type
	pub fn constant(&mut self, ty: &Type, value: impl Into<BigInt>) -> Result<Signal, IrError> {
		let constant = NumericConstant::new(value.into(), ty.clone())?;
		let op = self.insert_op(OpKind::Constant(constant), vec![ty.clone()], None)?;
		self.result(op, 0)
	}

	/// Creates an all-zeroes constant of the given type
	pub fn zero(&mut self, ty: &Type) -> Result<Signal, IrError> {
		let op = self.insert_op(OpKind::Constant(NumericConstant::zero(ty.clone())), vec![ty.clone()], None)?;
		self.result(op, 0)
	}

	/// Adds two signals of the same type. The result has the operand type (wrapping).
	pub fn add(&mut self, lhs: &Signal, rhs: &Signal) -> Result<Signal, IrError> {
		if lhs.ty() != rhs.ty() {
			return Err(IrError::OperandTypeMismatch {
				lhs: lhs.ty().clone(),
				rhs: rhs.ty().clone(),
			});
		}

		if !lhs.ty().is_arithmetic() {
			return Err(IrError::NonArithmeticType(lhs.ty().clone()));
		}

		let op = self.insert_op(
			OpKind::Add {
				lhs: lhs.value(),
				rhs: rhs.value(),
			},
			vec![lhs.ty().clone()],
			None,
		)?;
		self.result(op, 0)
	}

	/// Registers a signal using the clock currently in scope
	pub fn reg(&mut self, input: &Signal) -> Result<Signal, IrError> {
		let clock = self.scopes.clock().cloned().ok_or(IrError::NoAmbientClock)?;
		self.reg_with_clock(input, &clock)
	}

	/// Registers a signal using an explicit clock
	pub fn reg_with_clock(&mut self, input: &Signal, clock: &ClockSignal) -> Result<Signal, IrError> {
		let op = self.insert_op(
			OpKind::Reg {
				input: input.value(),
				clock: clock.value(),
			},
			vec![input.ty().clone()],
			None,
		)?;
		self.result(op, 0)
	}

	/// Creates an instance of a module. The caller is expected to run
	/// [`Design::verify_op`] on the result.
	pub fn instance(
		&mut self,
		module: ModuleId,
		name: &str,
		inputs: Vec<ValueId>,
		parameters: BTreeMap<String, Attribute>,
		loc: Location,
	) -> Result<OpId, IrError> {
		let m = self.module(module).ok_or(IrError::InvalidModuleId(module))?;
		let result_types = m.outputs.iter().map(|p| p.ty.clone()).collect();
		debug!("Instantiating '{}' as '{}'", m.symbol, name);
		self.insert_op(
			OpKind::Instance {
				module,
				name: name.into(),
				inputs,
				parameters,
			},
			result_types,
			Some(loc),
		)
	}

	/// Checks an operation against the signatures it refers to
	pub fn verify_op(&self, op: OpId) -> Result<(), IrError> {
		let op = self.op(op).ok_or(IrError::InvalidOpId(op))?;
		for value in self.operands(&op.kind) {
			self.value(value).ok_or(IrError::InvalidValueId(value))?;
		}

		match &op.kind {
			OpKind::Instance { module, name, inputs, .. } => {
				if !is_name_valid(name) {
					return Err(IrError::InvalidName(name.clone()));
				}

				let m = self.module(*module).ok_or(IrError::InvalidModuleId(*module))?;
				if m.inputs.len() != inputs.len() {
					return Err(IrError::InstanceInputCount {
						instance: name.clone(),
						module: m.symbol.clone(),
						expected: m.inputs.len(),
						found: inputs.len(),
					});
				}

				for (port, value) in m.inputs.iter().zip(inputs) {
					let found = self.value_type(*value).ok_or(IrError::InvalidValueId(*value))?;
					if *found != port.ty {
						return Err(InstanceInputTypeError {
							instance: name.clone(),
							module: m.symbol.clone(),
							port: port.name.clone(),
							expected: port.ty.clone(),
							found: found.clone(),
						}
						.into());
					}
				}
				Ok(())
			},
			_ => Ok(()),
		}
	}

	fn operands(&self, kind: &OpKind) -> Vec<ValueId> {
		match kind {
			OpKind::Constant(_) => vec![],
			OpKind::Add { lhs, rhs } => vec![*lhs, *rhs],
			OpKind::Reg { input, clock } => vec![*input, *clock],
			OpKind::Instance { inputs, .. } => inputs.clone(),
			OpKind::Output(values) => values.clone(),
		}
	}

	pub fn set_op_attribute(&mut self, op: OpId, name: &str, value: Attribute) -> Result<(), IrError> {
		let op = self.ops.get_mut(op.id).ok_or(IrError::InvalidOpId(op))?;
		op.attributes.insert(name.into(), value);
		Ok(())
	}

	/// Returns the n-th result of an operation
	pub fn result(&self, op: OpId, index: usize) -> Result<Signal, IrError> {
		let value = *self
			.op(op)
			.ok_or(IrError::InvalidOpId(op))?
			.results
			.get(index)
			.ok_or(IrError::InvalidOpId(op))?;
		self.signal(value)
	}

	/// Returns all results of an operation
	pub fn results(&self, op: OpId) -> Result<Vec<Signal>, IrError> {
		let op = self.op(op).ok_or(IrError::InvalidOpId(op))?;
		op.results.iter().map(|v| self.signal(*v)).collect()
	}

	/// Terminates the body at the current insertion point with output values
	pub fn output(&mut self, values: &[Signal]) -> Result<(), IrError> {
		let parent = self.scopes.insertion_point().ok_or(IrError::NoInsertionPoint)?;
		let m = self.module(parent).ok_or(IrError::InvalidModuleId(parent))?;
		if m.outputs.len() != values.len() {
			return Err(IrError::OutputCount {
				module: m.symbol.clone(),
				expected: m.outputs.len(),
				found: values.len(),
			});
		}

		for (port, value) in m.outputs.iter().zip(values) {
			if port.ty != *value.ty() {
				return Err(OutputTypeError {
					module: m.symbol.clone(),
					port: port.name.clone(),
					expected: port.ty.clone(),
					found: value.ty().clone(),
				}
				.into());
			}
		}

		self.insert_op(OpKind::Output(values.iter().map(Signal::value).collect()), vec![], None)?;
		Ok(())
	}

	/// Takes a detached copy of a module op with its body
	pub fn export_module(&self, module: ModuleId) -> Result<ModuleImage, IrError> {
		let m = self.module(module).ok_or(IrError::InvalidModuleId(module))?;
		let contents = match &m.kind {
			ModuleKind::Extern { parameters } => ImageContents::Extern(parameters.clone()),
			ModuleKind::Generated(Some(body)) if body.terminated => {
				let mut locals: HashMap<ValueId, ValueId> = body
					.arguments
					.iter()
					.enumerate()
					.map(|(index, value)| (*value, ValueId { id: index }))
					.collect();

				let mut ops = Vec::with_capacity(body.ops.len());
				for id in &body.ops {
					let op = self.op(*id).ok_or(IrError::InvalidOpId(*id))?;
					let kind = remap_operands(&op.kind, |value| {
						locals.get(&value).copied().ok_or(IrError::InvalidValueId(value))
					})?;
					let callee = match &op.kind {
						OpKind::Instance { module, .. } => {
							Some(self.module(*module).ok_or(IrError::InvalidModuleId(*module))?.symbol.clone())
						},
						_ => None,
					};

					let mut result_types = vec![];
					for value in &op.results {
						let local = ValueId { id: locals.len() };
						locals.insert(*value, local);
						result_types.push(self.value_type(*value).ok_or(IrError::InvalidValueId(*value))?.clone());
					}

					ops.push(ImageOp {
						kind,
						callee,
						result_types,
						attributes: op.attributes.clone(),
						loc: op.loc,
					});
				}
				ImageContents::Body(ops)
			},
			ModuleKind::Generated(_) => return Err(IrError::IncompleteModule(m.symbol.clone())),
		};

		Ok(ModuleImage {
			symbol: m.symbol.clone(),
			inputs: m.inputs.clone(),
			outputs: m.outputs.clone(),
			attributes: m.attributes.clone(),
			loc: m.loc,
			contents,
		})
	}

	/// Inserts a copy of a module image under the given symbol. Instantiated
	/// modules are looked up by symbol. Nothing is left behind on failure.
	pub fn import_module(&mut self, image: &ModuleImage, symbol: &str) -> Result<ModuleId, IrError> {
		let inputs = image.inputs.clone();
		let outputs = image.outputs.clone();
		let attributes = image.attributes.clone();
		let ops = match &image.contents {
			ImageContents::Extern(parameters) => {
				return self.new_extern_module(symbol, inputs, outputs, parameters.clone(), attributes, image.loc);
			},
			ImageContents::Body(ops) => ops,
		};

		let module = self.new_module(symbol, inputs, outputs, attributes, image.loc)?;
		debug!("Importing body of '{}' as '{}'", image.symbol, symbol);
		let result = self.import_body(module, symbol, ops);
		if result.is_err() {
			self.erase_module(module);
		}
		result.map(|_| module)
	}

	fn import_body(&mut self, module: ModuleId, symbol: &str, ops: &[ImageOp]) -> Result<(), IrError> {
		let mut locals = self.add_entry_block(module)?;
		for op in ops {
			let mut kind = remap_operands(&op.kind, |value| {
				locals.get(value.id).copied().ok_or(IrError::InvalidValueId(value))
			})?;
			if let (OpKind::Instance { module: callee, .. }, Some(symbol)) = (&mut kind, &op.callee) {
				*callee = self.find_module(symbol).ok_or_else(|| IrError::UnknownModule(symbol.clone()))?;
			}

			let id = self.append_op(module, kind, op.result_types.clone(), op.attributes.clone(), op.loc)?;
			self.verify_op(id)?;
			locals.extend(self.ops[id.id].results.iter().copied());
		}

		if !self.module(module).map_or(false, ModuleOp::is_complete) {
			return Err(IrError::IncompleteModule(symbol.into()));
		}
		Ok(())
	}

	/// Moves the insertion point to the end of the module's entry block
	pub fn push_insertion_point(&mut self, module: ModuleId) -> Result<(), IrError> {
		let m = self.module(module).ok_or(IrError::InvalidModuleId(module))?;
		if m.body().is_none() {
			return Err(IrError::NoInsertionPoint);
		}
		self.scopes.insertion_points.push(module);
		Ok(())
	}

	pub fn pop_insertion_point(&mut self) -> Option<ModuleId> {
		self.scopes.insertion_points.pop()
	}

	pub fn insertion_point(&self) -> Option<ModuleId> {
		self.scopes.insertion_point()
	}

	pub fn push_location(&mut self, loc: Location) {
		self.scopes.locations.push(loc);
	}

	pub fn pop_location(&mut self) -> Option<Location> {
		self.scopes.locations.pop()
	}

	/// Makes the clock implicit for clock-sensitive operations. `None`
	/// leaves no clock in scope until the entry is popped.
	pub fn push_clock(&mut self, clock: Option<ClockSignal>) {
		self.scopes.clocks.push(clock);
	}

	pub fn pop_clock(&mut self) -> Option<ClockSignal> {
		self.scopes.clocks.pop().flatten()
	}

	pub fn clock(&self) -> Option<&ClockSignal> {
		self.scopes.clock()
	}
}

/// Copies an operation kind with every operand passed through `map`
fn remap_operands<F>(kind: &OpKind, mut map: F) -> Result<OpKind, IrError>
where
	F: FnMut(ValueId) -> Result<ValueId, IrError>,
{
	Ok(match kind {
		OpKind::Constant(constant) => OpKind::Constant(constant.clone()),
		OpKind::Add { lhs, rhs } => OpKind::Add {
			lhs: map(*lhs)?,
			rhs: map(*rhs)?,
		},
		OpKind::Reg { input, clock } => OpKind::Reg {
			input: map(*input)?,
			clock: map(*clock)?,
		},
		OpKind::Instance {
			module,
			name,
			inputs,
			parameters,
		} => OpKind::Instance {
			module: *module,
			name: name.clone(),
			inputs: inputs.iter().map(|v| map(*v)).collect::<Result<_, _>>()?,
			parameters: parameters.clone(),
		},
		OpKind::Output(values) => OpKind::Output(values.iter().map(|v| map(*v)).collect::<Result<_, _>>()?),
	})
}
