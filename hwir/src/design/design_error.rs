use num_bigint::BigInt;
use thiserror::Error;

use super::{ModuleId, OpId, Type, ValueId};

#[derive(Clone, Debug)]
pub struct InstanceInputTypeError {
	pub instance: String,
	pub module: String,
	pub port: String,
	pub expected: Type,
	pub found: Type,
}

#[derive(Clone, Debug)]
pub struct OutputTypeError {
	pub module: String,
	pub port: String,
	pub expected: Type,
	pub found: Type,
}

impl From<InstanceInputTypeError> for IrError {
	fn from(err: InstanceInputTypeError) -> Self {
		Self::InstanceInputType(Box::new(err))
	}
}

impl From<OutputTypeError> for IrError {
	fn from(err: OutputTypeError) -> Self {
		Self::OutputType(Box::new(err))
	}
}

/// Represents an error that can occur during IR construction
#[derive(Clone, Debug, Error)]
pub enum IrError {
	#[error("Invalid name '{0}'")]
	InvalidName(String),

	#[error("Invalid module ID")]
	InvalidModuleId(ModuleId),

	#[error("Invalid value ID")]
	InvalidValueId(ValueId),

	#[error("Invalid operation ID")]
	InvalidOpId(OpId),

	#[error("Module name conflict: '{0}'")]
	ModuleNameConflict(String),

	#[error("External module '{0}' cannot have a body")]
	ExternModuleBody(String),

	#[error("Module '{0}' already has a body")]
	BodyAlreadyExists(String),

	#[error("Body of module '{0}' is already terminated")]
	BodyTerminated(String),

	#[error("No insertion point - operations can only be created inside a module body")]
	NoInsertionPoint,

	#[error("Value used in module '{module}' belongs to another module")]
	ForeignValue { module: String },

	#[error("Module '{0}' has no complete body")]
	IncompleteModule(String),

	#[error("Unknown module '{0}'")]
	UnknownModule(String),

	#[error("No clock in scope")]
	NoAmbientClock,

	#[error("Constant {value} does not fit in type '{ty}'")]
	ConstantOutOfRange { value: BigInt, ty: Type },

	#[error("Operand types do not match: '{lhs}' and '{rhs}'")]
	OperandTypeMismatch { lhs: Type, rhs: Type },

	#[error("Operation requires an arithmetic type, got '{0}'")]
	NonArithmeticType(Type),

	#[error("Instance '{instance}' of '{module}' expects {expected} inputs, got {found}")]
	InstanceInputCount {
		instance: String,
		module: String,
		expected: usize,
		found: usize,
	},

	#[error("Incompatible type on input '{}' of instance '{}': expected '{}', got '{}'", .0.port, .0.instance, .0.expected, .0.found)]
	InstanceInputType(Box<InstanceInputTypeError>),

	#[error("Module '{module}' has {expected} outputs, got {found} output values")]
	OutputCount { module: String, expected: usize, found: usize },

	#[error("Incompatible type on output '{}' of module '{}': expected '{}', got '{}'", .0.port, .0.module, .0.expected, .0.found)]
	OutputType(Box<OutputTypeError>),
}
