use hwir::{IrError, Type};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct TypeMismatchError {
	pub module: String,
	pub port: String,
	pub expected: Type,
	pub found: Type,
}

impl From<TypeMismatchError> for BuildError {
	fn from(err: TypeMismatchError) -> Self {
		Self::TypeMismatch(Box::new(err))
	}
}

/// Represents an error that can occur while declaring, generating or
/// instantiating modules
#[derive(Clone, Debug, Error)]
pub enum BuildError {
	#[error("Port '{port}' not found in module '{module}'")]
	PortResolution { module: String, port: String },

	#[error("Wrong type on port '{}' of module '{}': expected '{}', got '{}'", .0.port, .0.module, .0.expected, .0.found)]
	TypeMismatch(Box<TypeMismatchError>),

	#[error("Missing input signals for ports of module '{module}': {}", .ports.join(", "))]
	MissingInput { module: String, ports: Vec<String> },

	#[error("Unconnected outputs in module '{module}': {}", .ports.join(", "))]
	UnconnectedOutput { module: String, ports: Vec<String> },

	#[error("Port '{port}' of module '{module}' cannot be absent (disconnected ports are only allowed on extern modules)")]
	AbsentInput { module: String, port: String },

	#[error("Output '{port}' of module '{module}' assigned more than once")]
	OutputReassigned { module: String, port: String },

	#[error("Module '{module}' declares multiple generators: {}", .generators.join(", "))]
	MultipleGenerators { module: String, generators: Vec<String> },

	#[error("Module '{0}' has no generator")]
	NoGenerator(String),

	#[error("Module parameterization function '{function}' cannot declare variadic parameter '{param}'")]
	InvalidParameterSignature { function: String, param: String },

	#[error("Invalid arguments to '{function}': {reason}")]
	InvalidArguments { function: String, reason: String },

	#[error("{0}")]
	ConfigurationType(String),

	#[error("Duplicate declaration '{name}' in module '{module}'")]
	DuplicateDeclaration { module: String, name: String },

	#[error("Port '{port}' of module '{module}' bound more than once")]
	DuplicateBinding { module: String, port: String },

	#[error("Modules can only be instantiated inside a generator")]
	NoActiveScope,

	#[error("Module '{0}' has already been generated")]
	AlreadyGenerated(String),

	#[error("Module '{0}' is instantiated while it is being generated")]
	RecursiveGeneration(String),

	#[error("Invalid name '{0}'")]
	InvalidName(String),

	#[error(transparent)]
	Ir(#[from] IrError),
}
