use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::rc::Rc;

use hwir::{Attribute, Location, NumericConstant, Type};
use log::debug;
use num_bigint::BigInt;

use crate::{BuildError, Ports};

/// Name of the free-form attribute group of a definition
pub const ATTRIBUTES_GROUP: &str = "Attributes";

/// Declarations with names starting with this prefix are ignored
pub const PRIVATE_PREFIX: char = '_';

pub fn is_private(name: &str) -> bool {
	name.starts_with(PRIVATE_PREFIX)
}

/// Body generation routine of a module
pub type GeneratorFn = Rc<dyn Fn(&mut Ports<'_>) -> Result<(), BuildError>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
	Input,
	Output,
}

/// Special meaning of an input port
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortRole {
	Plain,
	Clock,
	Reset,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortSpec {
	pub name: String,
	pub direction: Direction,

	/// Position among the ports of the same direction
	pub index: usize,

	pub ty: Type,
	pub role: PortRole,
}

#[derive(Clone)]
pub struct GeneratorSpec {
	pub name: String,
	pub routine: GeneratorFn,

	/// Where the generator was declared
	pub loc: Location,
}

impl fmt::Debug for GeneratorSpec {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.debug_struct("GeneratorSpec")
			.field("name", &self.name)
			.field("loc", &self.loc)
			.finish_non_exhaustive()
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstantSpec {
	pub name: String,
	pub value: Attribute,
	pub ty: Type,
}

#[derive(Clone, Debug)]
pub enum AttributeEntry {
	/// Bare name, recorded as a unit attribute
	Flag(String),
	Value(String, Attribute),
}

impl AttributeEntry {
	pub fn flag(name: &str) -> Self {
		Self::Flag(name.into())
	}

	pub fn value(name: &str, value: impl Into<Attribute>) -> Self {
		Self::Value(name.into(), value.into())
	}
}

/// Named member of a module definition
#[derive(Clone)]
pub enum Declaration {
	Input { ty: Type, role: PortRole },
	Output { ty: Type },
	Generator { routine: GeneratorFn, loc: Location },
	Constant { value: Attribute, ty: Type },
	Attributes(Vec<AttributeEntry>),
}

impl Declaration {
	pub fn input(ty: Type) -> Self {
		Self::Input {
			ty,
			role: PortRole::Plain,
		}
	}

	pub fn clock() -> Self {
		Self::Input {
			ty: Type::Clock,
			role: PortRole::Clock,
		}
	}

	pub fn reset() -> Self {
		Self::Input {
			ty: Type::Bits(1),
			role: PortRole::Reset,
		}
	}

	pub fn output(ty: Type) -> Self {
		Self::Output { ty }
	}

	pub fn constant(value: impl Into<Attribute>, ty: Type) -> Self {
		Self::Constant {
			value: value.into(),
			ty,
		}
	}

	#[track_caller]
	pub fn generator<F>(routine: F) -> Self
	where
		F: Fn(&mut Ports<'_>) -> Result<(), BuildError> + 'static,
	{
		Self::Generator {
			routine: Rc::new(routine),
			loc: Location::caller(),
		}
	}
}

impl fmt::Debug for Declaration {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Input { ty, role } => write!(f, "Input({}, {:?})", ty, role),
			Self::Output { ty } => write!(f, "Output({})", ty),
			Self::Generator { loc, .. } => write!(f, "Generator({})", loc),
			Self::Constant { value, ty } => write!(f, "Constant({} : {})", value, ty),
			Self::Attributes(entries) => write!(f, "Attributes({:?})", entries),
		}
	}
}

/// Structure extracted from a list of declarations
#[derive(Clone, Debug, Default)]
pub struct Scan {
	/// Ports in declaration order
	pub ports: Vec<PortSpec>,
	pub clocks: BTreeSet<String>,
	pub resets: BTreeSet<String>,
	pub generators: BTreeMap<String, GeneratorSpec>,
	pub constants: BTreeMap<String, ConstantSpec>,

	/// Free-form attribute group, if declared
	pub attributes: Option<BTreeMap<String, Attribute>>,
}

impl Scan {
	pub fn inputs(&self) -> impl Iterator<Item = &PortSpec> {
		self.ports.iter().filter(|p| p.direction == Direction::Input)
	}

	pub fn outputs(&self) -> impl Iterator<Item = &PortSpec> {
		self.ports.iter().filter(|p| p.direction == Direction::Output)
	}

	pub fn generator(&self) -> Option<&GeneratorSpec> {
		self.generators.values().next()
	}
}

fn check_constant(module: &str, name: &str, value: &Attribute, ty: &Type) -> Result<(), BuildError> {
	let int = match value {
		Attribute::Int(v) => v.clone(),
		Attribute::Bool(v) => BigInt::from(*v as u8),
		other => {
			return Err(BuildError::ConfigurationType(format!(
				"Constant '{}' of module '{}' must be an integer, got {}",
				name, module, other
			)))
		},
	};

	NumericConstant::new(int, ty.clone()).map_err(|_| {
		BuildError::ConfigurationType(format!(
			"Constant '{}' of module '{}' does not fit type {}: {}",
			name, module, ty, value
		))
	})?;
	Ok(())
}

/// Extracts ports, generators, constants and attributes from declarations.
///
/// Port indices are assigned per direction in declaration order. Private
/// declarations are skipped.
pub fn scan(module: &str, decls: &[(String, Declaration)]) -> Result<Scan, BuildError> {
	let mut result = Scan::default();
	let mut seen = HashSet::new();
	let mut input_count = 0;
	let mut output_count = 0;

	for (name, decl) in decls {
		if is_private(name) {
			debug!("Skipping private declaration '{}' in '{}'", name, module);
			continue;
		}

		if !seen.insert(name.as_str()) {
			return Err(BuildError::DuplicateDeclaration {
				module: module.into(),
				name: name.clone(),
			});
		}

		match decl {
			Declaration::Input { ty, role } => {
				if *role == PortRole::Clock && !ty.is_clock() {
					return Err(BuildError::ConfigurationType(format!(
						"Clock port '{}' of module '{}' must have clock type, got {}",
						name, module, ty
					)));
				}

				match role {
					PortRole::Clock => {
						result.clocks.insert(name.clone());
					},
					PortRole::Reset => {
						result.resets.insert(name.clone());
					},
					PortRole::Plain => {},
				}

				result.ports.push(PortSpec {
					name: name.clone(),
					direction: Direction::Input,
					index: input_count,
					ty: ty.clone(),
					role: *role,
				});
				input_count += 1;
			},
			Declaration::Output { ty } => {
				result.ports.push(PortSpec {
					name: name.clone(),
					direction: Direction::Output,
					index: output_count,
					ty: ty.clone(),
					role: PortRole::Plain,
				});
				output_count += 1;
			},
			Declaration::Generator { routine, loc } => {
				result.generators.insert(
					name.clone(),
					GeneratorSpec {
						name: name.clone(),
						routine: routine.clone(),
						loc: *loc,
					},
				);
			},
			Declaration::Constant { value, ty } => {
				check_constant(module, name, value, ty)?;
				result.constants.insert(
					name.clone(),
					ConstantSpec {
						name: name.clone(),
						value: value.clone(),
						ty: ty.clone(),
					},
				);
			},
			Declaration::Attributes(entries) => {
				if result.attributes.is_some() {
					return Err(BuildError::DuplicateDeclaration {
						module: module.into(),
						name: name.clone(),
					});
				}

				let group = entries
					.iter()
					.map(|entry| match entry {
						AttributeEntry::Flag(name) => (name.clone(), Attribute::Unit),
						AttributeEntry::Value(name, value) => (name.clone(), value.clone()),
					})
					.collect();
				result.attributes = Some(group);
			},
		}
	}

	if result.generators.len() > 1 {
		return Err(BuildError::MultipleGenerators {
			module: module.into(),
			generators: result.generators.keys().cloned().collect(),
		});
	}

	Ok(result)
}
