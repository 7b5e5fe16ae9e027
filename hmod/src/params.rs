use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use hwir::{Attribute, Type};
use log::debug;
use num_bigint::BigInt;

use crate::scan::is_private;
use crate::{BuildError, Definition};

/// Normalized set of module parameters.
///
/// Ordered by name, so two parameter sets with equal values compare and
/// hash equal regardless of the order in which they were supplied.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParameterKey(BTreeMap<String, Attribute>);

impl ParameterKey {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, name: &str) -> Option<&Attribute> {
		self.0.get(name)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&String, &Attribute)> {
		self.0.iter()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn as_map(&self) -> &BTreeMap<String, Attribute> {
		&self.0
	}

	/// Dictionary attribute holding the parameters
	pub fn to_attribute(&self) -> Attribute {
		Attribute::Dict(self.0.clone())
	}
}

impl FromIterator<(String, Attribute)> for ParameterKey {
	fn from_iter<I: IntoIterator<Item = (String, Attribute)>>(iter: I) -> Self {
		Self(iter.into_iter().collect())
	}
}

impl fmt::Display for ParameterKey {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}", self.to_attribute())
	}
}

/// Parameter declared by a module parameterization function
#[derive(Clone, Debug)]
pub enum ParamDecl {
	Named { name: String, default: Option<Attribute> },

	/// Catch-all positional parameter. Not allowed in parameterization functions.
	VarPositional(String),

	/// Catch-all keyword parameter. Not allowed in parameterization functions.
	VarKeyword(String),
}

impl ParamDecl {
	pub fn required(name: &str) -> Self {
		Self::Named {
			name: name.into(),
			default: None,
		}
	}

	pub fn optional(name: &str, default: impl Into<Attribute>) -> Self {
		Self::Named {
			name: name.into(),
			default: Some(default.into()),
		}
	}

	pub fn name(&self) -> &str {
		match self {
			Self::Named { name, .. } | Self::VarPositional(name) | Self::VarKeyword(name) => name,
		}
	}
}

/// Arguments of a parameterization function call
#[derive(Clone, Debug, Default)]
pub struct Args {
	positional: Vec<Attribute>,
	keyword: Vec<(String, Attribute)>,
}

impl Args {
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a positional argument
	pub fn arg(mut self, value: impl Into<Attribute>) -> Self {
		self.positional.push(value.into());
		self
	}

	/// Appends a keyword argument
	pub fn kwarg(mut self, name: &str, value: impl Into<Attribute>) -> Self {
		self.keyword.push((name.into(), value.into()));
		self
	}
}

/// Arguments bound to the declared parameter names, defaults applied
#[derive(Clone, Debug)]
pub struct BoundArgs {
	function: String,
	values: BTreeMap<String, Attribute>,
}

impl BoundArgs {
	pub fn get(&self, name: &str) -> Option<&Attribute> {
		self.values.get(name)
	}

	fn require(&self, name: &str) -> Result<&Attribute, BuildError> {
		self.get(name).ok_or_else(|| self.invalid(format!("no argument named '{}'", name)))
	}

	fn invalid(&self, reason: String) -> BuildError {
		BuildError::InvalidArguments {
			function: self.function.clone(),
			reason,
		}
	}

	fn wrong_kind(&self, name: &str, expected: &str, found: &Attribute) -> BuildError {
		self.invalid(format!("argument '{}' must be {}, got {}", name, expected, found))
	}

	pub fn int(&self, name: &str) -> Result<&BigInt, BuildError> {
		let value = self.require(name)?;
		value.as_int().ok_or_else(|| self.wrong_kind(name, "an integer", value))
	}

	pub fn u32(&self, name: &str) -> Result<u32, BuildError> {
		let value = self.int(name)?;
		u32::try_from(value).map_err(|_| self.invalid(format!("argument '{}' out of range: {}", name, value)))
	}

	pub fn u64(&self, name: &str) -> Result<u64, BuildError> {
		let value = self.int(name)?;
		u64::try_from(value).map_err(|_| self.invalid(format!("argument '{}' out of range: {}", name, value)))
	}

	pub fn bool(&self, name: &str) -> Result<bool, BuildError> {
		let value = self.require(name)?;
		value.as_bool().ok_or_else(|| self.wrong_kind(name, "a boolean", value))
	}

	pub fn str(&self, name: &str) -> Result<&str, BuildError> {
		let value = self.require(name)?;
		value.as_str().ok_or_else(|| self.wrong_kind(name, "a string", value))
	}

	pub fn ty(&self, name: &str) -> Result<&Type, BuildError> {
		let value = self.require(name)?;
		value.as_type().ok_or_else(|| self.wrong_kind(name, "a type", value))
	}

	/// Cache key: every argument except the private ones
	pub fn key(&self) -> ParameterKey {
		self.values
			.iter()
			.filter(|(name, _)| !is_private(name))
			.map(|(name, value)| (name.clone(), value.clone()))
			.collect()
	}
}

static NEXT_FACTORY_ID: AtomicUsize = AtomicUsize::new(0);

/// Identity of a parameterization function
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FactoryId(usize);

pub type FactoryFn = Rc<dyn Fn(&BoundArgs) -> Result<Definition, BuildError>>;

/// A function returning a module definition parameterized by its arguments.
///
/// Calls are memoized: two calls whose arguments normalize to the same
/// [`ParameterKey`] return the very same [`Definition`], and the function
/// body runs only once per key. Arguments whose names start with an
/// underscore reach the function but are not part of the key.
#[derive(Clone)]
pub struct ModParams {
	id: FactoryId,
	name: String,
	params: Vec<(String, Option<Attribute>)>,
	func: FactoryFn,
}

impl fmt::Debug for ModParams {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.debug_struct("ModParams")
			.field("id", &self.id)
			.field("name", &self.name)
			.field("params", &self.params)
			.finish()
	}
}

impl ModParams {
	pub fn new<F>(name: &str, decls: Vec<ParamDecl>, func: F) -> Result<Self, BuildError>
	where
		F: Fn(&BoundArgs) -> Result<Definition, BuildError> + 'static,
	{
		let mut params: Vec<(String, Option<Attribute>)> = vec![];
		for decl in decls {
			match decl {
				ParamDecl::Named { name: param, default } => {
					if params.iter().any(|(n, _)| *n == param) {
						return Err(BuildError::ConfigurationType(format!(
							"Duplicate parameter '{}' in module parameterization function '{}'",
							param, name
						)));
					}
					params.push((param, default));
				},
				ParamDecl::VarPositional(param) | ParamDecl::VarKeyword(param) => {
					return Err(BuildError::InvalidParameterSignature {
						function: name.into(),
						param,
					});
				},
			}
		}

		Ok(Self {
			id: FactoryId(NEXT_FACTORY_ID.fetch_add(1, Ordering::Relaxed)),
			name: name.into(),
			params,
			func: Rc::new(func),
		})
	}

	pub fn id(&self) -> FactoryId {
		self.id
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	fn invalid(&self, reason: String) -> BuildError {
		BuildError::InvalidArguments {
			function: self.name.clone(),
			reason,
		}
	}

	/// Binds call arguments to declared parameter names and applies defaults
	pub fn bind(&self, args: &Args) -> Result<BoundArgs, BuildError> {
		if args.positional.len() > self.params.len() {
			return Err(self.invalid(format!(
				"takes {} positional arguments but {} were given",
				self.params.len(),
				args.positional.len()
			)));
		}

		let mut values = BTreeMap::new();
		for ((name, _), value) in self.params.iter().zip(&args.positional) {
			values.insert(name.clone(), value.clone());
		}

		for (name, value) in &args.keyword {
			if !self.params.iter().any(|(n, _)| n == name) {
				return Err(self.invalid(format!("unexpected keyword argument '{}'", name)));
			}

			if values.insert(name.clone(), value.clone()).is_some() {
				return Err(self.invalid(format!("multiple values for argument '{}'", name)));
			}
		}

		let mut missing = vec![];
		for (name, default) in &self.params {
			if values.contains_key(name) {
				continue;
			}
			match default {
				Some(value) => {
					values.insert(name.clone(), value.clone());
				},
				None => missing.push(name.clone()),
			}
		}

		if !missing.is_empty() {
			return Err(self.invalid(format!("missing required arguments: {}", missing.join(", "))));
		}

		Ok(BoundArgs {
			function: self.name.clone(),
			values,
		})
	}

	/// Calls the function through the thread's module cache
	pub fn call(&self, args: &Args) -> Result<Definition, BuildError> {
		MODULE_CACHE.with(|cache| self.call_with(cache, args))
	}

	/// Calls the function through the given cache
	pub fn call_with(&self, cache: &ParamCache, args: &Args) -> Result<Definition, BuildError> {
		let bound = self.bind(args)?;
		let key = bound.key();
		cache.get_or_insert(self.id, key, |key| {
			debug!("Parameterizing '{}' with {}", self.name, key);
			let def = (self.func)(&bound)?;
			def.set_parameters(key.clone());
			Ok(def)
		})
	}
}

thread_local! {
	static MODULE_CACHE: ParamCache = ParamCache::new();
}

/// Memoization table for parameterized definitions. Entries are never evicted.
#[derive(Debug, Default)]
pub struct ParamCache {
	entries: RefCell<HashMap<(FactoryId, ParameterKey), Definition>>,
}

impl ParamCache {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, factory: FactoryId, key: &ParameterKey) -> Option<Definition> {
		self.entries.borrow().get(&(factory, key.clone())).cloned()
	}

	/// Returns the cached definition or builds and caches a new one.
	///
	/// The table is not borrowed while `build` runs, so parameterization
	/// functions may call other parameterization functions.
	pub fn get_or_insert<F>(&self, factory: FactoryId, key: ParameterKey, build: F) -> Result<Definition, BuildError>
	where
		F: FnOnce(&ParameterKey) -> Result<Definition, BuildError>,
	{
		if let Some(def) = self.get(factory, &key) {
			debug!("Module cache hit for {:?} {}", factory, key);
			return Ok(def);
		}

		let def = build(&key)?;
		Ok(self.entries.borrow_mut().entry((factory, key)).or_insert(def).clone())
	}

	pub fn len(&self) -> usize {
		self.entries.borrow().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.borrow().is_empty()
	}
}
