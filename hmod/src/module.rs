use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use hwir::design::is_name_valid;
use hwir::{Attribute, Design, Location, ModuleId, ModuleImage, ParamDecl, Port, Type};
use log::debug;

use crate::metadata::{enrich, ManifestEntry, Metadata};
use crate::naming::create_module_name;
use crate::params::ParameterKey;
use crate::proxy::PortProxy;
use crate::scan::{scan, AttributeEntry, ConstantSpec, Declaration, GeneratorSpec, PortSpec, Scan, ATTRIBUTES_GROUP};
use crate::{BuildError, Ports, System};

/// Output file of module bodies implemented elsewhere
pub const EXTERN_OUTPUT_FILE: &str = "external_modules.sv";

static NEXT_DEF_ID: AtomicUsize = AtomicUsize::new(0);

/// Unique identity of a module definition
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefId(usize);

/// Scanned module interface together with its body generator
#[derive(Debug)]
pub struct ModuleDefinition {
	id: DefId,
	base_name: String,
	module_name: Option<String>,
	instance_name: Option<String>,
	doc: Option<String>,
	scan: Scan,
	proxy: PortProxy,
	metadata: Option<Metadata>,

	/// Module op copied into every session the definition is used in
	image: Option<ModuleImage>,

	/// Set when the definition is produced by a parameterization function
	parameters: RefCell<Option<ParameterKey>>,
}

/// Shared handle to a module definition. Clones refer to the same definition.
#[derive(Clone)]
pub struct Definition(Rc<ModuleDefinition>);

impl fmt::Debug for Definition {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "Definition({:?}, {})", self.0.id, self.name())
	}
}

impl Definition {
	pub fn builder(name: &str) -> ModuleBuilder {
		ModuleBuilder::new(name)
	}

	/// Creates a definition from an existing IR module.
	///
	/// The definition has no generator. Materializing it copies the module
	/// op, body included, into the session. Modules instantiated by the body
	/// must already exist in the session under the same symbols.
	pub fn import(design: &Design, module: ModuleId) -> Result<Definition, BuildError> {
		let image = design.export_module(module)?;
		let mut builder = Self::builder(&image.symbol).module_name(&image.symbol);
		for port in &image.inputs {
			builder = match port.ty {
				Type::Clock => builder.clock(&port.name),
				_ => builder.input(&port.name, port.ty.clone()),
			};
		}
		for port in &image.outputs {
			builder = builder.output(&port.name, port.ty.clone());
		}
		debug!("Imported module '{}' ({} ops)", image.symbol, image.op_count());
		builder.image = Some(image);
		builder.build()
	}

	/// Checks if the definition was imported from an existing module
	pub fn is_imported(&self) -> bool {
		self.0.image.is_some()
	}

	pub fn ptr_eq(a: &Definition, b: &Definition) -> bool {
		Rc::ptr_eq(&a.0, &b.0)
	}

	pub fn id(&self) -> DefId {
		self.0.id
	}

	pub fn base_name(&self) -> &str {
		&self.0.base_name
	}

	/// Name of the module op created for this definition.
	///
	/// Parameterized definitions with a generator get the parameters
	/// appended to the base name, e.g. `Adder_width8`. An explicit module
	/// name takes precedence.
	pub fn name(&self) -> String {
		if let Some(name) = &self.0.module_name {
			return name.clone();
		}

		match &*self.0.parameters.borrow() {
			Some(params) if self.generator().is_some() => create_module_name(&self.0.base_name, params),
			_ => self.0.base_name.clone(),
		}
	}

	/// Name of instances which are not given one explicitly
	pub fn instance_name(&self) -> &str {
		self.0.instance_name.as_deref().unwrap_or(&self.0.base_name)
	}

	pub fn doc(&self) -> Option<&str> {
		self.0.doc.as_deref()
	}

	pub fn metadata(&self) -> Option<&Metadata> {
		self.0.metadata.as_ref()
	}

	pub fn parameters(&self) -> Option<ParameterKey> {
		self.0.parameters.borrow().clone()
	}

	pub(crate) fn set_parameters(&self, params: ParameterKey) {
		*self.0.parameters.borrow_mut() = Some(params);
	}

	pub fn ports(&self) -> &[PortSpec] {
		&self.0.scan.ports
	}

	pub fn inputs(&self) -> impl Iterator<Item = &PortSpec> {
		self.0.scan.inputs()
	}

	pub fn outputs(&self) -> impl Iterator<Item = &PortSpec> {
		self.0.scan.outputs()
	}

	/// Output ports, for code connecting to instances of this definition
	pub fn output_ports(&self) -> Vec<&PortSpec> {
		self.outputs().collect()
	}

	pub fn input(&self, name: &str) -> Option<&PortSpec> {
		self.0.proxy.input_index(name).and_then(|i| self.inputs().nth(i))
	}

	pub fn output(&self, name: &str) -> Option<&PortSpec> {
		self.0.proxy.output_index(name).and_then(|i| self.outputs().nth(i))
	}

	pub fn clocks(&self) -> impl Iterator<Item = &str> {
		self.0.scan.clocks.iter().map(String::as_str)
	}

	pub fn resets(&self) -> impl Iterator<Item = &str> {
		self.0.scan.resets.iter().map(String::as_str)
	}

	pub fn generator(&self) -> Option<&GeneratorSpec> {
		self.0.scan.generator()
	}

	pub fn constants(&self) -> impl Iterator<Item = &ConstantSpec> {
		self.0.scan.constants.values()
	}

	pub fn attributes(&self) -> Option<&BTreeMap<String, Attribute>> {
		self.0.scan.attributes.as_ref()
	}

	pub(crate) fn proxy(&self) -> &PortProxy {
		&self.0.proxy
	}

	/// Creates the module op of this definition in the session. The body
	/// of a module with a generator is left for the generation engine.
	pub(crate) fn create_op(&self, sys: &mut System) -> Result<ModuleId, BuildError> {
		let name = self.name();
		if !is_name_valid(&name) {
			return Err(BuildError::InvalidName(name));
		}

		let params = self.parameters();
		let inputs: Vec<Port> = self.inputs().map(|p| Port::new(&p.name, p.ty.clone())).collect();
		let outputs: Vec<Port> = self.outputs().map(|p| Port::new(&p.name, p.ty.clone())).collect();
		let mut attributes = self.attributes().cloned().unwrap_or_default();
		if let Some(params) = &params {
			attributes.insert("parameters".into(), params.to_attribute());
		}

		let symbol = sys.reserve_symbol(&name);
		let result = match (&self.0.image, self.generator()) {
			(Some(image), _) => sys.design_mut().import_module(image, &symbol),
			(None, Some(gen)) => {
				if self.attributes().is_none() {
					attributes.insert("output_file".into(), format!("{}.sv", self.base_name()).into());
				}
				sys.design_mut().new_module(&symbol, inputs, outputs, attributes, gen.loc)
			},
			(None, None) => {
				let decls = params
					.iter()
					.flat_map(|p| p.iter())
					.map(|(name, value)| ParamDecl {
						name: name.clone(),
						kind: value.type_name().into(),
					})
					.collect();
				attributes.insert("verilogName".into(), name.clone().into());
				attributes.insert("output_file".into(), EXTERN_OUTPUT_FILE.into());
				sys.design_mut()
					.new_extern_module(&symbol, inputs, outputs, decls, attributes, Location::unknown())
			},
		};

		let id = match result {
			Ok(id) => id,
			Err(e) => {
				sys.release_symbol(&symbol);
				return Err(e.into());
			},
		};

		let entry = ManifestEntry {
			symbol,
			metadata: enrich(self, sys.config()),
			parameters: params.map(|p| p.as_map().clone()).unwrap_or_default(),
			constants: self.constants().map(|c| (c.name.clone(), c.value.clone())).collect(),
		};
		sys.record_module(id, entry);
		Ok(id)
	}
}

/// Collects declarations of a module definition
#[derive(Debug)]
pub struct ModuleBuilder {
	name: String,
	module_name: Option<String>,
	instance_name: Option<String>,
	doc: Option<String>,
	metadata: Option<Metadata>,
	image: Option<ModuleImage>,
	decls: Vec<(String, Declaration)>,
}

impl ModuleBuilder {
	fn new(name: &str) -> Self {
		Self {
			name: name.into(),
			module_name: None,
			instance_name: None,
			doc: None,
			metadata: None,
			image: None,
			decls: vec![],
		}
	}

	/// Adds an arbitrary declaration
	pub fn declare(mut self, name: &str, decl: Declaration) -> Self {
		self.decls.push((name.into(), decl));
		self
	}

	pub fn input(self, name: &str, ty: Type) -> Self {
		self.declare(name, Declaration::input(ty))
	}

	pub fn output(self, name: &str, ty: Type) -> Self {
		self.declare(name, Declaration::output(ty))
	}

	pub fn clock(self, name: &str) -> Self {
		self.declare(name, Declaration::clock())
	}

	pub fn reset(self, name: &str) -> Self {
		self.declare(name, Declaration::reset())
	}

	pub fn constant(self, name: &str, value: impl Into<Attribute>, ty: Type) -> Self {
		self.declare(name, Declaration::constant(value, ty))
	}

	pub fn attributes(self, entries: Vec<AttributeEntry>) -> Self {
		self.declare(ATTRIBUTES_GROUP, Declaration::Attributes(entries))
	}

	/// Declares the body generator. Its location is recorded in the IR.
	#[track_caller]
	pub fn generator<F>(self, name: &str, routine: F) -> Self
	where
		F: Fn(&mut Ports<'_>) -> Result<(), BuildError> + 'static,
	{
		self.declare(name, Declaration::generator(routine))
	}

	/// Overrides the module op name
	pub fn module_name(mut self, name: &str) -> Self {
		self.module_name = Some(name.into());
		self
	}

	pub fn instance_name(mut self, name: &str) -> Self {
		self.instance_name = Some(name.into());
		self
	}

	pub fn doc(mut self, doc: &str) -> Self {
		self.doc = Some(doc.into());
		self
	}

	pub fn metadata(mut self, metadata: Metadata) -> Self {
		self.metadata = Some(metadata);
		self
	}

	pub fn build(self) -> Result<Definition, BuildError> {
		if !is_name_valid(&self.name) {
			return Err(BuildError::InvalidName(self.name));
		}

		let scan = scan(&self.name, &self.decls)?;
		let proxy = PortProxy::synthesize(&scan);
		debug!(
			"Scanned module '{}': {} ports, {} generator(s)",
			self.name,
			scan.ports.len(),
			scan.generators.len()
		);

		Ok(Definition(Rc::new(ModuleDefinition {
			id: DefId(NEXT_DEF_ID.fetch_add(1, Ordering::Relaxed)),
			base_name: self.name,
			module_name: self.module_name,
			instance_name: self.instance_name,
			doc: self.doc,
			scan,
			proxy,
			metadata: self.metadata,
			image: self.image,
			parameters: RefCell::new(None),
		})))
	}
}
