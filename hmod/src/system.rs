use std::collections::{BTreeMap, HashMap, HashSet};

use hwir::{Attribute, Design, IrPrinter, Location, ModuleId, OpId, PrintError};
use log::{debug, warn};

use crate::block::BlockContext;
use crate::generate::generate_body;
use crate::instance::{InstanceId, InstanceRecord};
use crate::metadata::{ManifestEntry, Metadata};
use crate::module::DefId;
use crate::{BuildError, Definition, InstanceBuilder, SystemConfig};

/// Compilation session.
///
/// Owns the IR design and maps each definition to the single module op
/// created for it.
#[derive(Debug, Default)]
pub struct System {
	design: Design,
	config: SystemConfig,

	/// Module op of every materialized definition
	modules: HashMap<DefId, ModuleId>,

	/// Definitions whose generator is currently running
	generating: HashSet<DefId>,

	/// Module symbols in use
	symbols: BlockContext,

	/// One block context per generator being run, innermost last
	blocks: Vec<BlockContext>,

	instances: Vec<InstanceRecord>,
	records: HashMap<ModuleId, ManifestEntry>,
}

impl System {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_config(config: SystemConfig) -> Self {
		Self {
			config,
			..Default::default()
		}
	}

	pub fn config(&self) -> &SystemConfig {
		&self.config
	}

	pub fn design(&self) -> &Design {
		&self.design
	}

	/// Scope stacks of the design are owned by the generation engine
	pub(crate) fn design_mut(&mut self) -> &mut Design {
		&mut self.design
	}

	/// Returns the module op of the definition, creating it (and generating
	/// its body) on first use
	pub fn materialize(&mut self, def: &Definition) -> Result<ModuleId, BuildError> {
		if self.generating.contains(&def.id()) {
			return Err(BuildError::RecursiveGeneration(def.name()));
		}

		if let Some(id) = self.modules.get(&def.id()) {
			return Ok(*id);
		}

		let id = def.create_op(self)?;
		self.modules.insert(def.id(), id);

		if def.generator().is_some() {
			self.generating.insert(def.id());
			let result = generate_body(self, def, id);
			self.generating.remove(&def.id());

			if let Err(e) = result {
				self.discard(def, id);
				return Err(e);
			}
		}

		Ok(id)
	}

	/// Generates the body of a definition which has not been materialized yet
	pub fn generate(&mut self, def: &Definition) -> Result<ModuleId, BuildError> {
		if def.generator().is_none() {
			return Err(BuildError::NoGenerator(def.name()));
		}

		if self.generating.contains(&def.id()) {
			return Err(BuildError::RecursiveGeneration(def.name()));
		}

		if self.modules.contains_key(&def.id()) {
			return Err(BuildError::AlreadyGenerated(def.name()));
		}

		self.materialize(def)
	}

	/// Removes everything created for a definition whose generation failed
	fn discard(&mut self, def: &Definition, module: ModuleId) {
		warn!("Discarding module '{}' after failed generation", def.name());
		self.modules.remove(&def.id());
		self.records.remove(&module);
		self.instances.retain(|i| i.parent != module);
		if let Some(op) = self.design.erase_module(module) {
			self.symbols.release(&op.symbol);
		}
	}

	pub fn module_id(&self, def: &Definition) -> Option<ModuleId> {
		self.modules.get(&def.id()).copied()
	}

	pub fn is_generating(&self, def: &Definition) -> bool {
		self.generating.contains(&def.id())
	}

	pub(crate) fn reserve_symbol(&mut self, name: &str) -> String {
		let symbol = self.symbols.uniquify_symbol(name);
		if symbol != name {
			debug!("Module name '{}' taken, using '{}'", name, symbol);
		}
		symbol
	}

	pub(crate) fn release_symbol(&mut self, symbol: &str) {
		self.symbols.release(symbol);
	}

	pub(crate) fn record_module(&mut self, module: ModuleId, entry: ManifestEntry) {
		self.records.insert(module, entry);
	}

	pub(crate) fn push_block(&mut self, block: BlockContext) {
		self.blocks.push(block);
	}

	pub(crate) fn pop_block(&mut self) -> Option<BlockContext> {
		self.blocks.pop()
	}

	pub fn has_block(&self) -> bool {
		!self.blocks.is_empty()
	}

	pub(crate) fn uniquify_instance_name(&mut self, name: &str) -> Result<String, BuildError> {
		let block = self.blocks.last_mut().ok_or(BuildError::NoActiveScope)?;
		Ok(block.uniquify_symbol(name))
	}

	/// Starts instantiating a module in the module currently being generated
	#[track_caller]
	pub fn instance(&mut self, def: &Definition) -> InstanceBuilder<'_> {
		InstanceBuilder::new(self, def.clone(), Location::caller())
	}

	pub(crate) fn register_instance(&mut self, name: &str, module: ModuleId, op: OpId) -> Result<InstanceId, BuildError> {
		let parent = self.design.insertion_point().ok_or(BuildError::NoActiveScope)?;
		let id = InstanceId(self.instances.len());
		self.instances.push(InstanceRecord {
			id,
			name: name.into(),
			module,
			parent,
			op,
		});
		Ok(id)
	}

	pub fn instances(&self) -> &[InstanceRecord] {
		&self.instances
	}

	/// Instances placed inside the given module
	pub fn instances_in(&self, parent: ModuleId) -> impl Iterator<Item = &InstanceRecord> {
		self.instances.iter().filter(move |i| i.parent == parent)
	}

	fn record(&self, symbol: &str) -> Option<&ManifestEntry> {
		self.records.values().find(|r| r.symbol == symbol)
	}

	pub fn metadata(&self, symbol: &str) -> Option<&Metadata> {
		self.record(symbol)?.metadata.as_ref()
	}

	pub fn constants(&self, symbol: &str) -> Option<&BTreeMap<String, Attribute>> {
		self.record(symbol).map(|r| &r.constants)
	}

	/// Records of all module ops, in creation order
	pub fn manifest(&self) -> Vec<ManifestEntry> {
		self.design
			.modules()
			.filter_map(|m| self.records.get(&m.id()))
			.cloned()
			.collect()
	}

	/// Textual IR of the whole design
	pub fn emit_ir(&self) -> Result<String, PrintError> {
		let mut text = String::new();
		IrPrinter::new(&self.design).emit_design(&mut text)?;
		Ok(text)
	}
}
