use hwir::{ClockSignal, ModuleId, ValueId};
use log::{debug, info};

use crate::block::BlockContext;
use crate::scan::GeneratorSpec;
use crate::{BuildError, Definition, Ports, System};

/// Single clock input of the definition, if it has exactly one
fn implicit_clock(def: &Definition, args: &[ValueId]) -> Option<ClockSignal> {
	let mut clocks = def.clocks();
	let clock = clocks.next()?;
	if clocks.next().is_some() {
		return None;
	}

	let index = def.input(clock)?.index;
	Some(ClockSignal::new(args[index]))
}

fn execute(sys: &mut System, def: &Definition, gen: &GeneratorSpec, module: ModuleId, args: Vec<ValueId>) -> Result<(), BuildError> {
	let mut ports = Ports::new(sys, def.clone(), module, args);
	(gen.routine)(&mut ports)?;
	ports.finish()
}

/// Generates the body of a module op.
///
/// The body is built at the end of the module's entry block, with a fresh
/// block context, the generator's location and the implicit clock in scope.
/// Definitions without exactly one clock see no clock, even when generated
/// inside a clocked module.
/// All scopes are left before returning, also on failure.
pub(crate) fn generate_body(sys: &mut System, def: &Definition, module: ModuleId) -> Result<(), BuildError> {
	let gen = def.generator().ok_or_else(|| BuildError::NoGenerator(def.name()))?.clone();
	info!("Generating module '{}' with '{}'", def.name(), gen.name);

	let args = sys.design_mut().add_entry_block(module)?;
	let clock = implicit_clock(def, &args);

	sys.push_block(BlockContext::new());
	if let Err(e) = sys.design_mut().push_insertion_point(module) {
		sys.pop_block();
		return Err(e.into());
	}
	sys.design_mut().push_location(gen.loc);
	if let Some(clock) = &clock {
		debug!("Implicit clock of '{}' is {:?}", def.name(), clock.value());
	}
	sys.design_mut().push_clock(clock);

	let result = execute(sys, def, &gen, module, args);

	sys.design_mut().pop_clock();
	sys.design_mut().pop_location();
	sys.design_mut().pop_insertion_point();
	sys.pop_block();

	result
}
