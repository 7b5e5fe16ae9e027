use std::fmt;

use super::{ClockSignal, ModuleId};

/// Source location attached to IR operations
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Location {
	file: &'static str,
	line: u32,
	column: u32,
}

impl Location {
	pub fn new(file: &'static str, line: u32, column: u32) -> Self {
		Self { file, line, column }
	}

	/// Location of the caller of the function annotated with `#[track_caller]`
	#[track_caller]
	pub fn caller() -> Self {
		let loc = std::panic::Location::caller();
		Self::new(loc.file(), loc.line(), loc.column())
	}

	pub fn unknown() -> Self {
		Self::new("-", 0, 0)
	}

	pub fn file(&self) -> &'static str {
		self.file
	}

	pub fn line(&self) -> u32 {
		self.line
	}
}

impl fmt::Display for Location {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}:{}:{}", self.file, self.line, self.column)
	}
}

/// Nested construction state of a design.
///
/// Every stack is strictly last-in, first-out. Entering generation of
/// a module while another one is being generated pushes on top of the
/// outer module's state. A `None` clock entry hides the clocks below it.
#[derive(Debug, Default)]
pub(super) struct ScopeStack {
	pub insertion_points: Vec<ModuleId>,
	pub locations: Vec<Location>,
	pub clocks: Vec<Option<ClockSignal>>,
}

impl ScopeStack {
	pub fn insertion_point(&self) -> Option<ModuleId> {
		self.insertion_points.last().copied()
	}

	pub fn location(&self) -> Location {
		self.locations.last().copied().unwrap_or_else(Location::unknown)
	}

	pub fn clock(&self) -> Option<&ClockSignal> {
		self.clocks.last()?.as_ref()
	}
}
