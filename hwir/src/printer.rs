use std::collections::BTreeMap;
use std::fmt;

use petgraph::graphmap::DiGraphMap;
use thiserror::Error;

use crate::design::{Attribute, Design, ModuleId, ModuleKind, ModuleOp, OpKind, ValueDef, ValueId};

#[derive(Clone, Error, Debug)]
pub enum PrintError {
	#[error(transparent)]
	FormatError(#[from] fmt::Error),

	#[error("Invalid module ID")]
	InvalidModuleId(ModuleId),

	#[error("Module hierarchy contains a cycle")]
	CyclicHierarchy,
}

/// Prints a design in a human-readable, MLIR-like text form
#[derive(Clone)]
pub struct IrPrinter<'a> {
	design: &'a Design,
}

impl<'a> IrPrinter<'a> {
	pub fn new(design: &'a Design) -> Self {
		Self { design }
	}

	/// Builds the instantiation graph: an edge from parent to each instantiated module
	pub fn hierarchy(&self) -> DiGraphMap<ModuleId, ()> {
		let mut graph = DiGraphMap::new();
		for module in self.design.modules() {
			graph.add_node(module.id());
		}

		for module in self.design.modules() {
			let Some(body) = module.body() else { continue };
			for op in body.ops.iter().filter_map(|id| self.design.op(*id)) {
				if let OpKind::Instance { module: child, .. } = &op.kind {
					if self.design.module(*child).is_some() {
						graph.add_edge(module.id(), *child, ());
					}
				}
			}
		}

		graph
	}

	/// Emits all modules, instantiated modules before their parents
	pub fn emit_design(&self, w: &mut dyn fmt::Write) -> Result<(), PrintError> {
		let graph = self.hierarchy();
		let order = petgraph::algo::toposort(&graph, None).map_err(|_| PrintError::CyclicHierarchy)?;
		for (n, module) in order.into_iter().rev().enumerate() {
			if n > 0 {
				writeln!(w)?;
			}
			self.emit_module(w, module)?;
		}
		Ok(())
	}

	fn value_name(&self, module: &ModuleOp, value: ValueId) -> String {
		match self.design.value(value).map(|v| &v.def) {
			Some(ValueDef::Argument { index, .. }) if module.inputs.len() > *index => {
				format!("%{}", module.inputs[*index].name)
			},
			_ => format!("%{}", value.index()),
		}
	}

	fn value_list(&self, module: &ModuleOp, values: &[ValueId]) -> String {
		values
			.iter()
			.map(|v| self.value_name(module, *v))
			.collect::<Vec<_>>()
			.join(", ")
	}

	fn attribute_dict(attributes: &BTreeMap<String, Attribute>) -> String {
		Attribute::Dict(attributes.clone()).to_string()
	}

	pub fn emit_module(&self, w: &mut dyn fmt::Write, id: ModuleId) -> Result<(), PrintError> {
		let module = self.design.module(id).ok_or(PrintError::InvalidModuleId(id))?;

		let mut ports: Vec<String> = module
			.inputs
			.iter()
			.map(|p| format!("in %{}: {}", p.name, p.ty))
			.collect();
		ports.extend(module.outputs.iter().map(|p| format!("out {}: {}", p.name, p.ty)));

		match &module.kind {
			ModuleKind::Extern { parameters } => {
				write!(w, "hw.module.extern @{}", module.symbol)?;
				if !parameters.is_empty() {
					let params: Vec<String> = parameters.iter().map(|p| format!("{}: {}", p.name, p.kind)).collect();
					write!(w, "<{}>", params.join(", "))?;
				}
				write!(w, "({})", ports.join(", "))?;
				if !module.attributes.is_empty() {
					write!(w, " attributes {}", Self::attribute_dict(&module.attributes))?;
				}
				writeln!(w)?;
			},
			ModuleKind::Generated(body) => {
				write!(w, "hw.module @{}({})", module.symbol, ports.join(", "))?;
				if !module.attributes.is_empty() {
					write!(w, " attributes {}", Self::attribute_dict(&module.attributes))?;
				}
				writeln!(w, " {{")?;
				if let Some(body) = body {
					for op in body.ops.iter().filter_map(|id| self.design.op(*id)) {
						write!(w, "  ")?;
						if !op.results.is_empty() {
							write!(w, "{} = ", self.value_list(module, &op.results))?;
						}
						self.emit_op(w, module, &op.kind)?;
						if !op.attributes.is_empty() {
							write!(w, " {}", Self::attribute_dict(&op.attributes))?;
						}
						writeln!(w)?;
					}
				}
				writeln!(w, "}}")?;
			},
		}
		Ok(())
	}

	fn emit_op(&self, w: &mut dyn fmt::Write, module: &ModuleOp, kind: &OpKind) -> Result<(), PrintError> {
		match kind {
			OpKind::Constant(c) => write!(w, "hw.constant {}", c)?,
			OpKind::Add { lhs, rhs } => write!(
				w,
				"comb.add {}, {}",
				self.value_name(module, *lhs),
				self.value_name(module, *rhs)
			)?,
			OpKind::Reg { input, clock } => write!(
				w,
				"seq.compreg {}, {}",
				self.value_name(module, *input),
				self.value_name(module, *clock)
			)?,
			OpKind::Instance {
				module: callee,
				name,
				inputs,
				parameters,
			} => {
				let callee = self.design.module(*callee).ok_or(PrintError::InvalidModuleId(*callee))?;
				write!(w, "hw.instance \"{}\" @{}", name, callee.symbol)?;
				if !parameters.is_empty() {
					let params: Vec<String> = parameters.iter().map(|(n, v)| format!("{}: {}", n, v)).collect();
					write!(w, "<{}>", params.join(", "))?;
				}
				let args: Vec<String> = callee
					.inputs
					.iter()
					.zip(inputs)
					.map(|(p, v)| format!("{}: {}", p.name, self.value_name(module, *v)))
					.collect();
				let results: Vec<String> = callee.outputs.iter().map(|p| format!("{}: {}", p.name, p.ty)).collect();
				write!(w, "({}) -> ({})", args.join(", "), results.join(", "))?;
			},
			OpKind::Output(values) => write!(w, "hw.output {}", self.value_list(module, values))?,
		}
		Ok(())
	}
}

impl fmt::Display for Design {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		IrPrinter::new(self).emit_design(f).map_err(|_| fmt::Error)
	}
}
