extern crate hmod;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use hmod::*;
use hwir::design::ValueDef;
use hwir::{Attribute, IrError, OpKind, Type};
use rstest::rstest;

fn adder(ty: Type) -> Definition {
	Definition::builder("Adder")
		.input("lhs", ty.clone())
		.input("rhs", ty.clone())
		.output("sum", ty)
		.generator("build", |p| {
			let sum = p.add(&p.input("lhs")?, &p.input("rhs")?)?;
			p.set("sum", sum)
		})
		.build()
		.unwrap()
}

/// Module without ports whose generator runs `body`
fn harness<F>(body: F) -> Definition
where
	F: Fn(&mut Ports<'_>) -> Result<(), BuildError> + 'static,
{
	Definition::builder("Top").generator("build", body).build().unwrap()
}

#[test]
fn adder_instance_has_sum_output() -> Result<(), BuildError> {
	let add = adder(Type::UInt(8));
	let outputs = Rc::new(RefCell::new(vec![]));
	let seen = outputs.clone();

	let top = Definition::builder("Top")
		.input("x", Type::UInt(8))
		.input("y", Type::UInt(8))
		.output("z", Type::UInt(8))
		.generator("build", move |p| {
			let x = p.input("x")?;
			let y = p.input("y")?;
			let inst = p.instance(&add).bind("lhs", x).bind("rhs", y).build()?;
			seen.borrow_mut().extend(inst.outputs().map(|(name, _)| name.to_string()));
			p.set("z", inst.output("sum")?)
		})
		.build()?;

	let mut sys = System::new();
	let id = sys.materialize(&top)?;
	assert_eq!(*outputs.borrow(), vec!["sum"]);
	assert!(sys.design().module(id).unwrap().is_complete());
	assert_eq!(sys.instances().len(), 1);
	assert_eq!(sys.instances()[0].name, "Adder");
	Ok(())
}

#[test]
fn adder_missing_rhs() {
	let add = adder(Type::UInt(8));
	let top = Definition::builder("Top")
		.input("x", Type::UInt(8))
		.generator("build", move |p| {
			let x = p.input("x")?;
			p.instance(&add).bind("lhs", x).build()?;
			Ok(())
		})
		.build()
		.unwrap();

	let mut sys = System::new();
	match sys.materialize(&top) {
		Err(BuildError::MissingInput { module, ports }) => {
			assert_eq!(module, "Adder");
			assert_eq!(ports, vec!["rhs"]);
		},
		other => panic!("unexpected result: {:?}", other),
	}
}

#[test]
fn all_missing_inputs_reported() {
	let add = adder(Type::UInt(8));
	let top = harness(move |p| {
		p.instance(&add).build()?;
		Ok(())
	});
	match System::new().materialize(&top) {
		Err(BuildError::MissingInput { ports, .. }) => assert_eq!(ports, vec!["lhs", "rhs"]),
		other => panic!("unexpected result: {:?}", other),
	}
}

fn make_adder(calls: Rc<Cell<usize>>) -> ModParams {
	ModParams::new("make_adder", vec![ParamDecl::required("width")], move |args| {
		calls.set(calls.get() + 1);
		Ok(adder(Type::UInt(args.u32("width")?)))
	})
	.unwrap()
}

#[test]
fn make_adder_is_cached() -> Result<(), BuildError> {
	let calls = Rc::new(Cell::new(0));
	let factory = make_adder(calls.clone());

	let a8 = factory.call(&Args::new().arg(8))?;
	let b8 = factory.call(&Args::new().kwarg("width", 8))?;
	let a16 = factory.call(&Args::new().arg(16))?;

	assert!(Definition::ptr_eq(&a8, &b8));
	assert!(!Definition::ptr_eq(&a8, &a16));
	assert_eq!(calls.get(), 2);
	assert_eq!(a8.name(), "Adder_width8");
	assert_eq!(a16.name(), "Adder_width16");

	let mut sys = System::new();
	let m8 = sys.materialize(&a8)?;
	let m16 = sys.materialize(&a16)?;
	let m8 = sys.design().module(m8).unwrap();
	assert_eq!(m8.symbol, "Adder_width8");
	assert_eq!(sys.design().module(m16).unwrap().symbol, "Adder_width16");

	let params = m8.attributes["parameters"].clone();
	assert_eq!(params.to_string(), "{width = 8}");
	Ok(())
}

#[test]
fn parameter_order_does_not_change_name() -> Result<(), BuildError> {
	let factory = ModParams::new(
		"make",
		vec![ParamDecl::required("a"), ParamDecl::required("b")],
		|_| {
			Definition::builder("M")
				.output("y", Type::UInt(4))
				.generator("build", |p| p.set("y", 0))
				.build()
		},
	)?;

	let first = factory.call_with(&ParamCache::new(), &Args::new().kwarg("a", 1).kwarg("b", 2))?;
	let second = factory.call_with(&ParamCache::new(), &Args::new().kwarg("b", 2).kwarg("a", 1))?;
	assert!(!Definition::ptr_eq(&first, &second));
	assert_eq!(first.name(), "M_a1_b2");
	assert_eq!(first.name(), second.name());
	Ok(())
}

#[test]
fn unconnected_outputs_named_exactly() {
	let def = Definition::builder("Partial")
		.output("y0", Type::Bits(1))
		.output("y1", Type::Bits(1))
		.output("y2", Type::Bits(1))
		.generator("build", |p| p.set("y1", 1))
		.build()
		.unwrap();

	let mut sys = System::new();
	match sys.materialize(&def) {
		Err(BuildError::UnconnectedOutput { module, ports }) => {
			assert_eq!(module, "Partial");
			assert_eq!(ports, vec!["y0", "y2"]);
		},
		other => panic!("unexpected result: {:?}", other),
	}
	assert!(sys.design().modules().all(|m| m.is_extern() || m.is_complete()));
	assert_eq!(sys.design().modules().count(), 0);
}

#[test]
fn nested_failure_leaves_nothing_behind() {
	let broken = Definition::builder("Broken")
		.output("y", Type::Bits(1))
		.generator("build", |_| Ok(()))
		.build()
		.unwrap();
	let top = harness(move |p| {
		p.instance(&broken).build()?;
		Ok(())
	});

	let mut sys = System::new();
	assert!(matches!(sys.materialize(&top), Err(BuildError::UnconnectedOutput { .. })));
	assert_eq!(sys.design().modules().count(), 0);
	assert!(sys.design().insertion_point().is_none());
	assert!(sys.design().clock().is_none());
	assert!(!sys.has_block());
	assert!(sys.instances().is_empty());
}

#[test]
fn signal_type_mismatch() {
	let add = adder(Type::UInt(8));
	let top = harness(move |p| {
		let narrow = p.constant(&Type::UInt(4), 1)?;
		let wide = p.constant(&Type::UInt(8), 1)?;
		p.instance(&add).bind("lhs", narrow).bind("rhs", wide).build()?;
		Ok(())
	});

	match System::new().materialize(&top) {
		Err(BuildError::TypeMismatch(err)) => {
			assert_eq!(err.port, "lhs");
			assert_eq!(err.expected, Type::UInt(8));
			assert_eq!(err.found, Type::UInt(4));
		},
		other => panic!("unexpected result: {:?}", other),
	}
}

#[test]
fn absent_input_on_generated_module() {
	let add = adder(Type::UInt(8));
	let top = harness(move |p| {
		p.instance(&add).bind("lhs", 1).bind("rhs", Connection::Absent).build()?;
		Ok(())
	});
	assert!(matches!(
		System::new().materialize(&top),
		Err(BuildError::AbsentInput { .. })
	));
}

#[test]
fn absent_input_on_extern_is_zero() -> Result<(), BuildError> {
	let sram = Definition::builder("Sram")
		.input("addr", Type::UInt(6))
		.input("we", Type::Bits(1))
		.output("data", Type::UInt(16))
		.build()?;
	let top = harness(move |p| {
		p.instance(&sram).bind("addr", 5).bind("we", None::<hwir::Signal>).build()?;
		Ok(())
	});

	let mut sys = System::new();
	sys.materialize(&top)?;

	let design = sys.design();
	let record = &sys.instances()[0];
	let OpKind::Instance { inputs, .. } = &design.op(record.op).unwrap().kind else {
		panic!("not an instance")
	};
	let ValueDef::Result { op, .. } = &design.value(inputs[1]).unwrap().def else {
		panic!("not an op result")
	};
	match &design.op(*op).unwrap().kind {
		OpKind::Constant(c) => {
			assert_eq!(c.try_into_u64(), Some(0));
			assert_eq!(c.ty(), &Type::Bits(1));
		},
		other => panic!("unexpected op: {:?}", other),
	}
	Ok(())
}

#[test]
fn literal_must_fit_port() {
	let add = adder(Type::UInt(8));
	let top = harness(move |p| {
		p.instance(&add).bind("lhs", 300).bind("rhs", 1).build()?;
		Ok(())
	});
	assert!(matches!(
		System::new().materialize(&top),
		Err(BuildError::Ir(IrError::ConstantOutOfRange { .. }))
	));
}

#[test]
fn unknown_and_duplicate_bindings() {
	let add = adder(Type::UInt(8));
	let unknown = {
		let add = add.clone();
		harness(move |p| {
			p.instance(&add).bind("lhs", 1).bind("rhs", 1).bind("carry", 0).build()?;
			Ok(())
		})
	};
	assert!(matches!(
		System::new().materialize(&unknown),
		Err(BuildError::PortResolution { .. })
	));

	let duplicate = harness(move |p| {
		p.instance(&add).bind("lhs", 1).bind("lhs", 2).bind("rhs", 1).build()?;
		Ok(())
	});
	assert!(matches!(
		System::new().materialize(&duplicate),
		Err(BuildError::DuplicateBinding { .. })
	));
}

#[test]
fn instance_names_are_unique_per_module() -> Result<(), BuildError> {
	let add = adder(Type::UInt(2));
	let top = harness(move |p| {
		for _ in 0..2 {
			p.instance(&add).bind("lhs", 0).bind("rhs", 0).build()?;
		}
		for _ in 0..2 {
			p.instance(&add).name("u").bind("lhs", 0).bind("rhs", 0).build()?;
		}
		Ok(())
	});

	let mut sys = System::new();
	sys.materialize(&top)?;
	let names: Vec<&str> = sys.instances().iter().map(|i| i.name.as_str()).collect();
	assert_eq!(names, vec!["Adder", "Adder_1", "u", "u_1"]);
	Ok(())
}

#[test]
fn nested_generation_restores_scopes() -> Result<(), BuildError> {
	let leaf = adder(Type::UInt(4));
	let mid = Definition::builder("Mid")
		.input("x", Type::UInt(4))
		.output("y", Type::UInt(4))
		.generator("build", move |p| {
			let x = p.input("x")?;
			let inst = p.instance(&leaf).bind("lhs", &x).bind("rhs", &x).build()?;
			p.set("y", inst.output("sum")?)
		})
		.build()?;
	let top = Definition::builder("Top")
		.input("a", Type::UInt(4))
		.output("b", Type::UInt(4))
		.generator("build", move |p| {
			let a = p.input("a")?;
			let inst = p.instance(&mid).bind("x", a).build()?;
			// Still inserting into this module after the nested generation
			let doubled = p.add(&inst.output("y")?, &inst.output("y")?)?;
			p.set("b", doubled)
		})
		.build()?;

	let mut sys = System::new();
	let top_id = sys.materialize(&top)?;
	let mid_id = sys.design().find_module("Mid").unwrap();
	let leaf_id = sys.design().find_module("Adder").unwrap();

	assert_eq!(sys.instances_in(top_id).count(), 1);
	assert_eq!(sys.instances_in(mid_id).next().unwrap().module, leaf_id);
	assert!(sys.design().modules().all(|m| m.is_complete()));

	let ir = sys.emit_ir().unwrap();
	let pos = |name: &str| ir.find(&format!("hw.module @{}(", name)).unwrap();
	assert!(pos("Adder") < pos("Mid"));
	assert!(pos("Mid") < pos("Top"));
	Ok(())
}

#[test]
fn recursive_instantiation() {
	let slot: Rc<RefCell<Option<Definition>>> = Rc::new(RefCell::new(None));
	let inner = slot.clone();
	let def = harness(move |p| {
		let this = inner.borrow().clone().unwrap();
		p.instance(&this).build()?;
		Ok(())
	});
	*slot.borrow_mut() = Some(def.clone());

	let mut sys = System::new();
	assert!(matches!(
		sys.materialize(&def),
		Err(BuildError::RecursiveGeneration(..))
	));
	assert_eq!(sys.design().modules().count(), 0);
	*slot.borrow_mut() = None;
}

#[rstest]
#[case(ReassignPolicy::Allow, true)]
#[case(ReassignPolicy::Warn, true)]
#[case(ReassignPolicy::Deny, false)]
fn reassignment_policy(#[case] policy: ReassignPolicy, #[case] ok: bool) {
	let def = Definition::builder("Twice")
		.output("y", Type::Bits(2))
		.generator("build", |p| {
			p.set("y", 1)?;
			p.set("y", 2)
		})
		.build()
		.unwrap();

	let mut sys = System::with_config(SystemConfig {
		reassign: policy,
		..Default::default()
	});
	let result = sys.materialize(&def);
	assert_eq!(result.is_ok(), ok);
	if !ok {
		assert!(matches!(result, Err(BuildError::OutputReassigned { .. })));
	}
}

#[test]
fn implicit_clock() -> Result<(), BuildError> {
	let single = Definition::builder("Delay")
		.clock("clk")
		.input("d", Type::Bits(8))
		.output("q", Type::Bits(8))
		.generator("build", |p| {
			let q = p.reg(&p.input("d")?)?;
			p.set("q", q)
		})
		.build()?;
	let mut sys = System::new();
	sys.materialize(&single)?;
	assert!(sys.design().clock().is_none());

	let dual = Definition::builder("CrossDelay")
		.clock("clk_a")
		.clock("clk_b")
		.input("d", Type::Bits(8))
		.output("q", Type::Bits(8))
		.generator("build", |p| {
			let q = p.reg(&p.input("d")?)?;
			p.set("q", q)
		})
		.build()?;
	assert!(matches!(
		sys.materialize(&dual),
		Err(BuildError::Ir(IrError::NoAmbientClock))
	));
	Ok(())
}

#[test]
fn clock_does_not_leak_into_nested_generation() -> Result<(), BuildError> {
	let dual = Definition::builder("CrossDelay")
		.clock("clk_a")
		.clock("clk_b")
		.input("d", Type::Bits(8))
		.output("q", Type::Bits(8))
		.generator("build", |p| {
			let q = p.reg(&p.input("d")?)?;
			p.set("q", q)
		})
		.build()?;
	let top = Definition::builder("Top")
		.clock("clk")
		.input("d", Type::Bits(8))
		.output("q", Type::Bits(8))
		.generator("build", move |p| {
			let clk = p.clock("clk")?;
			let d = p.input("d")?;
			let inst = p
				.instance(&dual)
				.bind("clk_a", &clk)
				.bind("clk_b", &clk)
				.bind("d", d)
				.build()?;
			p.set("q", inst.output("q")?)
		})
		.build()?;

	let mut sys = System::new();
	assert!(matches!(
		sys.materialize(&top),
		Err(BuildError::Ir(IrError::NoAmbientClock))
	));
	assert_eq!(sys.design().modules().count(), 0);
	assert!(sys.design().clock().is_none());
	Ok(())
}

#[test]
fn clockless_module_sees_no_clock() -> Result<(), BuildError> {
	let inner = Definition::builder("Inner")
		.input("d", Type::Bits(2))
		.output("q", Type::Bits(2))
		.generator("build", |p| {
			let q = p.reg(&p.input("d")?)?;
			p.set("q", q)
		})
		.build()?;
	let top = Definition::builder("Top")
		.clock("clk")
		.generator("build", move |p| {
			assert!(matches!(
				p.instance(&inner).bind("d", 1).build(),
				Err(BuildError::Ir(IrError::NoAmbientClock))
			));
			// The outer clock is in scope again
			let c = p.constant(&Type::Bits(2), 0)?;
			let q = p.reg(&c)?;
			assert_eq!(q.ty(), &Type::Bits(2));
			Ok(())
		})
		.build()?;

	let mut sys = System::new();
	sys.materialize(&top)?;
	assert!(sys.design().find_module("Inner").is_none());
	assert_eq!(constant_count(&sys, "Top"), 1);
	Ok(())
}

#[test]
fn signal_from_another_module_rejected() -> Result<(), BuildError> {
	let captured: Rc<RefCell<Option<hwir::Signal>>> = Rc::new(RefCell::new(None));
	let slot = captured.clone();
	let inner = Definition::builder("Inner")
		.output("y", Type::UInt(4))
		.generator("build", move |p| {
			let outer = slot.borrow().clone().unwrap();
			let y = p.add(&outer, &outer)?;
			p.set("y", y)
		})
		.build()?;
	let store = captured.clone();
	let top = Definition::builder("Top")
		.input("x", Type::UInt(4))
		.generator("build", move |p| {
			*store.borrow_mut() = Some(p.input("x")?);
			p.instance(&inner).build()?;
			Ok(())
		})
		.build()?;

	let mut sys = System::new();
	assert!(matches!(
		sys.materialize(&top),
		Err(BuildError::Ir(IrError::ForeignValue { module })) if module == "Inner"
	));
	Ok(())
}

/// Number of constant ops in the body of the named module
fn constant_count(sys: &System, symbol: &str) -> usize {
	let design = sys.design();
	let m = design.module(design.find_module(symbol).unwrap()).unwrap();
	m.body()
		.unwrap()
		.ops
		.iter()
		.filter(|op| matches!(design.op(**op).unwrap().kind, OpKind::Constant(..)))
		.count()
}

#[test]
fn denied_reassignment_emits_nothing() -> Result<(), BuildError> {
	let def = Definition::builder("Twice")
		.output("y", Type::Bits(2))
		.generator("build", |p| {
			p.set("y", 1)?;
			assert!(matches!(p.set("y", 2), Err(BuildError::OutputReassigned { .. })));
			Ok(())
		})
		.build()?;

	let mut sys = System::with_config(SystemConfig {
		reassign: ReassignPolicy::Deny,
		..Default::default()
	});
	sys.materialize(&def)?;
	assert_eq!(constant_count(&sys, "Twice"), 1);
	Ok(())
}

#[test]
fn rejected_instance_emits_nothing() -> Result<(), BuildError> {
	let add = adder(Type::UInt(8));
	let sram = Definition::builder("Sram")
		.input("addr", Type::UInt(6))
		.input("we", Type::Bits(1))
		.build()?;
	let top = harness(move |p| {
		assert!(matches!(
			p.instance(&add).bind("lhs", 1).build(),
			Err(BuildError::MissingInput { .. })
		));
		assert!(matches!(
			p.instance(&sram).bind("we", Connection::Absent).build(),
			Err(BuildError::MissingInput { .. })
		));
		assert!(matches!(
			p.instance(&add).bind("lhs", 1).bind("rhs", 256).build(),
			Err(BuildError::Ir(IrError::ConstantOutOfRange { .. }))
		));
		Ok(())
	});

	let mut sys = System::new();
	sys.materialize(&top)?;
	assert_eq!(constant_count(&sys, "Top"), 0);
	assert!(sys.instances().is_empty());
	Ok(())
}

#[test]
fn generator_sees_session_read_only() -> Result<(), BuildError> {
	let def = Definition::builder("Peek")
		.clock("clk")
		.generator("build", |p| {
			let module = p.module();
			let clk = p.clock("clk")?;
			assert_eq!(p.design().insertion_point(), Some(module));
			assert_eq!(p.design().clock(), Some(&clk));
			assert!(p.system().has_block());
			assert!(p.system().is_generating(p.definition()));
			Ok(())
		})
		.build()?;

	let mut sys = System::new();
	sys.materialize(&def)?;
	assert!(sys.design().insertion_point().is_none());
	Ok(())
}

#[test]
fn port_access_errors() {
	let def = Definition::builder("M")
		.input("x", Type::Bits(1))
		.output("y", Type::Bits(1))
		.generator("build", |p| {
			assert!(matches!(p.input("nope"), Err(BuildError::PortResolution { .. })));
			assert!(matches!(p.set("x", 0), Err(BuildError::PortResolution { .. })));
			assert!(matches!(p.clock("x"), Err(BuildError::ConfigurationType(..))));
			assert!(matches!(
				p.set("y", Connection::Absent),
				Err(BuildError::ConfigurationType(..))
			));
			let x = p.input("x")?;
			p.set_outputs([("y", x)])
		})
		.build()
		.unwrap();
	assert!(System::new().materialize(&def).is_ok());
}

#[test]
fn appid_attached() -> Result<(), BuildError> {
	let add = adder(Type::UInt(2));
	let top = harness(move |p| {
		p.instance(&add)
			.appid(AppId::indexed("adder", 3))
			.bind("lhs", 0)
			.bind("rhs", 0)
			.build()?;
		Ok(())
	});

	let mut sys = System::new();
	sys.materialize(&top)?;
	let op = sys.design().op(sys.instances()[0].op).unwrap();
	assert_eq!(op.attributes["appid"].to_string(), "{index = 3, name = \"adder\"}");
	Ok(())
}

#[test]
fn parameterized_extern_instance() -> Result<(), BuildError> {
	let make_ram = ModParams::new(
		"make_ram",
		vec![ParamDecl::required("depth"), ParamDecl::optional("init", "zero")],
		|args| {
			let depth = args.u32("depth")?;
			Definition::builder("Ram")
				.input("addr", Type::UInt(32 - depth.leading_zeros()))
				.output("data", Type::Bits(8))
				.build()
		},
	)?;
	let ram = make_ram.call_with(&ParamCache::new(), &Args::new().arg(16))?;
	let top = harness(move |p| {
		p.instance(&ram).bind("addr", 3).build()?;
		Ok(())
	});

	let mut sys = System::new();
	sys.materialize(&top)?;
	let ram_id = sys.design().find_module("Ram").unwrap();
	let ram_op = sys.design().module(ram_id).unwrap();
	assert!(ram_op.is_extern());
	assert_eq!(ram_op.attributes["verilogName"], Attribute::from("Ram"));

	let op = sys.design().op(sys.instances()[0].op).unwrap();
	let OpKind::Instance { parameters, .. } = &op.kind else {
		panic!("not an instance")
	};
	assert_eq!(parameters["depth"], Attribute::from(16));
	assert_eq!(parameters["init"], Attribute::from("zero"));
	Ok(())
}

#[test]
fn imported_module_keeps_body() -> Result<(), BuildError> {
	let mut source = System::new();
	let id = source.materialize(&adder(Type::UInt(8)))?;
	let imported = Definition::import(source.design(), id)?;
	assert!(imported.is_imported());

	let top = harness(move |p| {
		let inst = p
			.instance(&imported)
			.bind("lhs", 1)
			.bind("rhs", Connection::Absent)
			.build()?;
		assert_eq!(inst.output("sum")?.ty(), &Type::UInt(8));
		Ok(())
	});
	let mut sys = System::new();
	sys.materialize(&top)?;

	let design = sys.design();
	let adder_op = design.module(design.find_module("Adder").unwrap()).unwrap();
	assert!(!adder_op.is_extern());
	assert!(adder_op.is_complete());
	assert_eq!(adder_op.attributes["output_file"], Attribute::from("Adder.sv"));
	let body = adder_op.body().unwrap();
	assert!(body
		.ops
		.iter()
		.any(|op| matches!(design.op(*op).unwrap().kind, OpKind::Add { .. })));

	let ir = sys.emit_ir().unwrap();
	assert!(ir.contains("comb.add"));
	assert!(!ir.contains("hw.module.extern @Adder"));
	Ok(())
}

#[test]
fn imported_body_needs_its_instances() -> Result<(), BuildError> {
	let leaf = adder(Type::UInt(8));
	let wrapper = Definition::builder("Wrapper")
		.input("x", Type::UInt(8))
		.output("y", Type::UInt(8))
		.generator("build", move |p| {
			let x = p.input("x")?;
			let inst = p.instance(&leaf).bind("lhs", &x).bind("rhs", &x).build()?;
			p.set("y", inst.output("sum")?)
		})
		.build()?;
	let mut source = System::new();
	let id = source.materialize(&wrapper)?;
	let imported = Definition::import(source.design(), id)?;

	let top = harness(move |p| {
		p.instance(&imported).bind("x", 3).build()?;
		Ok(())
	});
	let mut sys = System::new();
	assert!(matches!(
		sys.materialize(&top),
		Err(BuildError::Ir(IrError::UnknownModule(symbol))) if symbol == "Adder"
	));
	assert_eq!(sys.design().modules().count(), 0);
	Ok(())
}

#[test]
fn manifest_lists_modules() -> Result<(), BuildError> {
	let factory = make_adder(Rc::new(Cell::new(0)));
	let add = factory.call_with(&ParamCache::new(), &Args::new().arg(4))?;
	let top = harness(move |p| {
		p.instance(&add).bind("lhs", 0).bind("rhs", 0).build()?;
		Ok(())
	});

	let mut sys = System::new();
	sys.materialize(&top)?;
	let manifest = sys.manifest();
	let symbols: Vec<&str> = manifest.iter().map(|e| e.symbol.as_str()).collect();
	assert_eq!(symbols, vec!["Top", "Adder_width4"]);

	let json = serde_json::to_value(&manifest).unwrap();
	assert_eq!(json[1]["parameters"]["width"], 4);
	assert_eq!(json[1]["metadata"]["name"], "Adder");
	Ok(())
}
