use hmod::{AppId, Args, BuildError, Connection, Definition, ModParams, ParamDecl, System};
use hwir::Type;
use log::info;

/// Parameterization functions shared by all designs of a session. Definitions
/// are cached per function, so every call site uses the same instances.
pub struct Factories {
	pub adder: ModParams,
	pub pipeline: ModParams,
}

impl Factories {
	pub fn new() -> Result<Self, BuildError> {
		Ok(Self {
			adder: adder_factory()?,
			pipeline: pipeline_factory()?,
		})
	}
}

/// `make_adder(width)`: a combinational adder of the given width
fn adder_factory() -> Result<ModParams, BuildError> {
	ModParams::new("make_adder", vec![ParamDecl::required("width")], |args| {
		let ty = Type::UInt(args.u32("width")?);
		Definition::builder("Adder")
			.doc("Wrapping unsigned adder")
			.input("a", ty.clone())
			.input("b", ty.clone())
			.output("sum", ty)
			.generator("build", |p| {
				let sum = p.add(&p.input("a")?, &p.input("b")?)?;
				p.set("sum", sum)
			})
			.build()
	})
}

/// `make_pipeline(width, stages)`: a chain of registers clocked by the
/// module's only clock
fn pipeline_factory() -> Result<ModParams, BuildError> {
	ModParams::new(
		"make_pipeline",
		vec![ParamDecl::required("width"), ParamDecl::optional("stages", 2)],
		|args| {
			let ty = Type::Bits(args.u32("width")?);
			let stages = args.u32("stages")?;
			Definition::builder("Pipeline")
				.doc("Register chain")
				.clock("clk")
				.input("d", ty.clone())
				.output("q", ty)
				.generator("build", move |p| {
					let mut signal = p.input("d")?;
					for _ in 0..stages {
						signal = p.reg(&signal)?;
					}
					p.set("q", signal)
				})
				.build()
		},
	)
}

/// Extern probe with an optional enable
fn probe(width: u32) -> Result<Definition, BuildError> {
	Definition::builder("DebugProbe")
		.instance_name("probe")
		.input("en", Type::Bits(1))
		.input("value", Type::UInt(width))
		.build()
}

pub fn adder_top(factories: &Factories, width: u32) -> Result<Definition, BuildError> {
	let adder = factories.adder.call(&Args::new().arg(width))?;
	let ty = Type::UInt(width);
	Definition::builder("AdderTop")
		.input("x", ty.clone())
		.input("y", ty.clone())
		.output("z", ty)
		.generator("build", move |p| {
			let x = p.input("x")?;
			let y = p.input("y")?;
			let inst = p.instance(&adder).bind("a", x).bind("b", y).build()?;
			p.set("z", inst.output("sum")?)
		})
		.build()
}

pub fn pipeline_top(factories: &Factories, width: u32) -> Result<Definition, BuildError> {
	let pipeline = factories.pipeline.call(&Args::new().arg(width).kwarg("stages", 3))?;
	let ty = Type::Bits(width);
	Definition::builder("PipelineTop")
		.clock("clk")
		.input("d", ty.clone())
		.output("q", ty)
		.generator("build", move |p| {
			let clk = p.clock("clk")?;
			let d = p.input("d")?;
			let inst = p
				.instance(&pipeline)
				.name("delay")
				.bind("clk", clk)
				.bind("d", d)
				.build()?;
			p.set("q", inst.output("q")?)
		})
		.build()
}

/// Four-input adder tree sharing one parameterized adder definition
pub fn tree_top(factories: &Factories, width: u32) -> Result<Definition, BuildError> {
	let adder = factories.adder.call(&Args::new().arg(width))?;
	let probe = probe(width)?;
	let ty = Type::UInt(width);
	Definition::builder("AdderTree")
		.input("a0", ty.clone())
		.input("a1", ty.clone())
		.input("a2", ty.clone())
		.input("a3", ty.clone())
		.output("sum", ty)
		.generator("build", move |p| {
			let mut level = (0..4).map(|i| p.input_at(i)).collect::<Result<Vec<_>, BuildError>>()?;
			let mut index = 0;
			while level.len() > 1 {
				let mut next = vec![];
				for pair in level.chunks(2) {
					let inst = p
						.instance(&adder)
						.appid(AppId::indexed("add", index))
						.bind("a", &pair[0])
						.bind("b", &pair[1])
						.build()?;
					next.push(inst.output("sum")?);
					index += 1;
				}
				level = next;
			}

			p.instance(&probe)
				.bind("en", Connection::Absent)
				.bind("value", &level[0])
				.build()?;
			p.set("sum", level[0].clone())
		})
		.build()
}

/// Builds the named demonstration design in a fresh session
pub fn build(sys: &mut System, design: &str, width: u32) -> Result<(), BuildError> {
	let factories = Factories::new()?;
	let top = match design {
		"adder" => adder_top(&factories, width)?,
		"pipeline" => pipeline_top(&factories, width)?,
		"tree" => tree_top(&factories, width)?,
		other => return Err(BuildError::ConfigurationType(format!("Unknown design '{}'", other))),
	};
	info!("Building design '{}' (width {})", design, width);
	sys.materialize(&top)?;
	Ok(())
}
