mod demos;

use std::fs;
use std::io;
use std::io::Write;

use clap::{command, value_parser, Arg, ArgAction};
use hmod::{BuildError, GitProvenance, ReassignPolicy, System, SystemConfig};
use hwir::PrintError;
use log::info;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum CliError {
	#[error(transparent)]
	#[diagnostic(code(hgen::io_error))]
	IoError(#[from] io::Error),

	#[error(transparent)]
	#[diagnostic(code(hgen::build_error), help("check the module declarations and connections"))]
	BuildError(#[from] BuildError),

	#[error(transparent)]
	#[diagnostic(code(hgen::print_error))]
	PrintError(#[from] PrintError),

	#[error(transparent)]
	#[diagnostic(code(hgen::manifest_error))]
	ManifestError(#[from] serde_json::Error),
}

fn run(design: &str, width: u32, emit: &str, config: SystemConfig, output: &mut dyn Write) -> Result<(), CliError> {
	let mut sys = System::with_config(config);
	demos::build(&mut sys, design, width)?;
	info!("Design has {} modules", sys.design().modules().count());

	match emit {
		"manifest" => {
			serde_json::to_writer_pretty(&mut *output, &sys.manifest())?;
			writeln!(output)?;
		},
		_ => write!(output, "{}", sys.emit_ir()?)?,
	}
	Ok(())
}

fn main() -> miette::Result<()> {
	env_logger::init();

	let matches = command!()
		.arg(
			Arg::new("design")
				.short('d')
				.long("design")
				.help("Demonstration design to build")
				.value_parser(["adder", "pipeline", "tree"])
				.default_value("adder"),
		)
		.arg(
			Arg::new("width")
				.short('w')
				.long("width")
				.help("Data width of the design")
				.value_parser(value_parser!(u32).range(1..=64))
				.default_value("8"),
		)
		.arg(
			Arg::new("emit")
				.short('e')
				.long("emit")
				.help("What to print")
				.value_parser(["ir", "manifest"])
				.default_value("ir"),
		)
		.arg(Arg::new("output").short('o').long("output"))
		.arg(
			Arg::new("reassign")
				.long("reassign")
				.help("Policy for outputs assigned more than once")
				.value_parser(["allow", "warn", "deny"])
				.default_value("warn"),
		)
		.arg(
			Arg::new("no-metadata")
				.long("no-metadata")
				.help("Do not fill in module metadata automatically")
				.action(ArgAction::SetTrue),
		)
		.arg(
			Arg::new("git")
				.long("git")
				.help("Take module provenance from the git repository at this path"),
		)
		.get_matches();

	let design = matches.get_one::<String>("design").map_or("adder", String::as_str);
	let emit = matches.get_one::<String>("emit").map_or("ir", String::as_str);
	let width = matches.get_one::<u32>("width").copied().unwrap_or(8);

	let mut config = SystemConfig {
		auto_metadata: !matches.get_flag("no-metadata"),
		..Default::default()
	};
	if let Some(policy) = matches.get_one::<String>("reassign") {
		config.reassign = policy.parse::<ReassignPolicy>().map_err(CliError::from)?;
	}
	if let Some(dir) = matches.get_one::<String>("git") {
		config.provenance = Box::new(GitProvenance::new(dir));
	}

	let mut output: Box<dyn Write> = match matches.get_one::<String>("output") {
		None => Box::new(io::stdout()),
		Some(path) => Box::new(fs::File::create(path).map_err(CliError::from)?),
	};

	run(design, width, emit, config, &mut output)?;
	Ok(())
}
