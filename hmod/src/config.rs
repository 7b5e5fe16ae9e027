use std::str::FromStr;

use crate::metadata::{NoProvenance, ProvenanceProvider};
use crate::BuildError;

/// What happens when a generator assigns the same output twice
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReassignPolicy {
	/// Last assignment wins silently
	Allow,

	/// Last assignment wins, a warning is logged
	#[default]
	Warn,

	/// Second assignment is an error
	Deny,
}

impl FromStr for ReassignPolicy {
	type Err = BuildError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"allow" => Ok(Self::Allow),
			"warn" => Ok(Self::Warn),
			"deny" => Ok(Self::Deny),
			other => Err(BuildError::ConfigurationType(format!(
				"Unknown reassignment policy '{}' (expected allow, warn or deny)",
				other
			))),
		}
	}
}

/// Settings of a compilation session
#[derive(Clone, Debug)]
pub struct SystemConfig {
	pub reassign: ReassignPolicy,

	/// Fill in missing metadata (name, summary, provenance) on module creation
	pub auto_metadata: bool,

	/// Source of repository and commit information
	pub provenance: Box<dyn ProvenanceProvider>,
}

impl Default for SystemConfig {
	fn default() -> Self {
		Self {
			reassign: ReassignPolicy::default(),
			auto_metadata: true,
			provenance: Box::new(NoProvenance),
		}
	}
}
