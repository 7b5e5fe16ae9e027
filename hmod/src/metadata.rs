use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use dyn_clone::DynClone;
use hwir::Attribute;
use log::debug;
use serde::Serialize;
use subprocess::{ExitStatus, Popen, PopenConfig, PopenError, Redirection};
use thiserror::Error;

use crate::{Definition, SystemConfig};

/// Descriptive information about a module
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub repo: Option<String>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub commit_hash: Option<String>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub version: Option<String>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub summary: Option<String>,

	#[serde(skip_serializing_if = "BTreeMap::is_empty")]
	pub misc: BTreeMap<String, Attribute>,
}

/// Where the design sources come from
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Provenance {
	pub repo: Option<String>,
	pub commit_hash: Option<String>,
}

#[derive(Debug, Error)]
pub enum ProvenanceError {
	#[error("Failed to run '{command}': {source}")]
	Spawn { command: String, source: PopenError },

	#[error("'{command}' failed ({status:?}): {stderr}")]
	Command {
		command: String,
		status: ExitStatus,
		stderr: String,
	},
}

/// Supplies repository information for automatically filled metadata
pub trait ProvenanceProvider: DynClone + fmt::Debug {
	fn provenance(&self) -> Result<Provenance, ProvenanceError>;
}

dyn_clone::clone_trait_object!(ProvenanceProvider);

/// Provides no information
#[derive(Clone, Debug)]
pub struct NoProvenance;

impl ProvenanceProvider for NoProvenance {
	fn provenance(&self) -> Result<Provenance, ProvenanceError> {
		Ok(Provenance::default())
	}
}

/// Queries the git repository containing `dir`
#[derive(Clone, Debug)]
pub struct GitProvenance {
	pub dir: PathBuf,
}

impl GitProvenance {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self { dir: dir.into() }
	}

	fn git(&self, args: &[&str]) -> Result<String, ProvenanceError> {
		let dir = self.dir.to_string_lossy();
		let mut argv = vec!["git", "-C", &*dir];
		argv.extend_from_slice(args);
		let command = argv.join(" ");

		let spawn_error = |source| ProvenanceError::Spawn {
			command: command.clone(),
			source,
		};

		let mut p = Popen::create(
			&argv,
			PopenConfig {
				stdout: Redirection::Pipe,
				stderr: Redirection::Pipe,
				..Default::default()
			},
		)
		.map_err(spawn_error)?;

		let (stdout, stderr) = p.communicate(None).map_err(|e| spawn_error(e.into()))?;
		let status = p.wait().map_err(spawn_error)?;
		if !status.success() {
			return Err(ProvenanceError::Command {
				command,
				status,
				stderr: stderr.unwrap_or_default().trim().into(),
			});
		}

		Ok(stdout.unwrap_or_default().trim().into())
	}
}

impl ProvenanceProvider for GitProvenance {
	fn provenance(&self) -> Result<Provenance, ProvenanceError> {
		let commit_hash = self.git(&["rev-parse", "HEAD"])?;
		let repo = match self.git(&["remote", "get-url", "origin"]) {
			Ok(url) => url,
			Err(_) => self.git(&["rev-parse", "--show-toplevel"])?,
		};

		Ok(Provenance {
			repo: Some(repo),
			commit_hash: Some(commit_hash),
		})
	}
}

/// Metadata recorded for a module op: the definition's own metadata with
/// the blanks filled in
pub(crate) fn enrich(def: &Definition, config: &SystemConfig) -> Option<Metadata> {
	if def.metadata().is_none() && !config.auto_metadata {
		return None;
	}

	let mut meta = def.metadata().cloned().unwrap_or_default();
	if !config.auto_metadata {
		return Some(meta);
	}

	if meta.name.is_none() {
		meta.name = Some(def.base_name().into());
	}

	if meta.summary.is_none() {
		meta.summary = def.doc().map(Into::into);
	}

	if meta.repo.is_none() && meta.commit_hash.is_none() {
		match config.provenance.provenance() {
			Ok(p) => {
				meta.repo = p.repo;
				meta.commit_hash = p.commit_hash;
			},
			Err(e) => debug!("Could not determine provenance of '{}': {}", def.base_name(), e),
		}
	}

	Some(meta)
}

/// Record of a module op produced by a session
#[derive(Clone, Debug, Serialize)]
pub struct ManifestEntry {
	pub symbol: String,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub metadata: Option<Metadata>,

	#[serde(skip_serializing_if = "BTreeMap::is_empty")]
	pub parameters: BTreeMap<String, Attribute>,

	#[serde(skip_serializing_if = "BTreeMap::is_empty")]
	pub constants: BTreeMap<String, Attribute>,
}
