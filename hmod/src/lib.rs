pub mod block;
pub mod config;
pub mod connection;
pub mod error;
mod generate;
pub mod instance;
pub mod metadata;
pub mod module;
pub mod naming;
pub mod params;
pub mod proxy;
pub mod scan;
pub mod system;

pub use block::BlockContext;
pub use config::{ReassignPolicy, SystemConfig};
pub use connection::Connection;
pub use error::{BuildError, TypeMismatchError};
pub use instance::{AppId, InstanceBuilder, InstanceId, InstanceRecord, ModuleInstance};
pub use metadata::{GitProvenance, ManifestEntry, Metadata, NoProvenance, Provenance, ProvenanceProvider};
pub use module::{DefId, Definition, ModuleBuilder};
pub use params::{Args, BoundArgs, ModParams, ParamCache, ParamDecl, ParameterKey};
pub use proxy::Ports;
pub use scan::{AttributeEntry, Declaration, PortRole, PortSpec};
pub use system::System;
