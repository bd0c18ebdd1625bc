//! Error types for registry construction and lookup.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to read or parse a resource (template, document, config file).
#[derive(Debug, Error)]
pub enum ResourceError {
	/// The resource could not be read.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path of the resource that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// The resource is not valid KDL.
	#[error("KDL parse error: {0}")]
	Kdl(#[from] kdl::KdlError),

	/// The resource parsed but has no root element.
	#[error("resource {path} has no root element")]
	Empty {
		/// Path of the empty resource.
		path: String,
	},

	/// The resource is not present in the loader.
	#[error("resource not found: {path}")]
	Missing {
		/// Requested resource path.
		path: String,
	},
}

/// Registry build and lookup errors.
#[derive(Debug, Error)]
pub enum RegistryError {
	/// Two declarations in the same batch claim one id with different controllers.
	#[error("duplicate screen id '{id}' in {batch}: '{existing}' and '{incoming}'")]
	DuplicateId {
		/// Label of the batch (source file or controller scan).
		batch: String,
		/// The contested screen id.
		id: String,
		/// Controller reference of the first declaration.
		existing: String,
		/// Controller reference of the conflicting declaration.
		incoming: String,
	},

	/// A controller does not derive from a screen or fragment base.
	#[error("controller '{controller}' is neither a screen nor a fragment")]
	Unclassifiable {
		/// Controller name.
		controller: String,
	},

	/// A controller (or a parent in its chain) is not in the catalog.
	#[error("unknown controller '{controller}'")]
	UnknownController {
		/// Controller name.
		controller: String,
	},

	/// A controller's `extends` chain loops back on itself.
	#[error("controller '{controller}' has a cyclic extends chain")]
	ControllerCycle {
		/// Controller where the loop was detected.
		controller: String,
	},

	/// No screen is registered under the requested id.
	#[error("screen not found: '{id}'")]
	NotFound {
		/// The requested id.
		id: String,
	},

	/// A template referenced by a declaration names no controller class.
	#[error("template '{template}' declares no controller class")]
	MissingControllerClass {
		/// Template path.
		template: String,
	},

	/// A declaration names neither a controller nor a template.
	#[error("invalid declaration in {batch}: {message}")]
	InvalidDeclaration {
		/// Label of the batch containing the declaration.
		batch: String,
		/// What is wrong with it.
		message: String,
	},

	/// A document includes itself, directly or transitively.
	#[error("include cycle through '{path}'")]
	IncludeCycle {
		/// Document path where the cycle closed.
		path: String,
	},

	/// Reading a template or document failed.
	#[error("failed to load '{path}': {source}")]
	Resource {
		/// Resource path.
		path: String,
		/// The wrapped cause.
		#[source]
		source: ResourceError,
	},
}

impl RegistryError {
	pub(crate) fn resource(path: impl Into<String>, source: ResourceError) -> Self {
		Self::Resource {
			path: path.into(),
			source,
		}
	}
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
