//! Registry configuration.
//!
//! Configuration is written in KDL inside a `screens { }` block. Other top-level
//! blocks are ignored so the block can live in a shared application config file.
//!
//! ```kdl
//! screens {
//!     login-screen "appLogin"
//!     main-screen "appMain"
//!     protected-login "login" "loginWindow"
//!     protected-main "main" "mainWindow"
//!     documents "base/screens.kdl"
//!     documents "sales/screens.kdl"
//!     controller-namespaces "app"
//! }
//! ```
//!
//! Several files may be layered with [`RegistryConfig::apply`]: scalar values from
//! later layers win, `documents` and `controller-namespaces` accumulate in layer
//! order (module order).

use std::path::{Path, PathBuf};

use kdl::{KdlDocument, KdlNode};
use thiserror::Error;

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error parsing KDL syntax.
	#[error("KDL parse error: {0}")]
	Kdl(#[from] kdl::KdlError),

	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// A field requires a string value and has none.
	#[error("missing value for field: {0}")]
	MissingValue(String),
}

/// Non-fatal warning during configuration parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
	/// A child of the `screens` block was not recognized.
	UnknownField(String),
}

impl std::fmt::Display for ConfigWarning {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ConfigWarning::UnknownField(name) => write!(f, "unknown field '{name}' in screens block will be ignored"),
		}
	}
}

/// One parsed configuration file. Unset fields leave the underlying value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
	pub login_screen_id: Option<String>,
	pub main_screen_id: Option<String>,
	pub protected_login_ids: Option<Vec<String>>,
	pub protected_main_ids: Option<Vec<String>>,
	pub documents: Vec<String>,
	pub controller_namespaces: Vec<String>,
	/// Non-fatal warnings encountered during parsing.
	pub warnings: Vec<ConfigWarning>,
}

impl ConfigLayer {
	/// Parses a KDL string. A document without a `screens` block yields an empty layer.
	pub fn parse(input: &str) -> Result<Self, ConfigError> {
		let doc: KdlDocument = input.parse()?;
		let mut layer = ConfigLayer::default();

		let Some(children) = doc.get("screens").and_then(|n| n.children()) else {
			return Ok(layer);
		};

		for node in children.nodes() {
			let field = node.name().value();
			match field {
				"login-screen" => layer.login_screen_id = Some(single_string(node, field)?),
				"main-screen" => layer.main_screen_id = Some(single_string(node, field)?),
				"protected-login" => layer.protected_login_ids = Some(string_args(node)),
				"protected-main" => layer.protected_main_ids = Some(string_args(node)),
				"documents" => layer.documents.extend(string_args(node)),
				"controller-namespaces" => layer.controller_namespaces.extend(string_args(node)),
				other => layer.warnings.push(ConfigWarning::UnknownField(other.to_string())),
			}
		}

		Ok(layer)
	}

	/// Loads and parses a configuration file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
			path: path.to_path_buf(),
			error: e,
		})?;
		Self::parse(&content)
	}
}

/// Effective registry configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
	/// Screen id the application uses as its login screen.
	pub login_screen_id: String,
	/// Screen id the application uses as its main screen.
	pub main_screen_id: String,
	/// Ids treated as "the login screen" when arbitrating routes.
	pub protected_login_ids: Vec<String>,
	/// Ids treated as "the main screen" when arbitrating routes.
	pub protected_main_ids: Vec<String>,
	/// Root screen documents, in module order.
	pub documents: Vec<String>,
	/// Controller name prefixes scanned for class-based declarations; empty means all.
	pub controller_namespaces: Vec<String>,
}

impl Default for RegistryConfig {
	fn default() -> Self {
		Self {
			login_screen_id: "login".to_string(),
			main_screen_id: "main".to_string(),
			protected_login_ids: vec!["login".to_string(), "loginWindow".to_string()],
			protected_main_ids: vec!["main".to_string(), "mainWindow".to_string()],
			documents: Vec::new(),
			controller_namespaces: Vec::new(),
		}
	}
}

impl RegistryConfig {
	/// Parses a single KDL string on top of the defaults.
	pub fn parse(input: &str) -> Result<Self, ConfigError> {
		let layer = ConfigLayer::parse(input)?;
		log_warnings(&layer, None);
		let mut config = Self::default();
		config.apply(layer);
		Ok(config)
	}

	/// Loads and layers configuration files in order; later files win.
	pub fn load<I, P>(paths: I) -> Result<Self, ConfigError>
	where
		I: IntoIterator<Item = P>,
		P: AsRef<Path>,
	{
		let mut config = Self::default();
		for path in paths {
			let path = path.as_ref();
			let layer = ConfigLayer::load(path)?;
			log_warnings(&layer, Some(path));
			config.apply(layer);
		}
		Ok(config)
	}

	/// Applies a layer on top of this configuration.
	pub fn apply(&mut self, layer: ConfigLayer) {
		if let Some(id) = layer.login_screen_id {
			self.login_screen_id = id;
		}
		if let Some(id) = layer.main_screen_id {
			self.main_screen_id = id;
		}
		if let Some(ids) = layer.protected_login_ids {
			self.protected_login_ids = ids;
		}
		if let Some(ids) = layer.protected_main_ids {
			self.protected_main_ids = ids;
		}
		self.documents.extend(layer.documents);
		self.controller_namespaces.extend(layer.controller_namespaces);
	}

	/// Returns true if `id` is one of the protected login screen ids.
	pub fn is_login_alias(&self, id: &str) -> bool {
		self.protected_login_ids.iter().any(|p| p == id)
	}

	/// Returns true if `id` is one of the protected main screen ids.
	pub fn is_main_alias(&self, id: &str) -> bool {
		self.protected_main_ids.iter().any(|p| p == id)
	}
}

fn log_warnings(layer: &ConfigLayer, path: Option<&Path>) {
	for warning in &layer.warnings {
		match path {
			Some(path) => tracing::warn!(path = %path.display(), "{warning}"),
			None => tracing::warn!("{warning}"),
		}
	}
}

/// Returns true if `name` equals or lies under one of `namespaces`. No namespaces means all.
pub(crate) fn in_namespaces(namespaces: &[String], name: &str) -> bool {
	namespaces.is_empty()
		|| namespaces
			.iter()
			.any(|ns| name == ns || name.strip_prefix(ns.as_str()).is_some_and(|rest| rest.starts_with('.')))
}

/// Extracts positional string arguments from a node.
pub(crate) fn string_args(node: &KdlNode) -> Vec<String> {
	node.entries()
		.iter()
		.filter(|e| e.name().is_none())
		.filter_map(|e| e.value().as_string())
		.map(String::from)
		.collect()
}

fn single_string(node: &KdlNode, field: &str) -> Result<String, ConfigError> {
	string_args(node)
		.into_iter()
		.next()
		.ok_or_else(|| ConfigError::MissingValue(field.to_string()))
}
