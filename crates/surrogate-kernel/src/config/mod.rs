//! Rule tables loaded from configuration files.
//!
//! Supports the formats of the `config` crate: YAML, TOML, JSON, INI, RON
//! and JSON5, detected from the file extension. `${VAR}` and `$VAR`
//! references are replaced with environment values before parsing.
//!
//! A rule table names its targets; a [`TargetRegistry`] supplies the actual
//! types and instances:
//!
//! ```toml
//! [dispatch]
//! unmapped = "fail"
//!
//! [[rules]]
//! surrogate = "count"
//! kind = "field"
//! target = "total"
//! instance = "counter"
//!
//! [[rules]]
//! surrogate = "max"
//! kind = "method"
//! target = "max"
//! type = "std::Math"
//! access = "static"
//! explicit_param_types = ["i64", "i64"]
//! explicit_args = [3, 7]
//! ```

use crate::builder::RuleBuilder;
use crate::contract::Contract;
use crate::dispatch::DispatchConfig;
use crate::error::{KernelError, KernelResult};
use crate::reflect::MemberKind;
use crate::registry::TargetRegistry;
use crate::rule::{MappingRule, RuleError};
use crate::value::{ParamType, Value};
use config::{Config as Cfg, File};
use error_stack::{Report, ResultExt};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, LazyLock};

pub use config::FileFormat;

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parsing error: {0}")]
    Parse(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("rule '{rule}' names unknown target type '{name}'")]
    UnknownType { rule: String, name: String },

    #[error("rule '{rule}' names unknown instance '{name}'")]
    UnknownInstance { rule: String, name: String },

    #[error("rule '{rule}' binds instance '{instance}' of {found} but declares type {declared}")]
    TypeMismatch {
        rule: String,
        instance: String,
        declared: String,
        found: String,
    },

    #[error("rule '{rule}' has an unusable explicit argument: {reason}")]
    InvalidArgument { rule: String, reason: String },

    #[error("invalid rule: {0}")]
    Rule(#[from] RuleError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// ─────────────────────────────────────────────────────────────────────────────
// Loading
// ─────────────────────────────────────────────────────────────────────────────

/// Detect configuration format from file extension.
pub fn detect_format(path: &str) -> ConfigResult<FileFormat> {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| ConfigError::UnsupportedFormat("No file extension found".to_string()))?;

    match ext.to_lowercase().as_str() {
        "yaml" | "yml" => Ok(FileFormat::Yaml),
        "toml" => Ok(FileFormat::Toml),
        "json" => Ok(FileFormat::Json),
        "ini" => Ok(FileFormat::Ini),
        "ron" => Ok(FileFormat::Ron),
        "json5" => Ok(FileFormat::Json5),
        _ => Err(ConfigError::UnsupportedFormat(ext.to_string())),
    }
}

static BRACED_VAR: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").ok());
static BARE_VAR: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)\b").ok());

/// Substitute `${VAR}` and `$VAR` with environment values.
///
/// Unset variables are left as written.
pub fn substitute_env_vars(content: &str) -> String {
    let mut result = content.to_string();
    for re in [&*BRACED_VAR, &*BARE_VAR].into_iter().flatten() {
        result = re
            .replace_all(&result, |caps: &regex::Captures| {
                std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
            })
            .into_owned();
    }
    result
}

/// Load and deserialize a configuration file.
pub fn load_config<T>(path: &str) -> ConfigResult<T>
where
    T: DeserializeOwned,
{
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    from_str(&content, format)
}

/// Deserialize configuration text in `format`.
pub fn from_str<T>(content: &str, format: FileFormat) -> ConfigResult<T>
where
    T: DeserializeOwned,
{
    let substituted = substitute_env_vars(content);

    let config = Cfg::builder()
        .add_source(File::from_str(&substituted, format))
        .build()
        .map_err(|e| ConfigError::Parse(e.to_string()))?;

    config
        .try_deserialize()
        .map_err(|e| ConfigError::Serialization(e.to_string()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Rule tables
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    #[default]
    Instance,
    Static,
}

/// One rule as written in a rule table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub surrogate: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signature: Vec<ParamType>,
    pub kind: MemberKind,
    pub target: String,
    /// Qualified target type name; implied by `instance` when omitted.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub target_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    #[serde(default)]
    pub access: AccessMode,
    #[serde(default)]
    pub declared_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explicit_param_types: Option<Vec<ParamType>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explicit_args: Option<Vec<serde_json::Value>>,
}

impl RuleSpec {
    /// Turn this entry into a rule against the registry's targets.
    pub fn resolve(&self, registry: &TargetRegistry) -> ConfigResult<MappingRule> {
        let mut builder = match self.kind {
            MemberKind::Field => MappingRule::field(&self.surrogate, &self.target),
            MemberKind::Method => MappingRule::method(&self.surrogate, &self.target),
        }
        .signature(self.signature.clone())
        .declared_only(self.declared_only);

        if self.access == AccessMode::Static {
            builder = builder.static_access();
        }

        match (&self.instance, &self.target_type) {
            (Some(instance), declared) => {
                let (ty, obj) = registry.instance(instance).ok_or_else(|| ConfigError::UnknownInstance {
                    rule: self.surrogate.clone(),
                    name: instance.clone(),
                })?;
                if let Some(declared) = declared.as_ref().filter(|d| *d != ty.name()) {
                    return Err(ConfigError::TypeMismatch {
                        rule: self.surrogate.clone(),
                        instance: instance.clone(),
                        declared: declared.clone(),
                        found: ty.name().to_string(),
                    });
                }
                builder = builder.bind(ty, obj.clone());
            }
            (None, Some(name)) => {
                let ty = registry.target_type(name).ok_or_else(|| ConfigError::UnknownType {
                    rule: self.surrogate.clone(),
                    name: name.clone(),
                })?;
                builder = builder.on(ty);
            }
            // left to the rule builder to reject
            (None, None) => {}
        }

        if let Some(types) = &self.explicit_param_types {
            builder = builder.explicit_param_types(types.clone());
        }
        if let Some(args) = &self.explicit_args {
            let args = args
                .iter()
                .cloned()
                .map(Value::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| ConfigError::InvalidArgument {
                    rule: self.surrogate.clone(),
                    reason: e.to_string(),
                })?;
            builder = builder.explicit_args(args);
        }

        Ok(builder.build()?)
    }
}

/// A complete rule table: dispatch settings plus rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleTableConfig {
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
}

impl RuleTableConfig {
    pub fn load(path: &str) -> ConfigResult<Self> {
        load_config(path)
    }

    /// Resolve every entry, stopping at the first bad one.
    pub fn resolve(&self, registry: &TargetRegistry) -> ConfigResult<Vec<MappingRule>> {
        self.rules.iter().map(|spec| spec.resolve(registry)).collect()
    }

    /// Write the table back out in `format`.
    pub fn render(&self, format: FileFormat) -> ConfigResult<String> {
        match format {
            FileFormat::Toml => {
                toml::to_string_pretty(self).map_err(|e| ConfigError::Serialization(e.to_string()))
            }
            FileFormat::Yaml => {
                serde_yaml::to_string(self).map_err(|e| ConfigError::Serialization(e.to_string()))
            }
            FileFormat::Json => serde_json::to_string_pretty(self)
                .map_err(|e| ConfigError::Serialization(e.to_string())),
            other => Err(ConfigError::UnsupportedFormat(format!("{other:?}"))),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Builder entry points
// ─────────────────────────────────────────────────────────────────────────────

impl RuleBuilder {
    /// Builder preloaded with the rule table at `path`.
    pub fn from_config_file(
        contract: Arc<Contract>,
        path: &str,
        registry: &TargetRegistry,
    ) -> KernelResult<Self> {
        let table = RuleTableConfig::load(path)
            .map_err(|e| Report::new(KernelError::from(e)))
            .attach(format!("loading rule table {path}"))?;
        Self::from_table(contract, table, registry).attach(format!("rule table {path}"))
    }

    /// Builder preloaded with a rule table given as text.
    pub fn from_config_str(
        contract: Arc<Contract>,
        content: &str,
        format: FileFormat,
        registry: &TargetRegistry,
    ) -> KernelResult<Self> {
        let table: RuleTableConfig = from_str(content, format)
            .map_err(|e| Report::new(KernelError::from(e)))
            .attach(format!("parsing {format:?} rule table"))?;
        Self::from_table(contract, table, registry)
    }

    fn from_table(
        contract: Arc<Contract>,
        table: RuleTableConfig,
        registry: &TargetRegistry,
    ) -> KernelResult<Self> {
        let rules = table
            .resolve(registry)
            .map_err(|e| Report::new(KernelError::from(e)))
            .attach(format!("resolving rules for contract {}", contract.name()))?;
        tracing::debug!(
            contract = contract.name(),
            rules = rules.len(),
            "rule table loaded"
        );
        let mut builder = RuleBuilder::new(contract);
        builder.config(table.dispatch).add_all(rules);
        Ok(builder)
    }
}
