//! Plugin contract and the name -> factory registry.

use std::collections::BTreeMap;
use std::fmt::Debug;

use serde::de::DeserializeOwned;

use crate::relocate::Relocator;
use crate::report::ReportPass;
use crate::series::SeriesConsolidator;
use crate::spec::{PluginError, SpecPassContext, SpecPlugin};

/// A post-copy transformation over the workspace.
pub trait Plugin: Debug {
    /// Display name, also used for the log file name.
    fn name(&self) -> &'static str;

    /// One-line description.
    fn description(&self) -> &'static str;

    /// Run the pass. Per-file failures land in the report; only
    /// directory-level or threshold failures return `Err`.
    fn process(&self, spec_ctx: &SpecPassContext) -> Result<ReportPass, PluginError>;
}

/// Builds a plugin from its raw configuration payload.
pub type FnPluginFactory = fn(serde_json::Value) -> Box<dyn Plugin>;

/// Name -> factory map; unknown names are reported at resolution time.
#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
    dict_factories: BTreeMap<String, FnPluginFactory>,
}

impl PluginRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding `underscore_number` and `file_relocator`.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register("underscore_number", |raw_config| -> Box<dyn Plugin> {
            Box::new(SeriesConsolidator::new(raw_config))
        });
        registry.register("file_relocator", |raw_config| -> Box<dyn Plugin> {
            Box::new(Relocator::new(raw_config))
        });
        registry
    }

    /// Register (or replace) `factory` under `name`.
    pub fn register(&mut self, name: &str, factory: FnPluginFactory) {
        self.dict_factories.insert(name.to_string(), factory);
    }

    /// Registered identifiers in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.dict_factories.keys().map(String::as_str).collect()
    }

    /// Instantiate the plugin named by `spec_plugin`.
    pub fn resolve(&self, spec_plugin: &SpecPlugin) -> Result<Box<dyn Plugin>, PluginError> {
        let factory = self
            .dict_factories
            .get(&spec_plugin.name)
            .ok_or_else(|| PluginError::UnknownPlugin {
                name: spec_plugin.name.clone(),
            })?;
        Ok(factory(spec_plugin.config.clone()))
    }
}

/// Parse a plugin payload; an absent payload yields the defaults.
pub(crate) fn parse_plugin_config<T>(
    name_plugin: &'static str,
    raw_config: &serde_json::Value,
) -> Result<T, PluginError>
where
    T: DeserializeOwned + Default,
{
    if raw_config.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(raw_config.clone()).map_err(|source| PluginError::ConfigParse {
        name: name_plugin,
        source,
    })
}
