//! Alias-aware registry of embedded plugins.
//!
//! [`RegistryBuilder`] turns a [`DescriptorTable`] into an [`ActiveRegistry`]
//! keyed by *effective* names: the canonical name, or the operator alias
//! when one is configured. Once built the registry is immutable and can be
//! shared freely across threads.

use std::collections::HashMap;
use std::fmt;

use embedware_core::PluginDescriptor;
use tracing::{debug, info};

use crate::alias::{AliasScheme, AliasSource, EnvAliasSource};
use crate::error::RegistryError;
use crate::table::DescriptorTable;

/// An alias applied while building the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedAlias {
    /// Canonical plugin name.
    pub plugin: &'static str,
    /// Effective name the plugin is registered under.
    pub alias: String,
    /// Key the alias was read from.
    pub key: String,
}

/// Builder for [`ActiveRegistry`].
///
/// Defaults to the linked descriptor table, the default alias prefix and
/// the process environment as alias source.
pub struct RegistryBuilder {
    table: Option<DescriptorTable>,
    scheme: AliasScheme,
    source: Box<dyn AliasSource>,
}

impl RegistryBuilder {
    /// Starts a builder over the linked table, reading aliases from the environment.
    pub fn new() -> Self {
        Self {
            table: None,
            scheme: AliasScheme::default(),
            source: Box::new(EnvAliasSource),
        }
    }

    /// Uses an explicit descriptor table instead of the linked one.
    pub fn table(mut self, table: DescriptorTable) -> Self {
        self.table = Some(table);
        self
    }

    /// Sets the alias key prefix.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.scheme = AliasScheme::new(prefix);
        self
    }

    /// Replaces the whole alias scheme.
    pub fn scheme(mut self, scheme: AliasScheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Sets where aliases are read from.
    pub fn alias_source(mut self, source: impl AliasSource + 'static) -> Self {
        self.source = Box::new(source);
        self
    }

    /// Resolves aliases and builds the registry.
    ///
    /// Fails if two plugins end up with the same effective name.
    pub fn build(self) -> Result<ActiveRegistry, RegistryError> {
        let table = match self.table {
            Some(table) => table,
            None => DescriptorTable::linked()?,
        };

        let mut entries: HashMap<String, PluginDescriptor> = HashMap::with_capacity(table.len());
        let mut aliases = Vec::new();

        for descriptor in table.iter() {
            let effective = match self.scheme.alias_for(descriptor.name, self.source.as_ref()) {
                Some(alias) => {
                    let key = self.scheme.lookup_key(descriptor.name);
                    info!(
                        plugin = descriptor.name,
                        alias = %alias,
                        key = %key,
                        "Embedded plugin registered with custom key"
                    );
                    aliases.push(AppliedAlias {
                        plugin: descriptor.name,
                        alias: alias.clone(),
                        key,
                    });
                    alias
                }
                None => descriptor.name.to_string(),
            };

            if let Some(existing) = entries.get(&effective) {
                return Err(RegistryError::NameCollision {
                    name: effective,
                    first: existing.name,
                    second: descriptor.name,
                });
            }
            entries.insert(effective, *descriptor);
        }

        debug!(
            plugins = entries.len(),
            aliases = aliases.len(),
            prefix = self.scheme.prefix(),
            "Embedded plugin registry built"
        );

        Ok(ActiveRegistry { entries, aliases })
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryBuilder")
            .field("table", &self.table)
            .field("scheme", &self.scheme)
            .finish_non_exhaustive()
    }
}

/// Effective name → descriptor mapping used by every build.
#[derive(Debug, Clone)]
pub struct ActiveRegistry {
    entries: HashMap<String, PluginDescriptor>,
    aliases: Vec<AppliedAlias>,
}

impl ActiveRegistry {
    /// Shorthand for [`RegistryBuilder::new`].
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Whether `name` is an effective name in this registry.
    ///
    /// Exact, case-sensitive match. A canonical name shadowed by an alias
    /// is not found.
    pub fn is_embedded_plugin(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Looks up a descriptor by effective name.
    pub fn get(&self, name: &str) -> Option<&PluginDescriptor> {
        self.entries.get(name)
    }

    /// Effective names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Aliases applied during the build, in canonical-name order.
    pub fn aliases(&self) -> &[AppliedAlias] {
        &self.aliases
    }

    /// Number of effective names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
