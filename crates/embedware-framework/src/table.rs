//! The descriptor table: every embedded plugin the binary can offer.

use embedware_core::{EMBEDDED_PLUGINS, PluginDescriptor};

use crate::error::RegistryError;

/// Canonical descriptors, sorted by name and free of duplicates.
#[derive(Debug, Clone, Default)]
pub struct DescriptorTable {
    entries: Vec<PluginDescriptor>,
}

impl DescriptorTable {
    /// Collects every descriptor registered with `#[embedded_plugin]` in
    /// the linked binary.
    pub fn linked() -> Result<Self, RegistryError> {
        Self::new(EMBEDDED_PLUGINS.iter().copied())
    }

    /// Builds a table from explicit descriptors.
    pub fn new(
        descriptors: impl IntoIterator<Item = PluginDescriptor>,
    ) -> Result<Self, RegistryError> {
        let mut entries: Vec<PluginDescriptor> = descriptors.into_iter().collect();
        entries.sort_by(|a, b| a.name.cmp(b.name));

        if let Some(pair) = entries.windows(2).find(|pair| pair[0].name == pair[1].name) {
            return Err(RegistryError::DuplicatePlugin(pair[0].name.to_string()));
        }

        Ok(Self { entries })
    }

    /// Looks up a descriptor by canonical name.
    pub fn get(&self, canonical: &str) -> Option<&PluginDescriptor> {
        self.entries
            .binary_search_by(|entry| entry.name.cmp(canonical))
            .ok()
            .map(|index| &self.entries[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = &PluginDescriptor> {
        self.entries.iter()
    }

    /// Canonical names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|entry| entry.name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Broken, Label};

    #[test]
    fn test_table_is_sorted() {
        let table = DescriptorTable::new([
            PluginDescriptor::of::<Label>(),
            PluginDescriptor::of::<Broken>(),
        ])
        .unwrap();

        assert_eq!(table.names().collect::<Vec<_>>(), ["broken", "label"]);
        assert_eq!(table.get("label").map(|d| d.name), Some("label"));
        assert!(table.get("missing").is_none());
    }

    #[test]
    fn test_duplicate_canonical_names_are_rejected() {
        let result = DescriptorTable::new([
            PluginDescriptor::of::<Label>(),
            PluginDescriptor::of::<Label>(),
        ]);

        assert!(matches!(result, Err(RegistryError::DuplicatePlugin(name)) if name == "label"));
    }

    #[test]
    fn test_empty_table() {
        let table = DescriptorTable::new([]).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.len(), 0);
    }
}
