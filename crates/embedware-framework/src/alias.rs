//! Operator aliases for embedded plugin names.
//!
//! An operator can expose a plugin under a different name by setting
//! `<PREFIX>_<UPPERCASE-CANONICAL-NAME>_KEY`. With the default prefix:
//!
//! - `EMBEDWARE_EMBEDDED_REALIP_KEY=clientip` makes `realip` reachable as `clientip`
//! - `EMBEDWARE_EMBEDDED_CROWDSEC_KEY=bouncer` makes `crowdsec` reachable as `bouncer`
//!
//! Values are trimmed; blank values mean "keep the canonical name".

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Prefix used when none is configured.
pub const DEFAULT_ALIAS_PREFIX: &str = "EMBEDWARE_EMBEDDED";

/// Read-only key/value lookup consulted for aliases.
pub trait AliasSource: Send + Sync {
    /// Returns the raw value stored under `key`, if any.
    fn lookup(&self, key: &str) -> Option<String>;
}

/// Reads aliases from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvAliasSource;

impl AliasSource for EnvAliasSource {
    fn lookup(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl AliasSource for HashMap<String, String> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl AliasSource for BTreeMap<String, String> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl<T: AliasSource + ?Sized> AliasSource for Box<T> {
    fn lookup(&self, key: &str) -> Option<String> {
        (**self).lookup(key)
    }
}

impl<T: AliasSource + ?Sized> AliasSource for Arc<T> {
    fn lookup(&self, key: &str) -> Option<String> {
        (**self).lookup(key)
    }
}

/// Consults several sources in order; the first non-blank value wins.
#[derive(Default)]
pub struct LayeredAliasSource {
    layers: Vec<Box<dyn AliasSource>>,
}

impl LayeredAliasSource {
    /// Creates an empty layered source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a lower-priority layer.
    pub fn layer(mut self, source: impl AliasSource + 'static) -> Self {
        self.layers.push(Box::new(source));
        self
    }
}

impl AliasSource for LayeredAliasSource {
    fn lookup(&self, key: &str) -> Option<String> {
        self.layers
            .iter()
            .filter_map(|layer| layer.lookup(key))
            .find(|value| !value.trim().is_empty())
    }
}

/// Naming convention deriving alias lookup keys from canonical names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasScheme {
    prefix: String,
}

impl AliasScheme {
    /// Creates a scheme with the given key prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The key prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Lookup key for `canonical`, e.g. `realip` → `EMBEDWARE_EMBEDDED_REALIP_KEY`.
    pub fn lookup_key(&self, canonical: &str) -> String {
        format!("{}_{}_KEY", self.prefix, canonical.to_uppercase())
    }

    /// Resolves the operator alias for `canonical`, if one is set.
    pub fn alias_for(&self, canonical: &str, source: &dyn AliasSource) -> Option<String> {
        source
            .lookup(&self.lookup_key(canonical))
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }
}

impl Default for AliasScheme {
    fn default() -> Self {
        Self::new(DEFAULT_ALIAS_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_lookup_key() {
        let scheme = AliasScheme::default();
        assert_eq!(scheme.lookup_key("crowdsec"), "EMBEDWARE_EMBEDDED_CROWDSEC_KEY");
        assert_eq!(AliasScheme::new("TRAEFIK_EMBEDDED").lookup_key("realip"), "TRAEFIK_EMBEDDED_REALIP_KEY");
    }

    #[test]
    fn test_alias_is_trimmed() {
        let scheme = AliasScheme::default();
        let src = source(&[("EMBEDWARE_EMBEDDED_CROWDSEC_KEY", "  bouncer \n")]);
        assert_eq!(scheme.alias_for("crowdsec", &src).as_deref(), Some("bouncer"));
    }

    #[test]
    fn test_blank_alias_is_absent() {
        let scheme = AliasScheme::default();
        let src = source(&[("EMBEDWARE_EMBEDDED_CROWDSEC_KEY", "   ")]);
        assert_eq!(scheme.alias_for("crowdsec", &src), None);
        assert_eq!(scheme.alias_for("realip", &src), None);
    }

    #[test]
    fn test_layered_prefers_first_non_blank() {
        let layered = LayeredAliasSource::new()
            .layer(source(&[("K", " "), ("ONLY_FIRST", "first")]))
            .layer(source(&[("K", "second"), ("ONLY_FIRST", "ignored")]));

        assert_eq!(layered.lookup("K").as_deref(), Some("second"));
        assert_eq!(layered.lookup("ONLY_FIRST").as_deref(), Some("first"));
        assert_eq!(layered.lookup("MISSING"), None);
    }
}
