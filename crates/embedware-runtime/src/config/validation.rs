//! Configuration validation utilities.

use std::collections::HashMap;

use super::error::{ConfigError, ConfigResult};
use super::schema::{EmbedwareConfig, LogOutput, LoggingConfig, RegistryConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &EmbedwareConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_registry_config(&config.registry)?;
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::validation(
            "logging.file_path is required when logging.output is \"file\"",
        ));
    }

    for target in logging.filters.keys() {
        if target.trim().is_empty() || target.contains(char::is_whitespace) {
            return Err(ConfigError::validation(format!(
                "Invalid log filter target: {target:?}"
            )));
        }
    }

    Ok(())
}

fn validate_registry_config(registry: &RegistryConfig) -> ConfigResult<()> {
    let prefix = &registry.alias_prefix;
    if prefix.is_empty() {
        return Err(ConfigError::validation("registry.alias_prefix must not be empty"));
    }
    if !prefix
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(ConfigError::validation(format!(
            "registry.alias_prefix must be upper-case ASCII, digits or '_': {prefix}"
        )));
    }

    // Collisions with canonical names are only known once the table is
    // linked; the registry builder reports those.
    let mut seen: HashMap<&str, &str> = HashMap::new();
    for (plugin, alias) in &registry.aliases {
        let alias = alias.trim();
        if alias.is_empty() {
            return Err(ConfigError::invalid_alias(plugin, "alias must not be blank"));
        }
        if let Some(first) = seen.insert(alias, plugin) {
            return Err(ConfigError::DuplicateAlias {
                alias: alias.to_string(),
                first: first.to_string(),
                second: plugin.clone(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        validate_config(&EmbedwareConfig::default()).unwrap();
    }

    #[test]
    fn test_file_output_needs_path() {
        let mut config = EmbedwareConfig::default();
        config.logging.output = LogOutput::File;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError { .. })
        ));

        config.logging.file_path = Some(PathBuf::from("/var/log/embedware.log"));
        validate_config(&config).unwrap();
    }

    #[test]
    fn test_alias_prefix_charset() {
        let mut config = EmbedwareConfig::default();
        config.registry.alias_prefix = "traefik-embedded".to_string();
        assert!(validate_config(&config).is_err());

        config.registry.alias_prefix = "TRAEFIK_EMBEDDED".to_string();
        validate_config(&config).unwrap();
    }

    #[test]
    fn test_blank_alias_is_rejected() {
        let mut config = EmbedwareConfig::default();
        config
            .registry
            .aliases
            .insert("realip".to_string(), "  ".to_string());

        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidAlias { plugin, .. }) if plugin == "realip"
        ));
    }

    #[test]
    fn test_duplicate_alias_is_rejected() {
        let mut config = EmbedwareConfig::default();
        config
            .registry
            .aliases
            .insert("crowdsec".to_string(), "guard".to_string());
        config
            .registry
            .aliases
            .insert("geoblock".to_string(), " guard".to_string());

        match validate_config(&config) {
            Err(ConfigError::DuplicateAlias { alias, first, second }) => {
                assert_eq!(alias, "guard");
                assert_eq!(first, "crowdsec");
                assert_eq!(second, "geoblock");
            }
            other => panic!("expected a duplicate alias error, got {other:?}"),
        }
    }
}
