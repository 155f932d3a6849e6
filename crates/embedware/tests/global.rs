use std::collections::BTreeMap;

use embedware::prelude::*;
use embedware::runtime::EmbedwareConfig;

#[test]
fn test_installed_runtime_answers_free_functions() {
    assert!(!embedware::is_embedded_plugin("crowdsec"));
    assert!(matches!(embedware::global(), Err(RuntimeError::NotInstalled)));

    let mut config = EmbedwareConfig::default();
    config.registry.env_aliases = false;
    config.registry.aliases = BTreeMap::from([("crowdsec".to_string(), "bouncer".to_string())]);

    let runtime = EmbeddedRuntime::builder()
        .config(config)
        .without_logging()
        .build()
        .unwrap();
    let runtime = embedware::install(runtime).unwrap();

    assert!(embedware::is_embedded_plugin("bouncer"));
    assert!(!embedware::is_embedded_plugin("crowdsec"));
    assert!(embedware::is_embedded_plugin("realip"));

    let ctx = runtime.context("edge-bouncer");
    let constructor =
        embedware::build_embedded_plugin(&ctx, "bouncer", &ConfigBag::new(), "edge-bouncer")
            .unwrap();
    assert_eq!(constructor.plugin(), "crowdsec");

    let err = embedware::build_embedded_plugin(&ctx, "crowdsec", &ConfigBag::new(), "x").unwrap_err();
    assert!(matches!(err, RuntimeError::Build(BuildError::UnknownPlugin(_))));

    let again = EmbeddedRuntime::builder()
        .config(EmbedwareConfig::default())
        .without_logging()
        .build()
        .unwrap();
    assert!(matches!(embedware::install(again), Err(RuntimeError::AlreadyInstalled)));
}
