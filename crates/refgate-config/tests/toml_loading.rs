use std::time::Duration;

use figment::Jail;
use refgate_config::{ConfigError, RefgateConfig};
use refgate_core::Domain;

#[test]
fn project_toml_restricts_domains() {
    Jail::expect_with(|jail| {
        jail.create_dir(".refgate")?;
        jail.create_file(
            ".refgate/config.toml",
            r#"
            [databases]
            data_dir = "/srv/refgate"
            domains = ["settings", "units", "materials"]
            "#,
        )?;

        let config = RefgateConfig::load_from(jail.directory()).expect("config loads");
        assert_eq!(
            config.databases.domains,
            vec![Domain::Settings, Domain::Units, Domain::Materials]
        );
        assert_eq!(
            config.databases.location(Domain::Units),
            "/srv/refgate/units.db"
        );
        Ok(())
    });
}

#[test]
fn env_disables_cache_and_switches_to_memory() {
    Jail::expect_with(|jail| {
        jail.set_env("REFGATE_CACHE__ENABLED", "false");
        jail.set_env("REFGATE_DATABASES__IN_MEMORY", "true");

        let config = RefgateConfig::load_from(jail.directory()).expect("config loads");
        assert_eq!(config.cache.ttl(), Duration::ZERO);
        assert_eq!(config.databases.location(Domain::Samples), ":memory:");
        Ok(())
    });
}

#[test]
fn unknown_domain_fails_extraction() {
    Jail::expect_with(|jail| {
        jail.create_dir(".refgate")?;
        jail.create_file(
            ".refgate/config.toml",
            r#"
            [databases]
            domains = ["units", "warehouses"]
            "#,
        )?;

        let result = RefgateConfig::load_from(jail.directory());
        assert!(matches!(result, Err(ConfigError::Figment(_))));
        Ok(())
    });
}

#[test]
fn status_domain_outside_enabled_set_is_rejected() {
    Jail::expect_with(|jail| {
        jail.create_dir(".refgate")?;
        jail.create_file(
            ".refgate/config.toml",
            r#"
            [databases]
            domains = ["units"]
            "#,
        )?;

        let result = RefgateConfig::load_from(jail.directory());
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
        Ok(())
    });
}
