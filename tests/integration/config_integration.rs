//! Integration tests for layered configuration and site assembly

use pagetype::config::{global_config_path, ConfigLoader};
use pagetype::schema::{BasicSchemaGateway, FieldType};
use pagetype::store::MemoryPageStore;
use pagetype::{PageTypeError, SiteBuilder};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

use super::with_isolated_env;

const SITE_TOML: &str = r#"
[storage]
path = "data/pages"

[[page_types]]
name = "home"
label = "Home"

[[page_types]]
name = "event"
label = "Event"
plural_label = "Events"
greedy = true
remove_fields = ["legacy"]

[[page_types.add_fields]]
name = "startDate"
type = "string"
required = true

[[page_types.add_fields]]
name = "legacy"
type = "string"

[[page_types.add_fields]]
name = "_location"
type = "joinByOne"
with_type = "place"
id_field = "locationId"
"#;

fn write_site_config(root: &TempDir, name: &str, contents: &str) {
    let config_dir = root.path().join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join(name), contents).unwrap();
}

#[test]
fn test_site_file_builds_registered_types() {
    let test_dir = TempDir::new().unwrap();
    let site_root = TempDir::new().unwrap();
    write_site_config(&site_root, "pagetype.toml", SITE_TOML);

    with_isolated_env(&test_dir, || {
        let config = ConfigLoader::load(site_root.path()).unwrap();
        assert_eq!(config.storage.path, PathBuf::from("data/pages"));
        assert_eq!(config.page_types.len(), 2);

        let store = Arc::new(MemoryPageStore::new());
        let schemas = Arc::new(BasicSchemaGateway::new(store.clone()));
        let mut builder = SiteBuilder::new(store, schemas);
        builder.add_configured_types(&config.page_types).unwrap();
        let site = builder.build();

        let event = site.page_type("event").unwrap();
        assert!(event.is_greedy());
        assert_eq!(event.plural_label(), "Events");
        let fields: Vec<_> = event.schema().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(fields, vec!["startDate", "_location"]);
        assert!(event.schema()[0].required);
        assert_eq!(event.schema()[1].field_type, FieldType::JoinByOne);
        assert_eq!(event.schema()[1].id_field.as_deref(), Some("locationId"));
    });
}

#[test]
fn test_env_specific_file_and_variables_override() {
    let test_dir = TempDir::new().unwrap();
    let site_root = TempDir::new().unwrap();
    write_site_config(&site_root, "pagetype.toml", SITE_TOML);
    write_site_config(
        &site_root,
        "production.toml",
        "[logging]\nlevel = \"warn\"\nformat = \"json\"\n",
    );

    with_isolated_env(&test_dir, || {
        let config = ConfigLoader::load(site_root.path()).unwrap();
        assert_eq!(config.logging.level, "info");

        std::env::set_var("PAGETYPE_ENV", "production");
        std::env::set_var("PAGETYPE__STORAGE__PATH", "/var/lib/pages");
        let config = ConfigLoader::load(site_root.path());
        std::env::remove_var("PAGETYPE__STORAGE__PATH");

        let config = config.unwrap();
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.storage.path, PathBuf::from("/var/lib/pages"));
        assert_eq!(
            config.store_path(site_root.path()),
            PathBuf::from("/var/lib/pages")
        );
    });
}

#[test]
fn test_global_file_is_lowest_file_layer() {
    let test_dir = TempDir::new().unwrap();
    let site_root = TempDir::new().unwrap();

    with_isolated_env(&test_dir, || {
        let global = global_config_path().unwrap();
        fs::create_dir_all(global.parent().unwrap()).unwrap();
        fs::write(&global, "[logging]\nlevel = \"debug\"\noutput = \"stdout\"\n").unwrap();

        let config = ConfigLoader::load(site_root.path()).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.output, "stdout");

        write_site_config(&site_root, "pagetype.toml", "[logging]\nlevel = \"error\"\n");
        let config = ConfigLoader::load(site_root.path()).unwrap();
        assert_eq!(config.logging.level, "error");
        assert_eq!(config.logging.output, "stdout");
    });
}

#[test]
fn test_invalid_site_config_is_rejected() {
    let test_dir = TempDir::new().unwrap();
    let site_root = TempDir::new().unwrap();
    write_site_config(
        &site_root,
        "pagetype.toml",
        r#"
[[page_types]]
name = "event"
label = "Event"

[[page_types]]
name = "event"
label = "Again"
"#,
    );

    with_isolated_env(&test_dir, || {
        let err = ConfigLoader::load(site_root.path()).unwrap_err();
        match err {
            PageTypeError::Configuration(msg) => assert!(msg.contains("Duplicate")),
            other => panic!("unexpected error {:?}", other),
        }
    });
}
