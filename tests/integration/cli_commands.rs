//! Integration tests for CLI commands run against a sled-backed site

use pagetype::cli::{Commands, RunContext};
use pagetype::PageTypeError;
use std::fs;
use tempfile::TempDir;

use super::with_isolated_env;

const SITE_TOML: &str = r#"
[storage]
path = "store"

[[page_types]]
name = "home"
label = "Home"
child_types = ["event", "section"]

[[page_types]]
name = "section"
label = "Section"
child_types = ["section"]

[[page_types]]
name = "event"
label = "Event"
greedy = true

[[page_types.add_fields]]
name = "location"
type = "string"
weight = 20

[[page_types.add_fields]]
name = "capacity"
type = "integer"
"#;

fn site_root() -> TempDir {
    let root = TempDir::new().unwrap();
    fs::create_dir_all(root.path().join("config")).unwrap();
    fs::write(root.path().join("config").join("pagetype.toml"), SITE_TOML).unwrap();
    root
}

fn create(page_type: &str, title: &str, parent: &str, fields: &[&str]) -> Commands {
    Commands::Create {
        page_type: page_type.to_string(),
        title: title.to_string(),
        parent: parent.to_string(),
        slug: None,
        fields: fields.iter().map(|f| f.to_string()).collect(),
    }
}

#[test]
fn test_create_list_and_serve() {
    let test_dir = TempDir::new().unwrap();
    let root = site_root();

    with_isolated_env(&test_dir, || {
        let ctx = RunContext::new(root.path().to_path_buf(), None).unwrap();

        let out = ctx
            .execute(&create(
                "event",
                "Summer Picnic",
                "/",
                &["location=Town Park", "capacity=40", "secret=1"],
            ))
            .unwrap();
        assert!(out.contains("/summer-picnic"), "{}", out);

        let listed = ctx
            .execute(&Commands::List {
                page_type: "event".to_string(),
                limit: None,
                format: "json".to_string(),
            })
            .unwrap();
        let pages: serde_json::Value = serde_json::from_str(&listed).unwrap();
        let page = &pages[0];
        assert_eq!(page["slug"], "/summer-picnic");
        assert_eq!(page["level"], 1);
        assert_eq!(page["rank"], 0);
        assert_eq!(page["location"], "Town Park");
        assert_eq!(page["capacity"], 40);
        assert!(page.get("secret").is_none());

        let served = ctx
            .execute(&Commands::Serve {
                path: "/summer-picnic/extra".to_string(),
                editor: false,
                format: "json".to_string(),
            })
            .unwrap();
        let served: serde_json::Value = serde_json::from_str(&served).unwrap();
        assert_eq!(served["bestPage"], "/summer-picnic");
        assert_eq!(served["remainder"], "/extra");
        assert_eq!(served["outcome"]["kind"], "render");
        assert_eq!(served["outcome"]["template"], "event");

        let index = ctx
            .execute(&Commands::Index {
                slug: "/summer-picnic".to_string(),
            })
            .unwrap();
        assert!(index.contains("Town Park"));

        let missing = ctx
            .execute(&Commands::Diff {
                slug: "/nope".to_string(),
            })
            .unwrap();
        assert_eq!(missing, "No page at /nope");
    });
}

#[test]
fn test_pages_persist_between_runs() {
    let test_dir = TempDir::new().unwrap();
    let root = site_root();

    with_isolated_env(&test_dir, || {
        {
            let ctx = RunContext::new(root.path().to_path_buf(), None).unwrap();
            ctx.execute(&create("section", "Guides", "/", &[])).unwrap();
            ctx.execute(&create("section", "Setup", "/guides", &[]))
                .unwrap();
        }

        let ctx = RunContext::new(root.path().to_path_buf(), None).unwrap();
        let out = ctx
            .execute(&create("section", "Advanced", "/guides", &[]))
            .unwrap();
        assert!(out.contains("/guides/advanced"));
        assert!(out.contains("level 2, rank 1"), "{}", out);
    });
}

#[test]
fn test_child_type_rules_and_unknown_parent() {
    let test_dir = TempDir::new().unwrap();
    let root = site_root();

    with_isolated_env(&test_dir, || {
        let ctx = RunContext::new(root.path().to_path_buf(), None).unwrap();
        ctx.execute(&create("section", "Guides", "/", &[])).unwrap();

        let err = ctx
            .execute(&create("event", "Launch", "/guides", &[]))
            .unwrap_err();
        assert!(matches!(
            err,
            PageTypeError::Configuration(msg) if msg.contains("cannot be created")
        ));

        let err = ctx
            .execute(&create("section", "Lost", "/missing", &[]))
            .unwrap_err();
        assert!(matches!(err, PageTypeError::Configuration(msg) if msg.contains("not found")));

        let err = ctx
            .execute(&create("blog", "Hello", "/", &[]))
            .unwrap_err();
        assert!(matches!(
            err,
            PageTypeError::Configuration(msg) if msg.contains("Unknown page type")
        ));
    });
}

#[test]
fn test_types_and_config_output() {
    let test_dir = TempDir::new().unwrap();
    let root = site_root();

    with_isolated_env(&test_dir, || {
        let ctx = RunContext::new(root.path().to_path_buf(), None).unwrap();

        let types = ctx
            .execute(&Commands::Types {
                format: "json".to_string(),
            })
            .unwrap();
        let types: serde_json::Value = serde_json::from_str(&types).unwrap();
        assert_eq!(types[2]["name"], "event");
        assert_eq!(types[2]["action"], "/apos-event");
        assert_eq!(types[2]["fields"], serde_json::json!(["location", "capacity"]));

        let config = ctx.execute(&Commands::Config).unwrap();
        assert!(config.contains("[storage]"));
        assert!(config.contains("name = \"section\""));
    });
}

#[test]
fn test_home_page_needs_a_home_type() {
    let test_dir = TempDir::new().unwrap();
    let root = TempDir::new().unwrap();
    fs::create_dir_all(root.path().join("config")).unwrap();
    fs::write(
        root.path().join("config").join("pagetype.toml"),
        "[[page_types]]\nname = \"section\"\nlabel = \"Section\"\n",
    )
    .unwrap();

    with_isolated_env(&test_dir, || {
        let ctx = RunContext::new(root.path().to_path_buf(), None).unwrap();
        let err = ctx
            .execute(&create("section", "Guides", "/", &[]))
            .unwrap_err();
        assert!(
            matches!(&err, PageTypeError::Configuration(msg) if msg.contains("'home' page type")),
            "got {:?}",
            err
        );

        let listed = ctx
            .execute(&Commands::List {
                page_type: "section".to_string(),
                limit: None,
                format: "json".to_string(),
            })
            .unwrap();
        let pages: serde_json::Value = serde_json::from_str(&listed).unwrap();
        assert_eq!(pages, serde_json::json!([]));
    });
}

#[test]
fn test_created_home_page_is_served_by_home_type() {
    let test_dir = TempDir::new().unwrap();
    let root = site_root();

    with_isolated_env(&test_dir, || {
        let ctx = RunContext::new(root.path().to_path_buf(), None).unwrap();
        ctx.execute(&create("section", "Guides", "/", &[])).unwrap();

        let served = ctx
            .execute(&Commands::Serve {
                path: "/".to_string(),
                editor: false,
                format: "json".to_string(),
            })
            .unwrap();
        let served: serde_json::Value = serde_json::from_str(&served).unwrap();
        assert_eq!(served["page"], "/");
        assert_eq!(served["outcome"]["template"], "home");
    });
}
