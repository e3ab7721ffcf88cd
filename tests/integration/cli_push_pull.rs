use cfgtree::config::CfgTreeConfig;
use cfgtree::error::{ApiError, SyncError};
use cfgtree::sync::InMemoryFilesClient;
use cfgtree::tooling::cli::{CliContext, Commands, SchemaCommands};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn context(files: &[(&str, &str)]) -> (CliContext, Arc<InMemoryFilesClient>) {
    let client = Arc::new(InMemoryFilesClient::with_files(files.iter().copied()));
    let context = CliContext::with_client(CfgTreeConfig::default(), client.clone()).unwrap();
    (context, client)
}

fn push(dir: &TempDir, prune: bool, dry_run: bool) -> Commands {
    Commands::Push {
        dir: dir.path().to_path_buf(),
        prune,
        dry_run,
        yes: true,
    }
}

#[test]
fn pull_writes_remote_tree() {
    let (context, _client) = context(&[
        ("schema.yml", "hidden"),
        ("topology.yml", "replicasets: {}"),
        ("roles/init.lua", "return {}"),
    ]);
    let dir = TempDir::new().unwrap();

    let out = context
        .execute(&Commands::Pull {
            dir: dir.path().to_path_buf(),
        })
        .unwrap();
    assert!(out.contains("Pulled 2 files"));
    assert_eq!(
        fs::read_to_string(dir.path().join("roles/init.lua")).unwrap(),
        "return {}"
    );
    assert!(!dir.path().join("schema.yml").exists());
}

#[test]
fn push_applies_local_edits() {
    let (context, client) = context(&[("topology.yml", "a: 1"), ("old.yml", "o: 1")]);
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("topology.yml"), "a: 2").unwrap();
    fs::create_dir_all(dir.path().join("roles/custom")).unwrap();
    fs::write(dir.path().join("roles/custom/init.lua"), "return 1").unwrap();

    let out = context.execute(&push(&dir, true, false)).unwrap();
    assert!(out.contains("Applied 3 changes (1 removed)"), "{}", out);

    let files = client.files();
    assert_eq!(files.get("topology.yml").map(String::as_str), Some("a: 2"));
    assert_eq!(
        files.get("roles/custom/init.lua").map(String::as_str),
        Some("return 1")
    );
    assert!(!files.contains_key("old.yml"));
}

#[test]
fn push_without_prune_keeps_remote_only_files() {
    let (context, client) = context(&[("old.yml", "o: 1")]);
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("new.yml"), "n: 1").unwrap();

    context.execute(&push(&dir, false, false)).unwrap();
    assert_eq!(client.files().len(), 2);
}

#[test]
fn dry_run_sends_nothing() {
    let (context, client) = context(&[("a.yml", "a: 1")]);
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.yml"), "a: 5").unwrap();

    let out = context.execute(&push(&dir, false, true)).unwrap();
    assert!(out.contains("a.yml"));
    assert_eq!(client.apply_calls(), 0);
    assert_eq!(client.files().get("a.yml").map(String::as_str), Some("a: 1"));
}

#[test]
fn identical_directory_is_nothing_to_push() {
    let (context, client) = context(&[("a.yml", "a: 1")]);
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.yml"), "a: 1").unwrap();

    let out = context.execute(&push(&dir, true, false)).unwrap();
    assert!(out.starts_with("Nothing to push"));
    assert_eq!(client.apply_calls(), 0);
}

#[test]
fn push_stops_on_invalid_yaml() {
    let (context, client) = context(&[("a.yml", "a: 1")]);
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.yml"), "a: [").unwrap();

    let err = context.execute(&push(&dir, false, false)).unwrap_err();
    match err {
        ApiError::Sync(SyncError::Rejected(errors)) => {
            assert_eq!(errors[0].path.as_deref(), Some("a.yml"));
        }
        other => panic!("unexpected error {}", other),
    }
    assert_eq!(client.apply_calls(), 0);
}

#[test]
fn push_rejects_illegal_local_names() {
    let (context, client) = context(&[]);
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("bad name.yml"), "a: 1").unwrap();

    assert!(context.execute(&push(&dir, false, false)).is_err());
    assert_eq!(client.apply_calls(), 0);
}

#[test]
fn cat_and_tree() {
    let (context, _client) = context(&[("conf/a.yml", "a: 1")]);
    assert_eq!(
        context
            .execute(&Commands::Cat {
                path: "conf/a.yml".to_string()
            })
            .unwrap(),
        "a: 1"
    );
    assert_eq!(
        context
            .execute(&Commands::Cat {
                path: "/conf//a.yml".to_string()
            })
            .unwrap(),
        "a: 1"
    );
    assert!(context
        .execute(&Commands::Cat {
            path: "conf".to_string()
        })
        .is_err());
    assert!(matches!(
        context.execute(&Commands::Cat {
            path: "missing.yml".to_string()
        }),
        Err(ApiError::NotFound(_))
    ));

    let tree = context.execute(&Commands::Tree).unwrap();
    assert!(tree.contains("a.yml"));
}

#[test]
fn validate_directory_reports_staged_errors() {
    let (context, _client) = context(&[("a.yml", "a: 1")]);
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("b.yml"), "b: {").unwrap();

    assert!(context
        .execute(&Commands::Validate {
            dir: Some(dir.path().to_path_buf())
        })
        .is_err());
    let out = context.execute(&Commands::Validate { dir: None }).unwrap();
    assert!(out.ends_with("1 files valid"));
}

#[test]
fn schema_show_check_apply() {
    let client = Arc::new(InMemoryFilesClient::new().with_schema("spaces: {}"));
    let context = CliContext::with_client(CfgTreeConfig::default(), client.clone()).unwrap();
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("schema.yml");

    let shown = context
        .execute(&Commands::Schema {
            command: SchemaCommands::Show,
        })
        .unwrap();
    assert_eq!(shown, "spaces: {}");

    fs::write(&file, "spaces: [").unwrap();
    let err = context
        .execute(&Commands::Schema {
            command: SchemaCommands::Check { file: file.clone() },
        })
        .unwrap_err();
    match err {
        ApiError::Sync(SyncError::Rejected(errors)) => {
            assert_eq!(errors[0].path.as_deref(), Some("schema.yml"));
        }
        other => panic!("expected rejection, got {other:?}"),
    }

    fs::write(&file, "spaces:\n  customers: {}").unwrap();
    let out = context
        .execute(&Commands::Schema {
            command: SchemaCommands::Apply {
                file: file.clone(),
                yes: true,
            },
        })
        .unwrap();
    assert_eq!(out, "Schema successfully applied");
    assert!(client.schema().contains("customers"));

    let again = context
        .execute(&Commands::Schema {
            command: SchemaCommands::Apply { file, yes: true },
        })
        .unwrap();
    assert_eq!(again, "Schema unchanged");
}
