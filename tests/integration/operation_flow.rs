use cfgtree::config::EditorConfig;
use cfgtree::error::OpError;
use cfgtree::operation::{Confirmed, OperationState};
use cfgtree::sync::InMemoryFilesClient;
use cfgtree::Session;
use std::sync::Arc;

async fn session(editor: EditorConfig) -> Session {
    let client = Arc::new(InMemoryFilesClient::with_files([
        ("b.txt", "b"),
        ("roles/init.lua", "return {}"),
    ]));
    let session = Session::new(client, &editor);
    session.reload().await.unwrap();
    session
}

#[tokio::test]
async fn interactive_create_reports_live_checks() {
    let session = session(EditorConfig::default()).await;
    session
        .begin_operation(OperationState::CreatingFile {
            parent_path: String::new(),
        })
        .unwrap();

    let check = session.operation_input("b.txt");
    assert!(check.exists && !check.illegal);
    let check = session.operation_input("b txt");
    assert!(check.illegal);
    assert!(session.confirm_operation().is_err());

    assert!(session.operation_input("c.txt").is_ok());
    match session.confirm_operation().unwrap() {
        Confirmed::Created(node) => assert_eq!(node.path, "c.txt"),
        other => panic!("unexpected outcome {:?}", other),
    }
    assert!(session.operation_state().is_idle());
}

#[tokio::test]
async fn cancel_discards_without_mutation() {
    let session = session(EditorConfig::default()).await;
    let before = session.nodes();
    let id = session.find_by_path("roles").unwrap().file_id;

    session
        .begin_operation(OperationState::Renaming { file_id: id })
        .unwrap();
    session.operation_input("profiles");
    session.cancel_operation();

    assert!(Arc::ptr_eq(&before, &session.nodes()));
    assert!(session.find_by_path("roles/init.lua").is_some());
}

#[tokio::test]
async fn reload_clears_pending_operation() {
    let session = session(EditorConfig::default()).await;
    session
        .begin_operation(OperationState::CreatingFolder {
            parent_path: "roles".to_string(),
        })
        .unwrap();
    session.reload().await.unwrap();
    assert!(session.operation_state().is_idle());
}

#[tokio::test]
async fn case_only_rename_is_allowed() {
    let session = session(EditorConfig::default()).await;
    let id = session.find_by_path("b.txt").unwrap().file_id;
    let changed = session.rename(id, "B.txt").unwrap();
    assert_eq!(changed.len(), 1);
    assert_eq!(session.get_node(id).unwrap().path, "B.txt");

    assert!(session.rename(id, "B.txt").unwrap().is_empty());
}

#[tokio::test]
async fn extension_allow_list_and_length_limit() {
    let editor = EditorConfig {
        allowed_extensions: vec!["yml".to_string(), "lua".to_string()],
        max_name_len: 8,
        ..EditorConfig::default()
    };
    let session = session(editor).await;

    let err = session.create_file("roles", "run.sh").unwrap_err();
    assert!(matches!(err, OpError::IllegalName { .. }));
    let err = session.create_folder("", "much-too-long").unwrap_err();
    assert!(matches!(err, OpError::IllegalName { .. }));

    session.create_folder("", "hooks").unwrap();
    session.create_file("hooks", "a.lua").unwrap();
    assert!(session.find_by_path("hooks/a.lua").unwrap().is_pending_create());
}

#[tokio::test]
async fn deleting_pending_folder_purges_subtree() {
    let session = session(EditorConfig::default()).await;
    let folder = session.create_folder("", "tmp").unwrap();
    session.create_file("tmp", "x.yml").unwrap();
    let count = session.nodes().len();

    let removed = session.delete(folder.file_id).unwrap();
    assert_eq!(removed.len(), 2);
    assert_eq!(session.nodes().len(), count - 2);
    assert!(session.pending_changes().is_empty());
}
