use cfgtree::config::EditorConfig;
use cfgtree::error::{OpError, SyncError, ValidationError};
use cfgtree::sync::client::FilesClient;
use cfgtree::sync::InMemoryFilesClient;
use cfgtree::Session;
use std::sync::Arc;
use std::time::Duration;

async fn connect(files: &[(&str, &str)]) -> (Arc<Session>, Arc<InMemoryFilesClient>) {
    let client = Arc::new(InMemoryFilesClient::with_files(files.iter().copied()));
    let session = Arc::new(Session::new(client.clone(), &EditorConfig::default()));
    session.reload().await.unwrap();
    (session, client)
}

#[tokio::test]
async fn created_file_round_trips() {
    let (session, _client) = connect(&[]).await;
    let node = session.create_file("", "a.txt").unwrap();
    session.set_content(node.file_id, "x").unwrap();
    session.apply().await.unwrap();

    session.reload().await.unwrap();
    let reloaded = session.find_by_path("a.txt").unwrap();
    assert_eq!(reloaded.content, "x");
    assert!(reloaded.saved());
}

#[tokio::test]
async fn reload_twice_yields_same_tree() {
    let (session, _client) = connect(&[("conf/a.yml", "a: 1"), ("z.lua", "return 1")]).await;
    let first = session.tree();
    session.reload().await.unwrap();
    let second = session.tree();

    let shape = |roots: &[cfgtree::tree::TreeNode]| {
        let mut out = Vec::new();
        for root in roots {
            root.walk(&mut |t: &cfgtree::tree::TreeNode, depth: usize| {
                out.push((depth, t.node.path.clone(), t.node.content.clone()))
            });
        }
        out
    };
    assert_eq!(shape(first.as_slice()), shape(second.as_slice()));
}

#[tokio::test]
async fn dirty_flags_follow_edits_and_sync() {
    let (session, _client) = connect(&[("a.yml", "a: 1")]).await;
    assert!(session.nodes().iter().all(|n| !n.is_dirty()));

    let id = session.find_by_path("a.yml").unwrap().file_id;
    session.set_content(id, "a: 2").unwrap();
    assert!(session.get_node(id).unwrap().is_dirty());

    session.apply().await.unwrap();
    assert!(!session.get_node(id).unwrap().is_dirty());
    assert!(session.get_node(id).unwrap().saved());
}

#[tokio::test]
async fn delete_then_apply_removes_remote_file() {
    let (session, client) = connect(&[("c.txt", "c"), ("d.txt", "d")]).await;
    let id = session.find_by_path("c.txt").unwrap().file_id;
    session.delete(id).unwrap();
    session.apply().await.unwrap();

    let remote: Vec<String> = client
        .fetch_files()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.path)
        .collect();
    assert_eq!(remote, vec!["d.txt".to_string()]);
    assert!(session.get_node(id).is_none());
}

#[tokio::test]
async fn collision_and_illegal_names_leave_store_alone() {
    let (session, _client) = connect(&[("b.txt", "b")]).await;
    let before = session.nodes();

    let err = session.create_file("", "b.txt").unwrap_err();
    assert!(matches!(err, OpError::NameCollision { .. }));
    let err = session.create_file("", "b txt").unwrap_err();
    assert!(matches!(err, OpError::IllegalName { .. }));

    assert_eq!(session.nodes().len(), before.len());
    assert!(Arc::ptr_eq(&session.nodes(), &before));
}

#[tokio::test]
async fn rejected_apply_is_atomic() {
    let (session, client) = connect(&[("a.yml", "a: 1"), ("b.yml", "b: 1")]).await;
    let a = session.find_by_path("a.yml").unwrap().file_id;
    let b = session.find_by_path("b.yml").unwrap().file_id;
    session.set_content(a, "a: 2").unwrap();
    session.delete(b).unwrap();
    session.create_file("", "c.yml").unwrap();
    let before: Vec<_> = session.nodes().iter().cloned().collect();

    client.fail_next(SyncError::Rejected(vec![
        ValidationError::new("topology is invalid").with_path("a.yml"),
    ]));
    let err = session.apply().await.unwrap_err();
    assert_eq!(err.validation_errors().len(), 1);

    let after: Vec<_> = session.nodes().iter().cloned().collect();
    assert_eq!(before, after);
    assert_eq!(client.files().get("b.yml").map(String::as_str), Some("b: 1"));
}

#[tokio::test]
async fn invalid_yaml_is_rejected_by_backend() {
    let (session, client) = connect(&[("a.yml", "a: 1")]).await;
    let a = session.find_by_path("a.yml").unwrap().file_id;
    session.set_content(a, "a: [").unwrap();

    assert!(session.validate_remote().await.is_err());
    let err = session.apply().await.unwrap_err();
    assert_eq!(err.validation_errors()[0].path.as_deref(), Some("a.yml"));
    assert!(session.has_unsaved_changes());
    assert_eq!(client.files().get("a.yml").map(String::as_str), Some("a: 1"));
}

#[tokio::test(start_paused = true)]
async fn concurrent_apply_is_busy() {
    let (session, client) = connect(&[("a.yml", "a: 1")]).await;
    client.set_latency(Duration::from_millis(200));
    let id = session.find_by_path("a.yml").unwrap().file_id;
    session.set_content(id, "a: 2").unwrap();

    let first = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.apply().await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(session.is_syncing());
    assert_eq!(session.apply().await.unwrap_err(), SyncError::Busy);
    assert_eq!(session.reload().await.unwrap_err(), SyncError::Busy);

    first.await.unwrap().unwrap();
    assert!(!session.is_syncing());
    assert_eq!(client.apply_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn edits_during_apply_stay_dirty() {
    let (session, client) = connect(&[("a.yml", "a: 1")]).await;
    client.set_latency(Duration::from_millis(200));
    let id = session.find_by_path("a.yml").unwrap().file_id;
    session.set_content(id, "a: 2").unwrap();

    let pending = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.apply().await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    session.set_content(id, "a: 3").unwrap();
    pending.await.unwrap().unwrap();

    let node = session.get_node(id).unwrap();
    assert_eq!(node.initial_content, "a: 2");
    assert_eq!(node.content, "a: 3");
    assert!(node.is_dirty());
    assert_eq!(client.files().get("a.yml").map(String::as_str), Some("a: 2"));
}

#[tokio::test(start_paused = true)]
async fn new_file_deleted_during_apply_is_removed_next_apply() {
    let (session, client) = connect(&[("a.yml", "a: 1")]).await;
    client.set_latency(Duration::from_millis(200));
    let node = session.create_file("", "new.yml").unwrap();
    session.set_content(node.file_id, "n: 1").unwrap();

    let pending = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.apply().await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    session.delete(node.file_id).unwrap();
    pending.await.unwrap().unwrap();

    assert!(client.files().contains_key("new.yml"));
    assert!(session.find_by_path("new.yml").is_none());
    assert!(session.has_unsaved_changes());
    let changes = session.pending_changes();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes.changes[0].path, "new.yml");
    assert!(changes.changes[0].content.is_none());

    session.apply().await.unwrap();
    let paths: Vec<String> = client.files().into_keys().collect();
    assert_eq!(paths, vec!["a.yml".to_string()]);
    assert!(!session.has_unsaved_changes());
    assert!(session.get_node(node.file_id).is_none());
}

#[tokio::test]
async fn folder_rename_moves_remote_files() {
    let (session, client) = connect(&[("conf/a.yml", "a: 1"), ("conf/sub/b.yml", "b: 1")]).await;
    let conf = session.find_by_path("conf").unwrap().file_id;
    session.rename(conf, "cfg").unwrap();
    session.apply().await.unwrap();

    let paths: Vec<String> = client.files().into_keys().collect();
    assert_eq!(paths, vec!["cfg/a.yml".to_string(), "cfg/sub/b.yml".to_string()]);
    assert!(!session.has_unsaved_changes());
}

#[tokio::test]
async fn empty_folder_is_local_only() {
    let (session, client) = connect(&[("a.yml", "a: 1")]).await;
    session.create_folder("", "drafts").unwrap();
    let changes = session.apply().await.unwrap();
    assert!(changes.is_empty());
    assert_eq!(client.apply_calls(), 0);

    session.reload().await.unwrap();
    assert!(session.find_by_path("drafts").is_none());
}
