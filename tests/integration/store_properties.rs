use cfgtree::store::FileStore;
use cfgtree::sync::client::FilesClient;
use cfgtree::sync::{ChangeSet, InMemoryFilesClient};
use cfgtree::tree::path::join_path;
use cfgtree::tree::{build_tree, TreeNode};
use cfgtree::types::{FileId, FileRecord};
use cfgtree::validator::ValidatorSet;
use proptest::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Op {
    CreateFile(usize, String),
    CreateFolder(usize, String),
    Rename(usize, String),
    Delete(usize),
    Edit(usize, String),
}

fn name() -> impl Strategy<Value = String> {
    prop_oneof!["[a-c]{1,2}", "[a-c]{1,2}\\.yml"]
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (any::<usize>(), name()).prop_map(|(i, n)| Op::CreateFile(i, n)),
        (any::<usize>(), name()).prop_map(|(i, n)| Op::CreateFolder(i, n)),
        (any::<usize>(), name()).prop_map(|(i, n)| Op::Rename(i, n)),
        any::<usize>().prop_map(Op::Delete),
        (any::<usize>(), "[a-z: 0-9]{0,8}").prop_map(|(i, t)| Op::Edit(i, t)),
    ]
}

fn seed() -> FileStore {
    FileStore::from_records(
        &[
            FileRecord::new("a.yml", "a: 1"),
            FileRecord::new("b/c.yml", "c: 1"),
            FileRecord::new("b/d/e.yml", "e: 1"),
        ],
        &[],
    )
}

fn pick(store: &FileStore, i: usize) -> Option<FileId> {
    let live: Vec<FileId> = store.live_nodes().map(|n| n.file_id).collect();
    (!live.is_empty()).then(|| live[i % live.len()])
}

fn folder_path(store: &FileStore, i: usize) -> String {
    let mut folders: Vec<String> = store
        .live_nodes()
        .filter(|n| n.is_folder())
        .map(|n| n.path.clone())
        .collect();
    folders.push(String::new());
    folders[i % folders.len()].clone()
}

fn run(store: &mut FileStore, op: &Op) {
    let _ = match op {
        Op::CreateFile(i, n) => {
            let parent = folder_path(store, *i);
            store.create_file(&parent, n).map(|_| ())
        }
        Op::CreateFolder(i, n) => {
            let parent = folder_path(store, *i);
            store.create_folder(&parent, n).map(|_| ())
        }
        Op::Rename(i, n) => match pick(store, *i) {
            Some(id) => store.rename_node(id, n).map(|_| ()),
            None => Ok(()),
        },
        Op::Delete(i) => match pick(store, *i) {
            Some(id) => store.delete_node(id).map(|_| ()),
            None => Ok(()),
        },
        Op::Edit(i, t) => match pick(store, *i) {
            Some(id) => store.set_content(id, t).map(|_| ()),
            None => Ok(()),
        },
    };
}

fn assert_invariants(store: &FileStore) {
    let mut ids = HashSet::new();
    for node in store.nodes().iter() {
        assert!(ids.insert(node.file_id), "duplicate id {}", node.file_id);
    }

    let mut paths = HashSet::new();
    for node in store.live_nodes() {
        assert_eq!(node.path, join_path(node.parent_path(), &node.file_name));
        assert!(paths.insert(node.path.clone()), "sibling collision at {}", node.path);
        if !node.parent_path().is_empty() {
            let parent = store
                .find_by_path(node.parent_path())
                .unwrap_or_else(|| panic!("orphan {}", node.path));
            assert!(parent.is_folder());
        }
    }
}

fn live_files(store: &FileStore) -> BTreeMap<String, String> {
    store
        .live_nodes()
        .filter(|n| n.is_file())
        .map(|n| (n.path.clone(), n.content.clone()))
        .collect()
}

proptest! {
    #[test]
    fn structure_holds_under_random_edits(ops in prop::collection::vec(op(), 0..40)) {
        let mut store = seed();
        for op in &ops {
            run(&mut store, op);
            assert_invariants(&store);
        }
    }

    #[test]
    fn tree_is_deterministic(ops in prop::collection::vec(op(), 0..20)) {
        let mut store = seed();
        for op in &ops {
            run(&mut store, op);
        }
        let copy: Vec<_> = store.nodes().iter().cloned().collect();
        prop_assert_eq!(build_tree(store.nodes()), build_tree(&copy));

        let mut count = 0;
        for root in build_tree(store.nodes()) {
            root.walk(&mut |_: &TreeNode, _: usize| count += 1);
        }
        prop_assert_eq!(count, store.live_nodes().count());
    }

    #[test]
    fn apply_makes_server_match_local(ops in prop::collection::vec(op(), 0..30)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let client = InMemoryFilesClient::with_files([
            ("a.yml", "a: 1"),
            ("b/c.yml", "c: 1"),
            ("b/d/e.yml", "e: 1"),
        ])
        .with_validators(ValidatorSet::empty());

        let mut store = seed();
        for op in &ops {
            run(&mut store, op);
        }
        let changes = ChangeSet::compute(store.nodes());
        runtime.block_on(client.apply_files(&changes.changes)).unwrap();
        prop_assert_eq!(client.files(), live_files(&store));
    }
}

#[test]
fn rename_cascade_keeps_ids() {
    let mut store = seed();
    let b = store.find_by_path("b").unwrap().file_id;
    let before: Vec<FileId> = ["b/c.yml", "b/d", "b/d/e.yml"]
        .iter()
        .map(|p| store.find_by_path(p).unwrap().file_id)
        .collect();

    let changed = store.rename_node(b, "z").unwrap();
    assert_eq!(changed.len(), 4);
    let after: Vec<FileId> = ["z/c.yml", "z/d", "z/d/e.yml"]
        .iter()
        .map(|p| store.find_by_path(p).unwrap().file_id)
        .collect();
    assert_eq!(before, after);
    assert!(store.find_by_path("b/c.yml").is_none());
}

#[test]
fn failed_operation_keeps_list_identity() {
    let mut store = seed();
    let before = Arc::clone(store.nodes());
    assert!(store.create_file("", "a.yml").is_err());
    assert!(store.create_file("missing", "x.yml").is_err());
    assert!(store.create_file("a.yml", "x.yml").is_err());
    let b = store.find_by_path("b").unwrap().file_id;
    assert!(store.set_content(b, "text").is_err());
    assert!(Arc::ptr_eq(store.nodes(), &before));
}
