#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use autoshell::catalog::{ScriptCatalogEntry, ScriptDiscoverer};
use autoshell::config::{DiscoveryConfig, ExecutionConfig};
use autoshell::exec::ExecutionResult;
use autoshell::group::{GroupObserver, GroupOrchestrator, GroupSummary};
use autoshell::store::CatalogStore;
use tempfile::TempDir;

#[derive(Default)]
struct CollectingObserver {
    events: Mutex<Vec<String>>,
}

impl CollectingObserver {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl GroupObserver for CollectingObserver {
    fn on_progress(&self, index: usize, total: usize, name: &str) {
        self.events
            .lock()
            .unwrap()
            .push(format!("progress:{}/{}:{}", index + 1, total, name));
    }

    fn on_item_done(&self, entry: &ScriptCatalogEntry, result: &ExecutionResult) {
        self.events
            .lock()
            .unwrap()
            .push(format!("done:{}:{}", entry.name, result.exit_code));
    }

    fn on_group_done(&self, summary: &GroupSummary) {
        self.events
            .lock()
            .unwrap()
            .push(format!("group:{}/{}", summary.succeeded, summary.total));
    }
}

fn write_executable(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/bash\n{body}")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Discover scripts, catalog them, group them, then run the group loaded
/// back from the store.
#[tokio::test]
async fn test_discover_catalog_group_run_pipeline() {
    let temp_dir = TempDir::new().unwrap();
    let scripts_dir = temp_dir.path().join("scripts");
    fs::create_dir(&scripts_dir).unwrap();
    write_executable(&scripts_dir, "a_first.sh", "echo first\n");
    write_executable(&scripts_dir, "b_second.sh", "echo second\n");

    let discovered = ScriptDiscoverer::new(&DiscoveryConfig::default())
        .discover(&scripts_dir)
        .unwrap();
    assert_eq!(discovered.len(), 2);

    let store = CatalogStore::open(temp_dir.path().join("catalog.db")).unwrap();
    store.save_all(&discovered).unwrap();

    let group = store.create_group("pipeline", "Integration flow").unwrap();
    for entry in &discovered {
        store.add_script_to_group(group.id, &entry.file_path).unwrap();
    }

    let loaded = store.find_group("pipeline").unwrap().unwrap();
    assert_eq!(loaded.scripts.len(), 2);
    assert_eq!(loaded.scripts[0].name, "a_first.sh");

    let orchestrator = GroupOrchestrator::new(&ExecutionConfig::default());
    let observer = CollectingObserver::default();
    let summary = orchestrator.run_sequential(&loaded, &observer).await;

    assert_eq!(summary.total, 2);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 0);
    assert!(!summary.stopped_early);

    let events = observer.events();
    assert_eq!(
        events,
        vec![
            "progress:1/2:a_first.sh",
            "done:a_first.sh:0",
            "progress:2/2:b_second.sh",
            "done:b_second.sh:0",
            "group:2/2",
        ]
    );
}

/// A failing member stops the run; later members never execute.
#[tokio::test]
async fn test_store_backed_group_stops_on_failure() {
    let temp_dir = TempDir::new().unwrap();
    let scripts_dir = temp_dir.path().join("scripts");
    fs::create_dir(&scripts_dir).unwrap();
    let marker = temp_dir.path().join("reached");

    write_executable(&scripts_dir, "a_ok.sh", "echo ok\n");
    write_executable(&scripts_dir, "b_fail.sh", "exit 7\n");
    write_executable(
        &scripts_dir,
        "c_never.sh",
        &format!("touch '{}'\n", marker.display()),
    );

    let discovered = ScriptDiscoverer::new(&DiscoveryConfig::default())
        .discover(&scripts_dir)
        .unwrap();
    let store = CatalogStore::open(temp_dir.path().join("catalog.db")).unwrap();
    store.save_all(&discovered).unwrap();

    let group = store.create_group("fragile", "").unwrap();
    for entry in &discovered {
        store.add_script_to_group(group.id, &entry.file_path).unwrap();
    }

    let loaded = store.find_group("fragile").unwrap().unwrap();
    let orchestrator = GroupOrchestrator::new(&ExecutionConfig::default());
    let observer = CollectingObserver::default();
    let summary = orchestrator.run_sequential(&loaded, &observer).await;

    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 1);
    assert!(summary.stopped_early);
    assert!(summary.message.contains("b_fail.sh"));
    assert!(!marker.exists());

    let events = observer.events();
    assert!(events.contains(&String::from("done:b_fail.sh:7")));
    assert!(!events.iter().any(|e| e.contains("c_never.sh")));
}

#[tokio::test]
async fn test_empty_group_reports_completion() {
    let temp_dir = TempDir::new().unwrap();
    let store = CatalogStore::open(temp_dir.path().join("catalog.db")).unwrap();
    store.create_group("empty", "").unwrap();

    let loaded = store.find_group("empty").unwrap().unwrap();
    let orchestrator = GroupOrchestrator::new(&ExecutionConfig::default());
    let observer = CollectingObserver::default();
    let summary = orchestrator.run_sequential(&loaded, &observer).await;

    assert_eq!(summary.total, 0);
    assert_eq!(summary.succeeded, 0);
    assert_eq!(observer.events(), vec!["group:0/0"]);
}
