//! Filesystem probes of the process supervisor, against temporary
//! script directories.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use narrator_core::{
    DependencyProbe, LifecycleError, LifecycleManager, LocalServer, ServerState, ServerSupervisor,
    StartOptions,
};
use narrator_runtime::paths::venv_bin;
use narrator_runtime::{KittenTtsPaths, ProcessSupervisor};
use tokio_test::block_on;

fn supervisor_for(root: &Path) -> ProcessSupervisor {
    ProcessSupervisor::new(KittenTtsPaths::with_roots([root]))
}

#[test]
fn script_probe_reports_where_it_looked() {
    let root = tempfile::tempdir().unwrap();
    let supervisor = supervisor_for(root.path());

    let missing = block_on(supervisor.check(DependencyProbe::KittenScript));
    assert!(!missing.ok);
    assert_eq!(missing.label, "Server script");
    assert!(missing.detail.contains("kittentts-server.py"));
    assert!(missing.fix_hint.is_some());

    fs::write(root.path().join("kittentts-server.py"), "# server").unwrap();
    let found = block_on(supervisor.check(DependencyProbe::KittenScript));
    assert!(found.ok);
    assert!(found.detail.ends_with("kittentts-server.py"));
}

#[test]
fn venv_probe_follows_the_directory() {
    let root = tempfile::tempdir().unwrap();
    let supervisor = supervisor_for(root.path());

    assert!(!block_on(supervisor.check(DependencyProbe::KittenVenv)).ok);

    fs::create_dir(root.path().join(".venv")).unwrap();
    assert!(block_on(supervisor.check(DependencyProbe::KittenVenv)).ok);
}

#[test]
fn package_probe_needs_a_venv_interpreter_first() {
    let root = tempfile::tempdir().unwrap();
    fs::create_dir(root.path().join(".venv")).unwrap();
    let supervisor = supervisor_for(root.path());

    let check = block_on(supervisor.check(DependencyProbe::KittenPackages));
    assert!(!check.ok);
    assert!(check.detail.contains("create it first"));
}

#[cfg(unix)]
#[test]
fn package_probe_reports_the_missing_package() {
    use std::os::unix::fs::PermissionsExt;

    let root = tempfile::tempdir().unwrap();
    let python = venv_bin(&root.path().join(".venv"), "python");
    fs::create_dir_all(python.parent().unwrap()).unwrap();
    // Stand-in interpreter that fails the import the way Python would.
    fs::write(
        &python,
        "#!/bin/sh\necho \"ModuleNotFoundError: No module named 'soundfile'\" >&2\nexit 1\n",
    )
    .unwrap();
    fs::set_permissions(&python, fs::Permissions::from_mode(0o755)).unwrap();

    let supervisor = supervisor_for(root.path());
    let check = block_on(supervisor.check(DependencyProbe::KittenPackages));

    assert!(!check.ok);
    assert!(check.detail.starts_with("Missing soundfile"));
    assert_eq!(
        check.fix_hint.as_deref(),
        Some("pip install kittentts flask soundfile numpy")
    );
}

#[tokio::test]
async fn manager_refuses_to_start_without_dependencies() {
    let root = tempfile::tempdir().unwrap();
    let manager = LifecycleManager::new(Arc::new(supervisor_for(root.path())));

    let report = manager.check_dependencies(LocalServer::KittenTts).await;
    assert_eq!(report.checks.len(), 4);
    assert!(!report.all_ok());

    let err = manager
        .start(LocalServer::KittenTts, &StartOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::DependencyMissing { .. }));
    assert_eq!(manager.state(LocalServer::KittenTts), ServerState::Idle);
}

#[test]
fn checkout_ships_the_kittentts_server_script() {
    let scripts = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../scripts");
    let supervisor = ProcessSupervisor::new(KittenTtsPaths::with_roots([scripts.as_path()]));

    let script = block_on(supervisor.check(DependencyProbe::KittenScript));
    assert!(script.ok, "{}", script.detail);

    let source = fs::read_to_string(scripts.join("kittentts-server.py")).unwrap();
    for needle in ["/api/tts", "/api/voices", "--port", "--threads", "expr-voice-2-m"] {
        assert!(source.contains(needle), "script lacks {needle}");
    }
}
