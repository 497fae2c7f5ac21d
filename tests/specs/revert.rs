//! `pmatic revert` specs
//!
//! Cover tree restoration, trash-can behavior, the head jump, and the
//! no-history error path.

use crate::prelude::*;

#[test]
fn revert_restores_a_replaced_file() {
    let setup = Setup::new();
    setup.context_file("data.txt", "A");
    setup.shell_pipeline("rewrite", "echo B > tmp && mv tmp data.txt");

    setup.run("rewrite").passes();
    assert_eq!(setup.read_context_file("data.txt"), "B\n");
    assert_eq!(setup.status(), "finished");

    setup.revert().passes();
    assert_eq!(setup.read_context_file("data.txt"), "A");
    assert_eq!(setup.status(), "reverted");

    // Reverting the very first run leaves a head with a null parent
    let head = setup.head_event().unwrap();
    assert!(head.get("parent_event_id").unwrap().is_null());
}

#[test]
fn new_file_added_by_the_pipeline_is_trashed() {
    let setup = Setup::new();
    setup.shell_pipeline("create", "echo fresh > new.txt");

    setup.run("create").passes();
    assert!(setup.context_path("new.txt").exists());

    setup.revert().passes();
    assert!(!setup.context_path("new.txt").exists());

    let cans: Vec<_> = std::fs::read_dir(setup.context_path(".trash_cans"))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(cans.len(), 1);
    let trashed = cans[0].path().join("new.txt");
    assert_eq!(std::fs::read_to_string(trashed).unwrap(), "fresh\n");
}

#[test]
fn revert_removes_a_directory_tree_added_by_the_pipeline() {
    let setup = Setup::new();
    setup.shell_pipeline("deep", "mkdir -p a/b && echo x > a/b/c.txt");

    setup.run("deep").passes();
    setup.revert().passes();

    assert!(!setup.context_path("a").exists());
}

#[test]
fn revert_restores_a_deleted_file() {
    let setup = Setup::new();
    setup.context_file("data.txt", "keep me");
    setup.shell_pipeline("delete", "rm -f data.txt");

    setup.run("delete").passes();
    assert!(!setup.context_path("data.txt").exists());

    setup.revert().passes();
    assert_eq!(setup.read_context_file("data.txt"), "keep me");
}

#[test]
fn revert_after_a_failed_run_reopens_the_context() {
    let setup = Setup::new();
    setup.context_file("data.txt", "A");
    setup.shell_pipeline("flaky", "echo B > tmp && mv tmp data.txt && exit 3");

    setup.run("flaky").fails().stderr_has("exit code 3");
    assert_eq!(setup.status(), "failed");

    setup.revert().passes();
    assert_eq!(setup.read_context_file("data.txt"), "A");
    assert_eq!(setup.status(), "reverted");
}

#[test]
fn run_then_revert_grows_the_event_store_by_three() {
    let setup = Setup::new();
    setup.shell_pipeline("noop", "true");

    setup.run("noop").passes();
    assert_eq!(setup.event_count(), 2);

    setup.revert().passes();
    assert_eq!(setup.event_count(), 3);

    // The chain from head is just the reverted event; the run's events
    // stay behind as orphans
    assert_eq!(setup.chain_kinds(), vec!["reverted"]);
}

#[test]
fn revert_with_no_history_exits_1() {
    let setup = Setup::new();
    setup
        .revert()
        .fails()
        .stderr_has("nothing to revert");
}

#[test]
fn reverted_modes_match_the_pre_run_tree() {
    let setup = Setup::new();
    setup.context_file("data.txt", "A");
    std::fs::set_permissions(
        setup.context_path("data.txt"),
        std::os::unix::fs::PermissionsExt::from_mode(0o640),
    )
    .unwrap();
    setup.shell_pipeline("noop", "true");

    setup.run("noop").passes();
    // The run left the working copy read-only
    let masked = mode(&setup.context_path("data.txt"));
    assert_eq!(masked, 0o440);

    setup.revert().passes();
    assert_eq!(mode(&setup.context_path("data.txt")), 0o640);
}

fn mode(path: &std::path::Path) -> u32 {
    use std::os::unix::fs::MetadataExt;
    std::fs::metadata(path).unwrap().mode() & 0o7777
}
