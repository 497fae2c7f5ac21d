//! `pmatic run` specs
//!
//! Cover the clean-success path, dependency verification, the state
//! gate, and configuration errors.

use crate::prelude::*;

#[test]
fn clean_run_writes_stdout_and_finishes() {
    let setup = Setup::new();
    setup.pipeline(
        "hello",
        concat!(
            "file_type: single-task-1\n",
            "executable: echo\n",
            "arguments: [\"hi\"]\n",
            "stdout: out.txt\n",
        ),
    );

    setup.run("hello").passes();

    assert_eq!(setup.read_context_file("out.txt"), "hi\n");
    assert_eq!(setup.status(), "finished");
    assert_eq!(setup.chain_kinds(), vec!["finished", "started"]);
}

#[test]
fn missing_dependency_exits_1_without_posting_events() {
    let setup = Setup::bare();
    setup.deployments("echo:\n  '1': /nonexistent/bin/echo\n");
    setup.pipeline("hello", "file_type: single-task-1\nexecutable: echo\n");

    setup
        .run("hello")
        .fails()
        .stderr_has("following dependencies are missing:")
        .stderr_has("'/nonexistent/bin/echo'");

    assert_eq!(setup.event_count(), 0);
    assert_eq!(setup.status(), "never_run");
}

#[test]
fn unlisted_dependency_names_the_registry() {
    let setup = Setup::bare();
    setup.deployments("other:\n  '1': /bin/echo\n");
    setup.pipeline("hello", "file_type: single-task-1\nexecutable: echo\n");

    setup
        .run("hello")
        .fails()
        .stderr_has("are not listed in")
        .stderr_has("deployments.yaml")
        .stderr_has("('echo', '1', 'executable')");
    assert_eq!(setup.event_count(), 0);
}

#[test]
fn failed_run_blocks_the_next_run() {
    let setup = Setup::new();
    setup.pipeline("hello", "file_type: single-task-1\nexecutable: false\n");

    setup.run("hello").fails().stderr_has("exit code 1");
    assert_eq!(setup.status(), "failed");
    assert_eq!(
        setup.head_event().unwrap().get("exit_code").unwrap().as_i64(),
        Some(1)
    );

    setup
        .run("hello")
        .fails()
        .stderr_has("Cannot run, because pipeline 'hello' has a status of 'failed'");

    setup.revert().passes();
    assert_eq!(setup.status(), "reverted");
    setup.run("hello").fails().stderr_has("exit code 1");
}

#[test]
fn unknown_pipeline_exits_1_before_touching_the_context() {
    let setup = Setup::new();

    setup
        .run("does-not-exist")
        .fails()
        .stderr_has("does-not-exist.yaml")
        .stderr_has("is not a file");

    assert!(!setup.context_path(".pmatic").exists());
}

#[test]
fn missing_pmatic_base_is_a_config_error() {
    let setup = Setup::new();
    cli()
        .args(&["run", "hello", &setup.context.path().to_string_lossy()])
        .fails()
        .stderr_has("PMATIC_BASE is not set");
}

#[test]
fn context_must_exist() {
    let setup = Setup::new();
    setup.pipeline("hello", "file_type: single-task-1\nexecutable: echo\n");

    setup
        .pmatic()
        .args(&["run", "hello", "/nonexistent/context"])
        .fails()
        .stderr_has("is not a directory");
}

#[test]
fn finished_context_accepts_another_run() {
    let setup = Setup::new();
    setup.pipeline(
        "hello",
        "file_type: single-task-1\nexecutable: echo\narguments: [hi]\n",
    );

    setup.run("hello").passes();
    setup.run("hello").passes();

    assert_eq!(
        setup.chain_kinds(),
        vec!["finished", "started", "finished", "started"]
    );
}

#[test]
fn started_events_embed_the_pre_run_snapshot() {
    let setup = Setup::new();
    setup.context_file("data.txt", "A");
    setup.shell_pipeline("noop", "true");

    setup.run("noop").passes();

    let chain_head = setup.head_event().unwrap();
    let parent = chain_head
        .get("parent_event_id")
        .and_then(serde_yaml::Value::as_str)
        .unwrap()
        .to_string();
    let started: serde_yaml::Value = serde_yaml::from_str(
        &std::fs::read_to_string(
            setup
                .context
                .path()
                .join(format!(".pmatic/events/db/{}.yaml", parent)),
        )
        .unwrap(),
    )
    .unwrap();

    let snapshot = started.get("snapshot").unwrap();
    let record = snapshot.get("data.txt").unwrap();
    // [format, mode, size, inode, symlink]
    assert_eq!(record[0].as_str(), Some("REG"));
    assert_eq!(record[2].as_u64(), Some(1));
    assert!(record[3].as_u64().unwrap() > 0);
    assert!(record[4].is_null());
}
