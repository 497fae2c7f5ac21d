//! Test helpers for behavioral specifications.
//!
//! Provides a high-level DSL for driving the pmatic binary against a
//! throwaway pmatic base and context directory.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::PathBuf;
use std::process::Output;
use tempfile::TempDir;

/// A throwaway pmatic base (deployments + pipelines) and context
/// directory, torn down when dropped.
pub struct Setup {
    pub base: TempDir,
    pub context: TempDir,
}

impl Setup {
    /// Base with a default registry listing `echo`, `sh`, and `false`.
    pub fn new() -> Self {
        let setup = Self::bare();
        setup.deployments(concat!(
            "echo:\n  '1': /bin/echo\n",
            "sh:\n  '1': /bin/sh\n",
            "false:\n  '1': /bin/false\n",
        ));
        setup
    }

    /// Base with an empty pipelines directory and no registry.
    pub fn bare() -> Self {
        let base = TempDir::new().unwrap();
        std::fs::create_dir(base.path().join("pipelines")).unwrap();
        Self {
            base,
            context: TempDir::new().unwrap(),
        }
    }

    /// (Re)write the deployments registry; the file_type header is added.
    pub fn deployments(&self, body: &str) {
        std::fs::write(
            self.base.path().join("deployments.yaml"),
            format!("file_type: deployments-1\n{}", body),
        )
        .unwrap();
    }

    /// Write a pipeline document under the base.
    pub fn pipeline(&self, name: &str, body: &str) {
        std::fs::write(
            self.base.path().join("pipelines").join(format!("{}.yaml", name)),
            body,
        )
        .unwrap();
    }

    /// A single-task pipeline running `sh -c <script>` in the context.
    pub fn shell_pipeline(&self, name: &str, script: &str) {
        self.pipeline(
            name,
            &format!(
                "file_type: single-task-1\nexecutable: sh\narguments: ['-c', {:?}]\n",
                script
            ),
        );
    }

    pub fn context_file(&self, rel: &str, content: &str) {
        std::fs::write(self.context.path().join(rel), content).unwrap();
    }

    pub fn context_path(&self, rel: &str) -> PathBuf {
        self.context.path().join(rel)
    }

    pub fn read_context_file(&self, rel: &str) -> String {
        std::fs::read_to_string(self.context_path(rel)).unwrap()
    }

    /// A pmatic invocation with PMATIC_BASE pointing at this setup.
    pub fn pmatic(&self) -> CliBuilder {
        CliBuilder::new().env("PMATIC_BASE", self.base.path().to_string_lossy())
    }

    pub fn run(&self, pipeline: &str) -> CliBuilder {
        self.pmatic().args(&[
            "run",
            pipeline,
            &self.context.path().to_string_lossy(),
        ])
    }

    pub fn revert(&self) -> CliBuilder {
        self.pmatic()
            .args(&["revert", &self.context.path().to_string_lossy()])
    }

    /// Status projection read straight off the on-disk event chain.
    pub fn status(&self) -> String {
        match self.head_event() {
            Some(event) => event
                .get("what")
                .and_then(serde_yaml::Value::as_str)
                .unwrap()
                .to_string(),
            None => "never_run".to_string(),
        }
    }

    /// The event the head pointer names, decoded as raw YAML.
    pub fn head_event(&self) -> Option<serde_yaml::Value> {
        let head_path = self.context.path().join(".pmatic/events/head");
        let head = std::fs::read_to_string(head_path).ok()?;
        let id: Option<String> = serde_yaml::from_str(&head).ok()?;
        let id = id?;
        let event_path = self
            .context
            .path()
            .join(format!(".pmatic/events/db/{}.yaml", id));
        serde_yaml::from_str(&std::fs::read_to_string(event_path).ok()?).ok()
    }

    /// Newest-first event kinds, following parent links from head.
    pub fn chain_kinds(&self) -> Vec<String> {
        let mut kinds = Vec::new();
        let mut event = self.head_event();
        while let Some(current) = event {
            kinds.push(
                current
                    .get("what")
                    .and_then(serde_yaml::Value::as_str)
                    .unwrap()
                    .to_string(),
            );
            event = match current.get("parent_event_id").and_then(serde_yaml::Value::as_str) {
                Some(parent) => {
                    let path = self
                        .context
                        .path()
                        .join(format!(".pmatic/events/db/{}.yaml", parent));
                    serde_yaml::from_str(&std::fs::read_to_string(path).unwrap()).ok()
                }
                None => None,
            };
        }
        kinds
    }

    /// Number of event files on disk, including orphans.
    pub fn event_count(&self) -> usize {
        match std::fs::read_dir(self.context.path().join(".pmatic/events/db")) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }
}

/// A pmatic invocation with no environment prepared.
pub fn cli() -> CliBuilder {
    CliBuilder::new()
}

/// Fluent builder for pmatic invocations.
pub struct CliBuilder {
    args: Vec<String>,
    envs: Vec<(String, String)>,
}

impl CliBuilder {
    fn new() -> Self {
        Self {
            args: Vec::new(),
            envs: Vec::new(),
        }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    pub fn env(mut self, key: &str, value: impl Into<String>) -> Self {
        self.envs.push((key.to_string(), value.into()));
        self
    }

    fn output(self) -> Output {
        let mut cmd = assert_cmd::Command::cargo_bin("pmatic").unwrap();
        cmd.args(&self.args);
        cmd.env_remove("PMATIC_BASE");
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }
        cmd.output().unwrap()
    }

    /// Run and require exit code 0.
    pub fn passes(self) -> CliOutput {
        let output = self.output();
        assert!(
            output.status.success(),
            "expected success, got {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
        CliOutput { output }
    }

    /// Run and require exit code 1.
    pub fn fails(self) -> CliOutput {
        let output = self.output();
        assert_eq!(
            output.status.code(),
            Some(1),
            "expected exit code 1, got {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
        CliOutput { output }
    }
}

/// Captured output with fluent assertions.
pub struct CliOutput {
    output: Output,
}

impl CliOutput {
    pub fn stdout_has(self, needle: &str) -> Self {
        let stdout = String::from_utf8_lossy(&self.output.stdout).into_owned();
        assert!(stdout.contains(needle), "stdout missing {:?}: {}", needle, stdout);
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        let stderr = String::from_utf8_lossy(&self.output.stderr).into_owned();
        assert!(stderr.contains(needle), "stderr missing {:?}: {}", needle, stderr);
        self
    }

    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }
}
