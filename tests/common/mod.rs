//! Scripted git for driving `GitService` without a repository.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use parking_lot::Mutex;

use git_annotate::Config;
use git_annotate::git::{
    ExecFuture, GitLocation, GitRunner, GitService, GitVersion, ProcessExecutor, ProcessOutput,
};

pub const REPO: &str = "/work/repo";

pub const SHA_A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
pub const SHA_B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
pub const SHA_C: &str = "cccccccccccccccccccccccccccccccccccccccc";

struct Rule {
    required: Vec<String>,
    output: ProcessOutput,
}

/// Answers each invocation with the rule whose required arguments all appear
/// in the argv, preferring the rule that requires the most. Unmatched
/// invocations succeed with empty output.
#[derive(Default)]
pub struct FakeExecutor {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<Vec<String>>>,
    latency: Mutex<Option<Duration>>,
}

impl FakeExecutor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = Some(latency);
    }

    pub fn respond(&self, required: &[&str], stdout: &str) {
        self.push(required, Some(0), stdout, "");
    }

    pub fn fail(&self, required: &[&str], stderr: &str) {
        self.push(required, Some(128), "", stderr);
    }

    fn push(&self, required: &[&str], code: Option<i32>, stdout: &str, stderr: &str) {
        self.rules.lock().push(Rule {
            required: required.iter().map(|a| a.to_string()).collect(),
            output: ProcessOutput {
                code,
                stdout: stdout.as_bytes().to_vec(),
                stderr: stderr.as_bytes().to_vec(),
            },
        });
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().len()
    }

    /// Invocations whose argv contains `arg`
    pub fn calls_with(&self, arg: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|args| args.iter().any(|a| a == arg))
            .count()
    }

    pub fn last_call(&self) -> Option<Vec<String>> {
        self.calls.lock().last().cloned()
    }
}

impl ProcessExecutor for FakeExecutor {
    fn execute(&self, _program: &Path, _cwd: &Path, args: &[String]) -> ExecFuture {
        self.calls.lock().push(args.to_vec());

        let output = {
            let rules = self.rules.lock();
            rules
                .iter()
                .filter(|rule| rule.required.iter().all(|r| args.contains(r)))
                .max_by_key(|rule| rule.required.len())
                .map(|rule| rule.output.clone())
                .unwrap_or(ProcessOutput {
                    code: Some(0),
                    ..Default::default()
                })
        };
        let latency = *self.latency.lock();

        async move {
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }
            Ok(output)
        }
        .boxed()
    }
}

pub fn service(executor: &Arc<FakeExecutor>) -> Arc<GitService> {
    service_with(Config::default(), executor, GitVersion::new(2, 43, 0))
}

pub fn service_with(config: Config, executor: &Arc<FakeExecutor>, version: GitVersion) -> Arc<GitService> {
    let location = GitLocation {
        path: PathBuf::from("git"),
        version,
    };
    let runner = GitRunner::new(location, executor.clone());
    Arc::new(GitService::new(config, runner))
}

/// Incremental blame output attributing `lines` (0-based, inclusive) to each sha
pub fn blame_output(file: &str, groups: &[(&str, &str, usize, usize)]) -> String {
    let mut out = String::new();
    for (sha, author, start, end) in groups {
        let count = end - start + 1;
        out.push_str(&format!("{sha} {line} {line} {count}\n", line = start + 1));
        out.push_str(&format!("author {author}\n"));
        out.push_str(&format!("author-mail <{}@example.com>\n", author.to_lowercase()));
        out.push_str("author-time 1700000000\n");
        out.push_str("author-tz +0000\n");
        out.push_str(&format!("summary Work by {author}\n"));
        out.push_str(&format!("filename {file}\n"));
    }
    out
}

/// Log output framing one commit
pub fn log_entry(sha: &str, parent: &str, summary: &str, file: &str) -> String {
    format!(
        "<r> {sha}\n<a> Alice Doe\n<e> alice@example.com\n<d> 1700000000\n<p> {parent}\n<s>\n{summary}\n</s>\n<f>\n\nM\t{file}\n"
    )
}
