//! Scripted stand-ins for the console and the shell.

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use secrecy::SecretString;

use super::interaction::Interaction;
use super::search::{SearchHit, SearchProvider, SearchResults, WebSearch};
use super::shell::{ShellOutput, ShellRunner};

/// Answers prompts from a fixed script and records what was shown.
#[derive(Default)]
pub struct ScriptedInteraction {
    answers: Mutex<VecDeque<String>>,
    pub prompts: Mutex<Vec<String>>,
    pub notices: Mutex<Vec<String>>,
}

impl ScriptedInteraction {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().map(|a| a.to_string()).collect()),
            ..Default::default()
        }
    }

    fn next(&self, text: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(text.to_string());
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow!("script exhausted"))
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

impl Interaction for ScriptedInteraction {
    fn prompt(&self, text: &str) -> Result<String> {
        self.next(text)
    }

    fn prompt_secret(&self, text: &str) -> Result<SecretString> {
        self.next(text).map(SecretString::new)
    }

    fn notify(&self, text: &str) {
        self.notices.lock().unwrap().push(text.to_string());
    }
}

/// Returns canned outputs in order and counts calls.
#[derive(Default)]
pub struct CountingShell {
    outputs: Mutex<VecDeque<io::Result<ShellOutput>>>,
    calls: AtomicUsize,
    pub commands: Mutex<Vec<String>>,
    pub stdins: Mutex<Vec<Option<String>>>,
}

impl CountingShell {
    pub fn new(outputs: Vec<ShellOutput>) -> Self {
        Self {
            outputs: Mutex::new(outputs.into_iter().map(Ok).collect()),
            ..Default::default()
        }
    }

    pub fn failing_spawn() -> Self {
        let shell = Self::default();
        shell
            .outputs
            .lock()
            .unwrap()
            .push_back(Err(io::Error::new(io::ErrorKind::NotFound, "sh: not found")));
        shell
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ShellRunner for CountingShell {
    fn run(&self, command: &str, stdin: Option<&str>) -> io::Result<ShellOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.commands.lock().unwrap().push(command.to_string());
        self.stdins.lock().unwrap().push(stdin.map(str::to_string));
        self.outputs
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ShellOutput::default()))
    }
}

pub fn exited(status: i32, stdout: &str, stderr: &str) -> ShellOutput {
    ShellOutput {
        status: Some(status),
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
    }
}

/// Offline search backend answering every query with one hit.
struct CannedSearch;

#[async_trait]
impl SearchProvider for CannedSearch {
    async fn search(&self, query: &str) -> Result<SearchResults> {
        Ok(SearchResults {
            summary: None,
            hits: vec![SearchHit {
                title: format!("Result for {query}"),
                url: "https://example.org".to_string(),
                snippet: String::new(),
            }],
        })
    }

    fn name(&self) -> &str {
        "canned"
    }
}

pub fn canned_search() -> WebSearch {
    WebSearch::from_provider(Box::new(CannedSearch))
}
