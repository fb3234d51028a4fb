//! Debounced client-side search / 客户端搜索聚合器
//!
//! One tokio task owns the debounce timers, the generation counter and the
//! view. Handles talk to it over a channel and observe the view through a
//! watch channel. A response is applied only if it belongs to the latest
//! issued request; clearing the input bumps the generation as well.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::backend::{ClientError, SearchBackend};
use super::view::{SearchStatus, SearchView};
use crate::config::ClientConfig;
use crate::i18n::{CatalogTranslator, Translator, SEARCH_FAILED};
use crate::search::ScoredResult;
use crate::storage::NotebookEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatorConfig {
    /// Quiet period after the last keystroke / 防抖延迟
    pub debounce: Duration,
    /// Upper bound between the first unsent keystroke and its request / 最长等待
    pub max_wait: Duration,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self::from(&ClientConfig::default())
    }
}

impl From<&ClientConfig> for AggregatorConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            debounce: Duration::from_millis(config.debounce_ms),
            max_wait: Duration::from_millis(config.max_wait_ms),
        }
    }
}

enum Command {
    SetSearch(String),
    ExpandFolder { notebook: Vec<String>, name: String },
}

enum Completion {
    Search {
        generation: u64,
        query: String,
        result: Result<Vec<ScoredResult>, ClientError>,
    },
    Children {
        generation: u64,
        notebook: Vec<String>,
        name: String,
        result: Result<Vec<NotebookEntry>, ClientError>,
    },
}

/// Handle to a running aggregator; dropping it stops the task / 聚合器句柄
pub struct AggregatorHandle {
    commands: mpsc::UnboundedSender<Command>,
    view: watch::Receiver<SearchView>,
    cancel: CancellationToken,
}

impl AggregatorHandle {
    /// Update the search text; blank text clears the results / 更新搜索内容
    pub fn set_search(&self, text: impl Into<String>) {
        self.send(Command::SetSearch(text.into()));
    }

    /// Load children of a folder result in place / 展开文件夹结果
    pub fn expand_folder(&self, notebook: Vec<String>, name: impl Into<String>) {
        self.send(Command::ExpandFolder { notebook, name: name.into() });
    }

    /// Snapshot of the current view / 当前视图快照
    pub fn view(&self) -> SearchView {
        self.view.borrow().clone()
    }

    /// Wait for the next view update; false once the aggregator has stopped
    pub async fn changed(&mut self) -> bool {
        self.view.changed().await.is_ok()
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            tracing::debug!("Search aggregator already stopped, command ignored");
        }
    }
}

impl Drop for AggregatorHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

pub struct SearchAggregator {
    backend: Arc<dyn SearchBackend>,
    config: AggregatorConfig,
    translator: Arc<dyn Translator>,
    view: watch::Sender<SearchView>,
    completions: mpsc::UnboundedSender<Completion>,
    cancel: CancellationToken,
    pending: Option<String>,
    trailing_deadline: Option<Instant>,
    max_deadline: Option<Instant>,
    /// Latest issued request (or clear) / 最新请求代数
    generation: u64,
    /// Generation of the results on display / 当前展示结果的代数
    applied_generation: u64,
}

impl SearchAggregator {
    /// Start the aggregator task on the current runtime / 启动聚合器
    pub fn spawn(backend: Arc<dyn SearchBackend>, config: AggregatorConfig) -> AggregatorHandle {
        Self::spawn_with_translator(backend, config, Arc::new(CatalogTranslator::english()))
    }

    pub fn spawn_with_translator(
        backend: Arc<dyn SearchBackend>,
        config: AggregatorConfig,
        translator: Arc<dyn Translator>,
    ) -> AggregatorHandle {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(SearchView::default());
        let cancel = CancellationToken::new();

        let aggregator = Self {
            backend,
            config,
            translator,
            view: view_tx,
            completions: completion_tx,
            cancel: cancel.clone(),
            pending: None,
            trailing_deadline: None,
            max_deadline: None,
            generation: 0,
            applied_generation: 0,
        };
        tokio::spawn(aggregator.run(command_rx, completion_rx));

        AggregatorHandle { commands: command_tx, view: view_rx, cancel }
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut completions: mpsc::UnboundedReceiver<Completion>,
    ) {
        let cancel = self.cancel.clone();
        loop {
            let deadline = self.next_deadline();
            tokio::select! {
                _ = cancel.cancelled() => break,
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(completion) = completions.recv() => self.apply(completion),
                _ = wait_until(deadline) => self.issue_search(),
            }
        }
        cancel.cancel();
        tracing::debug!("Search aggregator stopped");
    }

    fn next_deadline(&self) -> Option<Instant> {
        match (self.trailing_deadline, self.max_deadline) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::SetSearch(text) => self.set_search(text),
            Command::ExpandFolder { notebook, name } => self.expand_folder(notebook, name),
        }
    }

    fn set_search(&mut self, text: String) {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            self.generation += 1;
            self.applied_generation = self.generation;
            self.pending = None;
            self.trailing_deadline = None;
            self.max_deadline = None;
            tracing::debug!("Search cleared -> idle (generation {})", self.generation);
            self.view.send_modify(|view| {
                view.query = text;
                view.status = SearchStatus::Idle;
                view.error = None;
                view.clear_results();
            });
            return;
        }

        let now = Instant::now();
        self.pending = Some(trimmed.to_string());
        self.trailing_deadline = Some(now + self.config.debounce);
        self.max_deadline.get_or_insert(now + self.config.max_wait);
        self.view.send_modify(|view| view.query = text);
    }

    fn issue_search(&mut self) {
        self.trailing_deadline = None;
        self.max_deadline = None;
        let Some(query) = self.pending.take() else {
            return;
        };

        self.generation += 1;
        let generation = self.generation;
        tracing::debug!("Search request {:?} issued (generation {})", query, generation);
        self.view.send_modify(|view| view.status = SearchStatus::Pending);

        let backend = self.backend.clone();
        let completions = self.completions.clone();
        let token = self.cancel.child_token();
        tokio::spawn(async move {
            let request = query.clone();
            tokio::select! {
                _ = token.cancelled() => {}
                result = backend.search(&request) => {
                    let _ = completions.send(Completion::Search { generation, query, result });
                }
            }
        });
    }

    fn expand_folder(&mut self, notebook: Vec<String>, name: String) {
        let started = self.view.send_if_modified(|view| match view.folder_mut(&notebook, &name) {
            Some(node) if node.children.is_none() && !node.loading => {
                node.loading = true;
                true
            }
            _ => false,
        });
        if !started {
            tracing::debug!("Folder {:?}/{} not expandable", notebook, name);
            return;
        }

        let generation = self.applied_generation;
        let backend = self.backend.clone();
        let completions = self.completions.clone();
        let token = self.cancel.child_token();
        tokio::spawn(async move {
            let mut segments = notebook.clone();
            segments.push(name.clone());
            tokio::select! {
                _ = token.cancelled() => {}
                result = backend.list_children(&segments) => {
                    let _ = completions.send(Completion::Children { generation, notebook, name, result });
                }
            }
        });
    }

    fn apply(&mut self, completion: Completion) {
        match completion {
            Completion::Search { generation, query, result } => {
                if generation != self.generation {
                    tracing::debug!(
                        "Discarding stale response for {:?} (generation {}, latest {})",
                        query, generation, self.generation
                    );
                    return;
                }
                match result {
                    Ok(results) => {
                        tracing::debug!("Search {:?} -> success: {} results", query, results.len());
                        self.applied_generation = generation;
                        self.view.send_modify(|view| {
                            view.status = SearchStatus::Success;
                            view.error = None;
                            view.replace_results(results);
                        });
                    }
                    Err(e) => {
                        tracing::warn!("Search {:?} -> error: {}", query, e);
                        let message = self.translator.translate(SEARCH_FAILED, &[]);
                        self.view.send_modify(|view| {
                            view.status = SearchStatus::Error;
                            view.error = Some(message);
                        });
                    }
                }
            }
            Completion::Children { generation, notebook, name, result } => {
                if generation != self.applied_generation {
                    tracing::debug!("Dropping children of {:?}/{}: results replaced", notebook, name);
                    return;
                }
                self.view.send_if_modified(|view| {
                    let Some(node) = view.folder_mut(&notebook, &name) else {
                        return false;
                    };
                    node.loading = false;
                    match result {
                        Ok(children) => node.children = Some(children),
                        Err(e) => tracing::warn!("Failed to expand {:?}/{}: {}", notebook, name, e),
                    }
                    true
                });
            }
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
