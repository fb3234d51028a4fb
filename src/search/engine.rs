//! Search engine - orchestrates one search request / 搜索引擎
//!
//! Request lifecycle: idle -> pending -> success | error.
//! The name phase and the content phase run concurrently; a failure in
//! either fails the whole request (no partial results).

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use super::content::{
    ContentOptions, ContentSearcher, ExternalContentSearcher, FallbackContentSearcher, NativeContentSearcher,
};
use super::error::{Phase, SearchError};
use super::ranker::{merge, rank_phase, MergeStrategy};
use super::schema::{split_relative, EntryKind, MatchType, ScoredResult};
use super::scorer::QueryMatcher;
use super::tokenizer::tokenize;
use super::walker::{DirectoryWalker, ExternalWalker, FallbackWalker, NativeWalker};
use crate::config::{AppConfig, SearchBackendKind};
use crate::utils::{has_extension, is_hidden_name};

/// Per-endpoint ranking settings / 每个接口的排序设置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchEndpoint {
    pub strategy: MergeStrategy,
    pub max_results: usize,
}

impl SearchEndpoint {
    pub fn ranked(max_results: usize) -> Self {
        Self { strategy: MergeStrategy::Ranked, max_results }
    }

    pub fn names_first(max_results: usize) -> Self {
        Self { strategy: MergeStrategy::NamesFirst, max_results }
    }
}

/// Note search over one notes root / 笔记搜索
pub struct NoteSearcher {
    root: PathBuf,
    walker: Arc<dyn DirectoryWalker>,
    content: Arc<dyn ContentSearcher>,
    note_extensions: Vec<String>,
    include_hidden: bool,
}

impl NoteSearcher {
    pub fn new(root: PathBuf, walker: Arc<dyn DirectoryWalker>, content: Arc<dyn ContentSearcher>) -> Self {
        Self {
            root,
            walker,
            content,
            note_extensions: vec!["md".to_string()],
            include_hidden: false,
        }
    }

    /// Build the searcher with the configured backend / 按配置选择后端
    pub fn from_config(config: &AppConfig) -> Self {
        let options = ContentOptions {
            extensions: config.notes.note_extensions.clone(),
            context: config.search.snippet_context,
        };
        let limits = config.get_process_limits();

        let native_walker: Arc<dyn DirectoryWalker> = Arc::new(NativeWalker);
        let native_content: Arc<dyn ContentSearcher> = Arc::new(NativeContentSearcher::new(options.clone()));

        let (walker, content): (Arc<dyn DirectoryWalker>, Arc<dyn ContentSearcher>) = match config.search.backend {
            SearchBackendKind::Native => (native_walker, native_content),
            SearchBackendKind::External => (
                Arc::new(ExternalWalker::new(limits)),
                Arc::new(ExternalContentSearcher::new(options, limits)),
            ),
            SearchBackendKind::Auto => (
                Arc::new(FallbackWalker::new(Arc::new(ExternalWalker::new(limits)), native_walker)),
                Arc::new(FallbackContentSearcher::new(
                    Arc::new(ExternalContentSearcher::new(options, limits)),
                    native_content,
                )),
            ),
        };

        tracing::info!(
            "Search backend: walker={}, content={}, root={}",
            walker.name(), content.name(), config.notes.root
        );

        Self::new(config.get_notes_root(), walker, content)
            .with_note_extensions(config.notes.note_extensions.clone())
            .with_hidden(config.notes.include_hidden)
    }

    pub fn with_note_extensions(mut self, extensions: Vec<String>) -> Self {
        self.note_extensions = extensions;
        self
    }

    pub fn with_hidden(mut self, include_hidden: bool) -> Self {
        self.include_hidden = include_hidden;
        self
    }

    /// `walker/content` backend names, e.g. `native/native`
    pub fn backend_description(&self) -> String {
        format!("{}/{}", self.walker.name(), self.content.name())
    }

    /// Run one search request / 执行一次搜索
    pub async fn search(&self, query: Option<&str>, endpoint: SearchEndpoint) -> Result<Vec<ScoredResult>, SearchError> {
        let query = match query.map(str::trim) {
            Some(q) if !q.is_empty() => q,
            _ => {
                tracing::debug!("Search idle -> error: missing query");
                return Err(SearchError::InvalidQuery("query parameter `q` is required".to_string()));
            }
        };

        let words = tokenize(query);
        if words.is_empty() {
            // Nothing can score above zero / 无有效词，所有分数为 0
            tracing::debug!("Search idle -> success: no words in {:?}", query);
            return Ok(Vec::new());
        }

        tracing::debug!("Search idle -> pending: {:?} -> {:?}", query, words);
        let started = Instant::now();

        let matcher = Arc::new(QueryMatcher::new(&words));
        let result = tokio::try_join!(
            self.name_phase(&matcher, endpoint.max_results),
            self.content_phase(query, &matcher, endpoint.max_results),
        );

        match result {
            Ok((names, contents)) => {
                let (name_count, content_count) = (names.len(), contents.len());
                let merged = merge(names, contents, endpoint.strategy, endpoint.max_results);
                tracing::debug!(
                    "Search pending -> success: {} name + {} content -> {} results in {:?}",
                    name_count, content_count, merged.len(), started.elapsed()
                );
                Ok(merged)
            }
            Err(e) => {
                tracing::debug!("Search pending -> error: {}", e);
                Err(e)
            }
        }
    }

    async fn name_phase(&self, matcher: &Arc<QueryMatcher>, cap: usize) -> Result<Vec<ScoredResult>, SearchError> {
        let entries = self
            .walker
            .list_all_entries(&self.root)
            .await
            .map_err(|e| e.in_phase(Phase::Name))?;

        let filter = self.visibility();
        let extensions = self.note_extensions.clone();
        let matcher = Arc::clone(matcher);
        // Scoring is CPU bound, keep it off the runtime workers / 评分放到阻塞线程
        tokio::task::spawn_blocking(move || {
            let candidates = entries
                .into_iter()
                .filter_map(|entry| {
                    let (notebook, name) = filter.segments(&entry.path)?;
                    let match_type = match entry.kind {
                        EntryKind::Dir => MatchType::Folder,
                        EntryKind::File if has_extension(&entry.path, &extensions) => MatchType::Note,
                        EntryKind::File => return None,
                    };
                    let score = matcher.score(&name);
                    Some(ScoredResult {
                        notebook,
                        name,
                        match_type,
                        snippet: String::new(),
                        score,
                        line_num: None,
                    })
                })
                .collect();
            rank_phase(candidates, cap)
        })
        .await
        .map_err(|e| SearchError::invocation(Phase::Name, format!("scoring task failed: {}", e)))
    }

    async fn content_phase(
        &self,
        query: &str,
        matcher: &Arc<QueryMatcher>,
        cap: usize,
    ) -> Result<Vec<ScoredResult>, SearchError> {
        let hits = self
            .content
            .grep_content(&self.root, query)
            .await
            .map_err(|e| e.in_phase(Phase::Content))?;

        let filter = self.visibility();
        let matcher = Arc::clone(matcher);
        tokio::task::spawn_blocking(move || {
            let candidates = hits
                .into_iter()
                .filter_map(|hit| {
                    let (notebook, name) = filter.segments(&hit.path)?;
                    let score = matcher.score(&hit.snippet);
                    Some(ScoredResult {
                        notebook,
                        name,
                        match_type: MatchType::Content,
                        snippet: hit.snippet,
                        score,
                        line_num: hit.line_number,
                    })
                })
                .collect();
            rank_phase(candidates, cap)
        })
        .await
        .map_err(|e| SearchError::invocation(Phase::Content, format!("scoring task failed: {}", e)))
    }

    fn visibility(&self) -> Visibility {
        Visibility {
            root: self.root.clone(),
            include_hidden: self.include_hidden,
        }
    }
}

/// Maps absolute paths to (notebook, name), hiding dot entries / 过滤隐藏条目
struct Visibility {
    root: PathBuf,
    include_hidden: bool,
}

impl Visibility {
    /// None for hidden or foreign paths
    fn segments(&self, path: &Path) -> Option<(Vec<String>, String)> {
        let (notebook, name) = split_relative(&self.root, path)?;
        if !self.include_hidden && (is_hidden_name(&name) || notebook.iter().any(|s| is_hidden_name(s))) {
            return None;
        }
        Some((notebook, name))
    }
}
