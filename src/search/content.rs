//! Content search over markdown files / 笔记内容搜索
//!
//! Returns at most one hit per file: the first matching line, windowed to
//! `context` characters on each side of the match.

use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use super::error::{Phase, SearchError};
use super::process::{self, ProcessLimits};
use super::schema::ContentHit;
use super::walker::process_failure;
#[cfg(windows)]
use super::walker::{powershell_args, powershell_quote};
use crate::utils::has_extension;

/// Characters of context kept on each side of a match / 匹配两侧保留的字符数
pub const DEFAULT_SNIPPET_CONTEXT: usize = 50;

/// Searches note contents for a literal query / 按字面量搜索笔记内容
#[async_trait]
pub trait ContentSearcher: Send + Sync {
    fn name(&self) -> &str;

    async fn grep_content(&self, root: &Path, query: &str) -> Result<Vec<ContentHit>, SearchError>;
}

/// Options shared by content searchers / 内容搜索选项
#[derive(Debug, Clone)]
pub struct ContentOptions {
    /// File extensions searched, without dot / 搜索的扩展名
    pub extensions: Vec<String>,
    pub context: usize,
}

impl Default for ContentOptions {
    fn default() -> Self {
        Self {
            extensions: vec!["md".to_string()],
            context: DEFAULT_SNIPPET_CONTEXT,
        }
    }
}

/// In-process content searcher / 进程内内容搜索
#[derive(Debug, Clone, Default)]
pub struct NativeContentSearcher {
    options: ContentOptions,
}

impl NativeContentSearcher {
    pub fn new(options: ContentOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl ContentSearcher for NativeContentSearcher {
    fn name(&self) -> &str {
        "native"
    }

    async fn grep_content(&self, root: &Path, query: &str) -> Result<Vec<ContentHit>, SearchError> {
        let needle = collapse_whitespace(query);
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        let pattern = literal_pattern(&needle)?;
        let root = root.to_path_buf();
        let options = self.options.clone();

        tokio::task::spawn_blocking(move || grep_native(&root, &pattern, &options))
            .await
            .map_err(|e| SearchError::invocation(Phase::Content, format!("grep task failed: {}", e)))?
    }
}

fn literal_pattern(needle: &str) -> Result<Regex, SearchError> {
    RegexBuilder::new(&regex::escape(needle))
        .case_insensitive(true)
        .build()
        .map_err(|e| SearchError::invocation(Phase::Content, format!("invalid pattern: {}", e)))
}

fn grep_native(root: &Path, pattern: &Regex, options: &ContentOptions) -> Result<Vec<ContentHit>, SearchError> {
    if !root.is_dir() {
        return Err(SearchError::invocation(
            Phase::Content,
            format!("notes root is not a directory: {}", root.display()),
        ));
    }

    let mut hits = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).into_iter().filter_map(|e| match e {
        Ok(entry) => Some(entry),
        Err(e) => {
            tracing::debug!("Skipping unreadable entry: {}", e);
            None
        }
    }) {
        if !entry.file_type().is_file() || !has_extension(entry.path(), &options.extensions) {
            continue;
        }
        let bytes = match std::fs::read(entry.path()) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!("Skipping unreadable file {}: {}", entry.path().display(), e);
                continue;
            }
        };
        let text = String::from_utf8_lossy(&bytes);

        for (index, line) in text.lines().enumerate() {
            if let Some(m) = pattern.find(line) {
                let (snippet, offset) = window_snippet(line, m.start(), m.end(), options.context);
                hits.push(ContentHit {
                    path: entry.path().to_path_buf(),
                    snippet,
                    line_number: Some(index as u64 + 1),
                    offset: Some(offset),
                });
                break;
            }
        }
    }

    Ok(hits)
}

/// Cut `context` characters around the byte range `start..end` of `line`.
/// Returns the snippet and the match's character offset in the line.
pub fn window_snippet(line: &str, start: usize, end: usize, context: usize) -> (String, usize) {
    let before = &line[..start];
    let offset = before.chars().count();
    let skip = offset.saturating_sub(context);

    let mut snippet: String = before.chars().skip(skip).collect();
    snippet.push_str(&line[start..end]);
    snippet.extend(line[end..].chars().take(context));
    (snippet, offset)
}

/// Keep only characters safe to embed in a search pattern / 过滤查询中的不安全字符
///
/// Allowed: letters, digits, `-`, `_`, `.`; whitespace runs become one space.
pub fn sanitize_query(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || matches!(c, '-' | '_' | '.'))
        .collect();
    collapse_whitespace(&kept)
}

/// Trim and turn whitespace runs into one space; both backends search this form
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Escape a sanitized query for POSIX ERE / .NET regex. Only `.` is special
/// among the allowed characters.
pub fn escape_pattern(sanitized: &str) -> String {
    sanitized.replace('.', "\\.")
}

/// Content searcher backed by grep / Select-String / 外部命令内容搜索
#[derive(Debug, Clone, Default)]
pub struct ExternalContentSearcher {
    options: ContentOptions,
    limits: ProcessLimits,
}

impl ExternalContentSearcher {
    pub fn new(options: ContentOptions, limits: ProcessLimits) -> Self {
        Self { options, limits }
    }
}

#[async_trait]
impl ContentSearcher for ExternalContentSearcher {
    fn name(&self) -> &str {
        "external"
    }

    async fn grep_content(&self, root: &Path, query: &str) -> Result<Vec<ContentHit>, SearchError> {
        let sanitized = sanitize_query(query);
        if sanitized.is_empty() {
            return Ok(Vec::new());
        }
        let pattern = escape_pattern(&sanitized);
        let (program, args) = grep_command(root, &pattern, &self.options);

        let output = process::run(program, &args, self.limits)
            .await
            .map_err(|e| process_failure(Phase::Content, e))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let hits = parse_grep_output(&stdout, &sanitized, self.options.context);

        grep_outcome(program, root, output.code, hits, &output.stderr)
    }
}

/// Decide what an exit status means for the parsed hits / 根据退出码判定结果
fn grep_outcome(
    program: &str,
    root: &Path,
    code: Option<i32>,
    hits: Vec<ContentHit>,
    stderr: &str,
) -> Result<Vec<ContentHit>, SearchError> {
    match code {
        Some(0) => Ok(hits),
        // grep: 1 means no match / grep 返回 1 表示无匹配
        #[cfg(not(windows))]
        Some(NO_MATCH_EXIT_CODE) if hits.is_empty() => Ok(Vec::new()),
        // Unreadable files make grep exit 2 even when other files matched
        Some(code) if !hits.is_empty() => {
            tracing::warn!(
                "{} exited with {} under {}, keeping {} hits: {}",
                program, code, root.display(), hits.len(), stderr.trim()
            );
            Ok(hits)
        }
        code => Err(SearchError::invocation(
            Phase::Content,
            format!("{} exited with {:?}: {}", program, code, stderr.trim()),
        )),
    }
}

// grep's no-match status; Select-String reports no match as empty output
#[cfg(not(windows))]
const NO_MATCH_EXIT_CODE: i32 = 1;

#[cfg(not(windows))]
fn grep_command(root: &Path, pattern: &str, options: &ContentOptions) -> (&'static str, Vec<String>) {
    let context = options.context;
    let mut args: Vec<String> = ["-r", "-i", "-n", "-o", "-s", "-m", "1", "-E", "--null"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    for ext in &options.extensions {
        args.push(format!("--include=*.{}", ext));
    }
    args.push("-e".to_string());
    args.push(format!(".{{0,{context}}}{pattern}.{{0,{context}}}"));
    args.push("--".to_string());
    args.push(root.to_string_lossy().into_owned());
    ("grep", args)
}

#[cfg(windows)]
fn grep_command(root: &Path, pattern: &str, options: &ContentOptions) -> (&'static str, Vec<String>) {
    let includes = options
        .extensions
        .iter()
        .map(|ext| powershell_quote(&format!("*.{}", ext)))
        .collect::<Vec<_>>()
        .join(",");
    let script = format!(
        "Get-ChildItem -LiteralPath {} -Recurse -File -Include {} -ErrorAction SilentlyContinue | \
         Select-String -Pattern {} -List -ErrorAction SilentlyContinue | \
         ForEach-Object {{ $_.Path + '|' + $_.LineNumber + '|' + $_.Line }}",
        powershell_quote(&root.to_string_lossy()),
        includes,
        powershell_quote(pattern)
    );
    ("powershell", powershell_args(script))
}

/// Parse external content search output, one hit per file / 解析内容搜索输出
///
/// Unix lines are `path\0line:snippet` (grep --null); Windows lines are
/// `path|line|text` and get windowed here.
pub fn parse_grep_output(output: &str, sanitized: &str, context: usize) -> Vec<ContentHit> {
    let pattern = RegexBuilder::new(&regex::escape(sanitized))
        .case_insensitive(true)
        .build()
        .ok();
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut hits = Vec::new();

    for line in output.lines() {
        let line = line.trim_end_matches('\r');
        let Some(hit) = parse_grep_line(line, pattern.as_ref(), context) else {
            continue;
        };
        if seen.insert(hit.path.clone()) {
            hits.push(hit);
        }
    }

    hits
}

fn parse_grep_line(line: &str, pattern: Option<&Regex>, context: usize) -> Option<ContentHit> {
    if let Some((path, rest)) = line.split_once('\0') {
        let (number, snippet) = rest.split_once(':')?;
        return Some(ContentHit {
            path: PathBuf::from(path),
            snippet: snippet.to_string(),
            line_number: number.parse().ok(),
            offset: None,
        });
    }

    let mut fields = line.splitn(3, '|');
    let path = fields.next().filter(|p| !p.is_empty())?;
    let number = fields.next()?;
    let text = fields.next()?;
    let (snippet, offset) = match pattern.and_then(|p| p.find(text)) {
        Some(m) => {
            let (snippet, offset) = window_snippet(text, m.start(), m.end(), context);
            (snippet, Some(offset))
        }
        None => (text.chars().take(context * 2).collect(), None),
    };
    Some(ContentHit {
        path: PathBuf::from(path),
        snippet,
        line_number: number.trim().parse().ok(),
        offset,
    })
}

/// External searcher with native fallback / 外部搜索失败时回退
pub struct FallbackContentSearcher {
    primary: Arc<dyn ContentSearcher>,
    fallback: Arc<dyn ContentSearcher>,
}

impl FallbackContentSearcher {
    pub fn new(primary: Arc<dyn ContentSearcher>, fallback: Arc<dyn ContentSearcher>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl ContentSearcher for FallbackContentSearcher {
    fn name(&self) -> &str {
        "auto"
    }

    async fn grep_content(&self, root: &Path, query: &str) -> Result<Vec<ContentHit>, SearchError> {
        match self.primary.grep_content(root, query).await {
            Ok(hits) => Ok(hits),
            Err(e) => {
                tracing::warn!(
                    "{} content search failed ({}), falling back to {}",
                    self.primary.name(), e, self.fallback.name()
                );
                self.fallback.grep_content(root, query).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn sample_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("notebookA")).unwrap();
        fs::write(dir.path().join("notebookA/findme.md"), "# Title\nhere is findme text\nfindme again\n").unwrap();
        fs::write(dir.path().join("notebookA/other.md"), "nothing to see").unwrap();
        fs::write(dir.path().join("notebookA/findme.txt"), "findme in a non-note").unwrap();
        dir
    }

    #[test]
    fn test_sanitize_query() {
        assert_eq!(sanitize_query("  hello   world "), "hello world");
        assert_eq!(sanitize_query("a'; rm -rf / #"), "a rm -rf");
        assert_eq!(sanitize_query("$(touch x)|`id`"), "touch xid");
        assert_eq!(sanitize_query("todo.md_v2"), "todo.md_v2");
        assert_eq!(sanitize_query("会议*记录"), "会议记录");
    }

    #[test]
    fn test_escape_pattern() {
        assert_eq!(escape_pattern("todo.md"), "todo\\.md");
    }

    #[test]
    fn test_window_snippet() {
        let line = "0123456789findme0123456789";
        let (snippet, offset) = window_snippet(line, 10, 16, 3);
        assert_eq!(snippet, "789findme012");
        assert_eq!(offset, 10);

        let (snippet, _) = window_snippet("findme", 0, 6, 50);
        assert_eq!(snippet, "findme");
    }

    #[test]
    fn test_window_snippet_multibyte() {
        let line = "会议记录 findme 结束";
        let start = line.find("findme").unwrap();
        let (snippet, offset) = window_snippet(line, start, start + 6, 2);
        assert_eq!(snippet, "录 findme 结");
        assert_eq!(offset, 5);
    }

    #[test]
    fn test_parse_grep_output_unix() {
        let output = "/n/a.md\u{0}2:here is findme text\n/n/a.md\u{0}2:findme\n/n/b.md\u{0}10:FINDME\n";
        let hits = parse_grep_output(output, "findme", 50);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].path, PathBuf::from("/n/a.md"));
        assert_eq!(hits[0].snippet, "here is findme text");
        assert_eq!(hits[0].line_number, Some(2));
        assert_eq!(hits[1].line_number, Some(10));
    }

    #[test]
    fn test_parse_grep_output_windows() {
        let output = "C:\\n\\a.md|3|some text with FindMe: inside\r\n";
        let hits = parse_grep_output(output, "findme", 5);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].path, PathBuf::from("C:\\n\\a.md"));
        assert_eq!(hits[0].line_number, Some(3));
        assert_eq!(hits[0].snippet, "with FindMe: ins");
        assert_eq!(hits[0].offset, Some(15));
    }

    #[tokio::test]
    async fn test_native_grep_one_hit_per_file() {
        let dir = sample_tree();
        let hits = NativeContentSearcher::default()
            .grep_content(dir.path(), "FindMe")
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].path.ends_with("notebookA/findme.md"));
        assert_eq!(hits[0].line_number, Some(2));
        assert_eq!(hits[0].snippet, "here is findme text");
        assert_eq!(hits[0].offset, Some(8));
    }

    #[tokio::test]
    async fn test_native_grep_blank_query() {
        let dir = sample_tree();
        let hits = NativeContentSearcher::default().grep_content(dir.path(), "   ").await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_native_grep_literal_metacharacters() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.md"), "price is $5 (approx)").unwrap();
        fs::write(dir.path().join("b.md"), "price is 5 approx").unwrap();
        let hits = NativeContentSearcher::default().grep_content(dir.path(), "$5 (").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].path.ends_with("a.md"));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_external_grep_finds_content() {
        let dir = sample_tree();
        let hits = ExternalContentSearcher::default()
            .grep_content(dir.path(), "findme")
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].path.ends_with("notebookA/findme.md"));
        assert_eq!(hits[0].line_number, Some(2));
        assert!(hits[0].snippet.contains("findme"));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_external_grep_no_match_is_empty() {
        let dir = sample_tree();
        let hits = ExternalContentSearcher::default()
            .grep_content(dir.path(), "absent-term")
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_external_grep_unsafe_query_spawns_nothing() {
        let dir = sample_tree();
        let hits = ExternalContentSearcher::default()
            .grep_content(dir.path(), "';|&$`")
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    fn hit(path: &str) -> ContentHit {
        ContentHit {
            path: PathBuf::from(path),
            snippet: "findme".to_string(),
            line_number: Some(1),
            offset: None,
        }
    }

    #[test]
    fn test_grep_outcome_exit_codes() {
        let root = Path::new("/notes");
        assert_eq!(grep_outcome("grep", root, Some(0), vec![hit("/notes/a.md")], "").unwrap().len(), 1);
        assert_eq!(grep_outcome("grep", root, Some(2), vec![hit("/notes/a.md")], "denied").unwrap().len(), 1);
        assert!(matches!(
            grep_outcome("grep", root, Some(2), Vec::new(), "bad regex"),
            Err(SearchError::Invocation { phase: Phase::Content, .. })
        ));
        assert!(matches!(
            grep_outcome("grep", root, None, Vec::new(), ""),
            Err(SearchError::Invocation { .. })
        ));
    }

    #[cfg(not(windows))]
    #[test]
    fn test_grep_outcome_no_match() {
        let hits = grep_outcome("grep", Path::new("/notes"), Some(1), Vec::new(), "").unwrap();
        assert!(hits.is_empty());
    }

    struct FailingSearcher;

    #[async_trait]
    impl ContentSearcher for FailingSearcher {
        fn name(&self) -> &str {
            "failing"
        }

        async fn grep_content(&self, _root: &Path, _query: &str) -> Result<Vec<ContentHit>, SearchError> {
            Err(SearchError::invocation(Phase::Content, "grep not installed"))
        }
    }

    #[tokio::test]
    async fn test_fallback_searcher_uses_native_on_failure() {
        let dir = sample_tree();
        let searcher = FallbackContentSearcher::new(
            Arc::new(FailingSearcher),
            Arc::new(NativeContentSearcher::default()),
        );
        assert_eq!(searcher.name(), "auto");
        let hits = searcher.grep_content(dir.path(), "findme").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].path.ends_with("notebookA/findme.md"));
    }

    #[tokio::test]
    async fn test_fallback_searcher_prefers_primary() {
        let dir = sample_tree();
        let searcher = FallbackContentSearcher::new(
            Arc::new(NativeContentSearcher::default()),
            Arc::new(FailingSearcher),
        );
        let hits = searcher.grep_content(dir.path(), "nothing").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].path.ends_with("notebookA/other.md"));
    }

    #[tokio::test]
    async fn test_native_grep_collapses_whitespace() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.md"), "weekly meeting notes").unwrap();
        let hits = NativeContentSearcher::default()
            .grep_content(dir.path(), "  meeting \t  notes ")
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(sanitize_query("  meeting \t  notes "), collapse_whitespace("  meeting \t  notes "));
    }
}
