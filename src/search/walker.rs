//! Directory walkers for name search / 名称搜索的目录遍历
//!
//! - `NativeWalker`: in-process recursive walk (walkdir), portable, default
//! - `ExternalWalker`: `find` on Unix, PowerShell on Windows, for very large trees
//! - `FallbackWalker`: external first, native when the tool fails

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use super::error::{Phase, SearchError};
use super::process::{self, ProcessError, ProcessLimits};
use super::schema::{EntryKind, WalkEntry};

/// Enumerates every file and directory under a root / 枚举根目录下所有条目
#[async_trait]
pub trait DirectoryWalker: Send + Sync {
    fn name(&self) -> &str;

    /// All entries below `root`, root excluded / 不包含根目录本身
    async fn list_all_entries(&self, root: &Path) -> Result<Vec<WalkEntry>, SearchError>;
}

/// In-process recursive walker / 进程内遍历
#[derive(Debug, Clone, Default)]
pub struct NativeWalker;

#[async_trait]
impl DirectoryWalker for NativeWalker {
    fn name(&self) -> &str {
        "native"
    }

    async fn list_all_entries(&self, root: &Path) -> Result<Vec<WalkEntry>, SearchError> {
        let root = root.to_path_buf();
        tokio::task::spawn_blocking(move || walk_native(&root))
            .await
            .map_err(|e| SearchError::invocation(Phase::Name, format!("walk task failed: {}", e)))?
    }
}

fn walk_native(root: &Path) -> Result<Vec<WalkEntry>, SearchError> {
    if !root.is_dir() {
        return Err(SearchError::invocation(
            Phase::Name,
            format!("notes root is not a directory: {}", root.display()),
        ));
    }

    let mut entries = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                // Unreadable entries are skipped / 跳过无法读取的条目
                tracing::debug!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        let file_type = entry.file_type();
        let kind = if file_type.is_dir() {
            EntryKind::Dir
        } else if file_type.is_file() {
            EntryKind::File
        } else {
            continue;
        };
        entries.push(WalkEntry { kind, path: entry.into_path() });
    }

    Ok(entries)
}

/// Walker backed by an external command / 外部命令遍历
#[derive(Debug, Clone, Default)]
pub struct ExternalWalker {
    limits: ProcessLimits,
}

impl ExternalWalker {
    pub fn new(limits: ProcessLimits) -> Self {
        Self { limits }
    }
}

#[async_trait]
impl DirectoryWalker for ExternalWalker {
    fn name(&self) -> &str {
        "external"
    }

    async fn list_all_entries(&self, root: &Path) -> Result<Vec<WalkEntry>, SearchError> {
        let (program, args) = walk_command(root);
        let output = process::run(program, &args, self.limits)
            .await
            .map_err(|e| process_failure(Phase::Name, e))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let entries = parse_walk_output(&stdout, WALK_DELIMITER);

        match output.code {
            Some(0) => Ok(entries),
            // Permission errors on some subdirectories still yield usable output
            Some(code) if !entries.is_empty() => {
                tracing::warn!(
                    "{} exited with {} while walking {}, keeping {} entries: {}",
                    program, code, root.display(), entries.len(), output.stderr.trim()
                );
                Ok(entries)
            }
            code => Err(SearchError::invocation(
                Phase::Name,
                format!("{} exited with {:?}: {}", program, code, output.stderr.trim()),
            )),
        }
    }
}

#[cfg(not(windows))]
const WALK_DELIMITER: char = '\t';
#[cfg(windows)]
const WALK_DELIMITER: char = '|';

#[cfg(not(windows))]
fn walk_command(root: &Path) -> (&'static str, Vec<String>) {
    let mut args = vec![root.to_string_lossy().into_owned()];
    args.extend(
        [
            "-mindepth", "1",
            "(", "-type", "d", "-printf", "d\t%p\n", ")",
            "-o",
            "(", "-type", "f", "-printf", "f\t%p\n", ")",
        ]
        .iter()
        .map(|s| s.to_string()),
    );
    ("find", args)
}

#[cfg(windows)]
fn walk_command(root: &Path) -> (&'static str, Vec<String>) {
    let script = format!(
        "Get-ChildItem -LiteralPath {} -Recurse -Force -ErrorAction SilentlyContinue | \
         ForEach-Object {{ if ($_.PSIsContainer) {{ 'd|' + $_.FullName }} else {{ 'f|' + $_.FullName }} }}",
        powershell_quote(&root.to_string_lossy())
    );
    ("powershell", powershell_args(script))
}

/// Parse `kind<delim>path` lines / 解析遍历输出
pub fn parse_walk_output(output: &str, delimiter: char) -> Vec<WalkEntry> {
    output
        .lines()
        .filter_map(|line| {
            let line = line.trim_end_matches('\r');
            let (kind, path) = line.split_once(delimiter)?;
            let kind = match kind {
                "d" => EntryKind::Dir,
                "f" => EntryKind::File,
                _ => return None,
            };
            if path.is_empty() {
                return None;
            }
            Some(WalkEntry { kind, path: PathBuf::from(path) })
        })
        .collect()
}

/// External walker with native fallback / 外部遍历失败时回退到进程内遍历
pub struct FallbackWalker {
    primary: Arc<dyn DirectoryWalker>,
    fallback: Arc<dyn DirectoryWalker>,
}

impl FallbackWalker {
    pub fn new(primary: Arc<dyn DirectoryWalker>, fallback: Arc<dyn DirectoryWalker>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl DirectoryWalker for FallbackWalker {
    fn name(&self) -> &str {
        "auto"
    }

    async fn list_all_entries(&self, root: &Path) -> Result<Vec<WalkEntry>, SearchError> {
        match self.primary.list_all_entries(root).await {
            Ok(entries) => Ok(entries),
            Err(e) => {
                tracing::warn!(
                    "{} walker failed ({}), falling back to {}",
                    self.primary.name(), e, self.fallback.name()
                );
                self.fallback.list_all_entries(root).await
            }
        }
    }
}

pub(crate) fn process_failure(phase: Phase, e: ProcessError) -> SearchError {
    SearchError::invocation(phase, e.to_string())
}

/// Single-quote a PowerShell literal / PowerShell 单引号转义
#[cfg_attr(not(windows), allow(dead_code))]
pub(crate) fn powershell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg_attr(not(windows), allow(dead_code))]
pub(crate) fn powershell_args(script: String) -> Vec<String> {
    vec![
        "-NoProfile".to_string(),
        "-NonInteractive".to_string(),
        "-Command".to_string(),
        script,
    ]
}
