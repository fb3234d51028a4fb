//! Search data model / 搜索数据模型

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Filesystem entry kind reported by walkers / 文件系统条目类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Dir,
}

/// One entry under the notes root (absolute path) / 笔记根目录下的条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    pub kind: EntryKind,
    pub path: PathBuf,
}

/// First content match inside one markdown file / 文件内容匹配
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentHit {
    /// Absolute file path / 文件绝对路径
    pub path: PathBuf,
    /// Match with up to `snippet_context` characters on each side / 上下文片段
    pub snippet: String,
    /// 1-based line number / 行号（从1开始）
    pub line_number: Option<u64>,
    /// Character offset of the match within its line / 行内偏移
    pub offset: Option<usize>,
}

/// Kind of match a result came from / 匹配类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Note,
    Folder,
    Content,
}

/// Scored search result (wire shape) / 带分数的搜索结果
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredResult {
    /// Path segments excluding the base name / 所在笔记本路径
    pub notebook: Vec<String>,
    /// Base file or folder name / 文件或文件夹名
    pub name: String,
    pub match_type: MatchType,
    pub snippet: String,
    /// 0-100, higher is more relevant / 相关性分数
    pub score: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_num: Option<u64>,
}

impl ScoredResult {
    /// Full relative path segments (notebook + name) / 完整相对路径
    pub fn segments(&self) -> Vec<String> {
        let mut segments = self.notebook.clone();
        segments.push(self.name.clone());
        segments
    }
}

/// Split `path` relative to `root` into (notebook, name) / 拆分相对路径
///
/// Returns None for the root itself or paths outside the root.
pub fn split_relative(root: &Path, path: &Path) -> Option<(Vec<String>, String)> {
    let relative = path.strip_prefix(root).ok()?;
    let mut segments: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            std::path::Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    let name = segments.pop()?;
    Some((segments, name))
}
