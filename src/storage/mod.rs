//! Note storage collaborator / 笔记存储接口
//!
//! Narrow read-only view of the notes root used by the notebook listing
//! endpoint. Search itself walks the root through `search::walker`.

use async_trait::async_trait;
use anyhow::Result;
use serde::{Deserialize, Serialize};

pub mod local;

pub use local::LocalNoteStore;

/// Entry kind as exposed to clients / 条目类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteKind {
    Note,
    Folder,
}

/// Notebook child as listed to clients / 笔记本子条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotebookEntry {
    pub name: String,
    pub kind: NoteKind,
}

/// Directory entry / 目录条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreEntry {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
}

/// File metadata (Unix timestamps) / 文件元数据
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteMeta {
    pub size: u64,
    pub modified: Option<i64>,
    /// Birth time, not available on every filesystem / 创建时间
    pub created: Option<i64>,
    pub is_dir: bool,
}

/// Read-only file service over the notes root / 笔记根目录只读服务
#[async_trait]
pub trait NoteStore: Send + Sync {
    fn name(&self) -> &str;

    /// Metadata for a path relative to the root / 获取元数据
    async fn stat(&self, path: &str) -> Result<NoteMeta>;

    /// Direct children of a directory / 列出目录
    async fn read_dir(&self, path: &str) -> Result<Vec<StoreEntry>>;

    /// Whole file contents / 读取文件
    async fn read_file(&self, path: &str) -> Result<Vec<u8>>;
}
