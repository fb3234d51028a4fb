//! Search error types / 搜索错误类型

use std::fmt;
use thiserror::Error;

/// Search phase / 搜索阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// File and folder name matching / 名称匹配
    Name,
    /// Markdown content matching / 内容匹配
    Content,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Name => f.write_str("name"),
            Phase::Content => f.write_str("content"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SearchError {
    /// Missing or blank query, user-correctable / 查询为空
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Directory walk or content grep failed / 搜索调用失败
    #[error("{phase} search failed: {message}")]
    Invocation { phase: Phase, message: String },

    #[error("permission denied")]
    Forbidden,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SearchError {
    pub fn invocation(phase: Phase, message: impl Into<String>) -> Self {
        SearchError::Invocation { phase, message: message.into() }
    }

    /// Attach a phase to an error raised below the phase boundary / 标记失败阶段
    pub fn in_phase(self, phase: Phase) -> Self {
        match self {
            SearchError::Io(e) => SearchError::invocation(phase, e.to_string()),
            SearchError::Invocation { message, .. } => SearchError::Invocation { phase, message },
            other => other,
        }
    }
}
