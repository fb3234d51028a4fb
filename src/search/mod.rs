//! Search module - note name and content search / 搜索模块
//!
//! Pipeline / 流程：
//! query -> tokenizer -> walker + content searcher (candidates)
//!       -> scorer -> ranker -> result set
//!
//! Search features / 搜索特性：
//! - Multilingual tokenization (jieba for CJK) / 多语言分词
//! - 0-100 relevance scores comparable for sorting across match types
//! - Native in-process backend, optional external find/grep backend
//! - No index: every query walks the notes root / 无索引，每次查询遍历目录

pub mod content;
pub mod engine;
pub mod error;
pub mod process;
pub mod ranker;
pub mod schema;
pub mod scorer;
pub mod tokenizer;
pub mod walker;

pub use content::{ContentSearcher, ExternalContentSearcher, FallbackContentSearcher, NativeContentSearcher};
pub use engine::{NoteSearcher, SearchEndpoint};
pub use error::{Phase, SearchError};
pub use ranker::MergeStrategy;
pub use schema::{ContentHit, EntryKind, MatchType, ScoredResult, WalkEntry};
pub use scorer::{score, QueryMatcher};
pub use tokenizer::tokenize;
pub use walker::{DirectoryWalker, ExternalWalker, FallbackWalker, NativeWalker};
