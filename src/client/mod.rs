//! Client-side search: debounced queries, stale-response protection and
//! lazily expanded folder results / 客户端搜索

pub mod aggregator;
pub mod backend;
pub mod view;

pub use aggregator::{AggregatorConfig, AggregatorHandle, SearchAggregator};
pub use backend::{ClientError, HttpSearchBackend, SearchBackend};
pub use view::{ResultNode, SearchStatus, SearchView};
