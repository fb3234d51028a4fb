use serde::Deserialize;

/// Search query string / 搜索参数
///
/// `q` stays optional so a missing parameter maps to a 400 with our own
/// message instead of axum's rejection text.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: Option<String>,
}
