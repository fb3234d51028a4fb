//! User-facing message translation / 用户可见消息翻译

use std::collections::HashMap;

pub const SEARCH_INVALID_QUERY: &str = "search.invalid_query";
pub const SEARCH_FAILED: &str = "search.failed";
pub const SEARCH_FORBIDDEN: &str = "search.forbidden";
pub const NOTEBOOK_INVALID_PATH: &str = "notebook.invalid_path";
pub const NOTEBOOK_NOT_FOUND: &str = "notebook.not_found";

/// Translation service / 翻译服务
pub trait Translator: Send + Sync {
    /// Translate `key`, substituting `{name}` placeholders from `params`.
    /// Unknown keys translate to themselves.
    fn translate(&self, key: &str, params: &[(&str, &str)]) -> String;
}

/// Static message catalogue / 静态消息表
pub struct CatalogTranslator {
    messages: HashMap<&'static str, &'static str>,
}

impl CatalogTranslator {
    /// English catalogue / 英文消息
    pub fn english() -> Self {
        let messages = HashMap::from([
            (SEARCH_INVALID_QUERY, "Please enter something to search for"),
            (SEARCH_FAILED, "Unable to search"),
            (SEARCH_FORBIDDEN, "You do not have permission to search"),
            (NOTEBOOK_INVALID_PATH, "Invalid notebook path: {path}"),
            (NOTEBOOK_NOT_FOUND, "Notebook not found: {path}"),
        ]);
        Self { messages }
    }
}

impl Default for CatalogTranslator {
    fn default() -> Self {
        Self::english()
    }
}

impl Translator for CatalogTranslator {
    fn translate(&self, key: &str, params: &[(&str, &str)]) -> String {
        let template = self.messages.get(key).copied().unwrap_or(key);
        params.iter().fold(template.to_string(), |text, (name, value)| {
            text.replace(&format!("{{{}}}", name), value)
        })
    }
}
