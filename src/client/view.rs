//! Display model for client-side search / 客户端搜索展示模型

use serde::Serialize;

use crate::search::{MatchType, ScoredResult};
use crate::storage::NotebookEntry;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStatus {
    #[default]
    Idle,
    Pending,
    Success,
    Error,
}

/// One displayed result; folder nodes expand lazily / 结果节点
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultNode {
    #[serde(flatten)]
    pub result: ScoredResult,
    /// None until the folder has been expanded
    pub children: Option<Vec<NotebookEntry>>,
    pub loading: bool,
}

impl From<ScoredResult> for ResultNode {
    fn from(result: ScoredResult) -> Self {
        Self { result, children: None, loading: false }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchView {
    /// Text as typed / 输入内容
    pub query: String,
    pub status: SearchStatus,
    pub error: Option<String>,
    pub folders: Vec<ResultNode>,
    pub notes: Vec<ResultNode>,
    pub contents: Vec<ResultNode>,
}

impl SearchView {
    /// Replace displayed results, grouped by match type in server order / 替换结果
    pub fn replace_results(&mut self, results: Vec<ScoredResult>) {
        self.clear_results();
        for result in results {
            let bucket = match result.match_type {
                MatchType::Folder => &mut self.folders,
                MatchType::Note => &mut self.notes,
                MatchType::Content => &mut self.contents,
            };
            bucket.push(result.into());
        }
    }

    pub fn clear_results(&mut self) {
        self.folders.clear();
        self.notes.clear();
        self.contents.clear();
    }

    pub fn len(&self) -> usize {
        self.folders.len() + self.notes.len() + self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn folder_mut(&mut self, notebook: &[String], name: &str) -> Option<&mut ResultNode> {
        self.folders
            .iter_mut()
            .find(|node| node.result.notebook == notebook && node.result.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, match_type: MatchType, score: u8) -> ScoredResult {
        ScoredResult {
            notebook: vec!["work".to_string()],
            name: name.to_string(),
            match_type,
            snippet: String::new(),
            score,
            line_num: None,
        }
    }

    #[test]
    fn test_replace_results_partitions_in_order() {
        let mut view = SearchView::default();
        view.replace_results(vec![
            result("a.md", MatchType::Content, 90),
            result("proj", MatchType::Folder, 80),
            result("b.md", MatchType::Note, 70),
            result("c.md", MatchType::Content, 60),
        ]);
        assert_eq!(view.folders.len(), 1);
        assert_eq!(view.notes.len(), 1);
        let contents: Vec<_> = view.contents.iter().map(|n| n.result.name.as_str()).collect();
        assert_eq!(contents, vec!["a.md", "c.md"]);
        assert_eq!(view.len(), 4);

        view.replace_results(Vec::new());
        assert!(view.is_empty());
    }

    #[test]
    fn test_folder_lookup_and_wire_shape() {
        let mut view = SearchView::default();
        view.replace_results(vec![result("proj", MatchType::Folder, 100)]);
        let work = vec!["work".to_string()];
        assert!(view.folder_mut(&work, "other").is_none());
        view.folder_mut(&work, "proj").unwrap().loading = true;

        let json = serde_json::to_value(&view.folders[0]).unwrap();
        assert_eq!(json["matchType"], "folder");
        assert_eq!(json["loading"], true);
        assert!(json["children"].is_null());
        assert_eq!(serde_json::to_value(view.status).unwrap(), "idle");
    }
}
