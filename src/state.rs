use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::auth::{AllowAll, Authorizer};
use crate::config::AppConfig;
use crate::i18n::{CatalogTranslator, Translator};
use crate::search::NoteSearcher;
use crate::storage::{LocalNoteStore, NoteStore};

/// Shared server state, built once at startup / 服务器共享状态
pub struct AppState {
    pub config: AppConfig,
    pub searcher: NoteSearcher,
    pub store: Arc<dyn NoteStore>,
    pub authorizer: Arc<dyn Authorizer>,
    pub translator: Arc<dyn Translator>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Build state with the default collaborators / 使用默认协作者构建状态
    pub fn from_config(config: AppConfig) -> Self {
        let searcher = NoteSearcher::from_config(&config);
        let store: Arc<dyn NoteStore> = Arc::new(LocalNoteStore::new(config.get_notes_root()));
        Self {
            config,
            searcher,
            store,
            authorizer: Arc::new(AllowAll),
            translator: Arc::new(CatalogTranslator::english()),
            started_at: Utc::now(),
        }
    }

    pub fn with_authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.authorizer = authorizer;
        self
    }

    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = translator;
        self
    }
}
