use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tower_cookies::Cookies;

use crate::api::ApiError;
use crate::auth::{get_user_context, Action, Decision};
use crate::i18n::{NOTEBOOK_INVALID_PATH, NOTEBOOK_NOT_FOUND, SEARCH_FAILED, SEARCH_FORBIDDEN};
use crate::state::AppState;
use crate::storage::{NoteKind, NotebookEntry};
use crate::utils::{has_extension, is_hidden_name, notebook_segments};

#[derive(Debug, Default, Deserialize)]
pub struct NotebookQuery {
    #[serde(default)]
    pub path: Option<String>,
}

/// GET /api/notebooks?path= - direct children of a notebook / 列出笔记本子条目
///
/// Used by the client to expand folder search results lazily.
pub async fn list_notebook(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Query(query): Query<NotebookQuery>,
) -> Result<Json<Vec<NotebookEntry>>, ApiError> {
    let t = &state.translator;
    let raw_path = query.path.unwrap_or_default();

    let user = get_user_context(&cookies);
    if state.authorizer.authorize(&user, Action::ListNotebook).await == Decision::Deny {
        return Err(ApiError::new(StatusCode::FORBIDDEN, t.translate(SEARCH_FORBIDDEN, &[])));
    }

    let segments = notebook_segments(&raw_path).map_err(|e| {
        tracing::debug!("Rejected notebook path {:?}: {}", raw_path, e);
        ApiError::new(StatusCode::BAD_REQUEST, t.translate(NOTEBOOK_INVALID_PATH, &[("path", &raw_path)]))
    })?;
    let include_hidden = state.config.notes.include_hidden;
    if !include_hidden && segments.iter().any(|s| is_hidden_name(s)) {
        return Err(ApiError::new(StatusCode::NOT_FOUND, t.translate(NOTEBOOK_NOT_FOUND, &[("path", &raw_path)])));
    }
    let path = segments.join("/");

    let not_found = || ApiError::new(StatusCode::NOT_FOUND, t.translate(NOTEBOOK_NOT_FOUND, &[("path", &raw_path)]));
    let internal = |e: anyhow::Error| {
        if is_not_found(&e) {
            return not_found();
        }
        tracing::error!("Failed to list notebook {:?} via {}: {}", path, state.store.name(), e);
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, t.translate(SEARCH_FAILED, &[]))
    };

    let meta = state.store.stat(&path).await.map_err(internal)?;
    if !meta.is_dir {
        return Err(not_found());
    }
    let entries = state.store.read_dir(&path).await.map_err(internal)?;

    let extensions = &state.config.notes.note_extensions;
    let children = entries
        .into_iter()
        .filter(|e| include_hidden || !is_hidden_name(&e.name))
        .filter_map(|e| {
            let kind = if e.is_dir {
                NoteKind::Folder
            } else if has_extension(Path::new(&e.name), extensions) {
                NoteKind::Note
            } else {
                return None;
            };
            Some(NotebookEntry { name: e.name, kind })
        })
        .collect();

    Ok(Json(children))
}

fn is_not_found(e: &anyhow::Error) -> bool {
    e.downcast_ref::<std::io::Error>()
        .map(|io| io.kind() == std::io::ErrorKind::NotFound)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use crate::api::router;
    use crate::config::AppConfig;
    use crate::state::AppState;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt;

    async fn get(dir: &TempDir, uri: &str) -> (StatusCode, Value) {
        let mut config = AppConfig::default();
        config.notes.root = dir.path().to_string_lossy().into_owned();
        let response = router(Arc::new(AppState::from_config(config)))
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn notes_root() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("ProjectX/specs")).unwrap();
        std::fs::create_dir_all(dir.path().join("ProjectX/.assets")).unwrap();
        std::fs::write(dir.path().join("ProjectX/plan.md"), "plan").unwrap();
        std::fs::write(dir.path().join("ProjectX/diagram.png"), "png").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_list_notebook_children() {
        let dir = notes_root();
        let (status, body) = get(&dir, "/api/notebooks?path=ProjectX").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([
                {"name": "specs", "kind": "folder"},
                {"name": "plan.md", "kind": "note"},
            ])
        );
    }

    #[tokio::test]
    async fn test_list_notebook_rejects_traversal() {
        let dir = notes_root();
        let (status, _) = get(&dir, "/api/notebooks?path=../etc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_missing_notebook() {
        let dir = notes_root();
        let (status, body) = get(&dir, "/api/notebooks?path=Nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Notebook not found: Nope");

        let (status, _) = get(&dir, "/api/notebooks?path=ProjectX/plan.md").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_root_notebook() {
        let dir = notes_root();
        let (status, body) = get(&dir, "/api/notebooks").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([{"name": "ProjectX", "kind": "folder"}]));
    }
}
