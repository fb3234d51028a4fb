/// Path processing utility functions / 路径处理工具函数

use std::path::Path;

/// Clean and normalize a notebook path / 清理和规范化笔记本路径
/// 1. Replace backslashes with forward slashes / 将反斜杠替换为正斜杠
/// 2. Ensure path starts with / / 确保路径以 / 开头
/// 3. Drop empty and `.` segments / 去除空段和 `.`
pub fn fix_and_clean_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let parts: Vec<&str> = path
        .split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .collect();

    if parts.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", parts.join("/"))
    }
}

/// Split a notebook path into segments, rejecting traversal / 拆分笔记本路径，拒绝目录穿越
pub fn notebook_segments(path: &str) -> Result<Vec<String>, String> {
    let cleaned = fix_and_clean_path(path);
    let mut segments = Vec::new();
    for part in cleaned.split('/').filter(|p| !p.is_empty()) {
        if part == ".." {
            return Err("Access path exceeds notes root".to_string());
        }
        segments.push(part.to_string());
    }
    Ok(segments)
}

/// Get file extension (lowercase) / 获取文件扩展名
pub fn get_ext(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Check whether a file has one of the extensions (case-insensitive) / 检查扩展名
pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
    let ext = get_ext(path);
    !ext.is_empty() && extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext))
}

/// Dot-prefixed names are hidden / 以点开头的名称为隐藏条目
pub fn is_hidden_name(name: &str) -> bool {
    name.starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fix_and_clean_path() {
        assert_eq!(fix_and_clean_path(""), "/");
        assert_eq!(fix_and_clean_path("a//b/./c/"), "/a/b/c");
        assert_eq!(fix_and_clean_path("a\\b"), "/a/b");
    }

    #[test]
    fn test_notebook_segments() {
        assert_eq!(notebook_segments("/work/projects").unwrap(), vec!["work", "projects"]);
        assert!(notebook_segments("/").unwrap().is_empty());
        assert!(notebook_segments("work/../../etc").is_err());
    }

    #[test]
    fn test_has_extension() {
        let exts = vec!["md".to_string()];
        assert!(has_extension(Path::new("/n/a.md"), &exts));
        assert!(has_extension(Path::new("/n/A.MD"), &exts));
        assert!(!has_extension(Path::new("/n/a.txt"), &exts));
        assert!(!has_extension(Path::new("/n/md"), &exts));
    }

    #[test]
    fn test_is_hidden_name() {
        assert!(is_hidden_name(".attachments"));
        assert!(!is_hidden_name("notes"));
    }
}
