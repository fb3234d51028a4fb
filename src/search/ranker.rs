//! Result ranking and merging / 结果排序与合并

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::schema::ScoredResult;

/// How name and content results are combined / 名称结果与内容结果的合并方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// One list re-sorted by score and capped / 统一按分数排序并截断
    Ranked,
    /// Name results first, then content results, each capped separately,
    /// no re-sort across phases / 名称结果在前，不跨阶段重新排序
    NamesFirst,
}

/// Rank one phase: drop zero scores, dedupe, sort descending, truncate.
pub fn rank_phase(results: Vec<ScoredResult>, cap: usize) -> Vec<ScoredResult> {
    let mut ranked = dedupe(results.into_iter().filter(|r| r.score > 0));
    sort_by_score(&mut ranked);
    ranked.truncate(cap);
    ranked
}

/// Merge ranked phases into the final result set / 合并两阶段结果
pub fn merge(
    name_results: Vec<ScoredResult>,
    content_results: Vec<ScoredResult>,
    strategy: MergeStrategy,
    max_results: usize,
) -> Vec<ScoredResult> {
    match strategy {
        MergeStrategy::Ranked => {
            let mut merged = dedupe(name_results.into_iter().chain(content_results));
            sort_by_score(&mut merged);
            merged.truncate(max_results);
            merged
        }
        MergeStrategy::NamesFirst => {
            let mut merged = name_results;
            merged.truncate(max_results);
            merged.extend(content_results.into_iter().take(max_results));
            dedupe(merged)
        }
    }
}

/// Remove structurally identical results, first occurrence wins / 去重
fn dedupe(results: impl IntoIterator<Item = ScoredResult>) -> Vec<ScoredResult> {
    let mut seen = HashSet::new();
    results
        .into_iter()
        .filter(|r| seen.insert(r.clone()))
        .collect()
}

/// Stable, so equal scores keep discovery order / 稳定排序
fn sort_by_score(results: &mut [ScoredResult]) {
    results.sort_by(|a, b| b.score.cmp(&a.score));
}
