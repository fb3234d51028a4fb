//! Relevance scorer / 相关性评分
//!
//! Scores a candidate text (file name, folder name or content snippet) against
//! the query words on a 0-100 scale. All words must be present (AND match).
//!
//! Multi-word scoring / 多词评分:
//! - base presence: 20
//! - match quality: up to 40 (exact word 40/N, substring 20/N)
//! - order bonus: 20 when matches appear in query order
//! - proximity bonus: up to 20, quadratic decay over excess spread

use regex::{Regex, RegexBuilder};

const BASE_SCORE: f64 = 20.0;
const QUALITY_SCORE: f64 = 40.0;
const ORDER_SCORE: f64 = 20.0;
const PROXIMITY_SCORE: f64 = 20.0;

const SINGLE_EXACT_SCORE: u8 = 100;
const SINGLE_SUBSTRING_SCORE: u8 = 70;

/// One located query word / 已定位的查询词
#[derive(Debug, Clone, Copy)]
struct WordMatch {
    /// Index of the word in the query / 查询中的序号
    query_index: usize,
    /// Start position in characters / 字符起始位置
    position: usize,
    /// Matched length in characters / 匹配长度
    length: usize,
    is_exact_word: bool,
}

/// Query words with their matchers compiled once / 预编译的查询匹配器
///
/// Build one per query and reuse it for every candidate.
#[derive(Debug, Clone)]
pub struct QueryMatcher {
    /// (whole word, substring) per query word / 每个词的全词与子串匹配
    matchers: Vec<(Option<Regex>, Option<Regex>)>,
}

impl QueryMatcher {
    pub fn new(words: &[String]) -> Self {
        let matchers = words
            .iter()
            .map(|word| {
                let escaped = regex::escape(word);
                (case_insensitive(&format!(r"\b{}\b", escaped)), case_insensitive(&escaped))
            })
            .collect();
        Self { matchers }
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    /// Score `text`, returns 0..=100 / 计算相关性分数
    ///
    /// Never fails: unmatched input scores 0.
    pub fn score(&self, text: &str) -> u8 {
        if self.matchers.is_empty() {
            return 0;
        }

        let mut matches = Vec::with_capacity(self.matchers.len());
        for (query_index, (exact, substring)) in self.matchers.iter().enumerate() {
            match locate(exact.as_ref(), substring.as_ref(), text) {
                Some((position, length, is_exact_word)) => matches.push(WordMatch {
                    query_index,
                    position,
                    length,
                    is_exact_word,
                }),
                None => return 0,
            }
        }

        if let [only] = matches.as_slice() {
            return if only.is_exact_word { SINGLE_EXACT_SCORE } else { SINGLE_SUBSTRING_SCORE };
        }

        let n = matches.len() as f64;
        let mut total = BASE_SCORE;

        total += matches
            .iter()
            .map(|m| if m.is_exact_word { QUALITY_SCORE / n } else { QUALITY_SCORE / 2.0 / n })
            .sum::<f64>();

        // Stable sort keeps query order for matches at the same position
        let mut by_position = matches.clone();
        by_position.sort_by_key(|m| m.position);

        if by_position.windows(2).all(|w| w[0].query_index < w[1].query_index) {
            total += ORDER_SCORE;
        }

        total += proximity_bonus(&by_position);

        total.round().clamp(0.0, 100.0) as u8
    }
}

/// Score `text` against `words`, returns 0..=100 / 计算相关性分数
///
/// Compiles the matchers on every call; use `QueryMatcher` for many candidates.
pub fn score(words: &[String], text: &str) -> u8 {
    QueryMatcher::new(words).score(text)
}

fn case_insensitive(pattern: &str) -> Option<Regex> {
    RegexBuilder::new(pattern).case_insensitive(true).build().ok()
}

/// Proximity bonus over matches sorted by position / 邻近度加分
fn proximity_bonus(sorted: &[WordMatch]) -> f64 {
    let (Some(first), Some(last)) = (sorted.first(), sorted.last()) else {
        return 0.0;
    };

    let actual_occupied_length = (last.position + last.length).saturating_sub(first.position);
    let minimum_required_length =
        sorted.iter().map(|m| m.length).sum::<usize>() + sorted.len().saturating_sub(1);
    let excess_spread = actual_occupied_length.saturating_sub(minimum_required_length);

    if excess_spread == 0 {
        return PROXIMITY_SCORE;
    }

    let normalized_excess = excess_spread as f64 / actual_occupied_length as f64;
    (PROXIMITY_SCORE * (1.0 - normalized_excess).powi(2)).max(0.0)
}

/// Locate a word case-insensitively, whole word first, then substring.
/// Returns (char position, char length, is exact word).
fn locate(exact: Option<&Regex>, substring: Option<&Regex>, text: &str) -> Option<(usize, usize, bool)> {
    if let Some(m) = exact.and_then(|re| re.find(text)) {
        return Some(to_char_span(text, m.start(), m.end(), true));
    }
    substring
        .and_then(|re| re.find(text))
        .map(|m| to_char_span(text, m.start(), m.end(), false))
}

fn to_char_span(text: &str, start: usize, end: usize, exact: bool) -> (usize, usize, bool) {
    let position = text[..start].chars().count();
    let length = text[start..end].chars().count();
    (position, length, exact)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_empty_query_scores_zero() {
        assert_eq!(score(&[], "anything at all"), 0);
        assert_eq!(score(&[], "x"), 0);
    }

    #[test]
    fn test_single_word_exact() {
        assert_eq!(score(&words(&["fox"]), "the quick fox jumps"), 100);
        assert_eq!(score(&words(&["projectx"]), "ProjectX"), 100);
        assert_eq!(score(&words(&["findme"]), "findme.md"), 100);
    }

    #[test]
    fn test_single_word_substring() {
        assert_eq!(score(&words(&["fox"]), "a foxy tale"), 70);
    }

    #[test]
    fn test_missing_word_scores_zero() {
        assert_eq!(score(&words(&["quick", "cat"]), "quick fox"), 0);
        assert_eq!(score(&words(&["wolf"]), "quick fox"), 0);
    }

    #[test]
    fn test_adjacent_in_order_scores_full() {
        assert_eq!(score(&words(&["quick", "fox"]), "quick fox"), 100);
    }

    #[test]
    fn test_out_of_order_loses_order_bonus() {
        let in_order = score(&words(&["quick", "fox"]), "quick fox");
        let reversed = score(&words(&["fox", "quick"]), "quick fox");
        assert_eq!(reversed, 80);
        assert!(reversed < in_order);
    }

    #[test]
    fn test_substring_matches_reduce_quality() {
        // base 20 + quality 20 + order 20 + proximity 20 * (1 - 2/8)^2
        assert_eq!(score(&words(&["qui", "fo"]), "quick fox"), 71);
    }

    #[test]
    fn test_spread_decays_proximity() {
        let tight = score(&words(&["quick", "fox"]), "quick fox");
        let loose = score(&words(&["quick", "fox"]), "quick brown lazy sleepy fox");
        // actual 27, minimum 9, excess 18 => 20 * (1 - 18/27)^2 = 2.22
        assert_eq!(loose, 82);
        assert!(loose < tight);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(score(&words(&["quick", "fox"]), "QUICK Fox"), 100);
    }

    #[test]
    fn test_unicode_positions_are_characters() {
        assert_eq!(score(&words(&["会议", "记录"]), "会议 记录"), 100);
    }

    #[test]
    fn test_idempotent() {
        let w = words(&["meeting", "notes"]);
        let text = "notes from the weekly meeting";
        assert_eq!(score(&w, text), score(&w, text));
    }

    #[test]
    fn test_matcher_reused_across_candidates() {
        let w = words(&["meeting", "notes"]);
        let matcher = QueryMatcher::new(&w);
        for i in 0..2_000 {
            let name = format!("entry-{i}.md");
            assert_eq!(matcher.score(&name), 0);
        }
        assert_eq!(matcher.score("meeting notes.md"), score(&w, "meeting notes.md"));
        assert_eq!(matcher.score("notes from the weekly meeting"), score(&w, "notes from the weekly meeting"));
        assert!(QueryMatcher::new(&[]).is_empty());
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        assert_eq!(score(&words(&["c++"]), "learning c++ today"), 70);
        assert_eq!(score(&words(&["a.b"]), "axb"), 0);
    }
}
