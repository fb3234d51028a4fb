//! Query tokenizer - uses jieba-rs for CJK word segmentation / 查询分词器
//!
//! Supports / 支持：
//! - Chinese word segmentation (jieba) / 中文分词
//! - Latin words split on whitespace and punctuation / 英文按空白和标点分词
//! - Mixed text processing / 混合文本处理

use jieba_rs::Jieba;
use once_cell::sync::Lazy;

/// Global jieba tokenizer instance (immutable dictionary) / 全局 jieba 分词器实例
static JIEBA: Lazy<Jieba> = Lazy::new(Jieba::new);

/// Tokenize a search query into lowercase words / 对搜索查询进行分词
///
/// Segments without any letter or digit are dropped, order is preserved and
/// duplicates are kept. / 丢弃不含字母数字的片段，保留顺序和重复
pub fn tokenize(query: &str) -> Vec<String> {
    let mut tokens = Vec::new();

    for run in split_runs(query) {
        if run.cjk {
            // Dictionary segmentation for scripts without spaces / 无空格文字使用词典分词
            for word in JIEBA.cut(run.text, false) {
                push_token(&mut tokens, word);
            }
        } else {
            push_token(&mut tokens, run.text);
        }
    }

    tokens
}

fn push_token(tokens: &mut Vec<String>, word: &str) {
    let word = word.trim();
    if word.is_empty() || !word.chars().any(char::is_alphanumeric) {
        return;
    }
    tokens.push(word.to_lowercase());
}

/// A maximal run of word characters / 连续的单词字符
struct Run<'a> {
    text: &'a str,
    cjk: bool,
}

/// Split text into word runs, keeping CJK runs apart so jieba can segment them.
/// `'` `’` `.` join two alphanumeric characters ("don't", "3.14", "todo.md").
fn split_runs(text: &str) -> Vec<Run<'_>> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut runs = Vec::new();
    let mut start: Option<(usize, bool)> = None;

    for (i, &(offset, c)) in chars.iter().enumerate() {
        let cjk = is_cjk(c);
        let word_char = if c.is_alphanumeric() || c == '_' {
            true
        } else if matches!(c, '\'' | '’' | '.') {
            let prev = i.checked_sub(1).map(|p| chars[p].1);
            let next = chars.get(i + 1).map(|&(_, n)| n);
            matches!((prev, next), (Some(p), Some(n))
                if p.is_alphanumeric() && n.is_alphanumeric() && !is_cjk(p) && !is_cjk(n))
        } else {
            false
        };

        match (start, word_char) {
            (Some((_, run_cjk)), true) if run_cjk == cjk => {}
            (Some((run_start, run_cjk)), _) => {
                runs.push(Run { text: &text[run_start..offset], cjk: run_cjk });
                start = word_char.then_some((offset, cjk));
            }
            (None, true) => start = Some((offset, cjk)),
            (None, false) => {}
        }
    }

    if let Some((run_start, run_cjk)) = start {
        runs.push(Run { text: &text[run_start..], cjk: run_cjk });
    }

    runs
}

/// Check if a character is CJK (Chinese, Japanese, Korean) / 检测字符是否为CJK字符
pub fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{4e00}'..='\u{9fff}' |  // CJK Unified Ideographs
        '\u{3400}'..='\u{4dbf}' |  // CJK Extension A
        '\u{f900}'..='\u{faff}' |  // CJK Compatibility Ideographs
        '\u{3040}'..='\u{309f}' |  // Hiragana
        '\u{30a0}'..='\u{30ff}' |  // Katakana
        '\u{ac00}'..='\u{d7af}'    // Hangul Syllables
    )
}
