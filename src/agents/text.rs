//! 生成文本的大小写修正
//!
//! 句首大写、独立的 i 及其缩写（i'm / i've / i'll / i'd / i're）大写、AI 缩写大写、全文首字母大写。

use std::sync::OnceLock;

use regex::Regex;

struct Patterns {
    sentence_start: Regex,
    standalone_i: Regex,
    i_contraction: Regex,
    ai: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        sentence_start: Regex::new(r"([.!?]\s+)(\p{Ll})").expect("static regex"),
        standalone_i: Regex::new(r"\bi\b").expect("static regex"),
        i_contraction: Regex::new(r"(?i)\bi'(ve|m|ll|d|re)\b").expect("static regex"),
        ai: Regex::new(r"(?i)\bai\b").expect("static regex"),
    })
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn fix_capitalization(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let p = patterns();
    let text = p
        .sentence_start
        .replace_all(text, |caps: &regex::Captures| {
            format!("{}{}", &caps[1], caps[2].to_uppercase())
        });
    let text = p.standalone_i.replace_all(&text, "I");
    let text = p.i_contraction.replace_all(&text, "I'$1");
    let text = p.ai.replace_all(&text, "AI");
    capitalize_first(&text)
}
