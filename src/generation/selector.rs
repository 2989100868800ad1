use once_cell::sync::Lazy;
use rand::Rng;
use rand::seq::SliceRandom;
use regex::Regex;

/// 发送给模型的节选上限（字符数）
pub const EXCERPT_CAP: usize = 8000;

const MIN_UNIT_CHARS: usize = 20;

// 模板噪声行：页码、图表标题、参考文献、版权、章节编号等
static SKIP_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"page\s+\d+",
        r"^(figure|table|chart|diagram)\s+\d+",
        r"^(references?|bibliography|citations?|acknowledgments?)",
        r"^\s*(author|editor|publisher|isbn|doi|url)",
        r"^(copyright|©|\(c\))",
        r"^(header|footer)",
        r"^(chapter|section)\s+\d+",
        r"^(january|february|march|april|may|june|july|august|september|october|november|december)\s+\d+",
        r"^\d{1,3}\s*$",
        r"^\s*[-–—]\s*$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("skip pattern regex"))
    .collect()
});

// 实质性内容的词表，话题过滤不足时兜底
const SUBSTANTIVE_KEYWORDS: &[&str] = &[
    "define",
    "definition",
    "concept",
    "theory",
    "principle",
    "method",
    "process",
    "analysis",
    "result",
    "conclusion",
    "research",
    "study",
    "experiment",
    "significant",
    "important",
    "key",
    "main",
    "primary",
    "essential",
    "cause",
    "effect",
    "relationship",
    "correlation",
    "factor",
    "influence",
    "example",
    "case",
    "instance",
    "application",
    "implementation",
    "characteristic",
    "feature",
    "property",
    "attribute",
    "function",
];

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}

fn sentence_units(text: &str) -> Vec<&str> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| s.chars().count() > MIN_UNIT_CHARS)
        .collect()
}

fn is_boilerplate(unit: &str) -> bool {
    let lowered = unit.to_lowercase();
    SKIP_PATTERNS.iter().any(|p| p.is_match(&lowered))
}

/// 把原始文本过滤为与话题相关的有界节选
///
/// 没有任何句子单元时退化为截断的原文，输出永远不超过节选上限。
pub fn extract_important_content(text: &str, topic: &str) -> String {
    let units = sentence_units(text);
    if units.is_empty() {
        return truncate_chars(text.trim(), EXCERPT_CAP);
    }

    let filtered: Vec<&str> = units
        .iter()
        .copied()
        .filter(|u| !is_boilerplate(u))
        .collect();

    let topic_keywords: Vec<String> = topic
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();

    let topic_relevant: Vec<&str> = filtered
        .iter()
        .copied()
        .filter(|u| {
            let lowered = u.to_lowercase();
            topic_keywords.iter().any(|k| lowered.contains(k))
        })
        .collect();

    if topic_relevant.len() > 10 {
        let joined = topic_relevant
            .iter()
            .take(100)
            .copied()
            .collect::<Vec<_>>()
            .join(". ");
        return truncate_chars(&joined, EXCERPT_CAP);
    }

    let important: Vec<&str> = filtered
        .iter()
        .copied()
        .filter(|u| {
            let lowered = u.to_lowercase();
            let chars = u.chars().count();
            SUBSTANTIVE_KEYWORDS.iter().any(|k| lowered.contains(k)) || (50..300).contains(&chars)
        })
        .collect();

    let selected = if !important.is_empty() {
        important
    } else if !filtered.is_empty() {
        filtered
    } else {
        units
    };

    let joined = selected
        .iter()
        .take(120)
        .copied()
        .collect::<Vec<_>>()
        .join(". ");
    truncate_chars(&joined, EXCERPT_CAP)
}

/// 从节选中随机挑选内容段落，重复调用时让模型看到不同部分
///
/// 段落多于10个时按段落乱序取15个，否则按句子乱序取100个。
pub fn randomized_content_sections<R: Rng>(text: &str, rng: &mut R) -> String {
    static PARAGRAPH_SPLIT: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\n\s*\n").expect("paragraph split regex"));

    let mut sections: Vec<&str> = PARAGRAPH_SPLIT
        .split(text)
        .map(str::trim)
        .filter(|s| s.chars().count() > 50)
        .collect();

    if sections.len() > 10 {
        sections.shuffle(rng);
        let joined = sections
            .iter()
            .take(15)
            .copied()
            .collect::<Vec<_>>()
            .join("\n\n");
        return truncate_chars(&joined, EXCERPT_CAP);
    }

    let mut sentences = sentence_units(text);
    if sentences.is_empty() {
        return truncate_chars(text.trim(), EXCERPT_CAP);
    }

    sentences.shuffle(rng);
    let joined = sentences
        .iter()
        .take(100)
        .copied()
        .collect::<Vec<_>>()
        .join(". ");
    truncate_chars(&joined, EXCERPT_CAP)
}
