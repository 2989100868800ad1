use serde_json::Value;

use crate::error::GenerationError;
use crate::routes::quiz::model::QuizQuestion;

/// 去掉模型偶尔包裹的markdown代码栅栏
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.starts_with("```") {
        trimmed
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim()
    } else {
        trimmed
    }
}

/// 单个候选题目的结构校验
///
/// question与explanation为非空字符串，options为4个字符串，
/// correctAnswer为0..=3的整数。
pub fn is_valid_question(candidate: &Value) -> bool {
    let Some(obj) = candidate.as_object() else {
        return false;
    };

    let question_ok = obj
        .get("question")
        .and_then(Value::as_str)
        .is_some_and(|s| !s.trim().is_empty());

    let options_ok = obj
        .get("options")
        .and_then(Value::as_array)
        .is_some_and(|options| {
            options.len() == 4 && options.iter().all(|o| o.as_str().is_some())
        });

    let answer_ok = obj
        .get("correctAnswer")
        .and_then(Value::as_i64)
        .is_some_and(|i| (0..4).contains(&i));

    let explanation_ok = obj
        .get("explanation")
        .and_then(Value::as_str)
        .is_some_and(|s| !s.trim().is_empty());

    question_ok && options_ok && answer_ok && explanation_ok
}

/// 解析上游原始文本并筛出合法题目，截断到请求数量，不足不补
pub fn validate_questions(
    raw: &str,
    requested_count: usize,
) -> Result<Vec<QuizQuestion>, GenerationError> {
    let cleaned = strip_code_fences(raw);

    let parsed: Value =
        serde_json::from_str(cleaned).map_err(|_| GenerationError::MalformedResponse)?;

    let candidates = parsed
        .get("questions")
        .and_then(Value::as_array)
        .ok_or(GenerationError::InvalidStructure)?;

    let mut questions = Vec::new();
    let mut dropped = 0usize;

    for candidate in candidates {
        if !is_valid_question(candidate) {
            dropped += 1;
            continue;
        }
        match serde_json::from_value::<QuizQuestion>(candidate.clone()) {
            Ok(question) => questions.push(question),
            Err(_) => dropped += 1,
        }
    }

    if dropped > 0 {
        tracing::warn!("Dropped {} invalid question(s) from generated response", dropped);
    }

    if questions.is_empty() {
        return Err(GenerationError::NoValidQuestions);
    }

    questions.truncate(requested_count);
    Ok(questions)
}
