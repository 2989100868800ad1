use serde::{Deserialize, Serialize};

/// 一道校验通过的选择题，只由响应校验器构造
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    pub explanation: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuizRequest {
    pub text: String,
    pub topic: String,
    #[serde(default = "default_question_count")]
    pub number_of_questions: usize,
}

fn default_question_count() -> usize {
    10
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuizResponse {
    pub questions: Vec<QuizQuestion>,
    pub total_generated: usize,
}
