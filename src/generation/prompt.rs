use chrono::Utc;
use rand::Rng;
use uuid::Uuid;

/// 每次调用随机抖动的采样参数，降低重复生成的相似度
#[derive(Debug, Clone, Copy)]
pub struct SamplingParams {
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: u32,
    pub presence_penalty: f64,
    pub frequency_penalty: f64,
}

pub fn sampling_params<R: Rng>(rng: &mut R) -> SamplingParams {
    SamplingParams {
        temperature: rng.gen_range(0.7..1.0),
        top_p: rng.gen_range(0.9..1.0),
        max_tokens: 4000,
        presence_penalty: 0.3,
        frequency_penalty: 0.5,
    }
}

#[derive(Debug, Clone)]
pub struct Prompts {
    pub system: String,
    pub user: String,
}

/// 组装系统/用户提示词
///
/// 会话nonce（随机token+时间戳）写进系统提示词，提示模型本次是新会话，
/// 不要重复以前的输出。这只是引导，没有机制校验模型真的不重复。
pub fn build_prompts(content: &str, topic: &str, count: usize) -> Prompts {
    let nonce = format!(
        "{}-{}",
        Uuid::new_v4().simple(),
        Utc::now().timestamp_millis()
    );

    let system = format!(
        r#"You are an expert quiz generator that creates high-quality, focused questions from academic or professional documents.

SESSION ID: {nonce} (Generate completely NEW and DIFFERENT questions each time - never repeat previous questions)

IMPORTANT: Return ONLY a valid JSON object with this exact structure (no additional text, markdown, or formatting):

{{
  "questions": [
    {{
      "question": "question text here",
      "options": ["option1", "option2", "option3", "option4"],
      "correctAnswer": 0,
      "explanation": "explanation text here"
    }}
  ]
}}

CONTENT ANALYSIS RULES:
1. Identify the most important concepts, theories, facts, and key information from the text
2. Focus on substantive content: definitions, processes, relationships, causes and effects, significant details
3. Ignore headers, footers, page numbers, references, author names, and publication details
4. Skip trivial details like formatting or citation styles

QUESTION REQUIREMENTS:
- Generate exactly {count} UNIQUE and VARIED multiple choice questions
- Each question must approach the content from a DIFFERENT ANGLE
- Use different question types: definition, application, analysis, comparison, cause-effect, example-based
- Each question must have exactly 4 options with one clearly correct answer
- correctAnswer is the index (0-3) of the correct option
- Test understanding, not memorization of trivial details
- Make distractors plausible but clearly incorrect to someone who understands the material
- Provide clear, educational explanations that reinforce learning
- NEVER repeat questions from previous generations

TOPIC FOCUS: Create questions specifically related to "{topic}". Only generate questions that are directly relevant to this topic based on the content in the document. If the document doesn't contain sufficient information about "{topic}", focus on the most relevant content available and relate it to the topic. Use different aspects and subtopics within "{topic}" for variety."#
    );

    let user = format!(
        "Generate {count} high-quality, DIVERSE quiz questions from this content. \
         Make each question unique and focus on different aspects:\n\n{content}"
    );

    Prompts { system, user }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn sampling_params_stay_within_jitter_bands() {
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..100 {
            let params = sampling_params(&mut rng);
            assert!((0.7..1.0).contains(&params.temperature));
            assert!((0.9..1.0).contains(&params.top_p));
            assert_eq!(params.max_tokens, 4000);
        }
    }

    #[test]
    fn prompts_embed_topic_count_and_content() {
        let prompts = build_prompts("The cell membrane is selectively permeable.", "Biology", 5);

        assert!(prompts.system.contains("\"Biology\""));
        assert!(prompts.system.contains("exactly 5"));
        assert!(prompts.user.contains("Generate 5"));
        assert!(prompts.user.contains("selectively permeable"));
    }

    #[test]
    fn consecutive_builds_use_distinct_nonces() {
        let a = build_prompts("content", "topic", 3);
        let b = build_prompts("content", "topic", 3);

        let nonce = |s: &str| {
            s.lines()
                .find(|l| l.starts_with("SESSION ID:"))
                .map(str::to_string)
        };
        assert_ne!(nonce(&a.system), nonce(&b.system));
    }
}
