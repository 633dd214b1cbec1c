//! Prompt text sent to the generator, and the parsing of what comes back.

use serde_json::{Map, Value};

use crate::contract::ResponseContract;

const MAX_QUESTIONS: usize = 2;
const MAX_QUESTION_WORDS: usize = 20;
const BANNED_QUESTION_TERMS: [&str; 3] = ["why", "feel", "emotion"];

pub fn contract_prompt(contract: &ResponseContract) -> String {
    let clarifications = serde_json::to_string_pretty(&contract.input_context.clarifications)
        .unwrap_or_else(|_| "{}".to_string());
    let voice = serde_json::to_string_pretty(&contract.voice_constraints)
        .unwrap_or_else(|_| "{}".to_string());
    let principles = contract
        .psychology_constraints
        .principles
        .iter()
        .map(|p| format!("- {}", p))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are refining a customer-facing response.

IMPORTANT RULES:
- Do NOT change strategy
- Do NOT invent policies, refunds, or promises
- Do NOT remove required structure
- Follow the constraints exactly

---

CONTEXT:
Customer message:
"""{message}"""

Empathy summary:
{empathy}

Clarifications:
{clarifications}

User intent:
{intent}

---

RESPONSE STRUCTURE (MANDATORY):
{structure}

---

PSYCHOLOGICAL CONSTRAINTS:
{principles}

---

VOICE CONSTRAINTS:
{voice}

---

Write a single, natural response that satisfies all of the above.
Do not label sections.
Do not mention analysis."#,
        message = contract.input_context.customer_message,
        empathy = contract.input_context.empathy_summary,
        intent = contract.input_context.user_intent,
        structure = contract.structure_outline(),
    )
}

pub fn instruction_prompt(instruction_block: &str, max_words: usize) -> String {
    format!(
        "You are a language refiner.\n\n\
         Rewrite the instruction below into a customer-facing reply.\n\n\
         RULES:\n\
         - Do NOT add new ideas\n\
         - Do NOT change intent or tone\n\
         - Do NOT add promises, policies, or guarantees\n\
         - Do NOT exceed {max_words} words\n\
         - Preserve emotional stance exactly\n\n\
         Return ONLY the final reply.\n\n\
         INSTRUCTION:\n{instruction_block}"
    )
}

pub fn questions_prompt(customer_message: &str, persona: &str) -> String {
    format!(
        r#"You are helping draft a professional response.

Given the customer message below, suggest up to TWO clarification questions
that would materially help draft a better response.

RULES:
- Ask only factual or constraint-related questions
- Do NOT ask about emotions
- Do NOT ask "why" questions
- Do NOT suggest solutions
- Do NOT exceed two questions
- Questions must be short and neutral

Persona: {persona}

Customer message:
"""{customer_message}"""

Return only the questions, each on a new line."#
    )
}

pub fn simulation_prompt(customer_message: &str, drafted_response: &str, persona: &str) -> String {
    format!(
        r#"You are simulating a possible next customer reply.

CONTEXT:
Original customer message:
"""{customer_message}"""

Drafted response:
"""{drafted_response}"""

Persona: {persona}

TASK:
- Predict one plausible next customer reply
- Keep it realistic and concise
- Reflect emotional direction (improving, neutral, or worsening)

OUTPUT FORMAT (JSON ONLY):
{{
  "simulated_reply": "...",
  "emotional_direction": "improving | neutral | worsening"
}}

Do not explain your reasoning."#
    )
}

pub fn voice_analysis_prompt(samples: &[String]) -> String {
    let joined = samples.join("\n\n---\n\n");
    format!(
        r#"You are analyzing writing style.

TASK:
Extract stable writing style traits from the samples below.
Summarize them as constraints, not examples.

RULES:
- Do NOT rewrite or improve the text
- Do NOT invent traits not supported by the samples
- Do NOT quote sentences from the samples
- Keep traits behavioural and high-level
- Use clear, neutral language

Return the result strictly as JSON with keys such as:
tone, formality, sentence_length, directness, apology_tendency,
warmth, closing_style

WRITING SAMPLES:
"""{joined}""""#
    )
}

/// Lines ending in `?`, with list bullets stripped.
pub fn extract_questions(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.trim_matches(|c: char| c == '-' || c == '•' || c == '*' || c.is_whitespace()))
        .filter(|line| line.ends_with('?'))
        .map(str::to_string)
        .collect()
}

/// Drops long or emotional questions and keeps at most two.
pub fn filter_questions(questions: Vec<String>) -> Vec<String> {
    questions
        .into_iter()
        .filter(|q| q.split_whitespace().count() <= MAX_QUESTION_WORDS)
        .filter(|q| {
            let lowered = q.to_lowercase();
            !BANNED_QUESTION_TERMS.iter().any(|term| lowered.contains(term))
        })
        .take(MAX_QUESTIONS)
        .collect()
}

/// Parses the span from the first `{` to the last `}` as a JSON object.
pub fn extract_json_object(text: &str) -> Option<Map<String, Value>> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }

    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(Value::Object(object)) => Some(object),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_questions_strips_bullets() {
        let raw = "Here are some questions:\n- Which plan are you on?\n• When did this start?\nThanks";
        assert_eq!(
            extract_questions(raw),
            vec![
                "Which plan are you on?".to_string(),
                "When did this start?".to_string()
            ]
        );
    }

    #[test]
    fn test_filter_questions() {
        let questions = vec![
            "Why did you cancel?".to_string(),
            "How do you feel about the product?".to_string(),
            "Which browser are you using?".to_string(),
            "Could you please tell me every single step that you took before the error first appeared on the screen this time?"
                .to_string(),
            "What is your account email?".to_string(),
            "When did the issue start?".to_string(),
        ];

        assert_eq!(
            filter_questions(questions),
            vec![
                "Which browser are you using?".to_string(),
                "What is your account email?".to_string()
            ]
        );
    }

    #[test]
    fn test_extract_json_object() {
        let raw = "Sure!\n```json\n{\"simulated_reply\": \"ok\", \"emotional_direction\": \"neutral\"}\n```";
        let object = extract_json_object(raw).unwrap();
        assert_eq!(object["emotional_direction"], "neutral");

        assert!(extract_json_object("no json here").is_none());
        assert!(extract_json_object("} backwards {").is_none());
        assert!(extract_json_object("{not: valid}").is_none());
    }

    #[test]
    fn test_simulation_prompt_keeps_literal_braces() {
        let prompt = simulation_prompt("hi", "hello", "support");
        assert!(prompt.contains("\"simulated_reply\": \"...\""));
        assert!(prompt.contains("Persona: support"));
    }
}
