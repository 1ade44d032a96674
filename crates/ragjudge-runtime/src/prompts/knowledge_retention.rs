//! Knowledge retention prompts.

use ragjudge_core::Knowledge;

use super::{json_list, json_object};

/// Reply: `{"verdict": "yes|no|idk", "reason": "..."}`
///
/// "no" means the assistant forgot or contradicted established knowledge.
pub fn generate_verdict(knowledge: &Knowledge, query: &str, response: &str) -> String {
    let knowledge = json_object(knowledge);
    format!(
        r#"Decide whether the assistant response below is consistent with the established knowledge.

Answer "no" when the response asks again for, forgets, or contradicts something
in the established knowledge. Answer "yes" otherwise. Give a reason for "no".

Established knowledge:
{knowledge}

User message:
{query}

Assistant response:
{response}

Return JSON only, in this form:
{{"verdict": "yes", "reason": "..."}}"#
    )
}

/// Reply: `{"data": {...}}` holding facts the user revealed in this turn.
pub fn generate_knowledge(knowledge: &Knowledge, query: &str, response: &str) -> String {
    let knowledge = json_object(knowledge);
    format!(
        r#"Record the facts the user revealed in the latest exchange of the conversation.

Use short snake_case keys. Only include facts stated by the user, not by the
assistant. Reuse a key from the existing knowledge when the fact updates it.

Existing knowledge:
{knowledge}

User message:
{query}

Assistant response:
{response}

Return JSON only, in this form:
{{"data": {{"key": "value"}}}}"#
    )
}

/// Reply: `{"reason": "..."}`
pub fn generate_reason(attritions: &[String], score: f64) -> String {
    let attritions = json_list(attritions);
    format!(
        r#"Explain the knowledge retention score of {score:.2} in one or two sentences.

Turns where the assistant lost established knowledge:
{attritions}

Return JSON only, in this form:
{{"reason": "..."}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prompts_embed_knowledge() {
        let mut knowledge = Knowledge::new();
        knowledge.insert("name".to_string(), json!("Ada"));

        let verdict = generate_verdict(&knowledge, "what is my name?", "Ada");
        assert!(verdict.contains("\"name\": \"Ada\""));
        assert!(verdict.contains(r#"{"verdict": "yes", "reason": "..."}"#));

        let update = generate_knowledge(&knowledge, "I live in Oslo", "Noted");
        assert!(update.contains("I live in Oslo"));
        assert!(update.contains(r#"{"data": {"key": "value"}}"#));
    }
}
