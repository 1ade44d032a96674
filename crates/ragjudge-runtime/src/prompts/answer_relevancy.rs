//! Answer relevancy prompts.

use super::json_list;

/// Reply: `{"statements": [...]}`
pub fn generate_statements(response: &str) -> String {
    format!(
        r#"Extract the standalone statements made in the response below.

Break the response into short, self-contained statements. Keep every statement
faithful to the wording of the response; do not add or infer anything.

Response:
{response}

Return JSON only, in this form:
{{"statements": ["statement one", "statement two"]}}"#
    )
}

/// Reply: `{"verdicts": [{"verdict": "yes|no|idk", "reason": "..."}]}`
///
/// The first verdict is the overall judgment; the score uses it alone.
pub fn generate_verdicts(query: &str, statements: &[String]) -> String {
    let statements = json_list(statements);
    format!(
        r#"Decide whether the statements below, taken together, answer the query.

Query:
{query}

Statements:
{statements}

Put your overall judgment first in the "verdicts" list. Use "yes" when the
statements address the query, "no" when they do not, and "idk" when the
statements are too ambiguous to tell. Give a reason for every "no".

Return JSON only, in this form:
{{"verdicts": [{{"verdict": "yes", "reason": "..."}}]}}"#
    )
}

/// Reply: `{"reason": "..."}`
pub fn generate_reason(irrelevant_statements: &[String], query: &str, score: f64) -> String {
    let irrelevant = json_list(irrelevant_statements);
    format!(
        r#"Explain the answer relevancy score of {score:.2} for the query below.

Query:
{query}

Reasons the response was judged irrelevant:
{irrelevant}

Write a short, concise reason that justifies the score. If there are no
irrelevant statements, say what the response did well.

Return JSON only, in this form:
{{"reason": "..."}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statements_prompt_names_reply_field() {
        let prompt = generate_statements("Paris is in France.");
        assert!(prompt.contains("Paris is in France."));
        assert!(prompt.contains(r#"{"statements": ["#));
    }

    #[test]
    fn test_verdicts_prompt_lists_statements() {
        let prompt = generate_verdicts("Where is Paris?", &["Paris is in France.".to_string()]);
        assert!(prompt.contains("Where is Paris?"));
        assert!(prompt.contains("\"Paris is in France.\""));
        assert!(prompt.contains(r#"{"verdicts": [{"verdict": "yes", "reason": "..."}]}"#));
    }

    #[test]
    fn test_reason_prompt_formats_score() {
        let prompt = generate_reason(&["off topic".to_string()], "q", 0.5);
        assert!(prompt.starts_with("Explain the answer relevancy score of 0.50"));
        assert!(prompt.contains("off topic"));
        assert!(prompt.contains(r#"{"reason": "..."}"#));
    }
}
