//! G-Eval rubric prompts.

use super::numbered;

/// The eight criteria of the RAG rubric, one point each.
pub const RAG_CRITERIA: &[&str] = &[
    "Retrieval Quality: The retrieved documents or snippets should be relevant and accurate.",
    "Integration: The retrieved information should be well integrated into the generated response.",
    "Coherence: The text should be logically structured and easy to follow.",
    "Relevance: The text should be relevant to the main topic and cover all key points.",
    "Accuracy: The text should be factually accurate and consistent with the source material.",
    "Fluency: The text should be easy to read and free from grammatical errors.",
    "Comprehensiveness: The text should cover all key points and provide a thorough response.",
    "Contextuality: The response should fit well within the context of the query.",
];

/// Reply: `{"steps": [...]}`
pub fn generate_evaluation_steps(parameters: &str, criteria: &[&str]) -> String {
    let criteria = numbered(criteria);
    format!(
        r#"Write the evaluation steps a careful grader should follow for the task below.

Task being evaluated: {parameters}

Criteria:
{criteria}

Write three to five concise steps that together cover every criterion.

Return JSON only, in this form:
{{"steps": ["step one", "step two"]}}"#
    )
}

/// Reply: `{"score": 0-8, "reason": "..."}`
///
/// `fields` are (label, text) pairs; empty texts are still listed so the judge
/// sees that the field was absent.
pub fn generate_evaluation_results(steps: &[String], fields: &[(&str, &str)], parameters: &str) -> String {
    let steps = numbered(steps);
    let fields = fields
        .iter()
        .map(|(label, text)| format!("{}:\n{}", label, text))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!(
        r#"Score the LLM response using the evaluation steps below.

Task being evaluated: {parameters}

Evaluation steps:
{steps}

{fields}

Award one point for each of the eight criteria the response satisfies, for a
score from 0 to 8. Give a reason that names the criteria it missed.

Return JSON only, in this form:
{{"score": 0, "reason": "..."}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eight_criteria() {
        assert_eq!(RAG_CRITERIA.len(), 8);
        let prompt = generate_evaluation_steps("Rag Pipeline", RAG_CRITERIA);
        assert!(prompt.contains("8. Contextuality"));
        assert!(prompt.contains("Rag Pipeline"));
        assert!(prompt.contains(r#"{"steps": ["#));
    }

    #[test]
    fn test_results_prompt_lists_fields() {
        let prompt = generate_evaluation_results(
            &["Check retrieval".to_string()],
            &[("Query", "What is Rust?"), ("Ground truth", "")],
            "Rag Pipeline",
        );
        assert!(prompt.contains("1. Check retrieval"));
        assert!(prompt.contains("Query:\nWhat is Rust?"));
        assert!(prompt.contains("Ground truth:\n"));
        assert!(prompt.contains(r#"{"score": 0, "reason": "..."}"#));
    }
}
