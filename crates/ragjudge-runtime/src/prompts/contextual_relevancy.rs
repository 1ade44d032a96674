//! Contextual relevancy prompts.

use super::{json_list, numbered};

/// Reply: `{"verdicts": [...]}` with one verdict per retrieval context.
pub fn generate_verdicts(query: &str, retrieval_context: &[String]) -> String {
    let count = retrieval_context.len();
    let contexts = numbered(retrieval_context);
    format!(
        r#"Judge whether each retrieval context below is relevant to the query.

Answer "yes" when the context contains information useful for answering the
query and "no" otherwise. Give a reason for every "no" that quotes the
irrelevant part.

Query:
{query}

Retrieval contexts:
{contexts}

Return exactly {count} verdicts, one per context, in the same order.
Return JSON only, in this form:
{{"verdicts": [{{"verdict": "yes", "reason": "..."}}]}}"#
    )
}

/// Reply: `{"reason": "..."}`
pub fn generate_reason(query: &str, irrelevancies: &[String], score: f64) -> String {
    let irrelevancies = json_list(irrelevancies);
    format!(
        r#"Explain the contextual relevancy score of {score:.2} for the query below.

Query:
{query}

Reasons some contexts were irrelevant:
{irrelevancies}

Return JSON only, in this form:
{{"reason": "..."}}"#
    )
}
