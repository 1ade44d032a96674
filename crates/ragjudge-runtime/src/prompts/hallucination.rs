//! Hallucination prompts.

use super::{json_list, numbered};

/// Reply: `{"verdicts": [...]}` with one verdict per context.
///
/// "yes" means the response agrees with the context; "no" means it contradicts it.
pub fn generate_verdicts(response: &str, contexts: &[String]) -> String {
    let count = contexts.len();
    let contexts = numbered(contexts);
    format!(
        r#"Judge whether the response agrees with each context below.

Answer "yes" when the response agrees with the context and "no" when it
contradicts the context. Missing detail is not a contradiction. Give a reason
for every verdict.

Response:
{response}

Contexts:
{contexts}

Return exactly {count} verdicts, one per context, in the same order.
Return JSON only, in this form:
{{"verdicts": [{{"verdict": "yes", "reason": "..."}}]}}"#
    )
}

/// Reply: `{"reason": "..."}`
pub fn generate_reason(factual_alignments: &[String], contradictions: &[String], score: f64) -> String {
    let alignments = json_list(factual_alignments);
    let contradictions = json_list(contradictions);
    format!(
        r#"Explain the hallucination score of {score:.2}; a lower score is better.

Where the response agrees with its contexts:
{alignments}

Where the response contradicts its contexts:
{contradictions}

Return JSON only, in this form:
{{"reason": "..."}}"#
    )
}
