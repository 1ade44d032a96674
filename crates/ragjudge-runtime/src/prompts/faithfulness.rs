//! Faithfulness prompts: claims from the response, truths from the context,
//! then one verdict per claim checked against the truths.

use super::json_list;

/// Reply: `{"claims": [...]}`
pub fn generate_claims(response: &str) -> String {
    format!(
        r#"Extract every factual claim made in the response below.

Only include claims the response states as fact. Do not use prior knowledge and
do not rephrase a claim into something the response did not say.

Response:
{response}

Return JSON only, in this form:
{{"claims": ["claim one", "claim two"]}}"#
    )
}

/// Reply: `{"truths": [...]}`
pub fn generate_truths(retrieval_context: &[String]) -> String {
    let context = json_list(retrieval_context);
    format!(
        r#"Extract every factual truth stated in the retrieval context below.

Only include facts the context states explicitly.

Retrieval context:
{context}

Return JSON only, in this form:
{{"truths": ["truth one", "truth two"]}}"#
    )
}

/// Reply: `{"verdicts": [...]}` with exactly one verdict per claim, in order.
pub fn generate_verdicts(claims: &[String], truths: &[String]) -> String {
    let count = claims.len();
    let claims = json_list(claims);
    let truths = json_list(truths);
    format!(
        r#"Check each claim against the truths below.

For each claim answer "yes" if the truths support it, "no" if the truths
contradict it, and "idk" if the truths say nothing about it. Judge only from the
truths. Give a reason for every "no".

Claims:
{claims}

Truths:
{truths}

Return exactly {count} verdicts, one per claim, in the same order.
Return JSON only, in this form:
{{"verdicts": [{{"verdict": "yes", "reason": "..."}}]}}"#
    )
}

/// Reply: `{"reason": "..."}`
pub fn generate_reason(contradictions: &[String], score: f64) -> String {
    let contradictions = json_list(contradictions);
    format!(
        r#"Explain the faithfulness score of {score:.2} in one or two sentences.

Contradictions between the response and the retrieval context:
{contradictions}

If there are no contradictions, say the response is consistent with its context.

Return JSON only, in this form:
{{"reason": "..."}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_prompt_states_arity() {
        let prompt = generate_verdicts(
            &["a".to_string(), "b".to_string()],
            &["t".to_string()],
        );
        assert!(prompt.contains("Return exactly 2 verdicts"));
        assert!(prompt.contains(r#""verdicts""#));
    }

    #[test]
    fn test_truths_prompt_includes_every_context() {
        let prompt = generate_truths(&["first doc".to_string(), "second doc".to_string()]);
        assert!(prompt.contains("first doc"));
        assert!(prompt.contains("second doc"));
        assert!(prompt.contains(r#"{"truths": ["#));
    }

    #[test]
    fn test_claims_prompt_names_reply_field() {
        assert!(generate_claims("r").contains(r#"{"claims": ["#));
    }
}
