//! Prompt templates for the judge protocols.
//!
//! Each builder is a pure function returning the full instruction text for
//! one protocol step. The JSON shape each prompt asks for is the reply
//! contract parsed in `ragjudge_core::reply`; field names must stay in sync.
//!
//! The first line of every prompt is unique. Logs and test judges rely on it
//! to tell the steps apart.

pub mod answer_relevancy;
pub mod contextual_relevancy;
pub mod faithfulness;
pub mod geval;
pub mod hallucination;
pub mod knowledge_retention;

use ragjudge_core::Knowledge;

/// Render a list of strings as a JSON array, one item per line.
pub(crate) fn json_list<S: AsRef<str>>(items: &[S]) -> String {
    let items: Vec<&str> = items.iter().map(AsRef::as_ref).collect();
    serde_json::to_string_pretty(&items).unwrap_or_else(|_| "[]".to_string())
}

/// Render a numbered list, one item per line.
pub(crate) fn numbered<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, item.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn json_object(knowledge: &Knowledge) -> String {
    serde_json::to_string_pretty(knowledge).unwrap_or_else(|_| "{}".to_string())
}
