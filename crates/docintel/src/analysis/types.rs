use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::AnalysisError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
    Mixed,
}

impl Sentiment {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "positive" => Some(Sentiment::Positive),
            "negative" => Some(Sentiment::Negative),
            "neutral" => Some(Sentiment::Neutral),
            "mixed" => Some(Sentiment::Mixed),
            _ => None,
        }
    }
}

/// Structured outcome of analyzing one document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    pub summary: String,
    pub key_topics: Vec<String>,
    pub sentiment: Sentiment,
    pub actionable_items: Vec<String>,
}

/// Parses and shape-checks the model's reply.
///
/// A surrounding markdown code fence is tolerated. Extra keys are ignored.
pub fn parse_analysis(content: &str) -> Result<AnalysisResult, AnalysisError> {
    let body = strip_code_fence(content.trim());
    let value: Value = serde_json::from_str(body)
        .map_err(|e| AnalysisError::InvalidResponse(format!("not JSON ({})", e)))?;

    let summary = value
        .get("summary")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("summary missing"))?;
    let key_topics = string_list(&value, "key_topics")?;
    let sentiment = value
        .get("sentiment")
        .and_then(Value::as_str)
        .and_then(Sentiment::parse)
        .ok_or_else(|| invalid("sentiment invalid"))?;
    let actionable_items = string_list(&value, "actionable_items")?;

    Ok(AnalysisResult {
        summary: summary.to_string(),
        key_topics,
        sentiment,
        actionable_items,
    })
}

fn invalid(reason: &str) -> AnalysisError {
    AnalysisError::InvalidResponse(reason.to_string())
}

fn string_list(value: &Value, key: &str) -> Result<Vec<String>, AnalysisError> {
    let items = value
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| invalid(&format!("{} missing", key)))?;

    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| invalid(&format!("{} must contain only strings", key)))
        })
        .collect()
}

fn strip_code_fence(content: &str) -> &str {
    let Some(rest) = content.strip_prefix("```") else {
        return content;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
