use rand::Rng;
use serde_json::Value;

use ai_client::util::strip_code_blocks;
use tiptally_common::{ConfidenceScores, ReceiptFields};

/// Tagged outcome of parsing the model's free-form reply. The model is asked
/// for a bare JSON object but sometimes wraps it in code fences or prose;
/// parsing tries the whole reply first, then the first balanced `{...}` span.
pub enum Parsed {
    Ok(ParsedReceipt),
    Failed(String),
}

pub struct ParsedReceipt {
    pub fields: ReceiptFields,
    pub confidence: ConfidenceScores,
}

pub fn parse_response(response: &str) -> Parsed {
    let stripped = strip_code_blocks(response);

    let value = match serde_json::from_str::<Value>(stripped) {
        Ok(v) if v.is_object() => v,
        _ => {
            let Some(span) = first_json_object(stripped) else {
                return Parsed::Failed("no JSON object found in model response".to_string());
            };
            match serde_json::from_str::<Value>(span) {
                Ok(v) => v,
                Err(e) => {
                    return Parsed::Failed(format!("embedded JSON object failed to parse: {e}"))
                }
            }
        }
    };

    Parsed::Ok(coerce(&value))
}

/// Locate the first top-level `{...}` span, tracking string literals so
/// braces inside field values don't unbalance the scan.
fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

fn coerce(value: &Value) -> ParsedReceipt {
    let fields = ReceiptFields {
        merchant: text_field(value, "merchant"),
        date: text_field(value, "date"),
        time: text_field(value, "time"),
        reference_number: text_field(value, "reference_number"),
        subtotal: money_field(value, "subtotal"),
        tip: money_field(value, "tip"),
        total: money_field(value, "total"),
        payment_method: text_field(value, "payment_method"),
        names: names_field(value),
    };
    let confidence = confidence_scores(value.get("confidence"));
    ParsedReceipt { fields, confidence }
}

/// Text fields arrive as strings, but reference numbers occasionally come
/// back as bare numbers.
fn text_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn money_field(value: &Value, key: &str) -> Option<String> {
    coerce_money(value.get(key)?)
}

/// Coerce a monetary value to a two-decimal string, whatever shape the model
/// returned: bare integer, one-decimal float, or string with or without a
/// currency symbol. `5`, `"5.5"`, and `5.50` all come out as `"5.00"` /
/// `"5.50"`.
pub(crate) fn coerce_money(value: &Value) -> Option<String> {
    let amount = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let cleaned = s.trim().trim_start_matches('$').replace(',', "");
            cleaned.parse::<f64>().ok()?
        }
        _ => return None,
    };
    Some(format!("{amount:.2}"))
}

fn names_field(value: &Value) -> Vec<String> {
    match value.get("names") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

fn confidence_scores(confidence: Option<&Value>) -> ConfidenceScores {
    ConfidenceScores {
        merchant: score(confidence, "merchant"),
        date: score(confidence, "date"),
        time: score(confidence, "time"),
        reference_number: score(confidence, "reference_number"),
        subtotal: score(confidence, "subtotal"),
        tip: score(confidence, "tip"),
        total: score(confidence, "total"),
        payment_method: score(confidence, "payment_method"),
        names: score(confidence, "names"),
    }
}

fn score(confidence: Option<&Value>, key: &str) -> f64 {
    confidence
        .and_then(|c| c.get(key))
        .and_then(Value::as_f64)
        .filter(|s| (0.0..=1.0).contains(s))
        .unwrap_or_else(synthesized_confidence)
}

/// When the model omits a score, fill the high-confidence band rather than
/// signaling absence. Source-system behavior, kept intentionally.
fn synthesized_confidence() -> f64 {
    rand::rng().random_range(0.8..=1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(response: &str) -> ParsedReceipt {
        match parse_response(response) {
            Parsed::Ok(receipt) => receipt,
            Parsed::Failed(reason) => panic!("expected parse to succeed, got: {reason}"),
        }
    }

    #[test]
    fn parses_bare_json_object() {
        let receipt = parsed(r#"{"merchant": "Blue Door Diner", "tip": 8.2}"#);
        assert_eq!(receipt.fields.merchant.as_deref(), Some("Blue Door Diner"));
        assert_eq!(receipt.fields.tip.as_deref(), Some("8.20"));
    }

    #[test]
    fn parses_fenced_json() {
        let receipt = parsed("```json\n{\"merchant\": \"Cafe Rex\"}\n```");
        assert_eq!(receipt.fields.merchant.as_deref(), Some("Cafe Rex"));
    }

    #[test]
    fn parses_object_embedded_in_prose() {
        let receipt = parsed(
            "Here is the receipt data you asked for:\n\n{\"merchant\": \"Cafe Rex\", \"total\": 12}\n\nLet me know if you need anything else.",
        );
        assert_eq!(receipt.fields.merchant.as_deref(), Some("Cafe Rex"));
        assert_eq!(receipt.fields.total.as_deref(), Some("12.00"));
    }

    #[test]
    fn braces_inside_strings_do_not_unbalance_the_scan() {
        let receipt = parsed(r#"Note: {"merchant": "Curly {Brace} Cafe", "tip": 1}"#);
        assert_eq!(
            receipt.fields.merchant.as_deref(),
            Some("Curly {Brace} Cafe")
        );
    }

    #[test]
    fn garbage_fails_with_reason() {
        match parse_response("I could not read this receipt, sorry.") {
            Parsed::Failed(reason) => assert!(reason.contains("no JSON object")),
            Parsed::Ok(_) => panic!("expected parse failure"),
        }
    }

    #[test]
    fn monetary_values_normalize_to_two_decimals() {
        assert_eq!(
            coerce_money(&serde_json::json!(5)).as_deref(),
            Some("5.00")
        );
        assert_eq!(
            coerce_money(&serde_json::json!("5.5")).as_deref(),
            Some("5.50")
        );
        assert_eq!(
            coerce_money(&serde_json::json!(5.50)).as_deref(),
            Some("5.50")
        );
        assert_eq!(
            coerce_money(&serde_json::json!("$1,234.5")).as_deref(),
            Some("1234.50")
        );
        assert_eq!(coerce_money(&serde_json::json!(null)), None);
    }

    #[test]
    fn missing_monetary_field_is_none() {
        let receipt = parsed(r#"{"merchant": "Cafe Rex"}"#);
        assert!(receipt.fields.tip.is_none());
        assert!(receipt.fields.subtotal.is_none());
    }

    #[test]
    fn provided_confidence_scores_are_kept() {
        let receipt = parsed(
            r#"{"tip": 5, "confidence": {"tip": 0.42, "merchant": 0.9}}"#,
        );
        assert!((receipt.confidence.tip - 0.42).abs() < f64::EPSILON);
        assert!((receipt.confidence.merchant - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn omitted_confidence_scores_are_synthesized_in_high_band() {
        let receipt = parsed(r#"{"tip": 5}"#);
        for score in [
            receipt.confidence.merchant,
            receipt.confidence.tip,
            receipt.confidence.total,
            receipt.confidence.names,
        ] {
            assert!((0.8..=1.0).contains(&score), "score {score} out of band");
        }
    }

    #[test]
    fn out_of_range_confidence_is_replaced() {
        let receipt = parsed(r#"{"confidence": {"tip": 7.5}}"#);
        assert!((0.8..=1.0).contains(&receipt.confidence.tip));
    }

    #[test]
    fn names_accept_array_or_single_string() {
        let receipt = parsed(r#"{"names": ["ALEX R", "server: Sam"]}"#);
        assert_eq!(receipt.fields.names, vec!["ALEX R", "server: Sam"]);

        let receipt = parsed(r#"{"names": "ALEX R"}"#);
        assert_eq!(receipt.fields.names, vec!["ALEX R"]);

        let receipt = parsed(r#"{"names": null}"#);
        assert!(receipt.fields.names.is_empty());
    }

    #[test]
    fn numeric_reference_number_is_stringified() {
        let receipt = parsed(r#"{"reference_number": 48213}"#);
        assert_eq!(receipt.fields.reference_number.as_deref(), Some("48213"));
    }
}
