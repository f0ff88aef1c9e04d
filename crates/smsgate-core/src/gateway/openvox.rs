//! OpenVox protocol family (family A)
//!
//! Query-string GET against `/sendsms` with a structured JSON report
//! requested. Older firmware answers with free text, so classification
//! falls back to substring matching when the report key is absent.

use reqwest::Url;
use serde_json::Value;
use smsgate_storage::models::{Gateway, MessageStatus};

use super::{format_port, SendOutcome};

/// Build the send URL. Field names are fixed by the hardware.
pub fn build_url(
    gateway: &Gateway,
    phone: &str,
    message: &str,
    port: Option<i32>,
) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(&format!("http://{}:{}/sendsms", gateway.host, gateway.port))?;

    {
        let mut query = url.query_pairs_mut();
        query.append_pair("username", gateway.username.as_deref().unwrap_or(""));
        query.append_pair("password", gateway.password.as_deref().unwrap_or(""));
        query.append_pair("phonenumber", phone);
        query.append_pair("message", message);
        query.append_pair("report", "JSON");
        query.append_pair("timeout", "30");
        if let Some(port) = port {
            query.append_pair("port", &format_port(port));
        }
    }

    Ok(url)
}

/// Classify a 200 response body into the normalized outcome.
pub fn classify_response(body: &str) -> SendOutcome {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        if let Some(report) = json.get("report") {
            return classify_report(&json, report, body);
        }
    }

    // Unstructured firmware: substring matching over the raw body
    let lower = body.to_lowercase();
    let status = if lower.contains("delivered") {
        MessageStatus::Delivered
    } else if ["success", "sending", "sent"]
        .iter()
        .any(|token| lower.contains(token))
    {
        MessageStatus::Sent
    } else {
        MessageStatus::Failed
    };

    SendOutcome {
        status,
        raw_response: body.trim().to_string(),
        gateway_message_id: None,
        reported_port: None,
    }
}

/// Walk the nested report structure. Entries arrive as arrays of arrays,
/// sometimes with the record wrapped in one more single-element array.
fn classify_report(json: &Value, report: &Value, body: &str) -> SendOutcome {
    let mut status = MessageStatus::Failed;
    let mut reported_port = None;
    let mut gateway_message_id = None;

    if let Some(groups) = report.as_array() {
        for group in groups {
            let Some(entries) = group.as_array() else {
                continue;
            };
            for entry in entries {
                let record = match entry.as_array().and_then(|a| a.first()) {
                    Some(inner) => inner,
                    None => entry,
                };

                if let Some(result) = record.get("result").and_then(Value::as_str) {
                    match result.to_lowercase().as_str() {
                        "success" | "sending" | "sent" => {
                            if status != MessageStatus::Delivered {
                                status = MessageStatus::Sent;
                            }
                        }
                        "delivered" => status = MessageStatus::Delivered,
                        _ => {}
                    }
                }

                if let Some(port) = record.get("port").and_then(Value::as_str) {
                    reported_port = Some(port.to_string());
                }

                if let Some(id) = record.get("id") {
                    gateway_message_id = match id {
                        Value::String(s) => Some(s.clone()),
                        other => Some(other.to_string()),
                    };
                }
            }
        }
    }

    let raw_response = json
        .get("message")
        .and_then(Value::as_str)
        .map(String::from)
        .unwrap_or_else(|| body.to_string());

    SendOutcome {
        status,
        raw_response,
        gateway_message_id,
        reported_port,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn gateway() -> Gateway {
        Gateway {
            id: Uuid::new_v4(),
            name: "lab".to_string(),
            kind: "openvox".to_string(),
            host: "192.168.1.10".to_string(),
            port: 80,
            username: Some("smsuser".to_string()),
            password: Some("pass".to_string()),
            channels: 8,
            is_active: true,
            is_default: false,
            priority: 0,
            messages_sent: 0,
            last_used_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_build_url_fields() {
        let url = build_url(&gateway(), "+79167193249", "hello world", Some(6)).unwrap();
        assert_eq!(url.path(), "/sendsms");

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert!(pairs.contains(&("username".into(), "smsuser".into())));
        assert!(pairs.contains(&("password".into(), "pass".into())));
        assert!(pairs.contains(&("phonenumber".into(), "+79167193249".into())));
        assert!(pairs.contains(&("message".into(), "hello world".into())));
        assert!(pairs.contains(&("report".into(), "JSON".into())));
        assert!(pairs.contains(&("timeout".into(), "30".into())));
        assert!(pairs.contains(&("port".into(), "gsm-2.2".into())));
    }

    #[test]
    fn test_build_url_without_port() {
        let url = build_url(&gateway(), "+79167193249", "hi", None).unwrap();
        assert!(url.query_pairs().all(|(k, _)| k != "port"));
    }

    #[test]
    fn test_classify_structured_success() {
        let outcome =
            classify_response(r#"{"report":[[{"result":"Success","port":"gsm-1.2"}]]}"#);
        assert_eq!(outcome.status, MessageStatus::Sent);
        assert_eq!(outcome.reported_port.as_deref(), Some("gsm-1.2"));
    }

    #[test]
    fn test_classify_structured_delivered_with_id() {
        let outcome = classify_response(
            r#"{"report":[[{"result":"DELIVERED","port":"gsm-1.1","id":"msg-77"}]],"message":"done"}"#,
        );
        assert_eq!(outcome.status, MessageStatus::Delivered);
        assert_eq!(outcome.gateway_message_id.as_deref(), Some("msg-77"));
        assert_eq!(outcome.raw_response, "done");
    }

    #[test]
    fn test_classify_structured_wrapped_record() {
        // Some firmware wraps each record in one more array level
        let outcome =
            classify_response(r#"{"report":[[[{"result":"sending"}]]]}"#);
        assert_eq!(outcome.status, MessageStatus::Sent);
    }

    #[test]
    fn test_classify_structured_unknown_result() {
        let outcome = classify_response(r#"{"report":[[{"result":"Timeout"}]]}"#);
        assert_eq!(outcome.status, MessageStatus::Failed);
    }

    #[test]
    fn test_classify_fallback_text() {
        assert_eq!(
            classify_response("Message sent OK").status,
            MessageStatus::Sent
        );
        assert_eq!(
            classify_response("DELIVERED to handset").status,
            MessageStatus::Delivered
        );
        assert_eq!(
            classify_response("queue full").status,
            MessageStatus::Failed
        );
    }

    #[test]
    fn test_classify_json_without_report_uses_fallback() {
        let outcome = classify_response(r#"{"state":"Sending"}"#);
        assert_eq!(outcome.status, MessageStatus::Sent);
    }
}
