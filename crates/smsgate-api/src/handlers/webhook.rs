//! Hardware webhook - inbound SMS and delivery reports
//!
//! The gateways push both incoming messages and delivery status reports
//! into one endpoint, as loosely-typed query or form parameters under
//! several historical aliases. The plain-text `OK:` / `ERROR:` responses
//! are a compatibility contract with deployed hardware and must stay
//! byte-for-byte stable.

use axum::extract::{RawQuery, State};
use chrono::{DateTime, NaiveDateTime, Utc};
use smsgate_common::phone;
use smsgate_storage::models::CreateInboxMessage;
use smsgate_storage::repository::InboxRepository;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::AppState;

/// Parameter aliases for the sender phone number
const PHONE_PARAMS: &[&str] = &["from", "sender", "phonenumber", "phone", "srcnum", "src"];

/// Parameter aliases for the message body
const MESSAGE_PARAMS: &[&str] = &["smscontent", "content", "message", "text", "sms", "msg"];

/// Parameter aliases for the delivery-report message id
const MESSAGE_ID_PARAMS: &[&str] = &["message_id", "id", "msgid", "smsid"];

/// Handle a webhook call from the hardware
///
/// GET|POST /api/receive
pub async fn receive(
    State(state): State<Arc<AppState>>,
    RawQuery(raw_query): RawQuery,
    body: String,
) -> String {
    let params = parse_params(raw_query.as_deref(), &body);
    debug!("Webhook params: {:?}", params);

    let status = first_param(&params, &["status", "dlrstatus"]);
    let message_id = first_param(&params, MESSAGE_ID_PARAMS);

    // A message id together with a status token is a delivery report,
    // not a new inbound message
    if let (Some(message_id), Some(status)) = (&message_id, &status) {
        let timestamp = first_param(&params, &["time", "recvtime", "datetime"])
            .and_then(|t| parse_time(&t));

        return match state.reconciler.apply(message_id, status, timestamp).await {
            Ok(()) => "OK: Delivery status updated".to_string(),
            Err(e) => {
                warn!("Delivery report failed: {}", e);
                format!("ERROR: {}", e)
            }
        };
    }

    let Some(raw_phone) = first_param(&params, PHONE_PARAMS) else {
        return format!(
            "ERROR: Missing phone number. Tried params: {}",
            PHONE_PARAMS.join(", ")
        );
    };

    let Some(message) = first_param(&params, MESSAGE_PARAMS) else {
        return format!(
            "ERROR: Missing message. Tried params: {}",
            MESSAGE_PARAMS.join(", ")
        );
    };

    let port = first_param(&params, &["port", "portname"]);
    let port_name = first_param(&params, &["portname", "port"]);
    let received_at = first_param(&params, &["time", "recvtime", "datetime"])
        .and_then(|t| parse_time(&t))
        .unwrap_or_else(Utc::now);

    let input = CreateInboxMessage {
        phone_number: phone::normalize(&raw_phone),
        message,
        port,
        port_name,
        imsi: first_param(&params, &["imsi"]),
        received_at,
    };

    let repo = InboxRepository::new(state.db_pool.pool().clone());
    match repo.create(input).await {
        Ok(stored) => format!("OK: Message received, ID: {}", stored.id),
        Err(e) => {
            warn!("Failed to store inbound SMS: {}", e);
            format!("ERROR: {}", e)
        }
    }
}

/// Merge query-string and form-body parameters; body values win, the way
/// the original panel merged request sources.
pub fn parse_params(raw_query: Option<&str>, body: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();

    if let Some(query) = raw_query {
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            params.insert(key.into_owned(), value.into_owned());
        }
    }

    for (key, value) in url::form_urlencoded::parse(body.as_bytes()) {
        params.insert(key.into_owned(), value.into_owned());
    }

    params
}

/// First non-empty value under any of the given aliases
pub fn first_param(params: &HashMap<String, String>, aliases: &[&str]) -> Option<String> {
    aliases
        .iter()
        .filter_map(|key| params.get(*key))
        .find(|value| !value.is_empty())
        .cloned()
}

/// Parse the hardware's timestamp formats
pub fn parse_time(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(value) {
        return Some(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_params_merges_query_and_body() {
        let params = parse_params(Some("from=%2B79167193249&port=gsm-1.1"), "text=hello+there");
        assert_eq!(params.get("from").map(String::as_str), Some("+79167193249"));
        assert_eq!(params.get("port").map(String::as_str), Some("gsm-1.1"));
        assert_eq!(params.get("text").map(String::as_str), Some("hello there"));
    }

    #[test]
    fn test_parse_params_body_wins() {
        let params = parse_params(Some("status=failed"), "status=delivered");
        assert_eq!(params.get("status").map(String::as_str), Some("delivered"));
    }

    #[test]
    fn test_first_param_alias_order() {
        let mut params = HashMap::new();
        params.insert("sender".to_string(), "111".to_string());
        params.insert("phonenumber".to_string(), "222".to_string());

        assert_eq!(first_param(&params, PHONE_PARAMS), Some("111".to_string()));
    }

    #[test]
    fn test_first_param_skips_empty_values() {
        let mut params = HashMap::new();
        params.insert("from".to_string(), String::new());
        params.insert("src".to_string(), "333".to_string());

        assert_eq!(first_param(&params, PHONE_PARAMS), Some("333".to_string()));
    }

    #[test]
    fn test_parse_time_formats() {
        assert!(parse_time("2024-03-01 12:30:00").is_some());
        assert!(parse_time("2024-03-01T12:30:00Z").is_some());
        assert!(parse_time("yesterday").is_none());
    }
}
