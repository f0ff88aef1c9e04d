//! GoIP protocol family (family B)
//!
//! Query-string GET against `/default/en_US/send.html`. The hardware has
//! no structured response; success is substring matching only.

use reqwest::Url;
use smsgate_storage::models::{Gateway, MessageStatus};

use super::SendOutcome;

/// Build the send URL. Field names are fixed by the hardware; the line
/// number defaults to 1 when no port was allocated.
pub fn build_url(
    gateway: &Gateway,
    phone: &str,
    message: &str,
    port: Option<i32>,
) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(&format!(
        "http://{}:{}/default/en_US/send.html",
        gateway.host, gateway.port
    ))?;

    {
        let mut query = url.query_pairs_mut();
        query.append_pair("u", gateway.username.as_deref().unwrap_or(""));
        query.append_pair("p", gateway.password.as_deref().unwrap_or(""));
        query.append_pair("l", &port.unwrap_or(1).to_string());
        query.append_pair("n", phone);
        query.append_pair("m", message);
    }

    Ok(url)
}

/// Classify a 200 response body into the normalized outcome.
pub fn classify_response(body: &str) -> SendOutcome {
    let lower = body.to_lowercase();
    let status = if ["sending", "ok", "success", "sent"]
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

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn gateway() -> Gateway {
        Gateway {
            id: Uuid::new_v4(),
            name: "goip8".to_string(),
            kind: "goip".to_string(),
            host: "10.0.0.5".to_string(),
            port: 8080,
            username: Some("u1".to_string()),
            password: None,
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
        let url = build_url(&gateway(), "+79167193249", "hi there", Some(4)).unwrap();
        assert_eq!(url.path(), "/default/en_US/send.html");

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert!(pairs.contains(&("u".into(), "u1".into())));
        assert!(pairs.contains(&("p".into(), "".into())));
        assert!(pairs.contains(&("l".into(), "4".into())));
        assert!(pairs.contains(&("n".into(), "+79167193249".into())));
        assert!(pairs.contains(&("m".into(), "hi there".into())));
    }

    #[test]
    fn test_build_url_default_line() {
        let url = build_url(&gateway(), "+79167193249", "hi", None).unwrap();
        assert!(url
            .query_pairs()
            .any(|(k, v)| k == "l" && v == "1"));
    }

    #[test]
    fn test_classify_tokens() {
        assert_eq!(classify_response("Sending").status, MessageStatus::Sent);
        assert_eq!(classify_response("L1 OK").status, MessageStatus::Sent);
        assert_eq!(classify_response("SENT ok").status, MessageStatus::Sent);
        assert_eq!(
            classify_response("ERROR no sim").status,
            MessageStatus::Failed
        );
        assert_eq!(classify_response("").status, MessageStatus::Failed);
    }
}
