//! Gateway protocol adapters
//!
//! Translates a (recipient, body, port) triple into the wire request of one
//! of the supported hardware families and parses the answer back into a
//! normalized outcome. The field names and the newline handling are a
//! hardware compatibility contract and must not change.

pub mod goip;
pub mod log;
pub mod openvox;

pub use log::TrafficLog;

use reqwest::Client;
use smsgate_common::config::SmsConfig;
use smsgate_storage::models::{Gateway, GatewayKind, MessageStatus};
use std::time::Duration;

/// Normalized outcome of one gateway send attempt
#[derive(Debug, Clone)]
pub struct SendOutcome {
    /// Sent, Delivered or Failed
    pub status: MessageStatus,
    /// Raw diagnostic text from the hardware or the transport error
    pub raw_response: String,
    /// Gateway-assigned message identifier, when the hardware echoes one
    pub gateway_message_id: Option<String>,
    /// Port token echoed back by the hardware, e.g. "gsm-1.2"
    pub reported_port: Option<String>,
}

impl SendOutcome {
    /// Whether the attempt counts as successful
    pub fn success(&self) -> bool {
        self.status != MessageStatus::Failed
    }

    fn failed(diagnostic: impl Into<String>) -> Self {
        Self {
            status: MessageStatus::Failed,
            raw_response: diagnostic.into(),
            gateway_message_id: None,
            reported_port: None,
        }
    }
}

/// Format a port number into the OpenVox `gsm-{module}.{port}` notation.
/// Each module carries 4 ports: 1 -> gsm-1.1, 4 -> gsm-1.4, 5 -> gsm-2.1.
pub fn format_port(port: i32) -> String {
    let slot = (port + 3) / 4;
    let slot_port = ((port - 1) % 4) + 1;
    format!("gsm-{}.{}", slot, slot_port)
}

/// Parse an OpenVox port token back to its number. Bare integers pass
/// through; anything else maps to 0.
pub fn parse_port(token: &str) -> i32 {
    if let Some(rest) = token.strip_prefix("gsm-") {
        if let Some((slot, port)) = rest.split_once('.') {
            if let (Ok(slot), Ok(port)) = (slot.parse::<i32>(), port.parse::<i32>()) {
                return (slot - 1) * 4 + port;
            }
        }
    }
    token.parse().unwrap_or(0)
}

/// The GET transport cannot carry newlines; the hardware expects spaces.
pub fn collapse_newlines(message: &str) -> String {
    message.replace("\r\n", " ").replace(['\r', '\n'], " ")
}

/// HTTP client shared by both protocol families
#[derive(Clone)]
pub struct GatewayClient {
    client: Client,
    log: TrafficLog,
}

impl GatewayClient {
    /// Create a new gateway client with the configured timeouts
    pub fn new(config: &SmsConfig) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            log: TrafficLog::new(config.log_dir.clone()),
        }
    }

    /// Send one message through the gateway's protocol family.
    ///
    /// Every failure mode comes back as a failed outcome with diagnostic
    /// text; this function never returns an error and never blocks past
    /// the configured timeouts.
    pub async fn send(
        &self,
        gateway: &Gateway,
        phone: &str,
        message: &str,
        port: Option<i32>,
    ) -> SendOutcome {
        let clean = collapse_newlines(message);
        let kind = gateway.kind_enum();

        let url = match kind {
            GatewayKind::Openvox => openvox::build_url(gateway, phone, &clean, port),
            GatewayKind::Goip => goip::build_url(gateway, phone, &clean, port),
        };

        let url = match url {
            Ok(url) => url,
            Err(e) => {
                let outcome = SendOutcome::failed(format!("Invalid gateway address: {}", e));
                self.log.append(&format!("ERROR: {}", outcome.raw_response));
                return outcome;
            }
        };

        self.log.append(&format!(
            "[{}:{}] SEND: phone={}, port={}",
            kind,
            gateway.name,
            phone,
            port.map(|p| p.to_string()).unwrap_or_else(|| "auto".into()),
        ));

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                let outcome = SendOutcome::failed(format!("Connection error: {}", e));
                self.log.append(&format!("ERROR: {}", outcome.raw_response));
                return outcome;
            }
        };

        let http_status = response.status();
        let body = response.text().await.unwrap_or_default();

        self.log.append(&format!(
            "RESPONSE: HTTP {}, body={}",
            http_status.as_u16(),
            truncate(&body, 200),
        ));

        if http_status.as_u16() != 200 {
            return SendOutcome::failed(format!(
                "HTTP error: {} - {}",
                http_status.as_u16(),
                truncate(&body, 100),
            ));
        }

        let outcome = match kind {
            GatewayKind::Openvox => openvox::classify_response(&body),
            GatewayKind::Goip => goip::classify_response(&body),
        };

        self.log.append(&format!("RESULT: status={}", outcome.status));
        outcome
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_gateway(kind: GatewayKind, host: &str, port: i32) -> Gateway {
        Gateway {
            id: Uuid::new_v4(),
            name: "bench".to_string(),
            kind: kind.to_string(),
            host: host.to_string(),
            port,
            username: Some("admin".to_string()),
            password: Some("secret".to_string()),
            channels: 8,
            is_active: true,
            is_default: true,
            priority: 0,
            messages_sent: 0,
            last_used_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn test_client(log_dir: &std::path::Path) -> GatewayClient {
        let config = SmsConfig {
            connect_timeout_secs: 2,
            request_timeout_secs: 5,
            log_dir: log_dir.to_path_buf(),
            ..SmsConfig::default()
        };
        GatewayClient::new(&config)
    }

    fn server_host_port(server: &MockServer) -> (String, i32) {
        let addr = server.address();
        (addr.ip().to_string(), addr.port() as i32)
    }

    #[test]
    fn test_format_port_modules() {
        assert_eq!(format_port(1), "gsm-1.1");
        assert_eq!(format_port(4), "gsm-1.4");
        assert_eq!(format_port(5), "gsm-2.1");
        assert_eq!(format_port(8), "gsm-2.4");
        assert_eq!(format_port(9), "gsm-3.1");
    }

    #[test]
    fn test_port_roundtrip() {
        for p in 1..=64 {
            assert_eq!(parse_port(&format_port(p)), p, "port {}", p);
        }
    }

    #[test]
    fn test_parse_port_bare_and_junk() {
        assert_eq!(parse_port("3"), 3);
        assert_eq!(parse_port("gsm-x.y"), 0);
        assert_eq!(parse_port(""), 0);
    }

    #[test]
    fn test_collapse_newlines() {
        assert_eq!(collapse_newlines("a\r\nb\rc\nd"), "a b c d");
    }

    #[tokio::test]
    async fn test_goip_send_success() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/default/en_US/send.html"))
            .and(query_param("u", "admin"))
            .and(query_param("p", "secret"))
            .and(query_param("l", "3"))
            .and(query_param("n", "+79167193249"))
            .and(query_param("m", "hello world"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Sending,L3 OK"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let client = test_client(dir.path());
        let (host, port) = server_host_port(&server);
        let gateway = test_gateway(GatewayKind::Goip, &host, port);

        let outcome = client
            .send(&gateway, "+79167193249", "hello\nworld", Some(3))
            .await;

        assert_eq!(outcome.status, MessageStatus::Sent);
        assert!(outcome.success());
    }

    #[tokio::test]
    async fn test_openvox_send_with_port_token() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/sendsms"))
            .and(query_param("username", "admin"))
            .and(query_param("password", "secret"))
            .and(query_param("phonenumber", "+79167193249"))
            .and(query_param("report", "JSON"))
            .and(query_param("timeout", "30"))
            .and(query_param("port", "gsm-2.1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"report":[[{"result":"Success","port":"gsm-2.1"}]]}"#,
            ))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let client = test_client(dir.path());
        let (host, port) = server_host_port(&server);
        let gateway = test_gateway(GatewayKind::Openvox, &host, port);

        let outcome = client.send(&gateway, "+79167193249", "hi", Some(5)).await;

        assert_eq!(outcome.status, MessageStatus::Sent);
        assert_eq!(outcome.reported_port.as_deref(), Some("gsm-2.1"));
    }

    #[tokio::test]
    async fn test_http_error_is_failed() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let client = test_client(dir.path());
        let (host, port) = server_host_port(&server);
        let gateway = test_gateway(GatewayKind::Openvox, &host, port);

        let outcome = client.send(&gateway, "+79167193249", "hi", None).await;

        assert_eq!(outcome.status, MessageStatus::Failed);
        assert!(outcome.raw_response.contains("HTTP error: 500"));
    }

    #[tokio::test]
    async fn test_connection_error_is_failed_with_diagnostic() {
        // Reserve a port, then close it so the connect is refused
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port() as i32;
        drop(listener);

        let dir = tempfile::tempdir().unwrap();
        let client = test_client(dir.path());
        let gateway = test_gateway(GatewayKind::Goip, "127.0.0.1", port);

        let outcome = client.send(&gateway, "+79167193249", "hi", Some(1)).await;

        assert_eq!(outcome.status, MessageStatus::Failed);
        assert!(!outcome.raw_response.is_empty());
    }
}
