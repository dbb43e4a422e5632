//! NapCat adapter (remote action invoker).
//!
//! Speaks the NapCat HTTP API: one POST per action to
//! `http://{host}:{port}/{action}` with a JSON payload and an optional
//! bearer token. Everything comes back as a [`CallOutcome`]; transport and
//! protocol problems are classified into stable detail strings the
//! evaluator wraps verbatim.

use std::time::Duration;

use async_trait::async_trait;
use ldg_core::{
    domain::RemoteEndpoint,
    port::{CallOutcome, ControlPlane},
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct NapcatClient {
    http: reqwest::Client,
}

impl NapcatClient {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Client with a custom total timeout. Production wiring uses
    /// [`new`](Self::new); tests shorten this to keep slow-path fixtures
    /// fast.
    pub fn with_timeout(timeout: Duration) -> Self {
        // `no_proxy` keeps ambient HTTP(S)_PROXY settings from hijacking
        // what must be a direct localhost hop. Redirects are never
        // followed; a 3xx surfaces as its own status like any other
        // non-2xx.
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .no_proxy()
            .build()
            .expect("reqwest client build");
        Self { http }
    }
}

#[async_trait]
impl ControlPlane for NapcatClient {
    async fn invoke(
        &self,
        endpoint: &RemoteEndpoint,
        remote_action: &str,
        payload: serde_json::Value,
    ) -> CallOutcome {
        let url = format!(
            "http://{}:{}/{}",
            endpoint.host, endpoint.port, remote_action
        );

        let mut request = self.http.post(&url).json(&payload);
        if !endpoint.token.is_empty() {
            request = request.bearer_auth(&endpoint.token);
        }

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                return CallOutcome::failure(format!("request timed out: {url}"));
            }
            Err(e) => {
                return CallOutcome::failure(format!("request failed: {e}"));
            }
        };

        let status = response.status().as_u16();
        if status == 401 || status == 403 {
            return CallOutcome::failure(format!("authentication failed (HTTP {status})"));
        }
        if !response.status().is_success() {
            return CallOutcome::failure(format!("HTTP error: {status}"));
        }

        let raw: serde_json::Value = match response.json().await {
            Ok(v) => v,
            Err(_) => return CallOutcome::failure("malformed response"),
        };
        if !raw.is_object() {
            return CallOutcome::failure("malformed response");
        }

        if raw.get("status").and_then(|v| v.as_str()) != Some("ok") {
            let status_field = raw
                .get("status")
                .map(json_value_to_display)
                .unwrap_or_else(|| "null".to_string());
            let retcode = raw
                .get("retcode")
                .map(json_value_to_display)
                .unwrap_or_default();
            let message = display_field(&raw, "message")
                .or_else(|| display_field(&raw, "wording"))
                .unwrap_or_else(|| "unknown".to_string());
            return CallOutcome::remote_failure(
                format!("remote call failed: status={status_field}, retcode={retcode}, message={message}"),
                raw,
            );
        }

        CallOutcome::success(raw)
    }
}

/// Field rendering for the failure detail: missing, null or empty values
/// fall through to the next candidate.
fn display_field(raw: &serde_json::Value, key: &str) -> Option<String> {
    let v = raw.get(key)?;
    if v.is_null() {
        return None;
    }
    let s = json_value_to_display(v);
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

fn json_value_to_display(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::Null => "null".to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.to_string(),
        other => serde_json::to_string(other).unwrap_or_else(|_| "<unprintable>".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn endpoint_for(server: &mockito::Server, token: &str) -> RemoteEndpoint {
        let host_with_port = server.host_with_port();
        let (host, port) = host_with_port.split_once(':').expect("host:port");
        RemoteEndpoint {
            host: host.to_string(),
            port: port.to_string(),
            token: token.to_string(),
        }
    }

    #[tokio::test]
    async fn posts_the_payload_and_reports_ok() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/set_group_leave")
            .match_header("content-type", "application/json")
            .match_header("authorization", mockito::Matcher::Missing)
            .match_body(mockito::Matcher::Json(
                json!({ "group_id": "123", "is_dismiss": false }),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":"ok","retcode":0}"#)
            .create_async()
            .await;

        let client = NapcatClient::new();
        let outcome = client
            .invoke(
                &endpoint_for(&server, ""),
                "set_group_leave",
                json!({ "group_id": "123", "is_dismiss": false }),
            )
            .await;

        mock.assert_async().await;
        assert!(outcome.ok);
        assert_eq!(outcome.detail, "ok");
        assert_eq!(outcome.raw, Some(json!({ "status": "ok", "retcode": 0 })));
    }

    #[tokio::test]
    async fn sends_a_bearer_header_only_when_a_token_is_set() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/delete_friend")
            .match_header("authorization", "Bearer secret-token")
            .with_status(200)
            .with_body(r#"{"status":"ok"}"#)
            .create_async()
            .await;

        let client = NapcatClient::new();
        let outcome = client
            .invoke(
                &endpoint_for(&server, "secret-token"),
                "delete_friend",
                json!({ "user_id": "u1" }),
            )
            .await;

        mock.assert_async().await;
        assert!(outcome.ok);
    }

    #[tokio::test]
    async fn auth_rejections_cite_the_http_status() {
        let mut server = mockito::Server::new_async().await;
        for status in [401, 403] {
            let mock = server
                .mock("POST", "/delete_friend")
                .with_status(status)
                .create_async()
                .await;

            let client = NapcatClient::new();
            let outcome = client
                .invoke(
                    &endpoint_for(&server, "bad"),
                    "delete_friend",
                    json!({ "user_id": "u1" }),
                )
                .await;

            mock.assert_async().await;
            assert!(!outcome.ok);
            assert_eq!(
                outcome.detail,
                format!("authentication failed (HTTP {status})")
            );
            assert_eq!(outcome.raw, None);
        }
    }

    #[tokio::test]
    async fn other_error_statuses_are_plain_http_errors() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/set_group_leave")
            .with_status(500)
            .create_async()
            .await;

        let client = NapcatClient::new();
        let outcome = client
            .invoke(
                &endpoint_for(&server, ""),
                "set_group_leave",
                json!({ "group_id": "123", "is_dismiss": false }),
            )
            .await;

        mock.assert_async().await;
        assert!(!outcome.ok);
        assert_eq!(outcome.detail, "HTTP error: 500");
    }

    #[tokio::test]
    async fn redirects_surface_as_their_status_and_are_not_followed() {
        let mut server = mockito::Server::new_async().await;
        let target = server
            .mock("GET", "/elsewhere")
            .with_status(200)
            .with_body(r#"{"status":"ok"}"#)
            .expect(0)
            .create_async()
            .await;
        let redirect = server
            .mock("POST", "/set_group_leave")
            .with_status(302)
            .with_header("location", "/elsewhere")
            .create_async()
            .await;

        let client = NapcatClient::new();
        let outcome = client
            .invoke(
                &endpoint_for(&server, ""),
                "set_group_leave",
                json!({ "group_id": "123", "is_dismiss": false }),
            )
            .await;

        redirect.assert_async().await;
        target.assert_async().await;
        assert!(!outcome.ok);
        assert_eq!(outcome.detail, "HTTP error: 302");
        assert_eq!(outcome.raw, None);
    }

    #[tokio::test]
    async fn non_json_and_non_object_bodies_are_malformed() {
        let mut server = mockito::Server::new_async().await;

        let not_json = server
            .mock("POST", "/set_group_leave")
            .with_status(200)
            .with_body("<html>busy</html>")
            .create_async()
            .await;
        let client = NapcatClient::new();
        let outcome = client
            .invoke(
                &endpoint_for(&server, ""),
                "set_group_leave",
                json!({ "group_id": "123", "is_dismiss": false }),
            )
            .await;
        not_json.assert_async().await;
        assert!(!outcome.ok);
        assert_eq!(outcome.detail, "malformed response");

        let not_object = server
            .mock("POST", "/set_group_leave")
            .with_status(200)
            .with_body("[1,2,3]")
            .create_async()
            .await;
        let outcome = client
            .invoke(
                &endpoint_for(&server, ""),
                "set_group_leave",
                json!({ "group_id": "123", "is_dismiss": false }),
            )
            .await;
        not_object.assert_async().await;
        assert!(!outcome.ok);
        assert_eq!(outcome.detail, "malformed response");
    }

    #[tokio::test]
    async fn remote_reported_failure_carries_status_retcode_and_message() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/delete_friend")
            .with_status(200)
            .with_body(r#"{"status":"failed","retcode":100,"message":"not friends"}"#)
            .create_async()
            .await;

        let client = NapcatClient::new();
        let outcome = client
            .invoke(
                &endpoint_for(&server, ""),
                "delete_friend",
                json!({ "user_id": "u1" }),
            )
            .await;

        mock.assert_async().await;
        assert!(!outcome.ok);
        assert_eq!(
            outcome.detail,
            "remote call failed: status=failed, retcode=100, message=not friends"
        );
        assert_eq!(
            outcome.raw,
            Some(json!({ "status": "failed", "retcode": 100, "message": "not friends" }))
        );
    }

    #[tokio::test]
    async fn failure_message_falls_back_to_wording_then_unknown() {
        let mut server = mockito::Server::new_async().await;

        let with_wording = server
            .mock("POST", "/delete_friend")
            .with_status(200)
            .with_body(r#"{"status":"failed","message":"","wording":"blocked by peer"}"#)
            .create_async()
            .await;
        let client = NapcatClient::new();
        let outcome = client
            .invoke(
                &endpoint_for(&server, ""),
                "delete_friend",
                json!({ "user_id": "u1" }),
            )
            .await;
        with_wording.assert_async().await;
        assert_eq!(
            outcome.detail,
            "remote call failed: status=failed, retcode=, message=blocked by peer"
        );

        let bare = server
            .mock("POST", "/delete_friend")
            .with_status(200)
            .with_body(r#"{"status":"failed"}"#)
            .create_async()
            .await;
        let outcome = client
            .invoke(
                &endpoint_for(&server, ""),
                "delete_friend",
                json!({ "user_id": "u1" }),
            )
            .await;
        bare.assert_async().await;
        assert_eq!(
            outcome.detail,
            "remote call failed: status=failed, retcode=, message=unknown"
        );
    }

    #[tokio::test]
    async fn connection_errors_are_request_failures() {
        // Bind to grab a free port, then close it again.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().expect("addr").port();
        drop(listener);

        let endpoint = RemoteEndpoint {
            host: "127.0.0.1".to_string(),
            port: port.to_string(),
            token: String::new(),
        };

        let client = NapcatClient::new();
        let outcome = client
            .invoke(&endpoint, "set_group_leave", json!({ "group_id": "1" }))
            .await;

        assert!(!outcome.ok);
        assert!(
            outcome.detail.starts_with("request failed: "),
            "got: {}",
            outcome.detail
        );
    }

    #[tokio::test]
    async fn a_silent_server_times_out_with_the_url_in_the_detail() {
        // Accepted but never answered: the listener holds the connection
        // open in its backlog without reading or responding.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().expect("addr").port();

        let endpoint = RemoteEndpoint {
            host: "127.0.0.1".to_string(),
            port: port.to_string(),
            token: String::new(),
        };

        let client = NapcatClient::with_timeout(Duration::from_millis(200));
        let outcome = client
            .invoke(&endpoint, "delete_friend", json!({ "user_id": "u1" }))
            .await;

        assert!(!outcome.ok);
        assert_eq!(
            outcome.detail,
            format!("request timed out: http://127.0.0.1:{port}/delete_friend")
        );
        drop(listener);
    }
}
