use std::time::Duration;

use avs_engine::{FailureKind, FetchSettings, Fetcher, ReqwestFetcher, BROWSER_USER_AGENT};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher(settings: FetchSettings) -> ReqwestFetcher {
    ReqwestFetcher::new(settings).expect("client builds")
}

#[tokio::test]
async fn fetcher_returns_body_and_sends_browser_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/nfce"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("<html>ok</html>", "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;

    let url = format!("{}/nfce", server.uri());
    let output = fetcher(FetchSettings::default())
        .fetch(&url)
        .await
        .expect("fetch ok");

    assert_eq!(output.bytes, b"<html>ok</html>");
    assert_eq!(output.metadata.original_url, url);
    assert_eq!(output.metadata.byte_len, 15);
    assert!(output
        .metadata
        .content_type
        .unwrap()
        .starts_with("text/html"));

    let requests = server.received_requests().await.expect("recording on");
    assert_eq!(requests.len(), 1);
    let agent = requests[0]
        .headers
        .get("user-agent")
        .and_then(|value| value.to_str().ok());
    assert_eq!(agent, Some(BROWSER_USER_AGENT));
}

#[tokio::test]
async fn default_request_timeout_is_ten_seconds() {
    assert_eq!(
        FetchSettings::default().request_timeout,
        Duration::from_secs(10)
    );
}

#[tokio::test]
async fn fetcher_fails_on_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let url = format!("{}/missing", server.uri());
    let err = fetcher(FetchSettings::default())
        .fetch(&url)
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(404));
}

#[tokio::test]
async fn fetcher_makes_a_single_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/busy", server.uri());
    let err = fetcher(FetchSettings::default())
        .fetch(&url)
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(503));
    server.verify().await;
}

#[tokio::test]
async fn fetcher_times_out_on_slow_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_raw("slow", "text/html"),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        request_timeout: Duration::from_millis(50),
        ..FetchSettings::default()
    };
    let url = format!("{}/slow", server.uri());
    let err = fetcher(settings).fetch(&url).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn fetcher_rejects_too_large_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/large"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/html")
                .insert_header("Content-Length", "11")
                .set_body_string("01234567890"),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        max_bytes: 10,
        ..FetchSettings::default()
    };
    let url = format!("{}/large", server.uri());
    let err = fetcher(settings).fetch(&url).await.unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::TooLarge {
            max_bytes: 10,
            actual: Some(11)
        }
    );
}

#[tokio::test]
async fn fetcher_rejects_non_html_and_bad_urls() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("%PDF", "application/pdf"))
        .mount(&server)
        .await;

    let client = fetcher(FetchSettings::default());
    let err = client
        .fetch(&format!("{}/pdf", server.uri()))
        .await
        .unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::UnsupportedContentType {
            content_type: "application/pdf".to_string()
        }
    );

    let err = client.fetch("not a url").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
    let err = client.fetch("ftp://example.com/x").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
}
