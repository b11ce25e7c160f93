//! End-to-end delivery through the HTTP transport against a mock receiver.

use std::time::Duration;

use autoblog_core::EventKind;
use autoblog_webhooks::{sign_payload, WebhookConfig, WebhookNotifier};
use serde_json::json;
use wiremock::matchers::{body_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_delivery_carries_event_secret_and_signature() {
    let server = MockServer::start().await;
    let expected_body = json!({"event": "entry.created", "payload": {"slug": "about"}});
    let signature = sign_payload(
        "s3cret",
        &serde_json::to_vec(&expected_body).unwrap(),
    )
    .unwrap();

    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(header("X-Webhook-Event", "entry.created"))
        .and(header("X-Webhook-Secret", "s3cret"))
        .and(header("X-Webhook-Signature", signature.as_str()))
        .and(body_json(&expected_body))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let config = WebhookConfig::new(format!("{}/hook", server.uri())).with_secret("s3cret");
    let notifier = WebhookNotifier::from_config(config).unwrap();

    notifier.dispatch(EventKind::EntryCreated, json!({"slug": "about"}));
    notifier.flush().await;

    assert_eq!(notifier.stats().delivered, 1);
}

#[tokio::test]
async fn test_no_secret_means_no_secret_headers() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(header_exists("X-Webhook-Secret"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let notifier =
        WebhookNotifier::from_config(WebhookConfig::new(format!("{}/hook", server.uri())))
            .unwrap();
    notifier.dispatch(EventKind::CollectionCreated, json!({"handle": "pages"}));
    notifier.flush().await;

    assert_eq!(notifier.stats().delivered, 1);
}

#[tokio::test]
async fn test_receiver_error_is_swallowed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let notifier =
        WebhookNotifier::from_config(WebhookConfig::new(server.uri())).unwrap();
    notifier.dispatch(EventKind::BlueprintDeleted, json!({"handle": "page"}));
    notifier.flush().await;

    let stats = notifier.stats();
    assert_eq!(stats.delivered, 0);
    assert_eq!(stats.failed, 1);
}

#[tokio::test]
async fn test_slow_receiver_is_abandoned_after_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let config =
        WebhookConfig::new(server.uri()).with_timeout(Duration::from_millis(200));
    let notifier = WebhookNotifier::from_config(config).unwrap();
    notifier.dispatch(EventKind::AssetCreated, json!({"path": "logo.png"}));
    notifier.flush().await;

    assert_eq!(notifier.stats().failed, 1);
}

#[tokio::test]
async fn test_unconfigured_notifier_sends_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let notifier = WebhookNotifier::from_config(WebhookConfig::default()).unwrap();
    notifier.dispatch(EventKind::EntryCreated, json!({"slug": "home"}));
    notifier.flush().await;

    assert_eq!(notifier.stats(), Default::default());
}
