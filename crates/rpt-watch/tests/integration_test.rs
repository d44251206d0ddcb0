// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use mockito::{Matcher, Mock, ServerGuard};
use rpt_watch::{
    http_utils::build_client, sink::WebhookSink, source::NitradoLogSource, Monitor, Target,
};
use std::sync::Arc;
use std::time::Duration;

const GLITCH_LINE: &str =
    "12:00:00.000 Login: Player Alice (id) preloading at: (0,0,0) preloading at: 100 -5 200,0,0";
const NORMAL_LINE: &str =
    "12:00:05.250 Login: Player Bob (id) preloading at: 3021.4 212.7 8870.1, 0.0";

fn target(server: &ServerGuard, service_id: u64) -> Target {
    Target {
        service_id,
        access_token: format!("token-{service_id}"),
        webhook_url: format!("{}/api/webhooks/{service_id}/hook", server.url()),
    }
}

fn monitor(server: &ServerGuard, targets: Vec<Target>) -> Monitor {
    let client = build_client(None, Duration::from_secs(5)).expect("failed to build client");
    Monitor::new(
        targets,
        Arc::new(NitradoLogSource::new(client.clone(), server.url())),
        Arc::new(WebhookSink::new(client, Duration::from_secs(5))),
        Duration::from_secs(120),
    )
}

/// Mocks every step of a healthy log retrieval for `service_id`.
async fn mock_log(
    server: &mut ServerGuard,
    service_id: u64,
    file_name: &str,
    content: &str,
) -> Vec<Mock> {
    let base = format!("/services/{service_id}/gameservers");
    let info = server
        .mock("GET", base.as_str())
        .with_status(200)
        .with_body(
            r#"{"data": {"gameserver": {"game": "dayzxb", "username": "ni1_1",
                "settings": {"general": {"nolog": "false"}}}}}"#,
        )
        .create_async()
        .await;
    let list = server
        .mock("GET", format!("{base}/file_server/list").as_str())
        .with_status(200)
        .with_body(format!(
            r#"{{"data": {{"entries": [{{"name": "{file_name}"}}, {{"name": "old.RPT"}}]}}}}"#
        ))
        .create_async()
        .await;
    let blob = format!("/blob/{service_id}/{file_name}");
    let link = server
        .mock("GET", format!("{base}/file_server/download").as_str())
        .with_status(200)
        .with_body(format!(
            r#"{{"data": {{"token": {{"url": "{}{blob}"}}}}}}"#,
            server.url()
        ))
        .create_async()
        .await;
    let download = server
        .mock("GET", blob.as_str())
        .with_status(200)
        .with_body(content)
        .create_async()
        .await;
    vec![info, list, link, download]
}

#[tokio::test]
async fn sweep_delivers_glitch_alert() {
    let mut server = mockito::Server::new_async().await;
    let _log = mock_log(
        &mut server,
        1,
        "x1_2025-03-02.RPT",
        &format!("{GLITCH_LINE}\n{NORMAL_LINE}\n12:00:06.000 Server tick\n"),
    )
    .await;
    let webhook = server
        .mock("POST", "/api/webhooks/1/hook")
        .match_body(Matcher::Json(serde_json::json!({
            "embeds": [{
                "description": "Suspected Under-Map-Glitch attempt.\nTime: 12:00:00\nUser: ` Alice `\nLocation: **100 / 200**"
            }]
        })))
        .with_status(204)
        .expect(1)
        .create_async()
        .await;

    let monitor = monitor(&server, vec![target(&server, 1)]);
    let first = monitor.sweep().await;
    let second = monitor.sweep().await;

    assert_eq!(first.completed, 1);
    assert_eq!(first.suspected_events, 1);
    assert_eq!(first.batches_delivered, 1);
    assert_eq!(second.suspected_events, 0);
    assert_eq!(second.batches_delivered, 0);
    webhook.assert_async().await;
}

#[tokio::test]
async fn failing_target_does_not_block_others() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/services/1/gameservers")
        .with_status(500)
        .with_body("upstream unavailable")
        .create_async()
        .await;
    let _log = mock_log(&mut server, 2, "x2_2025-03-02.RPT", GLITCH_LINE).await;
    let failing_webhook = server
        .mock("POST", "/api/webhooks/1/hook")
        .expect(0)
        .create_async()
        .await;
    let webhook = server
        .mock("POST", "/api/webhooks/2/hook")
        .with_status(204)
        .expect(1)
        .create_async()
        .await;

    let monitor = monitor(&server, vec![target(&server, 1), target(&server, 2)]);
    let summary = monitor.sweep().await;

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.completed, 1);
    assert_eq!(summary.batches_delivered, 1);
    failing_webhook.assert_async().await;
    webhook.assert_async().await;
}

#[tokio::test]
async fn rejected_webhook_is_reported_not_fatal() {
    let mut server = mockito::Server::new_async().await;
    let _log = mock_log(&mut server, 3, "x3_2025-03-02.RPT", GLITCH_LINE).await;
    server
        .mock("POST", "/api/webhooks/3/hook")
        .with_status(404)
        .with_body(r#"{"message": "Unknown Webhook", "code": 10015}"#)
        .create_async()
        .await;

    let monitor = monitor(&server, vec![target(&server, 3)]);
    let summary = monitor.sweep().await;

    assert_eq!(summary.completed, 1);
    assert_eq!(summary.batches_failed, 1);
    assert_eq!(summary.batches_delivered, 0);
}
