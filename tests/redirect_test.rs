mod common;

use common::{ok, redirect, ScriptedServer};
use latticenet::client;

#[tokio::test]
async fn test_redirects_off_by_default() {
    let server = ScriptedServer::start(vec![redirect("302 Found", "/next"), ok("next")]).await;
    let url = server.url("/start");

    let response = tokio::task::spawn_blocking(move || client::get(url).send())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(response.status_code(), 302);
    assert_eq!(response.location(), Some("/next"));
    assert_eq!(server.requests().len(), 1);
}

#[tokio::test]
async fn test_relative_redirect_same_connection() {
    let server = ScriptedServer::start(vec![
        redirect("301 Moved Permanently", "/moved?x=1"),
        ok("landed"),
    ])
    .await;
    let url = server.url("/start");

    let response = tokio::task::spawn_blocking(move || client::get(url).redirects(3).send())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(response.text(), "landed");
    assert_eq!(
        response.url().unwrap().as_str(),
        format!("http://{}/moved?x=1", server.addr)
    );
    let requests = server.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[1].starts_with("GET /moved?x=1 HTTP/1.1\r\n"));
    assert_eq!(server.connections(), 1);
}

#[tokio::test]
async fn test_absolute_redirect_to_other_server() {
    let target = ScriptedServer::start(vec![ok("other side")]).await;
    let origin = ScriptedServer::start(vec![redirect("307 Temporary Redirect", &target.url("/dest"))]).await;
    let url = origin.url("/");

    let response = tokio::task::spawn_blocking(move || client::get(url).redirects(1).send())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(response.text(), "other side");
    assert_eq!(origin.requests().len(), 1);
    let forwarded = &target.requests()[0];
    assert!(forwarded.starts_with("GET /dest HTTP/1.1\r\n"));
    assert!(forwarded.contains(&format!("Host: {}\r\n", target.addr)));
}

#[tokio::test]
async fn test_redirect_loop_stops_at_budget() {
    let responses = (0..10).map(|i| redirect("302 Found", &format!("/hop{i}"))).collect();
    let server = ScriptedServer::start(responses).await;
    let url = server.url("/hop");

    let response = tokio::task::spawn_blocking(move || client::get(url).redirects(3).send())
        .await
        .unwrap()
        .unwrap();

    // Exhausting the budget is not an error: the last redirect is returned.
    assert_eq!(response.status_code(), 302);
    assert_eq!(response.location(), Some("/hop3"));
    assert_eq!(server.requests().len(), 4);
}

#[tokio::test]
async fn test_see_other_turns_post_into_get() {
    let server = ScriptedServer::start(vec![redirect("303 See Other", "/result"), ok("done")]).await;
    let url = server.url("/submit");

    let response = tokio::task::spawn_blocking(move || {
        client::post(url).param("field", "value").redirects(2).send()
    })
    .await
    .unwrap()
    .unwrap();
    assert_eq!(response.text(), "done");

    let requests = server.requests();
    assert!(requests[0].starts_with("POST /submit HTTP/1.1\r\n"));
    assert!(requests[0].ends_with("field=value"));
    assert!(requests[1].starts_with("GET /result HTTP/1.1\r\n"));
    assert!(!requests[1].contains("Content-Length"));
    assert!(!requests[1].contains("field=value"));
}

#[tokio::test]
async fn test_post_keeps_302() {
    let server = ScriptedServer::start(vec![redirect("302 Found", "/elsewhere")]).await;
    let url = server.url("/form");

    let response = tokio::task::spawn_blocking(move || {
        client::post(url).body("payload").redirects(5).send()
    })
    .await
    .unwrap()
    .unwrap();
    assert_eq!(response.status_code(), 302);
    assert_eq!(server.requests().len(), 1);
}

#[tokio::test]
async fn test_connection_close_redirect_reconnects() {
    let server = ScriptedServer::start(vec![
        "HTTP/1.1 302 Found\r\nLocation: /again\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string(),
        ok("fresh"),
    ])
    .await;
    let url = server.url("/");

    let response = tokio::task::spawn_blocking(move || client::get(url).redirects(1).send())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(response.text(), "fresh");
    assert_eq!(server.connections(), 2);
}
