mod common;

use common::{ok, ScriptedServer};
use latticenet::base::neterror::NetError;
use latticenet::client;
use latticenet::socket::proxy::ProxySettings;

#[tokio::test]
async fn test_http_through_proxy_uses_absolute_form() {
    let proxy = ScriptedServer::start(vec![ok("via proxy")]).await;
    let settings = ProxySettings::new(proxy.url("")).unwrap().with_auth("agent", "s3cret");

    let response = tokio::task::spawn_blocking(move || {
        client::get("http://origin.invalid:8080/page?x=1")
            .proxy_settings(settings)
            .send()
    })
    .await
    .unwrap()
    .unwrap();
    assert_eq!(response.text(), "via proxy");

    let request = &proxy.requests()[0];
    assert!(request.starts_with("GET http://origin.invalid:8080/page?x=1 HTTP/1.1\r\n"));
    assert!(request.contains("Host: origin.invalid:8080\r\n"));
    assert!(request.contains("Proxy-Authorization: Basic YWdlbnQ6czNjcmV0\r\n"));
}

#[tokio::test]
async fn test_https_through_proxy_sends_connect() {
    let proxy = ScriptedServer::start(vec![
        "HTTP/1.1 403 Forbidden\r\nContent-Length: 0\r\n\r\n".to_string(),
    ])
    .await;
    let proxy_url = proxy.url("");

    let result = tokio::task::spawn_blocking(move || {
        client::get("https://secure.invalid/account")
            .proxy(proxy_url.as_str())
            .send()
    })
    .await
    .unwrap();
    assert!(matches!(result, Err(NetError::TunnelConnectionFailed)));

    let requests = proxy.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].starts_with("CONNECT secure.invalid:443 HTTP/1.1\r\nHost: secure.invalid:443\r\n"));
    assert!(!requests[0].contains("Proxy-Authorization"));
}

#[tokio::test]
async fn test_tunnel_then_handshake_failure() {
    // The proxy accepts the tunnel and hangs up instead of relaying TLS.
    let proxy = ScriptedServer::start(vec![
        "HTTP/1.1 200 Connection Established\r\nConnection: close\r\n\r\n".to_string(),
    ])
    .await;
    let settings = ProxySettings::new(proxy.url("")).unwrap().with_auth("u", "p");

    let result = tokio::task::spawn_blocking(move || {
        client::get("https://secure.invalid:8443/")
            .proxy_settings(settings)
            .send()
    })
    .await
    .unwrap();

    match result {
        Err(NetError::SslHandshakeFailed { host, .. }) => assert_eq!(host, "secure.invalid"),
        other => panic!("expected handshake failure, got {other:?}"),
    }
    let request = &proxy.requests()[0];
    assert!(request.starts_with("CONNECT secure.invalid:8443 HTTP/1.1\r\n"));
    assert!(request.contains("Proxy-Authorization: Basic dTpw\r\n"));
}

#[test]
fn test_proxy_settings_validation() {
    assert!(matches!(
        ProxySettings::new("/relative"),
        Err(NetError::RelativeUrl(_))
    ));
    assert!(matches!(
        ProxySettings::new("socks5://127.0.0.1:1080"),
        Err(NetError::UnknownUrlScheme(_))
    ));

    let proxy = ProxySettings::new("http://proxy.local:3128").unwrap();
    assert_eq!(proxy.host_port(), ("proxy.local", 3128));
    assert!(!proxy.requires_auth());
    assert!(!format!("{:?}", proxy.with_auth("u", "hidden")).contains("hidden"));
}
