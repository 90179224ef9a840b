use mcphub_api::{AuthConfig, AuthType, REBUILD_DONE_EVENT};
use mcphub_api_client::{ApiClient, SseEvent};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serve one canned response per connection, in order, and hand back the raw
/// requests that were received.
async fn serve(responses: Vec<String>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let mut seen = Vec::new();
        for response in responses {
            let (mut socket, _) = listener.accept().await.unwrap();
            seen.push(read_request(&mut socket).await);
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        }
        seen
    });
    (format!("http://{addr}"), handle)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf);
        if let Some(head_end) = text.find("\r\n\r\n") {
            let content_length = text[..head_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= head_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

fn json_response(status: &str, body: &str, extra_headers: &str) -> String {
    format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n{extra_headers}Connection: close\r\n\r\n{body}",
        body.len()
    )
}

#[tokio::test]
async fn login_cookie_is_sent_with_roster_request() {
    let (base, server) = serve(vec![
        json_response(
            "200 OK",
            r#"{"status":"ok"}"#,
            "Set-Cookie: mcphub_session=abc123; Path=/; HttpOnly\r\n",
        ),
        json_response(
            "200 OK",
            r#"[{"name":"a","status":"Up 2 hours","auth_type":"api_key"}]"#,
            "",
        ),
    ])
    .await;

    let client = ApiClient::new(&base, None).unwrap();
    let login = client.login("secret").await.unwrap();
    assert!(login.is_ok());

    let apps = client.list_apps().await.unwrap();
    assert_eq!(apps.len(), 1);
    assert_eq!(apps[0].name, "a");
    assert!(apps[0].is_running());
    assert_eq!(apps[0].auth_type, AuthType::ApiKey);

    let requests = server.await.unwrap();
    assert!(requests[0].starts_with("POST /api/login "));
    assert!(requests[0].contains(r#"{"password":"secret"}"#));
    assert!(requests[1].starts_with("GET /api/apps "));
    assert!(
        requests[1]
            .to_ascii_lowercase()
            .contains("cookie: mcphub_session=abc123")
    );
}

#[tokio::test]
async fn wrong_password_is_a_response_not_an_error() {
    let (base, server) =
        serve(vec![json_response("200 OK", r#"{"error":"Invalid password"}"#, "")]).await;
    let client = ApiClient::new(&base, None).unwrap();
    let login = client.login("nope").await.unwrap();
    assert!(!login.is_ok());
    assert_eq!(login.error.as_deref(), Some("Invalid password"));
    server.await.unwrap();
}

#[tokio::test]
async fn unauthorized_roster_maps_to_unauthorized_error() {
    let (base, server) = serve(vec![json_response("401 Unauthorized", "", "")]).await;
    let client = ApiClient::new(&base, None).unwrap();
    let err = client.list_apps().await.unwrap_err();
    assert!(err.is_unauthorized());
    assert!(!err.is_transport());
    server.await.unwrap();
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ApiClient::new(&format!("http://{addr}"), None).unwrap();
    let err = client.auth_check().await.unwrap_err();
    assert!(err.is_transport());
}

#[tokio::test]
async fn auth_config_save_posts_selected_mode_only() {
    let (base, server) = serve(vec![json_response("200 OK", r#"{"status":"ok"}"#, "")]).await;
    let client = ApiClient::new(&base, None).unwrap();
    client
        .set_auth_config(
            "demo app",
            &AuthConfig::ApiKey {
                api_key: "k1".into(),
            },
        )
        .await
        .unwrap();

    let requests = server.await.unwrap();
    assert!(requests[0].starts_with("POST /api/apps/demo%20app/auth "));
    assert!(requests[0].ends_with(r#"{"auth_type":"api_key","api_key":"k1"}"#));
}

#[tokio::test]
async fn failed_action_surfaces_status() {
    let (base, server) = serve(vec![json_response(
        "500 Internal Server Error",
        r#"{"error":"boom"}"#,
        "",
    )])
    .await;
    let client = ApiClient::new(&base, None).unwrap();
    let err = client.stop("a").await.unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(500));
    server.await.unwrap();
}

#[tokio::test]
async fn rebuild_stream_yields_lines_then_done() {
    let body = "data: Step 1/5\n\ndata: Step 2/5\n\nevent: done\ndata: success\n\n";
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nCache-Control: no-cache\r\nConnection: close\r\n\r\n{body}"
    );
    let (base, server) = serve(vec![response]).await;

    let client = ApiClient::new(&base, None).unwrap();
    let mut stream = client.rebuild("a").await.unwrap();
    let mut events = Vec::new();
    while let Some(event) = stream.next_event().await.unwrap() {
        events.push(event);
    }

    assert_eq!(
        events,
        vec![
            SseEvent::message("Step 1/5"),
            SseEvent::message("Step 2/5"),
            SseEvent::named(REBUILD_DONE_EVENT, "success"),
        ]
    );
    let requests = server.await.unwrap();
    assert!(requests[0].starts_with("GET /api/rebuild/a "));
}
