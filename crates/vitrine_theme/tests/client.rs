use std::time::Duration;
use vitrine_theme::{FetchError, FetchErrorKind, ThemeClient, ThemePreset};

fn client(server: &mockito::ServerGuard) -> ThemeClient {
    ThemeClient::http(format!("{}/", server.url()), Duration::from_secs(5))
}

#[tokio::test]
async fn fetches_theme_over_http() {
    let mut server = mockito::Server::new_async().await;
    let theme = ThemePreset::WarmComfort.descriptor();
    let mock = server
        .mock("GET", "/themes/warm-comfort")
        .match_header("accept", "application/json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(theme.to_json_pretty())
        .create_async()
        .await;

    let fetched = client(&server).fetch_theme("warm-comfort").await.unwrap();
    assert_eq!(fetched, theme);
    mock.assert_async().await;
}

#[tokio::test]
async fn maps_not_found() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/themes/missing")
        .with_status(404)
        .create_async()
        .await;

    let err = client(&server).fetch_theme("missing").await.unwrap_err();
    assert_eq!(err, FetchError::NotFound("missing".into()));
}

#[tokio::test]
async fn maps_server_errors_with_status() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/themes/warm-comfort")
        .with_status(502)
        .with_body("bad gateway")
        .create_async()
        .await;

    let err = client(&server).fetch_theme("warm-comfort").await.unwrap_err();
    assert_eq!(
        err,
        FetchError::Server {
            status: Some(502),
            message: "bad gateway".into()
        }
    );
}

#[tokio::test]
async fn rejects_partial_palettes() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/themes/partial")
        .with_status(200)
        .with_body(r##"{"meta":{"name":"Partial","slug":"partial"},"colors":{"primary":"#ff0000"}}"##)
        .create_async()
        .await;

    let err = client(&server).fetch_theme("partial").await.unwrap_err();
    assert!(matches!(err, FetchError::Server { status: None, .. }), "{err:?}");
}

#[tokio::test]
async fn unreachable_service_is_a_network_error() {
    // Nothing listens on port 9 (discard) in the test environment
    let client = ThemeClient::http("http://127.0.0.1:9", Duration::from_secs(5));
    let err = client.fetch_theme("warm-comfort").await.unwrap_err();
    assert_eq!(err.kind(), FetchErrorKind::Network);
}
