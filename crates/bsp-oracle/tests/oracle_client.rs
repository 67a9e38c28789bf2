//! Oracle client tests against a wiremock service.

use std::time::Duration;

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bsp_core::{Coordinate, PAGE_SIZE};
use bsp_oracle::{OracleClient, OracleConfig, OracleError};

fn fast_client(base_url: String) -> OracleClient {
    OracleClient::new(OracleConfig {
        base_url,
        timeout: Duration::from_secs(5),
        max_attempts: 5,
        initial_backoff: Duration::from_millis(5),
        max_backoff: Duration::from_millis(50),
    })
    .unwrap()
}

fn page_text() -> String {
    "the library is unlimited and cyclical ".chars().cycle().take(PAGE_SIZE).collect()
}

fn search_html(hexagon: &str) -> String {
    format!(
        "<div class=\"location\"><a class=\"intext\" \
         onclick=\"postform('{hexagon}','2','3','11','301')\">match</a></div>"
    )
}

#[tokio::test]
async fn search_parses_coordinate() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(search_html("0abc123")))
        .mount(&server)
        .await;

    let client = fast_client(server.uri());
    let coordinate = client.search(&page_text()).await.unwrap();
    assert_eq!(coordinate.hexagon, "0abc123");
    assert_eq!(coordinate.wall, 2);
    assert_eq!(coordinate.page, 301);
}

#[tokio::test]
async fn search_retries_transient_failures() {
    let server = MockServer::start().await;

    // Three 503s, then success: the call must survive with 4 requests.
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(3)
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(search_html("9def456")))
        .expect(1)
        .mount(&server)
        .await;

    let client = fast_client(server.uri());
    let coordinate = client.search(&page_text()).await.unwrap();
    assert_eq!(coordinate.hexagon, "9def456");
}

#[tokio::test]
async fn search_gives_up_after_max_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(500))
        .expect(5)
        .mount(&server)
        .await;

    let client = fast_client(server.uri());
    let err = client.search(&page_text()).await.unwrap_err();
    match err {
        OracleError::Unavailable { attempts, .. } => assert_eq!(attempts, 5),
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = fast_client(server.uri());
    let err = client.search(&page_text()).await.unwrap_err();
    assert!(matches!(err, OracleError::Protocol { .. }));
}

#[tokio::test]
async fn search_rejects_bad_input_without_network() {
    let client = fast_client("http://127.0.0.1:9".to_string());
    assert!(matches!(
        client.search("too short").await,
        Err(OracleError::InvalidPage { .. })
    ));
    let wrong: String = "A".repeat(PAGE_SIZE);
    assert!(matches!(
        client.search(&wrong).await,
        Err(OracleError::InvalidPage { .. })
    ));
}

#[tokio::test]
async fn fetch_returns_page_body() {
    let body = page_text();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/browse"))
        .and(query_param("hex", "0abc123"))
        .and(query_param("wall", "2"))
        .and(query_param("page", "301"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(format!("<pre id=\"textblock\">{body}</pre>")),
        )
        .mount(&server)
        .await;

    let client = fast_client(server.uri());
    let coordinate = Coordinate::new("0abc123", 2, 3, 11, 301).unwrap();
    assert_eq!(client.fetch(&coordinate).await.unwrap(), body);
}

#[tokio::test]
async fn fetch_rejects_short_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/browse"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<pre id=\"textblock\">abc</pre>"),
        )
        .mount(&server)
        .await;

    let client = fast_client(server.uri());
    let coordinate = Coordinate::new("0abc123", 1, 1, 1, 1).unwrap();
    assert!(matches!(
        client.fetch(&coordinate).await,
        Err(OracleError::Protocol { .. })
    ));
}

#[tokio::test]
async fn fetch_rejects_invalid_coordinate_without_network() {
    let client = fast_client("http://127.0.0.1:9".to_string());
    let coordinate = Coordinate {
        hexagon: "ok".to_string(),
        wall: 9,
        shelf: 1,
        volume: 1,
        page: 1,
    };
    assert!(matches!(
        client.fetch(&coordinate).await,
        Err(OracleError::InvalidCoordinate { .. })
    ));
}
