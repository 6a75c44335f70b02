// src/services/feed.rs

//! Remote event feed client.
//!
//! Pages through the event collection listing by following the `next`
//! cursor returned with each response.

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::models::CandidateEvent;

/// One page of the event listing.
#[derive(Debug, Deserialize)]
pub struct FeedPage {
    /// Events on this page
    pub results: Vec<CandidateEvent>,

    /// URL of the next page, absent on the last page
    #[serde(default)]
    pub next: Option<String>,
}

/// Client for the remote event feed.
pub struct FeedClient {
    client: Client,
    base_url: String,
}

impl FeedClient {
    /// Create a new feed client for the given collection endpoint.
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Fetch the full unfiltered candidate set.
    ///
    /// Pagination is strictly sequential: each page's cursor comes from the
    /// previous response. A non-success status on any page aborts the run.
    pub async fn fetch_all(&self) -> Result<Vec<CandidateEvent>> {
        let mut events = Vec::new();
        let mut url = Some(self.base_url.clone());

        while let Some(page_url) = url {
            let page = self.fetch_page(&page_url).await?;
            debug!("Fetched {} events from {}", page.results.len(), page_url);
            events.extend(page.results);
            url = page.next;
        }

        Ok(events)
    }

    /// Fetch and decode a single listing page.
    async fn fetch_page(&self, url: &str) -> Result<FeedPage> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(AppError::feed(url, response.status()));
        }
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn bind() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        (listener, base)
    }

    /// Serve canned responses keyed by request path until the test ends.
    fn serve(listener: TcpListener, routes: HashMap<String, (u16, String)>) {
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let routes = routes.clone();
                tokio::spawn(async move {
                    let mut request = Vec::new();
                    let mut chunk = [0u8; 1024];
                    loop {
                        match socket.read(&mut chunk).await {
                            Ok(0) | Err(_) => break,
                            Ok(n) => {
                                request.extend_from_slice(&chunk[..n]);
                                if request.windows(4).any(|w| w == b"\r\n\r\n") {
                                    break;
                                }
                            }
                        }
                    }
                    let request = String::from_utf8_lossy(&request);
                    let path = request.split_whitespace().nth(1).unwrap_or("/");
                    let (status, body) = routes
                        .get(path)
                        .cloned()
                        .unwrap_or((404, String::new()));
                    let reason = if status == 200 { "OK" } else { "Error" };
                    let response = format!(
                        "HTTP/1.1 {status} {reason}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                });
            }
        });
    }

    #[tokio::test]
    async fn test_fetch_all_follows_next_cursor_across_pages() {
        let (listener, base) = bind().await;
        let mut routes = HashMap::new();
        routes.insert(
            "/events/".to_string(),
            (
                200,
                format!(
                    r#"{{"results":[{{"id":1,"name":"E1","starts_on":"2030-06-01T20:00:00Z","slug":"e1","is_published":true}}],"next":"{base}/events/?page=2"}}"#
                ),
            ),
        );
        routes.insert(
            "/events/?page=2".to_string(),
            (
                200,
                r#"{"results":[{"id":2,"name":"E2","starts_on":"2030-06-02T20:00:00Z","slug":"e2","is_published":true}],"next":null}"#
                    .to_string(),
            ),
        );
        serve(listener, routes);

        let client = FeedClient::new(reqwest::Client::new(), format!("{base}/events/"));
        let events = client.fetch_all().await.unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id, 1);
        assert_eq!(events[1].id, 2);
    }

    #[tokio::test]
    async fn test_fetch_all_aborts_on_failed_page() {
        let (listener, base) = bind().await;
        let mut routes = HashMap::new();
        routes.insert(
            "/events/".to_string(),
            (
                200,
                format!(
                    r#"{{"results":[{{"id":1,"name":"E1","starts_on":"2030-06-01T20:00:00Z","slug":"e1","is_published":true}}],"next":"{base}/events/?page=2"}}"#
                ),
            ),
        );
        routes.insert("/events/?page=2".to_string(), (500, String::new()));
        serve(listener, routes);

        let client = FeedClient::new(reqwest::Client::new(), format!("{base}/events/"));
        let result = client.fetch_all().await;

        assert!(matches!(result, Err(AppError::Feed { .. })));
    }

    #[test]
    fn test_page_with_next_cursor() {
        let json = r#"{
            "results": [
                {"id": 1, "name": "E1", "starts_on": "2030-06-01T20:00:00Z",
                 "slug": "e1", "is_published": true}
            ],
            "next": "https://feed.example.com/events/?page=2"
        }"#;
        let page: FeedPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.results.len(), 1);
        assert_eq!(
            page.next.as_deref(),
            Some("https://feed.example.com/events/?page=2")
        );
    }

    #[test]
    fn test_last_page_null_cursor() {
        let json = r#"{"results": [], "next": null}"#;
        let page: FeedPage = serde_json::from_str(json).unwrap();
        assert!(page.results.is_empty());
        assert!(page.next.is_none());
    }

    #[test]
    fn test_last_page_missing_cursor() {
        let json = r#"{"results": []}"#;
        let page: FeedPage = serde_json::from_str(json).unwrap();
        assert!(page.next.is_none());
    }
}
