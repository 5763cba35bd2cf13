use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use news_analysis::{AnalysisError, FeedFetcher, FeedSource, FetchConfig, Fetcher, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::info;
use url::Url;

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .try_init()
            .ok();
    });
}

const ARTICLE_HTML: &str = r#"<html><body>
<nav><p>Skip to content</p></nav>
<article>
  <p>Parliament sat late into the night.</p>
  <p>The bill passed with a narrow majority.</p>
</article>
</body></html>"#;

/// A minimal HTTP/1.1 server answering from a fixed route table and counting hits per path.
struct TestServer {
    addr: SocketAddr,
    hits: Arc<Mutex<HashMap<String, usize>>>,
}

impl TestServer {
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(Mutex::new(HashMap::new()));

        let counter = Arc::clone(&hits);
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let counter = Arc::clone(&counter);
                tokio::spawn(async move { serve(stream, addr, counter).await });
            }
        });

        Self { addr, hits }
    }

    fn url(&self, path: &str) -> Url {
        Url::parse(&format!("http://{}{}", self.addr, path)).unwrap()
    }

    fn hits(&self, path: &str) -> usize {
        self.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }
}

async fn serve(mut stream: TcpStream, addr: SocketAddr, hits: Arc<Mutex<HashMap<String, usize>>>) {
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }

    let request = String::from_utf8_lossy(&request);
    let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();
    *hits.lock().unwrap().entry(path.clone()).or_default() += 1;

    let (status, content_type, body) = match path.as_str() {
        "/feed.xml" => ("200 OK", "application/rss+xml", feed_xml(addr)),
        "/article/1" => ("200 OK", "text/html", ARTICLE_HTML.to_string()),
        "/article/2" => ("404 Not Found", "text/html", "gone".to_string()),
        "/broken.xml" => ("500 Internal Server Error", "text/plain", "oops".to_string()),
        "/missing.xml" => ("404 Not Found", "text/plain", "not here".to_string()),
        "/page.html" => ("200 OK", "text/html", ARTICLE_HTML.to_string()),
        "/slow.xml" => {
            tokio::time::sleep(Duration::from_secs(3)).await;
            ("200 OK", "application/rss+xml", feed_xml(addr))
        }
        _ => ("404 Not Found", "text/plain", String::new()),
    };

    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(response.as_bytes()).await.ok();
    stream.shutdown().await.ok();
}

fn feed_xml(addr: SocketAddr) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Local News</title>
    <link>http://{addr}/</link>
    <description>Test feed</description>
    <item>
      <title>Late sitting</title>
      <link>http://{addr}/article/1</link>
      <description>&lt;p&gt;Parliament &lt;b&gt;sat late&lt;/b&gt;.&lt;/p&gt;</description>
      <pubDate>Wed, 01 May 2024 09:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Withdrawn story</title>
      <link>http://{addr}/article/2</link>
      <description>This story was withdrawn.</description>
    </item>
  </channel>
</rss>"#
    )
}

fn quick_config() -> FetchConfig {
    FetchConfig {
        timeout_seconds: 1,
        max_retries: 1,
        retry_delay_seconds: 0,
        ..FetchConfig::default()
    }
}

#[tokio::test]
async fn test_feed_is_fetched_and_parsed() -> Result<()> {
    init_tracing();
    let server = TestServer::start().await;
    let source = FeedFetcher::new(quick_config())?;

    let articles = source.fetch(&server.url("/feed.xml"), false).await?;
    info!("Fetched {} articles", articles.len());

    assert_eq!(articles.len(), 2);
    assert_eq!(articles[0].title, "Late sitting");
    assert_eq!(articles[0].link, server.url("/article/1"));
    let summary = articles[0].summary.as_deref().unwrap_or_default();
    assert!(summary.starts_with("Parliament sat late"), "{summary}");
    assert!(!summary.contains('<'));
    assert_eq!(articles[0].published.as_deref(), Some("Wed, 01 May 2024 09:00:00 GMT"));
    assert!(articles[1].published.is_none());
    assert!(articles.iter().all(|a| a.full_text.is_none()));

    // Bodies are only requested when asked for
    assert_eq!(server.hits("/article/1"), 0);
    Ok(())
}

#[tokio::test]
async fn test_full_text_is_resolved_per_article() -> Result<()> {
    init_tracing();
    let server = TestServer::start().await;
    let source = FeedFetcher::new(quick_config())?;

    let articles = source.fetch(&server.url("/feed.xml"), true).await?;

    assert_eq!(
        articles[0].full_text.as_deref(),
        Some("Parliament sat late into the night.\n\nThe bill passed with a narrow majority.")
    );
    // A missing page leaves the body empty without failing the feed
    assert!(articles[1].full_text.is_none());
    assert_eq!(articles[1].body(), Some("This story was withdrawn."));
    assert_eq!(server.hits("/article/2"), 1);
    Ok(())
}

#[tokio::test]
async fn test_server_errors_are_retried_then_reported() -> Result<()> {
    init_tracing();
    let server = TestServer::start().await;
    let fetcher = Fetcher::new(quick_config())?;

    let err = fetcher.fetch_feed(&server.url("/broken.xml")).await.unwrap_err();
    match err {
        AnalysisError::FeedUnavailable { source_url, cause } => {
            assert_eq!(source_url, server.url("/broken.xml").to_string());
            assert!(cause.contains("500"), "{cause}");
        }
        other => panic!("expected FeedUnavailable, got {other:?}"),
    }
    assert_eq!(server.hits("/broken.xml"), 2);
    Ok(())
}

#[tokio::test]
async fn test_client_errors_are_not_retried() -> Result<()> {
    init_tracing();
    let server = TestServer::start().await;
    let fetcher = Fetcher::new(quick_config())?;

    let err = fetcher.fetch_feed(&server.url("/missing.xml")).await.unwrap_err();
    assert!(matches!(err, AnalysisError::FeedUnavailable { .. }), "{err:?}");
    assert_eq!(server.hits("/missing.xml"), 1);
    Ok(())
}

#[tokio::test]
async fn test_slow_server_times_out() -> Result<()> {
    init_tracing();
    let server = TestServer::start().await;
    let source = FeedFetcher::new(quick_config())?;

    let err = source.fetch(&server.url("/slow.xml"), false).await.unwrap_err();
    assert_eq!(
        err,
        AnalysisError::Timeout {
            url: server.url("/slow.xml").to_string(),
            seconds: 1,
        }
    );
    assert_eq!(server.hits("/slow.xml"), 1);
    Ok(())
}

#[tokio::test]
async fn test_non_feed_document_is_rejected() -> Result<()> {
    init_tracing();
    let server = TestServer::start().await;
    let source = FeedFetcher::new(quick_config())?;

    let err = source.fetch(&server.url("/page.html"), false).await.unwrap_err();
    assert!(matches!(err, AnalysisError::FeedUnavailable { .. }), "{err:?}");
    Ok(())
}

#[tokio::test]
async fn test_unreachable_host_is_unavailable() -> Result<()> {
    init_tracing();
    // Bind then drop a listener so the port is very likely closed
    let addr = TcpListener::bind("127.0.0.1:0").await.unwrap().local_addr().unwrap();
    let source = FeedFetcher::new(quick_config())?;

    let url = Url::parse(&format!("http://{addr}/feed.xml")).unwrap();
    let err = source.fetch(&url, false).await.unwrap_err();
    assert!(
        matches!(err, AnalysisError::FeedUnavailable { .. } | AnalysisError::Timeout { .. }),
        "{err:?}"
    );
    Ok(())
}
