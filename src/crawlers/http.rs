use crate::config::SearchConfig;
use crate::crawlers::Fetcher;
use crate::results::FetchFailure;
use async_trait::async_trait;
use reqwest::Client;
use url::Url;

/// Fetches pages with plain HTTP GET requests
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Builds a fetcher whose requests time out after `config.request_timeout_secs`
    pub fn new(config: &SearchConfig) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder().timeout(config.request_timeout());
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Wraps an existing client (its own timeout settings apply)
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, FetchFailure> {
        let start = std::time::Instant::now();
        ::log::debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(transport_failure)?;

        let status = response.status();
        if !status.is_success() {
            ::log::warn!("{} responded with {}", url, status);
            return Err(FetchFailure::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(transport_failure)?;
        ::log::debug!(
            "Fetched {} ({} bytes) in {:.2} seconds",
            url,
            body.len(),
            start.elapsed().as_secs_f64()
        );
        Ok(body)
    }
}

fn transport_failure(error: reqwest::Error) -> FetchFailure {
    if error.is_timeout() {
        FetchFailure::Timeout
    } else {
        FetchFailure::Transport(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one canned HTTP response on a local port and returns its URL
    async fn serve_once(response: &'static str) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });

        Url::parse(&format!("http://{}/page/1", addr)).unwrap()
    }

    #[tokio::test]
    async fn test_ok_response_returns_body() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 17\r\nConnection: close\r\n\r\n<p>Hello NEWS</p>",
        )
        .await;

        let fetcher = HttpFetcher::new(&SearchConfig::default()).unwrap();
        let body = fetcher.fetch(&url).await.unwrap();
        assert_eq!(body, "<p>Hello NEWS</p>");
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let url = serve_once(
            "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;

        let fetcher = HttpFetcher::new(&SearchConfig::default()).unwrap();
        assert_eq!(fetcher.fetch(&url).await, Err(FetchFailure::Status(404)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_failure() {
        // Reserve a port, then close it so nothing is listening
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = Url::parse(&format!("http://{}/", addr)).unwrap();
        let fetcher = HttpFetcher::new(&SearchConfig::default()).unwrap();
        assert!(matches!(
            fetcher.fetch(&url).await,
            Err(FetchFailure::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_slow_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
        });

        let config = SearchConfig {
            request_timeout_secs: 1,
            ..SearchConfig::default()
        };
        let url = Url::parse(&format!("http://{}/", addr)).unwrap();
        let fetcher = HttpFetcher::new(&config).unwrap();
        assert_eq!(fetcher.fetch(&url).await, Err(FetchFailure::Timeout));
    }
}
