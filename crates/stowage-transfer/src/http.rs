//! Artifacts served over HTTP by a remote agent.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use percent_encoding::percent_decode_str;
use reqwest::header::{CONTENT_LENGTH, LAST_MODIFIED};
use reqwest::{Client, Url};
use std::io;
use stowage_core::models::base_name;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::OnceCell;

use crate::file::ArtifactFile;

/// What a single HEAD request told us about the file
#[derive(Debug, Clone)]
struct HeadInfo {
    length: Option<u64>,
    last_modified: Option<DateTime<Utc>>,
}

/// A file held by a remote agent and fetched over HTTP.
///
/// Always remote: the engine either streams it straight into storage or stages
/// it to a local temporary file first. Names come from the decoded URL path.
#[derive(Debug, Clone)]
pub struct HttpArtifactFile {
    client: Client,
    url: Url,
    full_path: String,
    base_name: String,
    head: OnceCell<HeadInfo>,
}

impl HttpArtifactFile {
    pub fn new(client: Client, url: &str) -> io::Result<Self> {
        let url = Url::parse(url).map_err(|e| {
            io::Error::new(io::ErrorKind::InvalidInput, format!("{}: {}", url, e))
        })?;
        let full_path = percent_decode_str(url.path())
            .decode_utf8_lossy()
            .into_owned();
        let base_name = base_name(&full_path).to_string();
        if base_name.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} does not name a file", url),
            ));
        }
        Ok(Self {
            client,
            url,
            full_path,
            base_name,
            head: OnceCell::new(),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn head(&self) -> io::Result<&HeadInfo> {
        self.head
            .get_or_try_init(|| async {
                let response = self
                    .client
                    .head(self.url.clone())
                    .send()
                    .await
                    .and_then(|response| response.error_for_status())
                    .map_err(io::Error::other)?;

                let headers = response.headers();
                Ok::<_, io::Error>(HeadInfo {
                    length: headers
                        .get(CONTENT_LENGTH)
                        .and_then(|value| value.to_str().ok())
                        .and_then(|value| value.parse().ok()),
                    last_modified: headers
                        .get(LAST_MODIFIED)
                        .and_then(|value| value.to_str().ok())
                        .and_then(|value| DateTime::parse_from_rfc2822(value).ok())
                        .map(|date| date.with_timezone(&Utc)),
                })
            })
            .await
    }
}

#[async_trait]
impl ArtifactFile for HttpArtifactFile {
    fn is_remote(&self) -> bool {
        true
    }

    async fn length(&self) -> io::Result<u64> {
        self.head().await?.length.ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{} did not report a Content-Length", self.url),
            )
        })
    }

    async fn last_modified(&self) -> io::Result<DateTime<Utc>> {
        Ok(self.head().await?.last_modified.unwrap_or_else(|| {
            tracing::debug!(url = %self.url, "No Last-Modified header, using current time");
            Utc::now()
        }))
    }

    fn base_name(&self) -> &str {
        &self.base_name
    }

    fn full_path(&self) -> &str {
        &self.full_path
    }

    async fn copy_to(&self, writer: &mut (dyn AsyncWrite + Send + Unpin)) -> io::Result<u64> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(io::Error::other)?;

        let mut stream = response.bytes_stream();
        let mut total = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(io::Error::other)?;
            writer.write_all(&chunk).await?;
            total += chunk.len() as u64;
        }
        writer.flush().await?;
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    const BODY: &[u8] = b"agent bytes";

    /// Minimal HTTP/1.1 agent serving `BODY`; returns its address and the
    /// number of HEAD requests it has answered.
    async fn serve_agent() -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let heads = Arc::new(AtomicUsize::new(0));
        let counter = heads.clone();

        tokio::spawn(async move {
            loop {
                let (mut socket, _) = match listener.accept().await {
                    Ok(accepted) => accepted,
                    Err(_) => return,
                };
                let counter = counter.clone();
                tokio::spawn(async move {
                    let mut request = Vec::new();
                    let mut buf = [0u8; 1024];
                    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        let read = socket.read(&mut buf).await.unwrap();
                        if read == 0 {
                            return;
                        }
                        request.extend_from_slice(&buf[..read]);
                    }
                    let is_head = request.starts_with(b"HEAD");
                    if is_head {
                        counter.fetch_add(1, Ordering::SeqCst);
                    }
                    let mut response = format!(
                        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nLast-Modified: Wed, 21 Oct 2015 07:28:00 GMT\r\nConnection: close\r\n\r\n",
                        BODY.len()
                    )
                    .into_bytes();
                    if !is_head {
                        response.extend_from_slice(BODY);
                    }
                    socket.write_all(&response).await.unwrap();
                    socket.shutdown().await.ok();
                });
            }
        });

        (format!("http://{}", addr), heads)
    }

    #[test]
    fn names_come_from_url_path() {
        let file =
            HttpArtifactFile::new(Client::new(), "http://agent-1:8080/ws/target/app.jar").unwrap();
        assert!(file.is_remote());
        assert_eq!(file.full_path(), "/ws/target/app.jar");
        assert_eq!(file.base_name(), "app.jar");
    }

    #[test]
    fn names_are_percent_decoded() {
        let file =
            HttpArtifactFile::new(Client::new(), "http://agent-1:8080/ws/my%20app%2Bv2.jar")
                .unwrap();
        assert_eq!(file.full_path(), "/ws/my app+v2.jar");
        assert_eq!(file.base_name(), "my app+v2.jar");
    }

    #[test]
    fn rejects_urls_without_file_name() {
        assert!(HttpArtifactFile::new(Client::new(), "http://agent-1:8080/ws/").is_err());
        assert!(HttpArtifactFile::new(Client::new(), "not a url").is_err());
    }

    #[tokio::test]
    async fn length_and_last_modified_share_one_head_request() {
        let (base, heads) = serve_agent().await;
        let file = HttpArtifactFile::new(Client::new(), &format!("{}/ws/app.jar", base)).unwrap();

        assert_eq!(file.length().await.unwrap(), BODY.len() as u64);
        let modified = file.last_modified().await.unwrap();
        assert_eq!(modified.to_rfc2822(), "Wed, 21 Oct 2015 07:28:00 +0000");
        assert_eq!(heads.load(Ordering::SeqCst), 1);

        let mut sink = Vec::new();
        assert_eq!(file.copy_to(&mut sink).await.unwrap(), BODY.len() as u64);
        assert_eq!(sink, BODY);
        assert_eq!(heads.load(Ordering::SeqCst), 1);
    }
}
