use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::io;
use stowage_transfer::ArtifactFile;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// A remote artifact whose bytes live in memory
pub struct MemoryArtifactFile {
    full_path: String,
    content: Vec<u8>,
    /// Bytes delivered before the connection "drops"
    fail_after: Option<usize>,
}

impl MemoryArtifactFile {
    pub fn new(full_path: &str, content: &[u8]) -> Self {
        Self {
            full_path: full_path.to_string(),
            content: content.to_vec(),
            fail_after: None,
        }
    }

    pub fn failing_after(full_path: &str, content: &[u8], delivered: usize) -> Self {
        Self {
            fail_after: Some(delivered),
            ..Self::new(full_path, content)
        }
    }
}

#[async_trait]
impl ArtifactFile for MemoryArtifactFile {
    fn is_remote(&self) -> bool {
        true
    }

    async fn length(&self) -> io::Result<u64> {
        Ok(self.content.len() as u64)
    }

    async fn last_modified(&self) -> io::Result<DateTime<Utc>> {
        Ok(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
    }

    fn base_name(&self) -> &str {
        self.full_path.rsplit('/').next().unwrap_or_default()
    }

    fn full_path(&self) -> &str {
        &self.full_path
    }

    async fn copy_to(&self, writer: &mut (dyn AsyncWrite + Send + Unpin)) -> io::Result<u64> {
        match self.fail_after {
            Some(delivered) => {
                writer.write_all(&self.content[..delivered]).await?;
                writer.flush().await?;
                Err(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "agent connection lost",
                ))
            }
            None => {
                writer.write_all(&self.content).await?;
                writer.flush().await?;
                Ok(self.content.len() as u64)
            }
        }
    }
}
