//! Detector result sources

use std::future::Future;
use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing::{debug, info};

use crate::{LandmarkError, LandmarkFrame};

/// Supplier of per-frame detector results
pub trait LandmarkSource {
    /// Next detector result, `Ok(None)` once the stream is exhausted
    fn next_frame(
        &mut self,
    ) -> impl Future<Output = Result<Option<LandmarkFrame>, LandmarkError>> + Send;
}

/// Replays recorded detector output, one JSON object per line
pub struct ReplaySource<R> {
    lines: Lines<R>,
    line: u64,
}

impl ReplaySource<BufReader<File>> {
    /// Open a JSON Lines recording
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, LandmarkError> {
        let path = path.as_ref();
        let file = File::open(path).await.map_err(|source| LandmarkError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Opened landmark replay {}", path.display());
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: AsyncBufRead + Unpin> ReplaySource<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
        }
    }
}

impl<R: AsyncBufRead + Unpin + Send> LandmarkSource for ReplaySource<R> {
    async fn next_frame(&mut self) -> Result<Option<LandmarkFrame>, LandmarkError> {
        loop {
            let Some(text) = self.lines.next_line().await? else {
                debug!("Landmark replay exhausted after {} lines", self.line);
                return Ok(None);
            };
            self.line += 1;

            if text.trim().is_empty() {
                continue;
            }

            let mut frame: LandmarkFrame =
                serde_json::from_str(&text).map_err(|source| LandmarkError::Parse {
                    line: self.line,
                    source,
                })?;
            if frame.sequence == 0 {
                frame.sequence = self.line;
            }
            return Ok(Some(frame));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replay_reads_frames_in_order() {
        let data = concat!(
            r#"{"timestamp_ms":0,"landmarks":null}"#,
            "\n\n",
            r#"{"timestamp_ms":33,"landmarks":[{"x":0.5,"y":0.5,"z":0.0}]}"#,
            "\n",
        );
        let mut source = ReplaySource::from_reader(data.as_bytes());

        let first = source.next_frame().await.unwrap().unwrap();
        assert!(!first.face_detected());
        assert_eq!(first.sequence, 1);

        // Blank line is skipped
        let second = source.next_frame().await.unwrap().unwrap();
        assert!(second.face_detected());
        assert_eq!(second.timestamp_ms, 33);
        assert_eq!(second.sequence, 3);

        assert!(source.next_frame().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_line_reports_position() {
        let data = "{\"timestamp_ms\":0}\nnot json\n{\"timestamp_ms\":66}\n";
        let mut source = ReplaySource::from_reader(data.as_bytes());

        assert!(source.next_frame().await.unwrap().is_some());
        match source.next_frame().await {
            Err(LandmarkError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {:?}", other),
        }

        // The stream continues after a bad line
        let next = source.next_frame().await.unwrap().unwrap();
        assert_eq!(next.timestamp_ms, 66);
    }

    #[tokio::test]
    async fn test_open_missing_file() {
        let result = ReplaySource::open("/nonexistent/driver-guard/replay.jsonl").await;
        assert!(matches!(result, Err(LandmarkError::Open { .. })));
    }
}
