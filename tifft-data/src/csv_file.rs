use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

use crate::frame::PriceFrame;
use crate::source::{parse_csv_frame, SeriesReader, SeriesRequest};

/// Reads a local CSV file; the dataset name is the file path.
#[derive(Clone, Copy, Debug, Default)]
pub struct CsvFileReader;

#[async_trait]
impl SeriesReader for CsvFileReader {
    async fn read_series(&self, name: &str, _req: &SeriesRequest) -> Result<PriceFrame> {
        let path = Path::new(name);
        let body = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        debug!(path = %path.display(), bytes = body.len(), "loaded csv file");
        parse_csv_frame(&body, name)
    }
}
