use anyhow::{bail, Result};
use async_trait::async_trait;
use reqwest::Client;

use crate::frame::PriceFrame;
use crate::source::{get_text, parse_csv_frame, SeriesReader, SeriesRequest};

const PRIMARY_COLUMN: &str = "Close";

/// Reader for Stooq daily OHLCV quotes. The close price is the primary column.
pub struct StooqReader {
    client: Client,
    base_url: String,
}

impl StooqReader {
    /// Reader against `base_url`, normally [`crate::source::STOOQ_BASE_URL`].
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/q/d/l/", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl SeriesReader for StooqReader {
    async fn read_series(&self, name: &str, req: &SeriesRequest) -> Result<PriceFrame> {
        let mut params = vec![("s", name.to_ascii_lowercase()), ("i", "d".to_string())];
        if let Some(start) = req.start {
            params.push(("d1", start.format("%Y%m%d").to_string()));
        }
        if let Some(end) = req.end {
            params.push(("d2", end.format("%Y%m%d").to_string()));
        }
        let body = get_text(self.client.get(self.endpoint()).query(&params)).await?;
        if body.trim().eq_ignore_ascii_case("no data") {
            bail!("stooq has no data for {name}");
        }
        parse_csv_frame(&body, name)?.with_primary(PRIMARY_COLUMN)
    }
}
