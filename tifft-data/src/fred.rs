use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::frame::{PriceFrame, Series};
use crate::source::{
    get_text, parse_csv_frame, parse_date, parse_value, truncate, SeriesReader, SeriesRequest,
};

/// Reader for the Federal Reserve Economic Data service.
///
/// Without an API key the public graph CSV endpoint is used; with a key the JSON
/// observations API is queried and the date range is applied server side.
pub struct FredReader {
    client: Client,
    base_url: String,
    api_url: String,
}

impl FredReader {
    /// `base_url` serves the graph CSV, `api_url` the observations API.
    pub fn new(client: Client, base_url: impl Into<String>, api_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_url: api_url.into(),
        }
    }

    fn endpoint(base: &str, path: &str) -> String {
        let base = base.trim_end_matches('/');
        format!("{base}/{path}")
    }

    async fn read_csv(&self, name: &str) -> Result<PriceFrame> {
        let body = get_text(
            self.client
                .get(Self::endpoint(&self.base_url, "graph/fredgraph.csv"))
                .query(&[("id", name)]),
        )
        .await?;
        let frame = parse_csv_frame(&body, name)?;
        // Column header follows the caller's spelling of the series id.
        rename_single_column(frame, name)
    }

    async fn read_api(&self, name: &str, api_key: &str, req: &SeriesRequest) -> Result<PriceFrame> {
        let mut params = vec![
            ("series_id", name.to_string()),
            ("api_key", api_key.to_string()),
            ("file_type", "json".to_string()),
        ];
        if let Some(start) = req.start {
            params.push(("observation_start", start.format("%Y-%m-%d").to_string()));
        }
        if let Some(end) = req.end {
            params.push(("observation_end", end.format("%Y-%m-%d").to_string()));
        }
        let body = get_text(
            self.client
                .get(Self::endpoint(&self.api_url, "fred/series/observations"))
                .query(&params),
        )
        .await?;

        let response: FredObservations = serde_json::from_str(&body).map_err(|err| {
            anyhow!(
                "failed to parse FRED response: {} (body snippet: {})",
                err,
                truncate(&body, 256)
            )
        })?;
        if let Some(message) = response.error_message {
            return Err(anyhow!("FRED returned error: {message}"));
        }

        let mut index = Vec::with_capacity(response.observations.len());
        let mut values = Vec::with_capacity(response.observations.len());
        for observation in response.observations {
            index.push(parse_date(&observation.date)?);
            values.push(
                parse_value(&observation.value)
                    .with_context(|| format!("{name}: observation {}", observation.date))?,
            );
        }
        PriceFrame::new(index, vec![Series::new(name, values)])
    }
}

#[async_trait]
impl SeriesReader for FredReader {
    async fn read_series(&self, name: &str, req: &SeriesRequest) -> Result<PriceFrame> {
        match req.api_key.as_deref() {
            Some(key) => self.read_api(name, key, req).await,
            None => self.read_csv(name).await,
        }
    }
}

#[derive(Deserialize)]
struct FredObservations {
    #[serde(default)]
    observations: Vec<FredObservation>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Deserialize)]
struct FredObservation {
    date: String,
    value: String,
}

fn rename_single_column(frame: PriceFrame, name: &str) -> Result<PriceFrame> {
    if frame.columns().len() != 1 {
        return Ok(frame);
    }
    let index = frame.index().to_vec();
    let values = frame.columns()[0].values.clone();
    PriceFrame::new(index, vec![Series::new(name, values)])
}
