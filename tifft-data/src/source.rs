use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::csv_file::CsvFileReader;
use crate::fred::FredReader;
use crate::frame::{PriceFrame, Series};
use crate::stooq::StooqReader;

pub const FRED_BASE_URL: &str = "https://fred.stlouisfed.org";
pub const FRED_API_URL: &str = "https://api.stlouisfed.org";
pub const STOOQ_BASE_URL: &str = "https://stooq.com";

/// Remote (or local) provider of dated time series.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Federal Reserve Economic Data.
    #[default]
    Fred,
    /// Stooq daily quotes.
    Stooq,
    /// Local CSV files; the dataset name is a path.
    Csv,
}

impl DataSource {
    /// Lowercase name, as accepted by `FromStr`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fred => "fred",
            Self::Stooq => "stooq",
            Self::Csv => "csv",
        }
    }

    /// Whether several dataset names are fetched and joined into one frame.
    pub fn joins_names(&self) -> bool {
        matches!(self, Self::Fred | Self::Csv)
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataSource {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fred" => Ok(Self::Fred),
            "stooq" => Ok(Self::Stooq),
            "csv" | "file" => Ok(Self::Csv),
            other => Err(anyhow!("unsupported data source: {other}")),
        }
    }
}

/// Parameters for a series download request.
#[derive(Clone, Debug)]
pub struct SeriesRequest {
    /// Dataset names, in the order they are joined.
    pub names: Vec<String>,
    pub source: DataSource,
    /// Optional key; FRED switches to its JSON API when set.
    pub api_key: Option<String>,
    /// First date kept, inclusive.
    pub start: Option<NaiveDate>,
    /// Last date kept, inclusive.
    pub end: Option<NaiveDate>,
}

impl SeriesRequest {
    /// A request without key or date range.
    pub fn new(names: Vec<String>, source: DataSource) -> Self {
        Self {
            names,
            source,
            api_key: None,
            start: None,
            end: None,
        }
    }

    /// Sets the API key; an empty key counts as none.
    #[must_use]
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|key| !key.is_empty());
        self
    }

    #[must_use]
    pub fn with_range(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start = start;
        self.end = end;
        self
    }
}

/// Base URLs and timeouts used by the HTTP readers.
#[derive(Clone, Debug)]
pub struct Endpoints {
    pub fred_base_url: String,
    pub fred_api_url: String,
    pub stooq_base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            fred_base_url: FRED_BASE_URL.to_string(),
            fred_api_url: FRED_API_URL.to_string(),
            stooq_base_url: STOOQ_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[async_trait]
pub trait SeriesReader: Send + Sync {
    /// Fetch a single dataset as a date-indexed frame.
    async fn read_series(&self, name: &str, req: &SeriesRequest) -> Result<PriceFrame>;
}

/// Builds the reader serving `source`.
pub fn reader_for(source: DataSource, endpoints: &Endpoints) -> Result<Box<dyn SeriesReader>> {
    let client = reqwest::Client::builder()
        .timeout(endpoints.timeout)
        .build()
        .context("failed to build HTTP client")?;
    Ok(match source {
        DataSource::Fred => Box::new(FredReader::new(
            client,
            &endpoints.fred_base_url,
            &endpoints.fred_api_url,
        )),
        DataSource::Stooq => Box::new(StooqReader::new(client, &endpoints.stooq_base_url)),
        DataSource::Csv => Box::new(CsvFileReader),
    })
}

/// Fetch every requested dataset and combine them into one frame.
///
/// Sources that support it join all names on date; the others only read the first name.
pub async fn fetch_history(reader: &dyn SeriesReader, req: &SeriesRequest) -> Result<PriceFrame> {
    let Some(first) = req.names.first() else {
        bail!("at least one dataset name is required");
    };
    let names: &[String] = if req.source.joins_names() {
        &req.names
    } else {
        std::slice::from_ref(first)
    };

    let mut joined: Option<PriceFrame> = None;
    for name in names {
        debug!(source = %req.source, name = name.as_str(), "reading series");
        let frame = reader
            .read_series(name, req)
            .await
            .with_context(|| format!("failed to read {name} from {}", req.source))?;
        joined = Some(match joined {
            Some(acc) => acc.outer_join(frame),
            None => frame,
        });
    }
    let frame = joined.unwrap_or_default().between(req.start, req.end);
    info!(
        source = %req.source,
        rows = frame.len(),
        columns = frame.columns().len(),
        "fetched history"
    );
    Ok(frame)
}

/// Parses a numeric cell; blanks and the usual missing markers map to `None`.
pub(crate) fn parse_value(raw: &str) -> Result<Option<f64>> {
    match raw.trim() {
        "" | "." | "NaN" | "nan" | "NA" | "null" => Ok(None),
        other => other
            .parse::<f64>()
            .map(|v| Some(v).filter(|v| !v.is_nan()))
            .with_context(|| format!("invalid number {other:?}")),
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y%m%d"))
        .with_context(|| format!("invalid date {raw:?}"))
}

/// Reads a CSV document whose first column is a date and remaining columns are numeric.
pub(crate) fn parse_csv_frame(body: &str, label: &str) -> Result<PriceFrame> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());
    let headers = reader
        .headers()
        .with_context(|| format!("failed to read CSV header for {label}"))?
        .clone();
    if headers.len() < 2 {
        bail!(
            "{label}: expected a date column followed by data columns, got {:?}",
            truncate(body, 128)
        );
    }

    let mut index = Vec::new();
    let mut columns: Vec<Vec<Option<f64>>> = vec![Vec::new(); headers.len() - 1];
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("{label}: malformed CSV row {}", line + 2))?;
        let Some(raw_date) = record.get(0) else {
            continue;
        };
        index.push(parse_date(raw_date).with_context(|| format!("{label}: row {}", line + 2))?);
        for (col, values) in columns.iter_mut().enumerate() {
            let value = match record.get(col + 1) {
                Some(raw) => parse_value(raw).with_context(|| {
                    format!("{label}: row {}, column {}", line + 2, &headers[col + 1])
                })?,
                None => None,
            };
            values.push(value);
        }
    }

    let series = headers
        .iter()
        .skip(1)
        .zip(columns)
        .map(|(name, values)| Series::new(name, values))
        .collect();
    PriceFrame::new(index, series)
}

pub(crate) async fn get_text(request: reqwest::RequestBuilder) -> Result<String> {
    let response = request.send().await.context("request to data source failed")?;
    let status = response.status();
    let url = response.url().clone();
    let body = response
        .text()
        .await
        .context("failed to read data source response body")?;
    debug!(%url, %status, "data source response: {}", truncate(&body, 512));
    if !status.is_success() {
        return Err(anyhow!(
            "data source responded with status {}: {}",
            status,
            truncate(&body, 256)
        ));
    }
    Ok(body)
}

pub(crate) fn truncate(body: &str, max: usize) -> String {
    if body.len() <= max {
        body.to_string()
    } else {
        let mut end = max;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &body[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FixedReader(HashMap<&'static str, PriceFrame>);

    #[async_trait]
    impl SeriesReader for FixedReader {
        async fn read_series(&self, name: &str, _req: &SeriesRequest) -> Result<PriceFrame> {
            self.0
                .get(name)
                .cloned()
                .ok_or_else(|| anyhow!("unknown series {name}"))
        }
    }

    fn fixed() -> FixedReader {
        let a = parse_csv_frame("DATE,A\n2024-01-01,1\n2024-01-02,2\n", "A").unwrap();
        let b = parse_csv_frame("DATE,B\n2024-01-02,20\n2024-01-03,30\n", "B").unwrap();
        FixedReader(HashMap::from([("A", a), ("B", b)]))
    }

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn parses_sources() {
        assert_eq!("FRED".parse::<DataSource>().unwrap(), DataSource::Fred);
        assert_eq!("file".parse::<DataSource>().unwrap(), DataSource::Csv);
        assert!("yahoo".parse::<DataSource>().is_err());
    }

    #[test]
    fn parses_values_and_dates() {
        assert_eq!(parse_value(" 1.5 ").unwrap(), Some(1.5));
        assert_eq!(parse_value(".").unwrap(), None);
        assert_eq!(parse_value("").unwrap(), None);
        assert_eq!(parse_value("NaN").unwrap(), None);
        for bad in ["abc", "N/A", "1,234.5"] {
            let err = parse_value(bad).unwrap_err();
            assert!(err.to_string().contains("invalid number"));
        }
        assert_eq!(
            parse_date("20240105").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
        );
        assert!(parse_date("05/01/2024").is_err());
    }

    #[test]
    fn parses_csv_documents() {
        let frame = parse_csv_frame("DATE,SP500\n2024-01-02,4742.83\n2024-01-01,.\n", "SP500")
            .unwrap();
        assert_eq!(frame.column_names(), vec!["SP500"]);
        assert_eq!(frame.primary().unwrap().values, vec![None, Some(4742.83)]);
        assert!(parse_csv_frame("No data", "X").is_err());
    }

    #[test]
    fn rejects_unparseable_cells() {
        let err = parse_csv_frame(
            "DATE,SP500\n2024-01-01,4742.83\n2024-01-02,N/A\n",
            "SP500",
        )
        .unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("SP500: row 3, column SP500"));
        assert!(message.contains("invalid number \"N/A\""));
    }

    #[tokio::test]
    async fn joins_names_for_fred() {
        let req = SeriesRequest::new(names(&["A", "B"]), DataSource::Fred);
        let frame = fetch_history(&fixed(), &req).await.unwrap();
        assert_eq!(frame.column_names(), vec!["A", "B"]);
        assert_eq!(frame.len(), 3);
    }

    #[tokio::test]
    async fn reads_only_first_name_for_stooq() {
        let req = SeriesRequest::new(names(&["A", "B"]), DataSource::Stooq);
        let frame = fetch_history(&fixed(), &req).await.unwrap();
        assert_eq!(frame.column_names(), vec!["A"]);
    }

    #[tokio::test]
    async fn applies_date_range() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2);
        let req = SeriesRequest::new(names(&["A", "B"]), DataSource::Fred).with_range(start, None);
        let frame = fetch_history(&fixed(), &req).await.unwrap();
        assert_eq!(frame.len(), 2);
    }

    #[tokio::test]
    async fn reports_failing_series() {
        let req = SeriesRequest::new(names(&["Z"]), DataSource::Fred);
        let err = fetch_history(&fixed(), &req).await.unwrap_err();
        assert!(format!("{err:#}").contains("unknown series Z"));
        let empty = SeriesRequest::new(Vec::new(), DataSource::Fred);
        assert!(fetch_history(&fixed(), &empty).await.is_err());
    }

    #[test]
    fn truncates_on_char_boundaries() {
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("héllo", 2), "h…");
    }
}
