//! Time-series sources, dated price frames and table output for the `tifft` tools.

pub mod csv_file;
pub mod fred;
pub mod frame;
pub mod io;
pub mod source;
pub mod stooq;

pub use csv_file::CsvFileReader;
pub use fred::FredReader;
pub use frame::{PriceFrame, Series};
pub use source::{
    fetch_history, reader_for, DataSource, Endpoints, SeriesReader, SeriesRequest, FRED_API_URL,
    FRED_BASE_URL, STOOQ_BASE_URL,
};
pub use stooq::StooqReader;
