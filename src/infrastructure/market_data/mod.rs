pub mod csv_source;
pub mod yahoo;

pub use csv_source::CsvBarSource;
pub use yahoo::YahooChartSource;
