pub mod series;
pub mod types;

pub use series::{AugmentedSeries, Column, ColumnLabel};
pub use types::{BarRequest, Candle};
