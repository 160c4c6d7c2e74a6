//! Price/gain data source port trait.

use crate::domain::error::FundMetricsError;
use crate::domain::series::SeriesTable;
use chrono::NaiveDate;

pub trait PriceSource {
    /// Loads the requested funds over `[from, to]` (either bound optional).
    /// Dates in the returned table are ascending and unique.
    fn load(
        &self,
        funds: &[String],
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<SeriesTable, FundMetricsError>;

    fn list_funds(&self) -> Result<Vec<String>, FundMetricsError>;
}
