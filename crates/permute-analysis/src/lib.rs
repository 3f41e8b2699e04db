//! Missing-data analysis on top of `permute-stats`
//!
//! This crate applies two-sample permutation tests to tables with missing
//! values, to work out how the missingness of each column relates to the
//! other observed columns.
//!
//! # Overview
//!
//! 1. **Load a table** ([`table::Table`]): named columns of nullable cells,
//!    usually deserialized from a JSON array of records
//! 2. **Classify columns** ([`table::ColumnKind`]): categorical columns are
//!    compared with total variation distance, quantitative ones with the
//!    Kolmogorov–Smirnov statistic
//! 3. **Test pairs** ([`missingness::missingness_test`]): does the missingness
//!    of one column depend on another column?
//! 4. **Report** ([`missingness::MissingnessReport`]): for every column with
//!    missing values, the list of columns its missingness depends on
//!
//! # Examples
//!
//! ```
//! use permute_analysis::{
//!     missingness::{MissingnessConfig, missingness_test},
//!     table::Table,
//! };
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//!
//! let table: Table = serde_json::from_str(
//!     r#"[
//!         { "day": "Mon", "temp": 2.0, "wind": null },
//!         { "day": "Tue", "temp": 15.0, "wind": 4.0 },
//!         { "day": "Wed", "temp": 3.5, "wind": null },
//!         { "day": "Thu", "temp": 18.0, "wind": 6.5 }
//!     ]"#,
//! )?;
//!
//! let config = MissingnessConfig {
//!     trials: 100,
//!     seed: Some(0),
//!     ..MissingnessConfig::default()
//! };
//! let test = missingness_test(&table, "wind", "temp", &config)?;
//! println!("KS = {:.2}, p = {:.2}", test.observed, test.p_value);
//! # Ok(())
//! # }
//! ```

pub mod missingness;
pub mod table;
