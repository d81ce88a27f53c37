//! Statistical utilities for the MARF classifiers.
//!
//! This crate provides:
//!
//! - **Frequency tables**: occurrence counts with dense frequency ranks, the bookkeeping
//!   behind Zipf's law classification
//! - **Descriptive statistics**: min, max, mean, median and dispersion of classification
//!   outcomes
//!
//! # Modules
//!
//! - [`frequency`]: Frequency counting and ranking
//! - [`descriptive`]: Descriptive statistics for summarizing datasets
//!
//! # Examples
//!
//! ## Ranking observations by frequency
//!
//! ```
//! use marf_stats::frequency::FrequencyTable;
//!
//! let mut table = FrequencyTable::new();
//! table.observe_all(["b", "a", "b", "c", "b", "a"]);
//! table.rank();
//! let ranked = table.entries().iter().map(|e| (*e.key(), e.rank())).collect::<Vec<_>>();
//! assert_eq!(ranked, [("b", 1), ("a", 2), ("c", 3)]);
//! ```
//!
//! ## Computing descriptive statistics
//!
//! ```
//! use marf_stats::descriptive::DescriptiveStats;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let stats = DescriptiveStats::new(values).unwrap();
//! assert_eq!(stats.mean, 3.0);
//! ```

pub mod descriptive;
pub mod frequency;
