//! Map classification of numeric attribute columns.
//!
//! Partitions a column of values into ordered classes using one of a fixed
//! set of statistical methods (equal interval, quantiles, Fisher-Jenks,
//! head/tail breaks and others) and reports each class's bounds and
//! membership.
//!
//! # Example
//!
//! ```rust
//! use classification::{classify, Method};
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
//! let result = classify(&values, Method::EqualInterval, Some(3), None).unwrap();
//!
//! assert_eq!(result.counts(), &[3, 3, 3]);
//! assert_eq!(result.assignments()[4], 1);
//! ```

pub mod breaks;
pub mod classification;
pub mod error;
pub mod method;
pub mod stats;

pub use classification::{classify, ClassBreak, Classification};
pub use error::{ClassifyError, ClassifyResult};
pub use method::{Method, ParameterKind};
pub use stats::SortedValues;
