//! Identifier cleanup and roll-up stages
//!
//! Each stage takes a frame plus its lookup data and returns a new frame:
//!
//! 1. [`corrections`] - replace retired identifier codes
//! 2. [`membership`] - keep only members of a sub-population
//! 3. [`hierarchy`] - attach the coarser grouping label
//! 4. [`aggregate`] - roll up per (group, period)
//!
//! [`finalize`], [`derived`] and [`shortage`] produce output-ready tables
//! from combined or statistics-office input.

pub mod aggregate;
pub mod corrections;
pub mod derived;
pub mod finalize;
pub mod hierarchy;
pub mod membership;
pub mod shortage;

#[cfg(test)]
pub mod tests;

pub use aggregate::{AggregateFn, AggregationSpec, Measure, aggregate};
pub use corrections::{CorrectionMap, apply_corrections};
pub use derived::RatioIndicator;
pub use finalize::RegionFinalizer;
pub use hierarchy::{GroupMapping, attach_group};
pub use membership::{MembershipSet, filter_members};
pub use shortage::HousingShortage;
