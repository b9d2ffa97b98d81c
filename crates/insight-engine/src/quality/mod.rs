//! Dataset quality assessment.
//!
//! This module produces structural and missingness snapshots of a dataset. The
//! processor takes one before and one after cleaning.

mod validator;

pub use validator::DataValidator;
