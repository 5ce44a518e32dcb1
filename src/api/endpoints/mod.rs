//! API endpoint handlers, one module per desk feature.

pub mod admissions;
pub mod drafts;
pub mod health;
pub mod identification;
pub mod opd;
pub mod patients;
