//! API middleware. Only request auditing lives here.

pub mod audit;
