pub mod admission;
pub mod draft;
pub mod enums;
pub mod identification;
pub mod opd;
pub mod patient;

pub use admission::*;
pub use draft::*;
pub use enums::*;
pub use identification::*;
pub use opd::*;
pub use patient::*;
