pub mod drafts;
pub mod generation;
pub mod sections;
