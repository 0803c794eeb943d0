//! Coursebin construction and section matching.

pub mod course_code;
pub mod selector;
pub mod tree;

pub use selector::SectionSelector;
pub use tree::transform_course;
