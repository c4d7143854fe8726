//! Data transfer objects for the application layer.

mod page_dto;

pub use page_dto::{PageOutcome, PageRequest};
