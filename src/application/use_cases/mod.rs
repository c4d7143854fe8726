//! Use case implementations.

mod load_page_use_case;

pub use load_page_use_case::LoadPageUseCase;
