//! UI screens.

mod app;
mod backend;

pub use app::App;
pub use backend::{Action, Backend, BackendCommand};
