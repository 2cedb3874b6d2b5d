//! HTTP route handlers

pub mod api;
pub mod page;
pub mod static_files;
pub mod video;

pub use api::*;
pub use page::*;
pub use static_files::*;
pub use video::*;
