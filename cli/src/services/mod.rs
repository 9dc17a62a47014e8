pub mod price_source;
pub mod summary_service;

pub use price_source::*;
pub use summary_service::*;
