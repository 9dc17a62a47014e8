pub mod catalog;
pub mod stock_data;

pub use catalog::*;
pub use stock_data::*;
