pub mod stock;
pub mod valuation;
pub mod report;
pub mod response;

pub use stock::*;
pub use valuation::*;
pub use report::*;
pub use response::*;
