pub mod actuals;
pub mod fields;
pub mod forecast;
pub mod summary;

pub use actuals::*;
pub use fields::*;
pub use forecast::*;
pub use summary::*;
