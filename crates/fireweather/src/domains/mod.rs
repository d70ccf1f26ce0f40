pub mod forecasts;
pub mod percentiles;

pub use forecasts::*;
pub use percentiles::*;
