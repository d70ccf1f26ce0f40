pub mod align;
pub mod coordinator;
pub mod noon_forecasts;
pub mod spotwx;

pub use align::*;
pub use coordinator::*;
pub use noon_forecasts::*;
pub use spotwx::*;
