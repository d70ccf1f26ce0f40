mod domains;
mod errors;
mod models;
mod output;
mod stations;
mod utils;

pub use domains::*;
pub use errors::*;
pub use models::*;
pub use output::*;
pub use stations::*;
pub use utils::*;
