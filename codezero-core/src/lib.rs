pub mod assist;
pub mod link;
pub mod model;
pub mod relay;
pub mod utils;

pub use model::*;
