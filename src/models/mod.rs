pub mod activity;
pub mod error;
pub mod rank;
pub mod rank_map;

pub use activity::*;
pub use error::*;
pub use rank::*;
pub use rank_map::*;
