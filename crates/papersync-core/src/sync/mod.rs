pub mod pager;
pub mod runner;
pub mod traits;

pub use pager::*;
pub use runner::*;
pub use traits::*;
