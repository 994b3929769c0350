pub mod metadata;
pub mod record;
pub mod schema;
pub mod update;

pub use metadata::*;
pub use record::*;
pub use schema::*;
pub use update::*;
