pub mod blob;
pub mod db;
pub mod documents;
pub mod schema;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;
