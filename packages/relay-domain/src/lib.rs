pub mod enrichment;
pub mod export;
pub mod mapping;
pub mod model;
pub mod signature;

mod error;

pub use error::{Error, Result};
