pub mod catalog;
pub mod extraction;
pub mod merge;

pub use catalog::*;
pub use merge::merge;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Keyword table parsing error: {0}")]
    Parsing(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
