pub mod enums;
pub mod facts;
pub mod schema;

pub use enums::*;
pub use facts::*;
pub use schema::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid {field} value: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Outcome value must not be blank")]
    BlankOutcome,

    #[error("Schema file not found: {0}")]
    SchemaNotFound(String),

    #[error("Schema parsing error: {0}")]
    SchemaParsing(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
