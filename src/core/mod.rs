//! Core module containing fundamental traits and types for the engine

pub mod error;
mod macros;
pub mod request;
pub mod shape;

pub use error::{ErrorResponse, QueryError, QueryResult};
pub use request::{ReadModelRequest, ReadModelResponse, ResultSet};
pub use shape::{QueryShape, ShapeDescriptor};
