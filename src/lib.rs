pub mod errors;
pub mod function;
pub mod models;
pub mod prompt;
pub mod schema;
