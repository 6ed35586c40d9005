//! Main module for db file functionality

pub mod ast;
pub mod diffing;
pub mod error;
pub mod lexing;
pub mod loader;
pub mod parsing;
pub mod testing;
pub mod token;
