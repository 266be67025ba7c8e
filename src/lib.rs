pub mod ast;
pub mod cmdline;
pub mod environment;
pub mod evaluator;
pub mod interpreter;
pub mod macros;
pub mod modify;
pub mod parser;
pub mod printer;
pub mod tokens;
pub mod types;

#[macro_use]
extern crate lazy_static;

mod core;
mod special_forms;
mod strings;

pub use interpreter::Interpreter;
pub use types::Object;
