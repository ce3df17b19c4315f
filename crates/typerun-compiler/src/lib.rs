//! Type-compiler core: lowers a parsed source file to a bytecode image.
//!
//! The pipeline is strictly one-way. The lowering visitor (`lower`) walks the
//! AST and emits ops into a [`Program`] — per-symbol subroutines plus a main
//! program — while maintaining the lexical frame stack and the string
//! storage. `emit::build` then lays everything out as a single image the VM
//! executes to produce or check types at runtime.
//!
//! ```
//! use typerun_compiler::{Compiler, ast, emit};
//!
//! let file = ast::SourceFile {
//!     statements: vec![],
//!     span: ast::Span::default(),
//! };
//! let program = Compiler::compile_source_file(&file).unwrap();
//! let image = emit::build(&program);
//! assert!(!image.is_empty());
//! ```

pub mod ast;
pub mod emit;
pub mod error;
pub mod lower;
pub mod program;

pub use error::CompileError;
pub use lower::Compiler;
pub use program::Program;

#[cfg(test)]
pub mod test_utils;
