//! # pagegen
//!
//! Compiles paginated token-enumeration scripts to NeoVM bytecode.
//!
//! A page of a token enumeration is described by four inputs: the script
//! hash of a deployed contract, the owner address, a zero-based page
//! index, and a page size limit. [`render_and_compile`] renders those
//! inputs into a small pager-script source file and compiles it:
//!
//! 1. Render the pager script ([`template`]).
//! 2. Write it to a scoped temporary file.
//! 3. Parse the file into a [`ast::PageQuery`] ([`parser`]).
//! 4. Generate NeoVM bytecode ([`codegen`]).
//! 5. Encode the bytecode as lowercase hex.
//!
//! The rendered script depends only on the four inputs, so compilation is
//! deterministic: identical inputs produce byte-identical output.

pub mod ast;
pub mod codegen;
pub mod parser;
pub mod template;

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::ast::PageRequest;

/// Pager compilation error types
#[derive(Error, Debug)]
pub enum PagerError {
    #[error("invalid hex in {field}: {source}")]
    Hex {
        field: &'static str,
        source: hex::FromHexError,
    },

    #[error("parse error at {line}:{column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("codegen error: {message}")]
    Codegen { message: String },

    #[error("page start overflows: {page} * {limit}")]
    Overflow { page: u64, limit: u64 },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for pager operations
pub type Result<T> = std::result::Result<T, PagerError>;

/// Compile pager-script source to NeoVM bytecode.
///
/// # Arguments
///
/// * `source` - The pager-script source to compile
///
/// # Returns
///
/// The NeoVM bytecode or a parse/codegen error
pub fn compile(source: &str) -> Result<Vec<u8>> {
    // Phase 1: Parse
    let query = parser::parse(source)?;

    // Phase 2: Generate NeoVM bytecode
    codegen::generate(&query)
}

/// Compile a pager-script file to NeoVM bytecode.
pub fn compile_file(path: &Path) -> Result<Vec<u8>> {
    let source = fs::read_to_string(path)?;
    compile(&source)
}

/// Render a request, compile it, and return the bytecode as lowercase hex.
///
/// The rendered script is written to a temporary file and compiled from
/// there. The file is removed when this function returns, on every path.
pub fn render_and_compile(request: &PageRequest) -> Result<String> {
    let source = template::render(request)?;

    let file = tempfile::NamedTempFile::new()?;
    fs::write(file.path(), &source)?;

    let bytecode = compile_file(file.path())?;
    Ok(hex::encode(bytecode))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> PageRequest {
        PageRequest::new("aabbcc", "1234", 0, 10).unwrap()
    }

    #[test]
    fn test_compile_rendered_source() {
        let source = template::render(&request()).unwrap();
        let bytecode = compile(&source).unwrap();
        assert!(!bytecode.is_empty());
    }

    #[test]
    fn test_render_and_compile_is_deterministic() {
        let first = render_and_compile(&request()).unwrap();
        let second = render_and_compile(&request()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_output_is_lowercase_hex_of_even_length() {
        let out = render_and_compile(&request()).unwrap();
        assert!(!out.is_empty());
        assert_eq!(out.len() % 2, 0);
        assert!(out
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_compile_rejects_garbage() {
        let err = compile("page {").unwrap_err();
        assert!(matches!(err, PagerError::Parse { .. }));
    }
}
