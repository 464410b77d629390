//! # Compiler
//!
//! Turns a parsed class file into [`CompiledClass`]es in three passes:
//!
//! ```text
//!  SourceFile ──▶ define (scopes, symbols) ──▶ resolve (bindings) ──▶ codegen ──▶ Vec<CompiledClass>
//! ```
//!
//! Definition and resolution errors are collected together; if there are
//! any, code generation does not run.
//!
//! ```rust
//! use compiler::Compiler;
//!
//! let classes = Compiler::default()
//!     .compile_source("Object subclass: #T [ run [ ^3 ] ]")
//!     .unwrap();
//! assert_eq!(classes[0].methods[0].qualified_name, "T>>run");
//! ```

pub mod codegen;
pub mod compiled;
pub mod define;
pub mod error;
pub mod literal;
pub mod resolve;
pub mod scope;

use log::debug;
use parser::SourceFile;

pub use compiled::{CompiledBlock, CompiledClass};
pub use define::{MAIN_CLASS, MAIN_METHOD};
pub use error::{CompileError, CompileErrors};
pub use literal::LiteralTable;
pub use resolve::{Binding, Bindings};
pub use scope::{ScopeId, ScopeKind, SymbolId, SymbolKind, SymbolTable};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Recorded in `dbg` instructions.
    pub file_name: String,
    /// Emit `dbg` instructions.
    pub debug_info: bool,
    /// Report names that resolve to nothing instead of compiling them as
    /// global lookups. Classes defined in the same file are always known.
    pub strict_globals: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            file_name: "<input>".into(),
            debug_info: false,
            strict_globals: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Compiler {
    options: CompileOptions,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Parses and compiles `source`. Syntax errors stop before pass 1.
    pub fn compile_source(&self, source: &str) -> Result<Vec<CompiledClass>, CompileErrors> {
        let file = parser::parse_source(source)?;
        self.compile_file(&file)
    }

    pub fn compile_file(&self, file: &SourceFile) -> Result<Vec<CompiledClass>, CompileErrors> {
        let mut table = SymbolTable::new();

        let (scopes, mut errors) = define::define_symbols(file, &mut table);
        debug!("pass 1: {} errors", errors.len());

        let (bindings, resolve_errors) = resolve::resolve_symbols(file, &table, &scopes, &self.options);
        debug!("pass 2: {} errors", resolve_errors.len());
        errors.extend(resolve_errors);

        if !errors.is_empty() {
            return Err(CompileErrors(errors));
        }
        Ok(codegen::generate(file, &table, &scopes, &bindings, &self.options)?)
    }
}
