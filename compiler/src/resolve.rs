//! Pass 2: bind every identifier occurrence to a symbol.

use std::collections::HashMap;

use log::{debug, trace};
use parser::ast::for_each_child;
use parser::{AstArena, Body, ExprId, ExprKind, MethodBody, SourceFile};

use crate::CompileOptions;
use crate::define::ScopeMap;
use crate::error::CompileError;
use crate::scope::{ScopeId, SymbolId, SymbolKind, SymbolTable};

/// What an identifier occurrence refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// An instance variable of the receiver.
    Field { symbol: SymbolId },
    /// An argument or temporary `depth` contexts out.
    Local { symbol: SymbolId, depth: u16 },
    /// Not declared anywhere in scope; looked up by name at run time.
    Global,
}

/// Resolution results keyed by identifier node.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    map: HashMap<ExprId, Binding>,
}

impl Bindings {
    pub fn get(&self, id: ExprId) -> Option<Binding> {
        self.map.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

struct Resolver<'a> {
    table: &'a SymbolTable,
    scopes: &'a ScopeMap,
    arena: &'a AstArena,
    strict_globals: bool,
    bindings: Bindings,
    errors: Vec<CompileError>,
}

/// Runs pass 2. Never changes the scope tree; only records bindings.
pub fn resolve_symbols(
    file: &SourceFile,
    table: &SymbolTable,
    scopes: &ScopeMap,
    options: &CompileOptions,
) -> (Bindings, Vec<CompileError>) {
    let mut resolver = Resolver {
        table,
        scopes,
        arena: &file.arena,
        strict_globals: options.strict_globals,
        bindings: Bindings::default(),
        errors: Vec::new(),
    };

    for (class, &scope) in file.classes.iter().zip(&scopes.classes) {
        if table.inherits_from_itself(scope) {
            resolver.errors.push(CompileError::CyclicInheritance {
                name: class.name.name.clone(),
                span: class.name.span,
            });
        }
    }

    for (class, methods) in file.classes.iter().zip(&scopes.methods) {
        for (method, &scope) in class.methods.iter().zip(methods) {
            if let MethodBody::Code(body) = &method.body {
                resolver.resolve_body(body, scope);
            }
        }
    }
    if let Some((_, main)) = scopes.main {
        resolver.resolve_body(&file.main, main);
    }

    debug!("resolved {} identifier occurrences", resolver.bindings.len());
    (resolver.bindings, resolver.errors)
}

impl Resolver<'_> {
    fn resolve_body(&mut self, body: &Body, scope: ScopeId) {
        for &stmt in &body.statements {
            self.resolve_expr(stmt, scope);
        }
    }

    fn resolve_expr(&mut self, id: ExprId, scope: ScopeId) {
        let arena = self.arena;
        let node = &arena[id];
        match &node.kind {
            ExprKind::Ident(name) => {
                self.bind(id, name, scope);
            }
            ExprKind::Assignment { target, value } => {
                self.resolve_expr(*value, scope);
                let target_node = &arena[*target];
                let ExprKind::Ident(name) = &target_node.kind else {
                    self.errors.push(CompileError::Internal(format!(
                        "assignment target at {} is not an identifier",
                        target_node.span
                    )));
                    return;
                };
                if self.bind(*target, name, scope) == Binding::Global {
                    self.errors.push(CompileError::InvalidAssignmentTarget {
                        name: name.clone(),
                        span: target_node.span,
                    });
                }
            }
            ExprKind::Block(block) => {
                // No scope means pass 1 ran out of block indices and said so.
                if let Some(block_scope) = self.scopes.block(id) {
                    self.resolve_body(&block.body, block_scope);
                }
            }
            kind => for_each_child(kind, |child| self.resolve_expr(child, scope)),
        }
    }

    fn bind(&mut self, id: ExprId, name: &str, scope: ScopeId) -> Binding {
        let binding = match self.table.resolve(scope, name) {
            Some((symbol, _)) if self.table.symbol(symbol).kind == SymbolKind::Field => {
                Binding::Field { symbol }
            }
            Some((symbol, depth)) => Binding::Local { symbol, depth },
            None => {
                debug!("`{name}` deferred to a global lookup");
                if self.strict_globals && self.table.lookup_class(name).is_none() {
                    self.errors.push(CompileError::UnresolvedReference {
                        name: name.to_owned(),
                        span: self.arena[id].span,
                    });
                }
                Binding::Global
            }
        };
        trace!("{name} at {} -> {binding:?}", self.arena[id].span);
        self.bindings.map.insert(id, binding);
        binding
    }
}
