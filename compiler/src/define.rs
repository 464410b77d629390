//! Pass 1: create scopes and register every declared name.

use std::collections::HashMap;

use log::debug;
use parser::ast::for_each_child;
use parser::{AstArena, Body, ExprId, ExprKind, Ident, MethodBody, SourceFile, Span};

use crate::error::CompileError;
use crate::scope::{DefineError, ScopeId, ScopeKind, SymbolId, SymbolKind, SymbolTable};

/// Class holding the statements that follow the last class definition.
pub const MAIN_CLASS: &str = "MainClass";
pub const MAIN_METHOD: &str = "main";
const MAIN_SUPERCLASS: &str = "Object";

/// Where pass 1 put each definition of the parse tree.
#[derive(Debug, Clone, Default)]
pub struct ScopeMap {
    /// One class scope per `SourceFile::classes` entry.
    pub classes: Vec<ScopeId>,
    /// Method scopes, parallel to each class's `methods`.
    pub methods: Vec<Vec<ScopeId>>,
    /// `MainClass` and its `main` method, when there are top-level statements.
    pub main: Option<(ScopeId, ScopeId)>,
    /// Scope of every block literal, keyed by its expression node.
    pub blocks: HashMap<ExprId, ScopeId>,
}

impl ScopeMap {
    pub fn block(&self, id: ExprId) -> Option<ScopeId> {
        self.blocks.get(&id).copied()
    }
}

struct Definer<'a> {
    table: &'a mut SymbolTable,
    arena: &'a AstArena,
    blocks: HashMap<ExprId, ScopeId>,
    errors: Vec<CompileError>,
}

/// Runs pass 1 over `file`, filling `table`. Redefinitions and full
/// counters are collected and returned; the walk always covers the whole
/// file.
pub fn define_symbols(file: &SourceFile, table: &mut SymbolTable) -> (ScopeMap, Vec<CompileError>) {
    let mut definer = Definer {
        table,
        arena: &file.arena,
        blocks: HashMap::new(),
        errors: Vec::new(),
    };

    let mut map = ScopeMap::default();
    for class in &file.classes {
        let scope = definer.define_class(
            &class.name,
            class.superclass.as_ref().map(|s| s.name.as_str()),
            &class.fields,
            class.span,
        );
        let methods = class
            .methods
            .iter()
            .map(|m| {
                let body = match &m.body {
                    MethodBody::Code(body) => Some(body),
                    MethodBody::Primitive(_) => None,
                };
                let method = definer.define_method(
                    scope,
                    &m.selector,
                    m.selector_span,
                    &m.params,
                    m.is_class_method,
                    body,
                );
                if let MethodBody::Primitive(name) = &m.body {
                    definer.table.scope_mut(method).primitive = Some(name.name.clone());
                }
                method
            })
            .collect();
        map.classes.push(scope);
        map.methods.push(methods);
    }

    if !file.main.is_empty() {
        let at = file
            .main
            .statements
            .first()
            .map_or(file.end, |&s| file.arena[s].span);
        let class = definer.define_class(
            &Ident::new(MAIN_CLASS, at),
            Some(MAIN_SUPERCLASS),
            &[],
            at,
        );
        let method = definer.define_method(class, MAIN_METHOD, at, &[], false, Some(&file.main));
        map.main = Some((class, method));
    }

    debug!(
        "defined {} classes, {} scopes, {} blocks",
        map.classes.len() + usize::from(map.main.is_some()),
        definer.table.scope_count(),
        definer.blocks.len()
    );
    map.blocks = definer.blocks;
    (map, definer.errors)
}

impl Definer<'_> {
    fn declare(
        &mut self,
        scope: ScopeId,
        kind: SymbolKind,
        name: &str,
        defines: Option<ScopeId>,
        span: Span,
    ) -> Option<SymbolId> {
        let err = match self.table.define(scope, kind, name, defines, span) {
            Ok(id) => return Some(id),
            Err(DefineError::Redefinition { .. }) => CompileError::DuplicateDefinition {
                name: name.to_owned(),
                scope: self.table.describe_scope(scope),
                span,
            },
            Err(DefineError::TooMany) => CompileError::LimitExceeded {
                what: kind.counted_as(),
                span,
            },
        };
        self.errors.push(err);
        None
    }

    fn define_class(
        &mut self,
        name: &Ident,
        superclass: Option<&str>,
        fields: &[Ident],
        span: Span,
    ) -> ScopeId {
        let global = self.table.global();
        let scope = self.table.push_scope(ScopeKind::Class, &name.name, global, span);
        self.table.scope_mut(scope).superclass = superclass.map(str::to_owned);
        self.declare(global, SymbolKind::Class, &name.name, Some(scope), name.span);
        for field in fields {
            self.declare(scope, SymbolKind::Field, &field.name, None, field.span);
        }
        scope
    }

    fn define_method(
        &mut self,
        class: ScopeId,
        selector: &str,
        selector_span: Span,
        params: &[Ident],
        is_class_method: bool,
        body: Option<&Body>,
    ) -> ScopeId {
        let method = self
            .table
            .push_scope(ScopeKind::Method, selector, class, selector_span);
        self.table.scope_mut(method).is_class_method = is_class_method;
        let kind = if body.is_some() {
            SymbolKind::Method
        } else {
            SymbolKind::PrimitiveMethod
        };
        self.declare(class, kind, selector, Some(method), selector_span);

        for param in params {
            self.declare(method, SymbolKind::Arg, &param.name, None, param.span);
        }
        if let Some(body) = body {
            self.define_body(body, method, method);
        }
        method
    }

    fn define_body(&mut self, body: &Body, scope: ScopeId, method: ScopeId) {
        for local in &body.locals {
            self.declare(scope, SymbolKind::Local, &local.name, None, local.span);
        }
        for &stmt in &body.statements {
            self.define_expr(stmt, scope, method);
        }
    }

    /// Numbers blocks in pre-order: a block gets its index before any
    /// block nested inside it.
    fn define_expr(&mut self, id: ExprId, scope: ScopeId, method: ScopeId) {
        let arena = self.arena;
        let node = &arena[id];
        let ExprKind::Block(block) = &node.kind else {
            for_each_child(&node.kind, |child| self.define_expr(child, scope, method));
            return;
        };

        let Some(index) = self.table.next_block_index(method) else {
            self.errors.push(CompileError::LimitExceeded {
                what: SymbolKind::Block.counted_as(),
                span: node.span,
            });
            return;
        };
        let name = format!("{}-block{index}", self.table.scope(method).name);
        let block_scope = self.table.push_scope(ScopeKind::Block, &name, scope, node.span);
        self.table.scope_mut(block_scope).block_index = Some(index);
        self.blocks.insert(id, block_scope);

        let symbol = self.declare(scope, SymbolKind::Block, &name, Some(block_scope), node.span);
        for param in &block.params {
            self.declare(block_scope, SymbolKind::Arg, &param.name, None, param.span);
        }
        self.define_body(&block.body, block_scope, method);

        if let Some(symbol) = symbol {
            let nested = self.table.block_count(method) - index - 1;
            self.table.set_nested_blocks(symbol, nested);
        }
    }
}
