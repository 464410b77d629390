//! Scope tree and symbol arena.
//!
//! Every scope and symbol of a compilation lives in one [`SymbolTable`]
//! and is addressed by [`ScopeId`] / [`SymbolId`]. Scopes point to their
//! parent, so walking outwards is a loop over ids rather than a chain of
//! references.

use std::collections::{HashMap, HashSet};

use parser::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Global,
    Class,
    Method,
    Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Class,
    Field,
    Arg,
    Local,
    Method,
    PrimitiveMethod,
    Block,
}

impl SymbolKind {
    /// Kinds a plain identifier can refer to.
    pub fn is_variable(self) -> bool {
        matches!(self, Self::Field | Self::Arg | Self::Local)
    }

    /// Plural name of the counter this kind is numbered with.
    pub fn counted_as(self) -> &'static str {
        match self {
            Self::Class => "classes",
            Self::Field => "fields",
            Self::Arg | Self::Local => "arguments and locals",
            Self::Method | Self::PrimitiveMethod => "methods",
            Self::Block => "blocks",
        }
    }
}

/// Names only clash with names of the same namespace: a field `x` and an
/// accessor method `x` coexist, as do instance and class methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Namespace {
    Variable,
    Method { class_side: bool },
    Block,
}

/// Symbols numbered together. Args and locals share the slot counter;
/// primitive and compiled methods share one too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Counter {
    Class,
    Field,
    Slot,
    Method,
    Block,
}

impl Counter {
    fn of(kind: SymbolKind) -> Self {
        match kind {
            SymbolKind::Class => Self::Class,
            SymbolKind::Field => Self::Field,
            SymbolKind::Arg | SymbolKind::Local => Self::Slot,
            SymbolKind::Method | SymbolKind::PrimitiveMethod => Self::Method,
            SymbolKind::Block => Self::Block,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    pub name: String,
    pub parent: Option<ScopeId>,
    pub span: Span,
    symbols: Vec<SymbolId>,
    names: HashMap<(Namespace, String), SymbolId>,
    counters: HashMap<Counter, u16>,
    /// Class scopes: declared superclass name.
    pub superclass: Option<String>,
    /// Method scopes: defined with `class` prefix.
    pub is_class_method: bool,
    /// Method scopes: `<primitive: #name>`.
    pub primitive: Option<String>,
    /// Method scopes: blocks numbered so far.
    block_count: u16,
    /// Block scopes: index within the home method.
    pub block_index: Option<u16>,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub name: String,
    /// Scope the symbol is declared in.
    pub scope: ScopeId,
    /// Position among same-kind siblings. Args and locals share one
    /// counter, so for them this is the slot number.
    pub index: u16,
    /// Scope introduced by a class, method or block symbol.
    pub defines: Option<ScopeId>,
    pub span: Span,
    /// Block symbols: number of blocks lexically inside this block.
    pub nested_blocks: u16,
}

/// Why [`SymbolTable::define`] refused a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefineError {
    /// The name is already taken in that namespace.
    Redefinition { existing: SymbolId },
    /// The scope already holds 65535 symbols on the same counter.
    TooMany,
}

/// Counts are at most `u16::MAX` because every counter stops there.
fn count_u16(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

#[derive(Debug, Clone)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    symbols: Vec<Symbol>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        let global = Scope {
            kind: ScopeKind::Global,
            name: "global".into(),
            parent: None,
            span: Span::default(),
            symbols: Vec::new(),
            names: HashMap::new(),
            counters: HashMap::new(),
            superclass: None,
            is_class_method: false,
            primitive: None,
            block_count: 0,
            block_index: None,
        };
        Self {
            scopes: vec![global],
            symbols: Vec::new(),
        }
    }

    pub fn global(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    pub fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.0 as usize]
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0 as usize]
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    /// Creates an empty child scope of `parent`.
    pub fn push_scope(
        &mut self,
        kind: ScopeKind,
        name: impl Into<String>,
        parent: ScopeId,
        span: Span,
    ) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            kind,
            name: name.into(),
            parent: Some(parent),
            span,
            symbols: Vec::new(),
            names: HashMap::new(),
            counters: HashMap::new(),
            superclass: None,
            is_class_method: false,
            primitive: None,
            block_count: 0,
            block_index: None,
        });
        id
    }

    /// Symbols of `scope` in declaration order.
    pub fn symbols(&self, scope: ScopeId) -> impl Iterator<Item = &Symbol> + '_ {
        self.scope(scope).symbols.iter().map(|&id| self.symbol(id))
    }

    fn namespace(&self, kind: SymbolKind, defines: Option<ScopeId>) -> Namespace {
        match kind {
            SymbolKind::Method | SymbolKind::PrimitiveMethod => Namespace::Method {
                class_side: defines.is_some_and(|m| self.scope(m).is_class_method),
            },
            SymbolKind::Block => Namespace::Block,
            _ => Namespace::Variable,
        }
    }

    /// Registers `name` in `scope`. Fails if the scope already has a symbol
    /// of that name in the same namespace, or if its counter is full.
    pub fn define(
        &mut self,
        scope: ScopeId,
        kind: SymbolKind,
        name: &str,
        defines: Option<ScopeId>,
        span: Span,
    ) -> Result<SymbolId, DefineError> {
        let key = (self.namespace(kind, defines), name.to_owned());
        if let Some(&existing) = self.scope(scope).names.get(&key) {
            return Err(DefineError::Redefinition { existing });
        }

        let counter = Counter::of(kind);
        let index = self.scope(scope).counters.get(&counter).copied().unwrap_or(0);
        let next = index.checked_add(1).ok_or(DefineError::TooMany)?;
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(Symbol {
            kind,
            name: name.to_owned(),
            scope,
            index,
            defines,
            span,
            nested_blocks: 0,
        });
        let owner = self.scope_mut(scope);
        owner.symbols.push(id);
        owner.names.insert(key, id);
        owner.counters.insert(counter, next);
        Ok(id)
    }

    pub fn set_nested_blocks(&mut self, symbol: SymbolId, count: u16) {
        self.symbols[symbol.0 as usize].nested_blocks = count;
    }

    /// Hands out the next block index of `method`, or `None` once the
    /// method holds 65535 blocks.
    pub fn next_block_index(&mut self, method: ScopeId) -> Option<u16> {
        let scope = self.scope_mut(method);
        let index = scope.block_count;
        scope.block_count = index.checked_add(1)?;
        Some(index)
    }

    /// Total number of blocks nested anywhere in `method`.
    pub fn block_count(&self, method: ScopeId) -> u16 {
        self.scope(method).block_count
    }

    /// Argument and local counts of a method or block scope.
    pub fn frame_size(&self, scope: ScopeId) -> (u16, u16) {
        let count = |kind: SymbolKind| count_u16(self.symbols(scope).filter(|s| s.kind == kind).count());
        (count(SymbolKind::Arg), count(SymbolKind::Local))
    }

    /// Nearest enclosing scope (including `scope`) of the given kind.
    pub fn enclosing(&self, scope: ScopeId, kind: ScopeKind) -> Option<ScopeId> {
        let mut cur = Some(scope);
        while let Some(id) = cur {
            if self.scope(id).kind == kind {
                return Some(id);
            }
            cur = self.scope(id).parent;
        }
        None
    }

    /// `Class>>method>>method-block0`: scope names below global.
    pub fn qualified_name(&self, scope: ScopeId) -> String {
        let mut parts = Vec::new();
        let mut cur = Some(scope);
        while let Some(id) = cur {
            let s = self.scope(id);
            if s.kind == ScopeKind::Global {
                break;
            }
            parts.push(s.name.as_str());
            cur = s.parent;
        }
        parts.reverse();
        parts.join(">>")
    }

    pub fn describe_scope(&self, scope: ScopeId) -> String {
        match self.scope(scope).kind {
            ScopeKind::Global => "global scope".into(),
            _ => self.qualified_name(scope),
        }
    }

    // ── classes and inheritance ────────────────────────────────────

    /// Class scope defined under `name` in this unit.
    pub fn lookup_class(&self, name: &str) -> Option<ScopeId> {
        self.symbols(self.global())
            .find(|s| s.kind == SymbolKind::Class && s.name == name)
            .and_then(|s| s.defines)
    }

    pub fn superclass_scope(&self, class: ScopeId) -> Option<ScopeId> {
        self.scope(class)
            .superclass
            .as_deref()
            .and_then(|name| self.lookup_class(name))
    }

    /// Superclass chain of `class` within this unit, nearest first.
    /// Stops before revisiting a class, so cyclic chains terminate.
    pub fn ancestors(&self, class: ScopeId) -> Vec<ScopeId> {
        let mut seen = HashSet::from([class]);
        let mut chain = Vec::new();
        let mut cur = self.superclass_scope(class);
        while let Some(id) = cur {
            if !seen.insert(id) {
                break;
            }
            chain.push(id);
            cur = self.superclass_scope(id);
        }
        chain
    }

    /// Whether following superclasses from `class` leads back to it.
    pub fn inherits_from_itself(&self, class: ScopeId) -> bool {
        let mut seen = HashSet::new();
        let mut cur = self.superclass_scope(class);
        while let Some(id) = cur {
            if id == class {
                return true;
            }
            if !seen.insert(id) {
                return false;
            }
            cur = self.superclass_scope(id);
        }
        false
    }

    pub fn field_count(&self, class: ScopeId) -> usize {
        self.symbols(class).filter(|s| s.kind == SymbolKind::Field).count()
    }

    /// Number of fields every instance of `class` inherits.
    pub fn inherited_field_count(&self, class: ScopeId) -> usize {
        self.ancestors(class)
            .into_iter()
            .map(|a| self.field_count(a))
            .sum()
    }

    /// Absolute slot of a field in instances of its declaring class
    /// (and every subclass). May exceed `u16` when a long chain adds up;
    /// code generation checks it.
    pub fn field_index(&self, field: SymbolId) -> usize {
        let sym = self.symbol(field);
        self.inherited_field_count(sym.scope) + usize::from(sym.index)
    }

    /// Field `name` visible in `class`: its own first, then inherited.
    pub fn lookup_field(&self, class: ScopeId, name: &str) -> Option<SymbolId> {
        std::iter::once(class)
            .chain(self.ancestors(class))
            .find_map(|c| self.lookup_variable(c, name))
    }

    /// Variable-namespace symbol `name` declared directly in `scope`.
    pub fn lookup_variable(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        self.scope(scope)
            .names
            .get(&(Namespace::Variable, name.to_owned()))
            .copied()
            .filter(|&id| self.symbol(id).kind.is_variable())
    }

    /// Searches outwards from `from` for the variable `name`.
    ///
    /// Method and block scopes are searched innermost first; the returned
    /// depth counts the method/block hops taken. The walk then ends at the
    /// owning class, which is searched for fields (own, then inherited) with
    /// the depth at that point. Globals are never searched.
    pub fn resolve(&self, from: ScopeId, name: &str) -> Option<(SymbolId, u16)> {
        let mut depth = 0u16;
        let mut cur = Some(from);
        while let Some(id) = cur {
            let scope = self.scope(id);
            match scope.kind {
                ScopeKind::Method | ScopeKind::Block => {
                    if let Some(sym) = self.lookup_variable(id, name) {
                        return Some((sym, depth));
                    }
                    depth += 1;
                }
                ScopeKind::Class => return self.lookup_field(id, name).map(|s| (s, depth)),
                ScopeKind::Global => return None,
            }
            cur = scope.parent;
        }
        None
    }
}
