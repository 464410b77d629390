//! Parse tree for class files.
//!
//! Expressions live in an [`AstArena`] and refer to each other by
//! [`ExprId`]. Later passes hang their results (scopes, bindings) off
//! these ids in side tables instead of mutating the tree.
//!
//! Definitions (classes, methods, bodies) are plain owned structs; they
//! are few and are always walked top-down.

use crate::span::Span;

/// Index of an expression node inside an [`AstArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(u32);

impl ExprId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprNode {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct AstArena {
    nodes: Vec<ExprNode>,
}

impl AstArena {
    pub fn alloc(&mut self, node: ExprNode) -> ExprId {
        let id = ExprId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: ExprId) -> &ExprNode {
        &self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl std::ops::Index<ExprId> for AstArena {
    type Output = ExprNode;

    fn index(&self, id: ExprId) -> &ExprNode {
        self.get(id)
    }
}

/// A declared name: class, field, parameter or temporary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Integer(i32),
    Float(f32),
    /// Always within the basic multilingual plane.
    Char(char),
    String(String),

    Nil,
    True,
    False,
    SelfRef,

    /// A variable read. Assignment targets are also `Ident` nodes.
    Ident(String),

    /// `{a. b. c}`
    Array(Vec<ExprId>),

    /// `[:x | | t | ...]`
    Block(BlockLiteral),

    /// `receiver selector`
    UnaryMessage {
        receiver: ExprId,
        selector: String,
        selector_span: Span,
    },

    /// `receiver op argument`. No precedence between operators.
    BinaryMessage {
        receiver: ExprId,
        operator: String,
        operator_span: Span,
        argument: ExprId,
    },

    /// `receiver key1: arg1 key2: arg2`
    KeywordMessage {
        receiver: ExprId,
        pairs: Vec<KeywordPair>,
    },

    /// A message sent to `super`, in any of the three message forms.
    SuperSend {
        selector: String,
        selector_span: Span,
        arguments: Vec<ExprId>,
    },

    /// `target := value`, statement level only.
    Assignment { target: ExprId, value: ExprId },

    /// `^value`, statement level only.
    Return(ExprId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeywordPair {
    pub keyword: String,
    pub keyword_span: Span,
    pub argument: ExprId,
    pub span: Span,
}

/// Selector of a keyword message: the concatenation of its parts.
pub fn keyword_selector(pairs: &[KeywordPair]) -> String {
    pairs.iter().map(|p| p.keyword.as_str()).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockLiteral {
    pub params: Vec<Ident>,
    pub body: Body,
    /// The closing `]`.
    pub close: Span,
}

/// Temporaries followed by statements, shared by methods, blocks and the
/// trailing main program.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Body {
    pub locals: Vec<Ident>,
    pub statements: Vec<ExprId>,
}

impl Body {
    pub fn is_empty(&self) -> bool {
        self.locals.is_empty() && self.statements.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MethodBody {
    Code(Body),
    /// `<primitive: #Name>`
    Primitive(Ident),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDef {
    pub selector: String,
    pub selector_span: Span,
    pub params: Vec<Ident>,
    pub is_class_method: bool,
    pub body: MethodBody,
    pub span: Span,
    /// The closing `]` (or `>` for primitives).
    pub close: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: Ident,
    /// `None` for `nil subclass: #Root [...]`.
    pub superclass: Option<Ident>,
    pub fields: Vec<Ident>,
    pub methods: Vec<MethodDef>,
    pub span: Span,
}

/// A whole translation unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceFile {
    pub classes: Vec<ClassDef>,
    /// Statements after the last class definition.
    pub main: Body,
    /// Position of the end of input, used as the main body's closing point.
    pub end: Span,
    pub arena: AstArena,
}

/// Calls `f` on every direct sub-expression of `kind`, left to right.
/// Block bodies are included; the statements of a block count as its
/// children.
pub fn for_each_child(kind: &ExprKind, mut f: impl FnMut(ExprId)) {
    match kind {
        ExprKind::Integer(_)
        | ExprKind::Float(_)
        | ExprKind::Char(_)
        | ExprKind::String(_)
        | ExprKind::Nil
        | ExprKind::True
        | ExprKind::False
        | ExprKind::SelfRef
        | ExprKind::Ident(_) => {}
        ExprKind::Array(items) => items.iter().copied().for_each(f),
        ExprKind::Block(block) => block.body.statements.iter().copied().for_each(f),
        ExprKind::UnaryMessage { receiver, .. } => f(*receiver),
        ExprKind::BinaryMessage {
            receiver, argument, ..
        } => {
            f(*receiver);
            f(*argument);
        }
        ExprKind::KeywordMessage { receiver, pairs } => {
            f(*receiver);
            for pair in pairs {
                f(pair.argument);
            }
        }
        ExprKind::SuperSend { arguments, .. } => arguments.iter().copied().for_each(f),
        ExprKind::Assignment { target, value } => {
            f(*target);
            f(*value);
        }
        ExprKind::Return(value) => f(*value),
    }
}
