//! Pass 3: emit bytecode for every method and block.
//!
//! Each expression leaves exactly one value on the operand stack. A body of
//! `n` statements is the statements separated by `n - 1` pops; methods end
//! in `self; return` and blocks in `block_return`, even when the last
//! statement already returned.

use bytecode::BytecodeBuilder;
use log::{debug, trace};
use parser::ast::keyword_selector;
use parser::{AstArena, Body, ExprId, ExprKind, MethodBody, Pos, SourceFile, Span};

use crate::CompileOptions;
use crate::compiled::{CompiledBlock, CompiledClass};
use crate::define::ScopeMap;
use crate::error::CompileError;
use crate::literal::LiteralTable;
use crate::resolve::{Binding, Bindings};
use crate::scope::{ScopeId, SymbolId, SymbolKind, SymbolTable};

struct Generator<'a> {
    table: &'a SymbolTable,
    scopes: &'a ScopeMap,
    bindings: &'a Bindings,
    arena: &'a AstArena,
    options: &'a CompileOptions,
}

/// State shared by every method of one class.
#[derive(Default)]
struct ClassState {
    literals: LiteralTable,
    /// Literal index of the source file name, once a `dbg` needed it.
    file: Option<u16>,
}

impl ClassState {
    fn literal(&mut self, s: &str, span: Span) -> Result<u16, CompileError> {
        limit(self.literals.intern(s), "literals", span)
    }
}

/// Code being emitted for one method or block body.
struct Context<'c> {
    code: BytecodeBuilder,
    class: &'c mut ClassState,
    /// Compiled blocks of the home method, by block index.
    blocks: &'c mut [Option<CompiledBlock>],
}

struct MethodSource<'s> {
    scope: ScopeId,
    /// `None` for primitives.
    body: Option<&'s Body>,
    /// Where the method's trailer is attributed in debug info.
    close: Pos,
}

/// Runs pass 3. Only called once passes 1 and 2 reported no errors, so
/// any inconsistency found here is a [`CompileError::Internal`].
pub fn generate(
    file: &SourceFile,
    table: &SymbolTable,
    scopes: &ScopeMap,
    bindings: &Bindings,
    options: &CompileOptions,
) -> Result<Vec<CompiledClass>, CompileError> {
    let generator = Generator {
        table,
        scopes,
        bindings,
        arena: &file.arena,
        options,
    };

    let mut classes = Vec::with_capacity(file.classes.len() + 1);
    for ((class, &scope), methods) in file.classes.iter().zip(&scopes.classes).zip(&scopes.methods) {
        let sources = class.methods.iter().zip(methods).map(|(m, &method)| MethodSource {
            scope: method,
            body: match &m.body {
                MethodBody::Code(body) => Some(body),
                MethodBody::Primitive(_) => None,
            },
            close: m.close.start,
        });
        classes.push(generator.class(scope, sources)?);
    }
    if let Some((class, method)) = scopes.main {
        let main = MethodSource {
            scope: method,
            body: Some(&file.main),
            close: file.end.start,
        };
        classes.push(generator.class(class, [main])?);
    }

    debug!("generated {} classes", classes.len());
    Ok(classes)
}

fn limit(value: usize, what: &'static str, span: Span) -> Result<u16, CompileError> {
    u16::try_from(value).map_err(|_| CompileError::LimitExceeded { what, span })
}

impl Generator<'_> {
    fn class<'s>(
        &self,
        scope: ScopeId,
        methods: impl IntoIterator<Item = MethodSource<'s>>,
    ) -> Result<CompiledClass, CompileError> {
        let mut state = ClassState::default();
        let methods = methods
            .into_iter()
            .map(|m| self.method(&mut state, m))
            .collect::<Result<Vec<_>, _>>()?;

        let class = self.table.scope(scope);
        let fields = self
            .table
            .symbols(scope)
            .filter(|s| s.kind == SymbolKind::Field)
            .map(|s| s.name.clone())
            .collect();
        Ok(CompiledClass {
            name: class.name.clone(),
            super_class_name: class.superclass.clone(),
            literals: state.literals,
            fields,
            methods,
        })
    }

    fn method(&self, class: &mut ClassState, source: MethodSource<'_>) -> Result<CompiledBlock, CompileError> {
        let scope = self.table.scope(source.scope);
        let (nargs, nlocals) = self.table.frame_size(source.scope);
        let mut compiled = CompiledBlock {
            name: scope.name.clone(),
            is_class_method: scope.is_class_method,
            qualified_name: self.table.qualified_name(source.scope),
            primitive_name: scope.primitive.clone(),
            nargs,
            nlocals,
            bytecode: Vec::new(),
            blocks: Vec::new(),
        };

        let Some(body) = source.body else {
            compiled.nlocals = 0;
            trace!("{}: primitive {:?}", compiled.qualified_name, compiled.primitive_name);
            return Ok(compiled);
        };

        let mut blocks = vec![None; usize::from(self.table.block_count(source.scope))];
        let mut ctx = Context {
            code: BytecodeBuilder::new(),
            class,
            blocks: &mut blocks,
        };
        self.body(&mut ctx, body)?;
        self.dbg(&mut ctx, source.close)?;
        ctx.code.push_self();
        ctx.code.method_return();
        compiled.bytecode = ctx.code.into_bytes();

        compiled.blocks = blocks
            .into_iter()
            .enumerate()
            .map(|(i, block)| {
                block.ok_or_else(|| {
                    CompileError::Internal(format!(
                        "block {i} of {} has no compiled body",
                        compiled.qualified_name
                    ))
                })
            })
            .collect::<Result<_, _>>()?;
        trace!(
            "{}: {} bytes, {} blocks",
            compiled.qualified_name,
            compiled.bytecode.len(),
            compiled.blocks.len()
        );
        Ok(compiled)
    }

    fn block(&self, ctx: &mut Context<'_>, id: ExprId, body: &Body, close: Pos) -> Result<u16, CompileError> {
        let span = self.arena[id].span;
        let scope = self
            .scopes
            .block(id)
            .ok_or_else(|| CompileError::Internal(format!("block at {span} has no scope")))?;
        let info = self.table.scope(scope);
        let index = info
            .block_index
            .ok_or_else(|| CompileError::Internal(format!("block at {span} has no index")))?;

        let mut inner = Context {
            code: BytecodeBuilder::new(),
            class: &mut *ctx.class,
            blocks: &mut *ctx.blocks,
        };
        self.body(&mut inner, body)?;
        self.dbg(&mut inner, close)?;
        inner.code.block_return();
        let bytecode = inner.code.into_bytes();

        let (nargs, nlocals) = self.table.frame_size(scope);
        let compiled = CompiledBlock {
            name: info.name.clone(),
            is_class_method: false,
            qualified_name: self.table.qualified_name(scope),
            primitive_name: None,
            nargs,
            nlocals,
            bytecode,
            blocks: Vec::new(),
        };
        trace!("{}: {} bytes", compiled.qualified_name, compiled.bytecode.len());

        let slot = ctx.blocks.get_mut(usize::from(index)).ok_or_else(|| {
            CompileError::Internal(format!("block index {index} out of range for {}", compiled.qualified_name))
        })?;
        *slot = Some(compiled);
        Ok(index)
    }

    fn body(&self, ctx: &mut Context<'_>, body: &Body) -> Result<(), CompileError> {
        let count = body.statements.len();
        for (i, &stmt) in body.statements.iter().enumerate() {
            self.expr(ctx, stmt)?;
            if i + 1 < count {
                ctx.code.pop();
            }
        }
        Ok(())
    }

    /// Absolute field slot; inherited fields can push it past `u16`.
    fn field(&self, symbol: SymbolId, span: Span) -> Result<u16, CompileError> {
        limit(self.table.field_index(symbol), "fields", span)
    }

    fn binding(&self, id: ExprId) -> Result<Binding, CompileError> {
        self.bindings.get(id).ok_or_else(|| {
            CompileError::Internal(format!("identifier at {} was never resolved", self.arena[id].span))
        })
    }

    fn expr(&self, ctx: &mut Context<'_>, id: ExprId) -> Result<(), CompileError> {
        let node = &self.arena[id];
        let span = node.span;
        match &node.kind {
            ExprKind::Integer(value) => ctx.code.push_int(*value),
            ExprKind::Float(value) => ctx.code.push_float(*value),
            ExprKind::Char(c) => {
                let code = u16::try_from(u32::from(*c)).map_err(|_| {
                    CompileError::Internal(format!("character literal at {span} is outside 16 bits"))
                })?;
                ctx.code.push_char(code);
            }
            ExprKind::String(s) => {
                let literal = ctx.class.literal(s, span)?;
                ctx.code.push_literal(literal);
            }
            ExprKind::Nil => ctx.code.push_nil(),
            ExprKind::True => ctx.code.push_true(),
            ExprKind::False => ctx.code.push_false(),
            ExprKind::SelfRef => ctx.code.push_self(),

            ExprKind::Ident(name) => match self.binding(id)? {
                Binding::Field { symbol } => ctx.code.push_field(self.field(symbol, span)?),
                Binding::Local { symbol, depth } => {
                    ctx.code.push_local(depth, self.table.symbol(symbol).index)
                }
                Binding::Global => {
                    let literal = ctx.class.literal(name, span)?;
                    ctx.code.push_global(literal);
                }
            },

            ExprKind::Assignment { target, value } => {
                self.expr(ctx, *value)?;
                match self.binding(*target)? {
                    Binding::Field { symbol } => ctx.code.store_field(self.field(symbol, span)?),
                    Binding::Local { symbol, depth } => {
                        ctx.code.store_local(depth, self.table.symbol(symbol).index)
                    }
                    Binding::Global => {
                        return Err(CompileError::Internal(format!(
                            "assignment to a global at {span} reached code generation"
                        )));
                    }
                }
            }

            ExprKind::Return(value) => {
                self.expr(ctx, *value)?;
                self.dbg(ctx, span.start)?;
                ctx.code.method_return();
            }

            ExprKind::Array(items) => {
                for &item in items {
                    self.expr(ctx, item)?;
                }
                ctx.code.push_array(limit(items.len(), "array elements", span)?);
            }

            ExprKind::Block(block) => {
                let index = self.block(ctx, id, &block.body, block.close.start)?;
                ctx.code.block(index);
            }

            ExprKind::UnaryMessage {
                receiver, selector, ..
            } => {
                self.expr(ctx, *receiver)?;
                self.send(ctx, selector, 0, span)?;
            }
            ExprKind::BinaryMessage {
                receiver,
                operator,
                argument,
                ..
            } => {
                self.expr(ctx, *receiver)?;
                self.expr(ctx, *argument)?;
                self.send(ctx, operator, 1, span)?;
            }
            ExprKind::KeywordMessage { receiver, pairs } => {
                self.expr(ctx, *receiver)?;
                for pair in pairs {
                    self.expr(ctx, pair.argument)?;
                }
                self.send(ctx, &keyword_selector(pairs), pairs.len(), span)?;
            }
            ExprKind::SuperSend {
                selector,
                arguments,
                ..
            } => {
                ctx.code.push_self();
                for &arg in arguments {
                    self.expr(ctx, arg)?;
                }
                let argc = limit(arguments.len(), "message arguments", span)?;
                let selector = ctx.class.literal(selector, span)?;
                ctx.code.send_super(argc, selector);
            }
        }
        Ok(())
    }

    fn send(&self, ctx: &mut Context<'_>, selector: &str, argc: usize, span: Span) -> Result<(), CompileError> {
        let argc = limit(argc, "message arguments", span)?;
        let selector = ctx.class.literal(selector, span)?;
        ctx.code.send(argc, selector);
        Ok(())
    }

    /// `dbg file, line:column` at `at`; a no-op unless debug info is on.
    /// Columns are emitted 0-based, the way the VM counts them.
    fn dbg(&self, ctx: &mut Context<'_>, at: Pos) -> Result<(), CompileError> {
        if !self.options.debug_info {
            return Ok(());
        }
        let span = Span::point(at);
        let file = match ctx.class.file {
            Some(file) => file,
            None => {
                let file = ctx.class.literal(&self.options.file_name, span)?;
                ctx.class.file = Some(file);
                file
            }
        };
        let line = limit(at.line, "source lines", span)?;
        let column = limit(at.column.saturating_sub(1), "columns", span)?;
        ctx.code.dbg(file, line, column);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::define::define_symbols;
    use crate::resolve::resolve_symbols;
    use bytecode::{BytecodeDecoder, Instruction};

    fn generate_with(src: &str, options: &CompileOptions) -> Result<Vec<CompiledClass>, CompileError> {
        let file = parser::parse_source(src).expect("valid source");
        let mut table = SymbolTable::new();
        let (scopes, errors) = define_symbols(&file, &mut table);
        assert!(errors.is_empty(), "{errors:?}");
        let (bindings, errors) = resolve_symbols(&file, &table, &scopes, options);
        assert!(errors.is_empty(), "{errors:?}");
        generate(&file, &table, &scopes, &bindings, options)
    }

    fn decode(bytes: &[u8]) -> Vec<Instruction> {
        BytecodeDecoder::new(bytes).collect::<Result<_, _>>().unwrap()
    }

    #[test]
    fn blocks_land_at_their_index() {
        let classes = generate_with(
            "Object subclass: #T [ run [ ^[ [ 1 ] value ] value + [ 2 ] value ] ]",
            &CompileOptions::default(),
        )
        .unwrap();
        let run = &classes[0].methods[0];
        let names: Vec<_> = run.blocks.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["run-block0", "run-block1", "run-block2"]);
        assert_eq!(decode(&run.blocks[0].bytecode)[0], Instruction::Block { index: 1 });
        assert_eq!(
            decode(&run.blocks[2].bytecode),
            [Instruction::PushInt { value: 2 }, Instruction::BlockReturn]
        );
    }

    #[test]
    fn literals_are_interned_in_emission_order() {
        let classes = generate_with(
            "Object subclass: #T [ run [ Transcript show: 'a'. Transcript show: 'b' ] ]",
            &CompileOptions::default(),
        )
        .unwrap();
        let literals: Vec<_> = classes[0].literals.iter().collect();
        assert_eq!(literals, ["Transcript", "a", "show:", "b"]);
    }

    #[test]
    fn dbg_interns_the_file_name_once() {
        let options = CompileOptions {
            file_name: "t.st".into(),
            debug_info: true,
            ..CompileOptions::default()
        };
        let classes = generate_with("Object subclass: #T [ run [ ^1 ]\n  two [ ^2 ] ]", &options).unwrap();
        let class = &classes[0];
        assert_eq!(class.literals.iter().collect::<Vec<_>>(), ["t.st"]);
        assert_eq!(
            decode(&class.methods[0].bytecode),
            [
                Instruction::PushInt { value: 1 },
                Instruction::Dbg { file: 0, line: 1, column: 28 },
                Instruction::Return,
                Instruction::Dbg { file: 0, line: 1, column: 31 },
                Instruction::PushSelf,
                Instruction::Return,
            ]
        );
        assert_eq!(
            decode(&class.methods[1].bytecode)[1],
            Instruction::Dbg { file: 0, line: 2, column: 8 }
        );
    }

    #[test]
    fn missing_binding_is_an_internal_error() {
        let file = parser::parse_source("Object subclass: #T [ run [ ^x ] ]").unwrap();
        let mut table = SymbolTable::new();
        let (scopes, _) = define_symbols(&file, &mut table);
        let err = generate(&file, &table, &scopes, &Bindings::default(), &CompileOptions::default())
            .unwrap_err();
        assert!(err.is_internal());
    }
}
