use crate::op::Op;

/// Builds the byte sequence for one method or block body.
///
/// All multi-byte operands are written big-endian.
#[derive(Debug, Clone)]
pub struct BytecodeBuilder {
    buf: Vec<u8>,
}

impl BytecodeBuilder {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Current byte offset in the bytecode stream.
    pub fn current_offset(&self) -> usize {
        self.buf.len()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    // ── emit helpers ───────────────────────────────────────────────

    fn emit_op(&mut self, op: Op) {
        self.buf.push(op as u8);
    }

    fn emit_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn emit_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn op_u16(&mut self, op: Op, a: u16) {
        self.emit_op(op);
        self.emit_u16(a);
    }

    fn op_u16_u16(&mut self, op: Op, a: u16, b: u16) {
        self.emit_op(op);
        self.emit_u16(a);
        self.emit_u16(b);
    }

    // ── constants ──────────────────────────────────────────────────

    /// `nil`
    pub fn push_nil(&mut self) {
        self.emit_op(Op::Nil);
    }

    /// `self`
    pub fn push_self(&mut self) {
        self.emit_op(Op::PushSelf);
    }

    /// `true`
    pub fn push_true(&mut self) {
        self.emit_op(Op::True);
    }

    /// `false`
    pub fn push_false(&mut self) {
        self.emit_op(Op::False);
    }

    /// `push_char <code:u16>`
    pub fn push_char(&mut self, code: u16) {
        self.op_u16(Op::PushChar, code);
    }

    /// `push_int <value:i32>`
    pub fn push_int(&mut self, value: i32) {
        self.emit_op(Op::PushInt);
        self.emit_u32(value as u32);
    }

    /// `push_float <value:f32>`, IEEE 754 bits.
    pub fn push_float(&mut self, value: f32) {
        self.emit_op(Op::PushFloat);
        self.emit_u32(value.to_bits());
    }

    /// `push_literal <literal:u16>`
    pub fn push_literal(&mut self, literal: u16) {
        self.op_u16(Op::PushLiteral, literal);
    }

    /// `push_array <count:u16>`
    pub fn push_array(&mut self, count: u16) {
        self.op_u16(Op::PushArray, count);
    }

    // ── variables ──────────────────────────────────────────────────

    /// `push_field <index:u16>`
    pub fn push_field(&mut self, index: u16) {
        self.op_u16(Op::PushField, index);
    }

    /// `store_field <index:u16>`
    pub fn store_field(&mut self, index: u16) {
        self.op_u16(Op::StoreField, index);
    }

    /// `push_local <depth:u16> <slot:u16>`
    pub fn push_local(&mut self, depth: u16, slot: u16) {
        self.op_u16_u16(Op::PushLocal, depth, slot);
    }

    /// `store_local <depth:u16> <slot:u16>`
    pub fn store_local(&mut self, depth: u16, slot: u16) {
        self.op_u16_u16(Op::StoreLocal, depth, slot);
    }

    /// `push_global <literal:u16>`
    pub fn push_global(&mut self, literal: u16) {
        self.op_u16(Op::PushGlobal, literal);
    }

    // ── control ────────────────────────────────────────────────────

    /// `pop`
    pub fn pop(&mut self) {
        self.emit_op(Op::Pop);
    }

    /// `send <argc:u16> <selector:u16>`
    pub fn send(&mut self, argc: u16, selector: u16) {
        self.op_u16_u16(Op::Send, argc, selector);
    }

    /// `send_super <argc:u16> <selector:u16>`
    pub fn send_super(&mut self, argc: u16, selector: u16) {
        self.op_u16_u16(Op::SendSuper, argc, selector);
    }

    /// `block <index:u16>`
    pub fn block(&mut self, index: u16) {
        self.op_u16(Op::Block, index);
    }

    /// `block_return`
    pub fn block_return(&mut self) {
        self.emit_op(Op::BlockReturn);
    }

    /// `return` from the home method.
    pub fn method_return(&mut self) {
        self.emit_op(Op::Return);
    }

    /// `dbg <file:u16> <line:u16> <column:u16>`
    pub fn dbg(&mut self, file: u16, line: u16, column: u16) {
        self.emit_op(Op::Dbg);
        self.emit_u16(file);
        self.emit_u16(line);
        self.emit_u16(column);
    }
}

impl Default for BytecodeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
