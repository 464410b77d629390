//! Compiled classes and blocks: the unit handed to the VM.

use core::fmt;

use bytecode::{BytecodeDecoder, Instruction};
use serde::{Serialize, Serializer};

use crate::literal::LiteralTable;

/// Code for one method or block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledBlock {
    pub name: String,
    pub is_class_method: bool,
    pub qualified_name: String,
    /// Set for `<primitive: #name>` methods, which carry no bytecode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primitive_name: Option<String>,
    pub nargs: u16,
    pub nlocals: u16,
    #[serde(serialize_with = "signed_bytes")]
    pub bytecode: Vec<u8>,
    /// Methods only: every block nested in the method, by block index.
    /// Always written, empty for blocks and primitives.
    pub blocks: Vec<CompiledBlock>,
}

/// The VM's loader reads bytecode as Java bytes.
fn signed_bytes<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(bytes.iter().map(|&b| b as i8))
}

impl CompiledBlock {
    pub fn is_primitive(&self) -> bool {
        self.primitive_name.is_some()
    }

    pub fn instructions(&self) -> BytecodeDecoder<'_> {
        BytecodeDecoder::new(&self.bytecode)
    }

    /// Golden-file rendering of this block and its nested blocks.
    pub fn disassemble(&self, literals: &LiteralTable) -> String {
        let mut out = String::new();
        write_block(&mut out, self, literals, 0);
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledClass {
    pub name: String,
    /// `None` for root classes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub super_class_name: Option<String>,
    pub literals: LiteralTable,
    /// Own fields only, in declaration order.
    pub fields: Vec<String>,
    pub methods: Vec<CompiledBlock>,
}

impl CompiledClass {
    pub fn method(&self, name: &str) -> Option<&CompiledBlock> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// The `.sto` object file contents.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for CompiledClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let superclass = match self.super_class_name.as_deref() {
            None | Some("Object") => "",
            Some(name) => name,
        };
        let literals: Vec<_> = self.literals.iter().map(|s| format!("'{s}'")).collect();

        writeln!(f, "name: {}", self.name)?;
        writeln!(f, "superClass: {superclass}")?;
        writeln!(f, "fields: {}", self.fields.join(","))?;
        writeln!(f, "literals: {}", literals.join(","))?;
        writeln!(f, "methods:")?;
        let mut out = String::new();
        for method in &self.methods {
            write_block(&mut out, method, &self.literals, 1);
        }
        f.write_str(&out)
    }
}

fn write_block(out: &mut String, block: &CompiledBlock, literals: &LiteralTable, depth: usize) {
    let pad = "    ".repeat(depth);
    let prefix = if block.is_class_method { "static " } else { "" };
    let mut line = |text: &str| {
        out.push_str(&pad);
        out.push_str(text);
        out.push('\n');
    };
    line(&format!("name: {prefix}{}", block.name));
    line(&format!("qualifiedName: {}", block.qualified_name));
    line(&format!("nargs: {}", block.nargs));
    line(&format!("nlocals: {}", block.nlocals));

    let mut decoder = block.instructions();
    loop {
        let offset = decoder.offset();
        match decoder.decode_next() {
            None => break,
            Some(Ok(instr)) => line(&format!("{offset:04}:  {}", render(instr, literals))),
            Some(Err(err)) => line(&format!("{offset:04}:  <{err}>")),
        }
    }

    if !block.blocks.is_empty() {
        line("blocks:");
        for nested in &block.blocks {
            write_block(out, nested, literals, depth + 1);
        }
    }
}

/// Like the instruction's own `Display`, with literal indices replaced by
/// the quoted strings they name.
fn render(instr: Instruction, literals: &LiteralTable) -> String {
    let name = instr.op().mnemonic();
    let text = |index: u16| match literals.get(usize::from(index)) {
        Some(s) => format!("'{s}'"),
        None => format!("#{index}"),
    };
    match instr {
        Instruction::PushLiteral { literal } | Instruction::PushGlobal { literal } => {
            format!("{name:<15}{}", text(literal))
        }
        Instruction::Send { argc, selector } | Instruction::SendSuper { argc, selector } => {
            format!("{name:<15}{argc}, {}", text(selector))
        }
        Instruction::Dbg { file, line, column } => {
            format!("{name:<15}{}, {line}:{column}", text(file))
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytecode::BytecodeBuilder;

    fn sample() -> CompiledClass {
        let mut literals = LiteralTable::new();
        let hi = literals.intern("hi") as u16;
        let show = literals.intern("show:") as u16;

        let mut code = BytecodeBuilder::new();
        code.push_self();
        code.push_literal(hi);
        code.send(1, show);
        code.pop();
        code.block(0);
        code.pop();
        code.push_self();
        code.method_return();

        let mut inner = BytecodeBuilder::new();
        inner.push_local(1, 0);
        inner.block_return();

        let block = CompiledBlock {
            name: "run:-block0".into(),
            is_class_method: false,
            qualified_name: "T>>run:>>run:-block0".into(),
            primitive_name: None,
            nargs: 0,
            nlocals: 0,
            bytecode: inner.into_bytes(),
            blocks: Vec::new(),
        };
        let run = CompiledBlock {
            name: "run:".into(),
            is_class_method: false,
            qualified_name: "T>>run:".into(),
            primitive_name: None,
            nargs: 1,
            nlocals: 0,
            bytecode: code.into_bytes(),
            blocks: vec![block],
        };
        let new = CompiledBlock {
            name: "new".into(),
            is_class_method: true,
            qualified_name: "T>>new".into(),
            primitive_name: Some("T_new".into()),
            nargs: 0,
            nlocals: 0,
            bytecode: Vec::new(),
            blocks: Vec::new(),
        };
        CompiledClass {
            name: "T".into(),
            super_class_name: Some("Object".into()),
            literals,
            fields: vec!["x".into(), "y".into()],
            methods: vec![run, new],
        }
    }

    #[test]
    fn golden_disassembly() {
        let expected = "\
name: T
superClass: \n\
fields: x,y
literals: 'hi','show:'
methods:
    name: run:
    qualifiedName: T>>run:
    nargs: 1
    nlocals: 0
    0000:  self
    0001:  push_literal   'hi'
    0004:  send           1, 'show:'
    0009:  pop
    0010:  block          0
    0013:  pop
    0014:  self
    0015:  return
    blocks:
        name: run:-block0
        qualifiedName: T>>run:>>run:-block0
        nargs: 0
        nlocals: 0
        0000:  push_local     1, 0
        0005:  block_return
    name: static new
    qualifiedName: T>>new
    nargs: 0
    nlocals: 0
";
        assert_eq!(sample().to_string(), expected);
    }

    #[test]
    fn superclass_line_names_non_object_parents() {
        let mut class = sample();
        class.super_class_name = Some("Base".into());
        assert!(class.to_string().contains("superClass: Base\n"));
        class.super_class_name = None;
        assert!(class.to_string().contains("superClass: \n"));
        class.fields.clear();
        assert!(class.to_string().contains("fields: \nliterals: 'hi'"));
    }

    #[test]
    fn json_layout() {
        let json: serde_json::Value = serde_json::from_str(&sample().to_json().unwrap()).unwrap();
        assert_eq!(json["name"], "T");
        assert_eq!(json["superClassName"], "Object");
        assert_eq!(json["literals"], serde_json::json!(["hi", "show:"]));
        assert_eq!(json["fields"], serde_json::json!(["x", "y"]));

        let run = &json["methods"][0];
        assert_eq!(run["qualifiedName"], "T>>run:");
        assert_eq!(run["isClassMethod"], false);
        assert!(run.get("primitiveName").is_none());
        assert_eq!(run["bytecode"][0], 2);
        assert_eq!(run["blocks"][0]["name"], "run:-block0");
        assert_eq!(run["blocks"][0]["blocks"], serde_json::json!([]));

        let new = &json["methods"][1];
        assert_eq!(new["primitiveName"], "T_new");
        assert_eq!(new["bytecode"], serde_json::json!([]));
        assert_eq!(new["blocks"], serde_json::json!([]));
    }

    #[test]
    fn bytecode_is_written_as_signed_bytes() {
        let mut class = sample();
        class.methods[0].bytecode = vec![0x06, 0xff, 0xff, 0xff, 0xfe];
        let json: serde_json::Value = serde_json::from_str(&class.to_json().unwrap()).unwrap();
        assert_eq!(json["methods"][0]["bytecode"], serde_json::json!([6, -1, -1, -1, -2]));
    }
}
