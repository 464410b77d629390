use bytecode::{BytecodeDecoder, Instruction};
use compiler::{CompileError, CompileOptions, CompiledBlock, CompiledClass, Compiler};
use proptest::proptest;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn compile_with(src: &str, options: CompileOptions) -> Vec<CompiledClass> {
    init_logger();
    Compiler::new(options)
        .compile_source(src)
        .unwrap_or_else(|errors| panic!("compilation failed:\n{errors}"))
}

fn compile(src: &str) -> Vec<CompiledClass> {
    compile_with(src, CompileOptions::default())
}

fn compile_err(src: &str) -> Vec<CompileError> {
    init_logger();
    match Compiler::default().compile_source(src) {
        Ok(classes) => panic!("expected errors, compiled {} classes", classes.len()),
        Err(errors) => errors.into_iter().collect(),
    }
}

fn code(block: &CompiledBlock) -> Vec<Instruction> {
    BytecodeDecoder::new(&block.bytecode)
        .collect::<Result<_, _>>()
        .expect("generated bytecode decodes")
}

fn lit(class: &CompiledClass, s: &str) -> u16 {
    class.literals.index_of(s).expect("interned") as u16
}

fn class<'a>(classes: &'a [CompiledClass], name: &str) -> &'a CompiledClass {
    classes.iter().find(|c| c.name == name).expect("class compiled")
}

use Instruction::*;

#[test]
fn return_constant_keeps_failsafe_trailer() {
    let classes = compile("Object subclass: #T [ run [ ^3 ] ]");
    let run = classes[0].method("run").unwrap();
    assert_eq!(code(run), [PushInt { value: 3 }, Return, PushSelf, Return]);
}

#[test]
fn empty_method_returns_self() {
    let classes = compile("Object subclass: #T [ run [ ] ]");
    assert_eq!(code(&classes[0].methods[0]), [PushSelf, Return]);
}

#[test]
fn empty_block_is_just_block_return() {
    let classes = compile("Object subclass: #T [ run [ ^[ ] ] ]");
    assert_eq!(code(&classes[0].methods[0].blocks[0]), [BlockReturn]);
}

#[test]
fn keyword_send_pushes_receiver_then_arguments() {
    let classes = compile("Object subclass: #T [ | x | run [ x at: 1 put: 'a' ] ]");
    let t = &classes[0];
    assert_eq!(
        code(&t.methods[0]),
        [
            PushField { index: 0 },
            PushInt { value: 1 },
            PushLiteral { literal: lit(t, "a") },
            Send {
                argc: 2,
                selector: lit(t, "at:put:"),
            },
            PushSelf,
            Return,
        ]
    );
}

#[test]
fn inherited_fields_shift_subclass_indices() {
    let src = |base_fields: &str| {
        format!(
            "Object subclass: #A [ | {base_fields} | ]
             A subclass: #B [ | b | get [ ^b ] ]
             B subclass: #C [ | c | get [ ^c ] set [ c := 5 ] ]"
        )
    };

    let classes = compile(&src("a"));
    assert_eq!(code(&class(&classes, "B").methods[0])[0], PushField { index: 1 });
    assert_eq!(code(&class(&classes, "C").methods[0])[0], PushField { index: 2 });

    let classes = compile(&src("a z"));
    assert_eq!(code(&class(&classes, "B").methods[0])[0], PushField { index: 2 });
    let c = class(&classes, "C");
    assert_eq!(code(&c.methods[0])[0], PushField { index: 3 });
    assert_eq!(
        code(&c.methods[1]),
        [PushInt { value: 5 }, StoreField { index: 3 }, PushSelf, Return]
    );
    assert_eq!(c.fields, ["c"]);
}

/// `C0` derives from `Object`, every later `Ci` from `Ci-1`. Class `Ci`
/// declares `counts[i]` fields with one reader `mj` per field; `extra`
/// appends one more field to `C0`.
fn chain_source(counts: &[usize], extra: bool) -> String {
    let mut src = String::new();
    for (i, &n) in counts.iter().enumerate() {
        let sup = match i {
            0 => "Object".to_owned(),
            _ => format!("C{}", i - 1),
        };
        let mut fields: Vec<_> = (0..n).map(|j| format!("c{i}f{j}")).collect();
        if extra && i == 0 {
            fields.push("extra".into());
        }
        let decl = if fields.is_empty() {
            String::new()
        } else {
            format!("| {} |", fields.join(" "))
        };
        let readers: Vec<_> = (0..n).map(|j| format!("m{j} [ ^c{i}f{j} ]")).collect();
        src.push_str(&format!("{sup} subclass: #C{i} [ {decl} {} ]\n", readers.join(" ")));
    }
    src
}

/// Slot read by every reader of the chain, per class.
fn reader_slots(classes: &[CompiledClass], counts: &[usize]) -> Vec<Vec<u16>> {
    counts
        .iter()
        .enumerate()
        .map(|(i, &n)| {
            let c = class(classes, &format!("C{i}"));
            (0..n)
                .map(|j| match code(c.method(&format!("m{j}")).unwrap())[0] {
                    PushField { index } => index,
                    other => panic!("C{i}>>m{j} starts with {other}"),
                })
                .collect()
        })
        .collect()
}

#[test]
fn subclass_before_superclass() {
    let classes = compile(
        "A subclass: #B [ | b | get [ ^b ] ]
         Object subclass: #A [ | a | ]",
    );
    assert_eq!(code(&class(&classes, "B").methods[0])[0], PushField { index: 1 });
}

#[test]
fn unknown_superclass_contributes_no_fields() {
    let classes = compile("Collection subclass: #Bag [ | items | get [ ^items ] ]");
    assert_eq!(code(&classes[0].methods[0])[0], PushField { index: 0 });
    assert_eq!(classes[0].super_class_name.as_deref(), Some("Collection"));
}

#[test]
fn literal_table_has_no_duplicates() {
    let classes = compile(
        "Object subclass: #T [
            a [ Transcript show: 'hi'. Transcript show: 'hi' ]
            b [ ^Transcript show: 'hi' ]
        ]",
    );
    let literals: Vec<_> = classes[0].literals.iter().collect();
    assert_eq!(literals, ["Transcript", "hi", "show:"]);
}

#[test]
fn read_and_write_share_an_address() {
    let classes = compile("Object subclass: #T [ run: a [ | t | ^[ t := a. t ] value ] ]");
    assert_eq!(
        code(&classes[0].methods[0].blocks[0]),
        [
            PushLocal { depth: 1, slot: 0 },
            StoreLocal { depth: 1, slot: 1 },
            Pop,
            PushLocal { depth: 1, slot: 1 },
            BlockReturn,
        ]
    );
}

#[test]
fn doubly_nested_block_reads_method_argument() {
    let classes = compile("Object subclass: #T [ run: n [ ^[ [ n ] value ] value ] ]");
    let run = &classes[0].methods[0];
    assert_eq!(run.blocks.len(), 2);
    assert_eq!(run.blocks[1].qualified_name, "T>>run:>>run:-block0>>run:-block1");
    assert_eq!(
        code(&run.blocks[1]),
        [PushLocal { depth: 2, slot: 0 }, BlockReturn]
    );
}

#[test]
fn block_arguments_and_locals() {
    let classes = compile("Object subclass: #T [ run [ ^[:a :b | | c | c := a + b ] ] ]");
    let block = &classes[0].methods[0].blocks[0];
    assert_eq!((block.nargs, block.nlocals), (2, 1));
    assert!(!block.is_class_method);
}

#[test]
fn super_sends_in_every_form() {
    let classes = compile(
        "Object subclass: #T [
            foo [ ^super foo ]
            + other [ ^super + other ]
            at: i put: v [ ^super at: i put: v ]
        ]",
    );
    let t = &classes[0];
    assert_eq!(
        code(t.method("foo").unwrap())[..2],
        [PushSelf, SendSuper { argc: 0, selector: lit(t, "foo") }]
    );
    assert_eq!(
        code(t.method("+").unwrap())[..3],
        [
            PushSelf,
            PushLocal { depth: 0, slot: 0 },
            SendSuper { argc: 1, selector: lit(t, "+") },
        ]
    );
    assert_eq!(
        code(t.method("at:put:").unwrap())[..4],
        [
            PushSelf,
            PushLocal { depth: 0, slot: 0 },
            PushLocal { depth: 0, slot: 1 },
            SendSuper { argc: 2, selector: lit(t, "at:put:") },
        ]
    );
}

#[test]
fn literals_of_every_kind() {
    let classes = compile("Object subclass: #T [ run [ ^{1. -2. 2.5. $a. nil. true. false. self} ] ]");
    assert_eq!(
        code(&classes[0].methods[0]),
        [
            PushInt { value: 1 },
            PushInt { value: -2 },
            PushFloat { value: 2.5 },
            PushChar { code: u16::from(b'a') },
            Nil,
            True,
            False,
            PushSelf,
            PushArray { count: 8 },
            Return,
            PushSelf,
            Return,
        ]
    );
}

#[test]
fn binary_operators_are_left_associative() {
    let classes = compile("Object subclass: #T [ run [ ^1 + 2 * 3 ] ]");
    let t = &classes[0];
    assert_eq!(
        code(&t.methods[0])[..5],
        [
            PushInt { value: 1 },
            PushInt { value: 2 },
            Send { argc: 1, selector: lit(t, "+") },
            PushInt { value: 3 },
            Send { argc: 1, selector: lit(t, "*") },
        ]
    );
}

#[test]
fn primitive_and_class_methods() {
    let classes = compile(
        "Object subclass: #T [
            class new <primitive: #T_new>
            class default [ ^self new ]
            new [ ^self ]
        ]",
    );
    let t = &classes[0];
    let prim = &t.methods[0];
    assert!(prim.is_class_method);
    assert!(prim.is_primitive());
    assert_eq!(prim.primitive_name.as_deref(), Some("T_new"));
    assert!(prim.bytecode.is_empty());
    assert_eq!(prim.nlocals, 0);

    assert!(t.methods[1].is_class_method);
    assert!(!t.methods[1].is_primitive());
    assert!(!t.methods[2].is_class_method);
    assert_eq!(t.methods[2].qualified_name, "T>>new");
}

#[test]
fn trailing_statements_become_main_class() {
    let classes = compile(
        "Object subclass: #T [ ]
         | x | x := T new. x",
    );
    assert_eq!(classes.len(), 2);
    let main = class(&classes, "MainClass");
    assert_eq!(main.super_class_name.as_deref(), Some("Object"));
    let method = main.method("main").unwrap();
    assert_eq!(method.qualified_name, "MainClass>>main");
    assert_eq!((method.nargs, method.nlocals), (0, 1));
    assert_eq!(
        code(method),
        [
            PushGlobal { literal: lit(main, "T") },
            Send { argc: 0, selector: lit(main, "new") },
            StoreLocal { depth: 0, slot: 0 },
            Pop,
            PushLocal { depth: 0, slot: 0 },
            PushSelf,
            Return,
        ]
    );
}

#[test]
fn duplicate_temp_in_block_stops_before_codegen() {
    let errors = compile_err("Object subclass: #T [ run [ ^[ | temp temp | temp ] ] ]");
    assert_eq!(errors.len(), 1);
    assert!(matches!(&errors[0], CompileError::DuplicateDefinition { name, .. } if name == "temp"));
}

#[test]
fn errors_from_both_passes_are_reported_together() {
    let errors = compile_err(
        "Object subclass: #T [ run [ | a a | Smalltalk := 1 ] ]
         Object subclass: #T [ ]",
    );
    let kinds: Vec<_> = errors
        .iter()
        .map(|e| match e {
            CompileError::DuplicateDefinition { name, .. } => format!("dup {name}"),
            CompileError::InvalidAssignmentTarget { name, .. } => format!("assign {name}"),
            other => format!("{other}"),
        })
        .collect();
    assert_eq!(kinds, ["dup a", "dup T", "assign Smalltalk"]);
}

#[test]
fn syntax_errors_are_reported_as_such() {
    let errors = compile_err("Object subclass: #T [ run [ ^ ] ] Object subclass: #U [ x [ ( ] ]");
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|e| matches!(e, CompileError::Syntax { .. })));
}

#[test]
fn strict_globals() {
    let src = "Object subclass: #T [ run [ ^Transcript show: T name ] ]";
    let options = CompileOptions {
        strict_globals: true,
        ..CompileOptions::default()
    };
    init_logger();
    let errors = Compiler::new(options).compile_source(src).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.to_string(), "1:30: unresolved reference to `Transcript`");

    assert_eq!(compile(src).len(), 1);
}

#[test]
fn golden_disassembly() {
    let classes = compile(
        "Object subclass: #T [
    | x |
    run: n [ x := n. ^[:k | k + x] value: 1 ]
]",
    );
    let expected = "\
name: T
superClass: \n\
fields: x
literals: '+','value:'
methods:
    name: run:
    qualifiedName: T>>run:
    nargs: 1
    nlocals: 0
    0000:  push_local     0, 0
    0005:  store_field    0
    0008:  pop
    0009:  block          0
    0012:  push_int       1
    0017:  send           1, 'value:'
    0022:  return
    0023:  self
    0024:  return
    blocks:
        name: run:-block0
        qualifiedName: T>>run:>>run:-block0
        nargs: 1
        nlocals: 0
        0000:  push_local     0, 0
        0005:  push_field     0
        0008:  send           1, '+'
        0013:  block_return
";
    assert_eq!(classes[0].to_string(), expected);
}

#[test]
fn debug_info_marks_returns_and_block_ends() {
    let options = CompileOptions {
        file_name: "t.st".into(),
        debug_info: true,
        ..CompileOptions::default()
    };
    let classes = compile_with("Object subclass: #T [ run [ ^[ 1 ] ] ]", options);
    let t = &classes[0];
    let file = lit(t, "t.st");
    assert_eq!(
        code(&t.methods[0].blocks[0]),
        [
            PushInt { value: 1 },
            Dbg { file, line: 1, column: 33 },
            BlockReturn,
        ]
    );
    assert!(t.to_string().contains("dbg            't.st', 1:28"));
}

#[test]
fn object_file_json() {
    let classes = compile("nil subclass: #Root [ | a | ] Root subclass: #T [ foo [ ^[ a ] ] ]");
    let root: serde_json::Value = serde_json::from_str(&classes[0].to_json().unwrap()).unwrap();
    assert!(root.get("superClassName").is_none());
    assert_eq!(root["fields"], serde_json::json!(["a"]));

    let t: serde_json::Value = serde_json::from_str(&classes[1].to_json().unwrap()).unwrap();
    assert_eq!(t["superClassName"], "Root");
    let foo = &t["methods"][0];
    assert_eq!(foo["name"], "foo");
    assert_eq!(foo["nargs"], 0);
    assert_eq!(foo["blocks"][0]["qualifiedName"], "T>>foo>>foo-block0");
    assert_eq!(foo["blocks"][0]["blocks"], serde_json::json!([]));
}

fn numbered(prefix: &str, n: usize) -> String {
    (0..n).map(|i| format!("{prefix}{i}")).collect::<Vec<_>>().join(" ")
}

fn limit_errors(errors: &[CompileError]) -> Vec<&'static str> {
    errors
        .iter()
        .map(|e| match e {
            CompileError::LimitExceeded { what, .. } => *what,
            other => panic!("unexpected error: {other}"),
        })
        .collect()
}

#[test]
fn too_many_fields_in_one_class() {
    let src = format!("Object subclass: #T [ | {} | get [ ^f65535 ] ]", numbered("f", 65536));
    let errors = compile_err(&src);
    assert_eq!(limit_errors(&errors), ["fields"]);
}

#[test]
fn too_many_locals_in_one_method() {
    let src = format!("Object subclass: #T [ run [ | {} | ^t0 ] ]", numbered("t", 65536));
    let errors = compile_err(&src);
    assert_eq!(limit_errors(&errors), ["arguments and locals"]);
}

#[test]
fn too_many_blocks_in_one_method() {
    let body = vec!["[ ]"; 65536].join(". ");
    let errors = compile_err(&format!("Object subclass: #T [ run [ {body} ] ]"));
    assert_eq!(limit_errors(&errors), ["blocks"]);
}

#[test]
fn inherited_fields_past_u16_are_rejected() {
    let src = format!(
        "Object subclass: #A [ | {} | ]
         A subclass: #B [ | {} | get [ ^b29999 ] ]",
        numbered("a", 40000),
        numbered("b", 30000),
    );
    let errors = compile_err(&src);
    assert_eq!(limit_errors(&errors), ["fields"]);
}

proptest! {
    #[test]
    fn field_slots_add_up_along_the_chain(counts in proptest::collection::vec(0usize..5, 1..5)) {
        let slots = reader_slots(&compile(&chain_source(&counts, false)), &counts);
        for (i, class_slots) in slots.iter().enumerate() {
            let inherited: usize = counts[..i].iter().sum();
            for (j, &slot) in class_slots.iter().enumerate() {
                assert_eq!(usize::from(slot), inherited + j, "C{i} field {j}");
            }
        }

        let shifted = reader_slots(&compile(&chain_source(&counts, true)), &counts);
        assert_eq!(shifted[0], slots[0]);
        for (i, (moved, before)) in shifted.iter().zip(&slots).enumerate().skip(1) {
            let expected: Vec<u16> = before.iter().map(|s| s + 1).collect();
            assert_eq!(moved, &expected, "C{i}");
        }
    }

    #[test]
    fn statements_are_separated_by_pops(n in 1usize..40) {
        let body: Vec<_> = (0..n).map(|i| i.to_string()).collect();
        let src = format!("Object subclass: #T [ run [ {} ] ]", body.join(". "));
        let classes = compile(&src);
        let run = code(&classes[0].methods[0]);
        assert_eq!(run.iter().filter(|i| **i == Pop).count(), n - 1);
        assert_eq!(run.len(), 2 * n - 1 + 2);
    }

    #[test]
    fn blocks_are_indexed_in_appearance_order(n in 1usize..20) {
        let body: Vec<_> = (0..n).map(|i| format!("[ {i} ]")).collect();
        let src = format!("Object subclass: #T [ run [ {} ] ]", body.join(". "));
        let classes = compile(&src);
        let run = &classes[0].methods[0];
        assert_eq!(run.blocks.len(), n);
        for (i, block) in run.blocks.iter().enumerate() {
            assert_eq!(code(block)[0], PushInt { value: i as i32 });
            assert_eq!(block.name, format!("run-block{i}"));
        }
    }
}
