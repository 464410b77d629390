use clap::Parser as ClapParser;
use std::{
    fs,
    path::{Path, PathBuf},
    process,
};

use anyhow::{Context, Result};
use compiler::{CompileOptions, CompiledClass, Compiler};
use log::info;

#[derive(ClapParser, Debug)]
#[command(author, version, about = "Compile Smalltalk class files to .sto object files", long_about = None)]
struct Cli {
    /// Source file to compile
    #[arg(help = "The .st file to compile")]
    file: PathBuf,

    /// Emit `dbg` instructions
    #[arg(long, help = "Emit dbg instructions carrying source positions")]
    dbg: bool,

    /// Write the disassembly of every class next to the object files
    #[arg(long, help = "Also write <FILE>-teststring.txt with the disassembly")]
    dis: bool,

    /// Reject undeclared names instead of treating them as globals
    #[arg(long, help = "Report names that are not declared anywhere")]
    strict_globals: bool,

    /// Where the generated files go
    #[arg(short, long, default_value = ".", help = "Output directory")]
    output: PathBuf,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(err) => {
            eprintln!("error: {err:#}");
            process::exit(1);
        }
    }
}

/// Compiles `cli.file` and writes the outputs. Returns `false` if the
/// source had errors; they have been printed by then.
fn run(cli: &Cli) -> Result<bool> {
    let source = fs::read_to_string(&cli.file)
        .with_context(|| format!("reading {}", cli.file.display()))?;
    let file_name = cli
        .file
        .file_name()
        .map_or_else(|| cli.file.display().to_string(), |n| n.to_string_lossy().into_owned());

    let compiler = Compiler::new(options(cli, &file_name));
    let classes = match compiler.compile_source(&source) {
        Ok(classes) => classes,
        Err(errors) => {
            for err in errors.iter() {
                match err.span() {
                    Some(_) => eprintln!("{file_name}:{err}"),
                    None => eprintln!("{err}"),
                }
            }
            return Ok(false);
        }
    };

    fs::create_dir_all(&cli.output)
        .with_context(|| format!("creating {}", cli.output.display()))?;
    for class in &classes {
        write_object_file(&cli.output, class)?;
    }

    if cli.dis {
        let path = cli.output.join(format!("{file_name}-teststring.txt"));
        let text: String = classes.iter().map(ToString::to_string).collect();
        fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
        info!("wrote {}", path.display());
    }
    Ok(true)
}

fn options(cli: &Cli, file_name: &str) -> CompileOptions {
    CompileOptions {
        file_name: file_name.to_owned(),
        debug_info: cli.dbg,
        strict_globals: cli.strict_globals,
    }
}

fn write_object_file(dir: &Path, class: &CompiledClass) -> Result<()> {
    let path = dir.join(format!("{}.sto", class.name));
    let json = class
        .to_json()
        .with_context(|| format!("serializing class {}", class.name))?;
    fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    info!("wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_map_to_options() {
        let cli = Cli::try_parse_from(["stc", "--dbg", "--strict-globals", "-o", "out", "dir/t.st"]).unwrap();
        assert_eq!(cli.output, PathBuf::from("out"));
        assert!(!cli.dis);

        let options = options(&cli, "t.st");
        assert_eq!(options.file_name, "t.st");
        assert!(options.debug_info);
        assert!(options.strict_globals);
    }

    #[test]
    fn output_defaults_to_current_directory() {
        let cli = Cli::try_parse_from(["stc", "--dis", "t.st"]).unwrap();
        assert_eq!(cli.output, PathBuf::from("."));
        assert!(cli.dis);
    }
}
