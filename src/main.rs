// loxy - A bytecode-compiled Lox dialect with a module-aware stack VM
// Copyright (c) 2025 Tom Waddington. MIT licensed.

use std::env;
use std::fs;
use std::io::{self, Write};
use std::process;

use loxy_vm::{InterpretResult, VM};

// Exit codes follow the BSD sysexits convention.
const EX_USAGE: i32 = 64;
const EX_DATAERR: i32 = 65;
const EX_SOFTWARE: i32 = 70;
const EX_IOERR: i32 = 74;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() == 2 && (args[1] == "--version" || args[1] == "-v") {
        println!("Loxy v{}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let mut vm = VM::new();

    match args.len() {
        1 => repl(&mut vm),
        2 => run_file(&mut vm, &args[1]),
        _ => {
            eprintln!("Usage: loxy [path]");
            process::exit(EX_USAGE);
        }
    }
}

/// Read-eval-print loop. Every line runs in the same "main" module, so
/// top-level bindings persist for the whole session.
fn repl(vm: &mut VM) {
    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            break;
        }

        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(0) => {
                println!();
                break;
            }
            Ok(_) => {
                if line.trim().is_empty() {
                    continue;
                }
                vm.interpret(&line, "main");
            }
            Err(err) => {
                eprintln!("Read error: {}", err);
                break;
            }
        }
    }
}

/// Interpret a whole file as the "main" module.
fn run_file(vm: &mut VM, path: &str) {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("Error reading '{}': {}", path, err);
            process::exit(EX_IOERR);
        }
    };

    match vm.interpret(&source, "main") {
        InterpretResult::Ok => {}
        InterpretResult::CompileError => process::exit(EX_DATAERR),
        InterpretResult::RuntimeError => process::exit(EX_SOFTWARE),
    }
}
