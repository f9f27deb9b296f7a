// loxy-vm - Single-pass bytecode compiler and stack VM for the Loxy scripting language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! # loxy-vm
//!
//! Single-pass bytecode compiler and stack virtual machine for the Loxy
//! scripting language. Source text goes straight to bytecode (there is no
//! AST) and a register-free stack VM executes it against interned strings
//! and module-scoped globals.
//!
//! The embedding surface is [`VM::interpret`]:
//!
//! ```
//! use loxy_vm::{InterpretResult, VM};
//!
//! let mut vm = VM::new();
//! assert_eq!(vm.interpret("print 1 + 2;", "main"), InterpretResult::Ok);
//! ```

pub mod chunk;
pub mod compiler;
pub mod debug;
pub mod heap;
pub mod module;
pub mod opcode;
pub mod strings;
pub mod table;
pub mod value;
pub mod vm;

pub use chunk::{Chunk, MAX_CONSTANTS};
pub use heap::{Gc, Heap, Trace};
pub use module::Module;
pub use opcode::OpCode;
pub use strings::Strings;
pub use value::{LoxString, Value};
pub use vm::{InterpretResult, RuntimeError, RuntimeErrorKind, STACK_MAX, VM};
