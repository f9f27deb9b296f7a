// loxy-vm - Single-pass bytecode compiler and stack VM for the Loxy scripting language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Runtime errors and the interpret result.

use std::fmt;

/// Overall outcome of interpreting a source string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpretResult {
    Ok,
    CompileError,
    RuntimeError,
}

/// What went wrong during execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    /// Unary `-` on a non-number.
    OperandMustBeNumber,
    /// Arithmetic or ordering on non-numbers.
    OperandsMustBeNumbers,
    /// `+` on anything but two numbers or two strings.
    OperandsMustBeNumbersOrStrings,
    /// Read or assignment of a name the module never defined.
    UndefinedVariable(String),
    /// The value stack hit its fixed 256-slot cap.
    StackOverflow,
}

impl fmt::Display for RuntimeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeErrorKind::OperandMustBeNumber => write!(f, "Operand must be a number."),
            RuntimeErrorKind::OperandsMustBeNumbers => write!(f, "Operands must be numbers."),
            RuntimeErrorKind::OperandsMustBeNumbersOrStrings => {
                write!(f, "Operands must be two numbers or two strings.")
            }
            RuntimeErrorKind::UndefinedVariable(name) => {
                write!(f, "Undefined variable '{}'.", name)
            }
            RuntimeErrorKind::StackOverflow => write!(f, "Stack overflow."),
        }
    }
}

/// A runtime error bound to the source line of the faulting instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub line: u32,
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind, line: u32) -> Self {
        Self { kind, line }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[line {}] {}", self.line, self.kind)
    }
}

impl std::error::Error for RuntimeError {}

/// Result type for VM execution.
pub type Result<T> = std::result::Result<T, RuntimeError>;

// ============================================================================
// Tests
// ============================================================================
