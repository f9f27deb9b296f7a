// loxy-vm - Single-pass bytecode compiler and stack VM for the Loxy scripting language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Chunk disassembler.
//!
//! Renders bytecode in a fixed-width listing: byte offset, source line
//! (`|` for a run of instructions from the same line), mnemonic, and
//! operands. The VM logs listings at debug level; tests use them to pin
//! down emitted code shapes.

use std::fmt::Write;

use crate::chunk::Chunk;
use crate::opcode::OpCode;

/// Disassemble a whole chunk under a heading.
pub fn disassemble_chunk(chunk: &Chunk, name: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==", name);

    let mut offset = 0;
    while offset < chunk.len() {
        let (line, next) = disassemble_instruction(chunk, offset);
        let _ = writeln!(out, "{}", line);
        offset = next;
    }
    out
}

/// Disassemble the instruction at `offset`; returns the rendered line and
/// the offset of the next instruction.
pub fn disassemble_instruction(chunk: &Chunk, offset: usize) -> (String, usize) {
    let mut out = String::new();
    let _ = write!(out, "{:04} ", offset);

    if offset > 0 && chunk.line(offset) == chunk.line(offset - 1) {
        let _ = write!(out, "   | ");
    } else {
        let _ = write!(out, "{:4} ", chunk.line(offset));
    }

    let byte = chunk.read(offset);
    let Some(op) = OpCode::from_byte(byte) else {
        let _ = write!(out, "unknown opcode {}", byte);
        return (out, offset + 1);
    };

    let next = match op {
        OpCode::Constant | OpCode::GetGlobal | OpCode::SetGlobal | OpCode::DefineGlobal => {
            let index = chunk.read(offset + 1);
            let _ = write!(
                out,
                "{:<16} {:4} '{}'",
                op.name(),
                index,
                chunk.constant(index)
            );
            offset + 2
        }
        OpCode::GetLocal | OpCode::SetLocal => {
            let slot = chunk.read(offset + 1);
            let _ = write!(out, "{:<16} {:4}", op.name(), slot);
            offset + 2
        }
        OpCode::Jump | OpCode::JumpIfFalse => {
            let jump = read_u16(chunk, offset + 1) as usize;
            let _ = write!(
                out,
                "{:<16} {:4} -> {}",
                op.name(),
                offset,
                offset + 3 + jump
            );
            offset + 3
        }
        OpCode::Loop => {
            let jump = read_u16(chunk, offset + 1) as usize;
            let _ = write!(
                out,
                "{:<16} {:4} -> {}",
                op.name(),
                offset,
                offset + 3 - jump
            );
            offset + 3
        }
        _ => {
            let _ = write!(out, "{}", op.name());
            offset + 1
        }
    };

    (out, next)
}

fn read_u16(chunk: &Chunk, offset: usize) -> u16 {
    (chunk.read(offset) as u16) << 8 | chunk.read(offset + 1) as u16
}

// ============================================================================
// Tests
// ============================================================================
