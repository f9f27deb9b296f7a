// loxy-vm - Single-pass bytecode compiler and stack VM for the Loxy scripting language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Modules: the unit of compilation and top-level name resolution.
//!
//! A module owns its source text, the chunk it compiles to, and the table of
//! top-level bindings. The chunk is behind an `Rc` so the VM can keep
//! executing it while the module's globals are updated; chunks are never
//! mutated after compilation.

use std::collections::HashMap;
use std::rc::Rc;

use crate::chunk::Chunk;
use crate::compiler;
use crate::heap::{Gc, Heap, Trace};
use crate::strings::Strings;
use crate::value::{LoxString, Value};

/// A loaded module.
pub struct Module {
    name: Gc<LoxString>,
    /// Where the module was loaded from, when it came from a file.
    path: Option<Gc<LoxString>>,
    source: String,
    /// The compiled body. Empty until [`Module::compile`] succeeds.
    bytecode: Rc<Chunk>,
    /// Top-level bindings, keyed by interned name.
    globals: HashMap<Gc<LoxString>, Value>,
    imports: Vec<Gc<Module>>,
}

impl Module {
    /// Create a module with no bytecode yet.
    pub fn new(name: Gc<LoxString>, path: Option<Gc<LoxString>>, source: String) -> Self {
        Self {
            name,
            path,
            source,
            bytecode: Rc::new(Chunk::new()),
            globals: HashMap::new(),
            imports: Vec::new(),
        }
    }

    /// The module's name as source text.
    pub fn name(&self) -> &str {
        // SAFETY: the name is rooted by this module for its whole life.
        unsafe { self.name.as_ref() }.as_str()
    }

    pub fn name_string(&self) -> Gc<LoxString> {
        self.name
    }

    pub fn path(&self) -> Option<Gc<LoxString>> {
        self.path
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Replace the source text (the REPL reuses one module per session).
    pub fn set_source(&mut self, source: String) {
        self.source = source;
    }

    /// Compile the current source into a fresh chunk.
    ///
    /// On success the chunk replaces the module's bytecode and `true` is
    /// returned. On failure the old bytecode is left in place and the
    /// compiler has already reported its errors.
    pub fn compile(&mut self, heap: &mut Heap, strings: &mut Strings) -> bool {
        match compiler::compile(&self.source, heap, strings) {
            Some(chunk) => {
                self.bytecode = Rc::new(chunk);
                true
            }
            None => false,
        }
    }

    /// The compiled body.
    pub fn bytecode(&self) -> Rc<Chunk> {
        Rc::clone(&self.bytecode)
    }

    /// Bind `name` to `value`, replacing any existing binding. Top-level
    /// definitions may be repeated; the last one wins.
    pub fn add_variable(&mut self, name: Gc<LoxString>, value: Value) {
        self.globals.insert(name, value);
    }

    /// Read a top-level binding.
    pub fn get_variable(&self, name: Gc<LoxString>) -> Option<Value> {
        self.globals.get(&name).copied()
    }

    /// Assign to an existing binding. Returns `false` when `name` was never
    /// defined; the VM turns that into an undefined-variable error, which
    /// is what distinguishes assignment from definition.
    pub fn set_variable(&mut self, name: Gc<LoxString>, value: Value) -> bool {
        match self.globals.get_mut(&name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Record a dependency on another module.
    pub fn add_import(&mut self, module: Gc<Module>) {
        self.imports.push(module);
    }

    pub fn imports(&self) -> &[Gc<Module>] {
        &self.imports
    }

    /// Number of top-level bindings.
    pub fn globals_len(&self) -> usize {
        self.globals.len()
    }
}

impl Trace for Module {
    fn trace(&self, heap: &mut Heap) {
        heap.mark(self.name);
        if let Some(path) = self.path {
            heap.mark(path);
        }
        self.bytecode.mark_constants(heap);
        for (&name, value) in &self.globals {
            heap.mark(name);
            value.mark(heap);
        }
        for &import in &self.imports {
            heap.mark(import);
        }
    }

    fn heap_size(&self) -> usize {
        self.source.len() + self.globals.len() * std::mem::size_of::<(Gc<LoxString>, Value)>()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_module(heap: &mut Heap, strings: &mut Strings) -> Module {
        let name = strings.intern(heap, "main");
        Module::new(name, None, String::new())
    }

    #[test]
    fn test_define_then_get() {
        let mut heap = Heap::new();
        let mut strings = Strings::new();
        let mut module = test_module(&mut heap, &mut strings);

        let x = strings.intern(&mut heap, "x");
        module.add_variable(x, Value::Number(1.0));
        assert_eq!(module.get_variable(x), Some(Value::Number(1.0)));
    }

    #[test]
    fn test_redefinition_wins() {
        let mut heap = Heap::new();
        let mut strings = Strings::new();
        let mut module = test_module(&mut heap, &mut strings);

        let x = strings.intern(&mut heap, "x");
        module.add_variable(x, Value::Number(1.0));
        module.add_variable(x, Value::Bool(true));
        assert_eq!(module.get_variable(x), Some(Value::Bool(true)));
        assert_eq!(module.globals_len(), 1);
    }

    #[test]
    fn test_set_requires_prior_definition() {
        let mut heap = Heap::new();
        let mut strings = Strings::new();
        let mut module = test_module(&mut heap, &mut strings);

        let x = strings.intern(&mut heap, "x");
        assert!(!module.set_variable(x, Value::Number(2.0)));

        module.add_variable(x, Value::Number(1.0));
        assert!(module.set_variable(x, Value::Number(2.0)));
        assert_eq!(module.get_variable(x), Some(Value::Number(2.0)));
    }

    #[test]
    fn test_imports_are_recorded() {
        let mut heap = Heap::new();
        let mut strings = Strings::new();
        let mut module = test_module(&mut heap, &mut strings);

        let dep_name = strings.intern(&mut heap, "dep");
        let dep = heap.alloc(Module::new(dep_name, None, String::new()));
        module.add_import(dep);
        assert_eq!(module.imports(), &[dep]);
    }
}
