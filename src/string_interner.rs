use serde::Serialize;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(PartialEq, Debug, Clone, Copy, Hash, Eq, PartialOrd, Ord, Serialize)]
pub struct Symbol(u32);

/// Interner for field names, struct tags, and declaration names.
/// Headers repeat the same handful of identifiers thousands of times, so
/// everything downstream carries a `Symbol` instead of a `String`.
pub struct StringInterner {
    symbols: HashMap<Rc<str>, Symbol>,
    strings: Vec<Rc<str>>,
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl StringInterner {
    pub fn new() -> StringInterner {
        StringInterner {
            symbols: HashMap::new(),
            strings: Vec::new(),
        }
    }

    pub fn intern(&mut self, name: &str) -> Symbol {
        if let Some(sym) = self.symbols.get(name) {
            return *sym;
        }

        let sym = Symbol(self.strings.len() as u32);
        let s: Rc<str> = Rc::from(name);

        self.strings.push(s.clone());
        self.symbols.insert(s, sym);

        sym
    }

    pub fn find(&self, name: &str) -> Option<Symbol> {
        self.symbols.get(name).copied()
    }

    pub fn resolve(&self, symbol: Symbol) -> &str {
        &self.strings[symbol.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}
