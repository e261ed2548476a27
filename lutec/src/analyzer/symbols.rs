//!
//! Symbol Table - Flat Scoped Bindings
//!
//! One global, append-only table for the whole program. Keys are
//! `"<name>_<scope>"` where scope is `"main"` or a function name; there is
//! no nesting and no shadowing. The bare key `"main"` is a pseudo-entry
//! marking that the main block has been seen.
//!
//! Backed by an IndexMap so dumps and iteration follow declaration order.
//!

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SymbolKind {
    Variable,
    Function,
}

/// The closed set of source types. `host()` maps them onto the Kotlin
/// types the generator emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SourceType {
    Num,
    Str,
    Bool,
    Any,
}

impl SourceType {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "num" => Some(SourceType::Num),
            "str" => Some(SourceType::Str),
            "bool" => Some(SourceType::Bool),
            "any" => Some(SourceType::Any),
            _ => None,
        }
    }

    pub fn host(self) -> &'static str {
        match self {
            SourceType::Num => "Double",
            SourceType::Str => "String",
            SourceType::Bool => "Boolean",
            SourceType::Any => "Any",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SourceType::Num => "num",
            SourceType::Str => "str",
            SourceType::Bool => "bool",
            SourceType::Any => "any",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub declared_type: SourceType,
}

#[derive(Debug, Default, Serialize)]
pub struct SymbolTable {
    symbols: IndexMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(name: &str, scope: &str) -> String {
        format!("{name}_{scope}")
    }

    pub fn insert(&mut self, key: String, symbol: Symbol) {
        self.symbols.insert(key, symbol);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.symbols.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Symbol> {
        self.symbols.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Symbol)> {
        self.symbols.iter()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
