use crate::types::TypeNode;
use nohash_hasher::IsEnabled;
use serde::Serialize;
use std::collections::HashMap;
use std::rc::Rc;

/// Stable identity of an interned type. Structurally equal nodes always get
/// the same token, which is what makes the layout cache terminate on graphs
/// that reference themselves through pointers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeToken(u32);

impl TypeToken {
    pub fn index(self) -> u32 {
        self.0
    }
}

// Token hashes are a single u32 write, so the identity hasher applies.
impl IsEnabled for TypeToken {}

pub struct TypeInterner {
    tokens: HashMap<Rc<TypeNode>, TypeToken>,
    types: Vec<Rc<TypeNode>>,
}

impl Default for TypeInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeInterner {
    pub fn new() -> TypeInterner {
        TypeInterner {
            tokens: HashMap::new(),
            types: Vec::new(),
        }
    }

    pub fn add(&mut self, node: TypeNode) -> TypeToken {
        if let Some(tok) = self.tokens.get(&node) {
            return *tok;
        }

        let tok = TypeToken(self.types.len() as u32);
        let node = Rc::new(node);

        self.types.push(node.clone());
        self.tokens.insert(node, tok);

        tok
    }

    pub fn find(&self, node: &TypeNode) -> Option<TypeToken> {
        self.tokens.get(node).copied()
    }

    pub fn get(&self, tok: TypeToken) -> &TypeNode {
        &self.types[tok.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
