//! Boundary with the upstream parser.
//!
//! The parser hands over a finished declaration stream: type shapes, typedef
//! names, and packing directives already recognized as structured events
//! (never raw pragma text). The RON form below is that handoff format; the
//! `GraphBuilder` interns it into tokens the layout engine works on.

use crate::source_location::SourcePos;
use crate::string_interner::{StringInterner, Symbol};
use crate::type_interner::{TypeInterner, TypeToken};
use crate::types::{Aggregate, Field, ScalarKind, TypeNode};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Clone, Debug, Deserialize)]
pub enum RawType {
    Scalar(ScalarKind),
    Pointer(Box<RawType>),
    Array(Box<RawType>, u64),
    /// Incomplete array, only valid as a flexible trailing member.
    FlexArray(Box<RawType>),
    Struct {
        tag: Option<String>,
        fields: Vec<RawField>,
    },
    Union {
        tag: Option<String>,
        fields: Vec<RawField>,
    },
    Enum {
        underlying: Option<ScalarKind>,
    },
    /// Reference to a name declared earlier in the stream. An unknown name
    /// is an incomplete type, exactly like referencing an undefined tag in C.
    Named(String),
    Opaque(String),
}

#[derive(Clone, Debug, Deserialize)]
pub struct RawField {
    pub name: Option<String>,
    pub ty: RawType,
    #[serde(default)]
    pub bits: Option<u32>,
}

#[derive(Clone, Debug, Deserialize)]
pub enum RawItem {
    /// Pack-on directive. `None` means an explicit return to natural
    /// alignment inside an outer region; a cap of 0 is normalized to that.
    PackPush(Option<u32>),
    PackPop,
    Typedef { name: String, ty: RawType },
    Declare { name: String, ty: RawType },
}

#[derive(Clone, Debug, Deserialize)]
pub struct HeaderGraph {
    pub items: Vec<RawItem>,
}

/// Interned form of the stream, consumed by the resolver in source order.
#[derive(Clone, Copy, Debug)]
pub enum Event {
    PackPush { cap: Option<u32>, pos: SourcePos },
    PackPop { pos: SourcePos },
    Declare { name: Symbol, ty: TypeToken, pos: SourcePos },
}

pub struct GraphBuilder<'a> {
    symbols: &'a mut StringInterner,
    types: &'a mut TypeInterner,
    names: HashMap<String, TypeToken>,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(symbols: &'a mut StringInterner, types: &'a mut TypeInterner) -> GraphBuilder<'a> {
        GraphBuilder {
            symbols,
            types,
            names: HashMap::new(),
        }
    }

    /// Lower the raw stream into events. Positions are the one-based item
    /// ordinals of the stream; the upstream parser already folded real
    /// header line numbers into the item order.
    pub fn lower(&mut self, graph: &HeaderGraph) -> Vec<Event> {
        let mut events = Vec::with_capacity(graph.items.len());

        for (i, item) in graph.items.iter().enumerate() {
            let pos = SourcePos::new(i as u32 + 1, 1);

            match item {
                RawItem::PackPush(cap) => {
                    let cap = (*cap).filter(|c| *c > 0);
                    events.push(Event::PackPush { cap, pos });
                }
                RawItem::PackPop => events.push(Event::PackPop { pos }),
                RawItem::Typedef { name, ty } => {
                    let target = self.lower_type(ty);
                    let sym = self.symbols.intern(name);
                    let alias = self.types.add(TypeNode::Alias { name: sym, target });

                    self.names.insert(name.clone(), alias);
                    events.push(Event::Declare {
                        name: sym,
                        ty: alias,
                        pos,
                    });
                }
                RawItem::Declare { name, ty } => {
                    let tok = self.lower_type(ty);
                    let sym = self.symbols.intern(name);

                    self.names.insert(name.clone(), tok);
                    events.push(Event::Declare {
                        name: sym,
                        ty: tok,
                        pos,
                    });
                }
            }
        }

        events
    }

    fn lower_type(&mut self, raw: &RawType) -> TypeToken {
        match raw {
            RawType::Scalar(kind) => self.types.add(TypeNode::Scalar(*kind)),
            RawType::Pointer(inner) => {
                let inner = self.lower_type(inner);
                self.types.add(TypeNode::Pointer(inner))
            }
            RawType::Array(elem, len) => {
                let elem = self.lower_type(elem);
                self.types.add(TypeNode::Array {
                    elem,
                    len: Some(*len),
                })
            }
            RawType::FlexArray(elem) => {
                let elem = self.lower_type(elem);
                self.types.add(TypeNode::Array { elem, len: None })
            }
            RawType::Struct { tag, fields } => {
                let agg = self.lower_aggregate(tag.as_deref(), fields);
                let tok = self.types.add(TypeNode::Struct(agg));
                self.register_tag(tag.as_deref(), tok);
                tok
            }
            RawType::Union { tag, fields } => {
                let agg = self.lower_aggregate(tag.as_deref(), fields);
                let tok = self.types.add(TypeNode::Union(agg));
                self.register_tag(tag.as_deref(), tok);
                tok
            }
            RawType::Enum { underlying } => self.types.add(TypeNode::Enum {
                underlying: *underlying,
            }),
            RawType::Named(name) => match self.names.get(name) {
                Some(tok) => *tok,
                None => {
                    let tag = self.symbols.intern(name);
                    self.types.add(TypeNode::Opaque { tag })
                }
            },
            RawType::Opaque(name) => {
                let tag = self.symbols.intern(name);
                self.types.add(TypeNode::Opaque { tag })
            }
        }
    }

    fn lower_aggregate(&mut self, tag: Option<&str>, fields: &[RawField]) -> Aggregate {
        let tag = tag.map(|t| self.symbols.intern(t));
        let fields = fields
            .iter()
            .map(|f| Field {
                name: f.name.as_deref().map(|n| self.symbols.intern(n)),
                ty: self.lower_type(&f.ty),
                bit_width: f.bits,
            })
            .collect();

        Aggregate { tag, fields }
    }

    fn register_tag(&mut self, tag: Option<&str>, tok: TypeToken) {
        if let Some(tag) = tag {
            // A full definition replaces any earlier opaque placeholder.
            self.names.insert(tag.to_string(), tok);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeNode;

    #[test]
    fn named_reference_resolves_to_the_declared_type() {
        let mut symbols = StringInterner::new();
        let mut types = TypeInterner::new();
        let mut builder = GraphBuilder::new(&mut symbols, &mut types);

        let graph = HeaderGraph {
            items: vec![
                RawItem::Declare {
                    name: "timespec".to_string(),
                    ty: RawType::Struct {
                        tag: Some("timespec".to_string()),
                        fields: vec![
                            RawField {
                                name: Some("tv_sec".to_string()),
                                ty: RawType::Scalar(ScalarKind::Long),
                                bits: None,
                            },
                            RawField {
                                name: Some("tv_nsec".to_string()),
                                ty: RawType::Scalar(ScalarKind::Long),
                                bits: None,
                            },
                        ],
                    },
                },
                RawItem::Typedef {
                    name: "timespec_t".to_string(),
                    ty: RawType::Named("timespec".to_string()),
                },
            ],
        };

        let events = builder.lower(&graph);
        assert_eq!(events.len(), 2);

        let (decl, alias) = match (&events[0], &events[1]) {
            (Event::Declare { ty: a, .. }, Event::Declare { ty: b, .. }) => (*a, *b),
            _ => panic!("expected two declarations"),
        };

        match types.get(alias) {
            TypeNode::Alias { target, .. } => assert_eq!(*target, decl),
            other => panic!("expected an alias, got {:?}", other),
        }
    }

    #[test]
    fn unknown_name_becomes_an_opaque_tag() {
        let mut symbols = StringInterner::new();
        let mut types = TypeInterner::new();
        let mut builder = GraphBuilder::new(&mut symbols, &mut types);

        let graph = HeaderGraph {
            items: vec![RawItem::Typedef {
                name: "task_t".to_string(),
                ty: RawType::Pointer(Box::new(RawType::Named("task".to_string()))),
            }],
        };

        let events = builder.lower(&graph);
        let alias = match &events[0] {
            Event::Declare { ty, .. } => *ty,
            _ => panic!("expected a declaration"),
        };

        let pointee = match types.get(alias) {
            TypeNode::Alias { target, .. } => match types.get(*target) {
                TypeNode::Pointer(p) => *p,
                other => panic!("expected a pointer, got {:?}", other),
            },
            other => panic!("expected an alias, got {:?}", other),
        };

        assert!(matches!(types.get(pointee), TypeNode::Opaque { .. }));
    }
}
