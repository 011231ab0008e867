//! Drives one target's layout pass over a declaration stream.
//!
//! The resolver owns the packing state and the layout engine for a single
//! architecture, walks events in source order, and collects bindings and
//! diagnostics. Per-declaration failures are diagnostics, not fatal errors;
//! the rest of the stream is still resolved.

use crate::arch::{describe, ArchDescriptor, Architecture, Endianness};
use crate::error::{ErrorInfo, LayoutError, LayoutErrorKind};
use crate::graph::Event;
use crate::layout::{Layout, LayoutEngine};
use crate::pack_state::PackingState;
use crate::string_interner::Symbol;
use crate::type_interner::{TypeInterner, TypeToken};
use std::rc::Rc;

#[derive(Clone, Debug)]
pub struct Binding {
    pub name: Symbol,
    pub ty: TypeToken,
    pub layout: Rc<Layout>,
}

#[derive(Clone, Debug)]
pub struct Diagnostic {
    /// Name of the declaration that failed, when the failure is tied to one.
    pub name: Option<Symbol>,
    pub error: LayoutError,
}

pub struct Resolution {
    pub target: Architecture,
    pub endianness: Endianness,
    pub bindings: Vec<Binding>,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct Resolver<'a> {
    engine: LayoutEngine<'a>,
    pack: PackingState,
    bindings: Vec<Binding>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Resolver<'a> {
    pub fn new(arch: &'a ArchDescriptor, types: &'a TypeInterner) -> Resolver<'a> {
        Resolver {
            engine: LayoutEngine::new(arch, types),
            pack: PackingState::new(),
            bindings: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn for_target(target: Architecture, types: &'a TypeInterner) -> Resolver<'a> {
        Resolver::new(describe(target), types)
    }

    pub fn run(mut self, events: &[Event]) -> Resolution {
        for event in events {
            match *event {
                Event::PackPush { cap, pos } => {
                    self.pack.push(cap, Some(pos));
                }
                Event::PackPop { pos } => {
                    if let Err(error) = self.pack.pop(Some(pos)) {
                        self.diagnostics.push(Diagnostic { name: None, error });
                        // Recover by laying out the rest unpacked.
                        self.pack.reset();
                    }
                }
                Event::Declare { name, ty, pos } => {
                    self.engine.declare(ty, self.pack.effective_cap());

                    match self.engine.layout(ty, &self.pack) {
                        Ok(layout) => self.bindings.push(Binding { name, ty, layout }),
                        Err(mut error) => {
                            if error.pos.is_none() {
                                error.pos = Some(pos);
                            }
                            self.diagnostics.push(Diagnostic {
                                name: Some(name),
                                error,
                            });
                        }
                    }
                }
            }
        }

        if !self.pack.is_balanced() {
            let mut error = LayoutError::new(LayoutErrorKind::UnbalancedPackingDirective)
                .with(ErrorInfo::Text("pack region left open at end of stream"));
            if let Some(pos) = self.pack.dangling_push() {
                error = error.at(pos);
            }
            self.diagnostics.push(Diagnostic { name: None, error });
        }

        Resolution {
            target: self.engine.arch().target,
            endianness: self.engine.endianness(),
            bindings: self.bindings,
            diagnostics: self.diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::Architecture;
    use crate::graph::{GraphBuilder, HeaderGraph, RawField, RawItem, RawType};
    use crate::string_interner::StringInterner;
    use crate::types::ScalarKind;

    fn pair_struct(tag: &str) -> RawType {
        RawType::Struct {
            tag: Some(tag.to_string()),
            fields: vec![
                RawField {
                    name: Some("a".to_string()),
                    ty: RawType::Scalar(ScalarKind::Char),
                    bits: None,
                },
                RawField {
                    name: Some("b".to_string()),
                    ty: RawType::Scalar(ScalarKind::Int),
                    bits: None,
                },
            ],
        }
    }

    #[test]
    fn unbalanced_pop_is_reported_and_layout_continues_unpacked() {
        let mut symbols = StringInterner::new();
        let mut types = TypeInterner::new();
        let mut builder = GraphBuilder::new(&mut symbols, &mut types);

        let graph = HeaderGraph {
            items: vec![
                RawItem::PackPop,
                RawItem::Declare {
                    name: "after".to_string(),
                    ty: pair_struct("after"),
                },
            ],
        };
        let events = builder.lower(&graph);

        let resolution = Resolver::for_target(Architecture::X86_64, &types).run(&events);

        assert_eq!(resolution.diagnostics.len(), 1);
        assert_eq!(
            resolution.diagnostics[0].error.kind,
            LayoutErrorKind::UnbalancedPackingDirective
        );

        // The declaration after the bad pop still resolved, with natural
        // alignment.
        assert_eq!(resolution.bindings.len(), 1);
        assert_eq!(resolution.bindings[0].layout.size, 8);
        assert_eq!(resolution.bindings[0].layout.align, 4);
    }

    #[test]
    fn dangling_push_is_reported_at_end_of_stream() {
        let mut symbols = StringInterner::new();
        let mut types = TypeInterner::new();
        let mut builder = GraphBuilder::new(&mut symbols, &mut types);

        let graph = HeaderGraph {
            items: vec![
                RawItem::PackPush(Some(1)),
                RawItem::Declare {
                    name: "packed".to_string(),
                    ty: pair_struct("packed"),
                },
            ],
        };
        let events = builder.lower(&graph);

        let resolution = Resolver::for_target(Architecture::Arm64, &types).run(&events);

        // The packed declaration itself is fine.
        assert_eq!(resolution.bindings.len(), 1);
        assert_eq!(resolution.bindings[0].layout.size, 5);
        assert_eq!(resolution.bindings[0].layout.align, 1);

        assert_eq!(resolution.diagnostics.len(), 1);
        let diag = &resolution.diagnostics[0];
        assert_eq!(diag.error.kind, LayoutErrorKind::UnbalancedPackingDirective);
        assert!(diag.error.pos.is_some());
    }

    #[test]
    fn failed_declaration_does_not_stop_later_ones() {
        let mut symbols = StringInterner::new();
        let mut types = TypeInterner::new();
        let mut builder = GraphBuilder::new(&mut symbols, &mut types);

        let graph = HeaderGraph {
            items: vec![
                RawItem::Declare {
                    name: "bad".to_string(),
                    ty: RawType::Struct {
                        tag: Some("bad".to_string()),
                        fields: vec![RawField {
                            name: Some("handle".to_string()),
                            ty: RawType::Named("undeclared".to_string()),
                            bits: None,
                        }],
                    },
                },
                RawItem::Declare {
                    name: "good".to_string(),
                    ty: pair_struct("good"),
                },
            ],
        };
        let events = builder.lower(&graph);

        let resolution = Resolver::for_target(Architecture::Arm64, &types).run(&events);

        assert_eq!(resolution.diagnostics.len(), 1);
        assert_eq!(
            resolution.diagnostics[0].error.kind,
            LayoutErrorKind::IncompleteTypeAsValue
        );

        assert_eq!(resolution.bindings.len(), 1);
        let good = &resolution.bindings[0];
        assert_eq!(symbols.resolve(good.name), "good");
        assert_eq!(good.layout.size, 8);
    }
}
