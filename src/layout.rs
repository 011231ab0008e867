use crate::arch::{ArchDescriptor, Endianness};
use crate::cache::LayoutCache;
use crate::error::{ErrorInfo, LayoutError, LayoutErrorKind};
use crate::pack_state::PackingState;
use crate::string_interner::Symbol;
use crate::type_interner::{TypeInterner, TypeToken};
use crate::types::{Aggregate, ScalarKind, TypeNode};
use serde::Serialize;
use std::collections::HashMap;
use std::rc::Rc;

/// Bit position and width of a bit-field within its storage unit. The
/// offset is counted from the least significant bit on little-endian
/// targets and from the most significant bit on big-endian ones, so it is
/// always an explicit number, never implied by declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BitRange {
    pub offset: u32,
    pub width: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldLayout {
    pub name: Option<Symbol>,
    /// Byte offset from the start of the aggregate. For a bit-field this is
    /// the offset of its storage unit.
    pub offset: u64,
    pub bits: Option<BitRange>,
}

/// ABI layout of one type on one architecture. Immutable once computed.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Layout {
    pub size: u64,
    pub align: u64,
    pub fields: Vec<FieldLayout>,
}

impl Layout {
    fn scalar(size: u64, align: u64) -> Layout {
        Layout {
            size,
            align,
            fields: Vec::new(),
        }
    }
}

/// Align `offset` up to the next multiple of `align`. Caps do not have to
/// be powers of two, so this avoids bit masking.
fn align_up(offset: u64, align: u64) -> u64 {
    if align <= 1 {
        return offset;
    }
    match offset % align {
        0 => offset,
        rem => offset + (align - rem),
    }
}

fn clamp_align(natural: u64, cap: Option<u32>) -> u64 {
    match cap {
        Some(cap) => natural.min(cap as u64).max(1),
        None => natural,
    }
}

// Open bit-field storage unit during a struct walk.
struct StorageUnit {
    offset: u64,
    size: u64,
    bit_pos: u32,
}

/// Walks the type graph and produces ABI-correct layouts for one target.
///
/// The engine owns the session cache: every type is laid out at most once
/// per (identity, cap) and recursion through nested aggregates becomes
/// amortized linear work. Pointers never recurse into their pointee, which
/// is what lets self-referential graphs terminate.
pub struct LayoutEngine<'a> {
    arch: &'a ArchDescriptor,
    types: &'a TypeInterner,
    cache: LayoutCache,
    /// Cap recorded at each top-level aggregate declaration, in source
    /// order. Members of a declared aggregate use the aggregate's own cap;
    /// inline aggregates with no recorded cap inherit the enclosing one.
    declared_caps: HashMap<TypeToken, Option<u32>>,
    in_progress: Vec<TypeToken>,
}

impl<'a> LayoutEngine<'a> {
    pub fn new(arch: &'a ArchDescriptor, types: &'a TypeInterner) -> LayoutEngine<'a> {
        LayoutEngine {
            arch,
            types,
            cache: LayoutCache::new(),
            declared_caps: HashMap::new(),
            in_progress: Vec::new(),
        }
    }

    pub fn arch(&self) -> &ArchDescriptor {
        self.arch
    }

    pub fn endianness(&self) -> Endianness {
        self.arch.endianness
    }

    pub fn cache(&self) -> &LayoutCache {
        &self.cache
    }

    /// Record the packing cap in effect when this type's declaration
    /// closed. The first declaration wins; a later redeclaration of the
    /// same structural type does not move it into another pack region.
    pub fn declare(&mut self, ty: TypeToken, cap: Option<u32>) {
        self.declared_caps.entry(ty).or_insert(cap);
    }

    /// Lay out `ty` under the packing state captured at its declaration.
    pub fn layout(&mut self, ty: TypeToken, pack: &PackingState) -> Result<Rc<Layout>, LayoutError> {
        self.layout_with_cap(ty, pack.effective_cap())
    }

    pub fn layout_with_cap(
        &mut self,
        ty: TypeToken,
        cap: Option<u32>,
    ) -> Result<Rc<Layout>, LayoutError> {
        if let Some(layout) = self.cache.get(ty, cap) {
            return Ok(layout);
        }

        if self.in_progress.contains(&ty) {
            return Err(LayoutError::new(LayoutErrorKind::CyclicValueType)
                .with(ErrorInfo::Type(ty)));
        }

        self.in_progress.push(ty);
        let result = self.compute(ty, cap);
        self.in_progress.pop();

        let layout = Rc::new(result?);
        self.cache.insert(ty, cap, layout.clone());

        Ok(layout)
    }

    fn compute(&mut self, ty: TypeToken, cap: Option<u32>) -> Result<Layout, LayoutError> {
        let types = self.types;

        match types.get(ty) {
            TypeNode::Scalar(kind) => {
                let traits = self.arch.scalar(*kind);
                Ok(Layout::scalar(traits.size as u64, traits.align as u64))
            }
            TypeNode::Enum { underlying } => {
                let kind = underlying.unwrap_or(ScalarKind::Int);
                let traits = self.arch.scalar(kind);
                Ok(Layout::scalar(traits.size as u64, traits.align as u64))
            }
            TypeNode::Pointer(_) => {
                // Pointer layout never depends on the pointee.
                let traits = self.arch.pointer;
                Ok(Layout::scalar(traits.size as u64, traits.align as u64))
            }
            TypeNode::Alias { target, .. } => {
                let target_cap = self.member_cap(*target, cap);
                let inner = self.layout_with_cap(*target, target_cap)?;
                Ok((*inner).clone())
            }
            TypeNode::Array { elem, len } => {
                let len = match len {
                    Some(n) if *n > 0 => *n,
                    Some(_) => {
                        return Err(LayoutError::new(LayoutErrorKind::InvalidArrayLength)
                            .with(ErrorInfo::Width(0)))
                    }
                    None => {
                        return Err(LayoutError::new(LayoutErrorKind::InvalidArrayLength)
                            .with(ErrorInfo::Text(
                                "incomplete array is only valid as a trailing struct member",
                            )))
                    }
                };

                let elem_cap = self.member_cap(*elem, cap);
                let elem_layout = self.layout_with_cap(*elem, elem_cap)?;

                let size = elem_layout.size.checked_mul(len).ok_or_else(|| {
                    LayoutError::new(LayoutErrorKind::InvalidArrayLength)
                        .with(ErrorInfo::Width(len))
                })?;

                Ok(Layout::scalar(size, elem_layout.align))
            }
            TypeNode::Opaque { tag } => {
                Err(LayoutError::new(LayoutErrorKind::IncompleteTypeAsValue)
                    .with(ErrorInfo::Identifier(*tag)))
            }
            TypeNode::Struct(agg) => self.struct_layout(agg, cap),
            TypeNode::Union(agg) => self.union_layout(agg, cap),
        }
    }

    fn member_cap(&self, ty: TypeToken, inherited: Option<u32>) -> Option<u32> {
        match self.declared_caps.get(&ty) {
            Some(declared) => *declared,
            None => inherited,
        }
    }

    /// Integer kind backing a bit-field, following typedef chains.
    fn bitfield_storage_kind(&self, ty: TypeToken) -> Option<ScalarKind> {
        let mut node = self.types.get(ty);
        loop {
            match node {
                TypeNode::Alias { target, .. } => node = self.types.get(*target),
                TypeNode::Scalar(kind) if kind.is_integer() => return Some(*kind),
                TypeNode::Enum { underlying } => {
                    return Some(underlying.unwrap_or(ScalarKind::Int))
                }
                _ => return None,
            }
        }
    }

    fn bitfield_error(kind: LayoutErrorKind, name: Option<Symbol>, width: u32) -> LayoutError {
        let mut err = LayoutError::new(kind).with(ErrorInfo::Width(width as u64));
        if let Some(name) = name {
            err = err.with(ErrorInfo::Identifier(name));
        }
        err
    }

    /// Sequential allocation: walk fields in declaration order, clamp each
    /// natural alignment to the active cap, pad, and pack adjacent
    /// bit-fields into shared storage units.
    fn struct_layout(&mut self, agg: &Aggregate, cap: Option<u32>) -> Result<Layout, LayoutError> {
        let types = self.types;

        let mut offset: u64 = 0;
        let mut max_align: u64 = 1;
        let mut fields = Vec::with_capacity(agg.fields.len());
        let mut unit: Option<StorageUnit> = None;

        let last = agg.fields.len().saturating_sub(1);

        for (i, field) in agg.fields.iter().enumerate() {
            if let Some(width) = field.bit_width {
                let kind = self.bitfield_storage_kind(field.ty).ok_or_else(|| {
                    Self::bitfield_error(LayoutErrorKind::BitFieldTooWide, field.name, width)
                        .with(ErrorInfo::Text("storage type is not an integer"))
                })?;

                let traits = self.arch.scalar(kind);
                let unit_bits = traits.size * 8;

                if width > unit_bits {
                    return Err(Self::bitfield_error(
                        LayoutErrorKind::BitFieldTooWide,
                        field.name,
                        width,
                    ));
                }

                let align = clamp_align(traits.align as u64, cap);

                if width == 0 {
                    // Zero width closes the current unit without opening a
                    // new one; the next member starts on a fresh boundary
                    // for this storage type.
                    if let Some(u) = unit.take() {
                        offset = u.offset + u.size;
                    }
                    offset = align_up(offset, align);
                    continue;
                }

                let needs_new_unit = match &unit {
                    None => true,
                    Some(u) => {
                        u.bit_pos + width > unit_bits || u.size != traits.size as u64
                    }
                };

                if needs_new_unit {
                    if let Some(u) = unit.take() {
                        offset = u.offset + u.size;
                    }
                    offset = align_up(offset, align);
                    unit = Some(StorageUnit {
                        offset,
                        size: traits.size as u64,
                        bit_pos: 0,
                    });
                }

                let u = unit.as_mut().expect("a storage unit is open");

                let bit_offset = match self.arch.endianness {
                    Endianness::Little => u.bit_pos,
                    Endianness::Big => unit_bits - u.bit_pos - width,
                };

                fields.push(FieldLayout {
                    name: field.name,
                    offset: u.offset,
                    bits: Some(BitRange {
                        offset: bit_offset,
                        width,
                    }),
                });

                u.bit_pos += width;
                max_align = max_align.max(align);
                continue;
            }

            // Plain member: any open bit-field unit ends here.
            if let Some(u) = unit.take() {
                offset = u.offset + u.size;
            }

            if let TypeNode::Array { elem, len: None } = types.get(field.ty) {
                // Flexible trailing member: aligned, zero size contribution.
                if i != last {
                    return Err(LayoutError::new(LayoutErrorKind::InvalidArrayLength).with(
                        ErrorInfo::Text("incomplete array is only valid as the trailing member"),
                    ));
                }

                let elem_cap = self.member_cap(*elem, cap);
                let elem_layout = self.layout_with_cap(*elem, elem_cap)?;
                let align = clamp_align(elem_layout.align, cap);

                max_align = max_align.max(align);
                offset = align_up(offset, align);

                fields.push(FieldLayout {
                    name: field.name,
                    offset,
                    bits: None,
                });
                continue;
            }

            let member_cap = self.member_cap(field.ty, cap);
            let member = self.layout_with_cap(field.ty, member_cap)?;
            let align = clamp_align(member.align, cap);

            max_align = max_align.max(align);
            offset = align_up(offset, align);

            fields.push(FieldLayout {
                name: field.name,
                offset,
                bits: None,
            });

            offset += member.size;
        }

        if let Some(u) = unit.take() {
            offset = u.offset + u.size;
        }

        let mut size = align_up(offset, max_align);
        if size == 0 {
            // An empty struct still occupies one addressable unit.
            size = 1;
        }

        Ok(Layout {
            size,
            align: max_align,
            fields,
        })
    }

    /// Unions: every variant at offset 0, size is the widest variant
    /// rounded up to the union alignment.
    fn union_layout(&mut self, agg: &Aggregate, cap: Option<u32>) -> Result<Layout, LayoutError> {
        let types = self.types;

        let mut widest: u64 = 0;
        let mut max_align: u64 = 1;
        let mut fields = Vec::with_capacity(agg.fields.len());

        for field in &agg.fields {
            if let Some(width) = field.bit_width {
                let kind = self.bitfield_storage_kind(field.ty).ok_or_else(|| {
                    Self::bitfield_error(LayoutErrorKind::BitFieldTooWide, field.name, width)
                        .with(ErrorInfo::Text("storage type is not an integer"))
                })?;

                let traits = self.arch.scalar(kind);
                let unit_bits = traits.size * 8;

                if width > unit_bits {
                    return Err(Self::bitfield_error(
                        LayoutErrorKind::BitFieldTooWide,
                        field.name,
                        width,
                    ));
                }

                if width == 0 {
                    // Meaningless in a union; allocates nothing.
                    continue;
                }

                let align = clamp_align(traits.align as u64, cap);
                max_align = max_align.max(align);
                widest = widest.max(traits.size as u64);

                let bit_offset = match self.arch.endianness {
                    Endianness::Little => 0,
                    Endianness::Big => unit_bits - width,
                };

                fields.push(FieldLayout {
                    name: field.name,
                    offset: 0,
                    bits: Some(BitRange {
                        offset: bit_offset,
                        width,
                    }),
                });
                continue;
            }

            if let TypeNode::Array { len: None, .. } = types.get(field.ty) {
                return Err(LayoutError::new(LayoutErrorKind::InvalidArrayLength)
                    .with(ErrorInfo::Text("incomplete array is not valid in a union")));
            }

            let member_cap = self.member_cap(field.ty, cap);
            let member = self.layout_with_cap(field.ty, member_cap)?;
            let align = clamp_align(member.align, cap);

            max_align = max_align.max(align);
            widest = widest.max(member.size);

            fields.push(FieldLayout {
                name: field.name,
                offset: 0,
                bits: None,
            });
        }

        let mut size = align_up(widest, max_align);
        if size == 0 {
            size = 1;
        }

        Ok(Layout {
            size,
            align: max_align,
            fields,
        })
    }
}
