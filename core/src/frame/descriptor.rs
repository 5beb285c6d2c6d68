//! Slot layout shared by every activation of one routine.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::assumption::{Assumption, CyclicAssumption};
use crate::error::{RuntimeError, RuntimeResult};
use crate::val::Val;

/// Storage kind of a frame slot. `Illegal` marks a slot whose kind is not known yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FrameSlotKind {
    Object = 0,
    Long = 1,
    Int = 2,
    Double = 3,
    Float = 4,
    Boolean = 5,
    Byte = 6,
    Illegal = 7,
}

impl FrameSlotKind {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => FrameSlotKind::Object,
            1 => FrameSlotKind::Long,
            2 => FrameSlotKind::Int,
            3 => FrameSlotKind::Double,
            4 => FrameSlotKind::Float,
            5 => FrameSlotKind::Boolean,
            6 => FrameSlotKind::Byte,
            _ => FrameSlotKind::Illegal,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FrameSlotKind::Object => "Object",
            FrameSlotKind::Long => "Long",
            FrameSlotKind::Int => "Int",
            FrameSlotKind::Double => "Double",
            FrameSlotKind::Float => "Float",
            FrameSlotKind::Boolean => "Boolean",
            FrameSlotKind::Byte => "Byte",
            FrameSlotKind::Illegal => "Illegal",
        }
    }

    #[inline]
    pub fn is_primitive(self) -> bool {
        !matches!(self, FrameSlotKind::Object | FrameSlotKind::Illegal)
    }
}

impl fmt::Display for FrameSlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Opaque key naming a slot. Source-level locals use names, runtime temporaries
/// use synthetic ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SlotIdentifier {
    Named(Arc<str>),
    Synthetic(u64),
}

impl fmt::Display for SlotIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotIdentifier::Named(name) => f.write_str(name),
            SlotIdentifier::Synthetic(id) => write!(f, "${id}"),
        }
    }
}

impl From<&str> for SlotIdentifier {
    fn from(name: &str) -> Self {
        SlotIdentifier::Named(Arc::from(name))
    }
}

impl From<String> for SlotIdentifier {
    fn from(name: String) -> Self {
        SlotIdentifier::Named(Arc::from(name))
    }
}

impl From<Arc<str>> for SlotIdentifier {
    fn from(name: Arc<str>) -> Self {
        SlotIdentifier::Named(name)
    }
}

impl From<u64> for SlotIdentifier {
    fn from(id: u64) -> Self {
        SlotIdentifier::Synthetic(id)
    }
}

impl From<&SlotIdentifier> for SlotIdentifier {
    fn from(id: &SlotIdentifier) -> Self {
        id.clone()
    }
}

struct SlotState {
    index: usize,
    identifier: SlotIdentifier,
    kind: AtomicU8,
    descriptor_id: u64,
}

/// Handle to one slot of a [`FrameDescriptor`]. Cheap to clone; equality is identity.
#[derive(Clone)]
pub struct FrameSlot {
    state: Arc<SlotState>,
}

impl FrameSlot {
    #[inline]
    pub fn index(&self) -> usize {
        self.state.index
    }

    #[inline]
    pub fn identifier(&self) -> &SlotIdentifier {
        &self.state.identifier
    }

    /// Declared kind. Use [`FrameDescriptor::set_slot_kind`] to change it.
    #[inline]
    pub fn kind(&self) -> FrameSlotKind {
        FrameSlotKind::from_u8(self.state.kind.load(Ordering::Acquire))
    }

    #[inline]
    pub(crate) fn descriptor_id(&self) -> u64 {
        self.state.descriptor_id
    }
}

impl PartialEq for FrameSlot {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl Eq for FrameSlot {}

impl fmt::Debug for FrameSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameSlot")
            .field("index", &self.index())
            .field("identifier", self.identifier())
            .field("kind", &self.kind())
            .finish()
    }
}

#[derive(Default)]
struct Layout {
    slots: Vec<FrameSlot>,
    by_identifier: FxHashMap<SlotIdentifier, usize>,
}

static NEXT_DESCRIPTOR_ID: AtomicU64 = AtomicU64::new(1);

/// Named storage layout of a routine's frames.
///
/// Slots are only ever appended. Adding a slot or changing a declared kind
/// invalidates the current [`version`](FrameDescriptor::version) assumption, so
/// code specialized on the layout notices. Additions may race with running
/// activations; those frames grow their storage lazily on the next write.
pub struct FrameDescriptor {
    id: u64,
    default_value: Val,
    layout: RwLock<Layout>,
    version: CyclicAssumption,
}

impl FrameDescriptor {
    pub fn new() -> Self {
        Self::with_default_value(Val::Nil)
    }

    /// Descriptor whose never-written slots read as `default_value`.
    pub fn with_default_value(default_value: Val) -> Self {
        Self {
            id: NEXT_DESCRIPTOR_ID.fetch_add(1, Ordering::Relaxed),
            default_value,
            layout: RwLock::new(Layout::default()),
            version: CyclicAssumption::new("frame descriptor version"),
        }
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub fn default_value(&self) -> &Val {
        &self.default_value
    }

    /// Appends a new slot; fails if `identifier` is already present.
    pub fn add_slot(&self, identifier: impl Into<SlotIdentifier>, kind: FrameSlotKind) -> RuntimeResult<FrameSlot> {
        let identifier = identifier.into();
        let slot = {
            let mut layout = self.layout.write();
            if layout.by_identifier.contains_key(&identifier) {
                return Err(RuntimeError::invalid_argument(format!(
                    "duplicate frame slot '{identifier}'"
                )));
            }
            self.append(&mut layout, identifier, kind)
        };
        self.version.invalidate_with_reason("slot added");
        Ok(slot)
    }

    pub fn find_or_add(&self, identifier: impl Into<SlotIdentifier>, kind: FrameSlotKind) -> FrameSlot {
        let identifier = identifier.into();
        if let Some(slot) = self.lookup(&identifier) {
            return slot;
        }
        let slot = {
            let mut layout = self.layout.write();
            // Another thread may have added it between the two locks.
            if let Some(&index) = layout.by_identifier.get(&identifier) {
                return layout.slots[index].clone();
            }
            self.append(&mut layout, identifier, kind)
        };
        self.version.invalidate_with_reason("slot added");
        slot
    }

    pub fn find_existing(&self, identifier: impl Into<SlotIdentifier>) -> Option<FrameSlot> {
        self.lookup(&identifier.into())
    }

    fn lookup(&self, identifier: &SlotIdentifier) -> Option<FrameSlot> {
        let layout = self.layout.read();
        layout
            .by_identifier
            .get(identifier)
            .map(|&index| layout.slots[index].clone())
    }

    fn append(&self, layout: &mut Layout, identifier: SlotIdentifier, kind: FrameSlotKind) -> FrameSlot {
        let index = layout.slots.len();
        let slot = FrameSlot {
            state: Arc::new(SlotState {
                index,
                identifier: identifier.clone(),
                kind: AtomicU8::new(kind as u8),
                descriptor_id: self.id,
            }),
        };
        tracing::trace!(
            target: "lkr::rt::frame",
            descriptor = self.id,
            slot = %identifier,
            index,
            kind = kind.name(),
            "frame slot added"
        );
        layout.by_identifier.insert(identifier, index);
        layout.slots.push(slot.clone());
        slot
    }

    pub fn slot(&self, index: usize) -> Option<FrameSlot> {
        self.layout.read().slots.get(index).cloned()
    }

    pub fn size(&self) -> usize {
        self.layout.read().slots.len()
    }

    pub fn slots(&self) -> Vec<FrameSlot> {
        self.layout.read().slots.clone()
    }

    pub fn identifiers(&self) -> Vec<SlotIdentifier> {
        self.layout
            .read()
            .slots
            .iter()
            .map(|slot| slot.identifier().clone())
            .collect()
    }

    /// True if `slot` was created by this descriptor.
    #[inline]
    pub fn owns(&self, slot: &FrameSlot) -> bool {
        slot.descriptor_id() == self.id
    }

    pub fn slot_kind(&self, slot: &FrameSlot) -> FrameSlotKind {
        slot.kind()
    }

    pub fn set_slot_kind(&self, slot: &FrameSlot, kind: FrameSlotKind) -> RuntimeResult<()> {
        if !self.owns(slot) {
            return Err(RuntimeError::invalid_argument(format!(
                "frame slot '{}' is not known by this frame descriptor",
                slot.identifier()
            )));
        }
        let previous = slot.state.kind.swap(kind as u8, Ordering::AcqRel);
        if previous != kind as u8 {
            self.version.invalidate_with_reason("slot kind changed");
        }
        Ok(())
    }

    /// Assumption that stays valid until the layout or a declared kind changes.
    pub fn version(&self) -> Assumption {
        self.version.get()
    }

    /// A new, independent descriptor with the same identifiers, kinds and default.
    pub fn copy(&self) -> FrameDescriptor {
        let copy = FrameDescriptor::with_default_value(self.default_value.clone());
        {
            let source = self.layout.read();
            let mut target = copy.layout.write();
            for slot in &source.slots {
                copy.append(&mut target, slot.identifier().clone(), slot.kind());
            }
        }
        copy
    }
}

impl Default for FrameDescriptor {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FrameDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let layout = self.layout.read();
        f.debug_struct("FrameDescriptor")
            .field("id", &self.id)
            .field("slots", &layout.slots)
            .finish()
    }
}
