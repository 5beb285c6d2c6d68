use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use super::descriptor::{FrameDescriptor, FrameSlot, FrameSlotKind};
use crate::error::{RuntimeError, RuntimeResult};
use crate::val::Val;

/// Per-slot tagged payload. Primitives stay unboxed; everything else is an `Object`.
#[derive(Debug, Clone)]
enum SlotValue {
    Object(Val),
    Long(i64),
    Int(i32),
    Double(f64),
    Float(f32),
    Boolean(bool),
    Byte(i8),
}

impl SlotValue {
    fn tag(&self) -> FrameSlotKind {
        match self {
            SlotValue::Object(_) => FrameSlotKind::Object,
            SlotValue::Long(_) => FrameSlotKind::Long,
            SlotValue::Int(_) => FrameSlotKind::Int,
            SlotValue::Double(_) => FrameSlotKind::Double,
            SlotValue::Float(_) => FrameSlotKind::Float,
            SlotValue::Boolean(_) => FrameSlotKind::Boolean,
            SlotValue::Byte(_) => FrameSlotKind::Byte,
        }
    }

    fn into_val(self) -> Val {
        match self {
            SlotValue::Object(v) => v,
            SlotValue::Long(l) => Val::Long(l),
            SlotValue::Int(i) => Val::Int(i),
            SlotValue::Double(d) => Val::Double(d),
            SlotValue::Float(f) => Val::Float(f),
            SlotValue::Boolean(b) => Val::Bool(b),
            SlotValue::Byte(b) => Val::Byte(b),
        }
    }

    fn from_val(value: Val) -> Self {
        match value {
            Val::Long(l) => SlotValue::Long(l),
            Val::Int(i) => SlotValue::Int(i),
            Val::Double(d) => SlotValue::Double(d),
            Val::Float(f) => SlotValue::Float(f),
            Val::Bool(b) => SlotValue::Boolean(b),
            Val::Byte(b) => SlotValue::Byte(b),
            other => SlotValue::Object(other),
        }
    }
}

struct FrameStorage {
    descriptor: Arc<FrameDescriptor>,
    arguments: Box<[Val]>,
    cells: RwLock<Vec<SlotValue>>,
}

/// Which rights a [`Frame`] handle grants over its storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameView {
    /// The executing activation's own frame.
    Virtual,
    /// Escapable: may be captured, stored, or inspected after the call returns.
    Materialized,
    /// Introspection only; every write fails with `InvalidAccess`.
    ReadOnly,
}

/// An activation record: arguments plus typed slot storage.
///
/// Cloning a `Frame` clones the handle, not the storage. Every view produced by
/// [`Frame::materialize`] or [`Frame::read_only`] observes the same cells.
#[derive(Clone)]
pub struct Frame {
    storage: Arc<FrameStorage>,
    view: FrameView,
}

macro_rules! typed_accessors {
    ($get:ident, $set:ident, $ty:ty, $variant:ident, $kind:ident) => {
        pub fn $get(&self, slot: &FrameSlot) -> RuntimeResult<$ty> {
            match self.read_cell(slot)? {
                SlotValue::$variant(v) => Ok(v),
                other => Err(self.mismatch(slot, FrameSlotKind::$kind, other.tag())),
            }
        }

        pub fn $set(&self, slot: &FrameSlot, value: $ty) -> RuntimeResult<()> {
            self.write_cell(slot, SlotValue::$variant(value))
        }
    };
}

impl Frame {
    pub(crate) fn new(descriptor: Arc<FrameDescriptor>, arguments: Vec<Val>, view: FrameView) -> Self {
        let default = descriptor.default_value().clone();
        let cells = vec![SlotValue::Object(default); descriptor.size()];
        Self {
            storage: Arc::new(FrameStorage {
                descriptor,
                arguments: arguments.into_boxed_slice(),
                cells: RwLock::new(cells),
            }),
            view,
        }
    }

    #[inline]
    pub fn descriptor(&self) -> &Arc<FrameDescriptor> {
        &self.storage.descriptor
    }

    #[inline]
    pub fn arguments(&self) -> &[Val] {
        &self.storage.arguments
    }

    #[inline]
    pub fn argument(&self, index: usize) -> Option<&Val> {
        self.storage.arguments.get(index)
    }

    #[inline]
    pub fn view(&self) -> FrameView {
        self.view
    }

    /// An escapable view over the same storage. A read-only frame stays read-only.
    pub fn materialize(&self) -> Frame {
        let view = match self.view {
            FrameView::ReadOnly => FrameView::ReadOnly,
            _ => FrameView::Materialized,
        };
        Frame {
            storage: Arc::clone(&self.storage),
            view,
        }
    }

    pub fn read_only(&self) -> Frame {
        Frame {
            storage: Arc::clone(&self.storage),
            view: FrameView::ReadOnly,
        }
    }

    #[inline]
    pub fn shares_storage_with(&self, other: &Frame) -> bool {
        Arc::ptr_eq(&self.storage, &other.storage)
    }

    /// Kind-agnostic read; never-written slots yield the descriptor's default value.
    pub fn get_value(&self, slot: &FrameSlot) -> RuntimeResult<Val> {
        Ok(self.read_cell(slot)?.into_val())
    }

    /// Kind-agnostic write; primitives are stored unboxed under their own kind.
    pub fn set_value(&self, slot: &FrameSlot, value: Val) -> RuntimeResult<()> {
        self.write_cell(slot, SlotValue::from_val(value))
    }

    /// Kind of the value currently stored in `slot`.
    pub fn tag(&self, slot: &FrameSlot) -> RuntimeResult<FrameSlotKind> {
        Ok(self.read_cell(slot)?.tag())
    }

    pub fn is_kind(&self, slot: &FrameSlot, kind: FrameSlotKind) -> RuntimeResult<bool> {
        Ok(self.tag(slot)? == kind)
    }

    typed_accessors!(get_long, set_long, i64, Long, Long);
    typed_accessors!(get_int, set_int, i32, Int, Int);
    typed_accessors!(get_double, set_double, f64, Double, Double);
    typed_accessors!(get_float, set_float, f32, Float, Float);
    typed_accessors!(get_boolean, set_boolean, bool, Boolean, Boolean);
    typed_accessors!(get_byte, set_byte, i8, Byte, Byte);

    /// Reads a slot tagged `Object`. A slot holding an unboxed primitive is a
    /// mismatch, not an implicit boxing.
    pub fn get_object(&self, slot: &FrameSlot) -> RuntimeResult<Val> {
        match self.read_cell(slot)? {
            SlotValue::Object(v) => Ok(v),
            other => Err(self.mismatch(slot, FrameSlotKind::Object, other.tag())),
        }
    }

    /// Stores `value` boxed, tagged `Object`, whatever its runtime type.
    pub fn set_object(&self, slot: &FrameSlot, value: Val) -> RuntimeResult<()> {
        self.write_cell(slot, SlotValue::Object(value))
    }

    fn check_slot(&self, slot: &FrameSlot) -> RuntimeResult<()> {
        if self.storage.descriptor.owns(slot) {
            Ok(())
        } else {
            Err(RuntimeError::invalid_argument(format!(
                "frame slot '{}' is not known by this frame's descriptor",
                slot.identifier()
            )))
        }
    }

    fn read_cell(&self, slot: &FrameSlot) -> RuntimeResult<SlotValue> {
        self.check_slot(slot)?;
        let cells = self.storage.cells.read();
        Ok(match cells.get(slot.index()) {
            Some(cell) => cell.clone(),
            // Slot was added to the descriptor after this frame was created.
            None => SlotValue::Object(self.storage.descriptor.default_value().clone()),
        })
    }

    fn write_cell(&self, slot: &FrameSlot, value: SlotValue) -> RuntimeResult<()> {
        if self.view == FrameView::ReadOnly {
            return Err(RuntimeError::InvalidAccess {
                slot: slot.identifier().clone(),
            });
        }
        self.check_slot(slot)?;
        if slot.kind() == FrameSlotKind::Illegal {
            self.storage.descriptor.set_slot_kind(slot, value.tag())?;
        }
        let mut cells = self.storage.cells.write();
        let index = slot.index();
        if index >= cells.len() {
            let default = SlotValue::Object(self.storage.descriptor.default_value().clone());
            cells.resize(index + 1, default);
        }
        cells[index] = value;
        Ok(())
    }

    fn mismatch(&self, slot: &FrameSlot, requested: FrameSlotKind, actual: FrameSlotKind) -> RuntimeError {
        RuntimeError::TypeMismatch {
            slot: slot.identifier().clone(),
            requested,
            actual,
        }
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("view", &self.view)
            .field("descriptor", &self.storage.descriptor.id())
            .field("arguments", &self.storage.arguments.len())
            .finish()
    }
}
