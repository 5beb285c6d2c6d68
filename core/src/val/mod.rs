//! Dynamic values carried through call arguments, frame slots and results.

use std::{any::Any, fmt, sync::Arc};

use crate::frame::{Frame, FrameSlotKind};
use crate::target::CallTarget;

mod convert;

#[derive(Clone, Default)]
pub enum Val {
    #[default]
    Nil,
    Bool(bool),
    Byte(i8),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    /// String type, wrapped in Arc<str> for efficient cloning
    Str(Arc<str>),
    /// List type, stored as Arc<[Val]> for compact, immutable sharing
    List(Arc<[Val]>),
    /// Call target passed around as a first-class value (e.g. for indirect dispatch).
    Target(CallTarget),
    /// A frame captured by a closure. Always a materialized or read-only view.
    Frame(Frame),
    /// Host object owned by an embedding layer.
    Foreign(Arc<dyn Any + Send + Sync>),
}

impl Val {
    pub fn type_name(&self) -> &'static str {
        match self {
            Val::Nil => "Nil",
            Val::Bool(_) => "Bool",
            Val::Byte(_) => "Byte",
            Val::Int(_) => "Int",
            Val::Long(_) => "Long",
            Val::Float(_) => "Float",
            Val::Double(_) => "Double",
            Val::Str(_) => "String",
            Val::List(_) => "List",
            Val::Target(_) => "CallTarget",
            Val::Frame(_) => "Frame",
            Val::Foreign(_) => "Foreign",
        }
    }

    /// The frame slot kind this value is stored under by `Frame::set_value`.
    pub fn kind(&self) -> FrameSlotKind {
        match self {
            Val::Bool(_) => FrameSlotKind::Boolean,
            Val::Byte(_) => FrameSlotKind::Byte,
            Val::Int(_) => FrameSlotKind::Int,
            Val::Long(_) => FrameSlotKind::Long,
            Val::Float(_) => FrameSlotKind::Float,
            Val::Double(_) => FrameSlotKind::Double,
            _ => FrameSlotKind::Object,
        }
    }

    #[inline]
    pub fn is_nil(&self) -> bool {
        matches!(self, Val::Nil)
    }

    /// Widening integer view used by routines that do arithmetic on mixed widths.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Val::Byte(b) => Some(i64::from(*b)),
            Val::Int(i) => Some(i64::from(*i)),
            Val::Long(l) => Some(*l),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Val::Float(f) => Some(f64::from(*f)),
            Val::Double(d) => Some(*d),
            other => other.as_i64().map(|i| i as f64),
        }
    }

    pub fn as_call_target(&self) -> Option<&CallTarget> {
        match self {
            Val::Target(target) => Some(target),
            _ => None,
        }
    }

    pub fn as_frame(&self) -> Option<&Frame> {
        match self {
            Val::Frame(frame) => Some(frame),
            _ => None,
        }
    }

    pub fn downcast_foreign<T: Any + Send + Sync>(&self) -> Option<&T> {
        match self {
            Val::Foreign(obj) => obj.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl PartialEq for Val {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Val::Nil, Val::Nil) => true,
            (Val::Bool(a), Val::Bool(b)) => a == b,
            (Val::Byte(a), Val::Byte(b)) => a == b,
            (Val::Int(a), Val::Int(b)) => a == b,
            (Val::Long(a), Val::Long(b)) => a == b,
            (Val::Float(a), Val::Float(b)) => a == b,
            (Val::Double(a), Val::Double(b)) => a == b,
            (Val::Str(a), Val::Str(b)) => a == b,
            (Val::List(a), Val::List(b)) => a == b,
            (Val::Target(a), Val::Target(b)) => a == b,
            (Val::Frame(a), Val::Frame(b)) => a.shares_storage_with(b),
            (Val::Foreign(a), Val::Foreign(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Val {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Val::Nil => f.write_str("Nil"),
            Val::Bool(b) => write!(f, "Bool({b})"),
            Val::Byte(b) => write!(f, "Byte({b})"),
            Val::Int(i) => write!(f, "Int({i})"),
            Val::Long(l) => write!(f, "Long({l})"),
            Val::Float(x) => write!(f, "Float({x})"),
            Val::Double(x) => write!(f, "Double({x})"),
            Val::Str(s) => write!(f, "Str({s:?})"),
            Val::List(items) => f.debug_tuple("List").field(items).finish(),
            Val::Target(target) => f.debug_tuple("Target").field(target).finish(),
            // Frames may hold themselves; print the view only.
            Val::Frame(frame) => write!(f, "Frame({:?})", frame.view()),
            Val::Foreign(_) => f.write_str("Foreign(..)"),
        }
    }
}

impl fmt::Display for Val {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Val::Nil => f.write_str("nil"),
            Val::Bool(b) => write!(f, "{b}"),
            Val::Byte(b) => write!(f, "{b}"),
            Val::Int(i) => write!(f, "{i}"),
            Val::Long(l) => write!(f, "{l}"),
            Val::Float(x) => write!(f, "{x}"),
            Val::Double(x) => write!(f, "{x}"),
            Val::Str(s) => f.write_str(s),
            Val::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Val::Target(target) => write!(f, "<target {}>", target.name()),
            Val::Frame(_) => f.write_str("<frame>"),
            Val::Foreign(_) => f.write_str("<foreign>"),
        }
    }
}
