use std::sync::Arc;

use crate::frame::Frame;
use crate::target::CallTarget;

use super::Val;

impl From<String> for Val {
    #[inline]
    fn from(s: String) -> Self {
        Val::Str(Arc::<str>::from(s))
    }
}

impl From<&str> for Val {
    #[inline]
    fn from(s: &str) -> Self {
        Val::Str(Arc::from(s))
    }
}

impl From<i8> for Val {
    #[inline]
    fn from(b: i8) -> Self {
        Val::Byte(b)
    }
}

impl From<i32> for Val {
    #[inline]
    fn from(i: i32) -> Self {
        Val::Int(i)
    }
}

impl From<i64> for Val {
    #[inline]
    fn from(i: i64) -> Self {
        Val::Long(i)
    }
}

impl From<f32> for Val {
    #[inline]
    fn from(f: f32) -> Self {
        Val::Float(f)
    }
}

impl From<f64> for Val {
    #[inline]
    fn from(f: f64) -> Self {
        Val::Double(f)
    }
}

impl From<bool> for Val {
    #[inline]
    fn from(b: bool) -> Self {
        Val::Bool(b)
    }
}

impl From<CallTarget> for Val {
    #[inline]
    fn from(target: CallTarget) -> Self {
        Val::Target(target)
    }
}

impl From<Frame> for Val {
    #[inline]
    fn from(frame: Frame) -> Self {
        Val::Frame(frame)
    }
}

impl<T> From<Vec<T>> for Val
where
    T: Into<Val>,
{
    fn from(v: Vec<T>) -> Self {
        let v: Vec<Val> = v.into_iter().map(Into::into).collect();
        Val::List(Arc::<[Val]>::from(v))
    }
}

impl<T> From<Option<T>> for Val
where
    T: Into<Val>,
{
    fn from(o: Option<T>) -> Self {
        match o {
            Some(v) => v.into(),
            None => Val::Nil,
        }
    }
}

impl From<()> for Val {
    fn from(_: ()) -> Self {
        Val::Nil
    }
}
