#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::error::RuntimeError;
    use crate::frame::{Frame, FrameDescriptor, FrameSlotKind, FrameView, SlotIdentifier};
    use crate::val::Val;

    fn frame_with(descriptor: &Arc<FrameDescriptor>, args: Vec<Val>) -> Frame {
        Frame::new(Arc::clone(descriptor), args, FrameView::Virtual)
    }

    #[test]
    fn descriptor_appends_and_finds_slots() {
        let desc = FrameDescriptor::new();
        let x = desc.add_slot("x", FrameSlotKind::Int).unwrap();
        let y = desc.find_or_add("y", FrameSlotKind::Illegal);
        let tmp = desc.find_or_add(7u64, FrameSlotKind::Object);

        assert_eq!(x.index(), 0);
        assert_eq!(y.index(), 1);
        assert_eq!(tmp.index(), 2);
        assert_eq!(desc.size(), 3);
        assert_eq!(desc.find_existing("x"), Some(x.clone()));
        assert_eq!(desc.find_or_add("x", FrameSlotKind::Object), x);
        assert_eq!(desc.find_existing("missing"), None);
        assert_eq!(
            desc.identifiers(),
            vec![
                SlotIdentifier::from("x"),
                SlotIdentifier::from("y"),
                SlotIdentifier::Synthetic(7)
            ]
        );
        assert_eq!(tmp.identifier().to_string(), "$7");
        assert_eq!(desc.slot(2), Some(tmp));
    }

    #[test]
    fn duplicate_slot_is_rejected() {
        let desc = FrameDescriptor::new();
        desc.add_slot("x", FrameSlotKind::Int).unwrap();
        let err = desc.add_slot("x", FrameSlotKind::Int).unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidArgument(_)));
    }

    #[test]
    fn version_invalidated_by_layout_and_kind_changes() {
        let desc = FrameDescriptor::new();
        let v0 = desc.version();
        let x = desc.add_slot("x", FrameSlotKind::Illegal).unwrap();
        assert!(!v0.is_valid());

        let v1 = desc.version();
        assert!(v1.is_valid());
        desc.find_or_add("x", FrameSlotKind::Int);
        assert!(v1.is_valid(), "finding an existing slot keeps the layout");

        desc.set_slot_kind(&x, FrameSlotKind::Int).unwrap();
        assert!(!v1.is_valid());
        let v2 = desc.version();
        desc.set_slot_kind(&x, FrameSlotKind::Int).unwrap();
        assert!(v2.is_valid(), "setting the same kind is not a change");
    }

    #[test]
    fn copy_is_independent() {
        let desc = FrameDescriptor::with_default_value(Val::Int(0));
        desc.add_slot("a", FrameSlotKind::Long).unwrap();
        let copy = desc.copy();
        copy.add_slot("b", FrameSlotKind::Object).unwrap();

        assert_eq!(desc.size(), 1);
        assert_eq!(copy.size(), 2);
        assert_ne!(desc.id(), copy.id());
        let a = copy.find_existing("a").unwrap();
        assert_eq!(a.kind(), FrameSlotKind::Long);
        assert!(!desc.owns(&a));
        assert_eq!(copy.default_value(), &Val::Int(0));
    }

    #[test]
    fn typed_round_trip_per_kind() {
        let desc = Arc::new(FrameDescriptor::new());
        let i = desc.add_slot("i", FrameSlotKind::Int).unwrap();
        let l = desc.add_slot("l", FrameSlotKind::Long).unwrap();
        let d = desc.add_slot("d", FrameSlotKind::Double).unwrap();
        let b = desc.add_slot("b", FrameSlotKind::Boolean).unwrap();
        let frame = frame_with(&desc, vec![]);

        frame.set_int(&i, 42).unwrap();
        frame.set_long(&l, -9).unwrap();
        frame.set_double(&d, 2.5).unwrap();
        frame.set_boolean(&b, true).unwrap();

        assert_eq!(frame.get_int(&i), Ok(42));
        assert_eq!(frame.get_long(&l), Ok(-9));
        assert_eq!(frame.get_double(&d), Ok(2.5));
        assert_eq!(frame.get_boolean(&b), Ok(true));
        assert_eq!(frame.get_value(&i), Ok(Val::Int(42)));
        assert!(frame.is_kind(&l, FrameSlotKind::Long).unwrap());
    }

    #[test]
    fn int_slot_read_as_object_is_a_mismatch() {
        let desc = Arc::new(FrameDescriptor::new());
        let x = desc.add_slot("x", FrameSlotKind::Int).unwrap();
        let frame = frame_with(&desc, vec![]);
        frame.set_int(&x, 3).unwrap();

        let err = frame.get_object(&x).unwrap_err();
        assert_eq!(
            err,
            RuntimeError::TypeMismatch {
                slot: SlotIdentifier::from("x"),
                requested: FrameSlotKind::Object,
                actual: FrameSlotKind::Int,
            }
        );
        assert!(frame.get_long(&x).unwrap_err().is_type_mismatch());
        // The kind-agnostic path always works.
        assert_eq!(frame.get_value(&x), Ok(Val::Int(3)));
    }

    #[test]
    fn unwritten_slots_read_as_default_object() {
        let desc = Arc::new(FrameDescriptor::with_default_value(Val::Str(Arc::from("undef"))));
        let x = desc.add_slot("x", FrameSlotKind::Int).unwrap();
        let frame = frame_with(&desc, vec![]);

        assert_eq!(frame.get_value(&x), Ok(Val::Str(Arc::from("undef"))));
        assert_eq!(frame.get_object(&x), Ok(Val::Str(Arc::from("undef"))));
        assert_eq!(frame.tag(&x), Ok(FrameSlotKind::Object));
        assert!(frame.get_int(&x).unwrap_err().is_type_mismatch());
    }

    #[test]
    fn writes_retag_the_cell() {
        let desc = Arc::new(FrameDescriptor::new());
        let x = desc.add_slot("x", FrameSlotKind::Object).unwrap();
        let frame = frame_with(&desc, vec![]);

        frame.set_int(&x, 1).unwrap();
        assert_eq!(frame.tag(&x), Ok(FrameSlotKind::Int));
        frame.set_object(&x, Val::Int(2)).unwrap();
        assert_eq!(frame.tag(&x), Ok(FrameSlotKind::Object));
        assert!(frame.get_int(&x).is_err(), "boxed ints are not unboxed on read");
        frame.set_value(&x, Val::Byte(5)).unwrap();
        assert_eq!(frame.get_byte(&x), Ok(5));
        // Declared kind is only specialized from Illegal.
        assert_eq!(x.kind(), FrameSlotKind::Object);
    }

    #[test]
    fn first_write_specializes_illegal_slot() {
        let desc = Arc::new(FrameDescriptor::new());
        let x = desc.add_slot("x", FrameSlotKind::Illegal).unwrap();
        let frame = frame_with(&desc, vec![]);
        let version = desc.version();

        frame.set_float(&x, 1.25).unwrap();
        assert_eq!(x.kind(), FrameSlotKind::Float);
        assert!(!version.is_valid());
        assert_eq!(frame.get_float(&x), Ok(1.25));
    }

    #[test]
    fn materialized_views_share_storage() {
        let desc = Arc::new(FrameDescriptor::new());
        let x = desc.add_slot("x", FrameSlotKind::Int).unwrap();
        let frame = frame_with(&desc, vec![Val::Int(1)]);

        let m1 = frame.materialize();
        let m2 = frame.materialize();
        assert_eq!(m1.view(), FrameView::Materialized);
        assert!(m1.shares_storage_with(&m2));

        m1.set_int(&x, 11).unwrap();
        assert_eq!(m2.get_int(&x), Ok(11));
        assert_eq!(frame.get_int(&x), Ok(11));
        frame.set_int(&x, 12).unwrap();
        assert_eq!(m1.get_int(&x), Ok(12));
        assert_eq!(m2.arguments(), &[Val::Int(1)]);
    }

    #[test]
    fn read_only_view_rejects_writes() {
        let desc = Arc::new(FrameDescriptor::new());
        let x = desc.add_slot("x", FrameSlotKind::Int).unwrap();
        let frame = frame_with(&desc, vec![]);
        frame.set_int(&x, 5).unwrap();

        let ro = frame.read_only();
        assert_eq!(ro.get_int(&x), Ok(5));
        assert_eq!(ro.get_value(&x), Ok(Val::Int(5)));
        assert_eq!(
            ro.set_int(&x, 6),
            Err(RuntimeError::InvalidAccess {
                slot: SlotIdentifier::from("x")
            })
        );
        assert!(ro.set_object(&x, Val::Nil).is_err());
        assert!(ro.set_value(&x, Val::Nil).is_err());
        assert_eq!(ro.materialize().view(), FrameView::ReadOnly);
        assert_eq!(frame.get_int(&x), Ok(5));
    }

    #[test]
    fn foreign_slot_is_invalid_argument() {
        let a = Arc::new(FrameDescriptor::new());
        let b = FrameDescriptor::new();
        let foreign = b.add_slot("x", FrameSlotKind::Int).unwrap();
        let frame = frame_with(&a, vec![]);
        assert!(matches!(frame.get_value(&foreign), Err(RuntimeError::InvalidArgument(_))));
        assert!(matches!(frame.set_int(&foreign, 1), Err(RuntimeError::InvalidArgument(_))));
    }

    #[test]
    fn late_slot_addition_grows_existing_frames() {
        let desc = Arc::new(FrameDescriptor::new());
        let frame = frame_with(&desc, vec![]);
        let late = desc.add_slot("late", FrameSlotKind::Long).unwrap();

        assert_eq!(frame.get_value(&late), Ok(Val::Nil));
        frame.set_long(&late, 99).unwrap();
        assert_eq!(frame.get_long(&late), Ok(99));
    }
}
