use super::*;

fn constant(arena: &mut UniformArena, v: f32) -> UniformExprId {
    arena.intern(UniformExpr::Constant {
        value: LinearColor::new(v, 0.0, 0.0, 0.0),
        value_type: ValueType::FLOAT,
    })
}

#[test]
fn identical_constructions_share_a_handle() {
    let mut arena = UniformArena::new();
    let a = constant(&mut arena, 1.0);
    let b = constant(&mut arena, 1.0);
    assert_eq!(a, b);
    assert!(arena.is_identical(a, b));
    assert!(arena.is_identical(a, a));
    assert_eq!(arena.len(), 1);

    let p = arena.intern(UniformExpr::ScalarParameter {
        name: "Tint".to_string(),
        default_value: F32Key(0.5),
    });
    let q = arena.intern(UniformExpr::ScalarParameter {
        name: "Tint".to_string(),
        default_value: F32Key(0.25),
    });
    assert_ne!(p, q);
}

#[test]
fn identity_is_independent_of_allocation_order() {
    let mut first = UniformArena::new();
    let one = constant(&mut first, 1.0);
    let two = constant(&mut first, 2.0);
    let sum_a = first.intern(UniformExpr::FoldedMath {
        a: one,
        b: two,
        op: FoldedMathOp::Add,
    });

    let two_again = constant(&mut first, 2.0);
    let one_again = constant(&mut first, 1.0);
    let sum_b = first.intern(UniformExpr::FoldedMath {
        a: one_again,
        b: two_again,
        op: FoldedMathOp::Add,
    });
    assert_eq!(sum_a, sum_b);
}

#[test]
fn constness_and_per_frame_propagate_through_children() {
    let mut arena = UniformArena::new();
    let c = constant(&mut arena, 3.0);
    let t = arena.intern(UniformExpr::Time);
    let p = arena.intern(UniformExpr::VectorParameter {
        name: "Color".to_string(),
        default_value: LinearColor::WHITE,
    });
    let folded = arena.intern(UniformExpr::Sine { x: c, is_cosine: false });
    let timed = arena.intern(UniformExpr::FoldedMath {
        a: t,
        b: c,
        op: FoldedMathOp::Mul,
    });
    let param = arena.intern(UniformExpr::Abs { x: p });

    assert!(arena.is_constant(folded));
    assert!(!arena.is_changing_per_frame(folded));
    assert!(!arena.is_constant(timed));
    assert!(arena.is_changing_per_frame(timed));
    assert!(!arena.is_constant(param));
    assert!(!arena.is_changing_per_frame(param));
}

#[test]
fn single_index_swizzle_replicates() {
    let mut arena = UniformArena::new();
    let c = constant(&mut arena, 1.0);
    match UniformExpr::component_swizzle(c, [Some(2), None, None, None]) {
        UniformExpr::ComponentSwizzle {
            indices,
            num_elements,
            ..
        } => {
            assert_eq!(indices, [2, 2, 2, 2]);
            assert_eq!(num_elements, 4);
        }
        other => panic!("unexpected {other:?}"),
    }
    match UniformExpr::component_swizzle(c, [Some(0), Some(2), None, None]) {
        UniformExpr::ComponentSwizzle {
            indices,
            num_elements,
            ..
        } => {
            assert_eq!(&indices[..2], &[0, 2]);
            assert_eq!(num_elements, 2);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn serialized_arena_round_trips_and_rejects_forward_references() {
    let mut arena = UniformArena::new();
    let c = constant(&mut arena, 1.0);
    arena.intern(UniformExpr::Floor { x: c });

    let json = serde_json::to_value(&arena).unwrap();
    assert_eq!(json[1]["kind"], "floor");
    let back: UniformArena = serde_json::from_value(json).unwrap();
    assert_eq!(back.len(), 2);

    let bad = serde_json::json!([{ "kind": "floor", "x": 3 }]);
    assert!(serde_json::from_value::<UniformArena>(bad).is_err());
}

#[test]
fn flags_and_identity_stay_linear_on_shared_chains() {
    let build = |root: UniformExpr| {
        let mut arena = UniformArena::new();
        let mut node = arena.intern(root);
        for _ in 0..200 {
            node = arena.intern(UniformExpr::FoldedMath {
                a: node,
                b: node,
                op: FoldedMathOp::Add,
            });
        }
        (arena, node)
    };

    let (constant_arena, top) = build(UniformExpr::Constant {
        value: LinearColor::splat(1.0),
        value_type: ValueType::FLOAT,
    });
    assert!(constant_arena.is_constant(top));
    assert!(!constant_arena.is_changing_per_frame(top));

    let (timed, timed_top) = build(UniformExpr::Time);
    assert!(!timed.is_constant(timed_top));
    assert!(timed.is_changing_per_frame(timed_top));

    let (again, again_top) = build(UniformExpr::Time);
    assert!(timed.is_identical_across(timed_top, &again, again_top));
    assert!(!timed.is_identical_across(timed_top, &constant_arena, top));
}
