use super::*;
use crate::foundation::math::{DELTA, F32Key};
use crate::types::ValueType;
use crate::uniform::expr::SamplerSource;
use crate::uniform::overrides::override_channel;

fn constant(arena: &mut UniformArena, c: LinearColor) -> UniformExprId {
    arena.intern(UniformExpr::Constant {
        value: c,
        value_type: ValueType::FLOAT4,
    })
}

fn tex(name: &str, w: u32, h: u32) -> Arc<TextureResource> {
    Arc::new(TextureResource {
        name: name.to_string(),
        kind: TextureKind::Texture2d,
        width: w,
        height: h,
    })
}

#[test]
fn folded_div_never_produces_non_finite_values() {
    let mut arena = UniformArena::new();
    let a = constant(&mut arena, LinearColor::new(2.0, -3.0, 1.0, 0.5));
    for divisor in [0.0f32, -0.0, 0.000001, -0.000009, DELTA / 2.0] {
        let b = constant(&mut arena, LinearColor::splat(divisor));
        let div = arena.intern(UniformExpr::FoldedMath {
            a,
            b,
            op: FoldedMathOp::Div,
        });
        let ctx = RenderContext::new(0.0, 0.0, &[]);
        let v = arena.number_value(div, &ctx);
        for c in v.to_array() {
            assert!(c.is_finite());
        }
        let expected = if divisor < 0.0 { -DELTA } else { DELTA };
        assert_eq!(v.r, 2.0 / expected);
    }
}

#[test]
fn dot_replicates_a_four_wide_product() {
    let mut arena = UniformArena::new();
    let a = constant(&mut arena, LinearColor::new(1.0, 2.0, 3.0, 4.0));
    let b = constant(&mut arena, LinearColor::new(1.0, 1.0, 1.0, 1.0));
    let dot = arena.intern(UniformExpr::FoldedMath {
        a,
        b,
        op: FoldedMathOp::Dot,
    });
    let ctx = RenderContext::new(0.0, 0.0, &[]);
    assert_eq!(arena.number_value(dot, &ctx), LinearColor::splat(10.0));
}

#[test]
fn append_and_swizzle_pick_expected_channels() {
    let mut arena = UniformArena::new();
    let a = constant(&mut arena, LinearColor::new(1.0, 2.0, 9.0, 9.0));
    let b = constant(&mut arena, LinearColor::new(3.0, 4.0, 9.0, 9.0));
    let append = arena.intern(UniformExpr::AppendVector {
        a,
        b,
        num_components_a: 2,
    });
    let swz = arena.intern(UniformExpr::component_swizzle(
        append,
        [Some(3), Some(0), None, None],
    ));
    let ctx = RenderContext::new(0.0, 0.0, &[]);
    assert_eq!(
        arena.number_value(append, &ctx),
        LinearColor::new(1.0, 2.0, 3.0, 4.0)
    );
    assert_eq!(
        arena.number_value(swz, &ctx),
        LinearColor::new(4.0, 1.0, 0.0, 0.0)
    );
}

#[test]
fn time_and_periodic() {
    let mut arena = UniformArena::new();
    let t = arena.intern(UniformExpr::Time);
    let p = arena.intern(UniformExpr::Periodic { x: t });
    let rt = arena.intern(UniformExpr::RealTime);
    let ctx = RenderContext::new(2.25, 7.0, &[]);
    assert_eq!(arena.number_value(t, &ctx), LinearColor::splat(2.25));
    assert_eq!(arena.number_value(p, &ctx), LinearColor::splat(0.25));
    assert_eq!(arena.number_value(rt, &ctx), LinearColor::splat(7.0));
}

#[test]
fn clamp_length_and_frac() {
    let mut arena = UniformArena::new();
    let x = constant(&mut arena, LinearColor::new(-1.0, 0.5, 3.0, 1.5));
    let lo = constant(&mut arena, LinearColor::splat(0.0));
    let hi = constant(&mut arena, LinearColor::splat(1.0));
    let clamp = arena.intern(UniformExpr::Clamp {
        input: x,
        min: lo,
        max: hi,
    });
    let v = constant(&mut arena, LinearColor::new(3.0, 4.0, 0.0, 9.0));
    let len = arena.intern(UniformExpr::Length { x: v });
    let frac = arena.intern(UniformExpr::Frac { x });
    let ctx = RenderContext::new(0.0, 0.0, &[]);
    assert_eq!(
        arena.number_value(clamp, &ctx),
        LinearColor::new(0.0, 0.5, 1.0, 1.0)
    );
    assert_eq!(
        arena.number_value(len, &ctx),
        LinearColor::new(5.0, 5.0, 5.0, 0.0)
    );
    assert_eq!(
        arena.number_value(frac, &ctx),
        LinearColor::new(0.0, 0.5, 0.0, 0.5)
    );
}

#[test]
fn parameters_resolve_through_instance_chain_then_defaults() {
    let mut arena = UniformArena::new();
    let s = arena.intern(UniformExpr::ScalarParameter {
        name: "Tint".to_string(),
        default_value: F32Key(0.5),
    });
    let v = arena.intern(UniformExpr::VectorParameter {
        name: "Color".to_string(),
        default_value: LinearColor::new(1.0, 0.0, 0.0, 1.0),
    });

    let mut root = MaterialInstance::new();
    root.scalars.insert("Tint".to_string(), 0.75);
    let child = MaterialInstance::with_parent(Arc::new(root));

    let mut ctx = RenderContext::new(0.0, 0.0, &[]);
    ctx.parameters = &child;
    assert_eq!(arena.number_value(s, &ctx), LinearColor::splat(0.75));
    assert_eq!(
        arena.number_value(v, &ctx),
        LinearColor::new(1.0, 0.0, 0.0, 1.0)
    );

    arena.set_transient_override_default(v, Some(LinearColor::splat(0.25)));
    assert_eq!(arena.number_value(v, &ctx), LinearColor::splat(0.25));
    arena.set_transient_override_default(v, None);
    assert_eq!(arena.number_value(v, &ctx).r, 1.0);
}

#[test]
fn render_texture_resolution_order() {
    let mut arena = UniformArena::new();
    let id = arena.intern(UniformExpr::TextureParameter {
        name: "Albedo".to_string(),
        texture_index: 0,
        texture_kind: TextureKind::Texture2d,
        sampler_source: SamplerSource::FromTextureAsset,
    });
    let referenced = vec![tex("default", 64, 32)];

    let ctx = RenderContext::new(0.0, 0.0, &referenced);
    assert_eq!(arena.render_texture_value(id, &ctx).unwrap().name, "default");

    let mut inst = MaterialInstance::new();
    inst.textures.insert("Albedo".to_string(), tex("param", 8, 8));
    let mut ctx = RenderContext::new(0.0, 0.0, &referenced);
    ctx.parameters = &inst;
    assert_eq!(arena.render_texture_value(id, &ctx).unwrap().name, "param");

    let (mut game, mut render) = override_channel();
    game.set(id, Some(tex("override", 2, 2)));
    render.drain();
    ctx.overrides = Some(&render);
    assert_eq!(arena.render_texture_value(id, &ctx).unwrap().name, "override");

    let size = arena.intern(UniformExpr::TextureProperty {
        texture: id,
        property: TextureProperty::TexelSize,
    });
    assert_eq!(
        arena.number_value(size, &ctx),
        LinearColor::new(0.5, 0.5, 0.0, 0.0)
    );
}

#[test]
fn game_texture_resolution_uses_instance_chain() {
    let mut arena = UniformArena::new();
    let id = arena.intern(UniformExpr::TextureParameter {
        name: "Albedo".to_string(),
        texture_index: 0,
        texture_kind: TextureKind::Texture2d,
        sampler_source: SamplerSource::FromTextureAsset,
    });
    let referenced = vec![tex("default", 64, 32)];
    let mut parent = MaterialInstance::new();
    parent
        .textures
        .insert("Albedo".to_string(), tex("parent", 16, 16));
    let child = MaterialInstance::with_parent(Arc::new(parent));

    let got = arena.game_texture_value(id, &child, &referenced, None);
    assert_eq!(got.unwrap().name, "parent");

    let missing = arena.intern(UniformExpr::Texture {
        texture_index: 5,
        texture_kind: TextureKind::Texture2d,
        sampler_source: SamplerSource::FromTextureAsset,
    });
    assert!(
        arena
            .game_texture_value(missing, &child, &referenced, None)
            .is_none()
    );
}

#[test]
fn texel_size_of_an_empty_texture_is_zero() {
    let mut arena = UniformArena::new();
    let id = arena.intern(UniformExpr::Texture {
        texture_index: 0,
        texture_kind: TextureKind::Texture2d,
        sampler_source: SamplerSource::FromTextureAsset,
    });
    let size = arena.intern(UniformExpr::TextureProperty {
        texture: id,
        property: TextureProperty::TexelSize,
    });
    let referenced = vec![tex("empty", 0, 4)];
    let ctx = RenderContext::new(0.0, 0.0, &referenced);
    assert_eq!(
        arena.number_value(size, &ctx),
        LinearColor::new(0.0, 0.25, 0.0, 0.0)
    );
}

#[test]
fn shared_children_evaluate_once() {
    let mut arena = UniformArena::new();
    let mut node = arena.intern(UniformExpr::Time);
    for _ in 0..64 {
        node = arena.intern(UniformExpr::FoldedMath {
            a: node,
            b: node,
            op: FoldedMathOp::Add,
        });
    }
    let ctx = RenderContext::new(1.0, 0.0, &[]);
    assert_eq!(arena.number_value(node, &ctx).r, 2.0f32.powi(64));
}
