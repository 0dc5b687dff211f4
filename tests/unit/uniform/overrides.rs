use super::*;
use crate::uniform::expr::TextureKind;

fn tex(name: &str) -> Arc<TextureResource> {
    Arc::new(TextureResource {
        name: name.to_string(),
        kind: TextureKind::Texture2d,
        width: 4,
        height: 4,
    })
}

#[test]
fn render_side_sees_changes_only_after_drain() {
    let (mut game, mut render) = override_channel();
    let id = UniformExprId(3);

    assert!(game.set(id, Some(tex("a"))));
    assert_eq!(game.get(id).unwrap().name, "a");
    assert!(render.get(id).is_none());

    assert_eq!(render.drain(), 1);
    assert_eq!(render.get(id).unwrap().name, "a");
}

#[test]
fn commands_replay_in_submission_order() {
    let (mut game, mut render) = override_channel();
    let id = UniformExprId(0);

    game.set(id, Some(tex("a")));
    game.set(id, Some(tex("b")));
    game.set(id, None);
    game.set(id, Some(tex("c")));

    assert_eq!(render.drain(), 4);
    assert_eq!(render.get(id).unwrap().name, "c");
    assert_eq!(render.drain(), 0);
}

#[test]
fn dropped_render_side_is_reported() {
    let (mut game, render) = override_channel();
    drop(render);
    assert!(!game.set(UniformExprId(1), Some(tex("a"))));
    assert!(game.get(UniformExprId(1)).is_some());
}
