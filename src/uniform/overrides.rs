//! Transient texture overrides shared between the game and render threads.
//!
//! The game side owns its own slot table and forwards every change as a command; the render
//! side only observes changes after draining the queue, in submission order.

use crate::foundation::ids::UniformExprId;
use crate::uniform::eval::TextureResource;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::mpsc;

/// Change to one texture expression's override slot.
#[derive(Clone, Debug)]
pub enum OverrideCommand {
    /// Replace (or clear, with `None`) the override of a texture expression.
    SetTexture {
        /// Texture uniform expression.
        expr: UniformExprId,
        /// New override.
        texture: Option<Arc<TextureResource>>,
    },
}

/// Producer side, owned by the game thread.
#[derive(Debug)]
pub struct GameThreadOverrides {
    slots: HashMap<UniformExprId, Arc<TextureResource>>,
    tx: mpsc::Sender<OverrideCommand>,
}

/// Consumer side, owned by the render thread.
#[derive(Debug)]
pub struct RenderThreadOverrides {
    slots: HashMap<UniformExprId, Arc<TextureResource>>,
    rx: mpsc::Receiver<OverrideCommand>,
}

/// Connected pair of override tables.
pub fn override_channel() -> (GameThreadOverrides, RenderThreadOverrides) {
    let (tx, rx) = mpsc::channel();
    (
        GameThreadOverrides {
            slots: HashMap::new(),
            tx,
        },
        RenderThreadOverrides {
            slots: HashMap::new(),
            rx,
        },
    )
}

fn apply(slots: &mut HashMap<UniformExprId, Arc<TextureResource>>, cmd: OverrideCommand) {
    match cmd {
        OverrideCommand::SetTexture {
            expr,
            texture: Some(t),
        } => {
            slots.insert(expr, t);
        }
        OverrideCommand::SetTexture {
            expr,
            texture: None,
        } => {
            slots.remove(&expr);
        }
    }
}

impl GameThreadOverrides {
    /// Set the game-thread slot immediately and queue the same change for the render thread.
    ///
    /// Returns `false` once the render side has been dropped; the game slot is still updated.
    pub fn set(&mut self, expr: UniformExprId, texture: Option<Arc<TextureResource>>) -> bool {
        let cmd = OverrideCommand::SetTexture { expr, texture };
        apply(&mut self.slots, cmd.clone());
        self.tx.send(cmd).is_ok()
    }

    /// Current game-thread override.
    pub fn get(&self, expr: UniformExprId) -> Option<&Arc<TextureResource>> {
        self.slots.get(&expr)
    }
}

impl RenderThreadOverrides {
    /// Apply every queued command; called once per frame before evaluation.
    pub fn drain(&mut self) -> usize {
        let mut n = 0;
        while let Ok(cmd) = self.rx.try_recv() {
            apply(&mut self.slots, cmd);
            n += 1;
        }
        if n > 0 {
            tracing::debug!(commands = n, "applied texture override commands");
        }
        n
    }

    /// Current render-thread override.
    pub fn get(&self, expr: UniformExprId) -> Option<&Arc<TextureResource>> {
        self.slots.get(&expr)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/uniform/overrides.rs"]
mod tests;
