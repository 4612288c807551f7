use std::cell::Cell;
use std::marker::PhantomData;

use crate::errors::{Error, Result};

thread_local! {
    static ACTIVE_SCENE: Cell<Option<u32>> = const { Cell::new(None) };
}

/// Claim on the render thread's single mount slot.
///
/// At most one exists per thread. Dropping it frees the slot. It is tied to
/// the thread it was acquired on.
#[derive(Debug)]
pub struct RenderContext {
    scene_id: u32,
    _not_send: PhantomData<*const ()>,
}

impl RenderContext {
    /// Claims the slot for `scene_id`.
    pub fn acquire(scene_id: u32) -> Result<Self> {
        ACTIVE_SCENE.with(|slot| {
            if let Some(active) = slot.get() {
                log::error!("Render context busy: scene {active} is still mounted");
                return Err(Error::SceneAlreadyMounted);
            }
            slot.set(Some(scene_id));
            Ok(Self {
                scene_id,
                _not_send: PhantomData,
            })
        })
    }

    #[must_use]
    pub fn scene_id(&self) -> u32 {
        self.scene_id
    }

    /// Scene currently holding this thread's render context.
    #[must_use]
    pub fn active_scene() -> Option<u32> {
        ACTIVE_SCENE.with(Cell::get)
    }
}

impl Drop for RenderContext {
    fn drop(&mut self) {
        ACTIVE_SCENE.with(|slot| {
            if slot.get() == Some(self.scene_id) {
                slot.set(None);
            }
        });
    }
}
