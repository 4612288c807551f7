//! External collaborators.
//!
//! The overlay does not recognize images, capture the camera, decode audio
//! or draw pixels. It drives those through the traits below; the embedding
//! application provides the implementations.

use futures::future::LocalBoxFuture;
use glam::{Affine3A, Vec2};

use crate::errors::Result;
use crate::scene::{Camera, Scene};

/// Tracking transitions, delivered at most once per transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingEvent {
    Found,
    Lost,
}

/// A tap/click in normalized device coordinates (`[-1, 1]`, +Y up).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub ndc: Vec2,
}

impl PointerEvent {
    #[must_use]
    pub fn from_ndc(x: f32, y: f32) -> Self {
        Self { ndc: Vec2::new(x, y) }
    }

    /// Converts a pixel position on a `width`×`height` surface (origin top-left).
    #[must_use]
    pub fn from_screen(x: f32, y: f32, width: f32, height: f32) -> Self {
        let w = width.max(1.0);
        let h = height.max(1.0);
        Self::from_ndc((x / w) * 2.0 - 1.0, 1.0 - (y / h) * 2.0)
    }
}

/// Image-target tracking plus the render surface it draws into.
pub trait TrackingHost {
    /// Starts camera capture and recognition. Polled once per frame until it
    /// resolves; an error is fatal to the session.
    fn start(&mut self) -> LocalBoxFuture<'static, Result<()>>;

    fn stop(&mut self);

    /// Installs (or, with `None`, removes) the tracking event sink.
    fn set_listener(&mut self, listener: Option<flume::Sender<TrackingEvent>>);

    /// Current world transform of the target anchor.
    fn anchor_matrix(&self) -> Affine3A;

    fn camera(&self) -> &Camera;

    /// Issues the draw call for this frame.
    fn render(&mut self, scene: &Scene);

    fn resize(&mut self, width: u32, height: u32);
}

/// Background music.
pub trait AudioPlayer {
    /// May reject when the platform blocks playback (autoplay policy); such
    /// rejections are logged and otherwise ignored.
    fn play(&mut self) -> LocalBoxFuture<'static, Result<()>>;

    fn pause(&mut self);
}

/// Audio player that plays nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentAudio;

impl AudioPlayer for SilentAudio {
    fn play(&mut self) -> LocalBoxFuture<'static, Result<()>> {
        Box::pin(async { Ok(()) })
    }

    fn pause(&mut self) {}
}
