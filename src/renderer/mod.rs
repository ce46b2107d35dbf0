//! Rendering
//!
//! The renderer only reads the frame state. Screen shake is applied as a
//! per-frame vertex offset and never written back.

pub mod pipeline;
pub mod scene;
pub mod shapes;
pub mod vertex;

use rand::SeedableRng;
use rand_pcg::Pcg32;

pub use pipeline::RenderState;
pub use scene::Scene;

use crate::settings::Settings;
use crate::sim::FrameState;

/// Something that can paint a frame state
pub trait Renderer {
    /// Paint `state`. Callable any time, including before a round starts.
    fn render(&mut self, state: &FrameState);
}

/// Builds the scene without a GPU; used natively and in tests
#[derive(Debug, Clone)]
pub struct HeadlessRenderer {
    scene: Scene,
    rng: Pcg32,
    frames: u64,
    last_vertex_count: usize,
}

impl Default for HeadlessRenderer {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl HeadlessRenderer {
    pub fn new(settings: &Settings) -> Self {
        Self {
            scene: Scene::new(settings),
            rng: Pcg32::seed_from_u64(0),
            frames: 0,
            last_vertex_count: 0,
        }
    }

    /// Frames painted so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn last_vertex_count(&self) -> usize {
        self.last_vertex_count
    }
}

impl Renderer for HeadlessRenderer {
    fn render(&mut self, state: &FrameState) {
        let offset = scene::shake_offset(&mut self.rng, state.screen_shake);
        self.last_vertex_count = self.scene.build(state, offset).len();
        self.frames += 1;
    }
}
