//! Vertex types for 2D rendering

use bytemuck::{Pod, Zeroable};

/// Simple 2D vertex with position and color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Colors for game elements
pub mod colors {
    pub const BACKGROUND_TOP: [f32; 4] = [0.10, 0.10, 0.18, 1.0];
    pub const BACKGROUND_BOTTOM: [f32; 4] = [0.09, 0.13, 0.24, 1.0];
    pub const STAR: [f32; 4] = [1.0, 1.0, 1.0, 0.5];
    pub const PADDLE: [f32; 4] = [0.31, 0.80, 0.77, 1.0];
    pub const PADDLE_GLOW: [f32; 4] = [0.31, 0.80, 0.77, 0.25];
    pub const BALL: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
    pub const BALL_GLOW: [f32; 4] = [1.0, 1.0, 1.0, 0.2];
    pub const TRAIL: [f32; 3] = [0.31, 0.80, 0.77];
    pub const HIGHLIGHT: [f32; 4] = [1.0, 1.0, 1.0, 0.3];
}
