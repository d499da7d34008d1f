//! Backend-neutral description of one rendered frame.
//!
//! Commands are listed in draw order. Textures are referenced by handle; the
//! pixels live in the engine's texture store until released.

use foundation::handles::Handle;
use foundation::math::Vec3;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera3D {
    pub position: Vec3,
    pub target: Vec3,
    pub fov_y_rad: f64,
    pub near: f64,
    pub far: f64,
}

impl Camera3D {
    pub fn look_at(position: Vec3, target: Vec3, fov_y_rad: f64, near: f64, far: f64) -> Self {
        Self {
            position,
            target,
            fov_y_rad,
            near,
            far,
        }
    }
}

impl Default for Camera3D {
    fn default() -> Self {
        Self::look_at(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO, 45f64.to_radians(), 0.01, 100.0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BlendMode {
    Normal,
    Additive,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SurfaceLayer {
    Land,
    LandGlow,
    Highlight,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MarkerDraw {
    pub position: [f32; 3],
    pub radius: f32,
    pub color: [f32; 4],
    pub halo_radius: f32,
    pub halo_color: [f32; 4],
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    Sphere {
        radius: f32,
        color: [f32; 4],
    },
    TexturedSphere {
        layer: SurfaceLayer,
        radius: f32,
        texture: Handle,
        blend: BlendMode,
        opacity: f32,
    },
    Atmosphere {
        radius: f32,
        color: [f32; 4],
    },
    Lines {
        lines: Vec<Vec<[f32; 3]>>,
        color: [f32; 4],
    },
    Ring {
        radius: f32,
        tilt_rad: f32,
        rotation_rad: f32,
        color: [f32; 4],
    },
    Markers {
        instances: Vec<MarkerDraw>,
    },
    Label {
        /// Id of the overlay layer that produced the label.
        layer: u64,
        text: String,
        anchor: [f32; 3],
        screen_pos_px: Option<[f32; 2]>,
        size_px: [f32; 2],
        color: [f32; 4],
        background: [f32; 4],
    },
}

impl RenderCommand {
    pub fn kind(&self) -> &'static str {
        match self {
            RenderCommand::Sphere { .. } => "sphere",
            RenderCommand::TexturedSphere {
                layer: SurfaceLayer::Land,
                ..
            } => "land",
            RenderCommand::TexturedSphere {
                layer: SurfaceLayer::LandGlow,
                ..
            } => "land_glow",
            RenderCommand::TexturedSphere {
                layer: SurfaceLayer::Highlight,
                ..
            } => "highlight",
            RenderCommand::Atmosphere { .. } => "atmosphere",
            RenderCommand::Lines { .. } => "graticule",
            RenderCommand::Ring { .. } => "ring",
            RenderCommand::Markers { .. } => "markers",
            RenderCommand::Label { .. } => "label",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderFrame {
    pub index: u64,
    pub time_s: f64,
    pub viewport: [u32; 2],
    pub camera: Camera3D,
    pub clear_color: [f32; 4],
    pub commands: Vec<RenderCommand>,
}

impl RenderFrame {
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn push(&mut self, command: RenderCommand) {
        self.commands.push(command);
    }

    /// Command kinds in draw order.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.commands.iter().map(RenderCommand::kind).collect()
    }

    /// Texture handles referenced by this frame, in draw order.
    pub fn textures(&self) -> Vec<Handle> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                RenderCommand::TexturedSphere { texture, .. } => Some(*texture),
                _ => None,
            })
            .collect()
    }

    pub fn label(&self) -> Option<&str> {
        self.commands.iter().find_map(|c| match c {
            RenderCommand::Label { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn marker_count(&self) -> usize {
        self.commands
            .iter()
            .map(|c| match c {
                RenderCommand::Markers { instances } => instances.len(),
                _ => 0,
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::{BlendMode, RenderCommand, RenderFrame, SurfaceLayer};
    use foundation::handles::Handle;

    #[test]
    fn frame_queries() {
        let mut frame = RenderFrame::default();
        frame.push(RenderCommand::Sphere {
            radius: 1.0,
            color: [0.0, 0.0, 1.0, 1.0],
        });
        frame.push(RenderCommand::TexturedSphere {
            layer: SurfaceLayer::Land,
            radius: 1.0,
            texture: Handle::new(0, 0),
            blend: BlendMode::Normal,
            opacity: 1.0,
        });
        frame.push(RenderCommand::Label {
            layer: 1,
            text: "Lisbon".to_string(),
            anchor: [0.0, 0.0, 1.08],
            screen_pos_px: None,
            size_px: [10.0, 10.0],
            color: [1.0; 4],
            background: [0.0; 4],
        });

        assert_eq!(frame.kinds(), vec!["sphere", "land", "label"]);
        assert_eq!(frame.textures(), vec![Handle::new(0, 0)]);
        assert_eq!(frame.label(), Some("Lisbon"));
        assert_eq!(frame.marker_count(), 0);

        frame.clear();
        assert!(frame.commands.is_empty());
    }
}
