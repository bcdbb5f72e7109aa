/// Per-frame geometry pipeline
///
/// world transform → back-face cull and lighting → view transform →
/// near-plane clip → projection → perspective divide → viewport scale →
/// painter's sort → viewport-edge clip.
use nalgebra::{Matrix4, Vector3};
use serde::{Deserialize, Serialize};

use crate::clip::{clip_against_plane, clip_to_viewport, Clipped};
use crate::error::GeometryError;
use crate::geometry::{Mesh, Plane, Triangle};
use crate::projection::{ProjectionConfig, Viewport};
use crate::shading::{Appearance, CellColor, Shade};
use crate::sort::sort_back_to_front;
use crate::transform::{perspective_divide, try_normalize_vec};

/// Floor on light alignment so faces turned from the light stay faintly visible
pub const MIN_ILLUMINATION: f32 = 0.1;

const NEAR_CLIP_TINT: CellColor = CellColor::Magenta;
const EDGE_CLIP_TINT: CellColor = CellColor::Red;

/// Static pipeline settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub projection: ProjectionConfig,
    /// Direction towards the light; normalized on use
    pub light_direction: [f32; 3],
    /// Tint triangles produced by clipping
    pub highlight_clipped: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            projection: ProjectionConfig::default(),
            light_direction: [0.0, 1.0, -1.0],
            highlight_clipped: false,
        }
    }
}

/// Matrices for one frame, combined by the caller once per frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTransforms {
    /// Object to world space
    pub world: Matrix4<f32>,
    /// World to view space; `None` when the world is already camera-relative
    pub view: Option<Matrix4<f32>>,
    /// Camera position in world space, origin of the culling ray
    pub eye: Vector3<f32>,
}

impl FrameTransforms {
    pub fn new(world: Matrix4<f32>) -> Self {
        Self {
            world,
            view: None,
            eye: Vector3::zeros(),
        }
    }
}

/// Triangle counts for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub input: usize,
    pub culled: usize,
    pub degenerate: usize,
    pub near_clipped: usize,
    pub emitted: usize,
}

/// Consumer of screen-space triangles
pub trait Rasterizer {
    /// Fill the triangle with the given appearance. Coordinates are cells.
    #[allow(clippy::too_many_arguments)]
    fn fill_triangle(
        &mut self,
        x0: i32,
        y0: i32,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        appearance: &Appearance,
    );
}

/// Screen-space triangles for one frame, back to front
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameOutput {
    pub triangles: Vec<Triangle>,
    pub stats: FrameStats,
}

impl FrameOutput {
    /// Hand every triangle to `rasterizer` in drawing order
    pub fn rasterize<R: Rasterizer + ?Sized>(&self, rasterizer: &mut R) {
        for triangle in &self.triangles {
            let [a, b, c] = triangle.vertices;
            rasterizer.fill_triangle(
                a.x as i32,
                a.y as i32,
                b.x as i32,
                b.y as i32,
                c.x as i32,
                c.y as i32,
                &triangle.appearance,
            );
        }
    }
}

/// Projection state for a fixed viewport
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    viewport: Viewport,
    projection: Matrix4<f32>,
    near_plane: Plane,
    light_direction: Vector3<f32>,
}

impl Pipeline {
    /// Validate `config` against `viewport` and build the projection
    pub fn new(config: PipelineConfig, viewport: Viewport) -> Result<Self, GeometryError> {
        let projection = config.projection.matrix(&viewport)?;
        let light_direction = try_normalize_vec(&Vector3::from(config.light_direction))?;

        log::debug!(
            "Pipeline ready: {}x{} cells, fov {}°, depth {}..{}",
            viewport.width(),
            viewport.height(),
            config.projection.fov_degrees,
            config.projection.near,
            config.projection.far
        );

        Ok(Self {
            config,
            viewport,
            projection,
            near_plane: config.projection.near_plane(),
            light_direction,
        })
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Rebuild for a new output size
    pub fn resize(&mut self, viewport: Viewport) -> Result<(), GeometryError> {
        *self = Self::new(self.config, viewport)?;
        Ok(())
    }

    /// Run every stage over `mesh` and return the triangles to draw
    pub fn render(&self, mesh: &Mesh, transforms: &FrameTransforms) -> FrameOutput {
        let mut stats = FrameStats {
            input: mesh.len(),
            ..FrameStats::default()
        };
        let mut projected = Vec::with_capacity(mesh.len());

        for triangle in mesh {
            let world = triangle.transformed(&transforms.world);

            let normal = match world.face_normal() {
                Ok(normal) => normal,
                Err(err) => {
                    log::trace!("skipping triangle: {err}");
                    stats.degenerate += 1;
                    continue;
                }
            };

            let camera_ray = world.vertices[0].xyz() - transforms.eye;
            if normal.dot(&camera_ray) >= 0.0 {
                stats.culled += 1;
                continue;
            }

            let illumination = normal.dot(&self.light_direction).max(MIN_ILLUMINATION);
            let appearance = Appearance {
                shade: Shade::from_illumination(illumination),
                tint: triangle.appearance.tint,
            };

            let viewed = match &transforms.view {
                Some(view) => world.transformed(view),
                None => world,
            }
            .with_appearance(appearance);

            let clipped = match clip_against_plane(&self.near_plane, &viewed) {
                Ok(clipped) => clipped,
                Err(err) => {
                    log::trace!("skipping triangle at near plane: {err}");
                    stats.degenerate += 1;
                    continue;
                }
            };
            if clipped.is_empty() {
                stats.near_clipped += 1;
            }

            let highlight = self.config.highlight_clipped && !matches!(clipped, Clipped::Unchanged(_));
            for piece in clipped {
                let piece = if highlight {
                    piece.with_appearance(piece.appearance.with_tint(NEAR_CLIP_TINT))
                } else {
                    piece
                };
                projected.push(self.project(&piece));
            }
        }

        sort_back_to_front(&mut projected);

        let mut triangles = Vec::with_capacity(projected.len());
        for triangle in &projected {
            let pieces = clip_to_viewport(triangle, &self.viewport);
            let touched = pieces.len() != 1 || pieces[0] != *triangle;
            if self.config.highlight_clipped && touched {
                triangles.extend(
                    pieces
                        .into_iter()
                        .map(|p| p.with_appearance(p.appearance.with_tint(EDGE_CLIP_TINT))),
                );
            } else {
                triangles.extend(pieces);
            }
        }
        stats.emitted = triangles.len();

        log::debug!(
            "frame: {} in, {} culled, {} degenerate, {} behind near plane, {} out",
            stats.input,
            stats.culled,
            stats.degenerate,
            stats.near_clipped,
            stats.emitted
        );

        FrameOutput { triangles, stats }
    }

    /// View space to screen cells
    fn project(&self, triangle: &Triangle) -> Triangle {
        triangle
            .transformed(&self.projection)
            .map_vertices(|v| self.viewport.to_screen(perspective_divide(v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{point, Transform};

    fn pipeline(width: u32, height: u32) -> Pipeline {
        Pipeline::new(PipelineConfig::default(), Viewport::new(width, height).unwrap()).unwrap()
    }

    fn facing_camera(z: f32) -> Triangle {
        // Counter-clockwise seen from -z, so the normal points at the origin
        Triangle::new(point(-1.0, -1.0, z), point(0.0, 1.0, z), point(1.0, -1.0, z))
    }

    fn mesh_of(triangles: &[Triangle]) -> Mesh {
        Mesh {
            triangles: triangles.to_vec(),
        }
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<([i32; 6], Appearance)>,
    }

    impl Rasterizer for Recorder {
        fn fill_triangle(
            &mut self,
            x0: i32,
            y0: i32,
            x1: i32,
            y1: i32,
            x2: i32,
            y2: i32,
            appearance: &Appearance,
        ) {
            self.calls.push(([x0, y0, x1, y1, x2, y2], *appearance));
        }
    }

    #[test]
    fn test_rejects_bad_configuration() {
        let viewport = Viewport::new(80, 40).unwrap();
        let mut config = PipelineConfig::default();
        config.projection.near = 0.0;
        assert!(Pipeline::new(config, viewport).is_err());

        let config = PipelineConfig {
            light_direction: [0.0, 0.0, 0.0],
            ..Default::default()
        };
        assert_eq!(
            Pipeline::new(config, viewport).unwrap_err(),
            GeometryError::ZeroLengthVector
        );
    }

    #[test]
    fn test_back_face_is_culled() {
        let front = facing_camera(5.0);
        let back = Triangle {
            vertices: [front.vertices[0], front.vertices[2], front.vertices[1]],
            appearance: front.appearance,
        };
        let output = pipeline(80, 40).render(&mesh_of(&[back]), &FrameTransforms::new(Matrix4::identity()));
        assert!(output.triangles.is_empty());
        assert_eq!(output.stats.culled, 1);

        let output = pipeline(80, 40).render(&mesh_of(&[front]), &FrameTransforms::new(Matrix4::identity()));
        assert_eq!(output.triangles.len(), 1);
        assert_eq!(output.stats.culled, 0);
    }

    #[test]
    fn test_edge_on_face_is_culled() {
        // Plane containing the eye: dot product is exactly zero
        let edge_on = Triangle::new(point(0.0, 0.0, 1.0), point(0.0, 1.0, 2.0), point(0.0, 0.0, 3.0));
        let output = pipeline(80, 40).render(&mesh_of(&[edge_on]), &FrameTransforms::new(Matrix4::identity()));
        assert_eq!(output.stats.culled, 1);
    }

    #[test]
    fn test_degenerate_triangle_is_skipped() {
        let p = point(0.0, 0.0, 3.0);
        let output = pipeline(80, 40).render(
            &mesh_of(&[Triangle::new(p, p, p), facing_camera(3.0)]),
            &FrameTransforms::new(Matrix4::identity()),
        );
        assert_eq!(output.stats.degenerate, 1);
        assert_eq!(output.triangles.len(), 1);
    }

    #[test]
    fn test_illumination_floor() {
        // Normal points at -z; light (0,1,-1) gives dot ~0.707
        let lit = pipeline(80, 40).render(&mesh_of(&[facing_camera(4.0)]), &FrameTransforms::new(Matrix4::identity()));
        assert_eq!(lit.triangles[0].appearance.shade.level, 9);

        // Light from behind the face: floor keeps it in the dimmest lit bucket
        let config = PipelineConfig {
            light_direction: [0.0, 0.0, 1.0],
            ..Default::default()
        };
        let dark = Pipeline::new(config, Viewport::new(80, 40).unwrap())
            .unwrap()
            .render(&mesh_of(&[facing_camera(4.0)]), &FrameTransforms::new(Matrix4::identity()));
        assert_eq!(dark.triangles[0].appearance.shade, Shade::from_illumination(MIN_ILLUMINATION));
    }

    #[test]
    fn test_view_matrix_applied_after_culling() {
        let eye = Vector3::new(0.0, 0.0, -5.0);
        let view = Transform::translation(0.0, 0.0, 5.0);
        let transforms = FrameTransforms {
            world: Matrix4::identity(),
            view: Some(view),
            eye,
        };
        let output = pipeline(80, 40).render(&mesh_of(&[facing_camera(0.0)]), &transforms);
        assert_eq!(output.triangles.len(), 1);
        // Depth after the divide grows with view distance; 5 units away here
        let expected = {
            let config = ProjectionConfig::default();
            let q = config.far / (config.far - config.near);
            q - config.near * q / 5.0
        };
        assert!((output.triangles[0].mean_depth() - expected).abs() < 1e-4);
    }

    #[test]
    fn test_behind_camera_is_dropped() {
        let output = pipeline(80, 40).render(&mesh_of(&[facing_camera(-3.0)]), &FrameTransforms::new(Matrix4::identity()));
        // Facing away from the eye as seen from behind, so culled before clipping
        assert!(output.triangles.is_empty());

        let behind = Triangle::new(point(-1.0, -1.0, -2.0), point(1.0, -1.0, -2.0), point(0.0, 1.0, -2.0));
        let output = pipeline(80, 40).render(&mesh_of(&[behind]), &FrameTransforms::new(Matrix4::identity()));
        assert!(output.triangles.is_empty());
        assert_eq!(output.stats.near_clipped, 1);
    }

    #[test]
    fn test_output_is_sorted_back_to_front() {
        let mesh = mesh_of(&[facing_camera(2.0), facing_camera(9.0), facing_camera(4.0)]);
        let output = pipeline(200, 200).render(&mesh, &FrameTransforms::new(Matrix4::identity()));
        let depths: Vec<f32> = output.triangles.iter().map(Triangle::mean_depth).collect();
        assert_eq!(depths.len(), 3);
        assert!(depths.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_highlight_clipped() {
        let config = PipelineConfig {
            highlight_clipped: true,
            ..Default::default()
        };
        let pipeline = Pipeline::new(config, Viewport::new(80, 40).unwrap()).unwrap();

        // Close enough to overflow the viewport
        let output = pipeline.render(&mesh_of(&[facing_camera(0.5)]), &FrameTransforms::new(Matrix4::identity()));
        assert!(!output.triangles.is_empty());
        assert!(output.triangles.iter().all(|t| t.appearance.tint == Some(EDGE_CLIP_TINT)));

        let output = pipeline.render(&mesh_of(&[facing_camera(40.0)]), &FrameTransforms::new(Matrix4::identity()));
        assert_eq!(output.triangles[0].appearance.tint, None);
    }

    #[test]
    fn test_small_mesh_is_not_degenerate() {
        let mut config = PipelineConfig::default();
        config.projection.near = 1e-4;
        config.projection.far = 1.0;
        let pipeline = Pipeline::new(config, Viewport::new(80, 40).unwrap()).unwrap();

        // A 0.3 mm cube centered on the view axis
        let s = 3e-4;
        let world = Transform::compose(&[
            Transform::scale(s, s, s),
            Transform::translation(-s * 0.5, -s * 0.5, 3.0 * s),
        ]);
        let output = pipeline.render(&Mesh::unit_cube(), &FrameTransforms::new(world));
        assert_eq!(output.stats.degenerate, 0);
        assert_eq!(output.stats.culled, 10);
        assert_eq!(output.triangles.len(), 2);
    }

    #[test]
    fn test_near_plane_straddle_renders_clipped_pieces() {
        // Two vertices in front of the near plane, one behind, facing the eye
        let straddling = Triangle::new(
            point(-0.2, -0.1, 0.5),
            point(0.0, 0.1, 0.05),
            point(0.2, -0.1, 0.5),
        );
        let mesh = mesh_of(&[straddling]);
        let transforms = FrameTransforms::new(Matrix4::identity());

        let plain = pipeline(80, 40).render(&mesh, &transforms);
        assert_eq!(plain.stats.culled, 0);
        assert_eq!(plain.stats.near_clipped, 0);
        assert_eq!(plain.triangles.len(), 2);
        assert!(plain.triangles.iter().all(|t| t.appearance.tint.is_none()));

        let near = ProjectionConfig::default().near;
        let mut min_w = f32::INFINITY;
        for triangle in &plain.triangles {
            for v in &triangle.vertices {
                assert!(v.x.is_finite() && v.y.is_finite());
                assert!((0.0..=79.0).contains(&v.x), "x = {}", v.x);
                assert!((0.0..=39.0).contains(&v.y), "y = {}", v.y);
                min_w = min_w.min(v.w);
            }
        }
        // The new edge sits on the near plane; w carries its view depth
        assert!((min_w - near).abs() < 1e-4, "w = {min_w}");

        let config = PipelineConfig {
            highlight_clipped: true,
            ..Default::default()
        };
        let highlighted = Pipeline::new(config, Viewport::new(80, 40).unwrap())
            .unwrap()
            .render(&mesh, &transforms);
        assert_eq!(highlighted.triangles.len(), 2);
        assert!(highlighted
            .triangles
            .iter()
            .all(|t| t.appearance.tint == Some(NEAR_CLIP_TINT)));
    }

    #[test]
    fn test_rasterize_truncates_coordinates() {
        let output = FrameOutput {
            triangles: vec![Triangle::new(point(1.9, 2.2, 0.5), point(10.5, 2.0, 0.5), point(5.0, 8.99, 0.5))],
            stats: FrameStats::default(),
        };
        let mut recorder = Recorder::default();
        output.rasterize(&mut recorder);
        assert_eq!(recorder.calls.len(), 1);
        assert_eq!(recorder.calls[0].0, [1, 2, 10, 2, 5, 8]);
    }

    #[test]
    fn test_resize_keeps_config() {
        let mut pipeline = pipeline(80, 40);
        pipeline.resize(Viewport::new(100, 50).unwrap()).unwrap();
        assert_eq!(pipeline.viewport().width(), 100);
        assert_eq!(pipeline.config(), &PipelineConfig::default());
    }
}
