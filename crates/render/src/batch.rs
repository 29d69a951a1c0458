use cellworld_common::{Renderable, WPos};

use crate::camera::Camera;
use crate::error::RenderError;
use crate::renderer::RenderSink;

/// Buffer sizes for one draw batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    pub vertex_capacity: usize,
    pub index_capacity: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            vertex_capacity: 10_000,
            index_capacity: 10_000,
        }
    }
}

/// A vertex in clip space with its packed colour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: u32,
}

/// Geometry for one draw call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Batch {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// CPU-side batcher: transforms submitted meshes into clip space and packs
/// them into fixed-size batches, starting a new batch when one fills up.
///
/// This is the piece a GPU back-end uploads from; the batches of the last
/// frame stay available until the next `begin`.
#[derive(Debug, Default)]
pub struct BatchRenderer {
    config: BatchConfig,
    camera: Camera,
    current: Batch,
    batches: Vec<Batch>,
    in_frame: bool,
}

impl BatchRenderer {
    pub fn new(config: BatchConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Batches flushed during the last frame.
    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    pub fn triangle_count(&self) -> usize {
        self.batches.iter().map(Batch::triangle_count).sum()
    }
}

impl RenderSink for BatchRenderer {
    fn begin(&mut self, camera: &Camera) {
        self.camera = *camera;
        self.current = Batch::default();
        self.batches.clear();
        self.in_frame = true;
    }

    fn submit(&mut self, renderable: &Renderable) -> Result<(), RenderError> {
        if !self.in_frame {
            return Err(RenderError::NotInFrame);
        }
        let mesh = &renderable.mesh;
        let vertex_count = mesh.vertex_count();
        if let Some(&index) = mesh.triangles.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(RenderError::InvalidMesh {
                index,
                vertices: vertex_count,
            });
        }
        if vertex_count > self.config.vertex_capacity || mesh.triangles.len() > self.config.index_capacity {
            return Err(RenderError::MeshTooLarge {
                vertices: vertex_count,
                indices: mesh.triangles.len(),
                vertex_capacity: self.config.vertex_capacity,
                index_capacity: self.config.index_capacity,
            });
        }
        if self.current.vertices.len() + vertex_count > self.config.vertex_capacity
            || self.current.indices.len() + mesh.triangles.len() > self.config.index_capacity
        {
            self.flush();
        }

        let base = self.current.vertices.len() as u32;
        let p = renderable.position;
        for point in mesh.points.chunks_exact(2) {
            let clip = self
                .camera
                .to_clip(WPos::new(p.x + point[0], p.y + point[1], p.z));
            self.current.vertices.push(Vertex {
                position: clip.to_array(),
                color: renderable.color,
            });
        }
        self.current.indices.extend(mesh.triangles.iter().map(|i| base + i));
        Ok(())
    }

    fn flush(&mut self) {
        if self.current.indices.is_empty() {
            return;
        }
        let batch = std::mem::take(&mut self.current);
        tracing::trace!(vertices = batch.vertices.len(), indices = batch.indices.len(), "batch flushed");
        self.batches.push(batch);
    }

    fn end(&mut self) {
        self.flush();
        self.in_frame = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellworld_common::{Mesh, to_color};

    fn quad_at(x: f32, y: f32) -> Renderable {
        Renderable {
            mesh: Mesh::quad(1.0, 1.0),
            position: WPos::planar(x, y),
            color: to_color(1, 2, 3, 4),
        }
    }

    #[test]
    fn packs_quads_into_one_batch() {
        let mut r = BatchRenderer::new(BatchConfig::default());
        r.begin(&Camera::framing(10.0, 10.0));
        r.submit(&quad_at(0.0, 0.0)).unwrap();
        r.submit(&quad_at(2.0, 2.0)).unwrap();
        r.end();

        assert_eq!(r.batches().len(), 1);
        let batch = &r.batches()[0];
        assert_eq!(batch.vertices.len(), 8);
        assert_eq!(&batch.indices[6..], &[4, 5, 6, 6, 7, 4]);
        assert_eq!(r.triangle_count(), 4);
        assert!((batch.vertices[0].position[0] + 1.0).abs() < 1e-5);
    }

    #[test]
    fn splits_when_capacity_is_reached() {
        let mut r = BatchRenderer::new(BatchConfig {
            vertex_capacity: 8,
            index_capacity: 100,
        });
        r.begin(&Camera::default());
        for i in 0..3 {
            r.submit(&quad_at(i as f32, 0.0)).unwrap();
        }
        r.end();
        let sizes: Vec<usize> = r.batches().iter().map(|b| b.vertices.len()).collect();
        assert_eq!(sizes, [8, 4]);
        assert_eq!(r.batches()[1].indices[0], 0);
    }

    #[test]
    fn rejects_bad_meshes_and_out_of_frame_submits() {
        let mut r = BatchRenderer::new(BatchConfig {
            vertex_capacity: 3,
            index_capacity: 100,
        });
        assert!(matches!(r.submit(&quad_at(0.0, 0.0)), Err(RenderError::NotInFrame)));
        r.begin(&Camera::default());
        assert!(matches!(r.submit(&quad_at(0.0, 0.0)), Err(RenderError::MeshTooLarge { .. })));

        let mut broken = quad_at(0.0, 0.0);
        broken.mesh.triangles = vec![0, 1, 9];
        assert!(matches!(r.submit(&broken), Err(RenderError::InvalidMesh { index: 9, .. })));
    }
}
