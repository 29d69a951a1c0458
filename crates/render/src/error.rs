use cellworld_kernel::KernelError;

/// Errors raised while building a frame.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("mesh needs {vertices} vertices and {indices} indices, batch holds {vertex_capacity} and {index_capacity}")]
    MeshTooLarge {
        vertices: usize,
        indices: usize,
        vertex_capacity: usize,
        index_capacity: usize,
    },
    #[error("triangle index {index} is out of range for a mesh of {vertices} vertices")]
    InvalidMesh { index: u32, vertices: usize },
    #[error("submit called outside begin/end")]
    NotInFrame,
    #[error(transparent)]
    Kernel(#[from] KernelError),
}
