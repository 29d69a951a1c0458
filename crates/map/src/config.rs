use serde::{Deserialize, Serialize};

use crate::error::MapError;

/// How two rectangular spaces are tested for intersection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RectTest {
    /// Overlap on both axes.
    #[default]
    Overlap,
    /// Overlap on either axis. Reports shapes that are separated on one
    /// axis as intersecting; kept for content tuned against it.
    LegacyAxisOr,
}

/// Grid map configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Number of cells along x.
    pub width: u32,
    /// Number of cells along y.
    pub height: u32,
    /// Cell size in world units along x.
    pub cell_width: f32,
    /// Cell size in world units along y.
    pub cell_height: f32,
    #[serde(default)]
    pub rect_test: RectTest,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 10,
            height: 10,
            cell_width: 1.0,
            cell_height: 1.0,
            rect_test: RectTest::Overlap,
        }
    }
}

impl GridConfig {
    pub fn new(width: u32, height: u32, cell_width: f32, cell_height: f32) -> Self {
        Self {
            width,
            height,
            cell_width,
            cell_height,
            rect_test: RectTest::default(),
        }
    }

    pub fn with_rect_test(mut self, rect_test: RectTest) -> Self {
        self.rect_test = rect_test;
        self
    }

    pub fn validate(&self) -> Result<(), MapError> {
        let sizes_ok = self.cell_width.is_finite()
            && self.cell_height.is_finite()
            && self.cell_width > 0.0
            && self.cell_height > 0.0;
        if self.width == 0 || self.height == 0 || !sizes_ok {
            return Err(MapError::InvalidDimensions {
                width: self.width,
                height: self.height,
                cell_width: self.cell_width,
                cell_height: self.cell_height,
            });
        }
        Ok(())
    }
}
