// Play area dimensions and viewport fitting

/// Default play area width, in stage units
pub const STAGE_WIDTH: f32 = 1024.0;

/// Default play area height, in stage units
pub const STAGE_HEIGHT: f32 = 576.0;

/// Fixed-size play area that gets letterboxed into the window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stage {
    pub width: f32,
    pub height: f32,
    dimensions: StageDimensions,
}

/// Rendered size of the play area and its scale factor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageDimensions {
    pub render_width: f32,
    pub render_height: f32,
    pub scale: f32,
}

impl Stage {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            dimensions: StageDimensions {
                render_width: width,
                render_height: height,
                scale: 1.0,
            },
        }
    }

    /// Largest size with the stage's aspect ratio fitting the viewport
    pub fn fit(&self, viewport_width: f32, viewport_height: f32) -> StageDimensions {
        if viewport_width <= 0.0 || viewport_height <= 0.0 {
            return StageDimensions {
                render_width: self.width,
                render_height: self.height,
                scale: 1.0,
            };
        }

        if self.height / self.width > viewport_height / viewport_width {
            // Taller than the viewport: height bound
            StageDimensions {
                render_width: viewport_height * self.width / self.height,
                render_height: viewport_height,
                scale: viewport_height / self.height,
            }
        } else {
            StageDimensions {
                render_width: viewport_width,
                render_height: viewport_width * self.height / self.width,
                scale: viewport_width / self.width,
            }
        }
    }

    /// Refit to a new viewport and remember the result
    pub fn resize(&mut self, viewport_width: f32, viewport_height: f32) -> StageDimensions {
        self.dimensions = self.fit(viewport_width, viewport_height);
        log::debug!(
            "Stage fitted to {}x{} (scale {:.3})",
            viewport_width,
            viewport_height,
            self.dimensions.scale
        );
        self.dimensions
    }

    pub fn dimensions(&self) -> StageDimensions {
        self.dimensions
    }

    #[cfg(test)]
    pub fn scale(&self) -> f32 {
        self.dimensions.scale
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::new(STAGE_WIDTH, STAGE_HEIGHT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fit_same_aspect() {
        let dims = Stage::default().fit(2048.0, 1152.0);
        assert_relative_eq!(dims.scale, 2.0);
        assert_relative_eq!(dims.render_width, 2048.0);
        assert_relative_eq!(dims.render_height, 1152.0);
    }

    #[test]
    fn test_fit_tall_viewport_is_width_bound() {
        let dims = Stage::default().fit(512.0, 1000.0);
        assert_relative_eq!(dims.scale, 0.5);
        assert_relative_eq!(dims.render_width, 512.0);
        assert_relative_eq!(dims.render_height, 288.0);
    }

    #[test]
    fn test_fit_wide_viewport_is_height_bound() {
        let dims = Stage::default().fit(3000.0, 288.0);
        assert_relative_eq!(dims.scale, 0.5);
        assert_relative_eq!(dims.render_width, 512.0);
        assert_relative_eq!(dims.render_height, 288.0);
    }

    #[test]
    fn test_degenerate_viewport_keeps_unit_scale() {
        let mut stage = Stage::default();
        let dims = stage.resize(0.0, 600.0);
        assert_eq!(dims.scale, 1.0);
        assert_eq!(stage.scale(), 1.0);
    }
}
