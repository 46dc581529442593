// Math utilities and helper functions

use glam::{IVec2, Vec2};

/// Unit vector of an integer direction, or zero for the zero vector
pub fn unit_direction(direction: IVec2) -> Vec2 {
    direction.as_vec2().normalize_or_zero()
}

/// Center of a top-left anchored rectangle
pub fn rect_center(x: f32, y: f32, width: f32, height: f32) -> Vec2 {
    Vec2::new(x + width / 2.0, y + height / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_unit_direction() {
        assert_eq!(unit_direction(IVec2::new(1, 0)), Vec2::X);
        assert_eq!(unit_direction(IVec2::ZERO), Vec2::ZERO);

        let diagonal = unit_direction(IVec2::new(-1, 1));
        assert_relative_eq!(diagonal.length(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(diagonal.x, -std::f32::consts::FRAC_1_SQRT_2, epsilon = 1e-6);
    }

    #[test]
    fn test_rect_center() {
        assert_eq!(rect_center(250.0, 250.0, 32.0, 32.0), Vec2::new(266.0, 266.0));
        assert_eq!(rect_center(-20.0, 0.0, 20.0, 576.0), Vec2::new(-10.0, 288.0));
    }
}
