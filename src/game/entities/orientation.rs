// 8-way compass used for sprite rows and arrow flight

use glam::IVec2;
use std::f32::consts::PI;

/// Facing direction, y growing toward the bottom of the stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    East,
    North,
    West,
    South,
    SouthEast,
    SouthWest,
    NorthWest,
    NorthEast,
}

impl Orientation {
    /// Compass direction of a movement vector; `None` when standing still
    pub fn from_movement(movement: IVec2) -> Option<Self> {
        match (movement.x.signum(), movement.y.signum()) {
            (1, 0) => Some(Self::East),
            (0, -1) => Some(Self::North),
            (-1, 0) => Some(Self::West),
            (0, 1) => Some(Self::South),
            (1, 1) => Some(Self::SouthEast),
            (-1, 1) => Some(Self::SouthWest),
            (-1, -1) => Some(Self::NorthWest),
            (1, -1) => Some(Self::NorthEast),
            _ => None,
        }
    }

    pub fn vector(self) -> IVec2 {
        match self {
            Self::East => IVec2::new(1, 0),
            Self::North => IVec2::new(0, -1),
            Self::West => IVec2::new(-1, 0),
            Self::South => IVec2::new(0, 1),
            Self::SouthEast => IVec2::new(1, 1),
            Self::SouthWest => IVec2::new(-1, 1),
            Self::NorthWest => IVec2::new(-1, -1),
            Self::NorthEast => IVec2::new(1, -1),
        }
    }

    /// Sprite sheet row of the plain animation facing this way
    pub fn row(self) -> usize {
        match self {
            Self::East => 0,
            Self::North => 1,
            Self::West => 2,
            Self::South => 3,
            Self::SouthEast => 4,
            Self::SouthWest => 5,
            Self::NorthWest => 6,
            Self::NorthEast => 7,
        }
    }

    /// Rotation of an arrow flying this way, in radians
    pub fn angle(self) -> f32 {
        match self {
            Self::East => 0.0,
            Self::SouthEast => PI / 4.0,
            Self::South => PI / 2.0,
            Self::SouthWest => PI * 3.0 / 4.0,
            Self::West => PI,
            Self::NorthWest => PI * 5.0 / 4.0,
            Self::North => PI * 3.0 / 2.0,
            Self::NorthEast => PI * 7.0 / 4.0,
        }
    }
}

impl Default for Orientation {
    fn default() -> Self {
        Self::South
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Orientation; 8] = [
        Orientation::East,
        Orientation::North,
        Orientation::West,
        Orientation::South,
        Orientation::SouthEast,
        Orientation::SouthWest,
        Orientation::NorthWest,
        Orientation::NorthEast,
    ];

    #[test]
    fn test_vector_round_trips() {
        for orientation in ALL {
            assert_eq!(Orientation::from_movement(orientation.vector()), Some(orientation));
        }
        assert_eq!(Orientation::from_movement(IVec2::ZERO), None);
    }

    #[test]
    fn test_rows_are_distinct() {
        let mut rows: Vec<_> = ALL.iter().map(|o| o.row()).collect();
        rows.sort_unstable();
        assert_eq!(rows, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn test_angle_matches_vector() {
        for orientation in ALL {
            let v = orientation.vector().as_vec2().normalize();
            let angle = orientation.angle();
            assert!((angle.cos() - v.x).abs() < 1e-5, "{orientation:?}");
            assert!((angle.sin() - v.y).abs() < 1e-5, "{orientation:?}");
        }
    }
}
