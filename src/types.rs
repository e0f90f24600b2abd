use std::ops::{Add, AddAssign, Mul, Sub};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length_sq(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (other - self).length()
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// Viewport size in logical pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    pub fn contains(&self, pos: Vec2) -> bool {
        (0.0..=self.width).contains(&pos.x) && (0.0..=self.height).contains(&pos.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    /// Units per frame at the 60 Hz reference rate.
    pub vel: Vec2,
}

/// A connection between two particles, `a < b`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
    pub a: usize,
    pub b: usize,
    pub alpha: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorId {
    Background,
    Dot,
    Line,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FieldStats {
    pub particles: usize,
    pub edges: usize,
    pub candidates_avg: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    mod vec2_length {
        use super::*;

        #[test]
        fn calculates_length_squared() {
            let v = Vec2::new(3.0, 4.0);
            assert_eq!(v.length_sq(), 25.0);
        }

        #[test]
        fn calculates_length() {
            let v = Vec2::new(3.0, 4.0);
            assert_eq!(v.length(), 5.0);
        }

        #[test]
        fn distance_is_symmetric() {
            let a = Vec2::new(1.0, 1.0);
            let b = Vec2::new(4.0, 5.0);
            assert_eq!(a.distance(b), 5.0);
            assert_eq!(b.distance(a), 5.0);
        }
    }

    mod vec2_ops {
        use super::*;

        #[test]
        fn add_assign_modifies_in_place() {
            let mut a = Vec2::new(1.0, 2.0);
            a += Vec2::new(3.0, 4.0);
            assert_eq!(a, Vec2::new(4.0, 6.0));
        }

        #[test]
        fn scales_by_scalar() {
            assert_eq!(Vec2::new(2.0, -3.0) * 2.0, Vec2::new(4.0, -6.0));
        }
    }

    mod bounds {
        use super::*;

        #[test]
        fn negative_sizes_clamp_to_zero() {
            let b = Bounds::new(-5.0, 10.0);
            assert_eq!(b.width, 0.0);
            assert_eq!(b.height, 10.0);
        }

        #[test]
        fn contains_is_inclusive() {
            let b = Bounds::new(10.0, 20.0);
            assert!(b.contains(Vec2::new(0.0, 0.0)));
            assert!(b.contains(Vec2::new(10.0, 20.0)));
            assert!(!b.contains(Vec2::new(10.1, 5.0)));
            assert!(!b.contains(Vec2::new(5.0, -0.1)));
        }
    }
}
