use crate::util::fixed::Fp;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

/// Ground-plane vector (world X and Z) in fixed point
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Vec2 {
    pub x: Fp,
    pub y: Fp,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: Fp::ZERO, y: Fp::ZERO };
    pub const RIGHT: Vec2 = Vec2 { x: Fp::ONE, y: Fp::ZERO };
    pub const UP: Vec2 = Vec2 { x: Fp::ZERO, y: Fp::ONE };

    #[inline]
    pub const fn new(x: Fp, y: Fp) -> Self {
        Self { x, y }
    }

    #[inline]
    pub const fn from_ints(x: i64, y: i64) -> Self {
        Self { x: Fp::from_int(x), y: Fp::from_int(y) }
    }

    #[inline]
    pub fn from_angle(angle: Fp) -> Self {
        Self { x: angle.cos(), y: angle.sin() }
    }

    #[inline]
    pub fn length_sq(&self) -> Fp {
        self.x * self.x + self.y * self.y
    }

    #[inline]
    pub fn length(&self) -> Fp {
        self.length_sq().sqrt()
    }

    /// Unit vector, or zero for a zero vector
    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > Fp::ZERO {
            Self { x: self.x / len, y: self.y / len }
        } else {
            Self::ZERO
        }
    }

    /// Returns normalized vector and original length
    pub fn normalize_with_length(&self) -> (Self, Fp) {
        let len = self.length();
        if len > Fp::ZERO {
            (Self { x: self.x / len, y: self.y / len }, len)
        } else {
            (Self::ZERO, Fp::ZERO)
        }
    }

    #[inline]
    pub fn dot(&self, other: Vec2) -> Fp {
        self.x * other.x + self.y * other.y
    }

    /// 2D cross product (returns scalar z-component)
    #[inline]
    pub fn cross(&self, other: Vec2) -> Fp {
        self.x * other.y - self.y * other.x
    }

    #[inline]
    pub fn distance_to(&self, other: Vec2) -> Fp {
        (*self - other).length()
    }

    #[inline]
    pub fn distance_sq_to(&self, other: Vec2) -> Fp {
        (*self - other).length_sq()
    }

    pub fn lerp(&self, other: Vec2, t: Fp) -> Self {
        *self + (other - *self) * t
    }

    pub fn rotate(&self, angle: Fp) -> Self {
        let (sin, cos) = (angle.sin(), angle.cos());
        Self {
            x: self.x * cos - self.y * sin,
            y: self.x * sin + self.y * cos,
        }
    }

    /// Returns angle in radians
    pub fn angle(&self) -> Fp {
        Fp::atan2(self.y, self.x)
    }

    /// Move toward `target` by at most `max_step`
    pub fn move_towards(&self, target: Vec2, max_step: Fp) -> Self {
        let (direction, distance) = (target - *self).normalize_with_length();
        if distance <= max_step {
            target
        } else {
            *self + direction * max_step
        }
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.x == Fp::ZERO && self.y == Fp::ZERO
    }

    /// Check if vector is approximately equal to another
    pub fn approx_eq(&self, other: Vec2, epsilon: Fp) -> bool {
        (self.x - other.x).abs() <= epsilon && (self.y - other.y).abs() <= epsilon
    }
}

impl Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

impl Mul<Fp> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: Fp) -> Self {
        Self { x: self.x * rhs, y: self.y * rhs }
    }
}

impl Div<Fp> for Vec2 {
    type Output = Self;
    fn div(self, rhs: Fp) -> Self {
        Self { x: self.x / rhs, y: self.y / rhs }
    }
}

impl Neg for Vec2 {
    type Output = Self;
    fn neg(self) -> Self {
        Self { x: -self.x, y: -self.y }
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl MulAssign<Fp> for Vec2 {
    fn mul_assign(&mut self, rhs: Fp) {
        self.x *= rhs;
        self.y *= rhs;
    }
}

/// World-space point with height, used for chest-height line of sight
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Vec3 {
    pub x: Fp,
    pub y: Fp,
    pub z: Fp,
}

impl Vec3 {
    #[inline]
    pub const fn new(x: Fp, y: Fp, z: Fp) -> Self {
        Self { x, y, z }
    }

    /// Lift a ground-plane point to `height`
    #[inline]
    pub const fn from_ground(ground: Vec2, height: Fp) -> Self {
        Self { x: ground.x, y: height, z: ground.y }
    }

    #[inline]
    pub const fn ground(&self) -> Vec2 {
        Vec2 { x: self.x, y: self.z }
    }

    pub fn distance_sq_to(&self, other: Vec3) -> Fp {
        let (dx, dy, dz) = (self.x - other.x, self.y - other.y, self.z - other.z);
        dx * dx + dy * dy + dz * dz
    }

    pub fn lerp(&self, other: Vec3, t: Fp) -> Self {
        Self {
            x: Fp::lerp(self.x, other.x, t),
            y: Fp::lerp(self.y, other.y, t),
            z: Fp::lerp(self.z, other.z, t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eps() -> Fp {
        Fp::from_milli(3)
    }

    fn approx(a: Fp, b: Fp) -> bool {
        (a - b).abs() <= eps()
    }

    #[test]
    fn test_length() {
        let v = Vec2::from_ints(3, 4);
        assert_eq!(v.length_sq(), Fp::from_int(25));
        assert_eq!(v.length(), Fp::from_int(5));
    }

    #[test]
    fn test_normalize() {
        let n = Vec2::from_ints(3, 4).normalize();
        assert!(approx(n.x, Fp::from_milli(600)));
        assert!(approx(n.y, Fp::from_milli(800)));
        assert!(approx(n.length(), Fp::ONE));
    }

    #[test]
    fn test_normalize_zero() {
        assert_eq!(Vec2::ZERO.normalize(), Vec2::ZERO);
        assert_eq!(Vec2::ZERO.normalize_with_length(), (Vec2::ZERO, Fp::ZERO));
    }

    #[test]
    fn test_dot_and_cross() {
        let a = Vec2::from_ints(1, 2);
        let b = Vec2::from_ints(3, 4);
        assert_eq!(a.dot(b), Fp::from_int(11));
        assert_eq!(Vec2::RIGHT.cross(Vec2::UP), Fp::ONE);
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let rotated = Vec2::RIGHT.rotate(Fp::HALF_PI);
        assert!(rotated.approx_eq(Vec2::UP, eps()));
    }

    #[test]
    fn test_angle_round_trip() {
        let angle = Fp::from_milli(1200);
        let v = Vec2::from_angle(angle);
        assert!(approx(v.angle(), angle));
    }

    #[test]
    fn test_move_towards() {
        let start = Vec2::ZERO;
        let target = Vec2::from_ints(10, 0);
        assert_eq!(start.move_towards(target, Fp::from_int(4)), Vec2::from_ints(4, 0));
        assert_eq!(start.move_towards(target, Fp::from_int(40)), target);
    }

    #[test]
    fn test_vec3_ground_projection() {
        let ground = Vec2::from_ints(2, -5);
        let lifted = Vec3::from_ground(ground, Fp::ONE);
        assert_eq!(lifted.ground(), ground);
        assert_eq!(lifted.y, Fp::ONE);
    }
}
