use core::ops::{Add, Div, Index, IndexMut, Mul, Neg, Sub};

/// Fixed-arity vector of `f32` components.
///
/// Arithmetic is componentwise; `* f32` and `/ f32` broadcast the scalar.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Vector<const N: usize>(pub [f32; N]);

pub type Vec2 = Vector<2>;
pub type Vec3 = Vector<3>;
pub type Vec4 = Vector<4>;

impl<const N: usize> Vector<N> {
    #[inline]
    pub const fn from_array(components: [f32; N]) -> Self {
        Self(components)
    }

    #[inline]
    pub const fn zero() -> Self {
        Self([0.0; N])
    }

    #[inline]
    pub const fn splat(value: f32) -> Self {
        Self([value; N])
    }

    #[inline]
    pub fn dot(self, rhs: Self) -> f32 {
        self.0.iter().zip(rhs.0.iter()).map(|(a, b)| a * b).sum()
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    #[inline]
    pub fn to_array(self) -> [f32; N] {
        self.0
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.0.iter().all(|c| c.is_finite())
    }

    #[inline]
    fn zip_with(self, rhs: Self, f: impl Fn(f32, f32) -> f32) -> Self {
        let mut out = self.0;
        for (o, r) in out.iter_mut().zip(rhs.0) {
            *o = f(*o, r);
        }
        Self(out)
    }

    #[inline]
    fn map(self, f: impl Fn(f32) -> f32) -> Self {
        Self(self.0.map(f))
    }
}

impl<const N: usize> Default for Vector<N> {
    fn default() -> Self {
        Self::zero()
    }
}

impl<const N: usize> From<[f32; N]> for Vector<N> {
    fn from(components: [f32; N]) -> Self {
        Self(components)
    }
}

impl Vec2 {
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self([x, y])
    }

    #[inline]
    pub const fn x(self) -> f32 {
        self.0[0]
    }

    #[inline]
    pub const fn y(self) -> f32 {
        self.0[1]
    }

    /// Homogeneous point `(x, y, 1)`.
    #[inline]
    pub const fn extend(self, w: f32) -> Vec3 {
        Vector([self.0[0], self.0[1], w])
    }
}

impl Vec3 {
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self([x, y, z])
    }

    #[inline]
    pub const fn x(self) -> f32 {
        self.0[0]
    }

    #[inline]
    pub const fn y(self) -> f32 {
        self.0[1]
    }

    #[inline]
    pub const fn z(self) -> f32 {
        self.0[2]
    }

    #[inline]
    pub const fn truncate(self) -> Vec2 {
        Vector([self.0[0], self.0[1]])
    }
}

impl Vec4 {
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self([x, y, z, w])
    }

    #[inline]
    pub const fn x(self) -> f32 {
        self.0[0]
    }

    #[inline]
    pub const fn y(self) -> f32 {
        self.0[1]
    }

    #[inline]
    pub const fn z(self) -> f32 {
        self.0[2]
    }

    #[inline]
    pub const fn w(self) -> f32 {
        self.0[3]
    }
}

impl<const N: usize> Index<usize> for Vector<N> {
    type Output = f32;
    #[inline]
    fn index(&self, index: usize) -> &f32 {
        &self.0[index]
    }
}

impl<const N: usize> IndexMut<usize> for Vector<N> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut f32 {
        &mut self.0[index]
    }
}

impl<const N: usize> Add for Vector<N> {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        self.zip_with(rhs, |a, b| a + b)
    }
}

impl<const N: usize> Sub for Vector<N> {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        self.zip_with(rhs, |a, b| a - b)
    }
}

impl<const N: usize> Mul for Vector<N> {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        self.zip_with(rhs, |a, b| a * b)
    }
}

impl<const N: usize> Div for Vector<N> {
    type Output = Self;
    #[inline]
    fn div(self, rhs: Self) -> Self {
        self.zip_with(rhs, |a, b| a / b)
    }
}

impl<const N: usize> Mul<f32> for Vector<N> {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: f32) -> Self {
        self.map(|a| a * rhs)
    }
}

impl<const N: usize> Div<f32> for Vector<N> {
    type Output = Self;
    #[inline]
    fn div(self, rhs: f32) -> Self {
        self.map(|a| a / rhs)
    }
}

impl<const N: usize> Add<f32> for Vector<N> {
    type Output = Self;
    #[inline]
    fn add(self, rhs: f32) -> Self {
        self.map(|a| a + rhs)
    }
}

impl<const N: usize> Sub<f32> for Vector<N> {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: f32) -> Self {
        self.map(|a| a - rhs)
    }
}

impl<const N: usize> Neg for Vector<N> {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        self.map(|a| -a)
    }
}
