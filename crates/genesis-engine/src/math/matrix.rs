use core::ops::Mul;

use super::vector::{Vec2, Vector};

/// Square `N x N` matrix stored row-major.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Matrix<const N: usize> {
    rows: [[f32; N]; N],
}

pub type Mat2 = Matrix<2>;
pub type Mat3 = Matrix<3>;
pub type Mat4 = Matrix<4>;

impl<const N: usize> Matrix<N> {
    #[inline]
    pub const fn from_rows(rows: [[f32; N]; N]) -> Self {
        Self { rows }
    }

    pub fn identity() -> Self {
        let mut rows = [[0.0; N]; N];
        for (i, row) in rows.iter_mut().enumerate() {
            row[i] = 1.0;
        }
        Self { rows }
    }

    /// Builds a matrix from `N * N` row-major values.
    ///
    /// Returns `None` if `values.len() != N * N`.
    pub fn from_flat(values: &[f32]) -> Option<Self> {
        if values.len() != N * N {
            return None;
        }
        let mut rows = [[0.0; N]; N];
        for (row, chunk) in rows.iter_mut().zip(values.chunks_exact(N)) {
            row.copy_from_slice(chunk);
        }
        Some(Self { rows })
    }

    /// Row-major view of the `N * N` values.
    #[inline]
    pub fn as_flat(&self) -> &[f32] {
        self.rows.as_flattened()
    }

    #[inline]
    pub fn to_flat(&self) -> Vec<f32> {
        self.as_flat().to_vec()
    }

    /// Panics if `index >= N`.
    #[inline]
    pub fn row(&self, index: usize) -> Vector<N> {
        Vector(self.rows[index])
    }

    /// Panics if `index >= N`.
    pub fn column(&self, index: usize) -> Vector<N> {
        let mut out = [0.0; N];
        for (o, row) in out.iter_mut().zip(self.rows.iter()) {
            *o = row[index];
        }
        Vector(out)
    }

    #[inline]
    pub fn set_row(&mut self, index: usize, row: Vector<N>) {
        self.rows[index] = row.0;
    }

    pub fn set_column(&mut self, index: usize, column: Vector<N>) {
        for (row, value) in self.rows.iter_mut().zip(column.0) {
            row[index] = value;
        }
    }

    #[inline]
    pub fn get(&self, row: usize, column: usize) -> f32 {
        self.rows[row][column]
    }

    pub fn transposed(&self) -> Self {
        let mut rows = [[0.0; N]; N];
        for (r, row) in rows.iter_mut().enumerate() {
            *row = self.column(r).0;
        }
        Self { rows }
    }

    pub fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.as_flat()
            .iter()
            .zip(other.as_flat())
            .all(|(a, b)| (a - b).abs() <= epsilon)
    }
}

impl<const N: usize> Default for Matrix<N> {
    fn default() -> Self {
        Self::identity()
    }
}

/// Matrix composition: `(a * b)[r][c] = row_r(a) · column_c(b)`.
impl<const N: usize> Mul for Matrix<N> {
    type Output = Matrix<N>;

    fn mul(self, rhs: Matrix<N>) -> Matrix<N> {
        let mut rows = [[0.0; N]; N];
        for (r, row) in rows.iter_mut().enumerate() {
            for (c, value) in row.iter_mut().enumerate() {
                *value = self.row(r).dot(rhs.column(c));
            }
        }
        Matrix { rows }
    }
}

/// Matrix-vector product: `(m * v)[r] = row_r(m) · v`.
///
/// This treats `v` as a column vector, so it does not apply the translation
/// stored in the last row. Points go through [`Mat3::transform_point`] or
/// `v * m`.
impl<const N: usize> Mul<Vector<N>> for Matrix<N> {
    type Output = Vector<N>;

    fn mul(self, rhs: Vector<N>) -> Vector<N> {
        let mut out = [0.0; N];
        for (r, o) in out.iter_mut().enumerate() {
            *o = self.row(r).dot(rhs);
        }
        Vector(out)
    }
}

/// Row-vector product: `(v * m)[c] = v · column_c(m)`.
impl<const N: usize> Mul<Matrix<N>> for Vector<N> {
    type Output = Vector<N>;

    fn mul(self, rhs: Matrix<N>) -> Vector<N> {
        let mut out = [0.0; N];
        for (c, o) in out.iter_mut().enumerate() {
            *o = self.dot(rhs.column(c));
        }
        Vector(out)
    }
}

// ── 2D affine helpers ─────────────────────────────────────────────────────

impl Mat3 {
    pub fn translation(offset: Vec2) -> Self {
        Self::from_rows([
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [offset.x(), offset.y(), 1.0],
        ])
    }

    /// Counter-clockwise rotation by `radians` (in a y-up frame).
    pub fn rotation(radians: f32) -> Self {
        let (s, c) = radians.sin_cos();
        Self::from_rows([[c, s, 0.0], [-s, c, 0.0], [0.0, 0.0, 1.0]])
    }

    pub fn scaling(scale: Vec2) -> Self {
        Self::from_rows([
            [scale.x(), 0.0, 0.0],
            [0.0, scale.y(), 0.0],
            [0.0, 0.0, 1.0],
        ])
    }

    /// Maps pixel coordinates (origin top-left, +y down) to clip space.
    pub fn projection(width: f32, height: f32) -> Self {
        Self::from_rows([
            [2.0 / width, 0.0, 0.0],
            [0.0, -2.0 / height, 0.0],
            [-1.0, 1.0, 1.0],
        ])
    }

    /// Transforms the point `(x, y, 1)`.
    #[inline]
    pub fn transform_point(&self, point: Vec2) -> Vec2 {
        (point.extend(1.0) * *self).truncate()
    }

    /// Transforms the direction `(x, y, 0)`; translation is ignored.
    #[inline]
    pub fn transform_vector(&self, vector: Vec2) -> Vec2 {
        (vector.extend(0.0) * *self).truncate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    const EPS: f32 = 1e-6;

    fn close(a: Vec2, b: Vec2) -> bool {
        (a.x() - b.x()).abs() <= EPS && (a.y() - b.y()).abs() <= EPS
    }

    // ── layout ────────────────────────────────────────────────────────────

    #[test]
    fn flat_is_row_major() {
        let m = Mat2::from_rows([[1.0, 2.0], [3.0, 4.0]]);
        assert_eq!(m.as_flat(), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(Mat2::from_flat(&[1.0, 2.0, 3.0, 4.0]), Some(m));
    }

    #[test]
    fn from_flat_rejects_wrong_length() {
        assert!(Mat3::from_flat(&[0.0; 8]).is_none());
        assert!(Mat3::from_flat(&[0.0; 10]).is_none());
    }

    #[test]
    fn rows_and_columns() {
        let mut m = Mat3::from_flat(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]).unwrap();
        assert_eq!(m.row(1), Vec3::new(4.0, 5.0, 6.0));
        assert_eq!(m.column(2), Vec3::new(3.0, 6.0, 9.0));

        m.set_row(0, Vec3::new(0.0, 0.0, 0.0));
        m.set_column(1, Vec3::new(-1.0, -2.0, -3.0));
        assert_eq!(m.as_flat(), &[0.0, -1.0, 0.0, 4.0, -2.0, 6.0, 7.0, -3.0, 9.0]);
    }

    #[test]
    fn identity_has_unit_diagonal() {
        let m = Mat4::identity();
        for i in 0..4 {
            for j in 0..4 {
                assert_eq!(m.get(i, j), if i == j { 1.0 } else { 0.0 });
            }
        }
    }

    // ── products ──────────────────────────────────────────────────────────

    #[test]
    fn matrix_product_is_row_times_column() {
        let a = Mat2::from_rows([[1.0, 2.0], [3.0, 4.0]]);
        let b = Mat2::from_rows([[5.0, 6.0], [7.0, 8.0]]);
        assert_eq!((a * b).as_flat(), &[19.0, 22.0, 43.0, 50.0]);
        assert_eq!((b * a).as_flat(), &[23.0, 34.0, 31.0, 46.0]);
    }

    #[test]
    fn matrix_vector_product() {
        let m = Mat2::from_rows([[1.0, 2.0], [3.0, 4.0]]);
        assert_eq!(m * Vec2::new(1.0, 1.0), Vec2::new(3.0, 7.0));
        assert_eq!(Vec2::new(1.0, 1.0) * m, Vec2::new(4.0, 6.0));
    }

    #[test]
    fn identity_is_neutral() {
        let m = Mat3::from_flat(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]).unwrap();
        assert_eq!(m * Mat3::identity(), m);
        assert_eq!(Mat3::identity() * m, m);
        assert_eq!(m.transposed().transposed(), m);
    }

    // ── affine ────────────────────────────────────────────────────────────

    #[test]
    fn translate_moves_origin() {
        let m = Mat3::identity() * Mat3::translation(Vec2::new(5.0, 0.0));
        assert!(close(m.transform_point(Vec2::new(0.0, 0.0)), Vec2::new(5.0, 0.0)));
        assert_eq!(Vec3::new(0.0, 0.0, 1.0) * m, Vec3::new(5.0, 0.0, 1.0));
    }

    #[test]
    fn column_product_skips_the_translation_row() {
        let m = Mat3::translation(Vec2::new(5.0, 0.0));
        let origin = Vec3::new(0.0, 0.0, 1.0);

        assert_eq!(m * origin, origin);
        assert_eq!(origin * m, Vec3::new(5.0, 0.0, 1.0));
        assert!(close(m.transform_point(Vec2::new(0.0, 0.0)), Vec2::new(5.0, 0.0)));
    }

    #[test]
    fn translate_ignores_directions() {
        let m = Mat3::translation(Vec2::new(5.0, 3.0));
        assert!(close(m.transform_vector(Vec2::new(1.0, 0.0)), Vec2::new(1.0, 0.0)));
    }

    #[test]
    fn rotate_quarter_turn() {
        let m = Mat3::rotation(std::f32::consts::FRAC_PI_2);
        assert!(close(m.transform_vector(Vec2::new(1.0, 0.0)), Vec2::new(0.0, 1.0)));
        assert!(close(m.transform_vector(Vec2::new(0.0, 1.0)), Vec2::new(-1.0, 0.0)));
    }

    #[test]
    fn composition_applies_left_first() {
        let s = Mat3::scaling(Vec2::new(2.0, 2.0));
        let t = Mat3::translation(Vec2::new(1.0, 0.0));
        // scale then translate
        assert!(close((s * t).transform_point(Vec2::new(1.0, 0.0)), Vec2::new(3.0, 0.0)));
        // translate then scale
        assert!(close((t * s).transform_point(Vec2::new(1.0, 0.0)), Vec2::new(4.0, 0.0)));
    }

    #[test]
    fn projection_maps_corners_to_clip_space() {
        let p = Mat3::projection(800.0, 600.0);
        assert!(close(p.transform_point(Vec2::new(0.0, 0.0)), Vec2::new(-1.0, 1.0)));
        assert!(close(p.transform_point(Vec2::new(800.0, 600.0)), Vec2::new(1.0, -1.0)));
        assert!(close(p.transform_point(Vec2::new(400.0, 300.0)), Vec2::new(0.0, 0.0)));
    }
}
