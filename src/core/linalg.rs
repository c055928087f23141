//! Small fixed-size linear algebra for the two-disc state (x1, y1, x2, y2).

use nalgebra::{Matrix2, Matrix4, Vector4};

/// Kronecker product of two 2×2 matrices.
///
/// Block `(a, b)` of the result is `outer[(a, b)] * inner`, so `outer` couples
/// the two discs and `inner` acts within one disc's (x, y) plane.
pub fn kron2(outer: &Matrix2<f64>, inner: &Matrix2<f64>) -> Matrix4<f64> {
    Matrix4::from_fn(|r, c| outer[(r / 2, c / 2)] * inner[(r % 2, c % 2)])
}

/// Matrix exponential via Padé approximation with scaling and squaring.
///
/// Returns `None` when any entry of the result is not finite.
pub fn expm4(m: &Matrix4<f64>) -> Option<Matrix4<f64>> {
    let e = m.exp();
    is_finite4(&e).then_some(e)
}

#[inline]
pub fn is_finite4(m: &Matrix4<f64>) -> bool {
    m.iter().all(|v| v.is_finite())
}

#[inline]
pub fn is_finite_vec4(v: &Vector4<f64>) -> bool {
    v.iter().all(|x| x.is_finite())
}
