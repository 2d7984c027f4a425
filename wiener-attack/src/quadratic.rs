//! Exact integer roots of quadratic polynomials.

use attack_core::is_perfect_square;
use num_bigint::BigInt;
use num_traits::Zero;

/// Distinct integer roots of `a*x^2 + b*x + c`, in ascending order.
///
/// A root is kept only when the discriminant is a perfect square and the
/// division by `2a` is exact, so irrational and non-integer rational roots
/// yield nothing. `a = 0` degenerates to the linear equation; a double
/// root appears once.
pub fn integer_roots(a: &BigInt, b: &BigInt, c: &BigInt) -> Vec<BigInt> {
    if a.is_zero() {
        // b*x + c = 0
        if b.is_zero() {
            return Vec::new();
        }
        let neg_c = -c;
        if (&neg_c % b).is_zero() {
            return vec![neg_c / b];
        }
        return Vec::new();
    }

    let disc = b * b - BigInt::from(4) * a * c;
    if disc < BigInt::zero() {
        return Vec::new();
    }
    let sq = match disc.to_biguint().and_then(|m| is_perfect_square(&m)) {
        Some(root) => BigInt::from(root),
        None => return Vec::new(),
    };

    let two_a = BigInt::from(2) * a;
    let mut roots = Vec::new();
    for numer in [-b - &sq, -b + &sq] {
        if (&numer % &two_a).is_zero() {
            roots.push(numer / &two_a);
        }
    }
    roots.sort();
    roots.dedup();
    roots
}
