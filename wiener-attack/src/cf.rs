//! Continued fraction expansion and convergents.

use num_bigint::BigUint;
use num_traits::{One, Zero};

/// Continued fraction terms of `num/den`, by iterated Euclidean division.
///
/// Each term is the quotient of one Euclid step; the walk stops when the
/// remainder reaches zero, so inputs with a common factor expand exactly
/// like the reduced fraction. For `num < den` the leading term is 0.
pub fn expand(num: &BigUint, den: &BigUint) -> Vec<BigUint> {
    let mut a = num.clone();
    let mut b = den.clone();
    let mut terms = Vec::new();
    while !b.is_zero() {
        terms.push(&a / &b);
        let r = &a % &b;
        a = std::mem::replace(&mut b, r);
    }
    terms
}

/// A convergent `k/d` of the expansion of `e/n`.
///
/// `k` is the candidate multiplier and `d` the candidate private exponent
/// in the identity `e*d = k*phi + 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Convergent {
    pub k: BigUint,
    pub d: BigUint,
}

/// The convergent of the prefix `terms[0..=index]`, by the backward
/// recurrence.
///
/// Panics if `index` is out of bounds.
pub fn convergent_at(terms: &[BigUint], index: usize) -> Convergent {
    let mut num = terms[index].clone();
    let mut den = BigUint::one();
    for t in terms[..index].iter().rev() {
        let next = t * &num + &den;
        den = std::mem::replace(&mut num, next);
    }
    Convergent { k: num, d: den }
}

/// Every convergent of the expansion, in index order.
pub fn all_convergents(terms: &[BigUint]) -> Vec<Convergent> {
    (0..terms.len()).map(|i| convergent_at(terms, i)).collect()
}
