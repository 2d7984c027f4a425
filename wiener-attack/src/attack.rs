//! Candidate evaluation and the attack driver.

use std::time::{Duration, Instant};

use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_traits::{One, Zero};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cf::{all_convergents, expand};
use crate::quadratic::integer_roots;

/// Rejected input. Exhausting every convergent without recovering the key
/// is not an error; it is an `AttackResult` with `recovered: None`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("modulus must be nonzero")]
    ZeroModulus,
    #[error("public exponent must be nonzero")]
    ZeroExponent,
    #[error("public exponent {e} must be less than the modulus {n}")]
    ExponentNotReduced { e: BigUint, n: BigUint },
}

/// Secrets recovered from an accepting convergent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveredKey {
    pub p: BigUint,
    pub q: BigUint,
    /// Recovered private exponent.
    pub d: BigUint,
    /// Multiplier from the identity `e*d = k*phi + 1`.
    pub k: BigUint,
    /// Index of the accepting convergent.
    pub convergent_index: usize,
}

/// Outcome of one attack run.
#[derive(Debug, Clone)]
pub struct AttackResult {
    pub n: BigUint,
    pub e: BigUint,
    /// `None` when every convergent was tested without success.
    pub recovered: Option<RecoveredKey>,
    /// Convergents evaluated, including the accepting one.
    pub convergents_tested: usize,
    pub duration: Duration,
}

/// Test one convergent `k/d` against the public key `(n, e)`.
///
/// When `k` divides `e*d - 1` exactly, the quotient is a candidate for
/// `phi(n)`, and the factors of `n` must then be the roots of
/// `x^2 - (n - phi + 1)x + n`. Returns the factor pair with `p <= q`, or
/// `None` for any candidate that fails the algebra.
pub fn evaluate(
    n: &BigUint,
    e: &BigUint,
    k: &BigUint,
    d: &BigUint,
) -> Option<(BigUint, BigUint)> {
    if k.is_zero() {
        return None;
    }
    let ed = e * d;
    if ed.is_zero() {
        return None;
    }
    let ed_minus_1 = ed - BigUint::one();
    if !(&ed_minus_1 % k).is_zero() {
        return None;
    }
    let phi = ed_minus_1 / k;

    let n_int = BigInt::from(n.clone());
    let b = BigInt::from(phi) - &n_int - BigInt::one();
    let roots = integer_roots(&BigInt::one(), &b, &n_int);
    if roots.len() != 2 {
        return None;
    }
    let p = roots[0].mod_floor(&n_int).to_biguint()?;
    let q = roots[1].mod_floor(&n_int).to_biguint()?;
    if p.is_zero() || q.is_zero() || &p * &q != *n {
        return None;
    }
    if p <= q {
        Some((p, q))
    } else {
        Some((q, p))
    }
}

/// Run the attack against a public key `(n, e)`.
///
/// Expands `e/n` once, walks the convergents in index order, and stops at
/// the first candidate that factors `n`.
pub fn attack(n: &BigUint, e: &BigUint) -> Result<AttackResult, InputError> {
    if n.is_zero() {
        return Err(InputError::ZeroModulus);
    }
    if e.is_zero() {
        return Err(InputError::ZeroExponent);
    }
    if e >= n {
        return Err(InputError::ExponentNotReduced {
            e: e.clone(),
            n: n.clone(),
        });
    }

    let start = Instant::now();
    let terms = expand(e, n);
    let convergents = all_convergents(&terms);
    log::debug!("expanded e/n into {} terms", terms.len());

    let mut recovered = None;
    let mut tested = 0;
    for (index, conv) in convergents.iter().enumerate() {
        tested = index + 1;
        if let Some((p, q)) = evaluate(n, e, &conv.k, &conv.d) {
            log::info!("factored n after {} convergents (d = {})", tested, conv.d);
            recovered = Some(RecoveredKey {
                p,
                q,
                d: conv.d.clone(),
                k: conv.k.clone(),
                convergent_index: index,
            });
            break;
        }
    }

    Ok(AttackResult {
        n: n.clone(),
        e: e.clone(),
        recovered,
        convergents_tested: tested,
        duration: start.elapsed(),
    })
}

/// Attack many keys in parallel. Results keep the input order.
pub fn attack_batch(keys: &[(BigUint, BigUint)]) -> Vec<Result<AttackResult, InputError>> {
    keys.par_iter().map(|(n, e)| attack(n, e)).collect()
}

/// Flat, serializable view of an attack run with decimal string fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttackReport {
    pub n: String,
    pub e: String,
    pub bits: u64,
    pub success: bool,
    pub p: Option<String>,
    pub q: Option<String>,
    pub d: Option<String>,
    pub k: Option<String>,
    pub convergent_index: Option<usize>,
    pub convergents_tested: usize,
    pub duration: Duration,
}

impl From<&AttackResult> for AttackReport {
    fn from(result: &AttackResult) -> Self {
        let rec = result.recovered.as_ref();
        AttackReport {
            n: result.n.to_string(),
            e: result.e.to_string(),
            bits: result.n.bits(),
            success: rec.is_some(),
            p: rec.map(|r| r.p.to_string()),
            q: rec.map(|r| r.q.to_string()),
            d: rec.map(|r| r.d.to_string()),
            k: rec.map(|r| r.k.to_string()),
            convergent_index: rec.map(|r| r.convergent_index),
            convergents_tested: result.convergents_tested,
            duration: result.duration,
        }
    }
}
