//! Wiener's continued fraction attack on RSA.
//!
//! When the private exponent satisfies `d < n^(1/4) / 3` and the primes are
//! balanced (`q < p < 2q`), the fraction `k/d` from the key identity
//! `e*d = k*phi(n) + 1` appears among the convergents of `e/n`. Expanding
//! `e/n` as a continued fraction and testing each convergent therefore
//! recovers `d` and factors `n`.

pub mod attack;
pub mod cf;
pub mod quadratic;

pub use attack::{
    attack, attack_batch, evaluate, AttackReport, AttackResult, InputError, RecoveredKey,
};
pub use cf::{all_convergents, convergent_at, expand, Convergent};
pub use quadratic::integer_roots;
