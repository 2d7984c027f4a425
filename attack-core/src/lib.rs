//! Shared big-integer arithmetic and RSA key tooling for the attack crates.

use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::Rng;

/// Floor of the integer square root, by Newton's iteration.
///
/// The starting estimate `2^ceil(bits/2)` is never below `sqrt(n)`, and the
/// iteration decreases monotonically until it crosses the floor.
pub fn isqrt(n: &BigUint) -> BigUint {
    if n.is_zero() {
        return BigUint::zero();
    }
    let bits = n.bits();
    let mut x = BigUint::one() << ((bits + 1) / 2);
    loop {
        let next = (&x + n / &x) >> 1;
        if next >= x {
            return x;
        }
        x = next;
    }
}

/// Returns the exact root when `n` is a perfect square, `None` otherwise.
pub fn is_perfect_square(n: &BigUint) -> Option<BigUint> {
    let root = isqrt(n);
    if &root * &root == *n {
        Some(root)
    } else {
        None
    }
}

/// Random draw in `[0, bound)`.
///
/// Samples one byte past the width of `bound` before reducing.
pub fn random_below(bound: &BigUint, rng: &mut impl Rng) -> BigUint {
    assert!(!bound.is_zero(), "random_below requires a nonzero bound");
    let num_bytes = (bound.bits() as usize + 7) / 8 + 1;
    let mut bytes = vec![0u8; num_bytes];
    rng.fill(&mut bytes[..]);
    BigUint::from_bytes_be(&bytes) % bound
}

/// Miller-Rabin probabilistic primality test with random witnesses.
pub fn is_probably_prime(n: &BigUint, rounds: u32) -> bool {
    let one = BigUint::one();
    let two = BigUint::from(2u32);
    if *n < two {
        return false;
    }
    if *n == two || *n == BigUint::from(3u32) {
        return true;
    }
    if n.is_even() {
        return false;
    }

    // n - 1 = 2^r * d with d odd
    let n_minus_1 = n - &one;
    let mut d = n_minus_1.clone();
    let mut r = 0u32;
    while d.is_even() {
        d >>= 1u32;
        r += 1;
    }

    let mut rng = rand::thread_rng();
    // witnesses drawn from [2, n-2]
    let span = n - &BigUint::from(3u32);

    'witness: for _ in 0..rounds {
        let a = random_below(&span, &mut rng) + &two;
        let mut x = a.modpow(&d, n);
        if x == one || x == n_minus_1 {
            continue 'witness;
        }
        for _ in 0..r - 1 {
            x = x.modpow(&two, n);
            if x == n_minus_1 {
                continue 'witness;
            }
        }
        return false;
    }

    true
}

/// Random prime with exactly `bits` bits.
pub fn random_prime(bits: u32, rng: &mut impl Rng) -> BigUint {
    assert!(bits >= 2, "a prime needs at least 2 bits");
    let num_bytes = (bits as usize + 7) / 8;
    let excess = (num_bytes * 8) as u32 - bits;
    loop {
        let mut bytes = vec![0u8; num_bytes];
        rng.fill(&mut bytes[..]);
        // Trim to width, then pin the top bit for exact length and the
        // bottom bit for oddness.
        bytes[0] &= 0xffu8 >> excess;
        bytes[0] |= 1u8 << ((bits - 1) % 8);
        bytes[num_bytes - 1] |= 1;
        let candidate = BigUint::from_bytes_be(&bytes);
        debug_assert_eq!(candidate.bits(), u64::from(bits));
        if is_probably_prime(&candidate, 20) {
            return candidate;
        }
    }
}

/// Modular inverse by the extended Euclidean algorithm.
///
/// Returns `a^(-1) mod m` in `[0, m)`, or `None` when `gcd(a, m) != 1`.
pub fn mod_inverse(a: &BigUint, m: &BigUint) -> Option<BigUint> {
    if *m <= BigUint::one() {
        return None;
    }
    let m_int = BigInt::from(m.clone());
    let mut old_r = BigInt::from(a % m);
    let mut r = m_int.clone();
    let mut old_s = BigInt::one();
    let mut s = BigInt::zero();
    while !r.is_zero() {
        let q = &old_r / &r;
        let next_r = &old_r - &q * &r;
        old_r = std::mem::replace(&mut r, next_r);
        let next_s = &old_s - &q * &s;
        old_s = std::mem::replace(&mut s, next_s);
    }
    if old_r.is_one() {
        // old_s * a == 1 (mod m); mod_floor maps it into [0, m)
        old_s.mod_floor(&m_int).to_biguint()
    } else {
        None
    }
}

/// An RSA key with every component known, used as attack input and oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaKey {
    pub n: BigUint,
    pub e: BigUint,
    pub d: BigUint,
    pub p: BigUint,
    pub q: BigUint,
}

impl RsaKey {
    /// Euler's totient `(p-1)(q-1)`.
    pub fn phi(&self) -> BigUint {
        (&self.p - BigUint::one()) * (&self.q - BigUint::one())
    }

    /// Check the multiplicative structure: `n = p*q` and `e*d == 1 (mod phi)`.
    pub fn is_consistent(&self) -> bool {
        &self.p * &self.q == self.n && (&self.e * &self.d) % self.phi() == BigUint::one()
    }
}

/// Largest private exponent the continued fraction attack is guaranteed to
/// recover for modulus `n`: `floor(n^(1/4)) / 3`.
pub fn wiener_bound(n: &BigUint) -> BigUint {
    isqrt(&isqrt(n)) / BigUint::from(3u32)
}

/// Generate a key whose private exponent lies below `wiener_bound(n)`.
///
/// The primes share a bit length, which keeps them within a factor of two
/// of each other; `d` is drawn odd and coprime to `phi`, and `e` is its
/// inverse. Every key returned here is recoverable by the attack.
pub fn generate_vulnerable_key(bits: u32, rng: &mut impl Rng) -> RsaKey {
    assert!(bits >= 32, "vulnerable keys need at least 32 bits");
    let half = bits / 2;
    loop {
        let p = random_prime(half, rng);
        let q = random_prime(half, rng);
        if p == q {
            continue;
        }
        let n = &p * &q;
        let phi = (&p - BigUint::one()) * (&q - BigUint::one());
        let bound = wiener_bound(&n);
        if bound < BigUint::from(3u32) {
            continue;
        }

        // A fruitless streak means an unlucky phi; start over with fresh
        // primes rather than looping forever.
        for _ in 0..256 {
            let d = random_below(&bound, rng) | BigUint::one();
            if d < BigUint::from(3u32) || !d.gcd(&phi).is_one() {
                continue;
            }
            if let Some(e) = mod_inverse(&d, &phi) {
                let (p, q) = if p <= q { (p, q) } else { (q, p) };
                return RsaKey { n, e, d, p, q };
            }
        }
    }
}

/// Generate an ordinary key with the fixed public exponent `65537`.
pub fn generate_key(bits: u32, rng: &mut impl Rng) -> RsaKey {
    assert!(bits >= 32, "keys need at least 32 bits");
    let half = bits / 2;
    let e = BigUint::from(65537u32);
    loop {
        let p = random_prime(half, rng);
        let q = random_prime(half, rng);
        if p == q {
            continue;
        }
        let phi = (&p - BigUint::one()) * (&q - BigUint::one());
        if let Some(d) = mod_inverse(&e, &phi) {
            let n = &p * &q;
            let (p, q) = if p <= q { (p, q) } else { (q, p) };
            return RsaKey { n, e, d, p, q };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isqrt() {
        assert_eq!(isqrt(&BigUint::zero()), BigUint::zero());
        assert_eq!(isqrt(&BigUint::one()), BigUint::one());
        assert_eq!(isqrt(&BigUint::from(15u32)), BigUint::from(3u32));
        assert_eq!(isqrt(&BigUint::from(16u32)), BigUint::from(4u32));
        assert_eq!(isqrt(&BigUint::from(17u32)), BigUint::from(4u32));
        let big: BigUint = "100000000000000000000".parse().unwrap();
        let root: BigUint = "10000000000".parse().unwrap();
        assert_eq!(isqrt(&big), root);
    }

    #[test]
    fn test_is_perfect_square() {
        assert_eq!(is_perfect_square(&BigUint::zero()), Some(BigUint::zero()));
        assert_eq!(is_perfect_square(&BigUint::one()), Some(BigUint::one()));
        assert_eq!(
            is_perfect_square(&BigUint::from(144u32)),
            Some(BigUint::from(12u32))
        );
        assert_eq!(is_perfect_square(&BigUint::from(145u32)), None);
    }

    #[test]
    fn test_is_probably_prime() {
        assert!(is_probably_prime(&BigUint::from(7u32), 20));
        assert!(is_probably_prime(&BigUint::from(104729u32), 20));
        assert!(!is_probably_prime(&BigUint::from(1u32), 20));
        assert!(!is_probably_prime(&BigUint::from(100u32), 20));
        // Carmichael number: fools Fermat, not Miller-Rabin
        assert!(!is_probably_prime(&BigUint::from(561u32), 20));
    }

    #[test]
    fn test_random_below_stays_in_range() {
        let mut rng = rand::thread_rng();
        let bound = BigUint::from(1000u32);
        for _ in 0..100 {
            assert!(random_below(&bound, &mut rng) < bound);
        }
    }

    #[test]
    fn test_random_prime_bit_length() {
        let mut rng = rand::thread_rng();
        for bits in [16u32, 24, 32, 53] {
            let p = random_prime(bits, &mut rng);
            assert_eq!(p.bits(), u64::from(bits), "prime {} has the wrong width", p);
            assert!(p.is_odd());
            assert!(is_probably_prime(&p, 20));
        }
    }

    #[test]
    fn test_mod_inverse() {
        let inv = mod_inverse(&BigUint::from(3u32), &BigUint::from(7u32));
        assert_eq!(inv, Some(BigUint::from(5u32)));

        // gcd(6, 9) = 3: no inverse
        assert_eq!(mod_inverse(&BigUint::from(6u32), &BigUint::from(9u32)), None);

        let a = BigUint::from(17u32);
        let m = BigUint::from(43u32);
        let inv = mod_inverse(&a, &m).unwrap();
        assert_eq!((&a * &inv) % &m, BigUint::one());

        assert_eq!(
            mod_inverse(&BigUint::one(), &BigUint::from(5u32)),
            Some(BigUint::one())
        );
    }

    #[test]
    fn test_wiener_bound() {
        // isqrt(isqrt(90581)) = isqrt(300) = 17, and 17 / 3 = 5
        assert_eq!(wiener_bound(&BigUint::from(90581u32)), BigUint::from(5u32));
        assert_eq!(wiener_bound(&BigUint::from(10000u32)), BigUint::from(3u32));
    }

    #[test]
    fn test_key_consistency() {
        let key = RsaKey {
            n: BigUint::from(90581u32),
            e: BigUint::from(17993u32),
            d: BigUint::from(5u32),
            p: BigUint::from(239u32),
            q: BigUint::from(379u32),
        };
        assert_eq!(key.phi(), BigUint::from(89964u32));
        assert!(key.is_consistent());

        let mut broken = key.clone();
        broken.d = BigUint::from(7u32);
        assert!(!broken.is_consistent());
    }

    #[test]
    fn test_generate_vulnerable_key() {
        let mut rng = rand::thread_rng();
        let key = generate_vulnerable_key(64, &mut rng);
        assert!(key.is_consistent());
        assert!(key.p < key.q);
        assert_eq!(key.p.bits(), 32);
        assert_eq!(key.q.bits(), 32);
        assert!(is_probably_prime(&key.p, 20));
        assert!(is_probably_prime(&key.q, 20));
        assert!(key.d.is_odd());
        assert!(key.d >= BigUint::from(3u32));
        assert!(key.d <= wiener_bound(&key.n), "d = {} exceeds the bound", key.d);
    }

    #[test]
    fn test_generate_key_uses_standard_exponent() {
        let mut rng = rand::thread_rng();
        let key = generate_key(64, &mut rng);
        assert_eq!(key.e, BigUint::from(65537u32));
        assert!(key.is_consistent());
        assert!(key.p < key.q);
    }
}
