//! Arithmetic over Z_q with a reduction strategy picked from the modulus.
//!
//! Two strategies are supported transparently:
//!
//! - **Power of two** (`q = 2^k`): every reduction is a mask, so wraparound of
//!   native `u64` arithmetic is harmless.
//! - **Odd** `q`: addition and subtraction use one conditional subtraction,
//!   multiplication uses Montgomery reduction with `R = 2^64`.
//!
//! All operations take and return canonical residues in `[0, q)`.
//!
//! # Example
//!
//! ```
//! use tfhe_engine::math::Modulus;
//!
//! let q = Modulus::new(17).unwrap();
//! assert_eq!(q.mul(5, 7), 1);
//! assert_eq!(q.sub(3, 5), 15);
//! assert_eq!(q.to_signed(15), -2);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{config_err, FheError, Result};

/// Largest supported modulus.
pub const MAX_MODULUS: u64 = 1 << 63;

/// Reduction strategy selected by [`Modulus::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reduction {
    /// `q = 2^k`, reduce by masking.
    PowerOfTwo,
    /// Odd `q`, conditional subtraction and Montgomery multiplication.
    Montgomery,
}

/// A validated modulus together with its precomputed reduction constants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct Modulus {
    q: u64,
    reduction: Reduction,
    /// `q - 1` when `q` is a power of two.
    mask: u64,
    /// `-q^{-1} mod 2^64` (odd moduli only).
    q_inv_neg: u64,
    /// `2^128 mod q` (odd moduli only).
    r_squared: u64,
}

impl Modulus {
    /// Validate `q` and choose its reduction strategy.
    ///
    /// Fails with a configuration error when `q < 2`, `q > 2^63`, or `q` is
    /// even without being a power of two.
    pub fn new(q: u64) -> Result<Self> {
        if q < 2 {
            return Err(config_err!("modulus {q} is too small"));
        }
        if q > MAX_MODULUS {
            return Err(config_err!("modulus {q} exceeds 2^63"));
        }

        if q.is_power_of_two() {
            return Ok(Self {
                q,
                reduction: Reduction::PowerOfTwo,
                mask: q - 1,
                q_inv_neg: 0,
                r_squared: 0,
            });
        }

        if q % 2 == 0 {
            return Err(config_err!(
                "modulus {q} is even but not a power of two; no reduction strategy applies"
            ));
        }

        Ok(Self {
            q,
            reduction: Reduction::Montgomery,
            mask: 0,
            q_inv_neg: compute_q_inv_neg(q),
            r_squared: compute_r_squared(q),
        })
    }

    /// The modulus value.
    #[inline]
    pub fn value(&self) -> u64 {
        self.q
    }

    /// The reduction strategy in use.
    pub fn reduction(&self) -> Reduction {
        self.reduction
    }

    pub fn is_power_of_two(&self) -> bool {
        self.reduction == Reduction::PowerOfTwo
    }

    /// Number of bits needed to represent `q - 1`.
    pub fn bits(&self) -> u32 {
        64 - (self.q - 1).leading_zeros()
    }

    /// Reduce an arbitrary `u64` into `[0, q)`.
    #[inline]
    pub fn reduce(&self, x: u64) -> u64 {
        match self.reduction {
            Reduction::PowerOfTwo => x & self.mask,
            Reduction::Montgomery => x % self.q,
        }
    }

    #[inline]
    pub fn add(&self, a: u64, b: u64) -> u64 {
        debug_assert!(a < self.q && b < self.q);
        match self.reduction {
            Reduction::PowerOfTwo => (a + b) & self.mask,
            Reduction::Montgomery => {
                let sum = a + b;
                if sum >= self.q {
                    sum - self.q
                } else {
                    sum
                }
            }
        }
    }

    #[inline]
    pub fn sub(&self, a: u64, b: u64) -> u64 {
        debug_assert!(a < self.q && b < self.q);
        match self.reduction {
            Reduction::PowerOfTwo => a.wrapping_sub(b) & self.mask,
            Reduction::Montgomery => {
                if a >= b {
                    a - b
                } else {
                    self.q - b + a
                }
            }
        }
    }

    #[inline]
    pub fn neg(&self, a: u64) -> u64 {
        debug_assert!(a < self.q);
        if a == 0 {
            0
        } else {
            self.q - a
        }
    }

    #[inline]
    pub fn mul(&self, a: u64, b: u64) -> u64 {
        debug_assert!(a < self.q && b < self.q);
        match self.reduction {
            Reduction::PowerOfTwo => a.wrapping_mul(b) & self.mask,
            // mont(mont(a, b), R^2) = (a·b·R^-1)·R^2·R^-1 = a·b
            Reduction::Montgomery => {
                self.montgomery_mul(self.montgomery_mul(a, b), self.r_squared)
            }
        }
    }

    /// `a^exp mod q` by square-and-multiply.
    pub fn pow(&self, a: u64, mut exp: u64) -> u64 {
        let mut base = self.reduce(a);
        let mut result = self.reduce(1);
        while exp > 0 {
            if exp & 1 == 1 {
                result = self.mul(result, base);
            }
            base = self.mul(base, base);
            exp >>= 1;
        }
        result
    }

    /// Multiplicative inverse of `a`, if `gcd(a, q) = 1`.
    pub fn inverse(&self, a: u64) -> Option<u64> {
        let (mut old_r, mut r) = (self.reduce(a) as i128, self.q as i128);
        let (mut old_s, mut s) = (1i128, 0i128);
        while r != 0 {
            let quotient = old_r / r;
            (old_r, r) = (r, old_r - quotient * r);
            (old_s, s) = (s, old_s - quotient * s);
        }
        if old_r != 1 {
            return None;
        }
        Some(old_s.rem_euclid(self.q as i128) as u64)
    }

    /// Map a signed integer to its residue.
    #[inline]
    pub fn from_signed(&self, v: i64) -> u64 {
        match self.reduction {
            Reduction::PowerOfTwo => (v as u64) & self.mask,
            Reduction::Montgomery => v.rem_euclid(self.q as i64) as u64,
        }
    }

    /// Centered representative in `[-q/2, q/2)` (rounded toward the upper
    /// half for odd `q`).
    #[inline]
    pub fn to_signed(&self, x: u64) -> i64 {
        debug_assert!(x < self.q);
        if x < self.q.div_ceil(2) {
            x as i64
        } else {
            (x as i128 - self.q as i128) as i64
        }
    }

    /// `round(q · num / den) mod q`, e.g. `fraction(1, 4)` is `q/4`.
    pub fn fraction(&self, num: u64, den: u64) -> u64 {
        debug_assert!(den > 0);
        let scaled = (self.q as u128 * num as u128 + den as u128 / 2) / den as u128;
        self.reduce((scaled % self.q as u128) as u64)
    }

    /// Rescale a residue onto `[0, target)`: `round(x · target / q) mod target`.
    ///
    /// With `target = 2N` this gives the rotation amount used in blind
    /// rotation; with another modulus's value it is a modulus switch.
    #[inline]
    pub fn scale_to(&self, x: u64, target: u64) -> u64 {
        debug_assert!(x < self.q);
        let q = self.q as u128;
        let scaled = (x as u128 * target as u128 + q / 2) / q;
        (scaled % target as u128) as u64
    }

    /// Modulus switch of one residue into `to`.
    #[inline]
    pub fn switch(&self, x: u64, to: &Modulus) -> u64 {
        self.scale_to(x, to.q)
    }

    /// `a · b · 2^-64 mod q`. Odd moduli only.
    #[inline]
    pub(crate) fn montgomery_mul(&self, a: u64, b: u64) -> u64 {
        let q = self.q;
        let ab = (a as u128) * (b as u128);
        let m = ((ab as u64).wrapping_mul(self.q_inv_neg)) as u128;
        let t = ((ab + m * (q as u128)) >> 64) as u64;
        if t >= q {
            t - q
        } else {
            t
        }
    }

    #[inline]
    pub(crate) fn to_montgomery(&self, a: u64) -> u64 {
        self.montgomery_mul(a, self.r_squared)
    }

    #[cfg(test)]
    pub(crate) fn from_montgomery(&self, a: u64) -> u64 {
        self.montgomery_mul(a, 1)
    }
}

impl PartialEq for Modulus {
    fn eq(&self, other: &Self) -> bool {
        self.q == other.q
    }
}

impl Eq for Modulus {}

impl TryFrom<u64> for Modulus {
    type Error = FheError;

    fn try_from(q: u64) -> Result<Self> {
        Self::new(q)
    }
}

impl From<Modulus> for u64 {
    fn from(modulus: Modulus) -> Self {
        modulus.q
    }
}

/// Deterministic Miller–Rabin for 64-bit inputs.
pub fn is_prime(n: u64) -> bool {
    const WITNESSES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

    if n < 2 {
        return false;
    }
    for &p in &WITNESSES {
        if n % p == 0 {
            return n == p;
        }
    }

    let mut d = n - 1;
    let mut r = 0;
    while d % 2 == 0 {
        d /= 2;
        r += 1;
    }

    'witness: for &a in &WITNESSES {
        let mut x = pow_mod(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..r {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

fn mul_mod(a: u64, b: u64, m: u64) -> u64 {
    ((a as u128 * b as u128) % m as u128) as u64
}

fn pow_mod(mut base: u64, mut exp: u64, m: u64) -> u64 {
    let mut result = 1u64;
    base %= m;
    while exp > 0 {
        if exp & 1 == 1 {
            result = mul_mod(result, base, m);
        }
        exp >>= 1;
        base = mul_mod(base, base, m);
    }
    result
}

fn compute_q_inv_neg(q: u64) -> u64 {
    // Lift q^-1 one bit at a time: y·q ≡ 1 (mod 2^i) before step i.
    let mut y: u64 = 1;
    for i in 1..64 {
        let yi = y.wrapping_mul(q) & (1u64 << i);
        y |= yi;
    }
    y.wrapping_neg()
}

fn compute_r_squared(q: u64) -> u64 {
    let r_mod_q = (1u128 << 64) % (q as u128);
    ((r_mod_q * r_mod_q) % (q as u128)) as u64
}
