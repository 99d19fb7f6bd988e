//! Signed gadget decomposition.
//!
//! A value `x ∈ Z_q` is written as `x ≡ Σ d_i · B^i (mod q)` with every digit
//! `d_i ∈ [-B/2, B/2)`. The base `B` is a power of two, so each step reads
//! the low `log B` bits of the running (centered, two's-complement) value,
//! re-centers the digit, and carries the borrow into the next position.
//!
//! Preconditions, checked by [`Gadget::new`]:
//!
//! - `B = 2^k` with `k ≥ 1`, and at least one digit;
//! - power-of-two `q`: `B^digits ≥ q`, so a carry past the top digit is a
//!   multiple of `q` and can be dropped;
//! - odd `q`: `(B/2 - 1)·(B^digits - 1)/(B - 1) ≥ ⌊q/2⌋`, so every centered
//!   value fits without a residual carry.

use serde::{Deserialize, Serialize};

use super::modulus::Modulus;
use crate::error::{config_err, FheError, Result};

/// Gadget vector `g = [1, B, B², ..., B^(ℓ-1)]` over a fixed modulus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GadgetRepr", into = "GadgetRepr")]
pub struct Gadget {
    base: u64,
    log_base: u32,
    digits: usize,
    modulus: Modulus,
}

#[derive(Serialize, Deserialize)]
struct GadgetRepr {
    base: u64,
    digits: usize,
    modulus: Modulus,
}

impl Gadget {
    /// Validate base, digit count and coverage of `modulus`.
    pub fn new(base: u64, digits: usize, modulus: Modulus) -> Result<Self> {
        let log_base = check_base(base, digits)?;
        if !covers(base, digits, &modulus) {
            return Err(config_err!(
                "{digits} signed digits of base {base} cannot represent every residue mod {}",
                modulus.value()
            ));
        }
        Ok(Self {
            base,
            log_base,
            digits,
            modulus,
        })
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn log_base(&self) -> u32 {
        self.log_base
    }

    /// Number of digits ℓ.
    pub fn digits(&self) -> usize {
        self.digits
    }

    pub fn modulus(&self) -> &Modulus {
        &self.modulus
    }

    /// Decompose `value` into ℓ signed digits, least significant first.
    pub fn decompose(&self, value: u64) -> Result<Vec<i64>> {
        let mut out = vec![0i64; self.digits];
        self.decompose_into(value, &mut out)?;
        Ok(out)
    }

    /// Decompose into a caller-provided buffer of length ℓ.
    #[inline]
    pub fn decompose_into(&self, value: u64, out: &mut [i64]) -> Result<()> {
        debug_assert_eq!(out.len(), self.digits);
        signed_digits(value, &self.modulus, self.log_base, out)
    }

    /// `Σ d_i · B^i mod q`.
    pub fn recompose(&self, digits: &[i64]) -> u64 {
        let m = &self.modulus;
        digits
            .iter()
            .zip(self.powers())
            .fold(0, |acc, (&d, power)| m.add(acc, m.mul(m.from_signed(d), power)))
    }

    /// `[1, B, ..., B^(ℓ-1)] mod q`.
    pub fn powers(&self) -> Vec<u64> {
        let m = &self.modulus;
        let base = m.reduce(self.base);
        let mut powers = Vec::with_capacity(self.digits);
        let mut current = m.reduce(1);
        for _ in 0..self.digits {
            powers.push(current);
            current = m.mul(current, base);
        }
        powers
    }
}

impl TryFrom<GadgetRepr> for Gadget {
    type Error = FheError;

    fn try_from(repr: GadgetRepr) -> Result<Self> {
        Self::new(repr.base, repr.digits, repr.modulus)
    }
}

impl From<Gadget> for GadgetRepr {
    fn from(gadget: Gadget) -> Self {
        Self {
            base: gadget.base,
            digits: gadget.digits,
            modulus: gadget.modulus,
        }
    }
}

/// Decompose `value` mod `modulus` into `digits` signed base-`base` digits.
///
/// Unlike [`Gadget::new`] this does not check coverage up front: a value
/// that leaves a carry which is not a multiple of the modulus yields
/// [`FheError::InvalidDigitRange`].
pub fn gadget_decompose(
    value: u64,
    modulus: &Modulus,
    base: u64,
    digits: usize,
) -> Result<Vec<i64>> {
    let log_base = check_base(base, digits)?;
    let mut out = vec![0i64; digits];
    signed_digits(modulus.reduce(value), modulus, log_base, &mut out)?;
    Ok(out)
}

fn check_base(base: u64, digits: usize) -> Result<u32> {
    if base < 2 || !base.is_power_of_two() {
        return Err(config_err!("gadget base {base} must be a power of two >= 2"));
    }
    if digits == 0 {
        return Err(config_err!("gadget needs at least one digit"));
    }
    Ok(base.trailing_zeros())
}

fn covers(base: u64, digits: usize, modulus: &Modulus) -> bool {
    let total_bits = base.trailing_zeros() as u64 * digits as u64;
    if modulus.is_power_of_two() {
        return total_bits >= modulus.bits() as u64;
    }
    if total_bits >= 127 {
        return base > 2;
    }
    let base = base as u128;
    let span = ((1u128 << total_bits) - 1) / (base - 1);
    (base / 2 - 1) * span >= (modulus.value() / 2) as u128
}

fn signed_digits(value: u64, modulus: &Modulus, log_base: u32, out: &mut [i64]) -> Result<()> {
    let base = 1i128 << log_base;
    let half = base >> 1;
    let mask = base - 1;

    let mut v = modulus.to_signed(value) as i128;
    for digit in out.iter_mut() {
        let mut d = v & mask;
        if d >= half {
            d -= base;
        }
        *digit = d as i64;
        // exact: v - d is a multiple of the base
        v = (v - d) >> log_base;
    }

    if v != 0 {
        let dropped = modulus.is_power_of_two()
            && (log_base as u64 * out.len() as u64) >= modulus.bits() as u64;
        if !dropped {
            return Err(FheError::InvalidDigitRange {
                value: modulus.to_signed(value),
                base: base as u64,
                digits: out.len(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    const RING_Q: u64 = 134215681;

    #[test]
    fn test_carry_propagates_into_next_digit() {
        let q = Modulus::new(16).unwrap();
        // 7 = -1 + (-2)·4 + 1·16, the top carry vanishes mod 16
        let digits = gadget_decompose(7, &q, 4, 2).unwrap();
        assert_eq!(digits, vec![-1, -2]);

        let gadget = Gadget::new(4, 2, q).unwrap();
        assert_eq!(gadget.recompose(&digits), 7);
    }

    #[test]
    fn test_digits_in_range_and_recompose() {
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        let q = Modulus::new(RING_Q).unwrap();
        let gadget = Gadget::new(1 << 7, 4, q).unwrap();

        for _ in 0..2000 {
            let x = rng.gen_range(0..RING_Q);
            let digits = gadget.decompose(x).unwrap();
            assert!(digits.iter().all(|&d| (-64..64).contains(&d)));
            assert_eq!(gadget.recompose(&digits), x);
        }
        for x in [0, 1, RING_Q / 2, RING_Q / 2 + 1, RING_Q - 1] {
            let digits = gadget.decompose(x).unwrap();
            assert_eq!(gadget.recompose(&digits), x);
        }
    }

    #[test]
    fn test_power_of_two_modulus_full_range() {
        let q = Modulus::new(1 << 16).unwrap();
        let gadget = Gadget::new(16, 4, q).unwrap();
        for x in 0..(1u64 << 16) {
            let digits = gadget.decompose(x).unwrap();
            assert!(digits.iter().all(|&d| (-8..8).contains(&d)));
            assert_eq!(gadget.recompose(&digits), x);
        }
    }

    #[test]
    fn test_residual_carry_is_invalid_for_odd_modulus() {
        let q = Modulus::new(17).unwrap();
        let err = gadget_decompose(7, &q, 2, 2).unwrap_err();
        assert_eq!(
            err,
            FheError::InvalidDigitRange {
                value: 7,
                base: 2,
                digits: 2
            }
        );
    }

    #[test]
    fn test_insufficient_coverage_rejected() {
        let q = Modulus::new(RING_Q).unwrap();
        assert!(Gadget::new(1 << 7, 3, q).is_err());
        assert!(Gadget::new(1 << 6, 4, q).is_err());
        assert!(Gadget::new(1 << 6, 5, q).is_ok());

        let p2 = Modulus::new(1 << 16).unwrap();
        assert!(Gadget::new(16, 3, p2).is_err());
        assert!(Gadget::new(16, 4, p2).is_ok());
    }

    #[test]
    fn test_invalid_base() {
        let q = Modulus::new(17).unwrap();
        assert!(Gadget::new(3, 4, q).is_err());
        assert!(Gadget::new(1, 4, q).is_err());
        assert!(Gadget::new(4, 0, q).is_err());
    }

    #[test]
    fn test_powers() {
        let q = Modulus::new(RING_Q).unwrap();
        let gadget = Gadget::new(1 << 7, 4, q).unwrap();
        assert_eq!(gadget.powers(), vec![1, 1 << 7, 1 << 14, 1 << 21]);
    }

    #[test]
    fn test_serde_revalidates() {
        let q = Modulus::new(1 << 16).unwrap();
        let gadget = Gadget::new(16, 4, q).unwrap();
        let json = serde_json::to_string(&gadget).unwrap();
        assert_eq!(serde_json::from_str::<Gadget>(&json).unwrap(), gadget);

        let bad = json.replace("\"digits\":4", "\"digits\":2");
        assert!(serde_json::from_str::<Gadget>(&bad).is_err());
    }
}
