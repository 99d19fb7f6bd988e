//! External product operation: RLWE × RGSW → RLWE
//!
//! This is the multiplication step behind CMUX and therefore behind every
//! blind rotation round.

use std::borrow::Cow;

use crate::error::{ensure, Result};
use crate::math::{Gadget, NttContext, Poly};
use crate::rlwe::RlweCiphertext;

use super::types::RgswCiphertext;

/// Decompose a polynomial coefficient-wise into signed base-B digits
///
/// Returns ℓ digit polynomials `p_0, ..., p_{ℓ-1}` with
/// `poly ≡ Σ p_i · B^i`. Each digit `d ∈ [-B/2, B/2)` is stored as its
/// canonical residue, so negative digits become `Q − |d|`.
pub fn decompose_poly(poly: &Poly, gadget: &Gadget) -> Result<Vec<Poly>> {
    ensure!(!poly.is_ntt(), "decomposition expects coefficient domain");
    let d = poly.dimension();
    let modulus = *poly.modulus();
    let ell = gadget.digits();

    let mut result = vec![Poly::zero(d, modulus); ell];
    let mut digits = vec![0i64; ell];

    for (j, &c) in poly.coeffs().iter().enumerate() {
        gadget.decompose_into(c, &mut digits)?;
        for (digit_poly, &digit) in result.iter_mut().zip(&digits) {
            digit_poly.coeffs_mut()[j] = modulus.from_signed(digit);
        }
    }

    Ok(result)
}

/// Compute the external product: RLWE(m₀) ⊡ RGSW(m₁) → RLWE(m₀·m₁)
///
/// # Algorithm
///
/// Given RLWE ciphertext (a, b) and RGSW ciphertext C:
/// 1. Decompose a and b using the signed gadget inverse: g⁻¹(a), g⁻¹(b)
/// 2. Compute: (a', b') = Σᵢ [g⁻¹(a)ᵢ · C[i] + g⁻¹(b)ᵢ · C[ℓ+i]]
///
/// Products accumulate in the NTT domain; only the two sums are
/// transformed back. Rows of an unprepared `rgsw` are transformed on the
/// fly, so callers doing many products should [`prepare`] it first.
///
/// [`prepare`]: RgswCiphertext::prepare
pub fn external_product(
    rlwe: &RlweCiphertext,
    rgsw: &RgswCiphertext,
    ctx: &NttContext,
) -> Result<RlweCiphertext> {
    let d = rlwe.ring_dim();
    ensure!(
        d == rgsw.ring_dim() && d == ctx.dimension(),
        "ring dimension mismatch: RLWE {d}, RGSW {}, NTT {}",
        rgsw.ring_dim(),
        ctx.dimension()
    );
    ensure!(
        rlwe.modulus() == rgsw.modulus() && rlwe.modulus() == ctx.modulus(),
        "ring modulus mismatch: RLWE {}, RGSW {}, NTT {}",
        rlwe.modulus().value(),
        rgsw.modulus().value(),
        ctx.modulus().value()
    );

    let rows: Cow<'_, [RlweCiphertext]> = if rgsw.is_prepared() {
        Cow::Borrowed(rgsw.rows())
    } else {
        Cow::Owned(rgsw.clone().prepared(ctx).rows().to_vec())
    };

    let gadget = rgsw.gadget();
    let a_decomp = decompose_poly(&rlwe.a, gadget)?;
    let b_decomp = decompose_poly(&rlwe.b, gadget)?;

    let modulus = *rlwe.modulus();
    let mut result_a = Poly::zero_ntt(d, modulus);
    let mut result_b = Poly::zero_ntt(d, modulus);

    // digit i of a pairs with row i, digit i of b with row ℓ+i
    for (mut digit, row) in a_decomp.into_iter().chain(b_decomp).zip(rows.iter()) {
        digit.to_ntt(ctx);
        result_a.mul_acc_ntt_domain(&digit, &row.a, ctx);
        result_b.mul_acc_ntt_domain(&digit, &row.b, ctx);
    }

    result_a.from_ntt(ctx);
    result_b.from_ntt(ctx);
    Ok(RlweCiphertext {
        a: result_a,
        b: result_b,
    })
}

/// Homomorphic selection: returns an encryption of `c1` if `sel` encrypts
/// 1 and of `c0` if it encrypts 0.
///
/// `cmux(sel, c0, c1) = c0 + (c1 − c0) ⊡ sel`
pub fn cmux(
    sel: &RgswCiphertext,
    c0: &RlweCiphertext,
    c1: &RlweCiphertext,
    ctx: &NttContext,
) -> Result<RlweCiphertext> {
    let diff = c1.sub(c0)?;
    c0.add(&external_product(&diff, sel, ctx)?)
}
