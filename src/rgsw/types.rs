//! RGSW ciphertext type and encryption.

use serde::{Deserialize, Serialize};

use crate::error::{ensure, FheError, Result};
use crate::math::{Gadget, Modulus, NttContext, Poly};
use crate::rlwe::{RlweCiphertext, RlweSecretKey};

/// RGSW ciphertext: 2ℓ × 2 matrix of ring elements
///
/// Encrypts a small message m (typically 0, 1, or ±X^k).
/// The structure is:
/// ```text
/// [ Row 0..ℓ-1:   (a + m·B^i, a·s + e)      phase −m·B^i·s
///   Row ℓ..2ℓ-1:  (a, a·s + e + m·B^i)      phase  m·B^i ]
/// ```
///
/// where s is the secret key polynomial and B the gadget base. This layout
/// gives the external product RLWE(m₀) ⊡ RGSW(m₁) = RLWE(m₀·m₁).
///
/// Rows are stored in the coefficient domain until [`prepare`] moves them
/// to the NTT domain once, after which every external product reuses them.
///
/// [`prepare`]: RgswCiphertext::prepare
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RgswRepr", into = "RgswRepr")]
pub struct RgswCiphertext {
    /// 2ℓ RLWE ciphertexts arranged as described above
    rows: Vec<RlweCiphertext>,
    /// Gadget parameters
    gadget: Gadget,
}

/// Wire form; decoding goes back through the shape checks.
#[derive(Serialize, Deserialize)]
struct RgswRepr {
    rows: Vec<RlweCiphertext>,
    gadget: Gadget,
}

impl RgswCiphertext {
    /// Create an RGSW ciphertext from coefficient-domain rows.
    pub fn from_rows(rows: Vec<RlweCiphertext>, gadget: Gadget) -> Result<Self> {
        ensure!(
            rows.iter().all(|row| !row.a.is_ntt() && !row.b.is_ntt()),
            "RGSW rows must be in the coefficient domain"
        );
        Self::checked(rows, gadget)
    }

    /// Shape checks shared by [`from_rows`](Self::from_rows) and decoding:
    /// 2ℓ rows over one ring, all in the same domain, reduced mod Q.
    fn checked(rows: Vec<RlweCiphertext>, gadget: Gadget) -> Result<Self> {
        ensure!(
            rows.len() == 2 * gadget.digits(),
            "RGSW ciphertext needs {} rows, got {}",
            2 * gadget.digits(),
            rows.len()
        );
        let dim = rows[0].a.dimension();
        let ntt = rows[0].a.is_ntt();
        ensure!(
            dim.is_power_of_two(),
            "RGSW ring dimension {dim} is not a power of two"
        );
        for (idx, row) in rows.iter().enumerate() {
            ensure!(
                row.a.dimension() == dim && row.b.dimension() == dim,
                "RGSW row[{idx}] has mismatched ring dimension"
            );
            ensure!(
                row.a.modulus() == gadget.modulus() && row.b.modulus() == gadget.modulus(),
                "RGSW row[{idx}] modulus does not match the gadget modulus"
            );
            ensure!(
                row.a.is_ntt() == ntt && row.b.is_ntt() == ntt,
                "RGSW row[{idx}] is in a different domain from row[0]"
            );
            ensure!(
                row.a.is_reduced() && row.b.is_reduced(),
                "RGSW row[{idx}] has unreduced coefficients"
            );
        }
        Ok(Self { rows, gadget })
    }

    /// Encrypt a message polynomial under the given secret key
    ///
    /// # Arguments
    /// * `sk` - RLWE secret key
    /// * `message` - Message polynomial (typically constant 0, 1, or a monomial)
    /// * `gadget` - Gadget over the ring modulus
    /// * `ctx` - NTT context
    /// * `sample` - Called once per row index, returns that row's mask and
    ///   per-coefficient noise
    pub fn encrypt<F>(
        sk: &RlweSecretKey,
        message: &Poly,
        gadget: Gadget,
        ctx: &NttContext,
        mut sample: F,
    ) -> Result<Self>
    where
        F: FnMut(usize) -> (Poly, Vec<i64>),
    {
        ensure!(
            gadget.modulus() == ctx.modulus(),
            "gadget modulus {} does not match ring modulus {}",
            gadget.modulus().value(),
            ctx.modulus().value()
        );
        ensure!(
            message.dimension() == ctx.dimension()
                && message.modulus() == ctx.modulus()
                && !message.is_ntt(),
            "RGSW message does not live in the context ring"
        );
        let ell = gadget.digits();
        let zero = Poly::zero(ctx.dimension(), *ctx.modulus());

        let rows = gadget
            .powers()
            .iter()
            .cycle()
            .take(2 * ell)
            .enumerate()
            .map(|(row, &power)| {
                let (a, noise) = sample(row);
                let mut ct = RlweCiphertext::encrypt_plaintext(sk, a, &noise, &zero, ctx)?;
                let scaled = message.scalar_mul(power);
                if row < ell {
                    ct.a += &scaled;
                } else {
                    ct.b += &scaled;
                }
                Ok(ct)
            })
            .collect::<Result<Vec<_>>>()?;

        Self::from_rows(rows, gadget)
    }

    /// Encrypt a small signed constant, e.g. one secret key bit.
    pub fn encrypt_constant<F>(
        sk: &RlweSecretKey,
        value: i64,
        gadget: Gadget,
        ctx: &NttContext,
        sample: F,
    ) -> Result<Self>
    where
        F: FnMut(usize) -> (Poly, Vec<i64>),
    {
        let modulus = *ctx.modulus();
        let msg_poly = Poly::constant(modulus.from_signed(value), ctx.dimension(), modulus);
        Self::encrypt(sk, &msg_poly, gadget, ctx, sample)
    }

    /// Move every row to the NTT domain. Idempotent.
    pub fn prepare(&mut self, ctx: &NttContext) {
        for row in &mut self.rows {
            row.a.to_ntt(ctx);
            row.b.to_ntt(ctx);
        }
    }

    /// Owned variant of [`prepare`](Self::prepare).
    pub fn prepared(mut self, ctx: &NttContext) -> Self {
        self.prepare(ctx);
        self
    }

    /// Whether the rows already live in the NTT domain
    pub fn is_prepared(&self) -> bool {
        self.rows.iter().all(|r| r.a.is_ntt() && r.b.is_ntt())
    }

    pub fn rows(&self) -> &[RlweCiphertext] {
        &self.rows
    }

    pub fn gadget(&self) -> &Gadget {
        &self.gadget
    }

    /// Get the ring dimension
    pub fn ring_dim(&self) -> usize {
        self.rows[0].ring_dim()
    }

    /// Get the modulus
    pub fn modulus(&self) -> &Modulus {
        self.gadget.modulus()
    }

    /// Get the gadget length ℓ
    pub fn gadget_len(&self) -> usize {
        self.gadget.digits()
    }
}

impl TryFrom<RgswRepr> for RgswCiphertext {
    type Error = FheError;

    fn try_from(repr: RgswRepr) -> Result<Self> {
        Self::checked(repr.rows, repr.gadget)
    }
}

impl From<RgswCiphertext> for RgswRepr {
    fn from(ct: RgswCiphertext) -> Self {
        Self {
            rows: ct.rows,
            gadget: ct.gadget,
        }
    }
}
