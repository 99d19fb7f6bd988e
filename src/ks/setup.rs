//! Key-switching key construction

use serde::{Deserialize, Serialize};

use crate::error::{ensure, FheError, Result};
use crate::lwe::{LweCiphertext, LweSecretKey};
use crate::math::{Gadget, Modulus};

/// LWE key-switching key from secret key `z` (dimension N) to `s`
/// (dimension n).
///
/// Digit convention: entry `(j, d)` encrypts `z_j · B^d` under `s`, so digit
/// index `d` of the decomposition pairs with power `B^d`, least significant
/// first. Generation and [`key_switch`](super::key_switch) both go through
/// the same [`Gadget`], which keeps the two sides from drifting apart.
///
/// ```text
/// K[j][d] = (a, ⟨a, s⟩ + e + z_j·B^d)
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "KeySwitchingKeyRepr", into = "KeySwitchingKeyRepr")]
pub struct KeySwitchingKey {
    /// Row-major `input_dim × digits` entries
    entries: Vec<LweCiphertext>,
    input_dim: usize,
    output_dim: usize,
    gadget: Gadget,
}

#[derive(Serialize, Deserialize)]
struct KeySwitchingKeyRepr {
    entries: Vec<LweCiphertext>,
    input_dim: usize,
    output_dim: usize,
    gadget: Gadget,
}

impl KeySwitchingKey {
    /// Assemble a key from per-coordinate rows of `gadget.digits()`
    /// ciphertexts each.
    pub fn from_entries(rows: Vec<Vec<LweCiphertext>>, gadget: Gadget) -> Result<Self> {
        let input_dim = rows.len();
        ensure!(input_dim > 0, "key-switching key has no rows");
        let output_dim = rows[0].first().map_or(0, LweCiphertext::dimension);

        for (j, row) in rows.iter().enumerate() {
            ensure!(
                row.len() == gadget.digits(),
                "key-switching row {j} has {} entries, expected {}",
                row.len(),
                gadget.digits()
            );
            for (d, entry) in row.iter().enumerate() {
                ensure!(
                    entry.dimension() == output_dim
                        && entry.modulus == *gadget.modulus()
                        && entry.is_reduced(),
                    "key-switching entry ({j}, {d}) is not a reduced ciphertext of \
                     dimension {output_dim} mod {}",
                    gadget.modulus().value()
                );
            }
        }

        Ok(Self {
            entries: rows.into_iter().flatten().collect(),
            input_dim,
            output_dim,
            gadget,
        })
    }

    /// Encrypt `from_j · B^d` under `to` for every `(j, d)`.
    ///
    /// `sample(j, d)` supplies the mask and noise of entry `(j, d)`.
    pub fn encrypt<F>(
        from: &LweSecretKey,
        to: &LweSecretKey,
        gadget: Gadget,
        mut sample: F,
    ) -> Result<Self>
    where
        F: FnMut(usize, usize) -> (Vec<u64>, i64),
    {
        let modulus = *gadget.modulus();
        let powers = gadget.powers();

        let rows = from
            .coeffs
            .iter()
            .enumerate()
            .map(|(j, &z_j)| {
                let key_coeff = modulus.from_signed(z_j);
                powers
                    .iter()
                    .enumerate()
                    .map(|(d, &power)| {
                        let (mask, noise) = sample(j, d);
                        LweCiphertext::encrypt_phase(
                            to,
                            mask,
                            noise,
                            modulus.mul(key_coeff, power),
                            modulus,
                        )
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        Self::from_entries(rows, gadget)
    }

    /// Dimension of the key being switched away from
    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    /// Dimension of the destination key
    pub fn output_dim(&self) -> usize {
        self.output_dim
    }

    pub fn gadget(&self) -> &Gadget {
        &self.gadget
    }

    pub fn modulus(&self) -> &Modulus {
        self.gadget.modulus()
    }

    /// Total number of entries, `input_dim · digits`
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry encrypting `z_j · B^d`
    pub fn entry(&self, j: usize, d: usize) -> &LweCiphertext {
        &self.entries[j * self.gadget.digits() + d]
    }
}

impl TryFrom<KeySwitchingKeyRepr> for KeySwitchingKey {
    type Error = FheError;

    fn try_from(repr: KeySwitchingKeyRepr) -> Result<Self> {
        let digits = repr.gadget.digits();
        ensure!(
            repr.entries.len() == repr.input_dim * digits,
            "key-switching key has {} entries, expected {} × {digits}",
            repr.entries.len(),
            repr.input_dim
        );
        let rows = repr
            .entries
            .chunks(digits)
            .map(<[LweCiphertext]>::to_vec)
            .collect();
        let key = Self::from_entries(rows, repr.gadget)?;
        ensure!(
            key.output_dim == repr.output_dim,
            "key-switching entries have dimension {}, recorded {}",
            key.output_dim,
            repr.output_dim
        );
        Ok(key)
    }
}

impl From<KeySwitchingKey> for KeySwitchingKeyRepr {
    fn from(key: KeySwitchingKey) -> Self {
        Self {
            entries: key.entries,
            input_dim: key.input_dim,
            output_dim: key.output_dim,
            gadget: key.gadget,
        }
    }
}
