//! PBKDF2-HMAC-SHA256 password digests in PHC string format.
//!
//! Encoded form: `$pbkdf2-sha256$i=<rounds>,l=32$<salt-b64>$<digest-b64>`.

use pbkdf2::password_hash::{PasswordHash as PhcHash, PasswordHasher as _, SaltString};
use pbkdf2::{Params, Pbkdf2};
use rand::RngCore;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::domain::PasswordHash;
use crate::domain::ports::{PasswordHashError, PasswordHasher};

const SALT_LEN: usize = 16;
const OUTPUT_LEN: usize = 32;

/// Round count used for new digests.
pub const DEFAULT_ROUNDS: u32 = 600_000;

/// `PasswordHasher` adapter over `pbkdf2`.
#[derive(Debug, Clone, Copy)]
pub struct Pbkdf2PasswordHasher {
    rounds: u32,
}

impl Default for Pbkdf2PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_ROUNDS)
    }
}

impl Pbkdf2PasswordHasher {
    /// Build a hasher; a round count of zero is raised to one.
    #[must_use]
    pub fn new(rounds: u32) -> Self {
        Self {
            rounds: rounds.max(1),
        }
    }
}

fn hashing_error(err: impl ToString) -> PasswordHashError {
    PasswordHashError::hashing(err.to_string())
}

impl PasswordHasher for Pbkdf2PasswordHasher {
    fn hash(&self, password: &str) -> Result<PasswordHash, PasswordHashError> {
        let mut salt = Zeroizing::new([0_u8; SALT_LEN]);
        rand::thread_rng()
            .try_fill_bytes(salt.as_mut_slice())
            .map_err(hashing_error)?;
        let salt = SaltString::encode_b64(salt.as_slice()).map_err(hashing_error)?;
        let params = Params {
            rounds: self.rounds,
            output_length: OUTPUT_LEN,
        };
        let phc = Pbkdf2
            .hash_password_customized(password.as_bytes(), None, None, params, &salt)
            .map_err(hashing_error)?;
        Ok(PasswordHash::from_encoded(phc.to_string()))
    }

    fn verify(&self, password: &str, hash: &PasswordHash) -> bool {
        let Ok(stored) = PhcHash::new(hash.encoded()) else {
            return false;
        };
        let (Some(salt), Some(expected)) = (stored.salt, stored.hash) else {
            return false;
        };
        let Ok(mut params) = Params::try_from(&stored) else {
            return false;
        };
        params.output_length = expected.len();
        let Ok(candidate) = Pbkdf2.hash_password_customized(
            password.as_bytes(),
            Some(stored.algorithm),
            None,
            params,
            salt,
        ) else {
            return false;
        };
        candidate.hash.is_some_and(|derived| {
            derived
                .as_bytes()
                .ct_eq(expected.as_bytes())
                .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn hasher() -> Pbkdf2PasswordHasher {
        Pbkdf2PasswordHasher::new(1_000)
    }

    #[rstest]
    fn verifies_the_original_password(hasher: Pbkdf2PasswordHasher) {
        let hash = hasher.hash("s3cret").expect("hash");
        assert!(hasher.verify("s3cret", &hash));
        assert!(!hasher.verify("S3cret", &hash));
    }

    #[rstest]
    fn encodes_a_phc_string_with_rounds(hasher: Pbkdf2PasswordHasher) {
        let hash = hasher.hash("pw").expect("hash");
        let parsed = PhcHash::new(hash.encoded()).expect("phc string");
        assert_eq!(parsed.algorithm.as_str(), "pbkdf2-sha256");
        assert_eq!(
            parsed.params.get_decimal("i"),
            Some(1_000),
            "round count is recorded"
        );
        assert_eq!(parsed.hash.map(|out| out.len()), Some(OUTPUT_LEN));
    }

    #[rstest]
    fn salts_differ_between_hashes(hasher: Pbkdf2PasswordHasher) {
        let a = hasher.hash("pw").expect("hash");
        let b = hasher.hash("pw").expect("hash");
        assert_ne!(a.encoded(), b.encoded());
    }

    #[rstest]
    #[case("")]
    #[case("plain$pw")]
    #[case("$pbkdf2-sha256$i=1000,l=32$c2FsdHNhbHQ")]
    #[case("$argon2id$v=19$m=16,t=2,p=1$c2FsdHNhbHQ$aGFzaA")]
    #[case("sha256$8$00$00")]
    fn unreadable_digests_never_verify(hasher: Pbkdf2PasswordHasher, #[case] encoded: &str) {
        assert!(!hasher.verify("pw", &PasswordHash::from_encoded(encoded)));
    }

    #[rstest]
    fn digests_verify_with_their_own_round_count() {
        let stored = Pbkdf2PasswordHasher::new(1_500).hash("pw").expect("hash");
        assert!(Pbkdf2PasswordHasher::new(2_000).verify("pw", &stored));
    }
}
