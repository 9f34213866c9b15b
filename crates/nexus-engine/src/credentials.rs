use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use secrecy::{ExposeSecret, SecretString};
use tracing::warn;

use nexus_core::{DeskError, DeskResult};

/// Argon2id password hashing. Hashes are stored as PHC strings, so
/// verification reads the cost parameters back from the hash itself.
#[derive(Clone)]
pub struct Credentials {
    argon2: Argon2<'static>,
}

impl Credentials {
    /// Custom cost parameters (memory in KiB, iterations, lanes).
    pub fn with_params(memory_kib: u32, iterations: u32, lanes: u32) -> DeskResult<Self> {
        let params = Params::new(memory_kib, iterations, lanes, None)
            .map_err(|e| DeskError::validation(format!("invalid argon2 parameters: {e}")))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Cheapest parameters argon2 accepts. For tests and demo fixtures.
    pub fn insecure_fast() -> Self {
        Self {
            argon2: Argon2::new(
                Algorithm::Argon2id,
                Version::V0x13,
                Params::new(Params::MIN_M_COST, Params::MIN_T_COST, Params::MIN_P_COST, None)
                    .unwrap_or_default(),
            ),
        }
    }

    pub fn hash(&self, password: &SecretString) -> DeskResult<String> {
        let salt = SaltString::generate(&mut rand::rngs::OsRng);
        self.argon2
            .hash_password(password.expose_secret().as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| DeskError::Storage(format!("password hashing failed: {e}")))
    }

    /// `false` for a wrong password or an unreadable stored hash.
    pub fn verify(&self, password: &SecretString, stored: &str) -> bool {
        let parsed = match PasswordHash::new(stored) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "stored password hash is not a valid PHC string");
                return false;
            }
        };
        self.argon2
            .verify_password(password.expose_secret().as_bytes(), &parsed)
            .is_ok()
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    #[test]
    fn hash_then_verify() {
        let creds = Credentials::insecure_fast();
        let hash = creds.hash(&secret("dean123")).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(creds.verify(&secret("dean123"), &hash));
        assert!(!creds.verify(&secret("dean124"), &hash));
    }

    #[test]
    fn salts_differ() {
        let creds = Credentials::insecure_fast();
        let a = creds.hash(&secret("same")).unwrap();
        let b = creds.hash(&secret("same")).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn cost_is_read_from_the_hash() {
        let hash = Credentials::insecure_fast().hash(&secret("pw")).unwrap();
        assert!(Credentials::default().verify(&secret("pw"), &hash));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!Credentials::default().verify(&secret("pw"), "plaintext"));
    }

    #[test]
    fn rejects_bad_params() {
        assert!(Credentials::with_params(0, 0, 0).is_err());
        assert!(Credentials::with_params(4096, 1, 1).is_ok());
    }
}
