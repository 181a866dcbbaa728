pub mod security {
    use argon2::{Algorithm, Argon2, Params, PasswordHasher, PasswordVerifier, Version};
    use password_hash::{PasswordHash, SaltString};

    use crate::domain::service::{PasswordHashError, PasswordHashService};

    /// Argon2id hashing producing PHC strings.
    pub struct Argon2HashService(Argon2<'static>);

    impl Argon2HashService {
        pub fn new() -> Self {
            Self(Argon2::new(
                Algorithm::Argon2id,
                Version::V0x13,
                Params::default(),
            ))
        }
    }

    impl Default for Argon2HashService {
        fn default() -> Self {
            Self::new()
        }
    }

    impl From<password_hash::Error> for PasswordHashError {
        fn from(err: password_hash::Error) -> Self {
            match err {
                password_hash::Error::Password => Self::InvalidPassword,
                _ => Self::Hash,
            }
        }
    }

    impl PasswordHashService for Argon2HashService {
        fn hash_password(&self, pwd: &str) -> Result<String, PasswordHashError> {
            let salt = SaltString::generate(&mut rand_core::OsRng);
            let hash = self.0.hash_password(pwd.as_bytes(), &salt)?;
            Ok(hash.to_string())
        }

        fn verify_password(&self, pwd: &str, hash: &str) -> Result<(), PasswordHashError> {
            let hash = PasswordHash::new(hash).map_err(|_| PasswordHashError::Malformed)?;
            self.0.verify_password(pwd.as_bytes(), &hash)?;
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use pretty_assertions::assert_eq;

        use super::*;

        #[test]
        fn hash_and_verify() {
            let service = Argon2HashService::new();

            let hash = service.hash_password("correct horse").unwrap();

            assert!(hash.starts_with("$argon2id$v=19$"));
            assert_eq!(service.verify_password("correct horse", &hash), Ok(()));
            assert_eq!(
                service.verify_password("battery staple", &hash),
                Err(PasswordHashError::InvalidPassword)
            );
            assert_eq!(
                service.verify_password("correct horse", "not a phc string"),
                Err(PasswordHashError::Malformed)
            );
        }

        #[test]
        fn salts_differ() {
            let service = Argon2HashService::new();
            assert_ne!(
                service.hash_password("same").unwrap(),
                service.hash_password("same").unwrap()
            );
        }
    }
}
