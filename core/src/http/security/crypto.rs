//! Password hashing.
//!
//! # Spring Security Equivalent
//! `org.springframework.security.crypto.password.PasswordEncoder`
//!
//! Every hash produced here is self-describing: algorithm, cost and salt are
//! embedded in the string, so verification needs nothing but the stored
//! value. A fresh hasher (for instance after a restart) verifies hashes
//! produced by an earlier instance.
//!
//! # Feature Flags
//! - `argon2`: Enables `Argon2Hasher` and `DelegatingHasher` (default)

#[cfg(feature = "argon2")]
use argon2::password_hash::rand_core::OsRng;
#[cfg(feature = "argon2")]
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
#[cfg(feature = "argon2")]
use argon2::Argon2;
use derive_more::{Display, Error};

/// Hashing failed (never raised by verification).
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
#[display("password hashing failed: {reason}")]
pub struct HashError {
    reason: String,
}

impl HashError {
    pub fn new(reason: impl Into<String>) -> Self {
        HashError {
            reason: reason.into(),
        }
    }
}

/// Capability for hashing and verifying passwords.
///
/// # Spring Security Equivalent
/// `PasswordEncoder` interface
///
/// # Example
/// ```
/// use board_guard_core::http::security::crypto::{BCryptHasher, Hasher};
///
/// let hasher = BCryptHasher::with_cost(4);
/// let hash = hasher.hash("1111").unwrap();
/// assert!(hasher.verify("1111", &hash));
/// assert!(!hasher.verify("wrong", &hash));
/// ```
pub trait Hasher: Send + Sync {
    /// Produces a new hash with a freshly generated salt.
    ///
    /// # Spring Equivalent
    /// `PasswordEncoder.encode(CharSequence rawPassword)`
    fn hash(&self, raw_password: &str) -> Result<String, HashError>;

    /// Verifies a raw password against a stored hash. Malformed hashes
    /// never verify.
    ///
    /// # Spring Equivalent
    /// `PasswordEncoder.matches(CharSequence rawPassword, String encodedPassword)`
    fn verify(&self, raw_password: &str, encoded_password: &str) -> bool;
}

/// BCrypt hasher, compatible with `$2a$`, `$2b$` and `$2y$` hashes.
///
/// # Spring Security Equivalent
/// `BCryptPasswordEncoder`
///
/// The cost only affects new hashes; verification reads the cost stored
/// in the hash.
#[derive(Clone, Debug)]
pub struct BCryptHasher {
    cost: u32,
}

impl BCryptHasher {
    /// Spring's default strength.
    pub const DEFAULT_COST: u32 = 10;

    /// Creates a BCrypt hasher with cost 10.
    pub fn new() -> Self {
        Self {
            cost: Self::DEFAULT_COST,
        }
    }

    /// Creates a BCrypt hasher with a custom cost, clamped to 4..=31.
    pub fn with_cost(cost: u32) -> Self {
        Self {
            cost: cost.clamp(4, 31),
        }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl Default for BCryptHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for BCryptHasher {
    fn hash(&self, raw_password: &str) -> Result<String, HashError> {
        bcrypt::hash(raw_password, self.cost).map_err(|e| HashError::new(e.to_string()))
    }

    fn verify(&self, raw_password: &str, encoded_password: &str) -> bool {
        bcrypt::verify(raw_password, encoded_password).unwrap_or(false)
    }
}

/// Argon2id hasher producing PHC strings (`$argon2id$v=19$...`).
///
/// # Spring Security Equivalent
/// `Argon2PasswordEncoder`
#[cfg(feature = "argon2")]
#[derive(Clone)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

#[cfg(feature = "argon2")]
impl Argon2Hasher {
    pub fn new() -> Self {
        Argon2Hasher {
            argon2: Argon2::default(),
        }
    }
}

#[cfg(feature = "argon2")]
impl Default for Argon2Hasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "argon2")]
impl Hasher for Argon2Hasher {
    fn hash(&self, raw_password: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(raw_password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| HashError::new(e.to_string()))
    }

    fn verify(&self, raw_password: &str, encoded_password: &str) -> bool {
        match PasswordHash::new(encoded_password) {
            Ok(parsed) => self
                .argon2
                .verify_password(raw_password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

/// Algorithm used for new hashes by `DelegatingHasher`.
#[cfg(feature = "argon2")]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HashAlgorithm {
    #[default]
    BCrypt,
    Argon2,
}

/// Hashes with one algorithm and verifies any supported one.
///
/// # Spring Security Equivalent
/// `DelegatingPasswordEncoder`
///
/// Unlike Spring, no `{id}` prefix is added: BCrypt and PHC hashes already
/// announce their algorithm, so stored values stay interchangeable with a
/// plain `BCryptHasher`.
#[cfg(feature = "argon2")]
#[derive(Clone)]
pub struct DelegatingHasher {
    bcrypt: BCryptHasher,
    argon2: Argon2Hasher,
    default_algorithm: HashAlgorithm,
}

#[cfg(feature = "argon2")]
impl DelegatingHasher {
    pub fn new(bcrypt: BCryptHasher) -> Self {
        DelegatingHasher {
            bcrypt,
            argon2: Argon2Hasher::new(),
            default_algorithm: HashAlgorithm::BCrypt,
        }
    }

    pub fn default_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.default_algorithm = algorithm;
        self
    }

    /// Detects the algorithm a stored hash was produced with.
    pub fn detect(encoded_password: &str) -> Option<HashAlgorithm> {
        if encoded_password.starts_with("$2") {
            Some(HashAlgorithm::BCrypt)
        } else if encoded_password.starts_with("$argon2") {
            Some(HashAlgorithm::Argon2)
        } else {
            None
        }
    }
}

#[cfg(feature = "argon2")]
impl Hasher for DelegatingHasher {
    fn hash(&self, raw_password: &str) -> Result<String, HashError> {
        match self.default_algorithm {
            HashAlgorithm::BCrypt => self.bcrypt.hash(raw_password),
            HashAlgorithm::Argon2 => self.argon2.hash(raw_password),
        }
    }

    fn verify(&self, raw_password: &str, encoded_password: &str) -> bool {
        match Self::detect(encoded_password) {
            Some(HashAlgorithm::BCrypt) => self.bcrypt.verify(raw_password, encoded_password),
            Some(HashAlgorithm::Argon2) => self.argon2.verify(raw_password, encoded_password),
            None => false,
        }
    }
}
