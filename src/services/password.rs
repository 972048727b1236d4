// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Argon2id password hashing.
//!
//! Stored format is `salt || derived-key` (16 + 32 bytes). Verification
//! re-derives with the embedded salt and compares in constant time.

use argon2::{Algorithm, Argon2, Params, Version};
use subtle::ConstantTimeEq;

pub const SALT_LEN: usize = 16;
pub const KEY_LEN: usize = 32;

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    memory_kib: u32,
    iterations: u32,
    parallelism: u32,
}

impl Default for PasswordHasher {
    /// 64 MiB, one pass, four lanes.
    fn default() -> Self {
        Self {
            memory_kib: 64 * 1024,
            iterations: 1,
            parallelism: 4,
        }
    }
}

impl PasswordHasher {
    pub fn with_params(memory_kib: u32, iterations: u32, parallelism: u32) -> Self {
        Self {
            memory_kib,
            iterations,
            parallelism,
        }
    }

    /// Hash with a fresh random salt.
    pub fn hash(&self, password: &str) -> anyhow::Result<Vec<u8>> {
        let salt: [u8; SALT_LEN] = rand::random();
        self.hash_with_salt(password, &salt)
    }

    /// Deterministic for a given salt. Output is `salt || key`.
    pub fn hash_with_salt(&self, password: &str, salt: &[u8]) -> anyhow::Result<Vec<u8>> {
        let key = self.derive(password, salt)?;
        let mut out = Vec::with_capacity(salt.len() + KEY_LEN);
        out.extend_from_slice(salt);
        out.extend_from_slice(&key);
        Ok(out)
    }

    /// Check `password` against a stored `salt || key`.
    ///
    /// Anything too short to hold a salt and a key is rejected outright.
    pub fn verify(&self, password: &str, stored: &[u8]) -> bool {
        if stored.len() != SALT_LEN + KEY_LEN {
            return false;
        }
        let (salt, expected) = stored.split_at(SALT_LEN);
        match self.derive(password, salt) {
            Ok(derived) => derived.as_slice().ct_eq(expected).into(),
            Err(err) => {
                tracing::error!(error = %err, "Password derivation failed during verify");
                false
            }
        }
    }

    fn derive(&self, password: &str, salt: &[u8]) -> anyhow::Result<[u8; KEY_LEN]> {
        let params = Params::new(
            self.memory_kib,
            self.iterations,
            self.parallelism,
            Some(KEY_LEN),
        )
        .map_err(|e| anyhow::anyhow!("invalid argon2 params: {}", e))?;
        let argon = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut key = [0u8; KEY_LEN];
        argon
            .hash_password_into(password.as_bytes(), salt, &mut key)
            .map_err(|e| anyhow::anyhow!("argon2 derivation failed: {}", e))?;
        Ok(key)
    }
}
