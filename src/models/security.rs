// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Security settings exposed to the account owner.

use crate::models::SecurityFlags;
use serde::Serialize;
use std::str::FromStr;

/// One toggleable security flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityFlag {
    TwoFactor,
    LoginAlerts,
    AllowNewDevices,
}

impl SecurityFlag {
    pub const ALL: [SecurityFlag; 3] = [
        SecurityFlag::TwoFactor,
        SecurityFlag::LoginAlerts,
        SecurityFlag::AllowNewDevices,
    ];

    /// Key used on the wire.
    pub fn key(self) -> &'static str {
        match self {
            SecurityFlag::TwoFactor => "twoFA",
            SecurityFlag::LoginAlerts => "loginAlerts",
            SecurityFlag::AllowNewDevices => "allowNewDevices",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            SecurityFlag::TwoFactor => "Two-factor authentication",
            SecurityFlag::LoginAlerts => "Login alerts",
            SecurityFlag::AllowNewDevices => "New devices",
        }
    }

    /// Column backing the flag in the `users` table.
    pub fn column(self) -> &'static str {
        match self {
            SecurityFlag::TwoFactor => "two_fa_enabled",
            SecurityFlag::LoginAlerts => "login_alerts",
            SecurityFlag::AllowNewDevices => "allow_new_devices",
        }
    }

    pub fn get(self, flags: &SecurityFlags) -> bool {
        match self {
            SecurityFlag::TwoFactor => flags.two_fa_enabled,
            SecurityFlag::LoginAlerts => flags.login_alerts,
            SecurityFlag::AllowNewDevices => flags.allow_new_devices,
        }
    }

    pub fn set(self, flags: &mut SecurityFlags, enabled: bool) {
        match self {
            SecurityFlag::TwoFactor => flags.two_fa_enabled = enabled,
            SecurityFlag::LoginAlerts => flags.login_alerts = enabled,
            SecurityFlag::AllowNewDevices => flags.allow_new_devices = enabled,
        }
    }
}

impl FromStr for SecurityFlag {
    type Err = String;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        SecurityFlag::ALL
            .into_iter()
            .find(|flag| flag.key() == key)
            .ok_or_else(|| format!("unknown security flag {key:?}"))
    }
}

/// Security setting as listed to the client.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SecuritySetting {
    pub key: &'static str,
    pub title: &'static str,
    pub enabled: bool,
}

impl SecuritySetting {
    pub fn list(flags: &SecurityFlags) -> Vec<SecuritySetting> {
        SecurityFlag::ALL
            .into_iter()
            .map(|flag| SecuritySetting {
                key: flag.key(),
                title: flag.title(),
                enabled: flag.get(flags),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_keys_round_trip() {
        for flag in SecurityFlag::ALL {
            assert_eq!(flag.key().parse::<SecurityFlag>(), Ok(flag));
        }
        assert!("rootAccess".parse::<SecurityFlag>().is_err());
    }

    #[test]
    fn test_list_reflects_flags() {
        let mut flags = SecurityFlags::default();
        SecurityFlag::LoginAlerts.set(&mut flags, true);

        let list = SecuritySetting::list(&flags);
        assert_eq!(list.len(), 3);
        assert!(!list[0].enabled);
        assert!(list[1].enabled);
        assert_eq!(list[1].key, "loginAlerts");
    }
}
