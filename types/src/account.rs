//! Chain account identifier (SS58 address).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// An SS58-encoded chain account, e.g. the hotkey that signed a commitment.
///
/// The relay never derives or verifies keys; the address is an opaque map key
/// handed out by the chain facade.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Decoded length of a single-byte-prefix SS58 address: prefix + 32-byte key + 2-byte checksum.
    const SS58_LEN: usize = 35;
    /// Decoded length of a two-byte-prefix SS58 address.
    const SS58_LONG_LEN: usize = 36;

    /// Wrap an address string as delivered by the chain.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the address is structurally a valid SS58 string.
    pub fn is_valid(&self) -> bool {
        match bs58::decode(&self.0).into_vec() {
            Ok(bytes) => bytes.len() == Self::SS58_LEN || bytes.len() == Self::SS58_LONG_LEN,
            Err(_) => false,
        }
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AccountId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let account = Self::new(s.trim());
        if account.is_valid() {
            Ok(account)
        } else {
            Err(TypesError::InvalidAccount(s.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";

    #[test]
    fn parses_well_formed_ss58() {
        let account: AccountId = ALICE.parse().expect("alice is valid");
        assert_eq!(account.as_str(), ALICE);
        assert!(account.is_valid());
    }

    #[test]
    fn rejects_garbage() {
        assert!("not-an-address".parse::<AccountId>().is_err());
        assert!("".parse::<AccountId>().is_err());
        // valid base58, wrong length
        assert!("5Grwva".parse::<AccountId>().is_err());
    }

    #[test]
    fn new_does_not_validate() {
        let account = AccountId::new("validator1");
        assert!(!account.is_valid());
        assert_eq!(account.to_string(), "validator1");
    }
}
