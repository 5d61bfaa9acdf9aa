/*
[INPUT]:  Remote-session payloads with CAIP-10 account ids
[OUTPUT]: Flat address lists and account permission checks
[POS]:    Adapter layer - session normalization for remote-session connectors
[UPDATE]: When supporting new account id formats
*/

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::chain::ChainNamespace;
use crate::error::{Result, WalletError};

/// Approved scope of one namespace inside a session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionNamespace {
    /// CAIP-10 account ids, e.g. `eip155:1:0xab...`
    pub accounts: Vec<String>,
    #[serde(default)]
    pub chains: Vec<String>,
    #[serde(default)]
    pub methods: Vec<String>,
    #[serde(default)]
    pub events: Vec<String>,
}

/// Session established by a remote-session backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub topic: String,
    pub namespaces: BTreeMap<String, SessionNamespace>,
}

/// Parsed CAIP-10 account id (`namespace:reference:address`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountId {
    pub namespace: String,
    pub reference: String,
    pub address: String,
}

impl FromStr for AccountId {
    type Err = WalletError;

    fn from_str(raw: &str) -> Result<Self> {
        let mut parts = raw.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(namespace), Some(reference), Some(address))
                if !namespace.is_empty() && !reference.is_empty() && !address.is_empty() =>
            {
                Ok(Self {
                    namespace: namespace.to_string(),
                    reference: reference.to_string(),
                    address: address.to_string(),
                })
            }
            _ => Err(WalletError::InvalidParams(format!(
                "invalid CAIP-10 account id: {raw:?}"
            ))),
        }
    }
}

impl SessionData {
    /// Every well-formed account id in the session; malformed ids are skipped
    pub fn account_ids(&self) -> Vec<AccountId> {
        self.namespaces
            .values()
            .flat_map(|ns| ns.accounts.iter())
            .filter_map(|raw| match raw.parse::<AccountId>() {
                Ok(id) => Some(id),
                Err(e) => {
                    warn!(error = %e, "skipping session account");
                    None
                }
            })
            .collect()
    }

    /// Distinct addresses of one namespace, in session order
    pub fn addresses(&self, namespace: ChainNamespace) -> Vec<String> {
        let mut addresses: Vec<String> = Vec::new();
        for id in self.account_ids() {
            if id.namespace != namespace.as_str() {
                continue;
            }
            if !addresses.iter().any(|seen| same_address(namespace, seen, &id.address)) {
                addresses.push(id.address);
            }
        }
        addresses
    }

    /// Whether the session approved `address` in `namespace`
    pub fn is_account_allowed(&self, namespace: ChainNamespace, address: &str) -> bool {
        self.addresses(namespace)
            .iter()
            .any(|allowed| same_address(namespace, allowed, address))
    }
}

/// EIP-155 addresses are hex and compare case-insensitively; others are exact
pub fn same_address(namespace: ChainNamespace, a: &str, b: &str) -> bool {
    match namespace {
        ChainNamespace::Eip155 => a.eq_ignore_ascii_case(b),
        _ => a == b,
    }
}
