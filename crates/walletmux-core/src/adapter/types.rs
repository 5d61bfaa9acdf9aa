/*
[INPUT]:  Adapter declarations and hub-provided settings
[OUTPUT]: Descriptors, capability sets, login/user payloads
[POS]:    Adapter layer - data types shared by adapters, plugins and the hub
[UPDATE]: When adding capabilities or adapter settings
*/

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::chain::{ChainConfig, ChainNamespace};
use crate::hub::AuthNetwork;

/// Namespace an adapter or plugin serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterNamespace {
    Eip155,
    Solana,
    Other,
    /// Serves any chain namespace
    Multichain,
}

impl AdapterNamespace {
    pub fn supports(&self, chain: ChainNamespace) -> bool {
        match self {
            AdapterNamespace::Multichain => true,
            AdapterNamespace::Eip155 => chain == ChainNamespace::Eip155,
            AdapterNamespace::Solana => chain == ChainNamespace::Solana,
            AdapterNamespace::Other => chain == ChainNamespace::Other,
        }
    }
}

impl fmt::Display for AdapterNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AdapterNamespace::Eip155 => "eip155",
            AdapterNamespace::Solana => "solana",
            AdapterNamespace::Other => "other",
            AdapterNamespace::Multichain => "multichain",
        };
        f.write_str(name)
    }
}

impl From<ChainNamespace> for AdapterNamespace {
    fn from(namespace: ChainNamespace) -> Self {
        match namespace {
            ChainNamespace::Eip155 => AdapterNamespace::Eip155,
            ChainNamespace::Solana => AdapterNamespace::Solana,
            ChainNamespace::Other => AdapterNamespace::Other,
        }
    }
}

/// How the adapter reaches its wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterKind {
    SocialLogin,
    Injected,
    RemoteSession,
}

/// Operations an adapter declares support for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Login,
    ChainAdd,
    ChainSwitch,
    UserInfo,
    Authenticate,
}

impl Capability {
    fn bit(self) -> u8 {
        match self {
            Capability::Login => 1,
            Capability::ChainAdd => 1 << 1,
            Capability::ChainSwitch => 1 << 2,
            Capability::UserInfo => 1 << 3,
            Capability::Authenticate => 1 << 4,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::Login => "connect",
            Capability::ChainAdd => "addChain",
            Capability::ChainSwitch => "switchChain",
            Capability::UserInfo => "getUserInfo",
            Capability::Authenticate => "authenticateUser",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CapabilitySet(u8);

impl CapabilitySet {
    pub fn none() -> Self {
        Self(0)
    }

    pub fn all() -> Self {
        Self::none()
            .with(Capability::Login)
            .with(Capability::ChainAdd)
            .with(Capability::ChainSwitch)
            .with(Capability::UserInfo)
            .with(Capability::Authenticate)
    }

    pub fn with(self, capability: Capability) -> Self {
        Self(self.0 | capability.bit())
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }
}

/// Static identity of an adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterDescriptor {
    pub name: String,
    pub namespace: AdapterNamespace,
    pub kind: AdapterKind,
    pub capabilities: CapabilitySet,
}

impl AdapterDescriptor {
    /// Descriptor declaring only the login capability
    pub fn new(name: impl Into<String>, namespace: AdapterNamespace, kind: AdapterKind) -> Self {
        Self {
            name: name.into(),
            namespace,
            kind,
            capabilities: CapabilitySet::none().with(Capability::Login),
        }
    }

    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capabilities = self.capabilities.with(capability);
        self
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities.contains(capability)
    }
}

/// Settings the hub pushes into adapters before init
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdapterSettings {
    pub chain_config: Option<ChainConfig>,
    pub client_id: Option<String>,
    pub session_time: Option<u64>,
    pub network: Option<AuthNetwork>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InitOptions {
    /// Restore the cached session during init
    pub auto_connect: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisconnectOptions {
    /// Reset the adapter to an uninitialized state
    pub cleanup: bool,
}

/// Adapter-specific login parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_provider: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Partial profile of the connected user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verifier_id: Option<String>,
}

/// Signed identity assertion produced by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAuthInfo {
    pub id_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_set() {
        let caps = CapabilitySet::none().with(Capability::ChainSwitch);
        assert!(caps.contains(Capability::ChainSwitch));
        assert!(!caps.contains(Capability::UserInfo));
        assert!(CapabilitySet::all().contains(Capability::Authenticate));
    }

    #[test]
    fn test_multichain_supports_every_namespace() {
        for ns in [ChainNamespace::Eip155, ChainNamespace::Solana, ChainNamespace::Other] {
            assert!(AdapterNamespace::Multichain.supports(ns));
        }
        assert!(!AdapterNamespace::Solana.supports(ChainNamespace::Eip155));
    }

    #[test]
    fn test_login_params_keep_extra_fields() {
        let params: LoginParams =
            serde_json::from_str(r#"{"loginProvider":"google","loginHint":"a@b.c"}"#).unwrap();
        assert_eq!(params.login_provider.as_deref(), Some("google"));
        assert_eq!(params.extra["loginHint"], "a@b.c");
    }
}
