//! Legacy Lookup Adapter
//!
//! Bridges old-style single-registry queries onto the hierarchical
//! model. Legacy callers address a name by its flat namehash; when the
//! adapter does not know the plaintext behind a hash it answers with a
//! structured off-chain redirect instead of failing. The caller's
//! transport substitutes `{sender}` / `{data}` into one of the redirect
//! URL templates, fetches it, and resumes the lookup with the gateway's
//! JSON payload. The adapter itself never performs the fetch.

use std::collections::HashMap;
use std::sync::Arc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use lib_naming::{namehash, wire_name_to_dotted, Address, LabelHash};

use crate::errors::{ResolveError, ResolveResult};
use crate::resolver::UniversalResolver;

/// Structured redirect for data that must be fetched off-chain.
///
/// URL templates carry `{sender}` and `{data}` placeholders; fetching,
/// parsing, and verifying the payload are the transport's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffchainRedirect {
    /// Gateway URL templates, in preference order
    pub urls: Vec<String>,
    /// The adapter's own address, substituted for `{sender}`
    pub sender: Address,
    /// Hex-encoded request data, substituted for `{data}`
    pub data: String,
}

impl OffchainRedirect {
    /// Substitute the placeholders into every URL template
    pub fn callback_urls(&self) -> Vec<String> {
        self.urls
            .iter()
            .map(|template| {
                template
                    .replace("{sender}", &self.sender.to_string())
                    .replace("{data}", &self.data)
            })
            .collect()
    }
}

/// Expected JSON body of a gateway response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayResponse {
    /// Hex-encoded wire name of the queried node
    pub data: String,
}

/// Answer on the legacy single-hop surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegacyAnswer {
    /// Resolver for the queried node; the zero address means "none",
    /// matching the flat-registry dialect legacy callers expect
    Resolved(Address),
    /// The plaintext name is not known locally; fetch it off-chain
    Redirect(OffchainRedirect),
}

/// Flat-hash lookup bridge over the universal resolver
pub struct LegacyLookup {
    engine: Arc<UniversalResolver>,
    /// This adapter's address, echoed in redirects
    sender: Address,
    /// Gateway URL templates handed out in redirects
    gateway_urls: Vec<String>,
    /// Learned namehash → dotted-name bindings
    known: RwLock<HashMap<LabelHash, String>>,
}

impl LegacyLookup {
    /// Create an adapter over the resolution engine
    pub fn new(engine: Arc<UniversalResolver>, sender: Address, gateway_urls: Vec<String>) -> Self {
        info!(
            sender = %sender,
            gateways = gateway_urls.len(),
            "Legacy lookup adapter initialized"
        );
        Self {
            engine,
            sender,
            gateway_urls,
            known: RwLock::new(HashMap::new()),
        }
    }

    /// Preload a namehash → name binding so the next lookup is single-hop
    pub async fn register_name(&self, name: &str) {
        let node = namehash(name);
        self.known.write().await.insert(node, name.to_string());
    }

    /// Legacy single-hop resolver lookup by namehash.
    ///
    /// Known hashes resolve through the hierarchy immediately; unknown
    /// ones come back as a redirect carrying the hash as request data.
    pub async fn resolver(&self, node: LabelHash) -> ResolveResult<LegacyAnswer> {
        let name = self.known.read().await.get(&node).cloned();
        match name {
            Some(name) => {
                let resolution = self.engine.resolve(&name).await?;
                Ok(LegacyAnswer::Resolved(
                    resolution.resolver.unwrap_or(Address::zero()),
                ))
            }
            None => {
                debug!(node = %node, "Namehash unknown locally, issuing off-chain redirect");
                Ok(LegacyAnswer::Redirect(OffchainRedirect {
                    urls: self.gateway_urls.clone(),
                    sender: self.sender,
                    data: hex::encode(node.as_bytes()),
                }))
            }
        }
    }

    /// Resume a lookup with the gateway payload the transport fetched.
    ///
    /// The payload must be the JSON body `{ "data": "<hex wire name>" }`
    /// whose decoded name hashes back to the queried node; anything else
    /// is rejected without touching adapter state.
    pub async fn resolver_with_response(
        &self,
        node: LabelHash,
        payload: &[u8],
    ) -> ResolveResult<Address> {
        let body: GatewayResponse = serde_json::from_slice(payload)
            .map_err(|e| ResolveError::BadGatewayPayload(e.to_string()))?;
        let hex_data = body.data.strip_prefix("0x").unwrap_or(&body.data);
        let wire = hex::decode(hex_data)
            .map_err(|e| ResolveError::BadGatewayPayload(format!("data is not hex: {}", e)))?;
        let name = wire_name_to_dotted(&wire)?;

        let actual = namehash(&name);
        if actual != node {
            return Err(ResolveError::NamehashMismatch {
                expected: node,
                actual,
            });
        }

        self.known.write().await.insert(node, name.clone());
        info!(node = %node, name = %name, "Learned namehash binding from gateway");

        let resolution = self.engine.resolve(&name).await?;
        Ok(resolution.resolver.unwrap_or(Address::zero()))
    }
}
