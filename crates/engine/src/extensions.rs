//! Extension composition.
//!
//! Registered providers are pure functions of a context bag; each returns a
//! named sub-object (or nothing) merged under the document's `extensions`
//! field. Providers run in registration order, so the composed object's key
//! order is reproducible.

use serde_json::{json, Map, Value};

/// Block-binding data made available to the `blockbind` provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockBindData {
    pub prev_block_hash: String,
    pub modified_merkle_root: String,
}

/// The context bag handed to every provider.
#[derive(Debug, Clone, Default)]
pub struct ExtensionContext {
    pub block_bind: Option<BlockBindData>,
    pub mining_candidate: Option<Value>,
    pub fee_spec: Option<Value>,
    pub miner_params: Option<Value>,
}

type Provider = Box<dyn Fn(&ExtensionContext) -> Option<Value> + Send + Sync>;

/// Registry of named extension providers, invoked in registration order.
pub struct ExtensionComposer {
    providers: Vec<(String, Provider)>,
}

impl ExtensionComposer {
    /// An empty composer with no providers.
    pub fn empty() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// The standard provider set: blockbind, feeSpec, minerparams.
    pub fn with_defaults() -> Self {
        let mut composer = Self::empty();
        composer.register("blockbind", |ctx| {
            ctx.block_bind.as_ref().map(|bind| {
                json!({
                    "prevBlockHash": bind.prev_block_hash,
                    "modifiedMerkleRoot": bind.modified_merkle_root,
                })
            })
        });
        composer.register("feeSpec", |ctx| ctx.fee_spec.clone());
        composer.register("minerparams", |ctx| ctx.miner_params.clone());
        composer
    }

    /// Register a provider under a name. Later registrations render later.
    pub fn register<F>(&mut self, name: &str, provider: F)
    where
        F: Fn(&ExtensionContext) -> Option<Value> + Send + Sync + 'static,
    {
        self.providers.push((name.to_string(), Box::new(provider)));
    }

    /// Invoke every provider against the context; `None` when no provider
    /// contributed anything (the document omits the field entirely).
    pub fn compose(&self, ctx: &ExtensionContext) -> Option<Map<String, Value>> {
        let mut merged = Map::new();
        for (name, provider) in &self.providers {
            if let Some(value) = provider(ctx) {
                merged.insert(name.clone(), value);
            }
        }
        if merged.is_empty() {
            None
        } else {
            Some(merged)
        }
    }
}

impl Default for ExtensionComposer {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_context_composes_nothing() {
        let composer = ExtensionComposer::with_defaults();
        assert!(composer.compose(&ExtensionContext::default()).is_none());
    }

    #[test]
    fn test_blockbind_provider() {
        let composer = ExtensionComposer::with_defaults();
        let ctx = ExtensionContext {
            block_bind: Some(BlockBindData {
                prev_block_hash: "aa".repeat(32),
                modified_merkle_root: "bb".repeat(32),
            }),
            ..Default::default()
        };

        let merged = composer.compose(&ctx).unwrap();
        let bind = merged.get("blockbind").unwrap();
        assert_eq!(bind["prevBlockHash"], "aa".repeat(32));
        assert_eq!(bind["modifiedMerkleRoot"], "bb".repeat(32));
    }

    #[test]
    fn test_providers_render_in_registration_order() {
        let composer = ExtensionComposer::with_defaults();
        let ctx = ExtensionContext {
            block_bind: Some(BlockBindData {
                prev_block_hash: "aa".repeat(32),
                modified_merkle_root: "bb".repeat(32),
            }),
            fee_spec: Some(json!({"defaultFee": 500})),
            miner_params: Some(json!({"policy": {}})),
            ..Default::default()
        };

        let merged = composer.compose(&ctx).unwrap();
        let keys: Vec<&String> = merged.keys().collect();
        assert_eq!(keys, ["blockbind", "feeSpec", "minerparams"]);
    }

    #[test]
    fn test_custom_provider() {
        let mut composer = ExtensionComposer::empty();
        composer.register("candidateInfo", |ctx| ctx.mining_candidate.clone());

        let ctx = ExtensionContext {
            mining_candidate: Some(json!({"id": "abc"})),
            ..Default::default()
        };
        let merged = composer.compose(&ctx).unwrap();
        assert_eq!(merged.get("candidateInfo").unwrap()["id"], "abc");
    }

    #[test]
    fn test_providers_are_pure() {
        let composer = ExtensionComposer::with_defaults();
        let ctx = ExtensionContext {
            fee_spec: Some(json!({"defaultFee": 500})),
            ..Default::default()
        };
        assert_eq!(composer.compose(&ctx), composer.compose(&ctx));
    }
}
