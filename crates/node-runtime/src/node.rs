//! # Ledger Node
//!
//! Wires every subsystem around one store and one event bus.
//!
//! ```text
//!            ┌───────────────┐
//!  request ─→│ NotaryService │──commit──→ PersistentUniquenessProvider ─┐
//!            └───────┬───────┘                                         │
//!                    │ signed                                          ▼
//!                    ▼                                        Arc<dyn KeyValueStore>
//!       PersistentTransactionStore ──→ VaultService ────────────────────┘
//!                                          │
//!                                          ▼
//!                                   InMemoryEventBus ──→ track() subscribers
//! ```

use crate::config::{ConfigError, NodeConfig};
use lc_01_uniqueness::PersistentUniquenessProvider;
use lc_02_notary::{
    IdentityError, InMemoryNetworkMapCache, NotaryApi, NotaryError, NotaryIpcHandler,
    NotaryService, NotarySignature, PersistentTransactionStore, StructuralVerifier,
    SystemTimeSource,
};
use lc_03_vault::{InMemoryKeyManagement, SystemClock, VaultError, VaultService};
use shared_bus::InMemoryEventBus;
use shared_crypto::Ed25519KeyPair;
use shared_store::{open_store, KVStoreError, KeyValueStore};
use shared_types::{NodeRegistration, Party, WireTransaction};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

pub type NodeStore = Arc<dyn KeyValueStore>;
pub type NodeUniqueness = PersistentUniquenessProvider<NodeStore>;
pub type NodeTransactions = PersistentTransactionStore<NodeStore>;
pub type NodeVerifier = StructuralVerifier<Arc<NodeTransactions>>;
pub type NodeNotary = NotaryService<NodeUniqueness, NodeVerifier, SystemTimeSource>;
pub type NodeVault = VaultService<NodeStore, InMemoryKeyManagement, SystemClock>;

/// Failures while starting or driving a node.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Store failure: {0}")]
    Store(#[from] KVStoreError),

    #[error("Cannot resolve notary identity: {0}")]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Notary(#[from] NotaryError),

    #[error(transparent)]
    Vault(#[from] VaultError),
}

/// A running node: notary, uniqueness provider and vault over one store.
pub struct LedgerNode {
    config: NodeConfig,
    store: NodeStore,
    bus: Arc<InMemoryEventBus>,
    network_map: Arc<InMemoryNetworkMapCache>,
    transactions: Arc<NodeTransactions>,
    notary: Arc<NodeNotary>,
    vault: Arc<NodeVault>,
}

impl LedgerNode {
    /// Validates `config`, opens the store and builds every subsystem.
    pub fn start(config: NodeConfig) -> Result<Self, NodeError> {
        config.validate()?;

        let store = open_store(&config.store)?;
        info!(
            backend = ?config.store.backend,
            path = %config.store.path.display(),
            "Store opened"
        );

        let signing_key = match config.notary_key_seed {
            Some(seed) => Ed25519KeyPair::from_seed(seed),
            None => {
                warn!("No notary key seed configured, using an ephemeral key");
                Ed25519KeyPair::generate()
            }
        };
        let node_key = *signing_key.public_key().as_bytes();

        let bus = Arc::new(InMemoryEventBus::new());
        let transactions = Arc::new(PersistentTransactionStore::new(Arc::new(Arc::clone(&store))));

        // The node's own registration. Remote entries are fed in by whoever
        // follows the network map.
        let network_map = Arc::new(InMemoryNetworkMapCache::new());
        network_map.apply(NodeRegistration::add(
            Party::new(config.notary.legal_name.clone(), node_key),
            1,
        ));

        let uniqueness = Arc::new(PersistentUniquenessProvider::new(
            Arc::new(Arc::clone(&store)),
            config.uniqueness.clone(),
        ));
        let notary = Arc::new(NotaryService::new(
            config.notary.clone(),
            Arc::new(signing_key),
            uniqueness,
            Arc::new(StructuralVerifier::new(Arc::clone(&transactions))),
            Arc::new(SystemTimeSource),
            network_map.as_ref(),
            bus.clone(),
        )?);

        let vault = Arc::new(VaultService::new(
            Arc::new(Arc::clone(&store)),
            Arc::new(InMemoryKeyManagement::new([node_key])),
            Arc::new(SystemClock),
            Arc::clone(&bus),
            config.vault.clone(),
        )?);

        let vault_sequence = vault.last_sequence()?;
        info!(
            notary = %notary.identity(),
            kind = ?config.notary.kind,
            vault_sequence,
            "Ledger node started"
        );

        Ok(Self {
            config,
            store,
            bus,
            network_map,
            transactions,
            notary,
            vault,
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    pub fn bus(&self) -> &Arc<InMemoryEventBus> {
        &self.bus
    }

    /// Network map entries this node knows about.
    pub fn network_map(&self) -> &Arc<InMemoryNetworkMapCache> {
        &self.network_map
    }

    /// Transactions the verifier can resolve inputs against.
    pub fn transactions(&self) -> &Arc<NodeTransactions> {
        &self.transactions
    }

    pub fn notary(&self) -> &Arc<NodeNotary> {
        &self.notary
    }

    pub fn vault(&self) -> &Arc<NodeVault> {
        &self.vault
    }

    /// The party this node signs as.
    pub fn identity(&self) -> Party {
        self.notary.notary_identity()
    }

    /// Byte-level front door for remote notarisation requests.
    pub fn ipc_handler(&self) -> NotaryIpcHandler<NodeNotary> {
        NotaryIpcHandler::new(Arc::clone(&self.notary))
    }

    /// Notarises `wire_tx` and, once signed, records it for later input
    /// resolution and hands it to the vault.
    pub async fn notarise_and_record(
        &self,
        wire_tx: WireTransaction,
        caller: Party,
    ) -> Result<NotarySignature, NodeError> {
        let signature = self.notary.notarise(wire_tx.clone(), caller).await?;
        self.transactions.add(&wire_tx)?;
        if let Some(update) = self.vault.notify_all(std::slice::from_ref(&wire_tx))? {
            info!(
                sequence = update.sequence,
                produced = update.produced.len(),
                consumed = update.consumed.len(),
                "Vault updated"
            );
        }
        Ok(signature)
    }
}
