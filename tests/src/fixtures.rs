//! Shared builders for integration tests and benchmarks.

use lc_02_notary::{
    InMemoryNetworkMapCache, InMemoryTransactionStore, ManualTimeSource, NotaryConfig,
    NotaryService, StructuralVerifier,
};
use lc_01_uniqueness::InMemoryUniquenessProvider;
use lc_03_vault::{InMemoryKeyManagement, ManualClock, VaultConfig, VaultService};
use shared_bus::InMemoryEventBus;
use shared_crypto::Ed25519KeyPair;
use shared_store::InMemoryKVStore;
use shared_types::{
    Command, Hash, Party, StateAndRef, StateData, StateRef, TransactionState, WireTransaction,
};
use std::sync::Arc;

pub type TestVault = VaultService<InMemoryKVStore, InMemoryKeyManagement, ManualClock>;
pub type TestNotary = NotaryService<
    InMemoryUniquenessProvider,
    StructuralVerifier<Arc<InMemoryTransactionStore>>,
    ManualTimeSource,
>;

pub const CASH: &str = "cash.CashState";

pub fn registrar() -> Party {
    Party::new("O=Registrar,L=London,C=GB", [1; 32])
}

pub fn other() -> Party {
    Party::new("O=Other,L=Paris,C=FR", [2; 32])
}

pub fn bank() -> Party {
    Party::new("O=Bank A,L=London,C=GB", [7; 32])
}

pub fn notary_party() -> Party {
    Party::new("O=Notary Service,L=Zurich,C=CH", [9; 32])
}

pub fn sref(tx: u8, index: u32) -> StateRef {
    StateRef::new([tx; 32], index)
}

/// A transaction id distinct for every `n`.
pub fn tx_id(n: u64) -> Hash {
    let mut id = [0u8; 32];
    id[..8].copy_from_slice(&n.to_be_bytes());
    id[31] = 0xEE;
    id
}

/// A cash state owned by [`bank`].
pub fn cash(tx: u8, index: u32, quantity: i64) -> StateAndRef {
    StateAndRef {
        state: TransactionState {
            data: StateData::new(CASH)
                .with_participant(bank())
                .with_field("quantity", quantity)
                .with_field("currency", "GBP"),
            notary: notary_party(),
        },
        state_ref: sref(tx, index),
    }
}

/// Vault over a fresh in-memory store. `bank()` is the only local key.
pub fn vault() -> TestVault {
    vault_on(Arc::new(InMemoryEventBus::new()))
}

pub fn vault_on(bus: Arc<InMemoryEventBus>) -> TestVault {
    VaultService::new(
        Arc::new(InMemoryKVStore::new()),
        Arc::new(InMemoryKeyManagement::new([bank().owning_key])),
        Arc::new(ManualClock::new(1_000)),
        bus,
        VaultConfig::default(),
    )
    .expect("in-memory vault opens")
}

/// A notary backed by in-memory uniqueness, with the clock at 1_000_000.
/// Its identity is registered in a network map holding only itself.
pub fn notary(config: NotaryConfig) -> (TestNotary, Arc<InMemoryTransactionStore>) {
    let store = Arc::new(InMemoryTransactionStore::new());
    let key = Ed25519KeyPair::from_seed([42; 32]);
    let network_map = InMemoryNetworkMapCache::with_identities([Party::new(
        config.legal_name.clone(),
        *key.public_key().as_bytes(),
    )]);
    let notary = NotaryService::new(
        config,
        Arc::new(key),
        Arc::new(InMemoryUniquenessProvider::new()),
        Arc::new(StructuralVerifier::new(Arc::clone(&store))),
        Arc::new(ManualTimeSource::new(1_000_000)),
        &network_map,
        Arc::new(InMemoryEventBus::new()),
    )
    .expect("notary identity is registered");
    (notary, store)
}

/// Issues `quantity` cash to [`bank`] under `notary`.
pub fn issue(notary: &Party, quantity: i64) -> WireTransaction {
    WireTransaction::new(
        vec![],
        vec![],
        vec![TransactionState {
            data: StateData::new(CASH)
                .with_participant(bank())
                .with_field("quantity", quantity),
            notary: notary.clone(),
        }],
        vec![Command::new("cash.Issue")],
        Some(notary.clone()),
    )
    .expect("issuance encodes")
}

/// Moves `inputs` into a single output tagged with `owner`.
pub fn spend(inputs: Vec<StateRef>, notary: &Party, owner: &str) -> WireTransaction {
    WireTransaction::new(
        inputs,
        vec![],
        vec![TransactionState {
            data: StateData::new(CASH)
                .with_participant(bank())
                .with_field("owner", owner),
            notary: notary.clone(),
        }],
        vec![Command::new("cash.Move")],
        Some(notary.clone()),
    )
    .expect("spend encodes")
}
