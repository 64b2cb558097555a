//! Notary Service
//!
//! Drives one request through the notarisation phases and signs the
//! transaction id when every check passes. No internal retries: a conflict
//! is final and a storage fault is returned to the caller as
//! `ServiceUnavailable`.

use crate::config::{NotaryConfig, NotaryKind};
use crate::domain::{check_time_window, Notarisation, NotarisationPhase, NotarySignature};
use crate::error::{IdentityError, NotaryError, NotaryResult};
use crate::ports::inbound::NotaryApi;
use crate::ports::outbound::{NetworkMapCache, TimeSource, TransactionVerifier};
use async_trait::async_trait;
use lc_01_uniqueness::UniquenessProvider;
use ledger_telemetry::{
    metric_inc, subsystem_span, time_histogram, NOTARY_COMMITS, NOTARY_COMMIT_DURATION,
    NOTARY_CONFLICTS,
};
use shared_bus::{EventPublisher, LedgerEvent};
use shared_crypto::Ed25519KeyPair;
use shared_types::{short_hex, Party, PartyName, WireTransaction};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Notary service.
///
/// Generic over its driven ports so tests can substitute an in-memory
/// uniqueness provider and a manual clock.
pub struct NotaryService<U, V, T>
where
    U: UniquenessProvider,
    V: TransactionVerifier,
    T: TimeSource,
{
    config: NotaryConfig,
    identity: Party,
    signing_key: Arc<Ed25519KeyPair>,
    uniqueness: Arc<U>,
    verifier: Arc<V>,
    clock: Arc<T>,
    publisher: Arc<dyn EventPublisher>,
}

impl<U, V, T> NotaryService<U, V, T>
where
    U: UniquenessProvider,
    V: TransactionVerifier,
    T: TimeSource,
{
    /// Builds the service, resolving the notary's identity for
    /// `config.legal_name` through `network_map`. The registered key must be
    /// the one `signing_key` signs with.
    pub fn new(
        config: NotaryConfig,
        signing_key: Arc<Ed25519KeyPair>,
        uniqueness: Arc<U>,
        verifier: Arc<V>,
        clock: Arc<T>,
        network_map: &dyn NetworkMapCache,
        publisher: Arc<dyn EventPublisher>,
    ) -> Result<Self, IdentityError> {
        let name = PartyName::new(config.legal_name.clone());
        let identity = network_map
            .party_from_name(&name, clock.now_millis())
            .ok_or_else(|| IdentityError::NotRegistered(name.clone()))?;
        if identity.owning_key != *signing_key.public_key().as_bytes() {
            error!(notary = %name, "Registered notary key differs from the signing key");
            return Err(IdentityError::KeyMismatch(name));
        }

        info!(
            notary = %identity,
            kind = ?config.kind,
            tolerance_ms = config.time_tolerance_ms,
            "Notary service created"
        );
        Ok(Self {
            config,
            identity,
            signing_key,
            uniqueness,
            verifier,
            clock,
            publisher,
        })
    }

    pub fn identity(&self) -> &Party {
        &self.identity
    }

    pub fn config(&self) -> &NotaryConfig {
        &self.config
    }

    pub fn uniqueness(&self) -> &Arc<U> {
        &self.uniqueness
    }

    /// Processes one notarisation request.
    pub fn process_commit(
        &self,
        wire_tx: &WireTransaction,
        caller: &Party,
    ) -> NotaryResult<NotarySignature> {
        let span = subsystem_span!(
            "notarise",
            subsystem = "notary",
            tx_id = %short_hex(&wire_tx.id),
            caller = %caller
        );
        let _entered = span.enter();
        let _timer = time_histogram!(NOTARY_COMMIT_DURATION);

        let mut notarisation = Notarisation::new(wire_tx.id);
        let result = self.run_phases(&mut notarisation, wire_tx, caller);

        match &result {
            Ok(_) => {
                metric_inc!(NOTARY_COMMITS, &["signed"]);
                info!(inputs = wire_tx.inputs.len(), "Transaction notarised");
                self.publisher.publish(LedgerEvent::TransactionNotarised {
                    tx_id: wire_tx.id,
                    requesting_party: caller.name.clone(),
                    input_count: wire_tx.inputs.len(),
                });
            }
            Err(e) => {
                notarisation.reject();
                metric_inc!(NOTARY_COMMITS, &[e.outcome_label()]);
                if matches!(e, NotaryError::Conflict { .. }) {
                    metric_inc!(NOTARY_CONFLICTS);
                }
                if e.is_transient() {
                    warn!(error = %e, "Notarisation failed, caller may retry");
                } else {
                    info!(error = %e, "Notarisation rejected");
                }
                self.publisher.publish(LedgerEvent::NotarisationRejected {
                    tx_id: wire_tx.id,
                    reason: e.to_string(),
                });
            }
        }
        debug!(phases = ?notarisation.history(), "Notarisation finished");
        result
    }

    fn run_phases(
        &self,
        notarisation: &mut Notarisation,
        wire_tx: &WireTransaction,
        caller: &Party,
    ) -> NotaryResult<NotarySignature> {
        // Received
        self.check_notary(wire_tx)?;

        self.advance(notarisation, NotarisationPhase::TimeWindowCheck)?;
        check_time_window(
            wire_tx,
            self.clock.now_millis(),
            self.config.time_tolerance_ms,
        )?;

        match self.config.kind {
            NotaryKind::Validating => {
                self.advance(notarisation, NotarisationPhase::ContractValidation)?;
                self.verifier.verify(wire_tx).map_err(|e| {
                    if e.is_transient() {
                        NotaryError::ServiceUnavailable {
                            reason: e.to_string(),
                        }
                    } else {
                        NotaryError::TransactionInvalid {
                            reason: e.to_string(),
                        }
                    }
                })?;
            }
            NotaryKind::NonValidating => {
                if !wire_tx.has_valid_id() {
                    return Err(NotaryError::TransactionInvalid {
                        reason: "transaction id does not match its content".to_string(),
                    });
                }
            }
        }

        self.advance(notarisation, NotarisationPhase::UniquenessCheck)?;
        self.uniqueness
            .commit_with_references(&wire_tx.inputs, &wire_tx.references, wire_tx.id, caller)
            .map_err(|e| NotaryError::from_uniqueness(wire_tx.id, e))?;

        self.advance(notarisation, NotarisationPhase::Signed)?;
        Ok(NotarySignature::sign(
            &self.signing_key,
            self.identity.clone(),
            wire_tx.id,
        ))
    }

    fn check_notary(&self, wire_tx: &WireTransaction) -> NotaryResult<()> {
        match &wire_tx.notary {
            Some(notary) if *notary == self.identity => Ok(()),
            other => Err(NotaryError::WrongNotary {
                expected: self.identity.name.clone(),
                actual: other.as_ref().map(|p| p.name.clone()),
            }),
        }
    }

    fn advance(
        &self,
        notarisation: &mut Notarisation,
        next: NotarisationPhase,
    ) -> NotaryResult<()> {
        notarisation.advance(next).map_err(|e| {
            error!(error = %e, "Notarisation state machine violated");
            NotaryError::ServiceUnavailable {
                reason: e.to_string(),
            }
        })
    }
}

#[async_trait]
impl<U, V, T> NotaryApi for NotaryService<U, V, T>
where
    U: UniquenessProvider + 'static,
    V: TransactionVerifier + 'static,
    T: TimeSource + 'static,
{
    async fn notarise(
        &self,
        wire_tx: WireTransaction,
        caller: Party,
    ) -> NotaryResult<NotarySignature> {
        self.process_commit(&wire_tx, &caller)
    }

    fn notary_identity(&self) -> Party {
        self.identity.clone()
    }
}
