//! Notary flows end to end: request bytes in, signature or typed error out,
//! and the vault fed from what was signed.

#[cfg(test)]
mod tests {
    use crate::fixtures::{bank, notary, other, registrar, spend, vault_on, CASH};
    use lc_01_uniqueness::{ConsumingTx, UniquenessProvider};
    use lc_02_notary::ipc::{decode_response, encode_request};
    use lc_02_notary::{
        NotarisationRequest, NotaryApi, NotaryConfig, NotaryError, NotaryIpcHandler, NotaryKind,
    };
    use lc_03_vault::{
        PageSpecification, QueryCriteria, Sort, StatusFilter, VaultApi, VaultQueryCriteria,
    };
    use shared_bus::{EventFilter, EventTopic, InMemoryEventBus, LedgerEvent};
    use shared_types::{Command, StateData, StateRef, TransactionState, WireTransaction};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_double_spend_over_the_wire() {
        let (notary, _) = notary(NotaryConfig::default());
        let me = notary.identity().clone();
        let handler = NotaryIpcHandler::new(Arc::new(notary));
        let s1 = StateRef::new([5; 32], 0);

        let wire_tx = spend(vec![s1], &me, "registrar");
        let request = NotarisationRequest {
            wire_transaction: wire_tx.clone(),
            caller: registrar(),
        };
        let bytes = handler.handle_bytes(&encode_request(&request).unwrap()).await.unwrap();
        let signature = decode_response(&bytes).unwrap().into_result().unwrap();
        assert!(signature.verify(&wire_tx.id).is_ok());

        let wire_tx2 = spend(vec![s1], &me, "other");
        let request = NotarisationRequest {
            wire_transaction: wire_tx2.clone(),
            caller: other(),
        };
        let bytes = handler.handle_bytes(&encode_request(&request).unwrap()).await.unwrap();
        let err = decode_response(&bytes).unwrap().into_result().unwrap_err();
        let NotaryError::Conflict { tx_id, conflict } = err else {
            panic!("expected conflict, got {err:?}");
        };
        assert_eq!(tx_id, wire_tx2.id);
        assert_eq!(
            conflict.consumed_by(&s1),
            Some(&ConsumingTx::new(wire_tx.id, 0, registrar()))
        );
    }

    #[tokio::test]
    async fn test_malformed_bytes_are_a_framing_error() {
        let (notary, _) = notary(NotaryConfig::default());
        let handler = NotaryIpcHandler::new(Arc::new(notary));
        assert!(handler.handle_bytes(&[0xFF, 0x01]).await.is_err());
    }

    #[tokio::test]
    async fn test_validating_notary_keeps_table_clean() {
        let (notary, store) = notary(NotaryConfig {
            kind: NotaryKind::Validating,
            ..NotaryConfig::default()
        });
        let me = notary.identity().clone();

        let unresolved = spend(vec![StateRef::new([8; 32], 0)], &me, "x");
        let err = notary.notarise(unresolved, registrar()).await.unwrap_err();
        assert!(matches!(err, NotaryError::TransactionInvalid { .. }));
        assert_eq!(notary.uniqueness().conflict_table_size().unwrap(), 0);

        let issuance = WireTransaction::new(
            vec![],
            vec![],
            vec![TransactionState {
                data: StateData::new(CASH).with_participant(bank()),
                notary: me.clone(),
            }],
            vec![Command::new("cash.Issue")],
            Some(me.clone()),
        )
        .unwrap();
        store.add(issuance.clone());

        let resolvable = spend(vec![issuance.out_refs()[0].state_ref], &me, "x");
        notary.notarise(resolvable, registrar()).await.unwrap();
        assert_eq!(notary.uniqueness().conflict_table_size().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_signed_transactions_feed_the_vault() {
        let bus = Arc::new(InMemoryEventBus::new());
        let vault = vault_on(Arc::clone(&bus));
        let (notary, _) = notary(NotaryConfig::default());
        let me = notary.identity().clone();
        let mut vault_events = bus.subscribe(EventFilter::topics(vec![EventTopic::Vault]));

        let issuance = crate::fixtures::issue(&me, 100);
        let redemption = spend(vec![issuance.out_refs()[0].state_ref], &me, "bank");
        for tx in [&issuance, &redemption] {
            notary.notarise(tx.clone(), bank()).await.unwrap();
        }
        vault
            .notify_all(&[issuance.clone(), redemption.clone()])
            .unwrap();

        let all: QueryCriteria = VaultQueryCriteria::new()
            .with_status(StatusFilter::All)
            .into();
        let page = vault
            .query(&all, &PageSpecification::new(1, 10), &Sort::default())
            .unwrap();
        assert_eq!(page.total_states_available, 2);

        let unconsumed = vault
            .query(&QueryCriteria::default(), &PageSpecification::default(), &Sort::default())
            .unwrap();
        assert_eq!(unconsumed.states[0].state_ref, redemption.out_refs()[0].state_ref);

        let Some(LedgerEvent::VaultUpdated(update)) = vault_events.try_recv().unwrap() else {
            panic!("expected one vault update");
        };
        assert_eq!(update.consumed.len(), 0);
        assert_eq!(update.produced.len(), 1);
        assert_eq!(update.produced[0].state_ref, redemption.out_refs()[0].state_ref);
    }
}
