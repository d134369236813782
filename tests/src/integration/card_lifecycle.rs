//! # Card Lifecycle Scenarios
//!
//! Mint, reveal and fuse through the controller, checked against the ledger
//! program and the ciphertext store.

#[cfg(test)]
mod tests {
    use super::super::fixtures::LocalStack;
    use cf_04_card_operations::{CardOperationsApi, OperationError};
    use shared_bus::{EventFilter, EventTopic, FusionEvent};
    use shared_crypto::Secp256k1KeyPair;
    use shared_types::{CardAttribute, CardId, CardStats, MutatingOperation};
    use std::collections::BTreeSet;
    use std::time::Duration;

    // =========================================================================
    // FULL SCENARIO
    // =========================================================================

    #[tokio::test]
    async fn test_mint_reveal_mint_fuse() {
        let stack = LocalStack::connected().await;
        let mut cards = stack
            .controller
            .subscribe(EventFilter::topics(vec![EventTopic::Cards]));

        // Mint the first card: owned and sealed
        let first = stack.mint(50, 50, 10, 20).await;
        assert_eq!(stack.controller.registry().owned_ids(), BTreeSet::from([first]));
        assert!(stack.controller.registry().is_sealed(first));

        // Reveal it
        let stats = stack.controller.decrypt_attributes(first).await.unwrap();
        assert_eq!(stats, CardStats::new(50, 50, 10, 20));

        // Mint a second card: the first stays revealed
        let second = stack.mint(30, 70, 40, 90).await;
        let snapshot = stack.controller.snapshot();
        assert_eq!(snapshot.registry.card_ids(), vec![first, second]);
        assert!(snapshot.registry.cards[&first].is_revealed());
        assert!(snapshot.registry.cards[&second].is_sealed());

        // Fuse: both parents burned, exactly one new sealed card
        let child = stack.controller.fuse(first, second).await.unwrap();
        assert_eq!(stack.controller.registry().owned_ids(), BTreeSet::from([child]));
        assert!(stack.controller.registry().is_sealed(child));
        assert!(child != first && child != second);

        // Domain events in order
        let seen = cards.drain();
        assert!(matches!(seen[0], FusionEvent::CardMinted { card_id } if card_id == first));
        assert!(matches!(seen[1], FusionEvent::CardRevealed { card_id, .. } if card_id == first));
        assert!(matches!(seen[2], FusionEvent::CardMinted { card_id } if card_id == second));
        assert!(matches!(
            seen[3],
            FusionEvent::CardsFused { parents, child: c } if parents == (first, second) && c == child
        ));
    }

    #[tokio::test]
    async fn test_fused_attributes_are_capped_sums() {
        let stack = LocalStack::connected().await;
        let a = stack.mint(50, 50, 10, 20).await;
        let b = stack.mint(60, 20, 95, 0).await;

        let child = stack.controller.fuse(a, b).await.unwrap();

        assert_eq!(stack.ledger_values(child), [100, 70, 100, 20]);
        let revealed = stack.controller.decrypt_attributes(child).await.unwrap();
        assert_eq!(revealed, CardStats::new(100, 70, 100, 20));
    }

    #[tokio::test]
    async fn test_ciphertexts_hold_minted_values() {
        let stack = LocalStack::connected().await;
        let card = stack.mint(1, 2, 3, 4).await;
        assert_eq!(stack.ledger_values(card), [1, 2, 3, 4]);
    }

    // =========================================================================
    // VALIDATION
    // =========================================================================

    #[tokio::test]
    async fn test_out_of_range_mint_issues_no_calls() {
        let stack = LocalStack::connected().await;
        let store_before = stack.store.len();

        for stats in [
            CardStats::new(101, 0, 0, 0),
            CardStats::new(0, 0, 0, u64::MAX),
            CardStats::new(0, 200, 0, 0),
        ] {
            let result = stack.controller.mint(stats).await;
            assert!(matches!(
                result,
                Err(OperationError::InvalidAttributeRange { .. })
            ));
        }

        assert_eq!(stack.program.submission_count(), 0);
        assert_eq!(stack.store.len(), store_before);
        assert!(stack.controller.snapshot().operation.is_idle());
    }

    #[tokio::test]
    async fn test_boundary_values_mint() {
        let stack = LocalStack::connected().await;
        let card = stack.mint(0, 100, 0, 100).await;
        let stats = stack.controller.decrypt_attributes(card).await.unwrap();
        assert_eq!(stats, CardStats::new(0, 100, 0, 100));
    }

    #[tokio::test]
    async fn test_fuse_with_itself() {
        let stack = LocalStack::connected().await;
        let card = stack.mint(1, 1, 1, 1).await;

        assert_eq!(
            stack.controller.fuse(card, card).await,
            Err(OperationError::InvalidFusionPair(card))
        );
        assert_eq!(stack.program.submission_count(), 1);
        assert!(stack.controller.registry().owns(card));
    }

    // =========================================================================
    // FAILURES
    // =========================================================================

    #[tokio::test]
    async fn test_reverted_fusion_keeps_parents() {
        let stack = LocalStack::connected().await;
        let a = stack.mint(1, 1, 1, 1).await;
        let b = stack.mint(2, 2, 2, 2).await;
        stack.program.reject_submissions(Some("execution reverted"));

        let result = stack.controller.fuse(a, b).await;

        assert!(matches!(result, Err(OperationError::TransactionFailed(_))));
        assert_eq!(stack.controller.registry().owned_ids(), BTreeSet::from([a, b]));
        assert!(stack.controller.can_fuse());
    }

    #[tokio::test]
    async fn test_transferred_card_is_denied() {
        let stack = LocalStack::connected().await;
        let card = stack.mint(5, 5, 5, 5).await;

        // Hand the card to another account; the access grants stay with the minter
        let bob = Secp256k1KeyPair::generate();
        stack.program.transfer(card, bob.address()).unwrap();
        stack.wallet.switch_account(bob);
        assert_eq!(stack.controller.sync_wallet().await, Ok(true));
        assert!(stack.controller.can_decrypt(card));

        let result = stack.controller.decrypt_attributes(card).await;

        assert!(matches!(result, Err(OperationError::DecryptionRejected(_))));
        assert!(stack.controller.registry().is_sealed(card));
        // Rejections are final: one call per field
        assert_eq!(stack.runtime.decrypt_calls(), 4);
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_card_sealed() {
        let stack = LocalStack::connected().await;
        let card = stack.mint(7, 8, 9, 10).await;
        // Enough to exhaust every attempt of the first field only
        stack.runtime.inject_transient_failures(3);

        let result = stack.controller.decrypt_attributes(card).await;

        assert_eq!(
            result,
            Err(OperationError::DecryptionIncomplete {
                failed: vec![CardAttribute::Attack]
            })
        );
        assert!(stack.controller.registry().is_sealed(card));

        // Nothing partial was kept; a retry reveals all four
        let stats = stack.controller.decrypt_attributes(card).await.unwrap();
        assert_eq!(stats, CardStats::new(7, 8, 9, 10));
        assert_eq!(stack.wallet.prompt_count(), 1);
    }

    #[tokio::test]
    async fn test_transient_engine_failures_are_absorbed() {
        let stack = LocalStack::connected().await;
        let card = stack.mint(7, 8, 9, 10).await;
        stack.runtime.inject_transient_failures(2);

        let stats = stack.controller.decrypt_attributes(card).await.unwrap();

        assert_eq!(stats, CardStats::new(7, 8, 9, 10));
    }

    #[tokio::test]
    async fn test_unreachable_engine_fails_every_field() {
        let stack = LocalStack::connected().await;
        let card = stack.mint(7, 8, 9, 10).await;
        stack.runtime.inject_transient_failures(1_000);

        let result = stack.controller.decrypt_attributes(card).await;

        assert!(matches!(result, Err(OperationError::EngineNotReady(_))));
        assert!(stack.controller.registry().is_sealed(card));
    }

    // =========================================================================
    // LEDGER DRIFT
    // =========================================================================

    #[tokio::test]
    async fn test_mint_confirmed_but_unreadable() {
        let stack = LocalStack::connected().await;
        let mut errors = stack
            .controller
            .subscribe(EventFilter::topics(vec![EventTopic::Errors]));
        stack.program.fail_reads(Some("rpc timeout"));

        let result = stack.controller.mint(CardStats::new(5, 6, 7, 8)).await;

        assert!(matches!(
            result,
            Err(OperationError::ConsistencyAnomaly {
                operation: MutatingOperation::Minting,
                ref detail,
            }) if detail.contains("#1")
        ));
        assert!(stack.program.owner_of(CardId(1)).is_some());
        assert!(matches!(
            errors.try_recv(),
            Ok(Some(FusionEvent::ConsistencyAnomaly {
                operation: MutatingOperation::Minting,
                ..
            }))
        ));

        // Once the ledger answers again the card shows up sealed
        stack.program.fail_reads(None);
        let owned = stack.controller.refresh().await.unwrap();
        assert_eq!(owned, BTreeSet::from([CardId(1)]));
        assert!(stack.controller.registry().is_sealed(CardId(1)));
    }

    #[tokio::test]
    async fn test_card_replaced_during_decryption_stays_sealed() {
        let stack = LocalStack::connected().await;
        let card = stack.mint(7, 8, 9, 10).await;
        stack.runtime.set_decrypt_delay(Duration::from_millis(80));

        let (decrypted, _) = tokio::join!(stack.controller.decrypt_attributes(card), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            stack.program.rotate_handles(card).unwrap();
            stack.controller.refresh().await.unwrap();
        });

        assert!(matches!(
            decrypted,
            Err(OperationError::ConsistencyAnomaly {
                operation: MutatingOperation::Decrypting,
                ..
            })
        ));
        assert!(stack.controller.registry().is_sealed(card));

        // The replacement handles decrypt to the same values
        stack.runtime.set_decrypt_delay(Duration::ZERO);
        let stats = stack.controller.decrypt_attributes(card).await.unwrap();
        assert_eq!(stats, CardStats::new(7, 8, 9, 10));
    }
}
