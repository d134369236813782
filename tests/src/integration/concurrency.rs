//! # Concurrency Scenarios
//!
//! Operation claims under interleaving, refresh alongside a mutating
//! operation, and the readiness predicates observed mid-flight.

#[cfg(test)]
mod tests {
    use super::super::fixtures::LocalStack;
    use cf_04_card_operations::{CardOperationsApi, OperationError};
    use shared_types::{CardStats, MutatingOperation, OperationPhase};
    use std::time::Duration;

    async fn pause(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test]
    async fn test_fuse_during_mint_is_rejected() {
        let stack = LocalStack::connected().await;
        let a = stack.mint(1, 1, 1, 1).await;
        let b = stack.mint(2, 2, 2, 2).await;
        stack.program.set_submission_delay(50);

        let (minted, fused) = tokio::join!(
            stack.controller.mint(CardStats::new(3, 3, 3, 3)),
            async {
                pause(10).await;
                stack.controller.fuse(a, b).await
            }
        );

        assert!(minted.is_ok());
        assert_eq!(
            fused,
            Err(OperationError::OperationInProgress {
                requested: MutatingOperation::Fusing,
                active: MutatingOperation::Minting,
            })
        );
        // Only the mint reached the program: two setup mints plus this one
        assert_eq!(stack.program.submission_count(), 3);
        assert_eq!(stack.controller.registry().owned_count(), 3);
    }

    #[tokio::test]
    async fn test_decrypt_during_fuse_is_rejected() {
        let stack = LocalStack::connected().await;
        let a = stack.mint(1, 1, 1, 1).await;
        let b = stack.mint(2, 2, 2, 2).await;
        stack.program.set_submission_delay(50);

        let (fused, decrypted) = tokio::join!(stack.controller.fuse(a, b), async {
            pause(10).await;
            assert!(!stack.controller.can_decrypt(a));
            stack.controller.decrypt_attributes(a).await
        });

        assert!(fused.is_ok());
        assert!(matches!(
            decrypted,
            Err(OperationError::OperationInProgress {
                active: MutatingOperation::Fusing,
                ..
            })
        ));
        assert_eq!(stack.wallet.prompt_count(), 0);
    }

    #[tokio::test]
    async fn test_refresh_runs_alongside_mint() {
        let stack = LocalStack::connected().await;
        stack.program.set_submission_delay(50);

        let (minted, refreshed) = tokio::join!(
            stack.controller.mint(CardStats::new(4, 4, 4, 4)),
            async {
                pause(10).await;
                assert!(stack.controller.can_refresh());
                stack.controller.refresh().await
            }
        );

        // The refresh finished before the mint confirmed
        assert!(refreshed.unwrap().is_empty());
        let card = minted.unwrap();
        assert!(stack.controller.registry().owns(card));
    }

    #[tokio::test]
    async fn test_phase_reported_mid_flight() {
        let stack = LocalStack::connected().await;
        stack.program.set_submission_delay(40);

        let (minted, observed) = tokio::join!(
            stack.controller.mint(CardStats::new(4, 4, 4, 4)),
            async {
                pause(10).await;
                let snapshot = stack.controller.snapshot();
                (
                    snapshot.operation.phase(),
                    snapshot.message,
                    stack.controller.can_mint(),
                    stack.controller.can_refresh(),
                )
            }
        );

        assert!(minted.is_ok());
        let (phase, message, can_mint, can_refresh) = observed;
        assert_eq!(phase, OperationPhase::Minting);
        assert_eq!(message, "Submitting mint transaction...");
        assert!(!can_mint);
        assert!(can_refresh);
        assert_eq!(
            stack.controller.snapshot().operation.phase(),
            OperationPhase::Idle
        );
    }

    #[tokio::test]
    async fn test_failed_operation_releases_claim() {
        let stack = LocalStack::connected().await;
        stack.program.reject_submissions(Some("out of gas"));
        assert!(stack
            .controller
            .mint(CardStats::new(1, 1, 1, 1))
            .await
            .is_err());

        stack.program.reject_submissions(None);
        assert!(stack.controller.can_mint());
        assert!(stack
            .controller
            .mint(CardStats::new(1, 1, 1, 1))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_many_refreshes_settle_idle() {
        let stack = LocalStack::connected().await;
        stack.mint(1, 1, 1, 1).await;

        let results = futures::future::join_all((0..8).map(|_| stack.controller.refresh())).await;

        assert!(results.iter().all(|r| r.as_ref().map(|s| s.len()) == Ok(1)));
        assert!(stack.controller.snapshot().operation.is_idle());
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_share_one_read() {
        let stack = LocalStack::connected().await;
        stack.mint(1, 1, 1, 1).await;
        let reads = stack.program.read_count();
        stack.program.set_read_delay(30);

        let results = futures::future::join_all((0..5).map(|_| stack.controller.refresh())).await;

        assert_eq!(stack.program.read_count() - reads, 1);
        assert_eq!(stack.program.peak_concurrent_reads(), 1);
        assert!(results.iter().all(|r| r == &results[0]));
        assert_eq!(results[0].as_ref().map(|owned| owned.len()), Ok(1));
    }

    #[tokio::test]
    async fn test_refresh_after_settled_one_reads_again() {
        let stack = LocalStack::connected().await;
        let reads = stack.program.read_count();

        stack.controller.refresh().await.unwrap();
        stack.controller.refresh().await.unwrap();

        assert_eq!(stack.program.read_count() - reads, 2);
    }
}
