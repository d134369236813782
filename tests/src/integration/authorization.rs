//! # Authorization Scenarios
//!
//! One signature per validity window, re-prompting after expiry, and
//! prompt failures surfaced as errors.

#[cfg(test)]
mod tests {
    use super::super::fixtures::{LocalStack, DAY, PROGRAM};
    use cf_02_signature_cache::SignatureCacheApi;
    use cf_04_card_operations::{CardOperationsApi, FusionConfig, OperationError};
    use shared_bus::{EventFilter, EventTopic, FusionEvent};

    #[tokio::test]
    async fn test_one_prompt_per_window() {
        let stack = LocalStack::connected().await;
        let cards = [
            stack.mint(1, 2, 3, 4).await,
            stack.mint(5, 6, 7, 8).await,
            stack.mint(9, 10, 11, 12).await,
        ];

        for card in cards {
            stack.controller.decrypt_attributes(card).await.unwrap();
            stack.clock.advance(30 * DAY);
        }

        assert_eq!(stack.wallet.prompt_count(), 1);
    }

    #[tokio::test]
    async fn test_expired_authorization_prompts_again() {
        let stack = LocalStack::connected().await;
        let first = stack.mint(1, 2, 3, 4).await;
        let second = stack.mint(5, 6, 7, 8).await;
        let mut auth = stack
            .controller
            .subscribe(EventFilter::topics(vec![EventTopic::Authorization]));

        stack.controller.decrypt_attributes(first).await.unwrap();
        stack.clock.advance(366 * DAY);
        stack.controller.decrypt_attributes(second).await.unwrap();

        assert_eq!(stack.wallet.prompt_count(), 2);
        let events = auth.drain();
        assert!(matches!(events[0], FusionEvent::AuthorizationCreated { .. }));
        assert!(matches!(
            events[1],
            FusionEvent::AuthorizationEvicted { ref reason, .. } if reason == "expired"
        ));
        assert!(matches!(events[2], FusionEvent::AuthorizationCreated { .. }));
    }

    #[tokio::test]
    async fn test_authorization_is_bound_to_account_and_program() {
        let stack = LocalStack::connected().await;
        let card = stack.mint(1, 2, 3, 4).await;
        stack.controller.decrypt_attributes(card).await.unwrap();

        let authorization = stack
            .controller
            .signatures()
            .cached(stack.wallet.address(), PROGRAM)
            .await
            .unwrap()
            .expect("authorization cached");
        assert_eq!(authorization.request.user, stack.wallet.address());
        assert_eq!(authorization.request.program, PROGRAM);
        assert_eq!(authorization.request.duration_secs, 365 * DAY);
    }

    #[tokio::test]
    async fn test_declined_prompt_is_not_cached() {
        let stack = LocalStack::connected().await;
        let card = stack.mint(1, 2, 3, 4).await;
        stack.wallet.set_declining(true);

        assert!(matches!(
            stack.controller.decrypt_attributes(card).await,
            Err(OperationError::SigningDeclined(_))
        ));

        stack.wallet.set_declining(false);
        stack.controller.decrypt_attributes(card).await.unwrap();
        assert_eq!(stack.wallet.prompt_count(), 2);
    }

    #[tokio::test]
    async fn test_unanswered_prompt_times_out() {
        let stack = LocalStack::connected().await;
        let card = stack.mint(1, 2, 3, 4).await;
        // Testing config waits 200ms for the wallet
        stack.wallet.set_sign_delay(1_000);

        let result = stack.controller.decrypt_attributes(card).await;

        assert!(matches!(
            result,
            Err(OperationError::SigningDeclined(ref reason)) if reason.contains("no answer")
        ));
        assert!(stack.controller.snapshot().operation.is_idle());
        assert!(stack.controller.registry().is_sealed(card));
    }

    #[tokio::test]
    async fn test_short_validity_window() {
        let mut config = FusionConfig::for_testing();
        config.signatures.validity_days = 1;
        let stack = connected_with(config).await;
        let first = stack.mint(1, 2, 3, 4).await;
        let second = stack.mint(5, 6, 7, 8).await;

        stack.controller.decrypt_attributes(first).await.unwrap();
        stack.clock.advance(DAY);
        stack.controller.decrypt_attributes(second).await.unwrap();

        assert_eq!(stack.wallet.prompt_count(), 2);
        assert!(stack
            .controller
            .signatures()
            .purge_expired()
            .await
            .is_ok_and(|purged| purged == 0));
    }

    async fn connected_with(config: FusionConfig) -> LocalStack {
        let stack = LocalStack::with_config(config);
        stack.controller.connect().await.unwrap();
        stack
    }
}
