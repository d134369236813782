//! # Session Scenarios
//!
//! Wallet changes while work is in flight, undeployed chains, engine
//! initialization races and the on-disk configuration inputs.

#[cfg(test)]
mod tests {
    use super::super::fixtures::{LocalStack, PROGRAM};
    use cf_04_card_operations::{
        AddressBook, CardOperationsApi, ConfigError, DeploymentResolver, FusionConfig,
        OperationError,
    };
    use shared_crypto::Secp256k1KeyPair;
    use shared_types::{CardStats, DeploymentStatus, EngineStatus, HARDHAT_CHAIN_ID};
    use std::time::Duration;

    async fn pause(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    // =========================================================================
    // Wallet changes
    // =========================================================================

    #[tokio::test]
    async fn test_account_switch_discards_inflight_mint() {
        let stack = LocalStack::connected().await;
        let alice = stack.wallet.address();
        stack.program.set_submission_delay(50);

        let (minted, synced) = tokio::join!(
            stack.controller.mint(CardStats::new(1, 2, 3, 4)),
            async {
                pause(10).await;
                let bob = stack.wallet.switch_account(Secp256k1KeyPair::generate());
                (bob, stack.controller.sync_wallet().await)
            }
        );
        let (bob, synced) = synced;

        assert_eq!(minted, Err(OperationError::StaleSession));
        assert_eq!(synced, Ok(true));
        // The transaction landed for the old account; the new view ignores it
        assert_eq!(stack.program.owner_of(shared_types::CardId(1)), Some(alice));
        let snapshot = stack.controller.snapshot();
        assert_eq!(snapshot.session.map(|s| s.account), Some(bob));
        assert_eq!(snapshot.registry.owner, Some(bob));
        assert!(snapshot.registry.cards.is_empty());
        assert!(snapshot.operation.is_idle());
        assert!(stack.controller.can_mint());
    }

    #[tokio::test]
    async fn test_chain_round_trip_through_undeployed_chain() {
        let stack = LocalStack::connected().await;
        let card = stack.mint(5, 5, 5, 5).await;

        stack.wallet.switch_chain(1);
        assert_eq!(
            stack.controller.sync_wallet().await,
            Err(OperationError::NotDeployed { chain_id: 1 })
        );
        let snapshot = stack.controller.snapshot();
        assert_eq!(snapshot.deployment, DeploymentStatus::NotDeployed { chain_id: 1 });
        assert_eq!(snapshot.engine, EngineStatus::Uninitialized);
        assert_eq!(snapshot.last_error, None);
        assert!(!stack.controller.can_mint());
        // Same identity, nothing to rebuild
        assert_eq!(stack.controller.sync_wallet().await, Ok(false));

        stack.wallet.switch_chain(HARDHAT_CHAIN_ID);
        assert_eq!(stack.controller.sync_wallet().await, Ok(true));
        assert!(stack.controller.registry().owns(card));
        assert_eq!(stack.controller.snapshot().engine, EngineStatus::Ready);
    }

    #[tokio::test]
    async fn test_disconnect_and_reconnect() {
        let stack = LocalStack::connected().await;
        let card = stack.mint(5, 5, 5, 5).await;
        stack.controller.decrypt_attributes(card).await.unwrap();

        stack.wallet.set_connected(false);
        assert_eq!(stack.controller.sync_wallet().await, Ok(true));
        let snapshot = stack.controller.snapshot();
        assert!(snapshot.session.is_none());
        assert!(snapshot.registry.cards.is_empty());
        assert_eq!(snapshot.message, "Disconnected");
        assert!(!stack.controller.can_refresh());

        stack.wallet.set_connected(true);
        assert_eq!(stack.controller.sync_wallet().await, Ok(true));
        // Reveals and authorizations did not survive the disconnect
        assert!(stack.controller.registry().is_sealed(card));
        stack.controller.decrypt_attributes(card).await.unwrap();
        assert_eq!(stack.wallet.prompt_count(), 2);
    }

    // =========================================================================
    // Engine lifecycle
    // =========================================================================

    #[tokio::test]
    async fn test_superseded_initialization_is_discarded() {
        let stack = LocalStack::new();
        stack.runtime.set_connect_delay(Duration::from_millis(50));

        let (first, second) = tokio::join!(stack.controller.connect(), async {
            pause(10).await;
            let bob = stack.wallet.switch_account(Secp256k1KeyPair::generate());
            (bob, stack.controller.sync_wallet().await)
        });
        let (bob, second) = second;

        assert_eq!(first, Err(OperationError::StaleSession));
        assert_eq!(second, Ok(true));
        let snapshot = stack.controller.snapshot();
        assert_eq!(snapshot.session.map(|s| s.account), Some(bob));
        assert_eq!(snapshot.engine, EngineStatus::Ready);
        assert_eq!(stack.runtime.connect_count(), 2);
    }

    #[tokio::test]
    async fn test_engine_failure_surfaces_error() {
        let stack = LocalStack::new();
        stack.runtime.set_fail_connect(true);

        let result = stack.controller.connect().await;

        assert!(matches!(result, Err(OperationError::EngineInit(_))));
        let snapshot = stack.controller.snapshot();
        assert!(matches!(snapshot.engine, EngineStatus::Error(_)));
        assert!(snapshot.last_error.is_some());
        assert!(!stack.controller.can_mint());
    }

    // =========================================================================
    // Configuration inputs
    // =========================================================================

    #[tokio::test]
    async fn test_address_book_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("addresses.json");
        std::fs::write(
            &path,
            r#"{
                "31337": {"address": "0xcfcfcfcfcfcfcfcfcfcfcfcfcfcfcfcfcfcfcfcf", "chainName": "hardhat"},
                "11155111": {"address": "0x0000000000000000000000000000000000000000"}
            }"#,
        )
        .unwrap();

        let book = AddressBook::from_file(&path).unwrap();

        let hardhat = book.resolve(HARDHAT_CHAIN_ID).await.unwrap();
        assert_eq!(hardhat.address, PROGRAM);
        assert_eq!(hardhat.chain_name, "hardhat");
        assert!(book.resolve(11_155_111).await.is_none());
    }

    #[test]
    fn test_fusion_config_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("fusion.json");
        let bad = dir.path().join("inverted.json");
        std::fs::write(&good, r#"{"attribute_max": 50, "signatures": {"validity_days": 30, "signature_timeout_ms": 1000}}"#).unwrap();
        std::fs::write(&bad, r#"{"attribute_min": 60, "attribute_max": 50}"#).unwrap();

        let config = FusionConfig::from_json_file(&good).unwrap();
        assert_eq!(config.attribute_max, 50);
        assert_eq!(config.signatures.validity_days, 30);
        assert!(matches!(
            FusionConfig::from_json_file(&bad),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn test_configured_domain_bounds_mints() {
        let config = FusionConfig {
            attribute_max: 50,
            ..FusionConfig::for_testing()
        };
        let stack = LocalStack::with_config(config);
        stack.controller.connect().await.unwrap();

        assert!(matches!(
            stack.controller.mint(CardStats::new(51, 0, 0, 0)).await,
            Err(OperationError::InvalidAttributeRange { .. })
        ));
        assert!(stack.controller.mint(CardStats::new(50, 0, 0, 0)).await.is_ok());
    }

    #[tokio::test]
    async fn test_snapshot_serializes() {
        let stack = LocalStack::connected().await;
        stack.mint(1, 2, 3, 4).await;

        let value = serde_json::to_value(stack.controller.snapshot()).unwrap();

        assert!(value["message"]
            .as_str()
            .is_some_and(|m| m.starts_with("Mint completed")));
        assert_eq!(value["deployment"]["Deployed"]["chain_id"], HARDHAT_CHAIN_ID);
        assert!(value["session"]["chain_id"].is_number());
    }
}
