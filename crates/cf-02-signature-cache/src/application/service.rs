//! # Signature Cache Service
//!
//! Hands out decryption authorizations, prompting the wallet at most once
//! per `(account, program)` while a signed one is still valid.

use crate::config::SignatureCacheConfig;
use crate::domain::{check_usable, SignatureCacheError, SignatureCacheResult, Unusable};
use crate::ports::{AuthorizationStore, SignatureCacheApi};
use async_trait::async_trait;
use fusion_telemetry::{log_event, metric_inc, AUTHORIZATION_CACHE_HITS, SIGNATURE_PROMPTS};
use shared_bus::{EventPublisher, FusionEvent};
use shared_types::{
    format_address, Address, AuthorizationKey, AuthorizationRequest, Clock,
    DecryptionAuthorization, MessageSigner,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

const COMPONENT: &str = "cf-02";

/// Decryption Signature Cache.
pub struct SignatureCache {
    config: SignatureCacheConfig,
    store: Arc<dyn AuthorizationStore>,
    clock: Arc<dyn Clock>,
    publisher: Arc<dyn EventPublisher>,
    /// One prompt lock per key; holders of the lock own the wallet prompt.
    prompts: parking_lot::Mutex<HashMap<AuthorizationKey, Arc<AsyncMutex<()>>>>,
}

impl SignatureCache {
    /// Create a cache over `store`.
    pub fn new(
        config: SignatureCacheConfig,
        store: Arc<dyn AuthorizationStore>,
        clock: Arc<dyn Clock>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            config,
            store,
            clock,
            publisher,
            prompts: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    /// Valid cached authorization for `(user, program)`, without prompting
    /// or evicting.
    pub async fn cached(
        &self,
        user: Address,
        program: Address,
    ) -> SignatureCacheResult<Option<DecryptionAuthorization>> {
        let key = AuthorizationKey::new(user, program);
        let now = self.clock.now_secs();
        Ok(self
            .store
            .load(&key)
            .await?
            .filter(|auth| check_usable(auth, &key, now).is_ok()))
    }

    fn prompt_lock(&self, key: &AuthorizationKey) -> Arc<AsyncMutex<()>> {
        Arc::clone(self.prompts.lock().entry(*key).or_default())
    }

    /// Serve a usable stored entry, evicting an unusable one.
    async fn lookup(
        &self,
        key: &AuthorizationKey,
    ) -> SignatureCacheResult<Option<DecryptionAuthorization>> {
        let Some(authorization) = self.store.load(key).await? else {
            return Ok(None);
        };
        match check_usable(&authorization, key, self.clock.now_secs()) {
            Ok(()) => Ok(Some(authorization)),
            Err(unusable) => {
                self.evict(key, unusable.reason()).await?;
                Ok(None)
            }
        }
    }

    async fn evict(&self, key: &AuthorizationKey, reason: &str) -> SignatureCacheResult<bool> {
        let removed = self.store.remove(key).await?.is_some();
        if removed {
            log_event!(
                debug,
                COMPONENT,
                "authorization evicted",
                user = %format_address(&key.user),
                reason
            );
            self.publisher
                .publish(FusionEvent::AuthorizationEvicted {
                    user: key.user,
                    program: key.program,
                    reason: reason.to_string(),
                })
                .await;
        }
        Ok(removed)
    }

    async fn prompt<S>(
        &self,
        key: &AuthorizationKey,
        signer: &S,
    ) -> SignatureCacheResult<DecryptionAuthorization>
    where
        S: MessageSigner + ?Sized,
    {
        let request = AuthorizationRequest {
            user: key.user,
            program: key.program,
            start_timestamp: self.clock.now_secs(),
            duration_secs: self.config.validity_secs(),
            nonce: *Uuid::new_v4().as_bytes(),
        };

        log_event!(info, COMPONENT, "requesting decryption signature", user = %format_address(&key.user));
        let signed = tokio::time::timeout(
            self.config.signature_timeout(),
            signer.sign(&request.encode()),
        )
        .await;

        let signature = match signed {
            Ok(Ok(signature)) => signature,
            Ok(Err(e)) => {
                metric_inc!(SIGNATURE_PROMPTS, &["declined"]);
                log_event!(warn, COMPONENT, "signature request declined", error = %e);
                return Err(SignatureCacheError::SigningDeclined(e.to_string()));
            }
            Err(_) => {
                metric_inc!(SIGNATURE_PROMPTS, &["timeout"]);
                log_event!(warn, COMPONENT, "signature request timed out");
                return Err(SignatureCacheError::SigningDeclined(format!(
                    "no answer within {}ms",
                    self.config.signature_timeout_ms
                )));
            }
        };
        metric_inc!(SIGNATURE_PROMPTS, &["signed"]);

        let authorization = DecryptionAuthorization { request, signature };
        self.store.save(authorization.clone()).await?;
        self.publisher
            .publish(FusionEvent::AuthorizationCreated {
                user: key.user,
                program: key.program,
                expires_at: authorization.expires_at(),
            })
            .await;
        Ok(authorization)
    }
}

#[async_trait]
impl SignatureCacheApi for SignatureCache {
    async fn get_or_create<S>(
        &self,
        user: Address,
        program: Address,
        signer: &S,
    ) -> SignatureCacheResult<DecryptionAuthorization>
    where
        S: MessageSigner + ?Sized,
    {
        let key = AuthorizationKey::new(user, program);
        if let Some(authorization) = self.lookup(&key).await? {
            metric_inc!(AUTHORIZATION_CACHE_HITS);
            return Ok(authorization);
        }

        let lock = self.prompt_lock(&key);
        let _prompt = lock.lock().await;

        // Another caller may have signed while we waited
        if let Some(authorization) = self.lookup(&key).await? {
            metric_inc!(AUTHORIZATION_CACHE_HITS);
            return Ok(authorization);
        }

        self.prompt(&key, signer).await
    }

    async fn invalidate(&self, user: Address, program: Address) -> SignatureCacheResult<bool> {
        self.evict(&AuthorizationKey::new(user, program), "invalidated")
            .await
    }

    async fn invalidate_user(&self, user: Address) -> SignatureCacheResult<usize> {
        let mut dropped = 0;
        for key in self.store.keys().await? {
            if key.user == user && self.evict(&key, "account changed").await? {
                dropped += 1;
            }
        }
        self.prompts.lock().retain(|key, _| key.user != user);
        Ok(dropped)
    }

    async fn purge_expired(&self) -> SignatureCacheResult<usize> {
        let now = self.clock.now_secs();
        let mut purged = 0;
        for key in self.store.keys().await? {
            let Some(authorization) = self.store.load(&key).await? else {
                continue;
            };
            if let Err(Unusable::Expired) = check_usable(&authorization, &key, now) {
                if self.evict(&key, Unusable::Expired.reason()).await? {
                    purged += 1;
                }
            }
        }
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryAuthorizationStore;
    use shared_bus::{EventFilter, EventTopic, InMemoryEventBus};
    use shared_crypto::{recover_address, Secp256k1KeyPair};
    use shared_types::{ManualClock, WalletError};
    use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
    use std::time::Duration;

    const PROGRAM: Address = [0xC0; 20];
    const NOW: u64 = 1_700_000_000;
    const YEAR: u64 = 365 * 86_400;

    struct PromptingWallet {
        key: Secp256k1KeyPair,
        prompts: AtomicUsize,
        decline: AtomicBool,
        delay_ms: AtomicU64,
    }

    impl PromptingWallet {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                key: Secp256k1KeyPair::generate(),
                prompts: AtomicUsize::new(0),
                decline: AtomicBool::new(false),
                delay_ms: AtomicU64::new(0),
            })
        }

        fn address(&self) -> Address {
            self.key.address()
        }

        fn prompts(&self) -> usize {
            self.prompts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MessageSigner for PromptingWallet {
        async fn sign(&self, message: &[u8]) -> Result<Vec<u8>, WalletError> {
            self.prompts.fetch_add(1, Ordering::SeqCst);
            let delay = self.delay_ms.load(Ordering::SeqCst);
            if delay > 0 {
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
            if self.decline.load(Ordering::SeqCst) {
                return Err(WalletError::Declined("user rejected".to_string()));
            }
            self.key
                .sign_message(message)
                .map(|s| s.to_vec())
                .map_err(|e| WalletError::Provider(e.to_string()))
        }
    }

    struct Fixture {
        cache: SignatureCache,
        store: Arc<InMemoryAuthorizationStore>,
        clock: Arc<ManualClock>,
        bus: Arc<InMemoryEventBus>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryAuthorizationStore::new());
        let clock = Arc::new(ManualClock::new(NOW));
        let bus = Arc::new(InMemoryEventBus::new());
        let cache = SignatureCache::new(
            SignatureCacheConfig::for_testing(),
            store.clone(),
            clock.clone(),
            bus.clone(),
        );
        Fixture {
            cache,
            store,
            clock,
            bus,
        }
    }

    #[tokio::test]
    async fn test_creates_signed_authorization() {
        let f = fixture();
        let wallet = PromptingWallet::new();

        let auth = f
            .cache
            .get_or_create(wallet.address(), PROGRAM, wallet.as_ref())
            .await
            .unwrap();

        assert_eq!(auth.request.start_timestamp, NOW);
        assert_eq!(auth.expires_at(), NOW + YEAR);
        assert_eq!(
            recover_address(&auth.request.encode(), &auth.signature).unwrap(),
            wallet.address()
        );
        assert_eq!(f.store.len(), 1);
    }

    #[tokio::test]
    async fn test_cached_authorization_reused_without_prompt() {
        let f = fixture();
        let wallet = PromptingWallet::new();

        let first = f
            .cache
            .get_or_create(wallet.address(), PROGRAM, wallet.as_ref())
            .await
            .unwrap();
        f.clock.advance(YEAR - 1);
        let second = f
            .cache
            .get_or_create(wallet.address(), PROGRAM, wallet.as_ref())
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(wallet.prompts(), 1);
    }

    #[tokio::test]
    async fn test_expired_authorization_replaced() {
        let f = fixture();
        let wallet = PromptingWallet::new();
        let mut sub = f
            .bus
            .subscribe(EventFilter::topics(vec![EventTopic::Authorization]));

        let first = f
            .cache
            .get_or_create(wallet.address(), PROGRAM, wallet.as_ref())
            .await
            .unwrap();
        f.clock.advance(YEAR);
        let second = f
            .cache
            .get_or_create(wallet.address(), PROGRAM, wallet.as_ref())
            .await
            .unwrap();

        assert_ne!(first.request.nonce, second.request.nonce);
        assert_eq!(second.request.start_timestamp, NOW + YEAR);
        assert_eq!(wallet.prompts(), 2);

        let mut evicted = false;
        while let Ok(Some(event)) = sub.try_recv() {
            if let FusionEvent::AuthorizationEvicted { reason, .. } = event {
                evicted = reason == "expired";
            }
        }
        assert!(evicted);
    }

    #[tokio::test]
    async fn test_declined_prompt_caches_nothing() {
        let f = fixture();
        let wallet = PromptingWallet::new();
        wallet.decline.store(true, Ordering::SeqCst);

        let result = f
            .cache
            .get_or_create(wallet.address(), PROGRAM, wallet.as_ref())
            .await;

        assert!(matches!(result, Err(SignatureCacheError::SigningDeclined(_))));
        assert!(f.store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unanswered_prompt_counts_as_declined() {
        let f = fixture();
        let wallet = PromptingWallet::new();
        wallet.delay_ms.store(10_000, Ordering::SeqCst);

        let result = f
            .cache
            .get_or_create(wallet.address(), PROGRAM, wallet.as_ref())
            .await;

        assert!(matches!(
            result,
            Err(SignatureCacheError::SigningDeclined(reason)) if reason.contains("no answer")
        ));
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_prompt() {
        let f = fixture();
        let wallet = PromptingWallet::new();
        wallet.delay_ms.store(30, Ordering::SeqCst);
        let user = wallet.address();

        let (a, b, c) = tokio::join!(
            f.cache.get_or_create(user, PROGRAM, wallet.as_ref()),
            f.cache.get_or_create(user, PROGRAM, wallet.as_ref()),
            f.cache.get_or_create(user, PROGRAM, wallet.as_ref()),
        );

        let a = a.unwrap();
        assert_eq!(a, b.unwrap());
        assert_eq!(a, c.unwrap());
        assert_eq!(wallet.prompts(), 1);
    }

    #[tokio::test]
    async fn test_authorizations_scoped_per_program() {
        let f = fixture();
        let wallet = PromptingWallet::new();

        f.cache
            .get_or_create(wallet.address(), PROGRAM, wallet.as_ref())
            .await
            .unwrap();
        f.cache
            .get_or_create(wallet.address(), [0xD0; 20], wallet.as_ref())
            .await
            .unwrap();

        assert_eq!(wallet.prompts(), 2);
        assert_eq!(f.store.len(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_new_prompt() {
        let f = fixture();
        let wallet = PromptingWallet::new();
        let user = wallet.address();

        f.cache.get_or_create(user, PROGRAM, wallet.as_ref()).await.unwrap();
        assert!(f.cache.invalidate(user, PROGRAM).await.unwrap());
        assert!(!f.cache.invalidate(user, PROGRAM).await.unwrap());

        f.cache.get_or_create(user, PROGRAM, wallet.as_ref()).await.unwrap();
        assert_eq!(wallet.prompts(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_user_keeps_other_accounts() {
        let f = fixture();
        let alice = PromptingWallet::new();
        let bob = PromptingWallet::new();

        f.cache.get_or_create(alice.address(), PROGRAM, alice.as_ref()).await.unwrap();
        f.cache.get_or_create(alice.address(), [0xD0; 20], alice.as_ref()).await.unwrap();
        f.cache.get_or_create(bob.address(), PROGRAM, bob.as_ref()).await.unwrap();

        assert_eq!(f.cache.invalidate_user(alice.address()).await.unwrap(), 2);
        assert!(f.cache.cached(bob.address(), PROGRAM).await.unwrap().is_some());
        assert!(f.cache.cached(alice.address(), PROGRAM).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let f = fixture();
        let alice = PromptingWallet::new();
        let bob = PromptingWallet::new();

        f.cache.get_or_create(alice.address(), PROGRAM, alice.as_ref()).await.unwrap();
        f.clock.advance(YEAR / 2);
        f.cache.get_or_create(bob.address(), PROGRAM, bob.as_ref()).await.unwrap();
        f.clock.advance(YEAR / 2);

        assert_eq!(f.cache.purge_expired().await.unwrap(), 1);
        assert_eq!(f.store.len(), 1);
        assert!(f.cache.cached(bob.address(), PROGRAM).await.unwrap().is_some());
    }
}
