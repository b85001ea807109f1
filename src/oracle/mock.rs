//! Local VRF coordinator
//!
//! Stand-in for the coordinator contract deployed on development chains. It
//! hands out sequential request ids, keeps subscriptions funded in wei, and
//! lets the caller decide when a request is fulfilled.

use crate::errors::OracleError;
use crate::oracle::{RandomWordsConsumer, RandomnessOracle, RandomnessRequest};
use crate::types::{RandomWord, RequestId, Wei};
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};

pub const MAX_NUM_WORDS: u32 = 500;

/// 0.25 LINK
pub const DEFAULT_BASE_FEE: Wei = 250_000_000_000_000_000;
pub const DEFAULT_GAS_PRICE_LINK: Wei = 1_000_000_000;

#[derive(Debug, Clone)]
struct StoredRequest {
    subscription_id: u64,
    callback_gas_limit: u32,
    num_words: u32,
}

/// In-process coordinator with manual fulfillment
pub struct MockVrfCoordinator {
    base_fee: Wei,
    gas_price_link: Wei,
    next_request_id: AtomicU64,
    next_subscription_id: AtomicU64,
    subscriptions: DashMap<u64, Wei>,
    requests: DashMap<RequestId, StoredRequest>,
}

impl MockVrfCoordinator {
    pub fn new(base_fee: Wei, gas_price_link: Wei) -> Self {
        Self {
            base_fee,
            gas_price_link,
            next_request_id: AtomicU64::new(1),
            next_subscription_id: AtomicU64::new(1),
            subscriptions: DashMap::new(),
            requests: DashMap::new(),
        }
    }

    pub fn create_subscription(&self) -> u64 {
        let id = self.next_subscription_id.fetch_add(1, Ordering::SeqCst);
        self.subscriptions.insert(id, 0);
        tracing::debug!(subscription_id = id, "Subscription created");
        id
    }

    pub fn fund_subscription(&self, subscription_id: u64, amount: Wei) -> Result<(), OracleError> {
        let mut balance = self
            .subscriptions
            .get_mut(&subscription_id)
            .ok_or(OracleError::InvalidSubscription(subscription_id))?;
        *balance = balance.saturating_add(amount);
        Ok(())
    }

    pub fn subscription_balance(&self, subscription_id: u64) -> Option<Wei> {
        self.subscriptions.get(&subscription_id).map(|b| *b)
    }

    pub fn pending_requests(&self) -> usize {
        self.requests.len()
    }

    pub fn is_pending(&self, request_id: RequestId) -> bool {
        self.requests.contains_key(&request_id)
    }

    /// Deterministic words for a request: sha256(request_id || index), first 16 bytes
    pub fn derive_words(request_id: RequestId, num_words: u32) -> Vec<RandomWord> {
        (0..num_words as u64)
            .map(|index| {
                let mut hasher = Sha256::new();
                hasher.update(request_id.value().to_le_bytes());
                hasher.update(index.to_le_bytes());
                let digest = hasher.finalize();
                let mut word = [0u8; 16];
                word.copy_from_slice(&digest[..16]);
                RandomWord::from_be_bytes(word)
            })
            .collect()
    }

    /// Fulfill a pending request with derived words
    pub fn fulfill_random_words<C>(&self, request_id: RequestId, consumer: &mut C) -> Result<(), OracleError>
    where
        C: RandomWordsConsumer + ?Sized,
    {
        let num_words = self
            .requests
            .get(&request_id)
            .map(|r| r.num_words)
            .ok_or(OracleError::NonexistentRequest(request_id))?;
        let words = Self::derive_words(request_id, num_words);
        self.fulfill_random_words_with_override(request_id, consumer, words)
    }

    /// Fulfill a pending request with caller-chosen words
    ///
    /// The subscription is charged and the request removed before the consumer
    /// runs; a consumer failure does not bring the request back.
    pub fn fulfill_random_words_with_override<C>(
        &self,
        request_id: RequestId,
        consumer: &mut C,
        words: Vec<RandomWord>,
    ) -> Result<(), OracleError>
    where
        C: RandomWordsConsumer + ?Sized,
    {
        let (_, request) = self
            .requests
            .remove(&request_id)
            .ok_or(OracleError::NonexistentRequest(request_id))?;

        if let Err(e) = self.charge(&request) {
            self.requests.insert(request_id, request);
            return Err(e);
        }

        tracing::debug!(%request_id, words = words.len(), "Delivering random words");
        consumer
            .raw_fulfill_random_words(request_id, &words)
            .map_err(|e| OracleError::ConsumerRejected(e.to_string()))
    }

    fn charge(&self, request: &StoredRequest) -> Result<(), OracleError> {
        let payment = self
            .gas_price_link
            .saturating_mul(request.callback_gas_limit as Wei)
            .saturating_add(self.base_fee);

        let mut balance = self
            .subscriptions
            .get_mut(&request.subscription_id)
            .ok_or(OracleError::InvalidSubscription(request.subscription_id))?;
        if *balance < payment {
            return Err(OracleError::InsufficientBalance {
                balance: *balance,
                required: payment,
            });
        }
        *balance -= payment;
        Ok(())
    }
}

impl Default for MockVrfCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_FEE, DEFAULT_GAS_PRICE_LINK)
    }
}

impl RandomnessOracle for MockVrfCoordinator {
    fn request_random_words(&self, request: &RandomnessRequest) -> Result<RequestId, OracleError> {
        if !self.subscriptions.contains_key(&request.subscription_id) {
            return Err(OracleError::InvalidSubscription(request.subscription_id));
        }
        if request.num_words == 0 || request.num_words > MAX_NUM_WORDS {
            return Err(OracleError::InvalidNumWords {
                requested: request.num_words,
                max: MAX_NUM_WORDS,
            });
        }

        let request_id = RequestId(self.next_request_id.fetch_add(1, Ordering::SeqCst));
        self.requests.insert(
            request_id,
            StoredRequest {
                subscription_id: request.subscription_id,
                callback_gas_limit: request.callback_gas_limit,
                num_words: request.num_words,
            },
        );
        tracing::debug!(%request_id, subscription_id = request.subscription_id, "Random words requested");
        Ok(request_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::LotteryResult;

    #[derive(Default)]
    struct RecordingConsumer {
        received: Vec<(RequestId, Vec<RandomWord>)>,
    }

    impl RandomWordsConsumer for RecordingConsumer {
        fn raw_fulfill_random_words(
            &mut self,
            request_id: RequestId,
            random_words: &[RandomWord],
        ) -> LotteryResult<()> {
            self.received.push((request_id, random_words.to_vec()));
            Ok(())
        }
    }

    fn request(subscription_id: u64) -> RandomnessRequest {
        RandomnessRequest {
            key_hash: [0u8; 32],
            subscription_id,
            request_confirmations: 3,
            callback_gas_limit: 500_000,
            num_words: 2,
        }
    }

    #[test]
    fn test_request_ids_are_sequential_from_one() {
        let coordinator = MockVrfCoordinator::default();
        let sub = coordinator.create_subscription();

        assert_eq!(coordinator.request_random_words(&request(sub)).unwrap(), RequestId(1));
        assert_eq!(coordinator.request_random_words(&request(sub)).unwrap(), RequestId(2));
        assert_eq!(coordinator.pending_requests(), 2);
    }

    #[test]
    fn test_unknown_subscription_rejected() {
        let coordinator = MockVrfCoordinator::default();
        let err = coordinator.request_random_words(&request(42)).unwrap_err();
        assert_eq!(err, OracleError::InvalidSubscription(42));
    }

    #[test]
    fn test_num_words_bounds() {
        let coordinator = MockVrfCoordinator::default();
        let sub = coordinator.create_subscription();
        let mut req = request(sub);
        req.num_words = 0;
        assert!(matches!(
            coordinator.request_random_words(&req),
            Err(OracleError::InvalidNumWords { requested: 0, .. })
        ));
        req.num_words = MAX_NUM_WORDS + 1;
        assert!(coordinator.request_random_words(&req).is_err());
    }

    #[test]
    fn test_fulfill_nonexistent_request() {
        let coordinator = MockVrfCoordinator::default();
        let mut consumer = RecordingConsumer::default();

        for id in [0, 1] {
            let err = coordinator
                .fulfill_random_words(RequestId(id), &mut consumer)
                .unwrap_err();
            assert_eq!(err, OracleError::NonexistentRequest(RequestId(id)));
        }
        assert!(consumer.received.is_empty());
    }

    #[test]
    fn test_fulfill_delivers_derived_words_and_charges() {
        let coordinator = MockVrfCoordinator::new(100, 1);
        let sub = coordinator.create_subscription();
        coordinator.fund_subscription(sub, 1_000_000).unwrap();
        let id = coordinator.request_random_words(&request(sub)).unwrap();

        let mut consumer = RecordingConsumer::default();
        coordinator.fulfill_random_words(id, &mut consumer).unwrap();

        assert_eq!(consumer.received.len(), 1);
        assert_eq!(consumer.received[0].1, MockVrfCoordinator::derive_words(id, 2));
        assert_eq!(coordinator.subscription_balance(sub), Some(1_000_000 - 500_100));
        assert!(!coordinator.is_pending(id));

        // Second delivery for the same id is refused
        assert!(coordinator.fulfill_random_words(id, &mut consumer).is_err());
    }

    #[test]
    fn test_unfunded_subscription_keeps_request_pending() {
        let coordinator = MockVrfCoordinator::default();
        let sub = coordinator.create_subscription();
        let id = coordinator.request_random_words(&request(sub)).unwrap();

        let mut consumer = RecordingConsumer::default();
        let err = coordinator
            .fulfill_random_words_with_override(id, &mut consumer, vec![7])
            .unwrap_err();

        assert!(matches!(err, OracleError::InsufficientBalance { .. }));
        assert!(coordinator.is_pending(id));
        assert!(consumer.received.is_empty());
    }

    #[test]
    fn test_derived_words_differ_per_index_and_request() {
        let a = MockVrfCoordinator::derive_words(RequestId(1), 2);
        let b = MockVrfCoordinator::derive_words(RequestId(2), 2);
        assert_ne!(a[0], a[1]);
        assert_ne!(a, b);
        assert_eq!(a, MockVrfCoordinator::derive_words(RequestId(1), 2));
    }
}
