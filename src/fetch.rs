use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::coin::{self, CoinRecord};
use crate::market::{MarketData, MarketError};

/// Where a fetch cycle currently stands. `Error` keeps the banner message;
/// the coin collection lives next to the phase so views always have
/// something to render.
#[derive(Clone, Debug, PartialEq)]
pub enum Phase {
    Loading,
    Ready,
    Error(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct FetchState {
    pub phase: Phase,
    pub coins: Vec<CoinRecord>,
}

impl FetchState {
    fn initial() -> Self {
        Self {
            phase: Phase::Loading,
            coins: vec![],
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match &self.phase {
            Phase::Error(message) => Some(message),
            _ => None,
        }
    }
}

/// Drives "load N coins" cycles against a [`MarketData`] provider and
/// publishes immutable [`FetchState`] values over a watch channel.
///
/// On provider failure the state carries the failure message together with
/// the first `limit` fallback records, so a view never goes blank just
/// because the network did. Overlapping `refetch` calls are not cancelled;
/// a generation counter discards every outcome but the newest cycle's.
pub struct Fetcher<M> {
    client: M,
    limit: usize,
    use_remote: bool,
    generation: AtomicU64,
    tx: watch::Sender<FetchState>,
}

impl<M: MarketData> Fetcher<M> {
    pub fn new(client: M, limit: usize, use_remote: bool) -> Self {
        let (tx, _) = watch::channel(FetchState::initial());
        Self {
            client,
            limit,
            use_remote,
            generation: AtomicU64::new(0),
            tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchState> {
        self.tx.subscribe()
    }

    pub fn state(&self) -> FetchState {
        self.tx.borrow().clone()
    }

    /// Runs one fetch cycle. Within a cycle the state moves
    /// loading -> {ready|error} exactly once.
    pub async fn refetch(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if !self.use_remote {
            self.apply(
                generation,
                FetchState {
                    phase: Phase::Ready,
                    coins: coin::fallback_slice(self.limit),
                },
            );
            return;
        }

        // keep the previous collection visible while loading
        let coins = self.tx.borrow().coins.clone();
        self.apply(
            generation,
            FetchState {
                phase: Phase::Loading,
                coins,
            },
        );

        let next = match self.client.market_data(self.limit).await {
            Ok(coins) => FetchState {
                phase: Phase::Ready,
                coins,
            },
            Err(err) => {
                warn!("Market data fetch failed : {:?}", err);
                FetchState {
                    phase: Phase::Error(err.to_string()),
                    coins: coin::fallback_slice(self.limit),
                }
            }
        };
        self.apply(generation, next);
    }

    fn apply(&self, generation: u64, state: FetchState) {
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("Discarding stale fetch outcome from cycle {}", generation);
            return;
        }
        self.tx.send_replace(state);
    }
}

/// Single-coin lookup outcome for the detail views: on provider failure the
/// message is kept and the coin is resolved from the fallback table instead.
#[derive(Clone, Debug, PartialEq)]
pub struct CoinFetch {
    pub coin: Option<CoinRecord>,
    pub error: Option<String>,
}

pub async fn fetch_coin<M: MarketData>(client: &M, id: &str, use_remote: bool) -> CoinFetch {
    let fallback = || coin::fallback_coins().into_iter().find(|c| c.id == id);

    if !use_remote {
        let coin = fallback();
        let error = coin
            .is_none()
            .then(|| "Coin not found in fallback data".to_string());
        return CoinFetch { coin, error };
    }

    match client.coin_data(id).await {
        Ok(coin) => CoinFetch {
            coin: Some(coin),
            error: None,
        },
        Err(err) => {
            warn!("Coin data fetch failed : {:?}", err);
            CoinFetch {
                coin: fallback(),
                error: Some(err.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    use rust_decimal_macros::dec;
    use tokio::sync::Mutex;

    use super::*;
    use crate::coin::fallback_coins;

    enum StubResponse {
        Coins(Vec<CoinRecord>),
        RateLimited,
        Status(u16),
        Network,
        NotFound,
    }

    struct StubMarket {
        response: StubResponse,
        calls: AtomicUsize,
    }

    impl StubMarket {
        fn new(response: StubResponse) -> Self {
            Self {
                response,
                calls: AtomicUsize::new(0),
            }
        }

        fn error_for(&self, id: &str) -> MarketError {
            match &self.response {
                StubResponse::RateLimited => MarketError::RateLimited,
                StubResponse::Status(status) => MarketError::RequestFailed { status: *status },
                StubResponse::Network => MarketError::Network("connection refused".to_string()),
                StubResponse::NotFound => MarketError::NotFound(id.to_string()),
                StubResponse::Coins(_) => unreachable!(),
            }
        }
    }

    impl MarketData for StubMarket {
        async fn market_data(&self, limit: usize) -> Result<Vec<CoinRecord>, MarketError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.response {
                StubResponse::Coins(coins) => {
                    Ok(coins.iter().take(limit).cloned().collect())
                }
                _ => Err(self.error_for("")),
            }
        }

        async fn coin_data(&self, id: &str) -> Result<CoinRecord, MarketError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.response {
                StubResponse::Coins(coins) => coins
                    .first()
                    .cloned()
                    .ok_or_else(|| MarketError::NotFound(id.to_string())),
                _ => Err(self.error_for(id)),
            }
        }
    }

    #[tokio::test]
    async fn test_success_becomes_ready() {
        let coins = fallback_coins();
        let fetcher = Fetcher::new(StubMarket::new(StubResponse::Coins(coins.clone())), 3, true);
        fetcher.refetch().await;
        let state = fetcher.state();
        assert_eq!(state.phase, Phase::Ready);
        assert_eq!(state.coins.len(), 3);
        assert_eq!(state.coins[0].id, "bitcoin");
    }

    #[tokio::test]
    async fn test_remote_disabled_serves_fallback_without_a_call() {
        let stub = StubMarket::new(StubResponse::Network);
        let fetcher = Fetcher::new(stub, 5, false);
        fetcher.refetch().await;
        let state = fetcher.state();
        assert_eq!(state.phase, Phase::Ready);
        assert_eq!(state.coins.len(), 5);
        assert_eq!(fetcher.client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failures_degrade_to_fallback_with_a_message() {
        for response in [
            StubResponse::RateLimited,
            StubResponse::Status(500),
            StubResponse::Network,
        ] {
            let fetcher = Fetcher::new(StubMarket::new(response), 20, true);
            fetcher.refetch().await;
            let state = fetcher.state();
            let message = state.error().expect("phase should be error");
            assert!(!message.is_empty());
            assert!(!state.coins.is_empty());
            assert_eq!(state.coins.len(), 8);
        }
    }

    #[tokio::test]
    async fn test_rate_limit_message_is_provider_specific() {
        let fetcher = Fetcher::new(StubMarket::new(StubResponse::RateLimited), 8, true);
        fetcher.refetch().await;
        assert_eq!(
            fetcher.state().error(),
            Some("API rate limit exceeded. Please try again later.")
        );
    }

    #[tokio::test]
    async fn test_state_watchers_see_each_transition() {
        let fetcher = Fetcher::new(
            StubMarket::new(StubResponse::Coins(fallback_coins())),
            2,
            true,
        );
        let mut rx = fetcher.subscribe();
        fetcher.refetch().await;
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().phase, Phase::Ready);
    }

    /// Provider stub whose responses are handed over one by one from the
    /// test body, so two overlapping cycles can be resolved out of order.
    struct GatedMarket {
        responses: Mutex<tokio::sync::mpsc::UnboundedReceiver<Vec<CoinRecord>>>,
    }

    impl MarketData for GatedMarket {
        async fn market_data(&self, _limit: usize) -> Result<Vec<CoinRecord>, MarketError> {
            let mut rx = self.responses.lock().await;
            rx.recv().await.ok_or(MarketError::Network("closed".to_string()))
        }

        async fn coin_data(&self, id: &str) -> Result<CoinRecord, MarketError> {
            Err(MarketError::NotFound(id.to_string()))
        }
    }

    #[tokio::test]
    async fn test_stale_cycle_outcome_is_discarded() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let fetcher = Arc::new(Fetcher::new(
            GatedMarket {
                responses: Mutex::new(rx),
            },
            8,
            true,
        ));

        // first cycle starts and parks on the provider
        let first = tokio::spawn({
            let fetcher = fetcher.clone();
            async move { fetcher.refetch().await }
        });
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        // second cycle overtakes it
        let second = tokio::spawn({
            let fetcher = fetcher.clone();
            async move { fetcher.refetch().await }
        });
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        let stale = vec![fallback_coins()[7].clone()];
        let fresh: Vec<CoinRecord> = fallback_coins().into_iter().take(2).collect();

        // resolution order matches call order: first cycle resolves first,
        // but its outcome must not overwrite the newer cycle's
        tx.send(stale.clone()).unwrap();
        first.await.unwrap();
        tx.send(fresh.clone()).unwrap();
        second.await.unwrap();

        let state = fetcher.state();
        assert_eq!(state.phase, Phase::Ready);
        assert_eq!(state.coins, fresh);
        assert_ne!(state.coins, stale);
    }

    #[tokio::test]
    async fn test_fetch_coin_not_found_falls_back() {
        let stub = StubMarket::new(StubResponse::NotFound);
        let fetched = fetch_coin(&stub, "bitcoin", true).await;
        let coin = fetched.coin.expect("fallback record should resolve");
        assert_eq!(coin.current_price, dec!(45230.50));
        assert_eq!(
            fetched.error.as_deref(),
            Some("Coin with id \"bitcoin\" not found.")
        );
    }

    #[tokio::test]
    async fn test_fetch_coin_unknown_id_offline() {
        let stub = StubMarket::new(StubResponse::Network);
        let fetched = fetch_coin(&stub, "nocoin", false).await;
        assert!(fetched.coin.is_none());
        assert_eq!(
            fetched.error.as_deref(),
            Some("Coin not found in fallback data")
        );
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
    }
}
