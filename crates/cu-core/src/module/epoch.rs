//! A global background thread that increments every registered engine's
//! epoch on a fixed tick, independent of the async runtime's scheduling, so
//! a pathological WASM call's wall-clock deadline is still enforced even on
//! a starved or current-thread executor.
//!
//! Grounded on the teacher's `internal::module::epoch`.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, OnceLock,
    },
    time::Duration,
};

use parking_lot::Mutex;
use wasmtime::Engine;

const EPOCH_TICK: Duration = Duration::from_millis(10);

struct EpochTickerShared {
    engines: Mutex<HashMap<u64, Engine>>,
    next_id: AtomicU64,
}

pub struct GlobalEpochTicker {
    shared: Arc<EpochTickerShared>,
}

/// Registration that keeps epoch ticks active for a specific engine; the
/// engine stops ticking once this is dropped.
pub struct EpochTickerRegistration {
    id: u64,
    shared: Arc<EpochTickerShared>,
}

impl GlobalEpochTicker {
    fn new() -> std::io::Result<Self> {
        let shared = Arc::new(EpochTickerShared {
            engines: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        });

        let shared_bg = Arc::clone(&shared);
        std::thread::Builder::new()
            .name("ao-cu-epoch-ticker".to_string())
            .spawn(move || loop {
                std::thread::park_timeout(EPOCH_TICK);
                let engines: Vec<Engine> = shared_bg.engines.lock().values().cloned().collect();
                for engine in engines {
                    engine.increment_epoch();
                }
            })?;

        Ok(Self { shared })
    }

    pub fn register(&self, engine: Engine) -> Arc<EpochTickerRegistration> {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        self.shared.engines.lock().insert(id, engine);

        Arc::new(EpochTickerRegistration {
            id,
            shared: Arc::clone(&self.shared),
        })
    }
}

impl Drop for EpochTickerRegistration {
    fn drop(&mut self) {
        self.shared.engines.lock().remove(&self.id);
    }
}

pub fn global_epoch_ticker() -> std::io::Result<&'static GlobalEpochTicker> {
    static GLOBAL_EPOCH_TICKER: OnceLock<
        core::result::Result<GlobalEpochTicker, (std::io::ErrorKind, String)>,
    > = OnceLock::new();

    let ticker = GLOBAL_EPOCH_TICKER
        .get_or_init(|| GlobalEpochTicker::new().map_err(|e| (e.kind(), e.to_string())));
    match ticker {
        Ok(ticker) => Ok(ticker),
        Err((kind, message)) => Err(std::io::Error::new(*kind, message.clone())),
    }
}
