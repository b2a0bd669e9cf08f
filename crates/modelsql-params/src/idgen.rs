//! Time-ordered 64-bit unique ids.
//!
//! Layout, high to low: milliseconds since the configured epoch, 6 bits of
//! node id, 12 bits of per-millisecond sequence. Ids from one generator are
//! strictly increasing.

use std::sync::{Mutex, OnceLock};

use modelsql_core::constants::{
    DEFAULT_EPOCH_MS, MAX_SEQUENCE, MAX_WORKER_ID, SEQUENCE_BITS, WORKER_BITS,
};
use modelsql_core::errors::ConfigError;

static GLOBAL: OnceLock<IdGenerator> = OnceLock::new();

const TIMESTAMP_SHIFT: u8 = WORKER_BITS + SEQUENCE_BITS;

#[derive(Debug)]
struct IdState {
    last_ms: i64,
    sequence: i64,
}

#[derive(Debug)]
pub struct IdGenerator {
    worker_id: i64,
    epoch_ms: i64,
    state: Mutex<IdState>,
}

impl IdGenerator {
    pub fn new(worker_id: i64, epoch_ms: i64) -> Result<Self, ConfigError> {
        if !(0..=MAX_WORKER_ID).contains(&worker_id) {
            return Err(ConfigError::Invalid {
                field: "idgen.worker_id".to_string(),
                message: format!("{worker_id} is outside 0..={MAX_WORKER_ID}"),
            });
        }
        Ok(Self::unchecked(worker_id, epoch_ms))
    }

    fn unchecked(worker_id: i64, epoch_ms: i64) -> Self {
        Self {
            worker_id,
            epoch_ms,
            state: Mutex::new(IdState {
                last_ms: -1,
                sequence: 0,
            }),
        }
    }

    /// Install the process-wide generator. Fails if one is already in use.
    pub fn install_global(generator: IdGenerator) -> Result<(), IdGenerator> {
        GLOBAL.set(generator)
    }

    /// The process-wide generator; node 0 with the default epoch unless
    /// [`IdGenerator::install_global`] ran first.
    pub fn global() -> &'static IdGenerator {
        GLOBAL.get_or_init(|| Self::unchecked(0, DEFAULT_EPOCH_MS))
    }

    pub fn worker_id(&self) -> i64 {
        self.worker_id
    }

    pub fn next_id(&self) -> i64 {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        // A clock that stepped back is held at the last issued millisecond.
        let wall = current_ms();
        let mut now = wall.max(state.last_ms);
        if now == state.last_ms {
            state.sequence = (state.sequence + 1) & MAX_SEQUENCE;
            if state.sequence == 0 {
                if wall < state.last_ms {
                    // The wall clock may be seconds behind; move on logically.
                    now = state.last_ms + 1;
                } else {
                    while now <= state.last_ms {
                        std::hint::spin_loop();
                        now = current_ms();
                    }
                }
            }
        } else {
            state.sequence = 0;
        }
        state.last_ms = now;

        ((now - self.epoch_ms) << TIMESTAMP_SHIFT)
            | (self.worker_id << SEQUENCE_BITS)
            | state.sequence
    }

    /// [`next_id`](Self::next_id) rendered in lowercase base 36.
    pub fn next_short_id(&self) -> String {
        to_base36(self.next_id() as u64)
    }
}

/// Split an id into (milliseconds since epoch, worker id, sequence).
pub fn decompose(id: i64) -> (i64, i64, i64) {
    (
        id >> TIMESTAMP_SHIFT,
        (id >> SEQUENCE_BITS) & MAX_WORKER_ID,
        id & MAX_SEQUENCE,
    )
}

pub fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut buf = Vec::with_capacity(13);
    while n > 0 {
        buf.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    buf.reverse();
    buf.into_iter().map(char::from).collect()
}

fn current_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
