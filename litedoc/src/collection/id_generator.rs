use chrono::Utc;
use log::{info, warn};
use parking_lot::Mutex;
use rand::rngs::OsRng;
use rand::Rng;

pub(crate) const NODE_ID_BITS: u64 = 10;
pub(crate) const SEQUENCE_BITS: u64 = 12;
pub(crate) const TIMESTAMP_LEFT_SHIFT: u64 = SEQUENCE_BITS + NODE_ID_BITS;
pub(crate) const EPOCH: u64 = 1288834974657;

const MAX_NODE_ID: u64 = (1 << NODE_ID_BITS) - 1;
const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;

struct GeneratorState {
    last_timestamp: u64,
    sequence: u64,
}

/// Generates 64 bit ids ordered by creation time.
///
/// Layout from the most significant bit: 42 bits of milliseconds since
/// [EPOCH], 10 bits of node id, 12 bits of sequence. Ids produced by one
/// generator are strictly increasing, even if the wall clock steps back.
pub struct ObjectIdGenerator {
    node_id: u64,
    state: Mutex<GeneratorState>,
}

impl ObjectIdGenerator {
    pub fn new() -> Self {
        let mut node_id = Self::random_node_id();
        if node_id > MAX_NODE_ID {
            warn!("Node id can't be greater than {}", MAX_NODE_ID);
            node_id = OsRng.gen_range(1..=MAX_NODE_ID);
        }
        info!("Object id generator initialized with node id: {}", node_id);

        ObjectIdGenerator {
            node_id,
            state: Mutex::new(GeneratorState {
                last_timestamp: 0,
                sequence: 0,
            }),
        }
    }

    pub fn next_id(&self) -> u64 {
        let now = current_millis();
        let mut state = self.state.lock();

        if now > state.last_timestamp {
            state.last_timestamp = now;
            state.sequence = 0;
        } else {
            if now < state.last_timestamp {
                warn!(
                    "Clock moved backwards by {} ms, reusing last timestamp",
                    state.last_timestamp - now
                );
            }
            state.sequence = (state.sequence + 1) & SEQUENCE_MASK;
            if state.sequence == 0 {
                // sequence exhausted for this millisecond, borrow the next one
                state.last_timestamp += 1;
            }
        }

        ((state.last_timestamp - EPOCH) << TIMESTAMP_LEFT_SHIFT)
            | (self.node_id << SEQUENCE_BITS)
            | state.sequence
    }

    fn random_node_id() -> u64 {
        let uuid = uuid::Uuid::new_v4();
        let uid = uuid.as_bytes();
        let rnd_byte = OsRng.gen::<u64>() & 0x000000FF;

        ((0x000000FF & uid[uid.len() - 1] as u64) | (0x0000FF00 & (rnd_byte << 8))) >> 6
    }
}

impl Default for ObjectIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn current_millis() -> u64 {
    let millis = Utc::now().timestamp_millis();
    if millis < EPOCH as i64 {
        EPOCH
    } else {
        millis as u64
    }
}
