//! The contract consumed from the surrounding ordering node: local ledger
//! appends and validation of submitted messages against the channel's
//! current configuration.

use crate::block::Block;
use crate::message::Envelope;
use crate::Result;

use tokio::time::Duration;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct BatchSize {
    pub preferred_max_bytes: u32,
    pub max_message_count: u32,
}

/// Batch parameters of the channel's current configuration, forwarded to
/// the agreement engine during the handshake.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct SharedConfig {
    pub batch_timeout: Duration,
    pub batch_size: BatchSize,
}

/// Per-channel collaborator handle. One implementation is provided by the
/// ordering framework for each chain instance; the bridge never outlives
/// it.
pub trait ChainSupport: Send + Sync {
    /// The logical channel name this chain instance represents.
    fn chain_id(&self) -> String;

    /// Current configuration sequence (monotonic epoch counter).
    fn sequence(&self) -> u64;

    fn shared_config(&self) -> SharedConfig;

    /// Re-validates a normal message against the current configuration.
    /// An `InvalidMessage` error means the message must be discarded.
    fn process_normal_msg(&self, envelope: &Envelope) -> Result<()>;

    /// Derives the effective configuration envelope from a submitted
    /// config-update impetus, returning it with the sequence it applies to.
    fn process_config_update_msg(&self, impetus: &Envelope) -> Result<(Envelope, u64)>;

    /// The last block appended to the local ledger, used to align the
    /// starting point with the remote engine.
    fn get_last_block(&self) -> Block;

    /// Durably appends an agreed block. An error here is unrecoverable at
    /// this layer.
    fn append_block(&self, block: Block) -> Result<()>;

    /// Applies a configuration block's effects before it is appended.
    fn process_config_block(&self, block: &Block);
}
