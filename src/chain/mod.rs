//! The per-channel aggregate root: owns the connection pool, the receive
//! connection, the two delivery queues and the shutdown signal.

pub mod deliver;

use crate::codec;
use crate::lifecycle::Lifecycle;
use crate::message::Envelope;
use crate::pool::ConnectionPool;
use crate::settings::Settings;
use crate::support::ChainSupport;
use crate::{Error, Result};

use self::deliver::DELIVERY_QUEUE_CAPACITY;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Outcome of a dispatch call. `Discarded` marks a message the local
/// validation rejected, which is an expected outcome and not an error.
/// `Sent` means handed to the transport, not agreed or delivered.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Dispatch {
    Sent,
    Discarded,
}

pub struct Chain {
    support: Arc<dyn ChainSupport>,
    settings: Settings,
    is_system_channel: bool,
    lifecycle: Arc<Lifecycle>,
    pool: RwLock<Option<Arc<ConnectionPool>>>,
    recv_task: Mutex<Option<JoinHandle<()>>>,
    started: AtomicBool,
}

impl Chain {
    pub fn new(
        is_system_channel: bool,
        settings: Settings,
        support: Arc<dyn ChainSupport>,
    ) -> Chain {
        info!("creating new bridge chain with ID '{}'", support.chain_id());
        Chain {
            support,
            settings,
            is_system_channel,
            lifecycle: Arc::new(Lifecycle::new()),
            pool: RwLock::new(None),
            recv_task: Mutex::new(None),
            started: AtomicBool::new(false),
        }
    }

    pub fn is_system_channel(&self) -> bool {
        self.is_system_channel
    }

    /// Opens the pool and receive connections, runs the handshake and
    /// announces the chain, then spawns the delivery loops. Dispatch and
    /// delivery only become usable after this returns `Ok`; on error no
    /// background loop is left running. A second call is an error.
    pub async fn start(&self) -> Result<()> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(Error::AlreadyStarted);
        }
        info!("starting bridge chain with ID '{}'", self.support.chain_id());
        match self.connect().await {
            Ok(()) => Ok(()),
            Err(err) => {
                if self.is_system_channel {
                    error!(
                        "could not start system channel '{}': {}",
                        self.support.chain_id(),
                        err
                    );
                } else {
                    warn!("could not start channel '{}': {}", self.support.chain_id(), err);
                }
                Err(err)
            }
        }
    }

    async fn connect(&self) -> Result<()> {
        let pool = Arc::new(ConnectionPool::open(&self.settings).await?);
        pool.handshake(&self.support.shared_config()).await?;

        let recv = TcpStream::connect(&self.settings.recv_address).await?;

        let last_block = self.support.get_last_block();
        let header = bincode::serialize(&last_block.header)?;
        pool.announce(&self.support.chain_id(), &header).await?;

        *self.pool.write().unwrap() = Some(pool);

        let (regular_tx, regular_rx) = mpsc::channel(DELIVERY_QUEUE_CAPACITY);
        let (config_tx, config_rx) = mpsc::channel(DELIVERY_QUEUE_CAPACITY);
        let recv_task =
            tokio::spawn(deliver::receive_loop(codec::reader(recv), regular_tx, config_tx));
        *self.recv_task.lock().unwrap() = Some(recv_task);
        tokio::spawn(deliver::apply_loop(
            regular_rx,
            config_rx,
            self.support.clone(),
            self.lifecycle.clone(),
        ));
        Ok(())
    }

    /// Submits a transaction for ordering. A stale caller view
    /// (`config_seq` behind the chain's current sequence) triggers local
    /// re-validation first; a rejected message is silently discarded.
    pub async fn order(&self, envelope: Envelope, config_seq: u64) -> Result<Dispatch> {
        let pool = self.pool()?;
        if config_seq < self.support.sequence() {
            if let Err(err) = self.support.process_normal_msg(&envelope) {
                warn!("discarding bad normal message: {}", err);
                return Ok(Dispatch::Discarded);
            }
        }
        pool.submit(&self.support.chain_id(), false, &envelope.to_bytes()?).await?;
        self.check_halted()?;
        Ok(Dispatch::Sent)
    }

    /// Submits a configuration update for ordering. The effective config
    /// envelope is always re-derived from the impetus by the
    /// configuration collaborator; a rejected impetus is silently
    /// discarded.
    pub async fn configure(
        &self,
        impetus: Envelope,
        _config_update: Envelope,
        config_seq: u64,
    ) -> Result<Dispatch> {
        let pool = self.pool()?;
        if config_seq < self.support.sequence() {
            debug!(
                "config update for '{}' was derived against a stale sequence ({} < {})",
                self.support.chain_id(),
                config_seq,
                self.support.sequence()
            );
        }
        let msg = match self.support.process_config_update_msg(&impetus) {
            Ok((msg, _seq)) => msg,
            Err(err) => {
                warn!("discarding bad config message: {}", err);
                return Ok(Dispatch::Discarded);
            }
        };
        pool.submit(&self.support.chain_id(), true, &msg.to_bytes()?).await?;
        self.check_halted()?;
        Ok(Dispatch::Sent)
    }

    /// Broadcasts shutdown and releases the transport: the pool
    /// connections are dropped and the receive task is aborted, closing
    /// its connection. Repeated halts are no-ops.
    pub fn halt(&self) {
        if self.lifecycle.halt() {
            debug!("halting chain '{}'", self.support.chain_id());
            *self.pool.write().unwrap() = None;
            if let Some(task) = self.recv_task.lock().unwrap().take() {
                task.abort();
            }
        }
    }

    /// A receiver that fires exactly once, at halt.
    pub fn errored(&self) -> watch::Receiver<bool> {
        self.lifecycle.subscribe()
    }

    /// The reason the chain aborted, if an unrecoverable failure occurred.
    pub fn fatal_reason(&self) -> Option<String> {
        self.lifecycle.fatal_reason()
    }

    fn pool(&self) -> Result<Arc<ConnectionPool>> {
        match self.pool.read().unwrap().clone() {
            Some(pool) => Ok(pool),
            None if self.lifecycle.is_halted() => Err(Error::ChainHalted),
            None => Err(Error::NotStarted),
        }
    }

    fn check_halted(&self) -> Result<()> {
        if self.lifecycle.is_halted() {
            Err(Error::ChainHalted)
        } else {
            Ok(())
        }
    }
}
