//! The pooled, ordering-preserving transport to the agreement engine: one
//! control connection for the handshake plus `pool_size` independently
//! locked slot connections that fan out submissions.

use crate::codec::{self, FrameWriter};
use crate::settings::Settings;
use crate::support::SharedConfig;
use crate::Result;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::debug;

pub struct ConnectionPool {
    control: Mutex<FrameWriter<TcpStream>>,
    slots: Vec<Arc<Mutex<FrameWriter<TcpStream>>>>,
    cursor: AtomicUsize,
}

impl ConnectionPool {
    /// Dials the control connection and every slot connection. Any dial
    /// failure aborts the open; no half-opened pool is returned.
    pub async fn open(settings: &Settings) -> Result<ConnectionPool> {
        let control = TcpStream::connect(&settings.send_address).await?;
        let mut slots = Vec::with_capacity(settings.pool_size);
        for i in 0..settings.pool_size {
            let conn = TcpStream::connect(&settings.send_address).await?;
            debug!("created pool connection #{}", i);
            slots.push(Arc::new(Mutex::new(codec::writer(conn))));
        }
        debug!("created connection pool of size {}", settings.pool_size);
        Ok(ConnectionPool {
            control: Mutex::new(codec::writer(control)),
            slots,
            cursor: AtomicUsize::new(0),
        })
    }

    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Sends the batch parameters on the control connection, in order:
    /// preferred max bytes, max message count, batch timeout in
    /// nanoseconds.
    pub async fn handshake(&self, shared: &SharedConfig) -> Result<()> {
        let mut control = self.control.lock().await;
        codec::write_u32(&mut control, shared.batch_size.preferred_max_bytes).await?;
        codec::write_u32(&mut control, shared.batch_size.max_message_count).await?;
        codec::write_u64(&mut control, shared.batch_timeout.as_nanos() as u64).await?;
        Ok(())
    }

    /// Announces the chain on the control connection: channel identity
    /// followed by the serialized last known block header.
    pub async fn announce(&self, chain_id: &str, last_header: &[u8]) -> Result<()> {
        let mut control = self.control.lock().await;
        codec::write_string(&mut control, chain_id).await?;
        codec::write_bytes(&mut control, last_header).await?;
        Ok(())
    }

    /// Sends one submission on the next round-robin slot while holding
    /// that slot's lock: channel identity, config tag, envelope bytes.
    ///
    /// The cursor is advanced with a relaxed atomic; two concurrent
    /// callers may briefly target the same slot, which costs fairness but
    /// never safety since the slot lock serializes the actual frames.
    pub async fn submit(&self, chain_id: &str, is_config: bool, envelope: &[u8]) -> Result<()> {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.slots.len();
        let mut slot = self.slots[index].lock().await;
        codec::write_string(&mut slot, chain_id).await?;
        codec::write_bool(&mut slot, is_config).await?;
        codec::write_bytes(&mut slot, envelope).await?;
        Ok(())
    }
}
