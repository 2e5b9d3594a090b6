//! Helpers for exercising a chain against an in-process engine stub.

use crate::block::{Block, BlockHeader, BlockKind};
use crate::codec::{self, FrameWriter};
use crate::message::Envelope;
use crate::settings::Settings;
use crate::support::{BatchSize, ChainSupport, SharedConfig};
use crate::{Error, Result};

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::time::{sleep, timeout, Duration};

pub fn genesis() -> Block {
    Block::new(BlockHeader::new(0, None, [0u8; 32]), vec![])
}

/// Installs a compact subscriber so `RUST_LOG`-style debugging works in
/// tests; repeated calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_level(false)
        .with_target(false)
        .without_time()
        .compact()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Polls `cond` until it holds, panicking after five seconds.
pub async fn wait_until<F: Fn() -> bool>(cond: F) {
    timeout(Duration::from_secs(5), async {
        loop {
            if cond() {
                return;
            }
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

/// Recording `ChainSupport` implementation with switchable behaviour.
pub struct MockSupport {
    pub chain_id: String,
    pub sequence: AtomicU64,
    pub reject_normal: AtomicBool,
    pub fail_append: AtomicBool,
    pub normal_calls: AtomicUsize,
    /// What `process_config_update_msg` derives; `None` means rejection.
    pub derived: Mutex<Option<Envelope>>,
    pub appended: Mutex<Vec<Block>>,
    pub config_processed: Mutex<Vec<Block>>,
}

impl MockSupport {
    pub fn new(chain_id: &str) -> MockSupport {
        MockSupport {
            chain_id: chain_id.to_string(),
            sequence: AtomicU64::new(0),
            reject_normal: AtomicBool::new(false),
            fail_append: AtomicBool::new(false),
            normal_calls: AtomicUsize::new(0),
            derived: Mutex::new(None),
            appended: Mutex::new(vec![]),
            config_processed: Mutex::new(vec![]),
        }
    }
}

impl ChainSupport for MockSupport {
    fn chain_id(&self) -> String {
        self.chain_id.clone()
    }

    fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    fn shared_config(&self) -> SharedConfig {
        SharedConfig {
            batch_timeout: Duration::from_secs(2),
            batch_size: BatchSize { preferred_max_bytes: 1024, max_message_count: 10 },
        }
    }

    fn process_normal_msg(&self, _envelope: &Envelope) -> Result<()> {
        self.normal_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_normal.load(Ordering::SeqCst) {
            Err(Error::InvalidMessage("rejected by policy".to_string()))
        } else {
            Ok(())
        }
    }

    fn process_config_update_msg(&self, _impetus: &Envelope) -> Result<(Envelope, u64)> {
        match self.derived.lock().unwrap().clone() {
            Some(envelope) => Ok((envelope, self.sequence())),
            None => Err(Error::InvalidMessage("bad config update".to_string())),
        }
    }

    fn get_last_block(&self) -> Block {
        self.appended.lock().unwrap().last().cloned().unwrap_or_else(genesis)
    }

    fn append_block(&self, block: Block) -> Result<()> {
        if self.fail_append.load(Ordering::SeqCst) {
            return Err(Error::IO(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk failure",
            )));
        }
        self.appended.lock().unwrap().push(block);
        Ok(())
    }

    fn process_config_block(&self, block: &Block) {
        self.config_processed.lock().unwrap().push(block.clone());
    }
}

/// In-process stand-in for the agreement engine: accepts the control,
/// pool and receive connections a chain opens and records every frame it
/// receives per connection.
pub struct Engine {
    pub settings: Settings,
    pub control_frames: Arc<Mutex<Vec<Vec<u8>>>>,
    pub slot_frames: Vec<Arc<Mutex<Vec<Vec<u8>>>>>,
    delivery: Option<oneshot::Receiver<TcpStream>>,
}

impl Engine {
    pub async fn start(pool_size: usize) -> Engine {
        let send_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let recv_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let settings = Settings {
            send_address: send_listener.local_addr().unwrap().to_string(),
            recv_address: recv_listener.local_addr().unwrap().to_string(),
            pool_size,
        };

        let control_frames = Arc::new(Mutex::new(vec![]));
        let slot_frames: Vec<Arc<Mutex<Vec<Vec<u8>>>>> =
            (0..pool_size).map(|_| Arc::new(Mutex::new(vec![]))).collect();
        {
            // chains dial the control connection first, then the slots in
            // order, so accept order identifies each connection
            let control_frames = control_frames.clone();
            let slot_frames = slot_frames.clone();
            tokio::spawn(async move {
                let (control, _) = send_listener.accept().await.unwrap();
                record_frames(control, control_frames);
                for frames in slot_frames {
                    let (slot, _) = send_listener.accept().await.unwrap();
                    record_frames(slot, frames);
                }
            });
        }

        let (delivery_tx, delivery_rx) = oneshot::channel();
        tokio::spawn(async move {
            let (conn, _) = recv_listener.accept().await.unwrap();
            let _ = delivery_tx.send(conn);
        });

        Engine { settings, control_frames, slot_frames, delivery: Some(delivery_rx) }
    }

    /// The engine-side writer for the agreed-block stream.
    pub async fn delivery(&mut self) -> FrameWriter<TcpStream> {
        let conn = self.delivery.take().unwrap().await.unwrap();
        codec::writer(conn)
    }

    /// Writes one delivery frame pair: the serialized block, then the
    /// 1-byte kind tag.
    pub async fn deliver(writer: &mut FrameWriter<TcpStream>, block: &Block, kind: BlockKind) {
        Engine::try_deliver(writer, block, kind).await.unwrap();
    }

    /// Like `deliver`, but surfaces the write error once the bridge has
    /// closed its end of the receive connection.
    pub async fn try_deliver(
        writer: &mut FrameWriter<TcpStream>,
        block: &Block,
        kind: BlockKind,
    ) -> Result<()> {
        codec::write_bytes(writer, &block.to_bytes()?).await?;
        codec::write_bytes(writer, &[kind.tag()]).await
    }
}

fn record_frames(conn: TcpStream, frames: Arc<Mutex<Vec<Vec<u8>>>>) {
    tokio::spawn(async move {
        let mut reader = codec::reader(conn);
        while let Ok(Some(frame)) = codec::read_bytes(&mut reader).await {
            frames.lock().unwrap().push(frame);
        }
    });
}
