//! The delivery pipeline: turns the inbound framed byte stream into
//! sequential ledger appends, keeping the regular and configuration
//! streams in their own arrival order.

use crate::block::{Block, BlockKind};
use crate::codec::{self, FrameReader};
use crate::lifecycle::Lifecycle;
use crate::support::ChainSupport;

use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Bound on each delivery queue; once a queue fills under burst the
/// receive loop backpressures on the socket.
pub const DELIVERY_QUEUE_CAPACITY: usize = 64;

/// Reads `[block][kind tag]` frame pairs and routes each decoded block
/// into the matching queue. A malformed or transport-hiccuped frame is
/// logged and dropped; only a closed connection (or a closed consumer)
/// ends the loop.
pub(super) async fn receive_loop(
    mut reader: FrameReader<TcpStream>,
    regular: mpsc::Sender<Block>,
    config: mpsc::Sender<Block>,
) {
    loop {
        let frame = match codec::read_bytes(&mut reader).await {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                debug!("receive connection closed");
                return;
            }
            Err(err) => {
                warn!("error while receiving block: {:?}", err);
                continue;
            }
        };
        let block = match Block::from_bytes(&frame) {
            Ok(block) => block,
            Err(err) => {
                warn!("error while decoding block: {:?}", err);
                continue;
            }
        };
        let tag = match codec::read_bytes(&mut reader).await {
            Ok(Some(tag)) => tag,
            Ok(None) => {
                debug!("receive connection closed");
                return;
            }
            Err(err) => {
                warn!("error while receiving block kind: {:?}", err);
                continue;
            }
        };
        let queue = match BlockKind::from_tag(tag.first().copied().unwrap_or(0)) {
            BlockKind::Config => &config,
            BlockKind::Regular => &regular,
        };
        if queue.send(block).await.is_err() {
            debug!("delivery queue closed");
            return;
        }
    }
}

/// Waits on both queues (first ready wins, no priority) and applies each
/// dequeued block to the ledger. An append failure is unrecoverable and
/// raised to the lifecycle controller.
pub(super) async fn apply_loop(
    mut regular: mpsc::Receiver<Block>,
    mut config: mpsc::Receiver<Block>,
    support: Arc<dyn ChainSupport>,
    lifecycle: Arc<Lifecycle>,
) {
    let mut shutdown = lifecycle.subscribe();
    loop {
        if lifecycle.is_halted() {
            debug!("exiting...");
            return;
        }
        tokio::select! {
            Some(block) = regular.recv() => {
                let height = block.height();
                debug!("appending regular block at height {}", height);
                if let Err(err) = support.append_block(block) {
                    lifecycle.fatal(format!(
                        "could not append regular block at height {}: {}",
                        height, err
                    ));
                    return;
                }
            }
            Some(block) = config.recv() => {
                let height = block.height();
                debug!("appending configuration block at height {}", height);
                support.process_config_block(&block);
                if let Err(err) = support.append_block(block) {
                    lifecycle.fatal(format!(
                        "could not append configuration block at height {}: {}",
                        height, err
                    ));
                    return;
                }
            }
            _ = shutdown.changed() => {
                debug!("exiting...");
                return;
            }
            else => return,
        }
    }
}
