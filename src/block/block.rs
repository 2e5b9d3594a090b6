use super::block_header::BlockHeader;
use super::types::{BlockHash, BlockHeight};

use crate::message::Envelope;
use crate::Result;

/// An agreed output of the remote engine: a header plus the ordered
/// envelopes the engine batched into it. Produced by the delivery
/// pipeline's decode step, consumed exactly once by the ledger.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Envelope>,
}

impl std::fmt::Display for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.header.fmt(f)
    }
}

impl Block {
    pub fn new(header: BlockHeader, transactions: Vec<Envelope>) -> Block {
        Block { header, transactions }
    }

    pub fn height(&self) -> BlockHeight {
        self.header.height()
    }

    pub fn predecessor(&self) -> Option<BlockHash> {
        self.header.predecessor()
    }

    pub fn hash(&self) -> Result<BlockHash> {
        let encoded = bincode::serialize(self)?;
        Ok(blake3::hash(&encoded).as_bytes().clone())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Block> {
        Ok(bincode::deserialize(bytes)?)
    }
}
