use super::types::{BlockHash, BlockHeight};

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// The block height
    height: BlockHeight,
    /// Hash of the preceding block in the chain (`None` for genesis)
    predecessor: Option<BlockHash>,
    /// Hash over the block body
    data_hash: BlockHash,
}

impl std::fmt::Display for BlockHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut s = match self.predecessor {
            Some(predecessor) => format!("predecessor = {}\n", hex::encode(predecessor)),
            None => format!("predecessor = None\n"),
        };
        s = format!("{}block_height = {:?}\n", s, self.height);
        s = format!("{}data_hash = {}", s, hex::encode(self.data_hash));
        write!(f, "{}\n", s)
    }
}

impl BlockHeader {
    pub fn new(
        height: BlockHeight,
        predecessor: Option<BlockHash>,
        data_hash: BlockHash,
    ) -> BlockHeader {
        BlockHeader { height, predecessor, data_hash }
    }

    pub fn height(&self) -> BlockHeight {
        self.height
    }

    pub fn predecessor(&self) -> Option<BlockHash> {
        self.predecessor
    }

    pub fn data_hash(&self) -> BlockHash {
        self.data_hash
    }
}
