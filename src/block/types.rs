pub type BlockHash = [u8; 32];
pub type BlockHeight = u64;

/// Kind discriminator carried in the 1-byte tag frame that follows every
/// delivered block on the receive connection.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum BlockKind {
    Regular,
    Config,
}

impl BlockKind {
    /// Anything other than `1` is treated as a regular block.
    pub fn from_tag(tag: u8) -> BlockKind {
        if tag == 1 {
            BlockKind::Config
        } else {
            BlockKind::Regular
        }
    }

    pub fn tag(&self) -> u8 {
        match self {
            BlockKind::Regular => 0,
            BlockKind::Config => 1,
        }
    }
}
