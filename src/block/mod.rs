pub mod block;
pub mod block_header;
pub mod types;

pub use block::Block;
pub use block_header::BlockHeader;
pub use types::{BlockHash, BlockHeight, BlockKind};
