use crate::Result;

/// An opaque, already-serialized submission (transaction or configuration
/// update). Owned by the caller until handed to `order`/`configure`, then
/// by the connection pool for the duration of the send.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    payload: Vec<u8>,
}

impl Envelope {
    pub fn new(payload: Vec<u8>) -> Envelope {
        Envelope { payload }
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Envelope> {
        Ok(bincode::deserialize(bytes)?)
    }
}
