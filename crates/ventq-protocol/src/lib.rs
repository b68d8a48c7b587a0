mod codec;
mod message;

pub mod qio;

pub use codec::MessageCodec;
pub use message::{AssignResponse, ClaimRequest, Message, MessageType, ReportRequest};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid message type: {0}")]
    InvalidMessageType(u8),

    #[error("Message too large: {0} bytes")]
    MessageTooLarge(usize),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] bincode::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Queue closed by peer")]
    QueueClosed,
}

pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Maximum frame size. Queue messages carry a single task or a result
/// summary; anything larger is a framing bug.
pub const MAX_MESSAGE_SIZE: usize = 4096;
