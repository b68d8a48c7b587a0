use serde::{Deserialize, Serialize};
use ventq_core::{ResultSummary, Task};

/// Message types for the queue wire protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    Claim = 1,
    Assign = 2,
    Report = 3,
}

impl MessageType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(MessageType::Claim),
            2 => Some(MessageType::Assign),
            3 => Some(MessageType::Report),
            _ => None,
        }
    }

    pub fn as_u8(&self) -> u8 {
        *self as u8
    }
}

/// Protocol messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Message {
    /// Worker asks for the next task
    Claim(ClaimRequest),

    /// Coordinator hands a task to the claiming worker
    Assign(AssignResponse),

    /// Worker delivers its completion summary
    Report(ReportRequest),
}

impl Message {
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::Claim(_) => MessageType::Claim,
            Message::Assign(_) => MessageType::Assign,
            Message::Report(_) => MessageType::Report,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimRequest {
    pub worker_id: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignResponse {
    pub task: Task,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRequest {
    pub summary: ResultSummary,
}
