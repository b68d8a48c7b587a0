//! Interruption-safe send/receive on a queue connection.
//!
//! A blocking queue operation interrupted by a delivered signal is not a real
//! failure; both wrappers retry it transparently and surface only the first
//! hard failure.

use std::io;

use futures::{Sink, SinkExt, Stream, StreamExt};

use crate::{Message, ProtocolError, Result};

/// Send one message, blocking while the queue is full.
///
/// Retries on `ErrorKind::Interrupted`; any other error is returned as-is.
pub async fn send<Q>(queue: &mut Q, message: Message) -> Result<()>
where
    Q: Sink<Message, Error = ProtocolError> + Unpin,
{
    loop {
        match queue.send(message.clone()).await {
            Ok(()) => return Ok(()),
            Err(ProtocolError::IoError(e)) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Receive the next message, blocking while the queue is empty.
///
/// Retries on `ErrorKind::Interrupted`; a peer that went away maps to
/// `QueueClosed`. A message is whole or entirely absent, never partial.
pub async fn receive<Q>(queue: &mut Q) -> Result<Message>
where
    Q: Stream<Item = Result<Message>> + Unpin,
{
    loop {
        match queue.next().await {
            Some(Ok(message)) => return Ok(message),
            Some(Err(ProtocolError::IoError(e))) if e.kind() == io::ErrorKind::Interrupted => {
                continue
            }
            Some(Err(e)) => return Err(e),
            None => return Err(ProtocolError::QueueClosed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClaimRequest;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    fn claim(worker_id: u32) -> Message {
        Message::Claim(ClaimRequest { worker_id })
    }

    fn interrupted() -> ProtocolError {
        ProtocolError::IoError(io::Error::from(io::ErrorKind::Interrupted))
    }

    /// Sink that fails the first `interrupts_left` sends with EINTR.
    struct FlakySink {
        interrupts_left: usize,
        sent: Vec<Message>,
    }

    impl Sink<Message> for FlakySink {
        type Error = ProtocolError;

        fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn start_send(self: Pin<&mut Self>, item: Message) -> Result<()> {
            let this = self.get_mut();
            if this.interrupts_left > 0 {
                this.interrupts_left -= 1;
                return Err(interrupted());
            }
            this.sent.push(item);
            Ok(())
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_send_retries_interrupts() {
        let mut sink = FlakySink {
            interrupts_left: 2,
            sent: Vec::new(),
        };

        send(&mut sink, claim(1)).await.unwrap();
        assert_eq!(sink.sent.len(), 1);
    }

    #[tokio::test]
    async fn test_send_surfaces_hard_failure() {
        struct BrokenSink;

        impl Sink<Message> for BrokenSink {
            type Error = ProtocolError;

            fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<()>> {
                Poll::Ready(Ok(()))
            }

            fn start_send(self: Pin<&mut Self>, _item: Message) -> Result<()> {
                Err(ProtocolError::IoError(io::Error::from(
                    io::ErrorKind::BrokenPipe,
                )))
            }

            fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<()>> {
                Poll::Ready(Ok(()))
            }

            fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<()>> {
                Poll::Ready(Ok(()))
            }
        }

        let mut sink = BrokenSink;
        match send(&mut sink, claim(1)).await {
            Err(ProtocolError::IoError(e)) => assert_eq!(e.kind(), io::ErrorKind::BrokenPipe),
            other => panic!("unexpected send result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_receive_retries_interrupts() {
        let mut stream = futures::stream::iter(vec![Err(interrupted()), Ok(claim(3))]);

        let message = receive(&mut stream).await.unwrap();
        match message {
            Message::Claim(req) => assert_eq!(req.worker_id, 3),
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_receive_maps_eof_to_closed() {
        let mut stream = futures::stream::iter(Vec::<Result<Message>>::new());

        assert!(matches!(
            receive(&mut stream).await,
            Err(ProtocolError::QueueClosed)
        ));
    }

    #[tokio::test]
    async fn test_receive_surfaces_hard_failure() {
        let mut stream = futures::stream::iter(vec![Err::<Message, _>(
            ProtocolError::InvalidMessageType(9),
        )]);

        assert!(matches!(
            receive(&mut stream).await,
            Err(ProtocolError::InvalidMessageType(9))
        ));
    }
}
