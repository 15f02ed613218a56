//! In-memory transport
//!
//! Stands in for a sensor without hardware. Bytes queued with
//! [`MemoryTransport::feed`] or produced by a responder are handed out by
//! `receive`; everything sent is recorded. Clones share the same state, so a
//! test can keep one handle while a session owns the other. Faults can be
//! scripted for the next `send` or `receive` to simulate a failing line.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use tracing::trace;

use crate::{error::*, Transport};

type Responder = Box<dyn FnMut(&[u8]) -> Vec<u8> + Send>;

/// Scripted in-process transport
#[derive(Clone)]
pub struct MemoryTransport {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    connected: bool,
    inbound: BytesMut,
    sent: Vec<Bytes>,
    responder: Option<Responder>,
    send_fault: Option<io::ErrorKind>,
    receive_fault: Option<io::ErrorKind>,
}

impl MemoryTransport {
    /// Create an empty transport
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                connected: false,
                inbound: BytesMut::new(),
                sent: Vec::new(),
                responder: None,
                send_fault: None,
                receive_fault: None,
            })),
        }
    }

    /// Reply to every `send` with the bytes returned by `responder`
    pub fn with_responder<F>(self, responder: F) -> Self
    where
        F: FnMut(&[u8]) -> Vec<u8> + Send + 'static,
    {
        self.inner.lock().responder = Some(Box::new(responder));
        self
    }

    /// Queue bytes for the next `receive` calls
    pub fn feed(&self, data: &[u8]) {
        self.inner.lock().inbound.extend_from_slice(data);
    }

    /// Everything sent so far, one entry per `send`
    pub fn sent(&self) -> Vec<Bytes> {
        self.inner.lock().sent.clone()
    }

    /// Make the next `send` fail with an I/O error of `kind`
    ///
    /// The failed write is not recorded and does not reach the responder.
    pub fn fail_next_send(&self, kind: io::ErrorKind) {
        self.inner.lock().send_fault = Some(kind);
    }

    /// Make the next `receive` fail with an I/O error of `kind`
    pub fn fail_next_receive(&self, kind: io::ErrorKind) {
        self.inner.lock().receive_fault = Some(kind);
    }

    /// Bytes queued but not yet received
    pub fn pending(&self) -> usize {
        self.inner.lock().inbound.len()
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn connect(&mut self) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.connected {
            return Err(Error::AlreadyConnected);
        }
        inner.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.inner.lock().connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.inner.lock().connected
    }

    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        if !inner.connected {
            return Err(Error::NotConnected);
        }
        if let Some(kind) = inner.send_fault.take() {
            return Err(io::Error::new(kind, "scripted send failure").into());
        }

        trace!("Sending {} bytes: {}", data.len(), hex::encode(data));

        inner.sent.push(Bytes::copy_from_slice(data));
        if let Some(responder) = inner.responder.as_mut() {
            let reply = responder(data);
            inner.inbound.extend_from_slice(&reply);
        }

        Ok(())
    }

    async fn receive(&mut self, max_bytes: usize, timeout: Duration) -> Result<BytesMut> {
        {
            let mut inner = self.inner.lock();
            if !inner.connected {
                return Err(Error::NotConnected);
            }
            if let Some(kind) = inner.receive_fault.take() {
                return Err(io::Error::new(kind, "scripted receive failure").into());
            }
            if inner.inbound.len() >= max_bytes {
                return Ok(inner.inbound.split_to(max_bytes));
            }
        }

        // Not enough queued: behave like a line that goes quiet
        tokio::time::sleep(timeout).await;

        let mut inner = self.inner.lock();
        let n = inner.inbound.len().min(max_bytes);
        Ok(inner.inbound.split_to(n))
    }

    fn description(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_memory_transport_not_connected() {
        let mut transport = MemoryTransport::new();

        assert!(matches!(transport.send(&[1]).await, Err(Error::NotConnected)));
        assert!(matches!(
            transport.receive(1, Duration::ZERO).await,
            Err(Error::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_memory_transport_feed() {
        let mut transport = MemoryTransport::new();
        transport.connect().await.unwrap();
        transport.feed(&[1, 2, 3, 4]);

        let first = transport.receive(3, Duration::from_secs(1)).await.unwrap();
        assert_eq!(first.as_ref(), &[1, 2, 3]);
        assert_eq!(transport.pending(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_memory_transport_short_read_waits_for_timeout() {
        let mut transport = MemoryTransport::new();
        transport.connect().await.unwrap();
        transport.feed(&[9]);

        let start = tokio::time::Instant::now();
        let data = transport.receive(4, Duration::from_millis(250)).await.unwrap();

        assert_eq!(data.as_ref(), &[9]);
        assert_eq!(start.elapsed(), Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_memory_transport_scripted_faults_fire_once() {
        let mut transport = MemoryTransport::new().with_responder(|_| vec![0xAA]);
        let handle = transport.clone();
        transport.connect().await.unwrap();

        handle.fail_next_send(io::ErrorKind::BrokenPipe);
        match transport.send(&[1]).await {
            Err(Error::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::BrokenPipe),
            other => panic!("expected I/O error, got {:?}", other),
        }
        assert!(handle.sent().is_empty());
        assert_eq!(handle.pending(), 0);

        transport.send(&[1]).await.unwrap();
        handle.fail_next_receive(io::ErrorKind::TimedOut);
        assert!(matches!(transport.receive(1, Duration::ZERO).await, Err(Error::Io(_))));

        let reply = transport.receive(1, Duration::ZERO).await.unwrap();
        assert_eq!(reply.as_ref(), &[0xAA]);
    }

    #[tokio::test]
    async fn test_memory_transport_responder() {
        let mut transport = MemoryTransport::new().with_responder(|data| data.iter().rev().copied().collect());
        let handle = transport.clone();
        transport.connect().await.unwrap();

        transport.send(&[1, 2]).await.unwrap();
        let reply = transport.receive(2, Duration::ZERO).await.unwrap();

        assert_eq!(reply.as_ref(), &[2, 1]);
        assert_eq!(handle.sent(), vec![Bytes::from_static(&[1, 2])]);
    }
}
