use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use brickline_frame::Response;
use tokio::sync::oneshot;
use tracing::{trace, warn};

use crate::error::{Result, SessionError};

/// Matches decoded replies to outstanding requests by sequence id.
///
/// A waiter is registered before its command is written and resolves with
/// the first reply carrying its id. Replies nobody is waiting for are
/// dropped. Clones share the same table.
#[derive(Debug, Clone, Default)]
pub struct ResponseCorrelator {
    table: Arc<Mutex<Table>>,
}

#[derive(Debug, Default)]
struct Table {
    pending: HashMap<u16, Waiter>,
    next_ticket: u64,
    closed: bool,
}

#[derive(Debug)]
struct Waiter {
    ticket: u64,
    tx: oneshot::Sender<Response>,
}

impl ResponseCorrelator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in the reply to `sequence`.
    ///
    /// Fails with `Disconnected` once the correlator has been closed.
    pub fn register(&self, sequence: u16) -> Result<PendingResponse> {
        let mut table = self.lock();
        if table.closed {
            return Err(SessionError::Disconnected);
        }
        let ticket = table.next_ticket;
        table.next_ticket += 1;

        let (tx, rx) = oneshot::channel();
        if table.pending.insert(sequence, Waiter { ticket, tx }).is_some() {
            warn!(sequence, "sequence id reused while a reply was outstanding");
        }
        Ok(PendingResponse {
            sequence,
            ticket,
            rx,
            table: Arc::clone(&self.table),
        })
    }

    /// Hand a reply to its waiter. Returns false if nobody was waiting.
    pub fn dispatch(&self, response: Response) -> bool {
        let sequence = response.sequence;
        let Some(waiter) = self.lock().pending.remove(&sequence) else {
            trace!(sequence, "dropping uncorrelated reply");
            return false;
        };
        waiter.tx.send(response).is_ok()
    }

    /// Fail every outstanding waiter with `Disconnected` and refuse new ones.
    pub fn close(&self) {
        let mut table = self.lock();
        table.closed = true;
        let dropped = table.pending.len();
        table.pending.clear();
        if dropped > 0 {
            trace!(dropped, "correlator closed with waiters outstanding");
        }
    }

    /// Number of outstanding waiters.
    pub fn pending(&self) -> usize {
        self.lock().pending.len()
    }

    fn lock(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A registered wait for one reply. Dropping it deregisters the wait.
#[derive(Debug)]
pub struct PendingResponse {
    sequence: u16,
    ticket: u64,
    rx: oneshot::Receiver<Response>,
    table: Arc<Mutex<Table>>,
}

impl PendingResponse {
    pub fn sequence(&self) -> u16 {
        self.sequence
    }

    /// Wait for the reply, bounded by `timeout` when given.
    pub async fn wait(mut self, timeout: Option<Duration>) -> Result<Response> {
        let received = match timeout {
            Some(limit) => tokio::time::timeout(limit, &mut self.rx)
                .await
                .map_err(|_| SessionError::Timeout(limit))?,
            None => (&mut self.rx).await,
        };
        received.map_err(|_| SessionError::Disconnected)
    }
}

impl Drop for PendingResponse {
    fn drop(&mut self) {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        if table
            .pending
            .get(&self.sequence)
            .is_some_and(|waiter| waiter.ticket == self.ticket)
        {
            table.pending.remove(&self.sequence);
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use brickline_frame::decode_response;

    use super::*;

    fn reply(sequence: u16, value: u8) -> Response {
        let [lo, hi] = sequence.to_le_bytes();
        decode_response(Bytes::from(vec![lo, hi, 0x02, value])).unwrap()
    }

    #[tokio::test]
    async fn resolves_out_of_order() {
        let correlator = ResponseCorrelator::new();
        let first = correlator.register(1).unwrap();
        let second = correlator.register(2).unwrap();

        assert!(correlator.dispatch(reply(2, 0xB)));
        assert!(correlator.dispatch(reply(1, 0xA)));

        assert_eq!(first.wait(None).await.unwrap().data(), &[0xA]);
        assert_eq!(second.wait(None).await.unwrap().data(), &[0xB]);
        assert_eq!(correlator.pending(), 0);
    }

    #[test]
    fn reply_before_registration_is_dropped() {
        let correlator = ResponseCorrelator::new();
        assert!(!correlator.dispatch(reply(5, 0)));
        let _pending = correlator.register(5).unwrap();
        assert_eq!(correlator.pending(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_deregisters() {
        let correlator = ResponseCorrelator::new();
        let pending = correlator.register(9).unwrap();
        let err = pending
            .wait(Some(Duration::from_millis(50)))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Timeout(d) if d == Duration::from_millis(50)));
        assert_eq!(correlator.pending(), 0);
        assert!(!correlator.dispatch(reply(9, 0)));
    }

    #[tokio::test]
    async fn close_fails_outstanding_waiters() {
        let correlator = ResponseCorrelator::new();
        let pending = correlator.register(3).unwrap();
        correlator.close();
        assert!(matches!(
            pending.wait(None).await,
            Err(SessionError::Disconnected)
        ));
        assert!(matches!(
            correlator.register(4),
            Err(SessionError::Disconnected)
        ));
    }

    #[test]
    fn stale_drop_keeps_newer_waiter() {
        let correlator = ResponseCorrelator::new();
        let old = correlator.register(7).unwrap();
        let _new = correlator.register(7).unwrap();
        drop(old);
        assert_eq!(correlator.pending(), 1);
    }
}
