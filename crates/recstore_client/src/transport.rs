//! Transport layer abstraction.

use crate::error::{ClientError, ClientResult};
use parking_lot::Mutex;
use recstore_protocol::{Request, Response};
use std::collections::VecDeque;
use std::sync::Arc;

/// Carries one request to a server and brings back its response.
///
/// Implementations are used behind the client's lock, so a round trip never
/// overlaps another on the same transport.
pub trait StoreTransport: Send {
    /// Sends a request and waits for its response.
    fn round_trip(&mut self, request: &Request) -> ClientResult<Response>;

    /// Checks if the transport is connected.
    fn is_connected(&self) -> bool;

    /// Closes the transport. Closing twice is not an error.
    fn close(&mut self) -> ClientResult<()>;
}

/// A scripted transport for testing.
///
/// Answers requests from a queue of canned responses and records every
/// request it sees.
#[derive(Debug, Default, Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

#[derive(Debug, Default)]
struct MockState {
    responses: VecDeque<ClientResult<Response>>,
    requests: Vec<Request>,
    closed: bool,
}

impl MockTransport {
    /// Creates a mock with no queued responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response.
    pub fn push_response(&self, response: Response) {
        self.state.lock().responses.push_back(Ok(response));
    }

    /// Queues a failure.
    pub fn push_error(&self, error: ClientError) {
        self.state.lock().responses.push_back(Err(error));
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<Request> {
        self.state.lock().requests.clone()
    }

    /// Returns true once `close` was called.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

impl StoreTransport for MockTransport {
    fn round_trip(&mut self, request: &Request) -> ClientResult<Response> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(ClientError::NotConnected);
        }
        state.requests.push(request.clone());
        state
            .responses
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::Protocol("no response queued".into())))
    }

    fn is_connected(&self) -> bool {
        !self.state.lock().closed
    }

    fn close(&mut self) -> ClientResult<()> {
        self.state.lock().closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recstore_protocol::Namespace;

    #[test]
    fn mock_replays_queue() {
        let mock = MockTransport::new();
        mock.push_response(Response::Count { count: 3 });
        mock.push_error(ClientError::Store("full".into()));

        let mut transport = mock.clone();
        let request = Request::Count {
            namespace: Namespace::new("db", "c"),
        };
        assert_eq!(
            transport.round_trip(&request).unwrap(),
            Response::Count { count: 3 }
        );
        assert!(matches!(
            transport.round_trip(&request),
            Err(ClientError::Store(_))
        ));
        assert!(matches!(
            transport.round_trip(&request),
            Err(ClientError::Protocol(_))
        ));
        assert_eq!(mock.requests().len(), 3);
    }

    #[test]
    fn mock_close() {
        let mock = MockTransport::new();
        let mut transport = mock.clone();
        assert!(transport.is_connected());
        transport.close().unwrap();
        transport.close().unwrap();
        assert!(mock.is_closed());
        assert!(matches!(
            transport.round_trip(&Request::ListCollections {
                database: "db".into()
            }),
            Err(ClientError::NotConnected)
        ));
    }
}
