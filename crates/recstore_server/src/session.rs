//! Per-connection request handling.

use crate::catalog::Catalog;
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use recstore_codec::{Decode, Encode};
use recstore_protocol::{
    ErrorKind, Filter, Namespace, Request, Response, StoredRecord, PROTOCOL_VERSION,
};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use tracing::debug;

/// State shared by every session of a server.
#[derive(Debug)]
pub struct ServerContext {
    /// Server configuration.
    pub config: ServerConfig,
    /// Collections held by the server.
    pub catalog: Catalog,
}

impl ServerContext {
    /// Creates a context with an empty catalog.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            catalog: Catalog::new(),
        }
    }
}

/// One connection's view of the server.
///
/// Cursors belong to the session that opened them and disappear with it.
/// Beyond [`ServerConfig::max_open_cursors`] the oldest open cursor is
/// evicted.
pub struct Session {
    context: Arc<ServerContext>,
    cursors: BTreeMap<u64, VecDeque<StoredRecord>>,
    next_cursor_id: u64,
}

impl Session {
    /// Opens a session against a shared context.
    pub fn new(context: Arc<ServerContext>) -> Self {
        Self {
            context,
            cursors: BTreeMap::new(),
            next_cursor_id: 1,
        }
    }

    /// Number of cursors still open.
    pub fn open_cursors(&self) -> usize {
        self.cursors.len()
    }

    /// Handles one encoded request frame and returns the encoded response.
    ///
    /// Undecodable requests are answered with a protocol error rather than
    /// failing the session.
    pub fn handle_frame(&mut self, body: &[u8]) -> ServerResult<Vec<u8>> {
        let response = match Request::decode(body) {
            Ok(request) => self.handle(request),
            Err(e) => Response::error(ErrorKind::Protocol, format!("undecodable request: {}", e)),
        };
        Ok(response.encode()?)
    }

    /// Handles one request.
    pub fn handle(&mut self, request: Request) -> Response {
        let name = request.name();
        match self.dispatch(request) {
            Ok(response) => {
                debug!(request = name, response = response.name(), "handled request");
                response
            }
            Err(e) => {
                debug!(request = name, error = %e, "request failed");
                Response::error(e.kind(), e.to_string())
            }
        }
    }

    fn dispatch(&mut self, request: Request) -> ServerResult<Response> {
        let catalog = &self.context.catalog;
        match request {
            Request::Hello {
                protocol_version,
                client,
            } => {
                if protocol_version != PROTOCOL_VERSION {
                    return Err(ServerError::InvalidRequest(format!(
                        "unsupported protocol version {}",
                        protocol_version
                    )));
                }
                debug!(%client, "client said hello");
                Ok(Response::Hello {
                    protocol_version: PROTOCOL_VERSION,
                    server: format!("recstore {}", env!("CARGO_PKG_VERSION")),
                })
            }
            Request::EnsureIndex { namespace, field } => {
                let created = catalog.ensure_index(&namespace, &field)?;
                Ok(Response::IndexEnsured { created })
            }
            Request::ListIndexes { namespace } => Ok(Response::Indexes {
                fields: catalog.indexes(&namespace),
            }),
            Request::Insert { namespace, record } => {
                let id = catalog.insert(&namespace, record)?;
                Ok(Response::Inserted { id })
            }
            Request::Count { namespace } => Ok(Response::Count {
                count: catalog.count(&namespace),
            }),
            Request::Find {
                namespace,
                filter,
                batch_size,
            } => self.find(&namespace, &filter, batch_size),
            Request::GetMore {
                cursor_id,
                batch_size,
            } => self.get_more(cursor_id, batch_size),
            Request::KillCursor { cursor_id } => Ok(Response::CursorKilled {
                found: self.cursors.remove(&cursor_id).is_some(),
            }),
            Request::ListCollections { database } => Ok(Response::Collections {
                names: catalog.collection_names(&database),
            }),
        }
    }

    fn find(
        &mut self,
        namespace: &Namespace,
        filter: &Filter,
        batch_size: u32,
    ) -> ServerResult<Response> {
        let results = self.context.catalog.query(
            namespace,
            filter,
            self.context.config.pattern_syntax,
        )?;
        debug!(%namespace, %filter, matched = results.len(), "query executed");

        let cursor_id = self.next_cursor_id;
        self.next_cursor_id += 1;
        self.cursors.insert(cursor_id, results.into());
        let response = self.get_more(cursor_id, batch_size)?;
        self.evict_cursors();
        Ok(response)
    }

    fn evict_cursors(&mut self) {
        let limit = self.context.config.max_open_cursors.max(1);
        while self.cursors.len() > limit {
            if let Some((evicted, _)) = self.cursors.pop_first() {
                debug!(cursor_id = evicted, limit, "open cursor evicted");
            }
        }
    }

    fn get_more(&mut self, cursor_id: u64, batch_size: u32) -> ServerResult<Response> {
        let size = self.context.config.effective_batch_size(batch_size);
        let remaining = self
            .cursors
            .get_mut(&cursor_id)
            .ok_or(ServerError::CursorNotFound(cursor_id))?;

        let take = size.min(remaining.len());
        let records: Vec<StoredRecord> = remaining.drain(..take).collect();
        let exhausted = remaining.is_empty();
        if exhausted {
            self.cursors.remove(&cursor_id);
        }

        Ok(Response::Batch {
            cursor_id: if exhausted { 0 } else { cursor_id },
            records,
            exhausted,
        })
    }
}
