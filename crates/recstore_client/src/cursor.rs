//! Lazy query results.

use crate::client::{unexpected, Client};
use crate::error::{ClientError, ClientResult};
use recstore_protocol::{Request, Response, StoredRecord};
use std::collections::VecDeque;
use tracing::debug;

/// Iterator over the results of a query.
///
/// Holds one batch at a time and fetches the next from the server only when
/// the current batch is used up. Dropping a cursor before it is exhausted
/// releases the server-side result set.
///
/// A cursor cannot be restarted. After an error it yields nothing more.
#[derive(Debug)]
pub struct Cursor<'c> {
    client: &'c Client,
    cursor_id: u64,
    buffer: VecDeque<StoredRecord>,
    exhausted: bool,
    batch_size: u32,
}

impl<'c> Cursor<'c> {
    pub(crate) fn open(
        client: &'c Client,
        first_batch: Response,
        batch_size: u32,
    ) -> ClientResult<Self> {
        let mut cursor = Self {
            client,
            cursor_id: 0,
            buffer: VecDeque::new(),
            exhausted: true,
            batch_size,
        };
        cursor.accept(first_batch)?;
        Ok(cursor)
    }

    /// Server cursor id; 0 once the server has nothing left.
    pub fn cursor_id(&self) -> u64 {
        self.cursor_id
    }

    /// Returns true when no further batches will be requested.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Records received but not yet yielded.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Drains the cursor into a vector.
    pub fn collect_records(self) -> ClientResult<Vec<StoredRecord>> {
        self.collect()
    }

    fn accept(&mut self, response: Response) -> ClientResult<()> {
        match response {
            Response::Batch {
                cursor_id,
                records,
                exhausted,
            } => {
                if records.is_empty() && !exhausted {
                    return Err(ClientError::Protocol(
                        "empty batch from an open cursor".into(),
                    ));
                }
                self.cursor_id = if exhausted { 0 } else { cursor_id };
                self.exhausted = exhausted;
                self.buffer.extend(records);
                Ok(())
            }
            other => Err(unexpected("batch", &other)),
        }
    }

    fn fetch_more(&mut self) -> ClientResult<()> {
        debug!(cursor_id = self.cursor_id, "fetching next batch");
        let response = self.client.round_trip(Request::GetMore {
            cursor_id: self.cursor_id,
            batch_size: self.batch_size,
        })?;
        self.accept(response)
    }
}

impl Iterator for Cursor<'_> {
    type Item = ClientResult<StoredRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(record) = self.buffer.pop_front() {
            return Some(Ok(record));
        }
        if self.exhausted {
            return None;
        }
        if let Err(e) = self.fetch_more() {
            self.exhausted = true;
            return Some(Err(e));
        }
        self.buffer.pop_front().map(Ok)
    }
}

impl Drop for Cursor<'_> {
    fn drop(&mut self) {
        if self.cursor_id == 0 || !self.client.is_connected() {
            return;
        }
        let cursor_id = self.cursor_id;
        match self.client.round_trip(Request::KillCursor { cursor_id }) {
            Ok(_) => debug!(cursor_id, "cursor released"),
            Err(e) => debug!(cursor_id, error = %e, "cursor release failed"),
        }
    }
}
