use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::anyhow;
use runxfer::Url;
use runxfer::transfer::{BlobStore, ByteStream, StoreFuture, block_id};
use tokio::time::Instant;

/// In-memory blob store with scriptable failures.
///
/// - the first `failing_reads(n)` calls to `open_read` fail with
///   `"simulated read failure <k>"` (k = 1-based attempt);
/// - `failing_mid_stream(n)` makes the first `n` reads yield half of the
///   object and then fail;
/// - `failing_block(i)` makes staging of block `i` fail;
/// - `with_block_delay(d)` keeps every block "in flight" for `d`, so the
///   number of concurrent workers can be observed.
#[derive(Debug, Default)]
pub struct FakeBlobStore {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    objects: HashMap<String, Vec<u8>>,
    staged: HashMap<(String, String), Vec<u8>>,
    fail_reads: u32,
    fail_mid_stream: u32,
    read_attempts: u32,
    read_times: Vec<Instant>,
    fail_block: Option<String>,
    block_delay: Duration,
    blocks_put: usize,
    in_flight: usize,
    max_in_flight: usize,
    commits: usize,
}

impl FakeBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(self, uri: &Url, data: impl Into<Vec<u8>>) -> Self {
        self.state
            .lock()
            .unwrap()
            .objects
            .insert(uri.to_string(), data.into());
        self
    }

    pub fn failing_reads(self, n: u32) -> Self {
        self.state.lock().unwrap().fail_reads = n;
        self
    }

    pub fn failing_mid_stream(self, n: u32) -> Self {
        self.state.lock().unwrap().fail_mid_stream = n;
        self
    }

    pub fn failing_block(self, index: usize) -> Self {
        self.state.lock().unwrap().fail_block = Some(block_id(index));
        self
    }

    pub fn with_block_delay(self, delay: Duration) -> Self {
        self.state.lock().unwrap().block_delay = delay;
        self
    }

    pub fn object(&self, uri: &Url) -> Option<Vec<u8>> {
        self.state.lock().unwrap().objects.get(uri.as_str()).cloned()
    }

    pub fn read_attempts(&self) -> u32 {
        self.state.lock().unwrap().read_attempts
    }

    /// Instants at which `open_read` was called, in order.
    pub fn read_times(&self) -> Vec<Instant> {
        self.state.lock().unwrap().read_times.clone()
    }

    pub fn blocks_put(&self) -> usize {
        self.state.lock().unwrap().blocks_put
    }

    pub fn max_in_flight(&self) -> usize {
        self.state.lock().unwrap().max_in_flight
    }

    pub fn commits(&self) -> usize {
        self.state.lock().unwrap().commits
    }
}

impl BlobStore for FakeBlobStore {
    fn open_read<'a>(&'a self, uri: &'a Url) -> StoreFuture<'a, ByteStream> {
        Box::pin(async move {
            let mut state = self.state.lock().unwrap();
            state.read_attempts += 1;
            state.read_times.push(Instant::now());
            let attempt = state.read_attempts;

            if attempt <= state.fail_reads {
                return Err(anyhow!("simulated read failure {attempt}"));
            }

            let data = state
                .objects
                .get(uri.as_str())
                .cloned()
                .ok_or_else(|| anyhow!("object not found: {uri}"))?;

            let mut chunks: Vec<anyhow::Result<Vec<u8>>> = Vec::new();
            if attempt <= state.fail_reads + state.fail_mid_stream {
                chunks.push(Ok(data[..data.len() / 2].to_vec()));
                chunks.push(Err(anyhow!("simulated stream reset {attempt}")));
            } else {
                chunks.extend(data.chunks(3).map(|c| Ok(c.to_vec())));
            }
            Ok(Box::pin(futures::stream::iter(chunks)) as ByteStream)
        })
    }

    fn put_block<'a>(
        &'a self,
        uri: &'a Url,
        block_id: &'a str,
        data: Vec<u8>,
    ) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let delay = {
                let mut state = self.state.lock().unwrap();
                state.in_flight += 1;
                state.max_in_flight = state.max_in_flight.max(state.in_flight);
                state.block_delay
            };

            tokio::time::sleep(delay).await;

            let mut state = self.state.lock().unwrap();
            state.in_flight -= 1;
            if state.fail_block.as_deref() == Some(block_id) {
                return Err(anyhow!("simulated block failure {block_id}"));
            }
            state.blocks_put += 1;
            state
                .staged
                .insert((uri.to_string(), block_id.to_string()), data);
            Ok(())
        })
    }

    fn commit_blocks<'a>(&'a self, uri: &'a Url, block_ids: &'a [String]) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let mut state = self.state.lock().unwrap();
            let mut object = Vec::new();
            for id in block_ids {
                let block = state
                    .staged
                    .remove(&(uri.to_string(), id.clone()))
                    .ok_or_else(|| anyhow!("block {id} was never staged"))?;
                object.extend(block);
            }
            state.objects.insert(uri.to_string(), object);
            state.commits += 1;
            Ok(())
        })
    }
}
