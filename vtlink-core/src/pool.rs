//! Object pool descriptors and the upload byte source.
//!
//! Pools are opaque byte images. A pool is supplied either fully in
//! memory or through a pull callback that pages data in during upload;
//! either way the transport never sees a copy of the whole pool with the
//! transfer multiplexor prepended — the multiplexor is spliced in on the
//! fly by [`transfer_chunk_source`].

use std::sync::{Arc, Mutex};

use crate::function::Function;
use crate::network::DataChunkCallback;
use crate::types::VtVersion;

// ── PoolSource ───────────────────────────────────────────────────

/// Where a pool's bytes come from.
pub enum PoolSource {
    /// The whole pool, shared with the caller. Must stay alive until the
    /// client reaches Connected (the `Arc` enforces that).
    InMemory(Arc<[u8]>),
    /// Bytes are pulled on demand; the callback must remain callable
    /// until the pool's uploaded flag is set.
    Chunked {
        total_size: u32,
        fetch: Arc<Mutex<DataChunkCallback>>,
    },
}

impl PoolSource {
    /// Pool size in bytes, excluding the transfer multiplexor.
    pub fn size(&self) -> u32 {
        match self {
            PoolSource::InMemory(bytes) => bytes.len() as u32,
            PoolSource::Chunked { total_size, .. } => *total_size,
        }
    }
}

impl std::fmt::Debug for PoolSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PoolSource::InMemory(bytes) => {
                f.debug_tuple("InMemory").field(&bytes.len()).finish()
            }
            PoolSource::Chunked { total_size, .. } => f
                .debug_struct("Chunked")
                .field("total_size", total_size)
                .finish_non_exhaustive(),
        }
    }
}

// ── ObjectPool ───────────────────────────────────────────────────

/// One registered object pool.
#[derive(Debug)]
pub struct ObjectPool {
    pub index: u8,
    pub version: VtVersion,
    pub source: PoolSource,
    pub uploaded: bool,
}

// ── PoolRegistry ─────────────────────────────────────────────────

/// All pools assigned to the client, kept in ascending index order.
#[derive(Debug, Default)]
pub struct PoolRegistry {
    pools: Vec<ObjectPool>,
}

impl PoolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a pool descriptor, replacing any existing pool with the
    /// same index.
    pub fn insert(&mut self, index: u8, version: VtVersion, source: PoolSource) {
        let pool = ObjectPool {
            index,
            version,
            source,
            uploaded: false,
        };
        match self.pools.binary_search_by_key(&index, |p| p.index) {
            Ok(pos) => self.pools[pos] = pool,
            Err(pos) => self.pools.insert(pos, pool),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    /// Aggregate size of all pools, for the get memory query.
    pub fn total_size(&self) -> u32 {
        self.pools.iter().map(|p| p.source.size()).sum()
    }

    /// The declared version shared by the pools, if any are registered.
    pub fn declared_version(&self) -> Option<VtVersion> {
        self.pools.first().map(|p| p.version)
    }

    /// All registered pools declare the same VT version. Mixing versions
    /// is undefined by the protocol, so upload refuses to start otherwise.
    pub fn versions_consistent(&self) -> bool {
        self.pools.windows(2).all(|w| w[0].version == w[1].version)
    }

    /// The lowest-index pool that has not been uploaded yet.
    pub fn next_pending(&self) -> Option<&ObjectPool> {
        self.pools.iter().find(|p| !p.uploaded)
    }

    pub fn all_uploaded(&self) -> bool {
        self.pools.iter().all(|p| p.uploaded)
    }

    pub fn mark_uploaded(&mut self, index: u8) {
        if let Some(pool) = self.pools.iter_mut().find(|p| p.index == index) {
            pool.uploaded = true;
        }
    }

    /// Forget upload progress; used when a new handshake begins.
    pub fn reset_uploaded(&mut self) {
        for pool in &mut self.pools {
            pool.uploaded = false;
        }
    }
}

// ── Transfer chunk source ────────────────────────────────────────

/// Build the pull callback handed to the transport for one pool upload.
///
/// The transport payload is `0x11 ‖ pool bytes`, so at payload offset 0
/// the callback emits the object-pool-transfer multiplexor followed by
/// `bytes_requested − 1` pool bytes from pool offset 0; at any later
/// offset it emits `bytes_requested` pool bytes from pool offset
/// `byte_offset − 1`. The pool is never copied as a whole.
pub fn transfer_chunk_source(source: &PoolSource) -> DataChunkCallback {
    match source {
        PoolSource::InMemory(bytes) => {
            let bytes = Arc::clone(bytes);
            Box::new(move |_invocation, offset, requested, out| {
                fill_from_slice(&bytes, offset, requested, out)
            })
        }
        PoolSource::Chunked { total_size, fetch } => {
            let total = *total_size;
            let fetch = Arc::clone(fetch);
            Box::new(move |invocation, offset, requested, out| {
                let requested = requested as usize;
                if out.len() < requested {
                    return false;
                }
                let mut fetch = match fetch.lock() {
                    Ok(guard) => guard,
                    Err(_) => return false,
                };
                if offset == 0 {
                    if requested == 0 {
                        return true;
                    }
                    out[0] = Function::ObjectPoolTransfer as u8;
                    let pool_bytes = requested - 1;
                    if pool_bytes == 0 {
                        return true;
                    }
                    if pool_bytes as u32 > total {
                        return false;
                    }
                    (*fetch)(invocation, 0, pool_bytes as u32, &mut out[1..requested])
                } else {
                    let pool_offset = offset - 1;
                    if pool_offset + requested as u32 > total {
                        return false;
                    }
                    (*fetch)(invocation, pool_offset, requested as u32, &mut out[..requested])
                }
            })
        }
    }
}

fn fill_from_slice(bytes: &[u8], offset: u32, requested: u32, out: &mut [u8]) -> bool {
    let requested = requested as usize;
    if out.len() < requested {
        return false;
    }
    if offset == 0 {
        if requested == 0 {
            return true;
        }
        out[0] = Function::ObjectPoolTransfer as u8;
        let pool_bytes = requested - 1;
        if pool_bytes > bytes.len() {
            return false;
        }
        out[1..requested].copy_from_slice(&bytes[..pool_bytes]);
        true
    } else {
        let start = offset as usize - 1;
        let end = start + requested;
        if end > bytes.len() {
            return false;
        }
        out[..requested].copy_from_slice(&bytes[start..end]);
        true
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn in_memory(bytes: &[u8]) -> PoolSource {
        PoolSource::InMemory(Arc::from(bytes))
    }

    /// Pull the full transport payload through a chunk source the way the
    /// transport layer would: seven bytes at a time.
    fn drain(mut source: DataChunkCallback, total: u32) -> Vec<u8> {
        let mut assembled = Vec::new();
        let mut offset = 0u32;
        let mut invocation = 0u32;
        while offset < total {
            let requested = (total - offset).min(7);
            let mut buf = vec![0u8; requested as usize];
            assert!(source(invocation, offset, requested, &mut buf));
            assembled.extend_from_slice(&buf);
            offset += requested;
            invocation += 1;
        }
        assembled
    }

    #[test]
    fn in_memory_source_prepends_multiplexor() {
        let pool: Vec<u8> = (0u8..20).collect();
        let source = transfer_chunk_source(&in_memory(&pool));
        let assembled = drain(source, pool.len() as u32 + 1);

        assert_eq!(assembled[0], 0x11);
        assert_eq!(&assembled[1..], &pool[..]);
    }

    #[test]
    fn tiny_pool_fits_one_invocation() {
        let pool = [0xDE, 0xAD, 0xBE];
        let mut source = transfer_chunk_source(&in_memory(&pool));
        let mut buf = [0u8; 4];
        assert!(source(0, 0, 4, &mut buf));
        assert_eq!(buf, [0x11, 0xDE, 0xAD, 0xBE]);
    }

    #[test]
    fn in_memory_source_rejects_overrun() {
        let pool = [1u8, 2, 3];
        let mut source = transfer_chunk_source(&in_memory(&pool));
        let mut buf = [0u8; 8];
        // Pool offset 3 (payload offset 4) with 1 byte requested is one
        // past the end.
        assert!(!source(1, 4, 1, &mut buf));
    }

    #[test]
    fn chunked_source_translates_offsets() {
        let pool: Vec<u8> = (0u8..32).collect();
        let backing = pool.clone();
        let fetch: DataChunkCallback = Box::new(move |_, offset, requested, out| {
            let start = offset as usize;
            let end = start + requested as usize;
            if end > backing.len() {
                return false;
            }
            out[..requested as usize].copy_from_slice(&backing[start..end]);
            true
        });
        let source = transfer_chunk_source(&PoolSource::Chunked {
            total_size: pool.len() as u32,
            fetch: Arc::new(Mutex::new(fetch)),
        });
        let assembled = drain(source, pool.len() as u32 + 1);
        assert_eq!(assembled[0], 0x11);
        assert_eq!(&assembled[1..], &pool[..]);
    }

    #[test]
    fn chunked_source_aborts_when_callback_fails() {
        let fetch: DataChunkCallback = Box::new(|_, _, _, _| false);
        let mut source = transfer_chunk_source(&PoolSource::Chunked {
            total_size: 100,
            fetch: Arc::new(Mutex::new(fetch)),
        });
        let mut buf = [0u8; 8];
        assert!(!source(0, 0, 8, &mut buf));
    }

    #[test]
    fn registry_orders_by_index_and_replaces() {
        let mut registry = PoolRegistry::new();
        registry.insert(2, VtVersion::Version3, in_memory(&[1, 2]));
        registry.insert(0, VtVersion::Version3, in_memory(&[3]));
        registry.insert(1, VtVersion::Version3, in_memory(&[4, 5, 6]));
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.total_size(), 6);
        assert_eq!(registry.next_pending().unwrap().index, 0);

        // Replacing index 0 does not grow the registry.
        registry.insert(0, VtVersion::Version3, in_memory(&[9, 9]));
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.total_size(), 7);
    }

    #[test]
    fn registry_detects_version_mismatch() {
        let mut registry = PoolRegistry::new();
        registry.insert(0, VtVersion::Version3, in_memory(&[1]));
        assert!(registry.versions_consistent());
        registry.insert(1, VtVersion::Version4, in_memory(&[2]));
        assert!(!registry.versions_consistent());
    }

    #[test]
    fn upload_bookkeeping() {
        let mut registry = PoolRegistry::new();
        registry.insert(0, VtVersion::Version3, in_memory(&[1]));
        registry.insert(1, VtVersion::Version3, in_memory(&[2]));
        assert!(!registry.all_uploaded());

        registry.mark_uploaded(0);
        assert_eq!(registry.next_pending().unwrap().index, 1);
        registry.mark_uploaded(1);
        assert!(registry.all_uploaded());

        registry.reset_uploaded();
        assert_eq!(registry.next_pending().unwrap().index, 0);
    }
}
