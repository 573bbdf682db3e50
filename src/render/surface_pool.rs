use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

/// Pool configuration for scratch colour buffers.
#[derive(Debug, Clone, Copy)]
pub struct SurfacePoolOpts {
    /// Maximum bytes retained across all buckets.
    pub max_pool_bytes: usize,
    /// Maximum number of retained buffers per (w,h) bucket.
    pub max_surfaces_per_bucket: usize,
}

impl Default for SurfacePoolOpts {
    fn default() -> Self {
        Self {
            max_pool_bytes: 256 * 1024 * 1024,
            max_surfaces_per_bucket: 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SurfaceKey {
    w: u32,
    h: u32,
}

impl SurfaceKey {
    fn byte_len(self) -> usize {
        (self.w as usize)
            .saturating_mul(self.h as usize)
            .saturating_mul(4)
    }
}

/// Allocation counters of a [`SurfacePool`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SurfacePoolStats {
    /// Buffers currently held for reuse.
    pub retained_surfaces: usize,
    /// Bytes currently held for reuse.
    pub retained_bytes: usize,
    /// Fresh allocations made since construction.
    pub alloc_surfaces: u64,
    /// Bytes of fresh allocations made since construction.
    pub alloc_bytes: u64,
    /// Releases that freed the buffer instead of retaining it.
    pub dropped_on_release: u64,
}

/// Bounded pool of RGBA8 scratch buffers keyed by `(width, height)`.
///
/// The composite stage borrows one buffer per frame to hold the source colour while it writes the
/// destination. Borrow/release happens once per frame, never per pixel.
#[derive(Debug)]
pub struct SurfacePool {
    opts: SurfacePoolOpts,
    stats: SurfacePoolStats,
    buckets: HashMap<SurfaceKey, Vec<Vec<u8>>>,
}

impl Default for SurfacePool {
    fn default() -> Self {
        Self::new(SurfacePoolOpts::default())
    }
}

impl SurfacePool {
    /// Empty pool.
    pub fn new(opts: SurfacePoolOpts) -> Self {
        Self {
            opts,
            stats: SurfacePoolStats::default(),
            buckets: HashMap::new(),
        }
    }

    /// Current counters.
    pub fn stats(&self) -> SurfacePoolStats {
        self.stats.clone()
    }

    /// Borrow a `w*h*4` byte buffer. Contents are unspecified.
    pub fn borrow(&mut self, w: u32, h: u32) -> Vec<u8> {
        let key = SurfaceKey { w, h };
        if let Some(buf) = self.buckets.get_mut(&key).and_then(Vec::pop) {
            self.stats.retained_surfaces = self.stats.retained_surfaces.saturating_sub(1);
            self.stats.retained_bytes = self.stats.retained_bytes.saturating_sub(key.byte_len());
            return buf;
        }

        self.stats.alloc_surfaces = self.stats.alloc_surfaces.saturating_add(1);
        self.stats.alloc_bytes = self.stats.alloc_bytes.saturating_add(key.byte_len() as u64);
        vec![0; key.byte_len()]
    }

    /// Return a buffer obtained from [`SurfacePool::borrow`] with the same size.
    pub fn release(&mut self, w: u32, h: u32, buf: Vec<u8>) {
        let key = SurfaceKey { w, h };
        let bytes = key.byte_len();
        if buf.len() != bytes
            || self.opts.max_pool_bytes == 0
            || self.opts.max_surfaces_per_bucket == 0
            || self.stats.retained_bytes.saturating_add(bytes) > self.opts.max_pool_bytes
        {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            return;
        }

        let bucket = self.buckets.entry(key).or_default();
        if bucket.len() >= self.opts.max_surfaces_per_bucket {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            return;
        }

        bucket.push(buf);
        self.stats.retained_surfaces = self.stats.retained_surfaces.saturating_add(1);
        self.stats.retained_bytes = self.stats.retained_bytes.saturating_add(bytes);
    }

    /// Borrow a buffer that returns itself to the pool when dropped.
    pub fn scratch(&mut self, w: u32, h: u32) -> ScratchSurface<'_> {
        let buf = self.borrow(w, h);
        ScratchSurface {
            pool: self,
            w,
            h,
            buf,
        }
    }
}

/// Pooled buffer released on drop, so early returns cannot leak it.
pub struct ScratchSurface<'a> {
    pool: &'a mut SurfacePool,
    w: u32,
    h: u32,
    buf: Vec<u8>,
}

impl Deref for ScratchSurface<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.buf
    }
}

impl DerefMut for ScratchSurface<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }
}

impl Drop for ScratchSurface<'_> {
    fn drop(&mut self) {
        let buf = std::mem::take(&mut self.buf);
        self.pool.release(self.w, self.h, buf);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface_pool.rs"]
mod tests;
