use super::*;

#[test]
fn pool_honors_bucket_cap() {
    let mut p = SurfacePool::new(SurfacePoolOpts {
        max_pool_bytes: 1 << 30,
        max_surfaces_per_bucket: 1,
    });

    let a = p.borrow(8, 8);
    let b = p.borrow(8, 8);
    p.release(8, 8, a);
    p.release(8, 8, b);

    let st = p.stats();
    assert_eq!(st.retained_surfaces, 1);
    assert_eq!(st.dropped_on_release, 1);
}

#[test]
fn pool_honors_global_byte_cap() {
    let bytes_8x8 = 8 * 8 * 4;
    let mut p = SurfacePool::new(SurfacePoolOpts {
        max_pool_bytes: bytes_8x8,
        max_surfaces_per_bucket: 8,
    });

    let a = p.borrow(8, 8);
    let b = p.borrow(8, 8);
    p.release(8, 8, a);
    p.release(8, 8, b);

    let st = p.stats();
    assert_eq!(st.retained_bytes, bytes_8x8);
    assert_eq!(st.retained_surfaces, 1);
    assert!(st.dropped_on_release >= 1);
}

#[test]
fn scratch_guard_returns_buffer_for_reuse() {
    let mut p = SurfacePool::default();
    {
        let mut s = p.scratch(4, 2);
        assert_eq!(s.len(), 32);
        s[0] = 7;
    }
    assert_eq!(p.stats().retained_surfaces, 1);
    {
        let s = p.scratch(4, 2);
        assert_eq!(s.len(), 32);
    }
    let st = p.stats();
    assert_eq!(st.alloc_surfaces, 1);
    assert_eq!(st.retained_surfaces, 1);
}

#[test]
fn mismatched_release_is_dropped() {
    let mut p = SurfacePool::default();
    p.release(4, 4, vec![0; 3]);
    assert_eq!(p.stats().retained_surfaces, 0);
    assert_eq!(p.stats().dropped_on_release, 1);
}
