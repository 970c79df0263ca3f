use bucketmap::BucketMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

const NUM_THREADS: usize = 10;
const NUM_OPS: usize = 1000;

fn spawn_workers<F>(map: &Arc<BucketMap<String, usize>>, work: F) -> Vec<thread::JoinHandle<()>>
where
    F: Fn(&BucketMap<String, usize>, usize) + Send + Sync + 'static,
{
    let work = Arc::new(work);
    let barrier = Arc::new(Barrier::new(NUM_THREADS));
    (0..NUM_THREADS)
        .map(|t| {
            let tmap = map.clone();
            let twork = work.clone();
            let tbarrier = barrier.clone();
            thread::spawn(move || {
                tbarrier.wait();
                twork(&tmap, t);
            })
        })
        .collect()
}

fn join(handles: Vec<thread::JoinHandle<()>>) {
    for h in handles {
        h.join().unwrap();
    }
}

#[test]
fn disjoint_puts_are_all_counted() {
    let map = Arc::new(BucketMap::with_capacity(100).unwrap());
    join(spawn_workers(&map, |map, t| {
        for i in 0..NUM_OPS {
            assert_eq!(map.put(format!("thread-{t}-{i}"), i).unwrap(), None);
        }
    }));

    assert_eq!(map.len().unwrap(), NUM_THREADS * NUM_OPS);
    assert_eq!(map.key_set().unwrap().len(), NUM_THREADS * NUM_OPS);
    assert_eq!(map.get("thread-3-999").unwrap(), Some(999));
}

#[test]
fn put_get_remove_per_thread_leaves_map_empty() {
    let map = Arc::new(BucketMap::with_capacity(100).unwrap());
    join(spawn_workers(&map, |map, t| {
        for i in 0..NUM_OPS {
            map.put(format!("thread-{t}-{i}"), i).unwrap();
        }
        for i in 0..NUM_OPS {
            assert_eq!(map.get(&format!("thread-{t}-{i}")).unwrap(), Some(i));
        }
        for i in 0..NUM_OPS {
            assert_eq!(map.remove(&format!("thread-{t}-{i}")).unwrap(), Some(i));
        }
    }));

    assert_eq!(map.len().unwrap(), 0);
    assert!(map.is_empty().unwrap());
}

#[test]
fn contended_key_never_duplicates() {
    let map = Arc::new(BucketMap::with_capacity(4).unwrap());
    join(spawn_workers(&map, |map, t| {
        for i in 0..NUM_OPS {
            match (t + i) % 3 {
                0 => {
                    map.put("shared".to_string(), t).unwrap();
                }
                1 => {
                    if let Some(v) = map.get("shared").unwrap() {
                        assert!(v < NUM_THREADS);
                    }
                }
                _ => {
                    map.remove("shared").unwrap();
                }
            }
        }
    }));

    let len = map.len().unwrap();
    assert!(len <= 1);
    assert_eq!(map.contains_key("shared").unwrap(), len == 1);
    assert_eq!(map.entry_set().unwrap().len(), len);
}

#[test]
fn aggregates_run_alongside_writers() {
    let map = Arc::new(BucketMap::with_capacity(16).unwrap());
    let writers = spawn_workers(&map, |map, t| {
        for i in 0..NUM_OPS {
            map.put(format!("thread-{t}-{i}"), i).unwrap();
        }
    });

    let writers_done = Arc::new(AtomicBool::new(false));
    let reader = {
        let map = map.clone();
        let writers_done = writers_done.clone();
        thread::spawn(move || {
            while !writers_done.load(Ordering::Acquire) {
                assert!(map.len().unwrap() <= NUM_THREADS * NUM_OPS);
                assert!(map.values().unwrap().len() <= NUM_THREADS * NUM_OPS);
            }
        })
    };

    // Stop the reader even if a writer panicked, then surface the panic.
    let results: Vec<_> = writers.into_iter().map(|h| h.join()).collect();
    writers_done.store(true, Ordering::Release);
    reader.join().unwrap();
    for r in results {
        r.unwrap();
    }
    assert_eq!(map.len().unwrap(), NUM_THREADS * NUM_OPS);
    map.clear().unwrap();
    assert!(map.is_empty().unwrap());
}

#[test]
fn map_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<BucketMap<String, usize>>();
    assert_send_sync::<BucketMap<u64, Vec<u8>>>();
}
