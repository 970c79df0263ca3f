use std::hash::Hash;

use bucketmap::BucketMap;
use dashmap::DashMap;
use rand::{distributions::Alphanumeric, Rng};
use std::sync::Arc;
use std::sync::Barrier;
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

const NUM_BUCKETS: usize = 100;
const NUM_PAIRS: usize = 10_000_000;
const NUM_THREADS: usize = 10;

macro_rules! bench {
    ($name: expr, $body: expr) => {
        let now = Instant::now();
        $body;
        let elapsed = now.elapsed();
        info!("{} elapsed: {:.2?}", $name, elapsed);
    };
}

fn make_random_string() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(7)
        .map(char::from)
        .collect()
}

fn make_random_string_pairs(n: usize) -> Vec<(String, String)> {
    (0..n)
        .map(|_| (make_random_string(), make_random_string()))
        .collect()
}

/// Splits `data` into at most `num_partitions` chunks of near-equal size.
fn partition_data<T: Clone>(data: &[T], num_partitions: usize) -> Vec<Vec<T>> {
    assert!(num_partitions > 0, "need at least one partition");
    let partition_sz = data.len().div_ceil(num_partitions).max(1);
    data.chunks(partition_sz).map(<[T]>::to_vec).collect()
}

/// Runs `insert` over each partition on its own thread and returns the time
/// between all threads starting and all threads finishing.
fn time_concurrent_inserts<M, K, V, F>(
    map: Arc<M>,
    partitions: Vec<Vec<(K, V)>>,
    insert: F,
) -> Duration
where
    M: Send + Sync + 'static,
    K: Send + 'static,
    V: Send + 'static,
    F: Fn(&M, K, V) + Send + Sync + Copy + 'static,
{
    let start_barr = Arc::new(Barrier::new(partitions.len() + 1));
    let end_barr = Arc::new(Barrier::new(partitions.len() + 1));

    let handles: Vec<_> = partitions
        .into_iter()
        .map(|data| {
            let tmap = map.clone();
            let t_start_barr = start_barr.clone();
            let t_end_barr = end_barr.clone();
            thread::spawn(move || {
                t_start_barr.wait();
                for (key, val) in data {
                    insert(&tmap, key, val);
                }
                t_end_barr.wait();
            })
        })
        .collect();

    start_barr.wait();
    let now = Instant::now();
    end_barr.wait();
    let elapsed = now.elapsed();

    for h in handles {
        h.join().unwrap();
    }
    elapsed
}

fn bench_single_threaded<K: Hash + Eq + Clone, V: Clone>(src: &[(K, V)]) {
    info!("bench single threaded");

    let map_data = src.to_vec();
    bench!("BucketMap", {
        let map = BucketMap::with_capacity(NUM_BUCKETS).expect("bucket count is positive");
        for (key, val) in map_data {
            map.put(key, val).expect("bucket lock poisoned");
        }
    });

    let dmap_data = src.to_vec();
    bench!("DashMap", {
        let map = DashMap::new();
        for (key, val) in dmap_data {
            map.insert(key, val);
        }
    });
}

fn bench_multi_threaded<K, V>(num_threads: usize, src: &[(K, V)])
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    info!(num_threads, "bench multi threaded");

    let map = Arc::new(BucketMap::with_capacity(NUM_BUCKETS).expect("bucket count is positive"));
    let elapsed = time_concurrent_inserts(
        map.clone(),
        partition_data(src, num_threads),
        |map: &BucketMap<K, V>, key, val| {
            map.put(key, val).expect("bucket lock poisoned");
        },
    );
    info!(
        entries = map.len().expect("bucket lock poisoned"),
        "BucketMap multithreaded elapsed: {:.2?}", elapsed
    );

    let dmap = Arc::new(DashMap::new());
    let elapsed = time_concurrent_inserts(
        dmap.clone(),
        partition_data(src, num_threads),
        |map: &DashMap<K, V>, key, val| {
            map.insert(key, val);
        },
    );
    info!(entries = dmap.len(), "DashMap multithreaded elapsed: {:.2?}", elapsed);
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let input = make_random_string_pairs(NUM_PAIRS);
    bench_single_threaded(&input);
    bench_multi_threaded(NUM_THREADS, &input);
}
