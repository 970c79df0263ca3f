use bucketmap::{BucketMap, Result};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let map = BucketMap::with_capacity(10)?;

    map.put("First", 1)?;
    map.put("Second", 2)?;
    map.put("Third", 3)?;

    println!("Value for key 'First': {:?}", map.get("First")?);
    println!("Value for key 'Second': {:?}", map.get("Second")?);

    map.remove("First")?;

    println!("Map contains the 'First' key? {}", map.contains_key("First")?);
    println!("Map contains the 'Second' key? {}", map.contains_key("Second")?);

    let mut keys: Vec<_> = map.key_set()?.into_iter().collect();
    keys.sort_unstable();
    let mut values = map.values()?;
    values.sort_unstable();
    println!("Keys: {keys:?}");
    println!("Values: {values:?}");

    println!("Map size: {}", map.len()?);
    Ok(())
}
