use anyhow::{bail, Result};

use crate::config::ReverieConfig;
use crate::memory::store::MemoryStore;

pub fn forget(config: &ReverieConfig, id: &str) -> Result<()> {
    let store = super::open_store(config)?;
    if !store.delete(id)? {
        bail!("memory not found: {id}");
    }
    println!("Deleted {id}");
    Ok(())
}
