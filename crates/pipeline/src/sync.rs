use crate::errors::{DuplicatePartitionKey, MismatchedPartitionCount};
use anyhow::Context;
use rollup_primitives::PartitionKey;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};


#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Partition {
    pub key: PartitionKey,
    pub path: PathBuf
}


#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PartitionPair {
    pub key: PartitionKey,
    pub transactions: PathBuf,
    pub blocks: PathBuf
}


#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum PairingPolicy {
    /// Pair partitions whose file names carry the same key
    #[default]
    ByKey,
    /// Pair the n-th transaction file with the n-th block file in lexical order
    Positional
}


#[derive(Debug, Default)]
pub struct Pairing {
    pub pairs: Vec<PartitionPair>,
    pub unmatched_transactions: Vec<Partition>,
    pub unmatched_blocks: Vec<Partition>
}


/// Lists partition files in `dir`, ordered by file name.
///
/// Files without a `__{start}_to_{end}` marker are not partitions and are skipped.
pub fn discover(dir: impl AsRef<Path>) -> anyhow::Result<Vec<Partition>> {
    let dir = dir.as_ref();
    let mut files = Vec::new();

    let read_dir = std::fs::read_dir(dir).with_context(|| {
        format!("failed to list partitions in {}", dir.display())
    })?;

    for entry in read_dir {
        let entry = entry?;
        if !entry.file_type()?.is_file() && !entry.path().is_file() {
            continue
        }
        let Some(name) = entry.file_name().to_str().map(|s| s.to_string()) else {
            continue
        };
        match PartitionKey::find_in(&name) {
            Some(key) => files.push((name, key)),
            None => debug!(file = %name, dir = %dir.display(), "skipping file without partition key")
        }
    }

    files.sort();

    Ok(files.into_iter().map(|(name, key)| Partition {
        key,
        path: dir.join(name)
    }).collect())
}


pub fn pair(
    transactions: Vec<Partition>,
    blocks: Vec<Partition>,
    policy: PairingPolicy
) -> anyhow::Result<Pairing>
{
    if transactions.len() != blocks.len() {
        return Err(MismatchedPartitionCount {
            transactions: transactions.len(),
            blocks: blocks.len()
        }.into())
    }
    match policy {
        PairingPolicy::ByKey => pair_by_key(transactions, blocks),
        PairingPolicy::Positional => Ok(pair_by_position(transactions, blocks))
    }
}


pub fn synchronize(
    transactions_dir: impl AsRef<Path>,
    blocks_dir: impl AsRef<Path>,
    policy: PairingPolicy
) -> anyhow::Result<Pairing>
{
    let transactions = discover(transactions_dir)?;
    let blocks = discover(blocks_dir)?;
    pair(transactions, blocks, policy)
}


fn pair_by_position(transactions: Vec<Partition>, blocks: Vec<Partition>) -> Pairing {
    let pairs = transactions.into_iter().zip(blocks).map(|(tx, block)| {
        if tx.key != block.key {
            warn!(
                transactions = %tx.path.display(),
                blocks = %block.path.display(),
                "positionally paired partitions cover different block ranges"
            );
        }
        PartitionPair {
            key: tx.key,
            transactions: tx.path,
            blocks: block.path
        }
    }).collect();

    Pairing {
        pairs,
        ..Pairing::default()
    }
}


fn pair_by_key(transactions: Vec<Partition>, blocks: Vec<Partition>) -> anyhow::Result<Pairing> {
    let transactions = index_by_key(transactions)?;
    let mut blocks = index_by_key(blocks)?;
    let mut pairing = Pairing::default();

    for (key, tx) in transactions {
        match blocks.remove(&key) {
            Some(block) => pairing.pairs.push(PartitionPair {
                key,
                transactions: tx.path,
                blocks: block.path
            }),
            None => {
                warn!(partition = %key, file = %tx.path.display(), "no block partition for transaction partition");
                pairing.unmatched_transactions.push(tx)
            }
        }
    }

    for (key, block) in blocks {
        warn!(partition = %key, file = %block.path.display(), "no transaction partition for block partition");
        pairing.unmatched_blocks.push(block)
    }

    Ok(pairing)
}


fn index_by_key(partitions: Vec<Partition>) -> anyhow::Result<BTreeMap<PartitionKey, Partition>> {
    let mut index = BTreeMap::new();
    for p in partitions {
        match index.entry(p.key) {
            Entry::Vacant(entry) => {
                entry.insert(p);
            },
            Entry::Occupied(entry) => {
                return Err(DuplicatePartitionKey {
                    key: p.key,
                    first: entry.get().path.clone(),
                    second: p.path
                }.into())
            }
        }
    }
    Ok(index)
}
