//! Helpers laying out the partitions and shards of a single process deployment.

use volley_consumer::ShardSpec;
use volley_message::{modulo_partition, LabelSet, Partition, ShardId};

use crate::app::{FIRST_SERVE_LABEL, VOLLEY_TO_LABEL};
use crate::config::ConfigError;
use crate::volley::{Designation, VOLLEY_MESSAGE_TYPE};

/// The number of candidate ids tried per partition when searching for a shard
/// id which routes onto it.
const MAX_ID_CANDIDATES_PER_PARTITION: usize = 256;

/// Creates the name of the n-th volley partition.
pub fn volley_partition(n: usize) -> Partition {
    Partition::new(
        format!("volleys/part={n:02}"),
        LabelSet::for_message_type(VOLLEY_MESSAGE_TYPE),
    )
}

pub fn volley_partitions(num_partitions: usize) -> Result<Vec<Partition>, ConfigError> {
    if num_partitions == 0 {
        return Err(ConfigError::NoPartitions);
    }

    Ok((0..num_partitions).map(volley_partition).collect())
}

/// Creates one shard per partition, each consuming whatever is routed to it.
///
/// Suitable for the random-to-any policy where a shard plays every player
/// mapped onto its partition.
pub fn player_shards(partitions: &[Partition]) -> Vec<ShardSpec> {
    partitions
        .iter()
        .enumerate()
        .map(|(n, partition)| ShardSpec::new(format!("part-{n:02}"), partition.clone()))
        .collect()
}

/// Creates one shard per partition arranged in a ring, each shard returning
/// volleys to the next one.
///
/// Every shard id is chosen so that volleys addressed to the shard are routed
/// onto the partition it consumes, the first shard serves the first volley.
/// The `partitions` must be in the same order the mapping sees them in.
pub fn ring_shards(partitions: &[Partition]) -> Result<Vec<ShardSpec>, ConfigError> {
    if partitions.is_empty() {
        return Err(ConfigError::NoPartitions);
    }

    let mut owners: Vec<Option<ShardId>> = vec![None; partitions.len()];
    let mut remaining = partitions.len();

    for candidate in 0..partitions.len() * MAX_ID_CANDIDATES_PER_PARTITION {
        let shard_id = ShardId::new(format!("player-{candidate}"));
        let target = modulo_partition(&Designation::Shard(shard_id.clone()), partitions)
            .map_err(|_| ConfigError::NoPartitions)?;

        if let Some(n) = partitions.iter().position(|p| p == &target) {
            if owners[n].is_none() {
                owners[n] = Some(shard_id);
                remaining -= 1;
            }
        }

        if remaining == 0 {
            break;
        }
    }

    let mut ids = Vec::with_capacity(partitions.len());
    for (partition, owner) in partitions.iter().zip(owners) {
        match owner {
            Some(shard_id) => ids.push(shard_id),
            None => return Err(ConfigError::UnroutablePartition(partition.name().to_string())),
        }
    }

    let specs = partitions
        .iter()
        .enumerate()
        .map(|(n, partition)| {
            let partner = &ids[(n + 1) % ids.len()];
            let spec = ShardSpec::new(ids[n].clone(), partition.clone())
                .with_label(VOLLEY_TO_LABEL, partner.as_str());

            if n == 0 {
                spec.with_label(FIRST_SERVE_LABEL, "true")
            } else {
                spec
            }
        })
        .collect();

    Ok(specs)
}
