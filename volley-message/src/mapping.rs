use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::Partition;

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MappingError {
    #[error("No partitions are eligible to receive the message.")]
    /// The set of eligible partitions was empty at the time of mapping.
    NoEligiblePartitions,
}

/// A message which can be routed by a [MappingFunc].
pub trait Mappable {
    /// The key identifying the intended recipient of the message.
    fn mapping_key(&self) -> String;
}

/// A source of the partitions currently eligible to receive messages.
pub trait PartitionSource: Send + Sync {
    /// A snapshot of the eligible partitions.
    fn snapshot(&self) -> Arc<[Partition]>;
}

impl PartitionSource for Arc<[Partition]> {
    fn snapshot(&self) -> Arc<[Partition]> {
        self.clone()
    }
}

/// Selects the partition a message should be published to.
pub trait MappingFunc<M>: Send + Sync {
    /// Maps the message to one of the currently eligible partitions.
    fn map(&self, msg: &M) -> Result<Partition, MappingError>;
}

impl<M, F> MappingFunc<M> for Arc<F>
where
    F: MappingFunc<M> + ?Sized,
{
    fn map(&self, msg: &M) -> Result<Partition, MappingError> {
        (**self).map(msg)
    }
}

/// Maps a message to a partition using a stable hash of its mapping key.
///
/// All messages sharing a mapping key are mapped to the same partition for as
/// long as the set of partitions is unchanged.
pub fn modulo_partition<M: Mappable>(
    msg: &M,
    partitions: &[Partition],
) -> Result<Partition, MappingError> {
    if partitions.is_empty() {
        return Err(MappingError::NoEligiblePartitions);
    }

    let hash = crc32fast::hash(msg.mapping_key().as_bytes()) as usize;
    Ok(partitions[hash % partitions.len()].clone())
}

/// Selects a partition uniformly at random, ignoring the message entirely.
pub fn random_partition<R: Rng + ?Sized>(
    rng: &mut R,
    partitions: &[Partition],
) -> Result<Partition, MappingError> {
    if partitions.is_empty() {
        return Err(MappingError::NoEligiblePartitions);
    }

    Ok(partitions[rng.gen_range(0..partitions.len())].clone())
}

/// Routes messages by hashing their mapping key, modulo the number of partitions.
///
/// This is required whenever the identity of the recipient determines which
/// shard must see the message.
pub struct ModuloMapping<P> {
    partitions: P,
}

impl<P: PartitionSource> ModuloMapping<P> {
    pub fn new(partitions: P) -> Self {
        Self { partitions }
    }
}

impl<M, P> MappingFunc<M> for ModuloMapping<P>
where
    M: Mappable,
    P: PartitionSource,
{
    fn map(&self, msg: &M) -> Result<Partition, MappingError> {
        let partitions = self.partitions.snapshot();
        modulo_partition(msg, &partitions)
    }
}

/// Routes messages to a uniformly random partition.
///
/// Only valid when any shard is an acceptable recipient of the message.
pub struct RandomMapping<P, R = StdRng> {
    partitions: P,
    rng: Mutex<R>,
}

impl<P: PartitionSource> RandomMapping<P, StdRng> {
    pub fn new(partitions: P) -> Self {
        Self::with_rng(partitions, StdRng::from_entropy())
    }

    /// Creates a new mapping with a deterministic source of randomness.
    pub fn with_seed(partitions: P, seed: u64) -> Self {
        Self::with_rng(partitions, StdRng::seed_from_u64(seed))
    }
}

impl<P, R> RandomMapping<P, R>
where
    P: PartitionSource,
    R: Rng + Send,
{
    pub fn with_rng(partitions: P, rng: R) -> Self {
        Self {
            partitions,
            rng: Mutex::new(rng),
        }
    }
}

impl<M, P, R> MappingFunc<M> for RandomMapping<P, R>
where
    P: PartitionSource,
    R: Rng + Send,
{
    fn map(&self, _msg: &M) -> Result<Partition, MappingError> {
        let partitions = self.partitions.snapshot();
        random_partition(&mut *self.rng.lock(), &partitions)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::{LabelSet, MessageType};

    const TEST_TYPE: MessageType = MessageType::new("test.Message");

    struct Addressed(u32);

    impl Mappable for Addressed {
        fn mapping_key(&self) -> String {
            format!("{:x}", self.0)
        }
    }

    fn partitions(n: usize) -> Arc<[Partition]> {
        (0..n)
            .map(|i| {
                Partition::new(
                    format!("tests/part={i:02}"),
                    LabelSet::for_message_type(TEST_TYPE),
                )
            })
            .collect()
    }

    #[test]
    fn test_modulo_mapping_is_stable() {
        let mapping = ModuloMapping::new(partitions(4));

        for recipient in 0..100 {
            let first = mapping.map(&Addressed(recipient)).expect("Map message.");
            let second = mapping.map(&Addressed(recipient)).expect("Map message.");
            assert_eq!(first, second, "Recipient {recipient} should map consistently.");
        }
    }

    #[test]
    fn test_modulo_mapping_uses_key_hash() {
        let partitions = partitions(4);

        for recipient in 0..100u32 {
            let expected = crc32fast::hash(format!("{recipient:x}").as_bytes()) as usize % 4;
            let target =
                modulo_partition(&Addressed(recipient), &partitions).expect("Map message.");
            assert_eq!(target, partitions[expected]);
        }
    }

    #[test]
    fn test_modulo_mapping_spreads_recipients() {
        let partitions = partitions(4);

        let used = (0..100)
            .map(|r| modulo_partition(&Addressed(r), &partitions).expect("Map message."))
            .collect::<HashSet<_>>();
        assert_eq!(used.len(), 4, "All partitions should receive some recipients.");
    }

    #[test]
    fn test_empty_partitions() {
        let empty = partitions(0);

        let mapping = ModuloMapping::new(empty.clone());
        assert_eq!(
            mapping.map(&Addressed(1)),
            Err(MappingError::NoEligiblePartitions)
        );

        let mapping = RandomMapping::with_seed(empty, 1);
        assert_eq!(
            MappingFunc::<Addressed>::map(&mapping, &Addressed(1)),
            Err(MappingError::NoEligiblePartitions),
        );
    }

    #[test]
    fn test_random_mapping_is_deterministic_with_seed() {
        let partitions = partitions(8);

        let a = RandomMapping::with_seed(partitions.clone(), 1234);
        let b = RandomMapping::with_seed(partitions.clone(), 1234);

        for _ in 0..50 {
            let left = MappingFunc::<Addressed>::map(&a, &Addressed(0)).expect("Map message.");
            let right = MappingFunc::<Addressed>::map(&b, &Addressed(0)).expect("Map message.");
            assert_eq!(left, right);
            assert!(partitions.contains(&left));
        }
    }

    #[test]
    fn test_mapping_through_trait_object() {
        let mapping: Arc<dyn MappingFunc<Addressed>> = Arc::new(ModuloMapping::new(partitions(3)));

        let direct = modulo_partition(&Addressed(5), &partitions(3)).expect("Map message.");
        assert_eq!(mapping.map(&Addressed(5)).expect("Map message."), direct);
    }
}
