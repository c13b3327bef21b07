use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// The offset of a frame within a partition.
pub type Offset = u64;

/// The label every partition carries to describe the schema of its messages.
pub static MESSAGE_TYPE_LABEL: &str = "message-type";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
/// A typed identifier for the schema of the messages a partition carries.
pub struct MessageType(&'static str);

impl MessageType {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl Display for MessageType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// A set of name-value labels attached to a partition or shard.
pub struct LabelSet(BTreeMap<String, String>);

impl LabelSet {
    /// Creates a label set which only contains the message type label.
    pub fn for_message_type(message_type: MessageType) -> Self {
        Self::default().with(MESSAGE_TYPE_LABEL, message_type.name())
    }

    /// Adds a label to the set, replacing any existing value.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Gets the value of a given label.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Selects the partitions whose labels include every label of the selector.
pub struct LabelSelector {
    include: LabelSet,
}

impl LabelSelector {
    pub fn new(include: LabelSet) -> Self {
        Self { include }
    }

    /// Selects all partitions carrying messages of the given type.
    pub fn for_message_type(message_type: MessageType) -> Self {
        Self::new(LabelSet::for_message_type(message_type))
    }

    pub fn matches(&self, labels: &LabelSet) -> bool {
        self.include
            .iter()
            .all(|(name, value)| labels.get(name) == Some(value))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// A single independently ordered, append-only journal.
pub struct Partition {
    name: String,
    labels: LabelSet,
}

impl Partition {
    pub fn new(name: impl Into<String>, labels: LabelSet) -> Self {
        Self {
            name: name.into(),
            labels,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }
}

impl Display for Partition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
