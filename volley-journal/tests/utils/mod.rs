#![allow(dead_code)]

use rkyv::{AlignedVec, Archive, Deserialize, Serialize};
use volley_message::{
    CodecError,
    LabelSet,
    Mappable,
    Message,
    MessageId,
    MessageType,
    Partition,
};

pub const NOTE: MessageType = MessageType::new("tests.Note");

#[derive(Archive, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[archive(check_bytes)]
/// A minimal message used to exercise the journals.
pub struct Note {
    pub id: MessageId,
    pub to: String,
    pub body: String,
}

impl Note {
    pub fn new(to: &str, body: &str) -> Self {
        Self {
            id: MessageId::default(),
            to: to.to_string(),
            body: body.to_string(),
        }
    }
}

impl Mappable for Note {
    fn mapping_key(&self) -> String {
        self.to.clone()
    }
}

impl Message for Note {
    fn id(&self) -> MessageId {
        self.id
    }

    fn set_id(&mut self, id: MessageId) {
        self.id = id;
    }

    fn new_acknowledgement(_partition: &Partition) -> Self {
        Self::new("", "")
    }

    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        rkyv::to_bytes::<_, 256>(self)
            .map(|buffer| buffer.into_vec())
            .map_err(|_| CodecError::new("failed to serialize note"))
    }

    fn decode(buf: &[u8]) -> Result<Self, CodecError> {
        let mut aligned = AlignedVec::with_capacity(buf.len());
        aligned.extend_from_slice(buf);
        rkyv::from_bytes::<Self>(&aligned).map_err(|_| CodecError::invalid_frame(buf.len()))
    }
}

pub fn note_partitions(n: usize) -> Vec<Partition> {
    (0..n)
        .map(|i| Partition::new(format!("notes/part={i:02}"), LabelSet::for_message_type(NOTE)))
        .collect()
}
