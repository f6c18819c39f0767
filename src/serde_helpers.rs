//! Serde support, behind the `serde` feature. Vectors serialize as plain sequences — the
//! representation tag, chunk layout, and sharing are reconstructed on deserialization, not
//! persisted.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Elem, Vector};

impl<T: Elem + Serialize> Serialize for Vector<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for v in self.iter() {
            seq.serialize_element(v)?;
        }
        seq.end()
    }
}

struct VectorVisitor<T>(PhantomData<T>);

impl<'de, T: Elem + Deserialize<'de>> Visitor<'de> for VectorVisitor<T> {
    type Value = Vector<T>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a sequence")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Vector<T>, A::Error> {
        let mut t = Vector::new().transient();
        while let Some(value) = seq.next_element()? {
            let _ = t.append(value);
        }
        Ok(t.persistent().expect("fresh transient cannot be consumed"))
    }
}

impl<'de, T: Elem + Deserialize<'de>> Deserialize<'de> for Vector<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_seq(VectorVisitor(PhantomData))
    }
}
