//! The small representation: one contiguous buffer. Short sequences spend their whole life
//! here, where every operation is a plain memmove and structural sharing would only add
//! indirection. The buffer grows by doubling if an operation overshoots the inline capacity;
//! the adaptive wrapper transitions away before that matters.

use smallvec::SmallVec;

use crate::trie::BRANCH_FACTOR;
use crate::{Elem, VectorError};

#[derive(Debug, Clone)]
pub struct SmallVector<T: Elem> {
    buf: SmallVec<T, BRANCH_FACTOR>,
}

impl<T: Elem> SmallVector<T> {
    pub fn new() -> Self {
        SmallVector { buf: SmallVec::new() }
    }

    pub fn from_slice(values: &[T]) -> Self {
        values.iter().cloned().collect()
    }

    pub fn len(&self) -> usize { self.buf.len() }

    pub fn is_empty(&self) -> bool { self.buf.is_empty() }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.buf.get(index)
    }

    pub fn first(&self) -> Option<&T> { self.buf.first() }

    pub fn last(&self) -> Option<&T> { self.buf.last() }

    pub fn set(&self, index: usize, value: T) -> Result<Self, VectorError> {
        if index >= self.buf.len() {
            return Err(VectorError::IndexOutOfRange { index, len: self.buf.len() });
        }
        let mut out = self.clone();
        out.buf[index] = value;
        Ok(out)
    }

    pub fn append(&self, value: T) -> Self {
        let mut out = self.clone();
        out.buf.push(value);
        out
    }

    pub fn prepend(&self, value: T) -> Self {
        let mut out = self.clone();
        out.buf.insert(0, value);
        out
    }

    pub fn insert(&self, index: usize, value: T) -> Result<Self, VectorError> {
        if index > self.buf.len() {
            return Err(VectorError::IndexOutOfRange { index, len: self.buf.len() });
        }
        let mut out = self.clone();
        out.buf.insert(index, value);
        Ok(out)
    }

    pub fn remove(&self, index: usize) -> Result<Self, VectorError> {
        if index >= self.buf.len() {
            return Err(VectorError::IndexOutOfRange { index, len: self.buf.len() });
        }
        let mut out = self.clone();
        out.buf.remove(index);
        Ok(out)
    }

    pub fn concat(&self, other: &Self) -> Self {
        let mut out = self.clone();
        out.buf.extend(other.buf.iter().cloned());
        out
    }

    pub fn slice(&self, start: isize, end: isize) -> Self {
        let (a, b) = crate::trie::clamp_range(self.buf.len(), start, end);
        if a >= b {
            return Self::new();
        }
        SmallVector { buf: self.buf[a..b].iter().cloned().collect() }
    }

    pub fn map<U: Elem>(&self, f: impl FnMut(&T) -> U) -> SmallVector<U> {
        SmallVector { buf: self.buf.iter().map(f).collect() }
    }

    pub fn filter(&self, mut predicate: impl FnMut(&T) -> bool) -> Self {
        SmallVector {
            buf: self.buf.iter().filter(|v| predicate(v)).cloned().collect::<SmallVec<T, BRANCH_FACTOR>>(),
        }
    }

    pub fn reduce<A>(&self, mut f: impl FnMut(A, &T) -> A, init: A) -> A {
        let mut acc = init;
        for v in self.buf.iter() {
            acc = f(acc, v);
        }
        acc
    }

    pub fn find(&self, mut predicate: impl FnMut(&T) -> bool) -> Option<&T> {
        self.buf.iter().find(|v| predicate(v))
    }

    pub fn find_index(&self, mut predicate: impl FnMut(&T) -> bool) -> Option<usize> {
        self.buf.iter().position(|v| predicate(v))
    }

    pub fn map_filter_reduce<U, A>(
        &self,
        mut f: impl FnMut(&T) -> U,
        mut predicate: impl FnMut(&U) -> bool,
        mut g: impl FnMut(A, &U) -> A,
        init: A,
    ) -> A {
        let mut acc = init;
        for v in self.buf.iter() {
            let mapped = f(v);
            if predicate(&mapped) {
                acc = g(acc, &mapped);
            }
        }
        acc
    }

    pub fn map_reduce<U, A>(
        &self,
        mut f: impl FnMut(&T) -> U,
        mut g: impl FnMut(A, &U) -> A,
        init: A,
    ) -> A {
        let mut acc = init;
        for v in self.buf.iter() {
            let mapped = f(v);
            acc = g(acc, &mapped);
        }
        acc
    }

    pub fn filter_map<U: Elem>(
        &self,
        mut predicate: impl FnMut(&T) -> bool,
        mut f: impl FnMut(&T) -> U,
    ) -> SmallVector<U> {
        SmallVector {
            buf: self.buf.iter().filter(|v| predicate(v)).map(|v| f(v)).collect(),
        }
    }

    pub fn update_many(&self, pairs: &[(usize, T)]) -> Result<Self, VectorError> {
        for (index, _) in pairs {
            if *index >= self.buf.len() {
                return Err(VectorError::IndexOutOfRange { index: *index, len: self.buf.len() });
            }
        }
        let mut sorted: Vec<(usize, &T)> = pairs.iter().map(|(i, v)| (*i, v)).collect();
        sorted.sort_by_key(|(i, _)| *i);
        let mut out = self.clone();
        for (index, value) in sorted {
            out.buf[index] = value.clone();
        }
        Ok(out)
    }

    pub fn remove_many(&self, indices: &[usize]) -> Result<Self, VectorError> {
        for index in indices {
            if *index >= self.buf.len() {
                return Err(VectorError::IndexOutOfRange { index: *index, len: self.buf.len() });
            }
        }
        let mut sorted = indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        let mut drop = sorted.iter().peekable();
        let mut out = SmallVector::new();
        for (index, v) in self.buf.iter().enumerate() {
            if drop.peek() == Some(&&index) {
                drop.next();
                continue;
            }
            out.buf.push(v.clone());
        }
        Ok(out)
    }

    pub fn insert_many(&self, pairs: &[(usize, T)]) -> Result<Self, VectorError> {
        for (index, _) in pairs {
            if *index > self.buf.len() {
                return Err(VectorError::IndexOutOfRange { index: *index, len: self.buf.len() });
            }
        }
        let mut sorted: Vec<(usize, &T)> = pairs.iter().map(|(i, v)| (*i, v)).collect();
        sorted.sort_by_key(|(i, _)| *i);
        let mut pending = sorted.into_iter().peekable();
        let mut out = SmallVector::new();
        for (index, v) in self.buf.iter().enumerate() {
            while pending.peek().is_some_and(|(i, _)| *i == index) {
                let (_, value) = pending.next().expect("peeked above");
                out.buf.push(value.clone());
            }
            out.buf.push(v.clone());
        }
        for (_, value) in pending {
            out.buf.push(value.clone());
        }
        Ok(out)
    }

    pub fn transient(&self) -> SmallTransient<T> {
        SmallTransient {
            buf: self.buf.clone(),
            consumed: false,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.buf.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.buf
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.buf.to_vec()
    }

    #[allow(unused)]
    pub fn dbg_check(&self) {
        // Nothing structural to verify; the buffer is the representation.
    }
}

impl<T: Elem> Default for SmallVector<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Elem> FromIterator<T> for SmallVector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        SmallVector { buf: iter.into_iter().collect() }
    }
}

impl<T: Elem> PartialEq for SmallVector<T> {
    fn eq(&self, other: &Self) -> bool {
        self.buf == other.buf
    }
}

/// The small vector's builder. Finalisation moves the buffer out, so the produced vector
/// never aliases the transient's storage.
#[derive(Debug)]
pub struct SmallTransient<T: Elem> {
    buf: SmallVec<T, BRANCH_FACTOR>,
    consumed: bool,
}

impl<T: Elem> SmallTransient<T> {
    fn guard(&self) -> Result<(), VectorError> {
        if self.consumed {
            Err(VectorError::TransientConsumed)
        } else {
            Ok(())
        }
    }

    pub fn len(&self) -> usize { self.buf.len() }

    pub fn is_empty(&self) -> bool { self.buf.is_empty() }

    pub fn append(&mut self, value: T) -> Result<(), VectorError> {
        self.guard()?;
        self.buf.push(value);
        Ok(())
    }

    pub fn prepend(&mut self, value: T) -> Result<(), VectorError> {
        self.guard()?;
        self.buf.insert(0, value);
        Ok(())
    }

    pub fn set(&mut self, index: usize, value: T) -> Result<(), VectorError> {
        self.guard()?;
        if index >= self.buf.len() {
            return Err(VectorError::IndexOutOfRange { index, len: self.buf.len() });
        }
        self.buf[index] = value;
        Ok(())
    }

    pub fn extend(&mut self, iter: impl IntoIterator<Item = T>) -> Result<(), VectorError> {
        self.guard()?;
        self.buf.extend(iter);
        Ok(())
    }

    pub fn persistent(&mut self) -> Result<SmallVector<T>, VectorError> {
        self.guard()?;
        self.consumed = true;
        Ok(SmallVector { buf: std::mem::take(&mut self.buf) })
    }
}
