#![allow(dead_code)]
//! Parcel store
//!
//! Fixed-bucket hash table with chained buckets, keyed by parcel id.
//! Bucket count never changes after construction; the parcel count is small
//! and known up front.

use crate::types::{Parcel, ParcelId, StopRef};

pub const DEFAULT_BUCKET_COUNT: usize = 40;

/// Parcel id → parcel record
#[derive(Debug, Clone)]
pub struct ParcelStore {
    buckets: Vec<Vec<(ParcelId, Parcel)>>,
    len: usize,
}

impl Default for ParcelStore {
    fn default() -> Self {
        Self::with_buckets(DEFAULT_BUCKET_COUNT)
    }
}

impl ParcelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with a fixed number of buckets (at least one).
    pub fn with_buckets(bucket_count: usize) -> Self {
        Self {
            buckets: vec![Vec::new(); bucket_count.max(1)],
            len: 0,
        }
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn bucket_of(&self, id: ParcelId) -> usize {
        id as usize % self.buckets.len()
    }

    /// Insert or replace. A replaced entry keeps its position in the bucket.
    pub fn insert(&mut self, id: ParcelId, parcel: Parcel) -> bool {
        let index = self.bucket_of(id);
        let bucket = &mut self.buckets[index];

        if let Some(entry) = bucket.iter_mut().find(|(key, _)| *key == id) {
            entry.1 = parcel;
            return true;
        }

        bucket.push((id, parcel));
        self.len += 1;
        true
    }

    pub fn search(&self, id: ParcelId) -> Option<&Parcel> {
        self.buckets[self.bucket_of(id)]
            .iter()
            .find(|(key, _)| *key == id)
            .map(|(_, parcel)| parcel)
    }

    pub fn search_mut(&mut self, id: ParcelId) -> Option<&mut Parcel> {
        let index = self.bucket_of(id);
        self.buckets[index]
            .iter_mut()
            .find(|(key, _)| *key == id)
            .map(|(_, parcel)| parcel)
    }

    /// Remove an entry, returning whether it was present.
    pub fn remove(&mut self, id: ParcelId) -> bool {
        let index = self.bucket_of(id);
        let bucket = &mut self.buckets[index];

        match bucket.iter().position(|(key, _)| *key == id) {
            Some(pos) => {
                bucket.remove(pos);
                self.len -= 1;
                true
            }
            None => false,
        }
    }

    /// First parcel (in bucket order) whose street equals `street`, or the hub.
    ///
    /// Linear scan over every bucket: O(n).
    pub fn find_by_destination(&self, street: &str) -> StopRef {
        self.iter()
            .find(|parcel| parcel.address.street == street)
            .map(|parcel| StopRef::Parcel(parcel.id))
            .unwrap_or(StopRef::Hub)
    }

    /// All parcels in bucket order
    pub fn iter(&self) -> impl Iterator<Item = &Parcel> {
        self.buckets.iter().flatten().map(|(_, parcel)| parcel)
    }

    /// All parcel ids, ascending
    pub fn ids(&self) -> Vec<ParcelId> {
        let mut ids: Vec<ParcelId> = self.buckets.iter().flatten().map(|(id, _)| *id).collect();
        ids.sort_unstable();
        ids
    }
}
