//! Integer-ID inverted index (spec §4.D, optional — for corpora beyond the
//! target 10³–10⁵ scale where string-keyed postings sets become the
//! dominant memory cost). Maintains a name ↔ integer-ID bijection and
//! per-term postings as sorted `u32` vectors, supporting O(n+m)
//! merge-intersection/union.
//!
//! "Finalised" sorts and dedups every postings list so query-time merges
//! can assume sortedness; "unfinalised" (the default after any mutation)
//! falls back to a linear scan before the list is next finalised.

use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Default)]
pub struct IntInvertedIndex {
    name_to_id: FxHashMap<String, u32>,
    id_to_name: Vec<String>,
    postings: FxHashMap<String, Vec<u32>>,
    finalised: bool,
}

impl IntInvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id_for(&mut self, name: &str) -> u32 {
        if let Some(&id) = self.name_to_id.get(name) {
            return id;
        }
        let id = self.id_to_name.len() as u32;
        self.id_to_name.push(name.to_string());
        self.name_to_id.insert(name.to_string(), id);
        id
    }

    pub fn name_of(&self, id: u32) -> Option<&str> {
        self.id_to_name.get(id as usize).map(|s| s.as_str())
    }

    pub fn add_posting(&mut self, term: &str, name: &str) {
        let id = self.id_for(name);
        self.postings.entry(term.to_string()).or_default().push(id);
        self.finalised = false;
    }

    pub fn remove_posting(&mut self, term: &str, name: &str) {
        let Some(&id) = self.name_to_id.get(name) else { return };
        if let Some(list) = self.postings.get_mut(term) {
            list.retain(|&x| x != id);
        }
    }

    /// Sorts and dedups every postings list so subsequent queries can use
    /// the linear merge algorithms below.
    pub fn finalise(&mut self) {
        for list in self.postings.values_mut() {
            list.sort_unstable();
            list.dedup();
        }
        self.finalised = true;
    }

    pub fn is_finalised(&self) -> bool {
        self.finalised
    }

    fn postings_for(&self, term: &str) -> Vec<u32> {
        match self.postings.get(term) {
            Some(list) if self.finalised => list.clone(),
            Some(list) => {
                let mut sorted = list.clone();
                sorted.sort_unstable();
                sorted.dedup();
                sorted
            }
            None => Vec::new(),
        }
    }

    /// Sorted-merge intersection, O(n+m).
    pub fn intersect(&self, a: &str, b: &str) -> Vec<u32> {
        merge_intersect(&self.postings_for(a), &self.postings_for(b))
    }

    /// Sorted-merge union, O(n+m).
    pub fn union(&self, a: &str, b: &str) -> Vec<u32> {
        merge_union(&self.postings_for(a), &self.postings_for(b))
    }
}

fn merge_intersect(a: &[u32], b: &[u32]) -> Vec<u32> {
    let (mut i, mut j) = (0, 0);
    let mut out = Vec::new();
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
        }
    }
    out
}

fn merge_union(a: &[u32], b: &[u32]) -> Vec<u32> {
    let (mut i, mut j) = (0, 0);
    let mut out = Vec::with_capacity(a.len() + b.len());
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
            std::cmp::Ordering::Less => {
                out.push(a[i]);
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                out.push(b[j]);
                j += 1;
            }
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}
