//! Mode traces and the next-mode frequency estimator.
//!
//! A `ModeTrace` records the sequence of modes a robot has visited (or is
//! predicted to visit), each entry carrying the cumulative likelihood of the
//! trace up to that point.  `next_modes` estimates a distribution over the
//! modes that may follow the current ending mode by finding the longest
//! suffix of the trace that has occurred before and counting what followed
//! each of its past occurrences.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::OnceLock;

use crate::mode::Mode;

/// One step of a trace: the mode and the likelihood of the trace up to it.
#[derive(Clone, Debug, PartialEq)]
pub struct ModeTraceEntry {
    pub mode: Mode,
    pub likelihood: f64,
}

/// A trace of modes, enriched by the likelihood that the trace is followed.
#[derive(Debug, Default)]
pub struct ModeTrace {
    entries: VecDeque<ModeTraceEntry>,
    // Memoised next_modes; cleared by every mutation.
    next_modes: OnceLock<BTreeMap<Mode, f64>>,
}

impl Clone for ModeTrace {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            next_modes: OnceLock::new(),
        }
    }
}

impl PartialEq for ModeTrace {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl ModeTrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// The entry at `idx`.
    ///
    /// # Panics
    /// Panics if `idx` is out of range.
    pub fn at(&self, idx: usize) -> &ModeTraceEntry {
        &self.entries[idx]
    }

    /// The number of modes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The first mode in the trace.  Panics on an empty trace.
    pub fn starting_mode(&self) -> &Mode {
        &self.entries[0].mode
    }

    /// The last mode in the trace.  Panics on an empty trace.
    pub fn ending_mode(&self) -> &Mode {
        &self.entries[self.entries.len() - 1].mode
    }

    /// The likelihood of this trace, i.e. of its final entry; 1 when empty.
    pub fn likelihood(&self) -> f64 {
        match self.entries.back() {
            Some(e) => e.likelihood,
            None => 1.0,
        }
    }

    /// Index of the first occurrence of `mode`.
    pub fn forward_index(&self, mode: &Mode) -> Option<usize> {
        self.entries.iter().position(|e| e.mode == *mode)
    }

    /// Index of the last occurrence of `mode`.
    pub fn backward_index(&self, mode: &Mode) -> Option<usize> {
        self.entries.iter().rposition(|e| e.mode == *mode)
    }

    pub fn contains(&self, mode: &Mode) -> bool {
        self.entries.iter().any(|e| e.mode == *mode)
    }

    /// Whether the ending mode already appears somewhere earlier, i.e. the
    /// trace has closed at least one loop.
    pub fn has_looped(&self) -> bool {
        if self.entries.len() <= 1 {
            return false;
        }
        let ending = self.ending_mode();
        self.entries
            .iter()
            .take(self.entries.len() - 1)
            .any(|e| e.mode == *ending)
    }

    /// Prepend `mode` with likelihood 1.
    pub fn push_front(&mut self, mode: Mode) -> &mut Self {
        self.entries.push_front(ModeTraceEntry { mode, likelihood: 1.0 });
        self.next_modes = OnceLock::new();
        self
    }

    /// Append `mode`; the cumulative likelihood is the current trace
    /// likelihood times `likelihood`.
    pub fn push_back(&mut self, mode: Mode, likelihood: f64) -> &mut Self {
        let cumulative = self.likelihood() * likelihood;
        self.entries.push_back(ModeTraceEntry { mode, likelihood: cumulative });
        self.next_modes = OnceLock::new();
        self
    }

    /// Keep only the entries with indices in `[lower, upper]`.
    ///
    /// # Panics
    /// Panics if the trace is empty or `lower > upper`.
    pub fn reduce_between(&mut self, lower: usize, upper: usize) {
        assert!(!self.entries.is_empty(), "cannot reduce an empty mode trace");
        assert!(lower <= upper, "inconsistent reduction bounds: {lower} vs {upper}");
        self.entries = self
            .entries
            .iter()
            .skip(lower)
            .take(upper - lower + 1)
            .cloned()
            .collect();
        self.next_modes = OnceLock::new();
    }

    /// The modes that may follow the ending mode, with their probability.
    ///
    /// Memoised: the first call computes the distribution, mutations clear it.
    /// Empty iff the trace has fewer than two entries or the ending mode
    /// never occurs earlier in the trace.
    pub fn next_modes(&self) -> &BTreeMap<Mode, f64> {
        self.next_modes.get_or_init(|| self.compute_next_modes())
    }

    /// Longest-common-suffix frequency estimation.
    ///
    /// Every index `i < len-1` whose mode equals the ending mode anchors a
    /// candidate suffix match of length 1; candidates are extended backwards
    /// in lockstep and only those achieving the maximal match length vote,
    /// each with its forward successor `entries[i+1]`.
    fn compute_next_modes(&self) -> BTreeMap<Mode, f64> {
        let n = self.entries.len();
        let mut result = BTreeMap::new();
        if n < 2 {
            return result;
        }
        let ending = self.ending_mode();
        let candidates: Vec<usize> =
            (0..n - 1).filter(|&i| self.entries[i].mode == *ending).collect();
        if candidates.is_empty() {
            return result;
        }

        let match_length = |i: usize| {
            let mut k = 1;
            while k <= i && self.entries[i - k].mode == self.entries[n - 1 - k].mode {
                k += 1;
            }
            k
        };
        let lengths: Vec<usize> = candidates.iter().map(|&i| match_length(i)).collect();
        let maximum = *lengths.iter().max().unwrap_or(&0);

        let chosen: Vec<usize> = candidates
            .iter()
            .zip(&lengths)
            .filter(|&(_, &l)| l == maximum)
            .map(|(&i, _)| i)
            .collect();
        let total = chosen.len() as f64;
        for i in chosen {
            *result.entry(self.entries[i + 1].mode.clone()).or_insert(0.0) += 1.0;
        }
        for p in result.values_mut() {
            *p /= total;
        }
        result
    }
}

impl<M: Into<Mode>> FromIterator<(M, f64)> for ModeTrace {
    fn from_iter<I: IntoIterator<Item = (M, f64)>>(iter: I) -> Self {
        let mut trace = ModeTrace::new();
        for (mode, likelihood) in iter {
            trace.push_back(mode.into(), likelihood);
        }
        trace
    }
}

/// A trace with tail `tail`, prefixed by the entries of `head` that precede
/// the first occurrence of the tail's starting mode.  Prefix entries carry
/// likelihood 1; the accumulated likelihood is the tail's.
pub fn merge(head: &ModeTrace, tail: &ModeTrace) -> ModeTrace {
    let mut result = tail.clone();
    let mut i = head.len();
    if i > 0 && head.at(i - 1).mode == *tail.starting_mode() {
        i -= 1;
    }
    while i > 0 {
        i -= 1;
        result.push_front(head.at(i).mode.clone());
    }
    result
}

impl fmt::Display for ModeTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, e) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}@{}", e.mode, e.likelihood)?;
        }
        write!(f, "}}")
    }
}
