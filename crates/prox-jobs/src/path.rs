//! Job identity: which segment pair, and which leaf of the branching tree.

use std::fmt;

use prox_body::BodyId;

// ── LookAheadJobIdentifier ────────────────────────────────────────────────────

/// The composite identifier of a look-ahead concern: one human segment
/// paired with one robot segment.
///
/// The derived `Ord` is lexicographic over (human, human segment, robot,
/// robot segment).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LookAheadJobIdentifier {
    human: BodyId,
    human_segment: usize,
    robot: BodyId,
    robot_segment: usize,
}

impl LookAheadJobIdentifier {
    pub fn new(human: BodyId, human_segment: usize, robot: BodyId, robot_segment: usize) -> Self {
        Self { human, human_segment, robot, robot_segment }
    }

    pub fn human(&self) -> &BodyId {
        &self.human
    }

    pub fn human_segment(&self) -> usize {
        self.human_segment
    }

    pub fn robot(&self) -> &BodyId {
        &self.robot
    }

    pub fn robot_segment(&self) -> usize {
        self.robot_segment
    }
}

impl fmt::Display for LookAheadJobIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}+{}@{}",
            self.human, self.human_segment, self.robot, self.robot_segment
        )
    }
}

// ── LookAheadJobPath ──────────────────────────────────────────────────────────

/// A path identifying one leaf in the tree of jobs sharing an identifier.
///
/// A job is normally a single-node tree; additional leaves appear whenever
/// multiple next modes branch the prediction.  Each element records the
/// priority of the branch taken (0 for the most likely, increasing) and the
/// trace position at which the prediction deviated (the size of the trace
/// before the next mode was appended).  The primary job has all-zero
/// priorities.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct LookAheadJobPath {
    elements: Vec<(usize, usize)>,
}

impl LookAheadJobPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an element.
    ///
    /// # Panics
    /// Panics if `trace_position` is zero or does not exceed the last
    /// element's position.
    pub fn add(&mut self, priority: usize, trace_position: usize) -> &mut Self {
        assert!(trace_position > 0, "trace position must be positive");
        if let Some(&(_, last)) = self.elements.last() {
            assert!(
                last < trace_position,
                "trace position must exceed the previous element's"
            );
        }
        self.elements.push((priority, trace_position));
        self
    }

    /// Remove elements with position ≤ `trace_position`, shifting the
    /// remaining positions down by it.
    pub fn remove_le_than(&mut self, trace_position: usize) -> &mut Self {
        self.elements = self
            .elements
            .iter()
            .filter(|(_, pos)| *pos > trace_position)
            .map(|&(priority, pos)| (priority, pos - trace_position))
            .collect();
        self
    }

    /// Remove elements with position > `trace_position`.
    pub fn remove_g_than(&mut self, trace_position: usize) -> &mut Self {
        while self
            .elements
            .last()
            .is_some_and(|&(_, pos)| pos > trace_position)
        {
            self.elements.pop();
        }
        self
    }

    /// Keep elements in `(lower, upper]`, rebasing positions onto `lower`.
    pub fn reduce_between(&mut self, lower: usize, upper: usize) -> &mut Self {
        self.remove_g_than(upper).remove_le_than(lower)
    }

    /// The priority of the element at `index`.  Panics if out of range.
    pub fn priority(&self, index: usize) -> usize {
        self.elements[index].0
    }

    /// Whether this is a primary job (all priorities zero).
    pub fn is_primary(&self) -> bool {
        self.elements.iter().all(|&(priority, _)| priority == 0)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl fmt::Display for LookAheadJobPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, (priority, pos)) in self.elements.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{priority}:{pos}")?;
        }
        write!(f, "]")
    }
}
