//! Track the progress of a value replicated to the members of a quorum set,
//! and compute the greatest value that is accepted by a quorum.

use std::fmt;

use crate::quorum::QuorumSet;

/// Tracks a value per member and the greatest value accepted by a quorum.
///
/// A value `v` is accepted by a quorum if the members whose value is `>= v`
/// form a quorum. With `bool` values it answers "did a quorum grant", with
/// log indexes it answers "up to which index does a quorum have the log".
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct VecProgress<ID, V, QS>
where
    ID: 'static,
    QS: QuorumSet<ID>,
{
    quorum_set: QS,

    /// Member values, kept sorted in descending order of value.
    vector: Vec<(ID, V)>,

    /// The greatest value accepted by a quorum so far.
    accepted: V,
}

impl<ID, V, QS> fmt::Display for VecProgress<ID, V, QS>
where
    ID: fmt::Display + 'static,
    V: fmt::Display,
    QS: QuorumSet<ID>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (id, v)) in self.vector.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", id, v)?;
        }
        write!(f, "}}")?;
        Ok(())
    }
}

impl<ID, V, QS> VecProgress<ID, V, QS>
where
    ID: PartialEq + Clone + 'static,
    V: Ord + Copy,
    QS: QuorumSet<ID>,
{
    /// Create a progress in which every member of `quorum_set` starts with
    /// `initial`.
    pub(crate) fn new(quorum_set: QS, initial: V) -> Self {
        let vector = quorum_set.ids().map(|id| (id, initial)).collect();

        Self {
            quorum_set,
            vector,
            accepted: initial,
        }
    }

    /// Set the value of member `id` and return the value accepted by a
    /// quorum.
    ///
    /// A value may move backward. The accepted value never does.
    /// Returns `Err(accepted)` if `id` is not a member.
    pub(crate) fn update(&mut self, id: &ID, value: V) -> Result<&V, &V> {
        let Some(pos) = self.vector.iter().position(|(x, _)| x == id) else {
            return Err(&self.accepted);
        };

        self.vector[pos].1 = value;
        self.vector.sort_by(|a, b| b.1.cmp(&a.1));

        for i in 0..self.vector.len() {
            let candidate = self.vector[i].1;
            if candidate <= self.accepted {
                break;
            }

            let ids = self.vector[..=i].iter().map(|(id, _)| id);
            if self.quorum_set.is_quorum(ids) {
                self.accepted = candidate;
                break;
            }
        }

        Ok(&self.accepted)
    }

    /// Raise the value of member `id` to `value` if it is greater.
    pub(crate) fn increase_to(&mut self, id: &ID, value: V) -> Result<&V, &V> {
        let current = self.get(id);
        match current {
            Some(v) if v >= value => Ok(&self.accepted),
            Some(_) => self.update(id, value),
            None => Err(&self.accepted),
        }
    }

    pub(crate) fn get(&self, id: &ID) -> Option<V> {
        self.vector.iter().find(|(x, _)| x == id).map(|(_, v)| *v)
    }

    pub(crate) fn accepted(&self) -> &V {
        &self.accepted
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &(ID, V)> {
        self.vector.iter()
    }
}
