//! Validated two-group partitions of a sample.
//!
//! Every statistic in this crate compares two groups of rows. The grouping is
//! supplied by the caller as a label column that must contain exactly two
//! distinct values. [`Membership`] is the validated, label-free form of that
//! column: one [`Group`] per row.

use std::collections::BTreeSet;

use rand::{Rng, seq::SliceRandom as _};

/// Errors raised while validating a sample and its group labels.
///
/// All of these are detected before any statistic is computed.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum SampleError {
    #[display("sample and group labels must not be empty")]
    EmptyInput,
    #[display("sample has {values} values but group labels has {labels} entries")]
    ShapeMismatch { values: usize, labels: usize },
    #[display("group labels must contain exactly two distinct values, found {found}")]
    InvalidGroupCount { found: usize },
    #[display("quantitative sample contains NaN at index {index}")]
    NanValue { index: usize },
}

/// One of the two groups being compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::IsVariant)]
pub enum Group {
    A,
    B,
}

impl Group {
    /// Returns the other group.
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Group::A => Group::B,
            Group::B => Group::A,
        }
    }
}

/// Assignment of every row of a sample to group A or group B.
///
/// Both groups are guaranteed to be non-empty. Group A is the label that
/// appears first in the label column.
///
/// # Examples
///
/// ```
/// use permute_stats::sample::{Group, Membership};
///
/// let membership = Membership::from_labels(&["x", "y", "x"]).unwrap();
/// assert_eq!(membership.groups(), &[Group::A, Group::B, Group::A]);
/// assert_eq!(membership.group_len(Group::A), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    groups: Vec<Group>,
    len_a: usize,
}

impl Membership {
    /// Builds a membership from a label column.
    ///
    /// Fails with [`SampleError::EmptyInput`] for an empty column and with
    /// [`SampleError::InvalidGroupCount`] unless exactly two distinct labels occur.
    pub fn from_labels<L>(labels: &[L]) -> Result<Self, SampleError>
    where
        L: Ord,
    {
        let first = labels.first().ok_or(SampleError::EmptyInput)?;
        let mut second = None;
        let mut groups = Vec::with_capacity(labels.len());
        for label in labels {
            if label == first {
                groups.push(Group::A);
                continue;
            }
            match second {
                None => second = Some(label),
                Some(second) if second == label => {}
                Some(_) => {
                    let found = labels.iter().collect::<BTreeSet<_>>().len();
                    return Err(SampleError::InvalidGroupCount { found });
                }
            }
            groups.push(Group::B);
        }
        if second.is_none() {
            return Err(SampleError::InvalidGroupCount { found: 1 });
        }
        Ok(Self::from_groups_unchecked(groups))
    }

    /// Builds a membership from a sample and its label column, checking that
    /// both are non-empty and have the same length.
    pub fn for_sample<T, L>(values: &[T], labels: &[L]) -> Result<Self, SampleError>
    where
        L: Ord,
    {
        if values.is_empty() || labels.is_empty() {
            return Err(SampleError::EmptyInput);
        }
        ensure_same_len(values.len(), labels.len())?;
        Self::from_labels(labels)
    }

    /// Builds a membership from explicit group assignments.
    pub fn from_groups(groups: Vec<Group>) -> Result<Self, SampleError> {
        if groups.is_empty() {
            return Err(SampleError::EmptyInput);
        }
        let this = Self::from_groups_unchecked(groups);
        if this.len_a == 0 || this.len_a == this.groups.len() {
            return Err(SampleError::InvalidGroupCount { found: 1 });
        }
        Ok(this)
    }

    fn from_groups_unchecked(groups: Vec<Group>) -> Self {
        let len_a = groups.iter().filter(|g| g.is_a()).count();
        Self { groups, len_a }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    #[must_use]
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Number of rows assigned to `group`.
    #[must_use]
    pub fn group_len(&self, group: Group) -> usize {
        match group {
            Group::A => self.len_a,
            Group::B => self.groups.len() - self.len_a,
        }
    }

    /// Returns the membership with groups A and B exchanged.
    #[must_use]
    pub fn swapped(&self) -> Self {
        Self {
            groups: self.groups.iter().map(|g| g.other()).collect(),
            len_a: self.groups.len() - self.len_a,
        }
    }

    /// Reassigns rows to groups uniformly at random.
    ///
    /// This is a permutation of the existing assignments, so the size of each
    /// group never changes.
    pub fn shuffle<R>(&mut self, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        self.groups.shuffle(rng);
    }

    /// Iterates over the values assigned to `group`, in row order.
    ///
    /// # Panics
    ///
    /// Panics if `values` does not have one entry per row.
    pub fn values_of<'a, T>(&'a self, values: &'a [T], group: Group) -> impl Iterator<Item = &'a T> {
        assert_eq!(values.len(), self.groups.len(), "one value per row required");
        values
            .iter()
            .zip(&self.groups)
            .filter(move |(_, g)| **g == group)
            .map(|(v, _)| v)
    }
}

pub(crate) fn ensure_same_len(values: usize, labels: usize) -> Result<(), SampleError> {
    if values == labels {
        Ok(())
    } else {
        Err(SampleError::ShapeMismatch { values, labels })
    }
}

/// Rejects quantitative samples containing NaN.
pub fn ensure_no_nan(values: &[f64]) -> Result<(), SampleError> {
    match values.iter().position(|v| v.is_nan()) {
        Some(index) => Err(SampleError::NanValue { index }),
        None => Ok(()),
    }
}
