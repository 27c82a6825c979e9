//! Row drop masks.

/// One flag per table row: `true` means "remove this row".
///
/// Masks are positional over the table as it stands when the mask is built.
/// Stages return a fresh mask and the caller folds them together with
/// [`DropMask::union`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DropMask {
    flags: Vec<bool>,
}

impl DropMask {
    /// Creates a mask of `len` rows with nothing flagged.
    pub fn new(len: usize) -> Self {
        Self {
            flags: vec![false; len],
        }
    }

    /// Creates a mask from explicit flags.
    pub fn from_flags(flags: Vec<bool>) -> Self {
        Self { flags }
    }

    /// Creates a mask of `len` rows flagging the given positions.
    pub fn from_positions(len: usize, positions: &[usize]) -> Self {
        let mut mask = Self::new(len);
        for &position in positions {
            mask.set(position);
        }
        mask
    }

    /// Number of rows covered.
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// Returns true if the mask covers no rows.
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Returns whether `position` is flagged.
    pub fn get(&self, position: usize) -> bool {
        self.flags.get(position).copied().unwrap_or(false)
    }

    /// Flags `position`. Out-of-range positions are ignored.
    pub fn set(&mut self, position: usize) {
        if let Some(flag) = self.flags.get_mut(position) {
            *flag = true;
        }
    }

    /// Number of flagged rows.
    pub fn count(&self) -> usize {
        self.flags.iter().filter(|f| **f).count()
    }

    /// Returns true if any row is flagged.
    pub fn any(&self) -> bool {
        self.flags.contains(&true)
    }

    /// Logical OR of two masks.
    pub fn union(mut self, other: &DropMask) -> Self {
        if other.flags.len() > self.flags.len() {
            self.flags.resize(other.flags.len(), false);
        }
        for (flag, other) in self.flags.iter_mut().zip(&other.flags) {
            *flag |= *other;
        }
        self
    }

    /// Flagged positions in ascending order.
    pub fn positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.flags
            .iter()
            .enumerate()
            .filter_map(|(position, flag)| flag.then_some(position))
    }

    /// The raw flags.
    pub fn as_slice(&self) -> &[bool] {
        &self.flags
    }
}
