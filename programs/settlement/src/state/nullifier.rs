use std::collections::BTreeSet;

use crate::error::InvariantViolation;

/// (source transaction hash, output index) already used to mint
pub type SpentOutput = ([u8; 32], u64);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NullifierSet {
    spent: BTreeSet<SpentOutput>,
}

impl NullifierSet {
    pub fn contains(&self, tx_hash: &[u8; 32], output_index: u64) -> bool {
        self.spent.contains(&(*tx_hash, output_index))
    }

    /// Fails without inserting if the pair is already present
    pub fn check_unspent(&self, tx_hash: &[u8; 32], output_index: u64) -> Result<(), InvariantViolation> {
        if self.contains(tx_hash, output_index) {
            return Err(InvariantViolation::NullifierReplay {
                tx_id: hex::encode(tx_hash),
                output_index,
            });
        }
        Ok(())
    }

    pub fn insert(&mut self, tx_hash: &[u8; 32], output_index: u64) -> Result<(), InvariantViolation> {
        self.check_unspent(tx_hash, output_index)?;
        self.spent.insert((*tx_hash, output_index));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.spent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spent.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_inserted_once() {
        let mut set = NullifierSet::default();
        set.insert(&[1; 32], 0).unwrap();
        set.insert(&[1; 32], 1).unwrap();
        assert!(matches!(
            set.insert(&[1; 32], 0),
            Err(InvariantViolation::NullifierReplay { output_index: 0, .. })
        ));
        assert_eq!(set.len(), 2);
    }
}
