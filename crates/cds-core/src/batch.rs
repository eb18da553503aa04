//! Partitioning an identifier set into bounded batches

use crate::RecipientIdentifier;

/// Partition identifiers into ordered batches of at most `batch_size`.
///
/// The union of all batches equals the input (order preserved within each
/// batch), and the batch count is `ceil(len / batch_size)`. Each batch is
/// consumed exactly once by one discovery task.
///
/// # Panics
///
/// Panics if `batch_size` is zero.
pub fn partition(ids: &[RecipientIdentifier], batch_size: usize) -> Vec<Vec<RecipientIdentifier>> {
    assert!(batch_size > 0, "batch_size must be positive");

    ids.chunks(batch_size).map(|chunk| chunk.to_vec()).collect()
}
