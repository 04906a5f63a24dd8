//! Parallel verification of independent proofs
//!
//! Items are verified on the rayon pool; output position `i` always
//! corresponds to input position `i`, and one item's failure never affects
//! another's result.
//!
//! ## Example
//!
//! ```rust
//! use veil_zk::{prove_range, verify_proofs_parallel, StatementKind};
//!
//! let good = prove_range(10, 0, 20).unwrap().to_bytes().unwrap();
//! let items = vec![
//!     (good.clone(), StatementKind::Range),
//!     (good, StatementKind::Equality),
//!     (vec![0xde, 0xad], StatementKind::Range),
//! ];
//! assert_eq!(verify_proofs_parallel(&items), vec![true, false, false]);
//! ```

use rayon::prelude::*;

use crate::composite::{verify_composite, CompositeProof};
use crate::error::Result;
use crate::proof::{Proof, StatementKind};
use crate::statement::verify_as;

/// Verify one encoded proof claimed to be of `kind`
///
/// Unparseable bytes are an error; a parsed proof that fails is `Ok(false)`.
pub fn verify_proof(bytes: &[u8], kind: StatementKind) -> Result<bool> {
    match kind {
        StatementKind::Composite => {
            let composite = CompositeProof::from_bytes(bytes)?;
            Ok(verify_composite(&composite))
        }
        _ => {
            let proof = Proof::from_bytes(bytes)?;
            Ok(verify_as(&proof, kind))
        }
    }
}

/// Verify all items concurrently; malformed items report `false`
pub fn verify_proofs_parallel(items: &[(Vec<u8>, StatementKind)]) -> Vec<bool> {
    items
        .par_iter()
        .map(|(bytes, kind)| matches!(verify_proof(bytes, *kind), Ok(true)))
        .collect()
}

/// Verify all items concurrently, keeping parse errors per item
pub fn verify_proofs_parallel_detailed(items: &[(Vec<u8>, StatementKind)]) -> Vec<Result<bool>> {
    items
        .par_iter()
        .map(|(bytes, kind)| verify_proof(bytes, *kind))
        .collect()
}

/// `Ok(())` if every item verifies, otherwise the lowest failing index
///
/// Workers stop picking up new items once any failure is found.
pub fn verify_all_or_first_failure(items: &[(Vec<u8>, StatementKind)]) -> std::result::Result<(), usize> {
    first_failure_with(items, verify_proof)
}

/// [`verify_all_or_first_failure`] with a caller-supplied verifier
pub fn first_failure_with<F>(items: &[(Vec<u8>, StatementKind)], verify: F) -> std::result::Result<(), usize>
where
    F: Fn(&[u8], StatementKind) -> Result<bool> + Sync,
{
    match items
        .par_iter()
        .enumerate()
        .find_first(|(_, (bytes, kind))| !matches!(verify(bytes, *kind), Ok(true)))
    {
        Some((index, _)) => Err(index),
        None => Ok(()),
    }
}
