//! # Post-Operation Reconciliation
//!
//! After a confirmed transaction the controller re-reads the owned set and
//! checks it against what the operation should have produced. A mismatch is
//! reported, never patched over.

use shared_types::CardId;
use std::collections::BTreeSet;

fn appeared(before: &BTreeSet<CardId>, after: &BTreeSet<CardId>) -> Vec<CardId> {
    after.difference(before).copied().collect()
}

fn describe(cards: &[CardId]) -> String {
    cards
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A mint must add exactly the receipt's card.
pub fn verify_mint(
    before: &BTreeSet<CardId>,
    after: &BTreeSet<CardId>,
    receipt: CardId,
) -> Result<CardId, String> {
    match appeared(before, after).as_slice() {
        [card] if *card == receipt => Ok(receipt),
        [] => Err(format!("minted card {receipt} not found in owned set")),
        new => Err(format!(
            "expected {receipt} as the only new card, found [{}]",
            describe(new)
        )),
    }
}

/// A fusion must remove both parents and add exactly the receipt's card.
pub fn verify_fuse(
    before: &BTreeSet<CardId>,
    after: &BTreeSet<CardId>,
    parents: (CardId, CardId),
    receipt: CardId,
) -> Result<CardId, String> {
    let survivors: Vec<CardId> = [parents.0, parents.1]
        .into_iter()
        .filter(|parent| after.contains(parent))
        .collect();
    if !survivors.is_empty() {
        return Err(format!(
            "parent card(s) [{}] still owned after fusion",
            describe(&survivors)
        ));
    }

    match appeared(before, after).as_slice() {
        [card] if *card == receipt => Ok(receipt),
        [] => Err(format!("fused card {receipt} not found in owned set")),
        new => Err(format!(
            "expected {receipt} as the only new card, found [{}]",
            describe(new)
        )),
    }
}
