//! # Owned Set Reconciliation
//!
//! A fresh read replaces the owned set wholesale. Revealed stats carry over
//! only for cards that are still owned and whose ciphertexts are unchanged.

use shared_types::{CardAttributeSet, CardCiphertexts, CardId};
use std::collections::BTreeMap;

/// Rebuild the owned set from `fresh`, carrying reveals over from `previous`.
pub fn merge_owned(
    previous: &BTreeMap<CardId, CardAttributeSet>,
    fresh: &BTreeMap<CardId, CardCiphertexts>,
) -> BTreeMap<CardId, CardAttributeSet> {
    fresh
        .iter()
        .map(|(card, handles)| {
            let attributes = match previous.get(card) {
                Some(CardAttributeSet::Revealed {
                    handles: known,
                    stats,
                }) if known == handles => CardAttributeSet::Revealed {
                    handles: *handles,
                    stats: *stats,
                },
                _ => CardAttributeSet::Sealed(*handles),
            };
            (*card, attributes)
        })
        .collect()
}
