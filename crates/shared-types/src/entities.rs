//! # Core Domain Entities
//!
//! Defines the card-fusion entities shared by every subsystem.
//!
//! ## Clusters
//!
//! - **Ledger**: `Address`, `ChainId`, `DeploymentInfo`, well-known chains
//! - **Cards**: `CardId`, `CardAttribute`, `CardStats`, `CardAttributeSet`
//! - **Ciphertexts**: `CiphertextHandle`, `FieldWidth`, `CardCiphertexts`

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// CLUSTER A: THE LEDGER
// =============================================================================

/// A 32-byte hash (Keccak-256).
pub type Hash = [u8; 32];

/// A 20-byte Ethereum-style address.
pub type Address = [u8; 20];

/// Numeric ledger network identifier.
pub type ChainId = u64;

/// The all-zero address, used as "unset".
pub const ZERO_ADDRESS: Address = [0u8; 20];

/// Local hardhat development network.
pub const HARDHAT_CHAIN_ID: ChainId = 31337;
/// Sepolia test network.
pub const SEPOLIA_CHAIN_ID: ChainId = 11_155_111;
/// Ethereum mainnet.
pub const MAINNET_CHAIN_ID: ChainId = 1;
/// Goerli test network (retired, still resolvable).
pub const GOERLI_CHAIN_ID: ChainId = 5;

/// Human-readable name for a well-known chain.
#[must_use]
pub fn chain_name(chain_id: ChainId) -> Option<&'static str> {
    match chain_id {
        HARDHAT_CHAIN_ID => Some("hardhat"),
        SEPOLIA_CHAIN_ID => Some("sepolia"),
        MAINNET_CHAIN_ID => Some("mainnet"),
        GOERLI_CHAIN_ID => Some("goerli"),
        _ => None,
    }
}

/// Render an address as `0x`-prefixed lowercase hex.
#[must_use]
pub fn format_address(address: &Address) -> String {
    format!("0x{}", hex::encode(address))
}

/// Where the card program lives on a given chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentInfo {
    /// Program address.
    pub address: Address,
    /// Chain the program is deployed on.
    pub chain_id: ChainId,
    /// Display name of the chain.
    pub chain_name: String,
}

// =============================================================================
// CLUSTER B: CARDS
// =============================================================================

/// Identifier assigned by the card program at mint/fuse time. Never reused.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct CardId(pub u64);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One of the four encrypted card attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CardAttribute {
    /// Attack strength.
    Attack,
    /// Defense strength.
    Defense,
    /// Rarity score.
    Rarity,
    /// Special power score.
    SpecialPower,
}

impl CardAttribute {
    /// All attributes in ledger argument order.
    pub const ALL: [CardAttribute; 4] = [
        CardAttribute::Attack,
        CardAttribute::Defense,
        CardAttribute::Rarity,
        CardAttribute::SpecialPower,
    ];

    /// Stable lowercase name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Attack => "attack",
            Self::Defense => "defense",
            Self::Rarity => "rarity",
            Self::SpecialPower => "special_power",
        }
    }
}

impl fmt::Display for CardAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Plaintext attribute values of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct CardStats {
    /// Attack value.
    pub attack: u64,
    /// Defense value.
    pub defense: u64,
    /// Rarity value.
    pub rarity: u64,
    /// Special power value.
    pub special_power: u64,
}

impl CardStats {
    /// Build stats from the four values.
    #[must_use]
    pub fn new(attack: u64, defense: u64, rarity: u64, special_power: u64) -> Self {
        Self {
            attack,
            defense,
            rarity,
            special_power,
        }
    }

    /// Value of a single attribute.
    #[must_use]
    pub fn get(&self, attribute: CardAttribute) -> u64 {
        match attribute {
            CardAttribute::Attack => self.attack,
            CardAttribute::Defense => self.defense,
            CardAttribute::Rarity => self.rarity,
            CardAttribute::SpecialPower => self.special_power,
        }
    }

    /// Values in [`CardAttribute::ALL`] order.
    #[must_use]
    pub fn values(&self) -> [(CardAttribute, u64); 4] {
        CardAttribute::ALL.map(|attribute| (attribute, self.get(attribute)))
    }
}

// =============================================================================
// CLUSTER C: CIPHERTEXTS
// =============================================================================

/// Opaque engine-issued reference to an encrypted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct CiphertextHandle(pub Hash);

impl CiphertextHandle {
    /// Raw handle bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &Hash {
        &self.0
    }
}

impl fmt::Display for CiphertextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}..", hex::encode(&self.0[..6]))
    }
}

/// Bit width of an encrypted integer field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldWidth {
    /// 8-bit unsigned.
    U8,
    /// 16-bit unsigned.
    U16,
    /// 32-bit unsigned.
    U32,
    /// 64-bit unsigned.
    U64,
}

impl FieldWidth {
    /// Number of bits.
    #[must_use]
    pub fn bits(&self) -> u32 {
        match self {
            Self::U8 => 8,
            Self::U16 => 16,
            Self::U32 => 32,
            Self::U64 => 64,
        }
    }

    /// Largest representable value.
    #[must_use]
    pub fn max_value(&self) -> u64 {
        match self {
            Self::U8 => u64::from(u8::MAX),
            Self::U16 => u64::from(u16::MAX),
            Self::U32 => u64::from(u32::MAX),
            Self::U64 => u64::MAX,
        }
    }

    /// Whether `value` is representable in this width.
    #[must_use]
    pub fn fits(&self, value: u64) -> bool {
        value <= self.max_value()
    }
}

impl fmt::Display for FieldWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "euint{}", self.bits())
    }
}

/// The four ciphertext handles of a card, as stored by the card program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct CardCiphertexts {
    /// Encrypted attack.
    pub attack: CiphertextHandle,
    /// Encrypted defense.
    pub defense: CiphertextHandle,
    /// Encrypted rarity.
    pub rarity: CiphertextHandle,
    /// Encrypted special power.
    pub special_power: CiphertextHandle,
}

impl CardCiphertexts {
    /// Build from handles in [`CardAttribute::ALL`] order.
    #[must_use]
    pub fn from_array(handles: [CiphertextHandle; 4]) -> Self {
        let [attack, defense, rarity, special_power] = handles;
        Self {
            attack,
            defense,
            rarity,
            special_power,
        }
    }

    /// Handle of a single attribute.
    #[must_use]
    pub fn get(&self, attribute: CardAttribute) -> CiphertextHandle {
        match attribute {
            CardAttribute::Attack => self.attack,
            CardAttribute::Defense => self.defense,
            CardAttribute::Rarity => self.rarity,
            CardAttribute::SpecialPower => self.special_power,
        }
    }

    /// Handles in [`CardAttribute::ALL`] order.
    #[must_use]
    pub fn handles(&self) -> [(CardAttribute, CiphertextHandle); 4] {
        CardAttribute::ALL.map(|attribute| (attribute, self.get(attribute)))
    }
}

/// Client-side visibility of one attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// Only the ciphertext handle is known.
    Sealed(CiphertextHandle),
    /// Decrypted value.
    Revealed(u64),
}

/// Visibility of a whole card.
///
/// Reveal is all-or-nothing per card: a card is `Sealed` until every one of
/// its four attributes has been decrypted, so a half-revealed card cannot be
/// represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardAttributeSet {
    /// No attribute is known in plaintext.
    Sealed(CardCiphertexts),
    /// Every attribute has been decrypted.
    Revealed {
        /// Handles the values were decrypted from.
        handles: CardCiphertexts,
        /// Decrypted values.
        stats: CardStats,
    },
}

impl CardAttributeSet {
    /// True while no plaintext is known.
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        matches!(self, Self::Sealed(_))
    }

    /// True once all four values are known.
    #[must_use]
    pub fn is_revealed(&self) -> bool {
        matches!(self, Self::Revealed { .. })
    }

    /// Ciphertext handles of the card.
    #[must_use]
    pub fn handles(&self) -> &CardCiphertexts {
        match self {
            Self::Sealed(handles) | Self::Revealed { handles, .. } => handles,
        }
    }

    /// Decrypted stats, if revealed.
    #[must_use]
    pub fn stats(&self) -> Option<&CardStats> {
        match self {
            Self::Sealed(_) => None,
            Self::Revealed { stats, .. } => Some(stats),
        }
    }

    /// Per-attribute view.
    #[must_use]
    pub fn field(&self, attribute: CardAttribute) -> AttributeValue {
        match self {
            Self::Sealed(handles) => AttributeValue::Sealed(handles.get(attribute)),
            Self::Revealed { stats, .. } => AttributeValue::Revealed(stats.get(attribute)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handles() -> CardCiphertexts {
        CardCiphertexts::from_array([
            CiphertextHandle([1u8; 32]),
            CiphertextHandle([2u8; 32]),
            CiphertextHandle([3u8; 32]),
            CiphertextHandle([4u8; 32]),
        ])
    }

    #[test]
    fn test_field_width_bounds() {
        assert!(FieldWidth::U8.fits(255));
        assert!(!FieldWidth::U8.fits(256));
        assert!(FieldWidth::U16.fits(65_535));
        assert!(!FieldWidth::U32.fits(u64::from(u32::MAX) + 1));
        assert!(FieldWidth::U64.fits(u64::MAX));
        assert_eq!(FieldWidth::U32.to_string(), "euint32");
    }

    #[test]
    fn test_well_known_chains() {
        assert_eq!(chain_name(HARDHAT_CHAIN_ID), Some("hardhat"));
        assert_eq!(chain_name(SEPOLIA_CHAIN_ID), Some("sepolia"));
        assert_eq!(chain_name(4242), None);
    }

    #[test]
    fn test_handles_follow_attribute_order() {
        let handles = handles();
        let ordered = handles.handles();
        assert_eq!(ordered[0], (CardAttribute::Attack, CiphertextHandle([1u8; 32])));
        assert_eq!(
            ordered[3],
            (CardAttribute::SpecialPower, CiphertextHandle([4u8; 32]))
        );
    }

    #[test]
    fn test_sealed_set_exposes_no_values() {
        let set = CardAttributeSet::Sealed(handles());
        assert!(set.is_sealed());
        assert!(set.stats().is_none());
        assert_eq!(
            set.field(CardAttribute::Rarity),
            AttributeValue::Sealed(CiphertextHandle([3u8; 32]))
        );
    }

    #[test]
    fn test_revealed_set_exposes_all_values() {
        let set = CardAttributeSet::Revealed {
            handles: handles(),
            stats: CardStats::new(50, 50, 10, 20),
        };
        assert!(set.is_revealed());
        assert_eq!(set.field(CardAttribute::SpecialPower), AttributeValue::Revealed(20));
        assert_eq!(set.handles(), &handles());
    }

    #[test]
    fn test_display_formats() {
        assert_eq!(CardId(7).to_string(), "#7");
        assert_eq!(format_address(&[0xab; 20]), format!("0x{}", "ab".repeat(20)));
        assert!(CiphertextHandle([0xff; 32]).to_string().starts_with("0xffffff"));
    }
}
