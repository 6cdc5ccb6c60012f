//! Transaction rejection codes (§7 "Precondition (domain, 200 envelope,
//! accepted=false)").
//!
//! Every variant here maps to a domain rejection: the processor catches
//! these, never propagates them past [`super::processor::process`], and
//! folds them into the `{txId, accepted:false, stateVersion, errorCode,
//! errorMessage}` envelope. Transport/auth failures (401/400/404/500)
//! are not modeled here — see [`super::processor::TxResponse`].

use crate::error::{ErrorSeverity, GameError};
use crate::ids::{CharacterId, ClassId, GearDefId, GearId, PlayerId, SlotId};

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum TxError {
    #[error("actor '{0}' already exists")]
    ActorAlreadyExists(String),

    #[error("player '{0}' already exists")]
    PlayerAlreadyExists(PlayerId),

    #[error("character '{0}' already exists")]
    CharacterAlreadyExists(CharacterId),

    #[error("gear '{0}' already exists")]
    GearAlreadyExists(GearId),

    #[error("apiKey is already in use by another actor")]
    DuplicateApiKey,

    #[error("player '{0}' not found")]
    PlayerNotFound(PlayerId),

    #[error("character '{0}' not found")]
    CharacterNotFound(CharacterId),

    #[error("gear '{0}' not found")]
    GearNotFound(GearId),

    #[error("gear '{0}' is already equipped")]
    GearAlreadyEquipped(GearId),

    #[error("gear '{0}' is not equipped")]
    GearNotEquipped(GearId),

    #[error("gear '{gear}' is equipped by '{holder}', not '{requested}'")]
    CharacterMismatch {
        gear: GearId,
        holder: CharacterId,
        requested: CharacterId,
    },

    #[error("actor does not own player '{0}'")]
    OwnershipViolation(PlayerId),

    #[error("config reference '{0}' does not resolve in the active config")]
    InvalidConfigReference(String),

    #[error("slot '{0}' is not declared in the active config")]
    InvalidSlot(SlotId),

    #[error("gear '{gear_def}' is not compatible with the requested slot pattern")]
    SlotIncompatible { gear_def: GearDefId },

    #[error("slot '{0}' is already occupied")]
    SlotOccupied(SlotId),

    #[error("restriction failed: {0}")]
    RestrictionFailed(&'static str),

    #[error("level {requested} exceeds maxLevel {max}")]
    MaxLevelReached { requested: u32, max: u32 },

    #[error("insufficient resources: missing {0:?}")]
    InsufficientResources(Vec<String>),

    #[error("class '{0}' is not declared in the active config")]
    UnknownClass(ClassId),

    #[error("unsupported transaction type '{0}'")]
    UnsupportedTxType(String),

    #[error("malformed body for transaction type '{type_name}': {reason}")]
    MalformedBody { type_name: String, reason: String },
}

impl GameError for TxError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Precondition
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::ActorAlreadyExists(_)
            | Self::PlayerAlreadyExists(_)
            | Self::CharacterAlreadyExists(_)
            | Self::GearAlreadyExists(_) => "ALREADY_EXISTS",
            Self::DuplicateApiKey => "DUPLICATE_API_KEY",
            Self::PlayerNotFound(_) => "PLAYER_NOT_FOUND",
            Self::CharacterNotFound(_) => "CHARACTER_NOT_FOUND",
            Self::GearNotFound(_) => "GEAR_NOT_FOUND",
            Self::GearAlreadyEquipped(_) => "GEAR_ALREADY_EQUIPPED",
            Self::GearNotEquipped(_) => "GEAR_NOT_EQUIPPED",
            Self::CharacterMismatch { .. } => "CHARACTER_MISMATCH",
            Self::OwnershipViolation(_) => "OWNERSHIP_VIOLATION",
            Self::InvalidConfigReference(_) | Self::UnknownClass(_) => "INVALID_CONFIG_REFERENCE",
            Self::InvalidSlot(_) => "INVALID_SLOT",
            Self::SlotIncompatible { .. } => "SLOT_INCOMPATIBLE",
            Self::SlotOccupied(_) => "SLOT_OCCUPIED",
            Self::RestrictionFailed(_) => "RESTRICTION_FAILED",
            Self::MaxLevelReached { .. } => "MAX_LEVEL_REACHED",
            Self::InsufficientResources(_) => "INSUFFICIENT_RESOURCES",
            Self::UnsupportedTxType(_) => "UNSUPPORTED_TX_TYPE",
            Self::MalformedBody { .. } => "MALFORMED_REQUEST",
        }
    }
}
