//! Stringly-keyed identifier newtypes.
//!
//! Every identifier in the spec (instance, actor, player, character,
//! gear, class, gear-def, set, slot, stat, resource key, transaction)
//! is a stable string. Wrapping each in its own type, rather than
//! passing bare `String`s everywhere, keeps e.g. a `PlayerId` from
//! being accidentally compared against a `CharacterId`.

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[derive(serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl core::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

id_type!(
    /// Identifies a single game instance (e.g. "instance_001").
    InstanceId
);
id_type!(
    /// Identifies an actor (credential holder) within one instance.
    ActorId
);
id_type!(
    /// Identifies a player, globally unique within the instance.
    PlayerId
);
id_type!(
    /// Identifies a character, unique within its owning player.
    CharacterId
);
id_type!(
    /// Identifies a gear instance, unique within its owning player.
    GearId
);
id_type!(
    /// Identifies a class definition in the active config.
    ClassId
);
id_type!(
    /// Identifies a gear definition in the active config.
    GearDefId
);
id_type!(
    /// Identifies a set of gearDefs sharing tiered bonuses.
    SetId
);
id_type!(
    /// Identifies an equipment slot (e.g. "right_hand").
    SlotId
);
id_type!(
    /// Identifies a stat name (e.g. "strength").
    StatName
);
id_type!(
    /// Identifies a resource wallet key, possibly dotted by scope.
    ResourceKey
);
id_type!(
    /// Identifies a transaction for idempotency purposes.
    TxId
);
id_type!(
    /// Identifies a configuration version.
    ConfigId
);
