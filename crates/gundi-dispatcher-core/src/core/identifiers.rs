// crates/gundi-dispatcher-core/src/core/identifiers.rs
// ============================================================================
// Module: Gundi Dispatcher Identifiers
// Description: Canonical opaque identifiers for observations and integrations.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: serde, uuid
// ============================================================================

//! ## Overview
//! Identifiers crossing the dispatcher are opaque UTF-8 strings on the wire
//! (usually UUIDs minted by upstream Gundi services). The types exist so that a
//! `gundi_id` can never be passed where a `destination_id` is expected.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

// ============================================================================
// SECTION: Identifier Macro
// ============================================================================

/// Declares an opaque string identifier newtype.
macro_rules! string_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

string_identifier! {
    /// Canonical Gundi object identifier assigned upstream.
    ///
    /// # Invariants
    /// - Opaque UTF-8 string; no normalization or validation is applied by this type.
    GundiId
}

impl GundiId {
    /// Mints a random id for legacy messages that carry none.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

string_identifier! {
    /// Destination integration identifier.
    ///
    /// # Invariants
    /// - Opaque UTF-8 string; one destination maps to one integration config.
    DestinationId
}

string_identifier! {
    /// Data provider (inbound integration) identifier.
    ///
    /// # Invariants
    /// - Opaque UTF-8 string; carried through to system events unchanged.
    DataProviderId
}

string_identifier! {
    /// Provider key presented to the destination platform.
    ///
    /// # Invariants
    /// - Opaque UTF-8 string; selects the source/provider bucket on the destination.
    ProviderKey
}

string_identifier! {
    /// Identifier returned by the destination platform for a delivered object.
    ///
    /// # Invariants
    /// - Opaque UTF-8 string; numeric ids are stringified on capture.
    ExternalId
}
