//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_str_id!` macro to create type-safe ID wrappers that
//! prevent accidentally mixing IDs from different entity types. All IDs in
//! this system are opaque strings: auth uids come from the identity
//! provider, order IDs are assigned by the document store, and line-item
//! IDs are derived from the item's configuration.

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `Display` and `From<&str>`/`From<String>` implementations
///
/// # Example
///
/// ```rust
/// # use orchard_core::define_str_id;
/// define_str_id!(WarehouseId);
///
/// let id = WarehouseId::new("wh-1");
/// assert_eq!(id.as_str(), "wh-1");
/// ```
#[macro_export]
macro_rules! define_str_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from a string value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the ID as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID, returning the underlying string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

define_str_id!(UserId);
define_str_id!(OrderId);
define_str_id!(LineItemId);

impl LineItemId {
    /// Derive the cart line-item ID for a purchasable configuration.
    ///
    /// The ID is a composite of `(product_id, color, storage)` joined with
    /// underscores, with every run of whitespace collapsed to a single
    /// underscore. Two items with the same configuration always derive the
    /// same ID, which is what makes repeated adds merge instead of
    /// duplicating lines.
    #[must_use]
    pub fn derive(product_id: &str, color: &str, storage: &str) -> Self {
        let raw = format!("{product_id}_{color}_{storage}");
        let mut normalized = String::with_capacity(raw.len());
        let mut in_whitespace = false;
        for c in raw.chars() {
            if c.is_whitespace() {
                if !in_whitespace {
                    normalized.push('_');
                }
                in_whitespace = true;
            } else {
                normalized.push(c);
                in_whitespace = false;
            }
        }
        Self::new(normalized)
    }
}
