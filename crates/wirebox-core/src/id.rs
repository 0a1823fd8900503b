//! Service identity value objects
//!
//! A service is addressed two ways: by a unique, case-normalized string id,
//! or by its declared nominal type. `ServiceId` keeps the declared spelling
//! for display while comparing, hashing, and ordering on a lowercase fold.

use std::any::TypeId;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Unique string key for one logical service instance.
///
/// Equality and ordering are case-insensitive; `Display` preserves the
/// spelling used at declaration time.
#[derive(Debug, Clone)]
pub struct ServiceId {
    raw: String,
    normalized: String,
}

impl ServiceId {
    /// Create a service id from its declared spelling
    pub fn new<S: Into<String>>(raw: S) -> Self {
        let raw = raw.into();
        let normalized = raw.to_lowercase();
        Self { raw, normalized }
    }

    /// The declared spelling of the id
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl PartialEq for ServiceId {
    fn eq(&self, other: &Self) -> bool {
        self.normalized == other.normalized
    }
}

impl Eq for ServiceId {}

impl Hash for ServiceId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized.hash(state);
    }
}

impl PartialOrd for ServiceId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ServiceId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.normalized.cmp(&other.normalized)
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for ServiceId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for ServiceId {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

/// Declared nominal type of a service value.
///
/// Equality and hashing use the `TypeId`; the captured type name is carried
/// for diagnostics and introspection.
#[derive(Debug, Clone, Copy)]
pub struct ServiceType {
    type_id: TypeId,
    name: &'static str,
}

impl ServiceType {
    /// The service type of `T`
    pub fn of<T: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The `TypeId` backing equality
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The full type name, as produced by `std::any::type_name`
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ServiceType {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ServiceType {}

impl Hash for ServiceType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl PartialOrd for ServiceType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ServiceType {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(other.name)
            .then_with(|| self.type_id.cmp(&other.type_id))
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Default service id for a bound type: the last path segment of the type
/// name, generics stripped, with the first character lowercased
/// (`MapBean` becomes `mapBean`, `String` becomes `string`).
pub fn default_service_id<T: 'static>() -> ServiceId {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    let simple = base.rsplit("::").next().unwrap_or(base);
    ServiceId::new(decapitalize(simple))
}

fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
