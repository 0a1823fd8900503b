//! Contribution entries and their aggregation
//!
//! Third parties feed values into a target service's collection argument in
//! one of three shapes: unordered, ordered (with before/after constraints),
//! or mapped (key/value, duplicate keys rejected). The raw entries are
//! captured at assembly time; [`ContributionSet::resolve`] turns them into
//! the final collection while the target service is being built.

use crate::context::{ResolvedContributions, ServiceContext, ServiceValue};
use crate::error::{Error, Result};
use crate::ordering::{self, ConstraintItem};
use crate::slot::BoxedBuilder;
use indexmap::IndexMap;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A boxed, type-erased key builder for mapped contributions
pub type BoxedKeyBuilder =
    Box<dyn for<'a> FnOnce(&ServiceContext<'a>) -> Result<ContributionKey> + Send>;

/// Erase a typed key builder into a [`BoxedKeyBuilder`].
///
/// The key type's own `Eq`/`Hash` contract decides duplicate detection; its
/// `Debug` rendering appears in duplicate-key errors.
pub fn boxed_key_builder<K, F>(build: F) -> BoxedKeyBuilder
where
    K: Eq + Hash + fmt::Debug + Send + Sync + 'static,
    F: for<'a> FnOnce(&ServiceContext<'a>) -> Result<K> + Send + 'static,
{
    Box::new(move |ctx| Ok(ContributionKey::new(build(ctx)?)))
}

/// A type-erased mapped-contribution key.
///
/// Carries a precomputed hash, a monomorphized equality function, and a
/// `Debug` rendering so keys of any `Eq + Hash` type compare by their own
/// contract after erasure.
pub struct ContributionKey {
    value: ServiceValue,
    hash: u64,
    rendered: String,
    eq_fn: fn(&ContributionKey, &ContributionKey) -> bool,
}

impl ContributionKey {
    /// Erase a typed key
    pub fn new<K: Eq + Hash + fmt::Debug + Send + Sync + 'static>(key: K) -> Self {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        Self {
            hash: hasher.finish(),
            rendered: format!("{key:?}"),
            eq_fn: eq_impl::<K>,
            value: Arc::new(key),
        }
    }

    /// Borrow the key as its original type
    pub fn downcast_ref<K: 'static>(&self) -> Option<&K> {
        self.value.downcast_ref::<K>()
    }
}

fn eq_impl<K: Eq + 'static>(a: &ContributionKey, b: &ContributionKey) -> bool {
    match (a.value.downcast_ref::<K>(), b.value.downcast_ref::<K>()) {
        (Some(left), Some(right)) => left == right,
        _ => false,
    }
}

impl PartialEq for ContributionKey {
    fn eq(&self, other: &Self) -> bool {
        (self.eq_fn)(self, other)
    }
}

impl Eq for ContributionKey {}

impl Hash for ContributionKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl fmt::Debug for ContributionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}

impl fmt::Display for ContributionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}

/// An unordered contribution: just a value builder
pub struct UnorderedEntry {
    /// Contributor-chosen name, for diagnostics only
    pub name: String,
    /// Builds the contributed value
    pub build: BoxedBuilder,
}

/// An ordered contribution: a value builder plus ordering constraints
pub struct OrderedEntry {
    /// Name other entries can constrain against; empty gets a synthetic name
    pub name: String,
    /// Builds the contributed value
    pub build: BoxedBuilder,
    /// Names this entry must precede (`*` for all others)
    pub before: Vec<String>,
    /// Names this entry must follow (`*` for all others)
    pub after: Vec<String>,
}

/// A mapped contribution: a key builder and a value builder
pub struct MappedEntry {
    /// Contributor-chosen name, for diagnostics only
    pub name: String,
    /// Builds the map key
    pub build_key: BoxedKeyBuilder,
    /// Builds the map value
    pub build_value: BoxedBuilder,
}

/// The contribution shape declared for one target service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContributionKind {
    /// Aggregated into an unordered collection
    Unordered,
    /// Aggregated into a constraint-ordered list
    Ordered,
    /// Aggregated into an insertion-ordered map
    Mapped,
}

impl fmt::Display for ContributionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unordered => f.write_str("unordered"),
            Self::Ordered => f.write_str("ordered"),
            Self::Mapped => f.write_str("mapped"),
        }
    }
}

/// Every contribution entry collected for one target service
pub enum ContributionSet {
    /// Unordered entries, kept in declaration order
    Unordered(Vec<UnorderedEntry>),
    /// Ordered entries awaiting constraint solving
    Ordered(Vec<OrderedEntry>),
    /// Mapped entries, kept in declaration order
    Mapped(Vec<MappedEntry>),
}

impl ContributionSet {
    /// The shape of this set
    pub fn kind(&self) -> ContributionKind {
        match self {
            Self::Unordered(_) => ContributionKind::Unordered,
            Self::Ordered(_) => ContributionKind::Ordered,
            Self::Mapped(_) => ContributionKind::Mapped,
        }
    }

    /// Build the final collection for the target service.
    ///
    /// Consumes the entries; a set resolves at most once, during its target
    /// slot's single construction. Empty input yields an empty collection.
    pub fn resolve(self, ctx: &ServiceContext<'_>) -> Result<ResolvedContributions> {
        match self {
            Self::Unordered(entries) => {
                let values = entries
                    .into_iter()
                    .map(|entry| (entry.build)(ctx))
                    .collect::<Result<Vec<_>>>()?;
                Ok(ResolvedContributions::Unordered(values))
            }
            Self::Ordered(entries) => Ok(ResolvedContributions::Ordered(resolve_ordered(
                entries, ctx,
            )?)),
            Self::Mapped(entries) => {
                let mut map: IndexMap<ContributionKey, ServiceValue> =
                    IndexMap::with_capacity(entries.len());
                for entry in entries {
                    let key = (entry.build_key)(ctx)?;
                    if map.contains_key(&key) {
                        return Err(Error::duplicate_key(
                            ctx.service_id().as_str(),
                            key.to_string(),
                        ));
                    }
                    let value = (entry.build_value)(ctx)?;
                    map.insert(key, value);
                }
                Ok(ResolvedContributions::Mapped(map))
            }
        }
    }
}

fn resolve_ordered(entries: Vec<OrderedEntry>, ctx: &ServiceContext<'_>) -> Result<Vec<ServiceValue>> {
    // Entries without a name get a stable synthetic one before solving.
    let named: Vec<(String, OrderedEntry)> = entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let name = if entry.name.is_empty() {
                format!("contribution-{index}")
            } else {
                entry.name.clone()
            };
            (name, entry)
        })
        .collect();

    let items: Vec<ConstraintItem> = named
        .iter()
        .map(|(name, entry)| ConstraintItem {
            name: name.clone(),
            before: entry.before.clone(),
            after: entry.after.clone(),
        })
        .collect();
    let order = ordering::solve(&items)?;

    let mut by_name: IndexMap<String, OrderedEntry> = named.into_iter().collect();
    let mut values = Vec::with_capacity(order.len());
    for name in order {
        let entry = by_name.shift_remove(&name).ok_or_else(|| {
            Error::internal(format!("Ordering solver returned unknown name '{name}'"))
        })?;
        values.push((entry.build)(ctx)?);
    }
    Ok(values)
}
