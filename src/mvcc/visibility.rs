//! MVCC Visibility - One rule, two views
//!
//! A version `V` is visible to transaction `T` under read view `R` iff:
//! 1. `V.tx_min == T`, or `V.tx_min` is committed in `R`
//! 2. `V.tx_max` is unset, or it is neither `T` nor committed in `R`
//!
//! Among the visible versions of an item, the one with the greatest
//! `tx_min` wins (ties broken by creation order).
//!
//! Snapshot isolation and read committed share this rule and differ only in
//! which `R` they pass: the view captured at `Begin`, or a view of the
//! global committed set at the instant of the read.

use super::{ReadView, TxId, Version, VersionChain, VersionId};

/// Result of visibility evaluation for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisibilityResult<'a> {
    /// A visible version exists
    Visible(&'a Version),
    /// Nothing in the chain is visible to the reader
    Invisible,
}

impl<'a> VisibilityResult<'a> {
    /// Returns the visible version if any
    pub fn version(&self) -> Option<&'a Version> {
        match self {
            VisibilityResult::Visible(v) => Some(v),
            VisibilityResult::Invisible => None,
        }
    }

    pub fn is_visible(&self) -> bool {
        matches!(self, VisibilityResult::Visible(_))
    }
}

/// Stateless visibility resolver.
///
/// Identical inputs always produce identical results.
pub struct Visibility;

impl Visibility {
    /// Checks a single version against a reader and its view.
    pub fn is_version_visible(version: &Version, reader: TxId, view: &ReadView) -> bool {
        let created = version.tx_min() == reader || view.is_committed(version.tx_min());
        let superseded = match version.tx_max() {
            None => false,
            Some(max) => max == reader || view.is_committed(max),
        };
        created && !superseded
    }

    /// Picks the version of `chain` that `reader` sees under `view`.
    pub fn visible_version<'a>(
        chain: &'a VersionChain,
        reader: TxId,
        view: &ReadView,
    ) -> VisibilityResult<'a> {
        chain
            .versions()
            .iter()
            .enumerate()
            .filter(|(_, v)| Self::is_version_visible(v, reader, view))
            .max_by_key(|(pos, v)| (v.tx_min(), *pos))
            .map(|(_, v)| VisibilityResult::Visible(v))
            .unwrap_or(VisibilityResult::Invisible)
    }

    /// The version a new write by `writer` supersedes.
    ///
    /// This is the version the writer would read.
    pub fn write_base(chain: &VersionChain, writer: TxId, view: &ReadView) -> Option<VersionId> {
        Self::visible_version(chain, writer, view)
            .version()
            .map(Version::id)
    }

    /// Returns the transaction that already superseded `base`, if it is not `writer`.
    ///
    /// A `Some` here is a write-write conflict.
    pub fn conflicting_writer(base: &Version, writer: TxId) -> Option<TxId> {
        base.tx_max().filter(|max| *max != writer)
    }
}
