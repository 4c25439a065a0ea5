//! The effect lattice.

use kiln_ast::ast::Callee;
use kiln_data_structures::map::FxIndexMap;
use std::fmt;
use strum::IntoEnumIterator;

bitflags::bitflags! {
    /// A set of side effects of a tree node or method.
    ///
    /// Sets form a lattice under union with [`NONE`](Self::NONE) as identity and
    /// [`ALL`](Self::ALL) as the absorbing, conservative element.
    #[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct EffectSet: u8 {
        /// Reads a local variable or parameter.
        const READ_LOCAL   = 1 << 0;
        /// Writes a local variable or parameter.
        const WRITE_LOCAL  = 1 << 1;
        /// Reads heap or static state: fields and array elements.
        const READ_GLOBAL  = 1 << 2;
        /// Writes heap or static state.
        const WRITE_GLOBAL = 1 << 3;
        /// May throw.
        const EXCEPTION    = 1 << 4;
    }
}

impl EffectSet {
    /// No effects.
    pub const NONE: Self = Self::empty();
    /// Every effect.
    pub const ALL: Self = Self::all();

    const LOCAL: Self = Self::READ_LOCAL.union(Self::WRITE_LOCAL);
    const WRITES: Self = Self::WRITE_LOCAL.union(Self::WRITE_GLOBAL);

    /// Returns the effects of `self` that are not in `other`.
    #[inline]
    #[must_use]
    pub const fn subtract(self, other: Self) -> Self {
        self.difference(other)
    }

    /// Returns an iterator over the kinds in the set.
    pub fn kinds(self) -> impl Iterator<Item = EffectKind> {
        EffectKind::iter().filter(move |kind| self.contains(kind.to_set()))
    }

    /// Returns `true` if evaluating the node has no observable effect besides reading locals.
    #[inline]
    pub const fn is_pure(self) -> bool {
        self.difference(Self::READ_LOCAL).is_empty()
    }

    /// Returns `true` if the set writes any storage.
    #[inline]
    pub const fn has_writes(self) -> bool {
        self.intersects(Self::WRITES)
    }

    /// Returns the effects visible to a caller: a method's accesses to its own locals are not.
    #[inline]
    #[must_use]
    pub const fn callee_visible(self) -> Self {
        self.difference(Self::LOCAL)
    }
}

impl fmt::Debug for EffectSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EffectSet({self})")
    }
}

impl fmt::Display for EffectSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        for (i, kind) in self.kinds().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{kind}")?;
        }
        Ok(())
    }
}

impl From<EffectKind> for EffectSet {
    fn from(kind: EffectKind) -> Self {
        kind.to_set()
    }
}

/// A single kind of side effect.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumIter,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum EffectKind {
    ReadLocal,
    WriteLocal,
    ReadGlobal,
    WriteGlobal,
    Exception,
}

impl EffectKind {
    /// Returns the singleton set of this kind.
    pub const fn to_set(self) -> EffectSet {
        match self {
            Self::ReadLocal => EffectSet::READ_LOCAL,
            Self::WriteLocal => EffectSet::WRITE_LOCAL,
            Self::ReadGlobal => EffectSet::READ_GLOBAL,
            Self::WriteGlobal => EffectSet::WRITE_GLOBAL,
            Self::Exception => EffectSet::EXCEPTION,
        }
    }
}

/// Looks up the externally visible effects of called methods.
pub trait CalleeEffects {
    /// Returns the effects of calling `callee`, or `None` if the method was not analyzed.
    ///
    /// Unanalyzed methods are assumed to have [every effect](EffectSet::ALL).
    fn effects_of(&self, callee: &Callee) -> Option<EffectSet>;
}

impl<T: CalleeEffects + ?Sized> CalleeEffects for &T {
    fn effects_of(&self, callee: &Callee) -> Option<EffectSet> {
        (**self).effects_of(callee)
    }
}

/// Knows no method: every call has every effect.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoSignatures;

impl CalleeEffects for NoSignatures {
    fn effects_of(&self, _callee: &Callee) -> Option<EffectSet> {
        None
    }
}

/// Pre-computed effect signatures, for example of already analyzed bodies.
///
/// Signatures are kept in insertion order.
#[derive(Clone, Debug, Default)]
pub struct SignatureTable {
    map: FxIndexMap<Callee, EffectSet>,
}

impl SignatureTable {
    /// Creates a new empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the effects of a method. Local effects are stripped.
    ///
    /// Returns the previously recorded effects, if any.
    pub fn insert(&mut self, callee: Callee, effects: EffectSet) -> Option<EffectSet> {
        self.map.insert(callee, effects.callee_visible())
    }

    pub fn get(&self, callee: &Callee) -> Option<EffectSet> {
        self.map.get(callee).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns an iterator over the recorded signatures, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Callee, EffectSet)> + '_ {
        self.map.iter().map(|(callee, &effects)| (callee, effects))
    }
}

impl CalleeEffects for SignatureTable {
    fn effects_of(&self, callee: &Callee) -> Option<EffectSet> {
        self.get(callee)
    }
}

impl FromIterator<(Callee, EffectSet)> for SignatureTable {
    fn from_iter<I: IntoIterator<Item = (Callee, EffectSet)>>(iter: I) -> Self {
        let mut table = Self::new();
        table.extend(iter);
        table
    }
}

impl Extend<(Callee, EffectSet)> for SignatureTable {
    fn extend<I: IntoIterator<Item = (Callee, EffectSet)>>(&mut self, iter: I) {
        for (callee, effects) in iter {
            self.insert(callee, effects);
        }
    }
}
