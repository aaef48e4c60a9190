use std::{fmt, ops::Range, rc::Rc};

/// Display name of a binder or free variable.
pub type Name = Rc<str>;

/// Byte range into source text.
#[derive(Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Whether this span can be annotated on `source`.
    pub fn within(&self, source: &str) -> bool {
        self.start <= self.end
            && self.end <= source.len()
            && source.is_char_boundary(self.start)
            && source.is_char_boundary(self.end)
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// de Bruijn index: distance from the innermost binder, counted across
/// type binders and term binders alike.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Idx(pub usize);

impl Idx {
    pub const ZERO: Self = Self(0);

    /// Adds `delta` to the index.
    ///
    /// # Panics
    /// When the result would be negative, which can only happen when a binder
    /// that is still referenced gets discarded.
    #[must_use]
    pub fn shifted(self, delta: isize) -> Self {
        Self(
            self.0
                .checked_add_signed(delta)
                .expect("index shifted below zero: a referenced binder was discarded"),
        )
    }

    #[must_use]
    pub fn succ(self) -> Self {
        Self(self.0 + 1)
    }

    /// Number of binders between this index and the current depth,
    /// including the referenced binder itself.
    pub fn distance(self) -> isize {
        isize::try_from(self.0 + 1).expect("index fits in isize")
    }
}

impl fmt::Debug for Idx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for Idx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
