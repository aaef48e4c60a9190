//! Binding contexts shared by the named and the indexed representations.
//!
//! NOTE: type binders and term binders live in a *single* index space. A
//! [`Context`] holds both kinds interleaved in the order they were introduced,
//! and an [`Idx`] counts every binder between a variable and its own binder,
//! whatever their kind. Looking a term variable up and landing on a type
//! binder (or the reverse) is therefore an inconsistency, never a miss to be
//! skipped over.

use std::{borrow::Borrow, fmt, panic::Location, rc::Rc};

use derive_where::derive_where;

use crate::reprs::common::Idx;

/// Persistent cons-list: pushing shares the tail, so every previously
/// published stack stays valid.
#[derive_where(Clone, Default)]
pub struct Stack<T>(Option<Rc<Node<T>>>);

struct Node<T> {
    head: T,
    tail: Stack<T>,
    len: usize,
}

impl<T> Stack<T> {
    pub fn new() -> Self {
        Self(None)
    }

    #[must_use]
    pub fn push(&self, head: T) -> Self {
        Self(Some(Rc::new(Node {
            head,
            tail: self.clone(),
            len: self.len() + 1,
        })))
    }

    /// The most recently pushed element and the stack below it.
    pub fn pop(&self) -> Option<(&T, &Self)> {
        self.0.as_deref().map(|node| (&node.head, &node.tail))
    }

    pub fn len(&self) -> usize {
        self.0.as_ref().map_or(0, |node| node.len)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    pub fn get(&self, index: Idx) -> Option<&T> {
        self.iter().nth(index.0)
    }

    /// Position of the most recently pushed element satisfying `pred`.
    pub fn find(&self, mut pred: impl FnMut(&T) -> bool) -> Option<Idx> {
        self.iter().position(|e| pred(e)).map(Idx)
    }

    /// Iterates from the most recently pushed element down to the oldest.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter(self)
    }

    /// Whether both stacks are the very same list.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Stack<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Builds a stack whose *last* element ends up on top.
impl<T> FromIterator<T> for Stack<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        iter.into_iter().fold(Self::new(), |stack, e| stack.push(e))
    }
}

pub struct Iter<'s, T>(&'s Stack<T>);

impl<'s, T> Iterator for Iter<'s, T> {
    type Item = &'s T;

    fn next(&mut self) -> Option<Self::Item> {
        let (head, tail) = self.0.pop()?;
        self.0 = tail;
        Some(head)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.0.len(), Some(self.0.len()))
    }
}

impl<'s, T> IntoIterator for &'s Stack<T> {
    type Item = &'s T;
    type IntoIter = Iter<'s, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A context entry.
///
/// The named context instantiates `N` with [`Name`][crate::reprs::common::Name]
/// and the indexed context with `()`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Binding<N, Ty, Tm> {
    /// Introduces a type variable.
    Type { name: N },
    /// Introduces a term variable. With a `definition` the binder is
    /// transparent and may be unfolded during reduction.
    Term {
        name: N,
        ty: Ty,
        definition: Option<Tm>,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BindingKind {
    Type,
    Term,
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Type => "type",
            Self::Term => "term",
        })
    }
}

impl<N, Ty, Tm> Binding<N, Ty, Tm> {
    pub fn kind(&self) -> BindingKind {
        match self {
            Self::Type { .. } => BindingKind::Type,
            Self::Term { .. } => BindingKind::Term,
        }
    }

    pub fn name(&self) -> &N {
        match self {
            Self::Type { name } | Self::Term { name, .. } => name,
        }
    }
}

/// The payload of a term binding.
#[derive(Debug)]
pub struct TermBinding<'c, N, Ty, Tm> {
    pub name: &'c N,
    pub ty: &'c Ty,
    pub definition: Option<&'c Tm>,
}

/// Failure to resolve an index against a context: a bug in index
/// bookkeeping rather than a user error.
#[derive(Clone, Debug)]
pub enum LookupError {
    OutOfRange {
        index: Idx,
        len: usize,
        location: &'static Location<'static>,
    },
    Inconsistent {
        index: Idx,
        expected: BindingKind,
        found: BindingKind,
        location: &'static Location<'static>,
    },
}

impl LookupError {
    pub fn location(&self) -> &'static Location<'static> {
        match self {
            Self::OutOfRange { location, .. } | Self::Inconsistent { location, .. } => location,
        }
    }
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { index, len, .. } => {
                write!(f, "index out of range: {index} (context has {len} bindings)")
            }
            Self::Inconsistent {
                index,
                expected,
                found,
                ..
            } => write!(
                f,
                "inconsistent binding: index {index} refers to a {found} binding, expected a {expected} binding"
            ),
        }
    }
}

pub type Context<N, Ty, Tm> = Stack<Binding<N, Ty, Tm>>;

impl<N, Ty, Tm> Context<N, Ty, Tm> {
    #[track_caller]
    fn lookup(&self, index: Idx) -> Result<&Binding<N, Ty, Tm>, LookupError> {
        let location = Location::caller();
        self.get(index).ok_or(LookupError::OutOfRange {
            index,
            len: self.len(),
            location,
        })
    }

    /// Resolves `index` to a type binder, returning its name.
    #[track_caller]
    pub fn get_ty_binding(&self, index: Idx) -> Result<&N, LookupError> {
        let location = Location::caller();
        match self.lookup(index)? {
            Binding::Type { name } => Ok(name),
            Binding::Term { .. } => Err(LookupError::Inconsistent {
                index,
                expected: BindingKind::Type,
                found: BindingKind::Term,
                location,
            }),
        }
    }

    /// Resolves `index` to a term binder.
    #[track_caller]
    pub fn get_tm_binding(&self, index: Idx) -> Result<TermBinding<'_, N, Ty, Tm>, LookupError> {
        let location = Location::caller();
        match self.lookup(index)? {
            Binding::Term {
                name,
                ty,
                definition,
            } => Ok(TermBinding {
                name,
                ty,
                definition: definition.as_ref(),
            }),
            Binding::Type { .. } => Err(LookupError::Inconsistent {
                index,
                expected: BindingKind::Term,
                found: BindingKind::Type,
                location,
            }),
        }
    }

    pub fn push_ty(&self, name: N) -> Self {
        self.push(Binding::Type { name })
    }

    pub fn push_tm(&self, name: N, ty: Ty) -> Self {
        self.push(Binding::Term {
            name,
            ty,
            definition: None,
        })
    }

    pub fn push_definition(&self, name: N, ty: Ty, definition: Tm) -> Self {
        self.push(Binding::Term {
            name,
            ty,
            definition: Some(definition),
        })
    }
}

impl<N: Borrow<str>, Ty, Tm> Context<N, Ty, Tm> {
    /// Index of the most recent type binder named `name`.
    pub fn find_ty_var(&self, name: &str) -> Option<Idx> {
        self.find(|b| matches!(b, Binding::Type { name: n } if n.borrow() == name))
    }

    /// Index of the most recent term binder named `name`.
    pub fn find_tm_var(&self, name: &str) -> Option<Idx> {
        self.find(|b| matches!(b, Binding::Term { name: n, .. } if n.borrow() == name))
    }

    /// The most recent term binder named `name`.
    pub fn find_tm_binding(&self, name: &str) -> Option<TermBinding<'_, N, Ty, Tm>> {
        self.iter().find_map(|b| match b {
            Binding::Term {
                name: n,
                ty,
                definition,
            } if n.borrow() == name => Some(TermBinding {
                name: n,
                ty,
                definition: definition.as_ref(),
            }),
            _ => None,
        })
    }
}
