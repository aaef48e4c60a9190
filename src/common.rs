use std::fmt::Debug;

/// A value paired with information (usually a [`Span`][crate::reprs::common::Span])
/// that is ignored by comparisons.
#[derive(Clone)]
pub struct WithInfo<I, T>(pub I, pub T);

impl<I, T: Debug> Debug for WithInfo<I, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.1.fmt(f)
    }
}
impl<I, T: Eq> Eq for WithInfo<I, T> {}
impl<I, T: PartialEq> PartialEq for WithInfo<I, T> {
    fn eq(&self, other: &Self) -> bool {
        self.1 == other.1
    }
}

impl<I: Copy, T> WithInfo<I, T> {
    pub fn info(&self) -> I {
        self.0
    }
}

/// Bijective base-26 numeral of `id` over the alphabet starting at `first`:
/// `0 -> A`, `25 -> Z`, `26 -> AA`, `27 -> AB`, ...
fn bijective_base26(id: usize, first: u8) -> String {
    let mut digits = Vec::new();
    let mut n = id + 1;
    while n > 0 {
        n -= 1;
        // `n % 26 < 26` so this never leaves the alphabet
        digits.push(char::from(first + (n % 26) as u8));
        n /= 26;
    }
    digits.iter().rev().collect()
}

/// Display name for the `id`th generated type parameter (`A`, `B`, ..., `AA`, ...).
pub fn generate_ty_var_name(id: usize) -> String {
    bijective_base26(id, b'A')
}

/// Display name for the `id`th generated term parameter (`a`, `b`, ..., `aa`, ...).
pub fn generate_tm_var_name(id: usize) -> String {
    bijective_base26(id, b'a')
}
