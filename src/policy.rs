//! Hasher and key-equality policies.
//!
//! A table owns one hasher policy and one equality policy by value. Lookups
//! accept any borrowed form `Q` of the stored key, so both policies are
//! parameterized over the query type. The two must agree: whenever
//! `key_eq(a, b)` holds, `hash_key(a) == hash_key(b)` must hold too.

use core::hash::{BuildHasher, Hash};

/// Default hasher policy: hashbrown's default `BuildHasher`.
pub type DefaultHashBuilder = hashbrown::hash_map::DefaultHashBuilder;

/// Maps a key to a 64-bit hash.
pub trait KeyHash<Q: ?Sized> {
    fn hash_key(&self, key: &Q) -> u64;
}

/// Every `BuildHasher` hashes keys through their `Hash` impl.
impl<S, Q> KeyHash<Q> for S
where
    S: BuildHasher,
    Q: ?Sized + Hash,
{
    #[inline]
    fn hash_key(&self, key: &Q) -> u64 {
        self.hash_one(key)
    }
}

/// Decides whether two keys denote the same entry.
pub trait KeyEq<Q: ?Sized> {
    fn key_eq(&self, a: &Q, b: &Q) -> bool;
}

/// Default equality policy: `Eq`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StdEq;

impl<Q: ?Sized + Eq> KeyEq<Q> for StdEq {
    #[inline]
    fn key_eq(&self, a: &Q, b: &Q) -> bool {
        a == b
    }
}

/// ASCII case-insensitive policy for string keys, usable as both the hasher
/// and the equality policy of a table.
#[derive(Clone, Debug, Default)]
pub struct AsciiCaseInsensitive<S = DefaultHashBuilder> {
    inner: S,
}

impl<S> AsciiCaseInsensitive<S> {
    pub fn with_hasher(inner: S) -> Self {
        Self { inner }
    }
}

impl<S: BuildHasher> KeyHash<str> for AsciiCaseInsensitive<S> {
    fn hash_key(&self, key: &str) -> u64 {
        use core::hash::Hasher;
        let mut h = self.inner.build_hasher();
        for b in key.bytes() {
            h.write_u8(b.to_ascii_lowercase());
        }
        h.write_u8(0xff);
        h.finish()
    }
}

impl<S> KeyEq<str> for AsciiCaseInsensitive<S> {
    fn key_eq(&self, a: &str, b: &str) -> bool {
        a.eq_ignore_ascii_case(b)
    }
}

// Owned keys hash and compare through their `str` form so that insertion
// (which hashes `String`) and borrowed lookups (which hash `str`) agree.
impl<S: BuildHasher> KeyHash<String> for AsciiCaseInsensitive<S> {
    fn hash_key(&self, key: &String) -> u64 {
        KeyHash::<str>::hash_key(self, key.as_str())
    }
}

impl<S> KeyEq<String> for AsciiCaseInsensitive<S> {
    fn key_eq(&self, a: &String, b: &String) -> bool {
        a.eq_ignore_ascii_case(b)
    }
}
