//! Cache Key Module
//!
//! Derives stable cache keys from a computation identifier and its arguments.
//!
//! Keys never depend on the computation's implementation: only the identifier
//! text and the canonical representation of each argument are hashed. Callers
//! must invalidate entries themselves when a computation's logic changes.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt::{self, Debug, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::config::KeyScope;
use crate::error::{CacheError, Result};

/// Number of hex characters of the SHA-256 digest kept in file names.
pub const DIGEST_LEN: usize = 16;

/// File name suffix of every cache entry.
pub const ENTRY_SUFFIX: &str = ".cache";

// == Identifier ==
/// Human-assigned name of a computation.
///
/// Not guaranteed to be unique: two computations sharing a name share cache
/// entries unless the cache runs with [`KeyScope::Qualified`] and the
/// identifiers carry different module paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    name: String,
    module: Option<String>,
}

impl Identifier {
    /// Creates an identifier from a bare computation name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: None,
        }
    }

    /// Creates an identifier carrying the module path it was declared in.
    ///
    /// See also the [`identifier!`](crate::identifier) macro.
    pub fn qualified(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: Some(module.into()),
        }
    }

    /// The bare computation name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The module path, if any.
    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    /// Returns the file name prefix for this identifier under `scope`.
    ///
    /// Module separators (`::`) become `.` so the prefix stays a valid file name.
    pub fn prefix(&self, scope: KeyScope) -> String {
        match (scope, &self.module) {
            (KeyScope::Qualified, Some(module)) => {
                format!("{}.{}", module.replace("::", "."), self.name)
            }
            _ => self.name.clone(),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.module {
            Some(module) => write!(f, "{module}::{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

impl From<&str> for Identifier {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Identifier {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// Builds an [`Identifier`] qualified with the calling module's path.
///
/// ```
/// let id = disk_memo::identifier!("plus");
/// assert_eq!(id.name(), "plus");
/// assert!(id.module().is_some());
/// ```
#[macro_export]
macro_rules! identifier {
    ($name:expr) => {
        $crate::Identifier::qualified(module_path!(), $name)
    };
}

/// Checks that a prefix can be used as the leading part of a file name.
pub(crate) fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.is_empty() {
        return Err(CacheError::InvalidIdentifier(
            "identifier cannot be empty".to_string(),
        ));
    }
    if prefix.starts_with('.') {
        return Err(CacheError::InvalidIdentifier(format!(
            "identifier cannot start with '.': {prefix}"
        )));
    }
    if let Some(bad) = prefix
        .chars()
        .find(|c| matches!(c, '/' | '\\' | ':' | '\0') || c.is_control())
    {
        return Err(CacheError::InvalidIdentifier(format!(
            "identifier contains forbidden character {bad:?}: {prefix}"
        )));
    }
    Ok(())
}

/// Checks that a named argument's name is `[A-Za-z_][A-Za-z0-9_]*`.
///
/// Names are written into the canonical text unquoted, so anything else
/// could make two different argument vectors print the same text.
pub(crate) fn validate_arg_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(CacheError::InvalidArgumentName(name.to_string()))
    }
}

// == Stable Representation ==
/// Canonical, run-to-run stable textual form of an argument value.
///
/// A type must implement this to be used as a cache key argument. Types whose
/// natural representation is unstable across runs (hash maps and sets with
/// randomized iteration order, pointers) deliberately have no implementation;
/// wrap them in [`DebugRepr`] or [`SerdeRepr`], or pass text via
/// [`Args::raw_arg`], to opt in explicitly.
pub trait StableRepr {
    /// Appends the canonical representation to `out`.
    fn write_repr(&self, out: &mut String);

    /// Returns the canonical representation as a new string.
    fn stable_repr(&self) -> String {
        let mut out = String::new();
        self.write_repr(&mut out);
        out
    }
}

macro_rules! display_repr {
    ($($ty:ty),* $(,)?) => {
        $(
            impl StableRepr for $ty {
                fn write_repr(&self, out: &mut String) {
                    let _ = write!(out, "{self}");
                }
            }
        )*
    };
}

display_repr!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, bool);

// Debug keeps the fractional part ("1.0") so 1.0 and 1 differ.
impl StableRepr for f32 {
    fn write_repr(&self, out: &mut String) {
        let _ = write!(out, "{self:?}");
    }
}

impl StableRepr for f64 {
    fn write_repr(&self, out: &mut String) {
        let _ = write!(out, "{self:?}");
    }
}

impl StableRepr for char {
    fn write_repr(&self, out: &mut String) {
        out.push('\'');
        out.extend(self.escape_default());
        out.push('\'');
    }
}

impl StableRepr for str {
    fn write_repr(&self, out: &mut String) {
        out.push('"');
        out.extend(self.chars().flat_map(char::escape_default));
        out.push('"');
    }
}

impl StableRepr for String {
    fn write_repr(&self, out: &mut String) {
        self.as_str().write_repr(out);
    }
}

impl StableRepr for Path {
    fn write_repr(&self, out: &mut String) {
        self.to_string_lossy().as_ref().write_repr(out);
    }
}

impl StableRepr for PathBuf {
    fn write_repr(&self, out: &mut String) {
        self.as_path().write_repr(out);
    }
}

impl StableRepr for () {
    fn write_repr(&self, out: &mut String) {
        out.push_str("()");
    }
}

impl<T: StableRepr + ?Sized> StableRepr for &T {
    fn write_repr(&self, out: &mut String) {
        (**self).write_repr(out);
    }
}

impl<T: StableRepr + ?Sized> StableRepr for Box<T> {
    fn write_repr(&self, out: &mut String) {
        (**self).write_repr(out);
    }
}

impl<T: StableRepr + ?Sized> StableRepr for Rc<T> {
    fn write_repr(&self, out: &mut String) {
        (**self).write_repr(out);
    }
}

impl<T: StableRepr + ?Sized> StableRepr for Arc<T> {
    fn write_repr(&self, out: &mut String) {
        (**self).write_repr(out);
    }
}

impl<T: StableRepr> StableRepr for Option<T> {
    fn write_repr(&self, out: &mut String) {
        match self {
            Some(value) => {
                out.push_str("Some(");
                value.write_repr(out);
                out.push(')');
            }
            None => out.push_str("None"),
        }
    }
}

impl<T: StableRepr, E: StableRepr> StableRepr for std::result::Result<T, E> {
    fn write_repr(&self, out: &mut String) {
        match self {
            Ok(value) => {
                out.push_str("Ok(");
                value.write_repr(out);
            }
            Err(err) => {
                out.push_str("Err(");
                err.write_repr(out);
            }
        }
        out.push(')');
    }
}

// Object-safe shim so heterogeneous values can share one code path.
trait StableReprDyn {
    fn write_dyn(&self, out: &mut String);
}

impl<T: StableRepr + ?Sized> StableReprDyn for T {
    fn write_dyn(&self, out: &mut String) {
        self.write_repr(out);
    }
}

fn write_seq<'a, T, I>(out: &mut String, open: char, close: char, items: I)
where
    T: StableRepr + 'a,
    I: IntoIterator<Item = &'a T>,
{
    out.push(open);
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        item.write_repr(out);
    }
    out.push(close);
}

impl<T: StableRepr> StableRepr for [T] {
    fn write_repr(&self, out: &mut String) {
        write_seq(out, '[', ']', self);
    }
}

impl<T: StableRepr, const N: usize> StableRepr for [T; N] {
    fn write_repr(&self, out: &mut String) {
        write_seq(out, '[', ']', self);
    }
}

impl<T: StableRepr> StableRepr for Vec<T> {
    fn write_repr(&self, out: &mut String) {
        write_seq(out, '[', ']', self);
    }
}

impl<T: StableRepr> StableRepr for VecDeque<T> {
    fn write_repr(&self, out: &mut String) {
        write_seq(out, '[', ']', self);
    }
}

impl<T: StableRepr> StableRepr for BTreeSet<T> {
    fn write_repr(&self, out: &mut String) {
        write_seq(out, '{', '}', self);
    }
}

impl<K: StableRepr, V: StableRepr> StableRepr for BTreeMap<K, V> {
    fn write_repr(&self, out: &mut String) {
        out.push('{');
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            key.write_repr(out);
            out.push_str(": ");
            value.write_repr(out);
        }
        out.push('}');
    }
}

macro_rules! tuple_repr {
    ($($name:ident),+) => {
        impl<$($name: StableRepr),+> StableRepr for ($($name,)+) {
            #[allow(non_snake_case)]
            fn write_repr(&self, out: &mut String) {
                let ($($name,)+) = self;
                let items: &[&dyn StableReprDyn] = &[$($name),+];
                out.push('(');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.write_dyn(out);
                }
                if items.len() == 1 {
                    out.push(',');
                }
                out.push(')');
            }
        }
    };
}

tuple_repr!(A);
tuple_repr!(A, B);
tuple_repr!(A, B, C);
tuple_repr!(A, B, C, D);
tuple_repr!(A, B, C, D, E);
tuple_repr!(A, B, C, D, E, F);

// == Explicit Opt-ins ==
/// Uses a value's `Debug` output as its key representation.
///
/// Only stable if the `Debug` output is: derived `Debug` on plain data is,
/// anything printing addresses or hash-map contents is not.
#[derive(Debug, Clone)]
pub struct DebugRepr<T>(pub T);

impl<T: Debug> StableRepr for DebugRepr<T> {
    fn write_repr(&self, out: &mut String) {
        let _ = write!(out, "{:?}", self.0);
    }
}

/// Uses a value's JSON serialization as its key representation.
///
/// Struct fields serialize in declaration order; maps serialize in their
/// iteration order, so `HashMap` fields still make keys unstable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerdeRepr(String);

impl SerdeRepr {
    /// Serializes `value` up front so key derivation itself cannot fail.
    pub fn new<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Self(serde_json::to_string(value)?))
    }
}

impl StableRepr for SerdeRepr {
    fn write_repr(&self, out: &mut String) {
        out.push_str(&self.0);
    }
}

// == Argument Vector ==
/// Ordered positional arguments plus named arguments in caller order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args {
    positional: Vec<String>,
    named: Vec<(String, String)>,
}

impl Args {
    /// Creates an empty argument vector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument.
    pub fn arg<T: StableRepr + ?Sized>(mut self, value: &T) -> Self {
        self.positional.push(value.stable_repr());
        self
    }

    /// Appends a named argument.
    ///
    /// The name must be a plain identifier; other names are rejected when
    /// the key is derived.
    pub fn named<T: StableRepr + ?Sized>(mut self, name: impl Into<String>, value: &T) -> Self {
        self.named.push((name.into(), value.stable_repr()));
        self
    }

    /// Appends a positional argument whose canonical text the caller supplies.
    ///
    /// The caller is responsible for `repr` not containing the `", "`
    /// separator of the canonical text.
    pub fn raw_arg(mut self, repr: impl Into<String>) -> Self {
        self.positional.push(repr.into());
        self
    }

    /// Appends a named argument whose canonical text the caller supplies.
    ///
    /// The caller is responsible for `repr` not containing the `", "` or
    /// `"="` separators of the canonical text.
    pub fn raw_named(mut self, name: impl Into<String>, repr: impl Into<String>) -> Self {
        self.named.push((name.into(), repr.into()));
        self
    }

    /// Number of positional plus named arguments.
    pub fn len(&self) -> usize {
        self.positional.len() + self.named.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Canonical text hashed into the cache key, e.g. `(10, 20){c=30, d=4}`.
    pub fn canonical(&self) -> String {
        let mut out = String::from("(");
        out.push_str(&self.positional.join(", "));
        out.push_str("){");
        for (i, (name, value)) in self.named.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(name);
            out.push('=');
            out.push_str(value);
        }
        out.push('}');
        out
    }
}

/// Builds an [`Args`] from positional values and optional `name = value` pairs.
///
/// ```
/// let args = disk_memo::args!(10, 20; c = 30, d = 4);
/// assert_eq!(args.canonical(), "(10, 20){c=30, d=4}");
/// ```
#[macro_export]
macro_rules! args {
    () => {
        $crate::Args::new()
    };
    ($($pos:expr),* $(,)? $(; $($name:ident = $val:expr),* $(,)?)?) => {{
        let args = $crate::Args::new();
        $(let args = args.arg(&$pos);)*
        $($(let args = args.named(stringify!($name), &$val);)*)?
        args
    }};
}

// == Cache Key ==
/// Deterministic key of one cached computation result.
///
/// Two keys are equal iff their identifier prefixes and canonical argument
/// texts are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    prefix: String,
    digest: String,
    args: String,
}

impl CacheKey {
    /// Identifier prefix shared by every entry of one computation.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Truncated hex SHA-256 of the canonical arguments.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Canonical argument text the digest was computed from.
    pub fn args(&self) -> &str {
        &self.args
    }

    /// File name of this entry: `{prefix}.{digest}.cache`.
    pub fn file_name(&self) -> String {
        format!("{}.{}{}", self.prefix, self.digest, ENTRY_SUFFIX)
    }

    /// Rebuilds a key from parts read back from disk.
    pub(crate) fn from_parts(prefix: String, digest: String, args: String) -> Self {
        Self {
            prefix,
            digest,
            args,
        }
    }

    /// Extracts the digest from `file_name` if it is an entry of `prefix`.
    ///
    /// `plus.0123456789abcdef.cache` matches prefix `plus` but not `plu` or
    /// `plus.more`, so identifiers sharing a textual prefix stay separate.
    pub(crate) fn digest_of_file<'a>(prefix: &str, file_name: &'a str) -> Option<&'a str> {
        let rest = file_name.strip_prefix(prefix)?.strip_prefix('.')?;
        let digest = rest.strip_suffix(ENTRY_SUFFIX)?;
        let valid = digest.len() == DIGEST_LEN
            && digest
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        valid.then_some(digest)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.prefix, self.digest)
    }
}

/// Hex digest of canonical argument text, truncated to [`DIGEST_LEN`].
pub(crate) fn digest_args(canonical: &str) -> String {
    let hash = Sha256::digest(canonical.as_bytes());
    let mut digest = hex::encode(hash);
    digest.truncate(DIGEST_LEN);
    digest
}

// == Key Codec ==
/// Turns identifiers and argument vectors into [`CacheKey`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyCodec {
    scope: KeyScope,
}

impl KeyCodec {
    pub fn new(scope: KeyScope) -> Self {
        Self { scope }
    }

    pub fn scope(&self) -> KeyScope {
        self.scope
    }

    /// Derives the key for `identifier` called with `args`.
    ///
    /// Fails if the identifier cannot be used as a file name prefix or a
    /// named argument's name is not a plain identifier.
    pub fn derive(&self, identifier: &Identifier, args: &Args) -> Result<CacheKey> {
        let prefix = self.prefix(identifier)?;
        for (name, _) in &args.named {
            validate_arg_name(name)?;
        }
        let canonical = args.canonical();
        let digest = digest_args(&canonical);
        Ok(CacheKey::from_parts(prefix, digest, canonical))
    }

    /// Validated file name prefix of `identifier` under this codec's scope.
    pub fn prefix(&self, identifier: &Identifier) -> Result<String> {
        let prefix = identifier.prefix(self.scope);
        validate_prefix(&prefix)?;
        Ok(prefix)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_positional_and_named() {
        let args = Args::new().arg(&10).arg(&20).named("c", &30).named("d", &4);
        assert_eq!(args.canonical(), "(10, 20){c=30, d=4}");
        assert_eq!(args.len(), 4);
    }

    #[test]
    fn test_canonical_empty() {
        assert_eq!(Args::new().canonical(), "(){}");
        assert!(Args::new().is_empty());
    }

    #[test]
    fn test_args_macro_matches_builder() {
        let built = Args::new().arg(&1).arg("x").named("flag", &true);
        let from_macro = crate::args!(1, "x"; flag = true);
        assert_eq!(built, from_macro);
        assert_eq!(crate::args!(), Args::new());
        assert_eq!(crate::args!(5, 6,), Args::new().arg(&5).arg(&6));
    }

    #[test]
    fn test_string_and_number_differ() {
        let text = Args::new().arg("1");
        let number = Args::new().arg(&1);
        assert_ne!(text.canonical(), number.canonical());
    }

    #[test]
    fn test_string_escaping() {
        assert_eq!("a\"b\n".stable_repr(), r#""a\"b\n""#);
        assert_eq!('x'.stable_repr(), "'x'");
    }

    #[test]
    fn test_float_keeps_fraction() {
        assert_eq!(1.0f64.stable_repr(), "1.0");
        assert_ne!(1.0f64.stable_repr(), 1i32.stable_repr());
    }

    #[test]
    fn test_collections_repr() {
        assert_eq!(vec![1, 2, 3].stable_repr(), "[1, 2, 3]");
        assert_eq!(Some("a").stable_repr(), "Some(\"a\")");
        assert_eq!(None::<u8>.stable_repr(), "None");
        assert_eq!((1,).stable_repr(), "(1,)");
        assert_eq!((1, "b", 2.5).stable_repr(), "(1, \"b\", 2.5)");

        let mut map = BTreeMap::new();
        map.insert("b", 2);
        map.insert("a", 1);
        assert_eq!(map.stable_repr(), "{\"a\": 1, \"b\": 2}");

        let ok: std::result::Result<u8, String> = Ok(3);
        assert_eq!(ok.stable_repr(), "Ok(3)");
    }

    #[test]
    fn test_debug_and_serde_opt_ins() {
        #[derive(Debug, Serialize)]
        struct Dataset {
            values: Vec<u32>,
        }
        let ds = Dataset {
            values: vec![1, 2, 3],
        };

        assert_eq!(
            DebugRepr(&ds).stable_repr(),
            "Dataset { values: [1, 2, 3] }"
        );
        assert_eq!(
            SerdeRepr::new(&ds).unwrap().stable_repr(),
            r#"{"values":[1,2,3]}"#
        );
    }

    #[test]
    fn test_derive_is_deterministic() {
        let codec = KeyCodec::default();
        let id = Identifier::new("f");
        let args = crate::args!(10, 20; c = 30, d = 4);

        let first = codec.derive(&id, &args).unwrap();
        let second = codec.derive(&id, &args.clone()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.digest().len(), DIGEST_LEN);
        assert_eq!(first.prefix(), "f");
        assert_eq!(first.file_name(), format!("f.{}.cache", first.digest()));
    }

    #[test]
    fn test_digest_is_fixed_across_runs() {
        // Pinned: existing cache directories depend on these exact names.
        let codec = KeyCodec::default();
        let plus = codec.derive(&Identifier::new("plus"), &crate::args!(3, 2)).unwrap();
        assert_eq!(plus.file_name(), "plus.e184a4ab1994c1fd.cache");

        let f = codec
            .derive(&Identifier::new("f"), &crate::args!(10, 20; c = 30, d = 4))
            .unwrap();
        assert_eq!(f.digest(), "d30f0205c229e30c");
    }

    #[test]
    fn test_argument_order_matters() {
        let codec = KeyCodec::default();
        let id = Identifier::new("f");
        let a = codec.derive(&id, &crate::args!(1, 2)).unwrap();
        let b = codec.derive(&id, &crate::args!(2, 1)).unwrap();
        assert_ne!(a, b);

        let named_ab = codec.derive(&id, &crate::args!(; a = 1, b = 2)).unwrap();
        let named_ba = codec.derive(&id, &crate::args!(; b = 2, a = 1)).unwrap();
        assert_ne!(named_ab, named_ba);
    }

    #[test]
    fn test_same_args_different_identifiers_share_digest() {
        let codec = KeyCodec::default();
        let args = crate::args!(vec![1, 2, 3]);
        let a = codec.derive(&Identifier::new("Dataset.increment"), &args).unwrap();
        let b = codec
            .derive(&Identifier::new("OtherDataset.increment"), &args)
            .unwrap();
        assert_eq!(a.digest(), b.digest());
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_scope_prefix() {
        let id = Identifier::qualified("app::math", "plus");
        assert_eq!(KeyCodec::new(KeyScope::Name).prefix(&id).unwrap(), "plus");
        assert_eq!(
            KeyCodec::new(KeyScope::Qualified).prefix(&id).unwrap(),
            "app.math.plus"
        );
        // Unqualified identifiers are unaffected by the scope.
        let bare = Identifier::new("plus");
        assert_eq!(KeyCodec::new(KeyScope::Qualified).prefix(&bare).unwrap(), "plus");
    }

    #[test]
    fn test_identifier_macro_uses_module_path() {
        let id = crate::identifier!("plus");
        assert_eq!(id.module(), Some(module_path!()));
        assert_eq!(id.to_string(), format!("{}::plus", module_path!()));
    }

    #[test]
    fn test_invalid_identifiers() {
        let codec = KeyCodec::default();
        for bad in ["", ".hidden", "a/b", "a\\b", "c:d", "nul\0"] {
            let result = codec.derive(&Identifier::new(bad), &Args::new());
            assert!(
                matches!(result, Err(CacheError::InvalidIdentifier(_))),
                "{bad:?} should be rejected"
            );
        }
        assert!(codec.derive(&Identifier::new("A.f"), &Args::new()).is_ok());
    }

    #[test]
    fn test_argument_names_cannot_forge_canonical_text() {
        let codec = KeyCodec::default();
        let id = Identifier::new("f");
        let forged = Args::new().named("x=1, y", &2);
        let honest = Args::new().named("x", &1).named("y", &2);

        // Both print the same text; only the honest vector gets a key.
        assert_eq!(forged.canonical(), honest.canonical());
        assert!(matches!(
            codec.derive(&id, &forged),
            Err(CacheError::InvalidArgumentName(name)) if name == "x=1, y"
        ));
        assert!(codec.derive(&id, &honest).is_ok());
    }

    #[test]
    fn test_invalid_argument_names() {
        let codec = KeyCodec::default();
        for bad in ["", "1x", "a b", "a=b", "a,b", "x}", "é"] {
            let result = codec.derive(&Identifier::new("f"), &Args::new().named(bad, &1));
            assert!(
                matches!(result, Err(CacheError::InvalidArgumentName(_))),
                "{bad:?} should be rejected"
            );
        }
        for good in ["x", "_", "_private", "max_rows2", "Z"] {
            assert!(codec
                .derive(&Identifier::new("f"), &Args::new().raw_named(good, "1"))
                .is_ok());
        }
    }

    #[test]
    fn test_digest_of_file() {
        let name = "plus.0123456789abcdef.cache";
        assert_eq!(CacheKey::digest_of_file("plus", name), Some("0123456789abcdef"));
        assert_eq!(CacheKey::digest_of_file("plu", name), None);
        assert_eq!(
            CacheKey::digest_of_file("plus", "plus.more.0123456789abcdef.cache"),
            None
        );
        assert_eq!(CacheKey::digest_of_file("plus", "plus.0123.cache"), None);
        assert_eq!(
            CacheKey::digest_of_file("plus", "plus.0123456789ABCDEF.cache"),
            None
        );
        assert_eq!(
            CacheKey::digest_of_file("A", "A.f.0123456789abcdef.cache"),
            None
        );
    }
}
