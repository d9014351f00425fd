//! Registered analysis types and their canonical URNs.
//!
//! Every [`Type`] has exactly one URN string. The mapping is checked once,
//! on first use, by [`init`]: one entry per variant, distinct strings, and
//! every string must survive `components -> urn -> type`. A broken table is
//! a startup failure, not a per-request one.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::LazyLock;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::analysis::components::TypeComponents;
use crate::analysis::urn::Urn;
use crate::error::TypeError;
use crate::models::Ecosystem;

/// Declares the `Type` enum together with `Type::ALL`, `TYPE_COUNT`,
/// `urn_str` and `name`, so a variant cannot exist without a table entry.
macro_rules! registered_types {
    ($($variant:ident => $urn:literal,)+) => {
        /// Analysis-request kind.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Type {
            $($variant,)+
        }

        /// Number of declared variants.
        const TYPE_COUNT: usize = [$(stringify!($variant)),+].len();

        impl Type {
            pub const ALL: [Type; TYPE_COUNT] = [$(Type::$variant),+];

            /// Canonical URN string as registered.
            pub fn urn_str(self) -> &'static str {
                match self {
                    $(Type::$variant => $urn,)+
                }
            }

            /// Variant name, e.g. `NpmFalcoInstall`.
            pub fn name(self) -> &'static str {
                match self {
                    $(Type::$variant => stringify!($variant),)+
                }
            }
        }
    };
}

registered_types! {
    Nop => "urn:nop:nop",
    NpmFalcoInstall => "urn:scan:falco!npm,install.json",
    NpmFalcoInstallVerdicts => "urn:scan:falco!npm,install.json+urn:enrich:verdicts",
    NpmStaticTarball => "urn:scan:static!npm,tarball.json",
    NpmStaticSecretsTarball => "urn:scan:static,secrets!npm,tarball.json",
    NpmTyposquat => "urn:scan:typo!npm.json",
    PypiFalcoInstall => "urn:scan:falco!pypi,install.json",
    PypiFalcoInstallVerdicts => "urn:scan:falco!pypi,install.json+urn:enrich:verdicts",
    PypiStaticSdist => "urn:scan:static!pypi,sdist.json",
}

impl Type {
    /// Structured view of this type.
    pub fn components(self) -> Result<&'static TypeComponents, TypeError> {
        Ok(&table()?.entry(self)?.components)
    }

    /// Canonical normalized URN.
    pub fn to_urn(self) -> Result<&'static Urn, TypeError> {
        Ok(&table()?.entry(self)?.urn)
    }

    /// Ecosystem component, `None` for NOP-style types.
    pub fn ecosystem(self) -> Result<Option<Ecosystem>, TypeError> {
        Ok(self.components()?.ecosystem)
    }

    pub fn is_enricher(self) -> Result<bool, TypeError> {
        Ok(self.components()?.is_enricher())
    }

    /// Resolve a URN string to its registered type.
    pub fn from_urn(input: &str) -> Result<Type, TypeError> {
        let urn = Urn::parse(input)?.normalize();
        table()?
            .entries
            .iter()
            .find(|entry| entry.urn.nid() == urn.nid() && entry.urn.nss() == urn.nss())
            .map(|entry| entry.kind)
            .ok_or_else(|| TypeError::NotFound(input.to_string()))
    }

    /// Registered types of one ecosystem (`None` for ecosystem-less types).
    pub fn of_ecosystem(ecosystem: Option<Ecosystem>) -> Result<Vec<Type>, TypeError> {
        let table = table()?;
        Ok(table
            .entries
            .iter()
            .filter(|entry| entry.components.ecosystem == ecosystem)
            .map(|entry| entry.kind)
            .collect())
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.urn_str())
    }
}

impl FromStr for Type {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Type::from_urn(s)
    }
}

impl Serialize for Type {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.urn_str())
    }
}

impl<'de> Deserialize<'de> for Type {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Type::from_urn(&raw).map_err(serde::de::Error::custom)
    }
}

struct Entry {
    kind: Type,
    urn: Urn,
    components: TypeComponents,
}

struct TypeTable {
    entries: Vec<Entry>,
}

impl TypeTable {
    fn entry(&self, kind: Type) -> Result<&Entry, TypeError> {
        self.entries
            .get(kind.index())
            .filter(|entry| entry.kind == kind)
            .ok_or_else(|| TypeError::CodecMismatch(format!("{} has no table entry", kind.name())))
    }
}

static TABLE: LazyLock<Result<TypeTable, TypeError>> = LazyLock::new(|| build_table(&Type::ALL));

fn table() -> Result<&'static TypeTable, TypeError> {
    TABLE.as_ref().map_err(|e| e.clone())
}

/// Build and verify the type table. Call once at startup; the result is
/// cached, so later lookups only pay for a pointer read.
pub fn init() -> Result<(), TypeError> {
    let table = table()?;
    tracing::debug!(types = table.entries.len(), "analysis type table verified");
    Ok(())
}

fn build_table(declared: &[Type]) -> Result<TypeTable, TypeError> {
    if declared.len() != TYPE_COUNT {
        return Err(TypeError::CodecMismatch(format!(
            "{} types declared but {} registered",
            TYPE_COUNT,
            declared.len()
        )));
    }

    let mut seen = HashSet::new();
    let mut entries = Vec::with_capacity(declared.len());
    for (position, &kind) in declared.iter().enumerate() {
        if kind.index() != position {
            return Err(TypeError::CodecMismatch(format!(
                "{} registered out of declaration order",
                kind.name()
            )));
        }

        let raw = kind.urn_str();
        let components = TypeComponents::parse(raw)
            .map_err(|e| TypeError::CodecMismatch(format!("{}: {}", kind.name(), e)))?;
        let urn = components
            .to_urn()
            .map_err(|e| TypeError::CodecMismatch(format!("{}: {}", kind.name(), e)))?;

        // Stored strings must already be canonical, otherwise lookups by the
        // registered string would miss.
        if urn.to_string() != raw {
            return Err(TypeError::CodecMismatch(format!(
                "{}: '{}' recomposes to '{}'",
                kind.name(),
                raw,
                urn
            )));
        }
        if !seen.insert(urn.clone()) {
            return Err(TypeError::CodecMismatch(format!(
                "{}: duplicate urn '{}'",
                kind.name(),
                raw
            )));
        }

        entries.push(Entry {
            kind,
            urn,
            components,
        });
    }

    Ok(TypeTable { entries })
}
