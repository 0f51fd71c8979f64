//! Modifier bitmask shared by all entity kinds.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Declaration modifiers plus a few synthetic markers set by extractors.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Modifiers: u32 {
        /// `public`
        const PUBLIC = 1 << 0;
        /// `private`
        const PRIVATE = 1 << 1;
        /// `protected`
        const PROTECTED = 1 << 2;
        /// `static`
        const STATIC = 1 << 3;
        /// `final`
        const FINAL = 1 << 4;
        /// `synchronized`
        const SYNCHRONIZED = 1 << 5;
        /// `volatile`
        const VOLATILE = 1 << 6;
        /// `transient`
        const TRANSIENT = 1 << 7;
        /// `native`
        const NATIVE = 1 << 8;
        /// Interface type
        const INTERFACE = 1 << 9;
        /// `abstract`
        const ABSTRACT = 1 << 10;
        /// `strictfp`
        const STRICTFP = 1 << 11;
        /// Enum type
        const ENUM = 1 << 12;
        /// Anonymous class
        const ANONYMOUS = 1 << 13;
        /// Entity introduced by the extractor rather than declared in source
        const SYNTHETIC = 1 << 14;
    }
}

impl Modifiers {
    /// Parse a single Java modifier keyword.
    ///
    /// Returns `None` for annotations and unknown keywords.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let flag = match keyword {
            "public" => Self::PUBLIC,
            "private" => Self::PRIVATE,
            "protected" => Self::PROTECTED,
            "static" => Self::STATIC,
            "final" => Self::FINAL,
            "synchronized" => Self::SYNCHRONIZED,
            "volatile" => Self::VOLATILE,
            "transient" => Self::TRANSIENT,
            "native" => Self::NATIVE,
            "abstract" => Self::ABSTRACT,
            "strictfp" => Self::STRICTFP,
            _ => return None,
        };
        Some(flag)
    }

    /// Collect modifiers from a list of keywords, ignoring anything unknown.
    pub fn from_keywords<'a>(keywords: impl IntoIterator<Item = &'a str>) -> Self {
        keywords
            .into_iter()
            .filter_map(Self::from_keyword)
            .fold(Self::empty(), |acc, flag| acc | flag)
    }
}
