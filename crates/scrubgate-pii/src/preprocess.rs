//! Input normalization
//!
//! When preprocessing runs, every downstream offset refers to the normalized
//! text. Callers that need offsets into the submitted payload must disable it.

use std::borrow::Cow;

/// Result of [`normalize`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preprocessed<'a> {
    pub text: Cow<'a, str>,
    /// True when the normalized text differs from the input
    pub transformed: bool,
}

impl Preprocessed<'_> {
    pub fn into_owned(self) -> String {
        self.text.into_owned()
    }
}

/// Escaped control sequences collapsed into real whitespace
const ESCAPES: [(&str, &str); 3] = [("\\n", "\n"), ("\\t", "\t"), ("\\r", "\r")];

/// Normalize `text` when `enabled`; otherwise borrow it unchanged.
///
/// 1. literal `\n`, `\t`, `\r` escape sequences become real whitespace
/// 2. runs of whitespace collapse to a single space
/// 3. leading and trailing whitespace is trimmed
pub fn normalize(text: &str, enabled: bool) -> Preprocessed<'_> {
    if !enabled {
        return Preprocessed {
            text: Cow::Borrowed(text),
            transformed: false,
        };
    }

    let mut unescaped = Cow::Borrowed(text);
    for (escaped, actual) in ESCAPES {
        if unescaped.contains(escaped) {
            unescaped = Cow::Owned(unescaped.replace(escaped, actual));
        }
    }

    let collapsed = unescaped.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed == text {
        Preprocessed {
            text: Cow::Borrowed(text),
            transformed: false,
        }
    } else {
        Preprocessed {
            text: Cow::Owned(collapsed),
            transformed: true,
        }
    }
}
