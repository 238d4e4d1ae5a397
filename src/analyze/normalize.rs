//! Character filtering and case folding applied before scoring.

use serde::{Deserialize, Serialize};

/// Which characters to drop while normalizing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeOptions {
    pub remove_whitespace: bool,
    pub remove_non_alphanumeric: bool,
}

/// Lowercase `text` and drop characters according to `opts`, in one pass.
///
/// Whitespace is handled first: it is either dropped (`remove_whitespace`) or
/// kept, and kept whitespace is never touched by the alphanumeric filter.
/// Filters look at the lowercased characters, so a letter whose lowercase form
/// expands (e.g. `İ`) is filtered the same way on every pass.
pub fn normalize(text: &str, opts: NormalizeOptions) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        for lc in ch.to_lowercase() {
            if lc.is_whitespace() {
                if !opts.remove_whitespace {
                    out.push(lc);
                }
                continue;
            }
            if opts.remove_non_alphanumeric && !lc.is_alphanumeric() {
                continue;
            }
            out.push(lc);
        }
    }
    out
}
