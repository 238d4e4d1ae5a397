//! Damerau-Levenshtein distance (optimal string alignment variant).
//!
//! Insertions, deletions and substitutions cost 1; swapping two adjacent
//! characters also costs 1. Works on `char`s so multi-byte letters count once.
//!
//! The full `(n+1) x (m+1)` matrix is always filled. A bounded variant could
//! stop once every cell in a row exceeds the caller's threshold.

/// Edit distance between `a` and `b`. Zero iff the strings are equal.
pub fn distance(a: &str, b: &str) -> usize {
    if a == b {
        return 0;
    }
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let n = a.len();
    let m = b.len();
    if n == 0 {
        return m;
    }
    if m == 0 {
        return n;
    }

    let width = m + 1;
    let mut d = vec![0usize; (n + 1) * width];
    for (j, cell) in d.iter_mut().take(width).enumerate() {
        *cell = j;
    }
    for i in 1..=n {
        d[i * width] = i;
        for j in 1..=m {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            let mut best = (d[(i - 1) * width + j] + 1)
                .min(d[i * width + j - 1] + 1)
                .min(d[(i - 1) * width + j - 1] + cost);
            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                best = best.min(d[(i - 2) * width + j - 2] + cost);
            }
            d[i * width + j] = best;
        }
    }
    d[n * width + m]
}
