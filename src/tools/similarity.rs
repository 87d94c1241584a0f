//! Fuzzy matching for app and contact names.
//!
//! Speech-to-text mangles names, so lookups pick the most similar candidate
//! using the Ratcliff/Obershelp ratio: `2 * matches / (len(a) + len(b))`,
//! where matches are found by recursively taking the longest common block.

/// Similarity of two strings in `0.0..=1.0`
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let (i, j, size) = longest_common_block(a, b);
    if size == 0 {
        return 0;
    }
    size + matching_chars(&a[..i], &b[..j]) + matching_chars(&a[i + size..], &b[j + size..])
}

/// Longest common block `(start_a, start_b, len)`; ties go to the block that
/// starts earliest in `a`, then earliest in `b`.
fn longest_common_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut prev = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        let mut cur = vec![0usize; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            if ca == cb {
                let k = prev[j] + 1;
                cur[j + 1] = k;
                if k > best.2 {
                    best = (i + 1 - k, j + 1 - k, k);
                }
            }
        }
        prev = cur;
    }
    best
}

/// Most similar candidate to `key`, compared through `mapper`.
///
/// On equal scores the later candidate wins. `None` when there are no candidates.
pub fn find_similar<'a, I, F>(candidates: I, key: &str, mapper: F) -> Option<(&'a str, f64)>
where
    I: IntoIterator<Item = &'a str>,
    F: Fn(&str) -> String,
{
    candidates
        .into_iter()
        .map(|candidate| (candidate, ratio(key, &mapper(candidate))))
        .max_by(|x, y| x.1.total_cmp(&y.1))
}
