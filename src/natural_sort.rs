//! Filename ordering where embedded numbers compare by value: `img2` < `img10`.

use std::cmp::Ordering;

#[derive(Debug, PartialEq, Eq)]
enum Chunk {
    Text(String),
    Number(String),
}

/// Split into alternating text and digit runs. The sequence always starts with
/// a (possibly empty) text run, so chunks at the same index have the same kind.
fn chunks(s: &str) -> Vec<Chunk> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_digits = false;

    for ch in s.chars() {
        let is_digit = ch.is_ascii_digit();
        if is_digit != in_digits {
            let run = std::mem::take(&mut current);
            out.push(if in_digits {
                Chunk::Number(run)
            } else {
                Chunk::Text(run.to_lowercase())
            });
            in_digits = is_digit;
        }
        current.push(ch);
    }
    out.push(if in_digits {
        Chunk::Number(current)
    } else {
        Chunk::Text(current.to_lowercase())
    });
    out
}

fn compare_numbers(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Natural ordering: digit runs compare as integers, everything else case-insensitively
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (ca, cb) = (chunks(a), chunks(b));
    for (x, y) in ca.iter().zip(cb.iter()) {
        let ord = match (x, y) {
            (Chunk::Number(x), Chunk::Number(y)) => compare_numbers(x, y),
            (Chunk::Text(x), Chunk::Text(y)) => x.cmp(y),
            (Chunk::Text(_), Chunk::Number(_)) => Ordering::Less,
            (Chunk::Number(_), Chunk::Text(_)) => Ordering::Greater,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    // Equal under the natural key (e.g. "a1" vs "A01"): fall back to raw order
    ca.len().cmp(&cb.len()).then_with(|| a.cmp(b))
}

pub fn sort_natural(names: &mut [String]) {
    names.sort_by(|a, b| natural_cmp(a, b));
}
