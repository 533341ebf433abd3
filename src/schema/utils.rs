/// Upper-case and drop every whitespace character. Unicode whitespace
/// covers the non-breaking spaces (U+00A0, U+2007, U+202F) too.
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Bijective base-26 column letter: 0 → A, 25 → Z, 26 → AA.
pub fn column_letter(idx: usize) -> String {
    let mut n = idx + 1;
    let mut out = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        out.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Fallback label for a column nobody named.
pub fn synthetic_label(idx: usize) -> String {
    format!("Column {}", column_letter(idx))
}

/// Digits plus grouping/sign/percent punctuation only, e.g. `45,000` or `-3.5%`.
pub fn is_purely_numeric(raw: &str) -> bool {
    let mut saw_digit = false;
    for c in raw.chars().filter(|c| !c.is_whitespace()) {
        match c {
            '0'..='9' => saw_digit = true,
            ',' | '.' | '+' | '-' | '%' => {}
            _ => return false,
        }
    }
    saw_digit
}

/// Longest run of consecutive alphabetic characters.
pub fn longest_letter_run(raw: &str) -> usize {
    let mut best = 0;
    let mut cur = 0;
    for c in raw.chars() {
        if c.is_alphabetic() {
            cur += 1;
            best = best.max(cur);
        } else {
            cur = 0;
        }
    }
    best
}

/// Share of non-whitespace characters that are letters.
pub fn letter_density(raw: &str) -> f64 {
    let (letters, total) = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .fold((0usize, 0usize), |(l, t), c| {
            (l + usize::from(c.is_alphabetic()), t + 1)
        });
    if total == 0 {
        0.0
    } else {
        letters as f64 / total as f64
    }
}
