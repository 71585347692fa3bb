use std::fmt;

/// Markers that read back as a missing cell unless the configuration overrides them.
pub const DEFAULT_MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Missing,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Builds a cell from a raw field, treating any of `markers` as missing.
    pub fn from_raw<S: AsRef<str>>(raw: &str, markers: &[S]) -> Self {
        if markers.iter().any(|marker| marker.as_ref() == raw) {
            Cell::Missing
        } else {
            Cell::Text(raw.to_string())
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// Numeric view of the cell. Surrounding whitespace is ignored, so
    /// `" 4"` coerces to `4.0`; anything else that does not parse is `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Missing => None,
            Cell::Number(value) => Some(*value),
            Cell::Text(text) => text.trim().parse::<f64>().ok().filter(|v| !v.is_nan()),
        }
    }

    pub fn as_display(&self) -> String {
        match self {
            Cell::Missing => String::new(),
            Cell::Number(value) => format_number(*value),
            Cell::Text(text) => text.clone(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::from_raw(value, DEFAULT_MISSING_MARKERS)
    }
}

pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

/// Canonical comparison key for a column label.
///
/// Case, surrounding whitespace, underscores and punctuation are folded away
/// so that `"Total Costs"`, `"total_costs"` and `"TOTAL   COSTS!!"` compare
/// equal. The result is stable under repeated application.
pub fn normalize_label(label: &str) -> String {
    let lowered = label.trim().to_lowercase();

    let mut folded = String::with_capacity(lowered.len());
    let mut in_gap = false;
    for ch in lowered.chars() {
        if ch.is_whitespace() || ch == '_' {
            if !in_gap {
                folded.push(' ');
                in_gap = true;
            }
            continue;
        }
        in_gap = false;
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            folded.push(ch);
        }
    }

    // Stripping punctuation can leave adjacent or dangling separators behind
    // ("a - b", "costs !"); both are folded so the key is a fixed point.
    let mut key = String::with_capacity(folded.len());
    let mut previous_space = false;
    for ch in folded.chars() {
        if ch == ' ' {
            if !previous_space {
                key.push(ch);
            }
            previous_space = true;
        } else {
            key.push(ch);
            previous_space = false;
        }
    }
    key.trim().to_string()
}
