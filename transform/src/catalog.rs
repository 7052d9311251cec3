//! Closed catalog of algorithm families the matcher knows how to recognize.
//!
//! Entries are listed in priority order: when source text carries cues for
//! several families, the earliest entry wins. Each family also owns the
//! operand lookups used to pull its constant(s) out of the text.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmFamily {
    PrimalityCheck,
    CollatzSteps,
    DigitalRoot,
    Fibonacci,
    Factorial,
    Gcd,
}

impl AlgorithmFamily {
    pub fn as_str(self) -> &'static str {
        match self {
            AlgorithmFamily::PrimalityCheck => "primality_check",
            AlgorithmFamily::CollatzSteps => "collatz_steps",
            AlgorithmFamily::DigitalRoot => "digital_root",
            AlgorithmFamily::Fibonacci => "fibonacci",
            AlgorithmFamily::Factorial => "factorial",
            AlgorithmFamily::Gcd => "gcd",
        }
    }
}

impl std::fmt::Display for AlgorithmFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueCase {
    Sensitive,
    Insensitive,
}

/// Keyword test deciding whether a family applies to a piece of source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cue {
    pub keywords: &'static [&'static str],
    pub case: CueCase,
}

impl Cue {
    pub fn matches(&self, text: &str) -> bool {
        match self.case {
            CueCase::Sensitive => self.keywords.iter().any(|kw| text.contains(kw)),
            CueCase::Insensitive => {
                let lowered = text.to_lowercase();
                self.keywords.iter().any(|kw| lowered.contains(kw))
            }
        }
    }
}

/// How the assignment candidates of an operand are searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateOrder {
    /// Try each candidate name in turn; the first name with an assignment wins.
    Priority,
    /// Take whichever candidate assignment occurs first in the text.
    Leftmost,
}

/// Where to look for one integer operand, and what to use when nothing is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperandLookup {
    pub names: &'static [&'static str],
    pub call: Option<&'static str>,
    pub order: CandidateOrder,
    pub default: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub family: AlgorithmFamily,
    pub cue: Cue,
}

pub static PRIME_OPERAND: OperandLookup = OperandLookup {
    names: &["number_to_check", "n", "num"],
    call: Some("is_prime"),
    order: CandidateOrder::Priority,
    default: 17,
};

pub static COLLATZ_OPERAND: OperandLookup = OperandLookup {
    names: &["starting_number", "start", "n"],
    call: Some("collatz"),
    order: CandidateOrder::Priority,
    default: 27,
};

pub static DIGITAL_ROOT_OPERAND: OperandLookup = OperandLookup {
    names: &["input_number", "num", "n"],
    call: Some("digital_root"),
    order: CandidateOrder::Priority,
    default: 12345,
};

pub static FIBONACCI_OPERAND: OperandLookup = OperandLookup {
    names: &["n", "num", "value"],
    call: Some("fibonacci"),
    order: CandidateOrder::Priority,
    default: 10,
};

pub static FACTORIAL_OPERAND: OperandLookup = OperandLookup {
    names: &["n", "num", "value"],
    call: Some("factorial"),
    order: CandidateOrder::Priority,
    default: 5,
};

pub static GCD_FIRST_OPERAND: OperandLookup = OperandLookup {
    names: &["a", "x", "first"],
    call: None,
    order: CandidateOrder::Leftmost,
    default: 48,
};

pub static GCD_SECOND_OPERAND: OperandLookup = OperandLookup {
    names: &["b", "y", "second"],
    call: None,
    order: CandidateOrder::Leftmost,
    default: 18,
};

/// Value the fallback module returns when no family matched.
pub const UNRECOGNIZED_SENTINEL: i32 = 42;

pub const CATALOG: [CatalogEntry; 6] = [
    CatalogEntry {
        family: AlgorithmFamily::PrimalityCheck,
        cue: Cue {
            keywords: &["is_prime"],
            case: CueCase::Sensitive,
        },
    },
    CatalogEntry {
        family: AlgorithmFamily::CollatzSteps,
        cue: Cue {
            keywords: &["collatz"],
            case: CueCase::Insensitive,
        },
    },
    CatalogEntry {
        family: AlgorithmFamily::DigitalRoot,
        cue: Cue {
            keywords: &["digital_root", "digit_sum"],
            case: CueCase::Insensitive,
        },
    },
    CatalogEntry {
        family: AlgorithmFamily::Fibonacci,
        cue: Cue {
            keywords: &["fibonacci"],
            case: CueCase::Sensitive,
        },
    },
    CatalogEntry {
        family: AlgorithmFamily::Factorial,
        cue: Cue {
            keywords: &["factorial"],
            case: CueCase::Sensitive,
        },
    },
    CatalogEntry {
        family: AlgorithmFamily::Gcd,
        cue: Cue {
            keywords: &["gcd", "greatest_common"],
            case: CueCase::Sensitive,
        },
    },
];

/// First catalog entry whose cue appears in `text`.
pub fn detect(text: &str) -> Option<&'static CatalogEntry> {
    CATALOG.iter().find(|entry| entry.cue.matches(text))
}
