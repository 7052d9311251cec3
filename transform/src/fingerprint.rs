//! Classifies source text into an algorithm family and extracts its operands.

use std::sync::LazyLock;

use regex_lite::Regex;
use serde::Serialize;
use tracing::debug;
use tracing::info;

use crate::catalog;
use crate::catalog::AlgorithmFamily;
use crate::catalog::CandidateOrder;
use crate::catalog::OperandLookup;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum AlgorithmFingerprint {
    PrimalityCheck { n: i32 },
    CollatzSteps { n: i32 },
    DigitalRoot { n: i32 },
    Fibonacci { n: i32 },
    Factorial { n: i32 },
    Gcd { a: i32, b: i32 },
    Unrecognized,
}

impl AlgorithmFingerprint {
    pub fn family(&self) -> Option<AlgorithmFamily> {
        match self {
            AlgorithmFingerprint::PrimalityCheck { .. } => Some(AlgorithmFamily::PrimalityCheck),
            AlgorithmFingerprint::CollatzSteps { .. } => Some(AlgorithmFamily::CollatzSteps),
            AlgorithmFingerprint::DigitalRoot { .. } => Some(AlgorithmFamily::DigitalRoot),
            AlgorithmFingerprint::Fibonacci { .. } => Some(AlgorithmFamily::Fibonacci),
            AlgorithmFingerprint::Factorial { .. } => Some(AlgorithmFamily::Factorial),
            AlgorithmFingerprint::Gcd { .. } => Some(AlgorithmFamily::Gcd),
            AlgorithmFingerprint::Unrecognized => None,
        }
    }

    pub fn is_recognized(&self) -> bool {
        self.family().is_some()
    }
}

/// Fingerprint `text`, which may be raw or normalized source.
///
/// Families are tried in catalog order and the first cue hit decides the
/// family; operands are then searched independently of the other families.
pub fn fingerprint(text: &str) -> AlgorithmFingerprint {
    let Some(entry) = catalog::detect(text) else {
        info!("no algorithm family matched; emitting fallback module");
        return AlgorithmFingerprint::Unrecognized;
    };
    let family = entry.family;
    let fingerprint = match family {
        AlgorithmFamily::PrimalityCheck => AlgorithmFingerprint::PrimalityCheck {
            n: extract_operand(family, &PRIME_PATTERNS, text),
        },
        AlgorithmFamily::CollatzSteps => AlgorithmFingerprint::CollatzSteps {
            n: extract_operand(family, &COLLATZ_PATTERNS, text),
        },
        AlgorithmFamily::DigitalRoot => AlgorithmFingerprint::DigitalRoot {
            n: extract_operand(family, &DIGITAL_ROOT_PATTERNS, text),
        },
        AlgorithmFamily::Fibonacci => AlgorithmFingerprint::Fibonacci {
            n: extract_operand(family, &FIBONACCI_PATTERNS, text),
        },
        AlgorithmFamily::Factorial => AlgorithmFingerprint::Factorial {
            n: extract_operand(family, &FACTORIAL_PATTERNS, text),
        },
        AlgorithmFamily::Gcd => AlgorithmFingerprint::Gcd {
            a: extract_operand(family, &GCD_FIRST_PATTERNS, text),
            b: extract_operand(family, &GCD_SECOND_PATTERNS, text),
        },
    };
    debug!(%family, ?fingerprint, "classified source");
    fingerprint
}

/// Compiled regexes for one [`OperandLookup`], built on first use.
struct OperandPatterns {
    lookup: &'static OperandLookup,
    /// One regex per name for [`CandidateOrder::Priority`], a single
    /// alternation for [`CandidateOrder::Leftmost`].
    assignments: Vec<Regex>,
    call: Option<Regex>,
}

impl OperandPatterns {
    fn compile(lookup: &'static OperandLookup) -> Self {
        let assignments = match lookup.order {
            CandidateOrder::Priority => lookup
                .names
                .iter()
                .map(|name| static_regex(&assignment_pattern(&[*name])))
                .collect(),
            CandidateOrder::Leftmost => vec![static_regex(&assignment_pattern(lookup.names))],
        };
        let call = lookup.call.map(|call| static_regex(&call_pattern(call)));
        Self {
            lookup,
            assignments,
            call,
        }
    }
}

static PRIME_PATTERNS: LazyLock<OperandPatterns> =
    LazyLock::new(|| OperandPatterns::compile(&catalog::PRIME_OPERAND));
static COLLATZ_PATTERNS: LazyLock<OperandPatterns> =
    LazyLock::new(|| OperandPatterns::compile(&catalog::COLLATZ_OPERAND));
static DIGITAL_ROOT_PATTERNS: LazyLock<OperandPatterns> =
    LazyLock::new(|| OperandPatterns::compile(&catalog::DIGITAL_ROOT_OPERAND));
static FIBONACCI_PATTERNS: LazyLock<OperandPatterns> =
    LazyLock::new(|| OperandPatterns::compile(&catalog::FIBONACCI_OPERAND));
static FACTORIAL_PATTERNS: LazyLock<OperandPatterns> =
    LazyLock::new(|| OperandPatterns::compile(&catalog::FACTORIAL_OPERAND));
static GCD_FIRST_PATTERNS: LazyLock<OperandPatterns> =
    LazyLock::new(|| OperandPatterns::compile(&catalog::GCD_FIRST_OPERAND));
static GCD_SECOND_PATTERNS: LazyLock<OperandPatterns> =
    LazyLock::new(|| OperandPatterns::compile(&catalog::GCD_SECOND_OPERAND));

#[expect(clippy::expect_used)]
fn static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("operand pattern built from static names must compile")
}

fn extract_operand(family: AlgorithmFamily, patterns: &OperandPatterns, text: &str) -> i32 {
    let found = patterns
        .assignments
        .iter()
        .find_map(|regex| first_operand(regex, text))
        .or_else(|| {
            patterns
                .call
                .as_ref()
                .and_then(|regex| first_operand(regex, text))
        });

    match found {
        Some(value) => value,
        None => {
            let default = patterns.lookup.default;
            info!(
                %family,
                default,
                "no operand found in source; using family default"
            );
            default
        }
    }
}

fn assignment_pattern(names: &[&str]) -> String {
    let alternatives = names
        .iter()
        .map(|name| regex_lite::escape(name))
        .collect::<Vec<_>>()
        .join("|");
    format!(r"\b(?:{alternatives})\s*=\s*(\d+)")
}

fn call_pattern(call: &str) -> String {
    format!(r"{}\s*\(\s*(\d+)\s*\)", regex_lite::escape(call))
}

/// First capture of `regex` in `text` that fits in an `i32`.
fn first_operand(regex: &Regex, text: &str) -> Option<i32> {
    regex.captures_iter(text).find_map(|caps| {
        let literal = caps.get(1)?.as_str();
        match literal.parse::<i32>() {
            Ok(value) => Some(value),
            Err(err) => {
                debug!(%literal, error = %err, "operand literal out of range");
                None
            }
        }
    })
}
