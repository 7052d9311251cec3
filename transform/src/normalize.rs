//! Rewrites C-like source into the constrained dialect the zkVM accepts.
//!
//! Each rule is a pure function from the current text to an optional
//! rewritten text plus the [`Rewrite`] it performed. Rules run in a fixed
//! order and only report a change when the text actually changed, so
//! normalizing already-normalized source is a no-op.

use std::sync::LazyLock;

use regex_lite::Captures;
use regex_lite::Regex;
use serde::Serialize;
use tracing::debug;

const STDINT_INCLUDE_LINE: &str = "#include <stdint.h>";
const BUFFER_SIZE_DEFINE: &str = "#define BUFFER_SIZE 1000";
const STACK_BUFFER_DECL: &str = "int32_t stack_buffer[BUFFER_SIZE];";

#[expect(clippy::expect_used)]
fn static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("hard-coded pattern must compile")
}

static NATIVE_DECL: LazyLock<Regex> = LazyLock::new(|| static_regex(r"\b(?:int|float)\s+"));
static STDINT_INCLUDE: LazyLock<Regex> = LazyLock::new(|| static_regex(r"#include\s*<stdint\.h>"));
static OUTPUT_CALL: LazyLock<Regex> = LazyLock::new(|| static_regex(r"printf\s*\([^;]+\);"));
static INPUT_CALL: LazyLock<Regex> = LazyLock::new(|| static_regex(r"scanf\s*\([^;]+\);"));
static ENTRY_POINT: LazyLock<Regex> =
    LazyLock::new(|| static_regex(r"int32_t\s+main\s*\(([^)]*)\)"));
static ENTRY_NAME: LazyLock<Regex> = LazyLock::new(|| static_regex(r"\bmain\s*\("));
static ALLOC_CALL: LazyLock<Regex> = LazyLock::new(|| static_regex(r"\bmalloc\s*\("));
// `p = malloc(..)` with an optional cast and one level of nested parentheses
// in the size expression, e.g. `p = (int32_t*)malloc(n * sizeof(int32_t))`.
static ALLOC_ASSIGN: LazyLock<Regex> = LazyLock::new(|| {
    static_regex(r"(\w+)\s*=\s*(?:\([^()]*\)\s*)?malloc\s*\((?:[^()]|\([^()]*\))*\)")
});
static FREE_CALL: LazyLock<Regex> =
    LazyLock::new(|| static_regex(r"\bfree\s*\((?:[^()]|\([^()]*\))*\)\s*;"));
static INCLUDE_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| static_regex(r"#include\s*<[^>]+>"));

/// One rewrite applied by the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rewrite {
    AddedStdintInclude,
    NarrowedNativeTypes,
    RemovedOutputCalls,
    RemovedInputCalls,
    DroppedEntryPointArguments,
    ConvertedHeapToStack,
}

impl Rewrite {
    pub fn description(self) -> &'static str {
        match self {
            Rewrite::AddedStdintInclude => "Added #include <stdint.h>",
            Rewrite::NarrowedNativeTypes => "Converted int/float to int32_t",
            Rewrite::RemovedOutputCalls => "Removed printf statements",
            Rewrite::RemovedInputCalls => "Removed scanf statements",
            Rewrite::DroppedEntryPointArguments => "Fixed main signature for hardcoded values",
            Rewrite::ConvertedHeapToStack => "Converted dynamic allocation to stack",
        }
    }
}

impl std::fmt::Display for Rewrite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// Normalized source paired with the ordered log of rewrites that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSource {
    pub text: String,
    pub changes: Vec<Rewrite>,
}

impl NormalizedSource {
    pub fn change_descriptions(&self) -> Vec<String> {
        self.changes
            .iter()
            .map(|change| change.description().to_string())
            .collect()
    }

    pub fn is_unchanged(&self) -> bool {
        self.changes.is_empty()
    }
}

type Rule = fn(&str) -> Option<(String, Rewrite)>;

const RULES: [Rule; 6] = [
    inject_stdint_include,
    narrow_native_types,
    elide_output_calls,
    elide_input_calls,
    drop_entry_point_arguments,
    convert_heap_to_stack,
];

pub fn normalize(source: &str) -> NormalizedSource {
    let mut text = source.to_string();
    let mut changes = Vec::new();
    for rule in RULES {
        if let Some((rewritten, change)) = rule(&text) {
            debug!(change = %change, "applied normalization rule");
            text = rewritten;
            changes.push(change);
        }
    }
    NormalizedSource { text, changes }
}

fn inject_stdint_include(text: &str) -> Option<(String, Rewrite)> {
    if !NATIVE_DECL.is_match(text) || STDINT_INCLUDE.is_match(text) {
        return None;
    }
    let rewritten = match text.rfind("#include") {
        Some(pos) => match text[pos..].find('\n') {
            Some(offset) => {
                let (head, tail) = text.split_at(pos + offset + 1);
                format!("{head}{STDINT_INCLUDE_LINE}\n{tail}")
            }
            None => format!("{text}\n{STDINT_INCLUDE_LINE}\n"),
        },
        None => format!("{STDINT_INCLUDE_LINE}\n\n{text}"),
    };
    Some((rewritten, Rewrite::AddedStdintInclude))
}

/// Floats are narrowed too: the target has no floating-point arithmetic.
fn narrow_native_types(text: &str) -> Option<(String, Rewrite)> {
    if !NATIVE_DECL.is_match(text) {
        return None;
    }
    let rewritten = NATIVE_DECL.replace_all(text, "int32_t ").into_owned();
    Some((rewritten, Rewrite::NarrowedNativeTypes))
}

fn elide_output_calls(text: &str) -> Option<(String, Rewrite)> {
    replace_calls(text, &OUTPUT_CALL, "/* printf removed */;", Rewrite::RemovedOutputCalls)
}

fn elide_input_calls(text: &str) -> Option<(String, Rewrite)> {
    replace_calls(text, &INPUT_CALL, "/* scanf removed */;", Rewrite::RemovedInputCalls)
}

fn replace_calls(
    text: &str,
    pattern: &Regex,
    marker: &str,
    change: Rewrite,
) -> Option<(String, Rewrite)> {
    if !pattern.is_match(text) {
        return None;
    }
    Some((pattern.replace_all(text, marker).into_owned(), change))
}

/// Values are baked in as constants downstream, so `main` takes no arguments.
fn drop_entry_point_arguments(text: &str) -> Option<(String, Rewrite)> {
    let takes_arguments = |caps: &Captures<'_>| {
        let params = caps.get(1).map_or("", |m| m.as_str()).trim();
        !params.is_empty() && params != "void"
    };
    if !ENTRY_POINT.captures_iter(text).any(|caps| takes_arguments(&caps)) {
        return None;
    }
    let rewritten = ENTRY_POINT
        .replace_all(text, |caps: &Captures<'_>| {
            if takes_arguments(caps) {
                "int32_t main()".to_string()
            } else {
                caps.get(0).map_or_else(String::new, |m| m.as_str().to_string())
            }
        })
        .into_owned();
    Some((rewritten, Rewrite::DroppedEntryPointArguments))
}

fn convert_heap_to_stack(text: &str) -> Option<(String, Rewrite)> {
    if !ALLOC_CALL.is_match(text) {
        return None;
    }

    let mut rewritten = text.to_string();
    if !rewritten.contains("#define BUFFER_SIZE") {
        let includes_end = INCLUDE_DIRECTIVE.find_iter(&rewritten).last().map(|m| m.end());
        rewritten = match includes_end {
            Some(end) => {
                let (head, tail) = rewritten.split_at(end);
                format!("{head}\n{BUFFER_SIZE_DEFINE}\n{tail}")
            }
            None => format!("{BUFFER_SIZE_DEFINE}\n{rewritten}"),
        };
    }

    rewritten = ALLOC_ASSIGN
        .replace_all(&rewritten, "${1} = (int32_t*)stack_buffer")
        .into_owned();
    rewritten = FREE_CALL
        .replace_all(&rewritten, "/* free removed */;")
        .into_owned();

    if !rewritten.contains(STACK_BUFFER_DECL)
        && let Some(brace) = entry_body_start(&rewritten)
    {
        rewritten.insert_str(brace + 1, &format!("\n    {STACK_BUFFER_DECL}\n"));
    }

    (rewritten != text).then_some((rewritten, Rewrite::ConvertedHeapToStack))
}

/// Byte offset of the `{` opening the entry point's body.
fn entry_body_start(text: &str) -> Option<usize> {
    let name = ENTRY_NAME.find(text)?;
    text[name.end()..]
        .find('{')
        .map(|offset| name.end() + offset)
}
