//! Expression-to-observation compiling.
//! - compile: rewrite a user property-path expression into a guarded
//!   evaluable form and a display form

use loupe_model::ROOT_TOKEN;

/// Placeholder for the watched model's constructor name in the display
/// form; resolved when the watch is created.
pub const DISPLAY_PLACEHOLDER: &str = "$model";

/// Result of compiling one user expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledExpression {
    /// Null-safe form rooted at [`ROOT_TOKEN`], ready for the host parser.
    pub guarded: String,
    /// Human-readable form rooted at [`DISPLAY_PLACEHOLDER`]; unguarded.
    pub display: String,
    /// True when the raw expression contains a comparison character,
    /// selecting the rising-edge trigger policy.
    pub boolean_test: bool,
}

/// Characters that may precede an identifier run. Scanning only after a
/// delimiter keeps the rewrite out of numeric literals and operators.
const DELIMITERS: &[char] = &[
    '=', '>', '<', '!', '/', '%', '+', '-', '*', '&', '(', ')', '~', '?', ',', '[', ']',
];

const KEYWORDS: &[&str] = &["true", "false", "null", "undefined"];

/// Rewrite `expression` so every property-path run is a null-safe accessor
/// chain: `a.b.c` becomes `(vm.a && vm.a.b && vm.a.b.c)`, a single segment
/// becomes `vm.a`. Literal keywords are left untouched.
#[must_use]
pub fn compile(expression: &str) -> CompiledExpression {
    let chars: Vec<char> = expression.chars().collect();
    let mut guarded = String::new();
    let mut display = String::new();
    let mut pos = 0;
    let mut prev: Option<char> = None;

    while pos < chars.len() {
        let c = chars[pos];
        let at_boundary = prev.is_none_or(|p| p.is_whitespace() || DELIMITERS.contains(&p));
        if at_boundary && (c.is_ascii_alphabetic() || c == '_') {
            let start = pos;
            while pos < chars.len() && is_run_char(chars[pos]) {
                pos += 1;
            }
            let mut end = pos;
            // a trailing dot belongs to the surrounding text, not the run
            while end > start && chars[end - 1] == '.' {
                end -= 1;
            }
            let run: String = chars[start..end].iter().collect();
            let rest: String = chars[end..pos].iter().collect();
            if KEYWORDS.contains(&run.as_str()) {
                guarded.push_str(&run);
                display.push_str(&run);
            } else {
                guarded.push_str(&guard_run(&run));
                display.push_str(&format!("{DISPLAY_PLACEHOLDER}.{run}"));
            }
            guarded.push_str(&rest);
            display.push_str(&rest);
            prev = chars.get(pos.wrapping_sub(1)).copied();
            continue;
        }
        guarded.push(c);
        display.push(c);
        prev = Some(c);
        pos += 1;
    }

    CompiledExpression {
        guarded,
        display,
        boolean_test: expression.contains(['!', '=', '<', '>']),
    }
}

fn is_run_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

fn guard_run(run: &str) -> String {
    let segments: Vec<&str> = run.split('.').collect();
    if segments.len() == 1 {
        return format!("{ROOT_TOKEN}.{run}");
    }
    let mut chain = Vec::with_capacity(segments.len());
    let mut path = String::from(ROOT_TOKEN);
    for segment in segments {
        path.push('.');
        path.push_str(segment);
        chain.push(path.clone());
    }
    format!("({})", chain.join(" && "))
}
