//! Identifier casing conversions.

/// Uppercases only the first character, leaving the rest untouched.
pub fn first_uppercased(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Converts a GraphQL enum value to lowerCamelCase.
///
/// Words split on underscores, digit/letter boundaries and case transitions.
/// Leading underscores are preserved; a trailing underscore is preserved
/// only when the original had one. Numeric runs stay contiguous, so
/// `BEFORE2023` becomes `before2023`.
pub fn to_lower_camel_case(name: &str) -> String {
    let leading = name.chars().take_while(|c| *c == '_').count();
    let trailing = if name.len() > leading {
        name.chars().rev().take_while(|c| *c == '_').count()
    } else {
        0
    };
    let core = &name[leading..name.len() - trailing];

    let mut words: Vec<String> = Vec::new();
    for segment in core.split('_') {
        words.extend(split_words(segment));
    }

    let mut out = String::with_capacity(name.len());
    out.extend(std::iter::repeat('_').take(leading));
    for (index, word) in words.iter().enumerate() {
        if index == 0 {
            out.push_str(&word.to_lowercase());
        } else if word.chars().all(|c| c.is_ascii_digit()) {
            out.push_str(word);
        } else {
            out.push_str(&first_uppercased(&word.to_lowercase()));
        }
    }
    if trailing > 0 {
        out.push('_');
    }
    out
}

// Splits one underscore-free segment at case transitions and digit/letter
// boundaries: "HTTPRequest" -> ["HTTP", "Request"], "before2023" ->
// ["before", "2023"].
fn split_words(segment: &str) -> Vec<String> {
    let chars: Vec<char> = segment.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (index, &c) in chars.iter().enumerate() {
        if !current.is_empty() {
            let prev = chars[index - 1];
            let upper_after_lower = c.is_uppercase() && (prev.is_lowercase() || prev.is_ascii_digit());
            let upper_run_ends = c.is_uppercase()
                && prev.is_uppercase()
                && chars.get(index + 1).is_some_and(|next| next.is_lowercase());
            let digit_boundary = c.is_ascii_digit() != prev.is_ascii_digit();
            if upper_after_lower || upper_run_ends || digit_boundary {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}
