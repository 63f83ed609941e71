//! Helpers for composing solver script text.

use unicode_normalization::UnicodeNormalization;

/// How [`freefemize`] shapes a sanitized name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameStyle {
    /// A script identifier: underscore-separated parts joined in CamelCase.
    Variable,
    /// Human-readable upper-case text, parts separated by single spaces.
    Header,
}

/// Prefix of every marker line the generated fragments print.
pub const FLAG_PREFIX: &str = "# FLAG > ";

/// Turns an arbitrary name into something the solver script accepts.
///
/// The name is decomposed (NFKD) and only its ASCII characters are kept,
/// so accented letters lose their accents. Every run of other non-word
/// characters then becomes a single underscore before the style is applied.
pub fn freefemize(name: &str, style: NameStyle) -> String {
    let mut sanitized = String::with_capacity(name.len());
    let mut in_separator = false;
    for c in name.nfkd().filter(char::is_ascii) {
        if c.is_ascii_alphanumeric() || c == '_' {
            sanitized.push(c);
            in_separator = false;
        } else if !in_separator {
            sanitized.push('_');
            in_separator = true;
        }
    }

    match style {
        NameStyle::Variable => {
            if !sanitized.contains('_') {
                return sanitized;
            }
            sanitized.split('_').map(capitalize_first_letter).collect()
        }
        NameStyle::Header => sanitized
            .split('_')
            .filter(|part| !part.is_empty())
            .collect::<Vec<&str>>()
            .join(" ")
            .to_uppercase(),
    }
}

fn capitalize_first_letter(part: &str) -> String {
    let mut chars = part.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// The marker line announcing the block called `name` in captured output.
pub fn flagize(name: &str) -> String {
    format!("{FLAG_PREFIX}{}", freefemize(name, NameStyle::Header))
}

/// Script statement printing the marker for `name` on its own line.
pub fn print_flag(name: &str) -> String {
    format!("cout << \"{}\" << endl;\n", flagize(name))
}

/// Renders a call such as `adaptmesh( Th, err = 0.2 )`.
pub fn function_call(name: &str, args: &[&str], kwargs: &[(&str, &str)]) -> String {
    let mut parts: Vec<String> = args.iter().map(|arg| format!(" {arg}")).collect();
    parts.extend(kwargs.iter().map(|(key, value)| format!(" {key} = {value}")));
    format!("{name}({} )", parts.join(","))
}

/// A comment banner separating sections of an assembled script.
pub fn header_frame(header: &str) -> String {
    format!(
        "\n/////////////////////////////\n\
        //\n\
        //    {header}\n\
        //\n\
        /////////////////////////////\n\n"
    )
}

/// Whether `name` can be used as a script identifier as-is.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => chars.all(|c| c.is_ascii_alphanumeric()),
        _ => false,
    }
}
