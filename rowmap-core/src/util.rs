pub fn separated_by<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) where
    F: FnMut(&mut String, T),
{
    let mut len = out.len();
    for v in values {
        if out.len() > len {
            out.push_str(separator);
        }
        len = out.len();
        f(out, v);
    }
}

/// Case-insensitive ASCII key used to match column labels against record tags.
pub fn column_key(name: &str) -> String {
    name.to_ascii_lowercase()
}

/// True if `query` starts with the `SELECT` keyword (ignoring leading
/// whitespace and case).
pub fn starts_with_select(query: &str) -> bool {
    let query = query.trim_start();
    query
        .get(..6)
        .is_some_and(|v| v.eq_ignore_ascii_case("select"))
        && query[6..]
            .chars()
            .next()
            .is_none_or(|c| c.is_whitespace() || c == '*' || c == '(')
}

/// Longest prefix of `value` not exceeding `max` bytes that ends on a char boundary.
pub fn truncate_at(value: &str, max: usize) -> &str {
    if value.len() <= max {
        return value;
    }
    let mut end = max;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}

#[macro_export]
macro_rules! truncate_long {
    ($query:expr) => {
        format_args!(
            "{}{}",
            $crate::truncate_at(&$query, 497).trim_end(),
            if $query.len() > 497 { "..." } else { "" },
        )
    };
}
