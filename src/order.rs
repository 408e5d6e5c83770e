use log::{debug, warn};

use crate::errors::BenchError;

/// Order archive array names by where they first occur in the program source.
///
/// This is a stable sort on the byte index of each name's first occurrence,
/// so names that tie keep archive order. A name that never occurs is an
/// error: the archive and the program disagree, and guessing a position
/// would silently bind the wrong buffer.
pub fn argument_order<'a, I>(source: &str, names: I) -> Result<Vec<String>, BenchError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut positioned = Vec::new();
    for name in names {
        let index = source
            .find(name)
            .ok_or_else(|| BenchError::UnresolvedArgument {
                name: name.to_string(),
            })?;
        positioned.push((index, name));
    }

    for ambiguity in find_ambiguities(&positioned) {
        warn!("{}", ambiguity);
    }

    positioned.sort_by_key(|(index, _)| *index);
    let order: Vec<String> = positioned
        .into_iter()
        .map(|(_, name)| name.to_string())
        .collect();
    debug!("argument order: {:?}", order);
    Ok(order)
}

/// Cases where first-occurrence ordering is not obviously what the compiled
/// function expects. They are reported, never corrected.
fn find_ambiguities(positioned: &[(usize, &str)]) -> Vec<String> {
    let mut out = Vec::new();
    for (i, (index_a, a)) in positioned.iter().enumerate() {
        for (index_b, b) in &positioned[i + 1..] {
            if a.is_empty() || b.is_empty() {
                continue;
            }
            if index_a == index_b {
                out.push(format!(
                    "arrays '{}' and '{}' first occur at the same offset {}; their relative order follows the archive",
                    a, b, index_a
                ));
            } else if a.contains(b) || b.contains(a) {
                out.push(format!(
                    "array name '{}' is a substring of '{}'; first-occurrence order may not match the parameter list",
                    if a.len() < b.len() { a } else { b },
                    if a.len() < b.len() { b } else { a },
                ));
            }
        }
    }
    out
}
