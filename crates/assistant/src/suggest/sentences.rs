//! Crude sentence splitting for question mining.

/// Tried in order; the first one present in the text wins.
const DELIMITERS: [&str; 6] = [". ", "? ", "! ", ".\n", "?\n", "!\n"];

/// Split `text` on the first delimiter it contains.
///
/// Every piece but the last keeps the delimiter's punctuation mark, so a
/// question stays recognisable by its trailing `?`. Text with none of the
/// delimiters comes back whole.
pub fn split_sentences(text: &str) -> Vec<String> {
    for delimiter in DELIMITERS {
        if !text.contains(delimiter) {
            continue;
        }

        let mark = &delimiter[..1];
        let parts: Vec<&str> = text.split(delimiter).collect();
        let last = parts.len() - 1;

        return parts
            .iter()
            .enumerate()
            .map(|(i, part)| {
                if i < last {
                    format!("{}{}", part, mark)
                } else {
                    part.to_string()
                }
            })
            .collect();
    }

    vec![text.to_string()]
}
