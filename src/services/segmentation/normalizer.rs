// Raw model text -> canonical catalog label

/// End-of-generation marker some chat templates leak into the output
pub const END_OF_UTTERANCE: &str = "<end_of_utterance>";

/// Clean a raw model answer into a label suitable for catalog lookup.
///
/// Strips the end-of-utterance marker, trims whitespace and periods, then
/// title-cases. The result is not checked against the allowed label set; an
/// off-list answer simply misses the catalog later on.
pub fn normalize_answer(raw: &str) -> String {
    let cleaned = raw.replace(END_OF_UTTERANCE, "");
    let trimmed = cleaned.trim_matches(|c: char| c.is_whitespace() || c == '.');
    title_case(trimmed)
}

/// Upper-case every letter that follows a non-letter, lower-case the rest.
///
/// Tokens without letters ("50+", "30-40") pass through unchanged.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_letter = false;

    for ch in s.chars() {
        if ch.is_alphabetic() {
            if prev_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(ch);
            prev_is_letter = false;
        }
    }
    out
}
