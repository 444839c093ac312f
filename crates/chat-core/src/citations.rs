//! Citation resolver — maps inline `[n]` markers in answer text to
//! citation records.
//!
//! Marker detection is a single forward scan producing literal-text and
//! reference segments, so adjacent or repeated markers (`"[1][1]"`)
//! come out right without repeated find-and-replace passes.

use chat_types::citation::Citation;

/// One displayable piece of an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    /// A reference to the citation with this id in the owning
    /// message's citation list.
    Reference(u32),
}

/// Split `text` into literal and reference segments.
///
/// Only markers whose id matches one of `citations` become references;
/// anything else stays literal text. Text with no markers yields a
/// single `Text` segment, so re-segmenting resolved output is a no-op.
pub fn segment(text: &str, citations: &[Citation]) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = text;

    while let Some(open) = rest.find('[') {
        let (before, bracketed) = rest.split_at(open);
        literal.push_str(before);

        match parse_marker(bracketed) {
            Some((id, consumed)) if citations.iter().any(|c| c.id == id) => {
                if !literal.is_empty() {
                    segments.push(Segment::Text(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Reference(id));
                rest = &bracketed[consumed..];
            }
            _ => {
                // Not a marker, or no matching citation: keep the '['
                // literal and continue past it.
                literal.push('[');
                rest = &bracketed[1..];
            }
        }
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Text(literal));
    }
    segments
}

/// Final citation list for an answer: the server-supplied list when
/// present, otherwise one synthetic citation per distinct marker id.
///
/// The synthetic path is a degraded mode that keeps rendering alive
/// when the upstream service omits citation metadata; the placeholder
/// URL is deterministic so resolving twice yields the same list.
pub fn resolve(answer: &str, supplied: Vec<Citation>) -> Vec<Citation> {
    if !supplied.is_empty() {
        return supplied;
    }
    synthesize(answer)
}

fn synthesize(answer: &str) -> Vec<Citation> {
    let mut citations: Vec<Citation> = Vec::new();
    let mut rest = answer;

    while let Some(open) = rest.find('[') {
        let bracketed = &rest[open..];
        match parse_marker(bracketed) {
            Some((id, consumed)) => {
                if !citations.iter().any(|c| c.id == id) {
                    citations.push(Citation::new(
                        id,
                        format!("Source {id}"),
                        format!("https://example.com/source/{id}"),
                    ));
                }
                rest = &bracketed[consumed..];
            }
            None => rest = &bracketed[1..],
        }
    }

    citations
}

/// Parse a `[<digits>]` marker at the start of `s` (which begins with
/// '['). Returns the id and the number of bytes consumed.
fn parse_marker(s: &str) -> Option<(u32, usize)> {
    debug_assert!(s.starts_with('['));
    let close = s.find(']')?;
    let digits = &s[1..close];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let id = digits.parse().ok()?;
    Some((id, close + 1))
}
