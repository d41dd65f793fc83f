//! Content line folding (RFC 5545 §3.1).

/// Maximum octets per physical line, excluding CRLF.
const MAX_LINE_OCTETS: usize = 75;

/// ## Summary
/// Folds a content line at 75 octets and terminates it with CRLF.
///
/// Continuation lines begin with a single space, which counts toward
/// their 75 octets. Folds never split a UTF-8 sequence.
#[must_use]
pub fn fold_line(line: &str) -> String {
    let mut out = String::with_capacity(line.len() + line.len() / MAX_LINE_OCTETS * 3 + 2);
    let mut rest = line;
    let mut budget = MAX_LINE_OCTETS;

    while rest.len() > budget {
        let mut cut = budget;
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        let (head, tail) = rest.split_at(cut);
        out.push_str(head);
        out.push_str("\r\n ");
        rest = tail;
        budget = MAX_LINE_OCTETS - 1;
    }

    out.push_str(rest);
    out.push_str("\r\n");
    out
}
