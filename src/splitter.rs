//! Statement splitting.
//!
//! Walks the raw buffer character by character, honoring comments,
//! quoted strings/identifiers, in-buffer DELIMITER redefinition and
//! compound statement bodies, and produces the list of statement spans
//! the editor hangs its decorations on. The spans tile the buffer: each
//! one includes leading whitespace and the terminating delimiter.

use crate::models::enums::{ServiceLanguage, StatementFinishState};
use crate::models::structs::{StatementSpan, TextSpan};

/// Default statement delimiter.
pub const DEFAULT_DELIMITER: &str = ";";

/// Splits `sql` into statement ranges, starting with `delimiter` as the
/// active delimiter. A `DELIMITER <new>` directive switches the active
/// delimiter from that point to the next directive or the end of the
/// buffer. Delimiters inside strings, comments and compound
/// (BEGIN/CASE .. END) bodies never split.
pub fn determine_statement_ranges(
    sql: &str,
    delimiter: &str,
    language: ServiceLanguage,
) -> Vec<StatementSpan> {
    let bytes = sql.as_bytes();
    let end = bytes.len();
    let hash_comments = language == ServiceLanguage::MySql;
    let delimiter_directive = language == ServiceLanguage::MySql;

    let mut delimiter = delimiter.to_string();
    let mut result: Vec<StatementSpan> = Vec::new();

    let mut start = 0usize; // Span start, including leading whitespace.
    let mut head = start; // Where actual content starts.
    let mut tail = head; // Scan position.
    let mut have_content = false;
    let mut compound_depth = 0usize;

    let push = |result: &mut Vec<StatementSpan>,
                delimiter: &str,
                start: usize,
                length: usize,
                content_start: usize,
                state: StatementFinishState| {
        result.push(StatementSpan {
            delimiter: delimiter.to_string(),
            span: TextSpan { start, length },
            content_start,
            state,
        });
    };

    while tail < end {
        // Check for the active delimiter first, unless a compound body
        // is open.
        if compound_depth == 0 && bytes[tail] == delimiter.as_bytes()[0] {
            let delim_len = delimiter.len();
            if tail + delim_len <= end && &sql[tail..tail + delim_len] == delimiter {
                tail += delim_len;
                push(
                    &mut result,
                    &delimiter,
                    start,
                    tail - start,
                    if have_content { head } else { start },
                    StatementFinishState::Complete,
                );
                head = tail;
                start = head;
                have_content = false;
                continue;
            }
        }

        match bytes[tail] {
            b'/' => {
                // Multi line comment, possibly a hidden command (`/*!`).
                if tail + 1 < end && bytes[tail + 1] == b'*' {
                    if tail + 2 < end && bytes[tail + 2] == b'!' {
                        if !have_content {
                            have_content = true;
                            head = tail;
                        }
                        tail += 1;
                    }
                    tail += 2;

                    loop {
                        while tail < end && bytes[tail] != b'*' {
                            tail += 1;
                        }

                        if tail == end {
                            // Unfinished multi line comment.
                            push(
                                &mut result,
                                &delimiter,
                                start,
                                tail - start,
                                if have_content { head } else { start },
                                StatementFinishState::OpenComment,
                            );
                            start = tail;
                            head = tail;
                            break;
                        }
                        tail += 1;
                        if tail < end && bytes[tail] == b'/' {
                            tail += 1;
                            break;
                        }
                    }

                    if !have_content {
                        head = tail;
                    }
                } else {
                    tail += 1;
                    have_content = true;
                }
            }

            b'-' => {
                // `-- ` single line comment.
                if tail + 1 < end
                    && bytes[tail + 1] == b'-'
                    && (tail + 2 >= end || matches!(bytes[tail + 2], b' ' | b'\t' | b'\n'))
                {
                    tail += 2;
                    while tail < end && bytes[tail] != b'\n' {
                        tail += 1;
                    }

                    if tail == end {
                        push(
                            &mut result,
                            &delimiter,
                            start,
                            tail - start,
                            if have_content { head } else { start },
                            StatementFinishState::OpenComment,
                        );
                        start = tail;
                        head = tail;
                        break;
                    }

                    if !have_content {
                        head = tail;
                    }
                } else {
                    tail += 1;
                    have_content = true;
                }
            }

            b'#' if hash_comments => {
                while tail < end && bytes[tail] != b'\n' {
                    tail += 1;
                }

                if tail == end {
                    push(
                        &mut result,
                        &delimiter,
                        start,
                        tail - start,
                        if have_content { head } else { start },
                        StatementFinishState::OpenComment,
                    );
                    start = tail;
                    head = tail;
                    break;
                }

                if !have_content {
                    head = tail;
                }
            }

            quote @ (b'"' | b'\'' | b'`') => {
                // Quoted string or identifier; skip in a local loop.
                have_content = true;
                tail += 1;
                while tail < end && bytes[tail] != quote {
                    // Skip escaped characters.
                    if bytes[tail] == b'\\' {
                        tail += 1;
                    }
                    tail += 1;
                }

                if tail < end && bytes[tail] == quote {
                    tail += 1;
                } else {
                    // Unfinished string.
                    push(
                        &mut result,
                        &delimiter,
                        start,
                        tail - start,
                        if have_content { head } else { start },
                        StatementFinishState::OpenString,
                    );
                    start = tail;
                    head = tail;
                }
            }

            ch if ch.is_ascii_alphabetic() => {
                // A bare word: check for the DELIMITER directive and for
                // compound statement boundaries.
                let word_start = tail;
                let preceded_by_word = word_start > 0
                    && (bytes[word_start - 1].is_ascii_alphanumeric() || bytes[word_start - 1] == b'_');
                while tail < end
                    && (bytes[tail].is_ascii_alphanumeric() || bytes[tail] == b'_')
                {
                    tail += 1;
                }
                let word = &sql[word_start..tail];

                if preceded_by_word {
                    have_content = true;
                    continue;
                }

                if delimiter_directive
                    && word.eq_ignore_ascii_case("delimiter")
                    && tail < end
                    && matches!(bytes[tail], b' ' | b'\t')
                {
                    // Push anything found so far and not yet pushed.
                    if have_content && word_start > start {
                        push(
                            &mut result,
                            &delimiter,
                            start,
                            word_start - start,
                            head,
                            StatementFinishState::NoDelimiter,
                        );
                        start = word_start;
                    }

                    head = word_start;

                    // Skip spaces, then collect up to the next whitespace.
                    let mut run = tail;
                    while run < end && matches!(bytes[run], b' ' | b'\t') {
                        run += 1;
                    }
                    let delim_start = run;
                    while run < end && !matches!(bytes[run], b'\n' | b' ' | b'\t') {
                        run += 1;
                    }

                    let new_delimiter = &sql[delim_start..run];
                    if !new_delimiter.is_empty() {
                        delimiter = new_delimiter.to_string();
                        push(
                            &mut result,
                            &delimiter,
                            start,
                            run - start,
                            head,
                            StatementFinishState::DelimiterChange,
                        );

                        tail = run;
                        head = tail;
                        start = head;
                        have_content = false;
                    } else {
                        have_content = true;
                        head = delim_start;
                        tail = delim_start;
                    }
                    continue;
                }

                if word.eq_ignore_ascii_case("begin") && !begin_is_transaction(sql, tail) {
                    compound_depth += 1;
                } else if word.eq_ignore_ascii_case("case") {
                    compound_depth += 1;
                } else if word.eq_ignore_ascii_case("end") {
                    match following_word(sql, tail).as_deref() {
                        // `END IF` / `END WHILE` / `END LOOP` / `END REPEAT`
                        // close openers we don't track.
                        Some("IF") | Some("WHILE") | Some("LOOP") | Some("REPEAT") => {}
                        _ => {
                            compound_depth = compound_depth.saturating_sub(1);
                        }
                    }
                }

                if !have_content {
                    have_content = true;
                    head = word_start;
                }
            }

            ch => {
                if !have_content && ch > b' ' {
                    have_content = true;
                    head = tail;
                }
                tail += 1;
            }
        }
    }

    // Add the remaining text to the range list.
    if head < end {
        push(
            &mut result,
            &delimiter,
            start,
            end - start,
            if have_content { head } else { start },
            StatementFinishState::NoDelimiter,
        );
    }

    result
}

/// True when a BEGIN word starts a transaction rather than a compound
/// block: followed by nothing, a delimiter, WORK, TRANSACTION or the
/// SQLite transaction qualifiers.
fn begin_is_transaction(sql: &str, after: usize) -> bool {
    match following_word(sql, after) {
        None => true,
        Some(word) => matches!(
            word.as_str(),
            "WORK" | "TRANSACTION" | "DEFERRED" | "IMMEDIATE" | "EXCLUSIVE"
        ),
    }
}

/// The next bare word after `from`, uppercased. Stops at anything that
/// is not whitespace or a word character.
fn following_word(sql: &str, from: usize) -> Option<String> {
    let bytes = sql.as_bytes();
    let mut pos = from;
    while pos < bytes.len() && matches!(bytes[pos], b' ' | b'\t' | b'\r' | b'\n') {
        pos += 1;
    }

    let word_start = pos;
    while pos < bytes.len() && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_') {
        pos += 1;
    }

    if pos == word_start {
        return None;
    }

    Some(sql[word_start..pos].to_ascii_uppercase())
}

/// Index of the statement covering `offset`. With `strict`, whitespace
/// before a statement belongs to that statement; otherwise it belongs
/// to the previous one.
pub fn statement_index_from_position(
    spans: &[StatementSpan],
    offset: usize,
    strict: bool,
) -> Option<usize> {
    if spans.is_empty() {
        return None;
    }

    let mut low = 0usize;
    let mut high = spans.len() - 1;
    while low < high {
        let middle = low + (high - low + 1) / 2;
        if spans[middle].span.start > offset {
            high = middle - 1;
        } else {
            let end = spans[low].span.start + spans[low].span.length;
            if end >= offset {
                break;
            }
            low = middle;
        }
    }

    if strict {
        if spans[low].span.start + spans[low].span.length < offset {
            low += 1;
        }
        if low == spans.len() {
            return None;
        }
    }

    Some(low)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(sql: &str) -> Vec<StatementSpan> {
        determine_statement_ranges(sql, DEFAULT_DELIMITER, ServiceLanguage::MySql)
    }

    fn text_of<'a>(sql: &'a str, span: &StatementSpan) -> &'a str {
        &sql[span.span.start..span.span.start + span.span.length]
    }

    #[test]
    fn splits_on_semicolons() {
        let sql = "SELECT 1;SELECT 2;";
        let spans = split(sql);
        assert_eq!(spans.len(), 2);
        assert_eq!(text_of(sql, &spans[0]), "SELECT 1;");
        assert_eq!(text_of(sql, &spans[1]), "SELECT 2;");
        assert!(spans.iter().all(|s| s.state == StatementFinishState::Complete));
    }

    #[test]
    fn custom_multi_char_delimiter() {
        let sql = "SELECT 1$$ SELECT 2$$";
        let spans = determine_statement_ranges(sql, "$$", ServiceLanguage::MySql);
        assert_eq!(spans.len(), 2);
        assert_eq!(text_of(sql, &spans[0]), "SELECT 1$$");
        assert_eq!(text_of(sql, &spans[1]), " SELECT 2$$");
    }

    #[test]
    fn delimiter_in_string_does_not_split() {
        let sql = "SELECT 'a;b';SELECT 2;";
        let spans = split(sql);
        assert_eq!(spans.len(), 2);
        assert_eq!(text_of(sql, &spans[0]), "SELECT 'a;b';");
    }

    #[test]
    fn delimiter_in_comment_does_not_split() {
        let sql = "SELECT 1 /* ; */;SELECT 2;";
        let spans = split(sql);
        assert_eq!(spans.len(), 2);
    }

    #[test]
    fn delimiter_directive_switches() {
        let sql = "DELIMITER $$\nSELECT 1$$\nDELIMITER ;\nSELECT 2;";
        let spans = split(sql);
        let states: Vec<_> = spans.iter().map(|s| s.state).collect();
        assert_eq!(
            states,
            vec![
                StatementFinishState::DelimiterChange,
                StatementFinishState::Complete,
                StatementFinishState::DelimiterChange,
                StatementFinishState::Complete,
            ]
        );
        assert_eq!(spans[0].delimiter, "$$");
        assert_eq!(spans[2].delimiter, ";");
    }

    #[test]
    fn compound_body_is_not_split() {
        let sql = "CREATE TRIGGER t BEFORE INSERT ON x FOR EACH ROW BEGIN SET @a = 1; SET @b = 2; END;SELECT 1;";
        let spans = split(sql);
        assert_eq!(spans.len(), 2);
        assert!(text_of(sql, &spans[0]).contains("@b"));
    }

    #[test]
    fn end_if_does_not_close_the_block() {
        let sql = "BEGIN IF a THEN SET @x = 1; END IF; SET @y = 2; END;SELECT 1;";
        let spans = split(sql);
        assert_eq!(spans.len(), 2);
        assert!(text_of(sql, &spans[0]).contains("@y"));
    }

    #[test]
    fn case_expression_balances() {
        let sql = "SELECT CASE WHEN a THEN 1 ELSE 2 END;SELECT 2;";
        let spans = split(sql);
        assert_eq!(spans.len(), 2);
    }

    #[test]
    fn begin_work_is_not_a_block() {
        let sql = "BEGIN;SELECT 1;";
        let spans = split(sql);
        assert_eq!(spans.len(), 2);

        let sql = "BEGIN WORK;SELECT 1;";
        let spans = split(sql);
        assert_eq!(spans.len(), 2);
    }

    #[test]
    fn unterminated_string_is_flagged() {
        let sql = "SELECT 'oops";
        let spans = split(sql);
        assert_eq!(spans[0].state, StatementFinishState::OpenString);
    }

    #[test]
    fn unterminated_comment_is_flagged() {
        let sql = "SELECT 1 /* oops";
        let spans = split(sql);
        assert_eq!(spans.last().unwrap().state, StatementFinishState::OpenComment);
    }

    #[test]
    fn trailing_statement_without_delimiter() {
        let sql = "SELECT 1; SELECT 2";
        let spans = split(sql);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[1].state, StatementFinishState::NoDelimiter);
        assert_eq!(text_of(sql, &spans[1]), " SELECT 2");
    }

    #[test]
    fn spans_tile_the_buffer() {
        let sql = "SELECT 1;\n-- gap\nSELECT 2;  SELECT 3";
        let spans = split(sql);
        let mut expected_start = 0;
        for span in &spans {
            assert_eq!(span.span.start, expected_start);
            expected_start = span.span.start + span.span.length;
        }
        assert_eq!(expected_start, sql.len());
    }

    #[test]
    fn index_from_position() {
        let sql = "SELECT 1; SELECT 2;";
        let spans = split(sql);
        assert_eq!(statement_index_from_position(&spans, 2, false), Some(0));
        assert_eq!(statement_index_from_position(&spans, 12, false), Some(1));
        assert_eq!(statement_index_from_position(&spans, 9, false), Some(0));
    }
}
