use squill::models::enums::{ServiceLanguage, StatementFinishState};
use squill::splitter::{DEFAULT_DELIMITER, determine_statement_ranges, statement_index_from_position};

fn text_of<'a>(sql: &'a str, span: &squill::StatementSpan) -> &'a str {
    &sql[span.span.start..span.span.start + span.span.length]
}

#[test]
fn custom_delimiter_scenario() {
    // The doubled-dollar delimiter yields exactly two ranges, with the
    // delimiter bracketed into each span.
    let sql = "SELECT 1$$ SELECT 2$$";
    let spans = determine_statement_ranges(sql, "$$", ServiceLanguage::MySql);
    assert_eq!(spans.len(), 2);
    assert_eq!(text_of(sql, &spans[0]), "SELECT 1$$");
    assert_eq!(text_of(sql, &spans[1]), " SELECT 2$$");
    assert_eq!(&sql[spans[0].content_start..spans[0].span.length - 2], "SELECT 1");
}

#[test]
fn ranges_tile_the_buffer() {
    let sql = "SELECT a FROM t;\n# comment ;\nUPDATE t SET a = 'x;y';\n\nSELECT 2";
    let spans = determine_statement_ranges(sql, DEFAULT_DELIMITER, ServiceLanguage::MySql);

    let mut cursor = 0;
    for span in &spans {
        assert_eq!(span.span.start, cursor, "ranges must not overlap or leave gaps");
        cursor += span.span.length;
    }
    assert_eq!(cursor, sql.len());
}

#[test]
fn delimiter_redefinition_scopes_forward() {
    let sql = "SELECT 1;\nDELIMITER //\nSELECT 2//SELECT 3//\nDELIMITER ;\nSELECT 4;";
    let spans = determine_statement_ranges(sql, DEFAULT_DELIMITER, ServiceLanguage::MySql);

    let complete: Vec<&str> = spans
        .iter()
        .filter(|s| s.state == StatementFinishState::Complete)
        .map(|s| text_of(sql, s).trim())
        .collect();
    assert_eq!(complete, vec!["SELECT 1;", "SELECT 2//", "SELECT 3//", "SELECT 4;"]);

    let changes: Vec<&str> = spans
        .iter()
        .filter(|s| s.state == StatementFinishState::DelimiterChange)
        .map(|s| s.delimiter.as_str())
        .collect();
    assert_eq!(changes, vec!["//", ";"]);
}

#[test]
fn trigger_body_with_delimiter_redefinition() {
    let sql = "DELIMITER $$\nCREATE TRIGGER trg BEFORE INSERT ON t FOR EACH ROW\nBEGIN\n  SET NEW.a = 1;\n  SET NEW.b = 2;\nEND$$\nDELIMITER ;\n";
    let spans = determine_statement_ranges(sql, DEFAULT_DELIMITER, ServiceLanguage::MySql);

    let trigger = spans
        .iter()
        .find(|s| s.state == StatementFinishState::Complete)
        .expect("trigger statement found");
    let text = text_of(sql, trigger);
    assert!(text.contains("NEW.a"));
    assert!(text.contains("NEW.b"));
    assert!(text.trim_end().ends_with("END$$"));
}

#[test]
fn compound_body_protects_default_delimiter() {
    let sql = "CREATE PROCEDURE p() BEGIN SELECT 1; SELECT 2; END;SELECT 3;";
    let spans = determine_statement_ranges(sql, DEFAULT_DELIMITER, ServiceLanguage::MySql);
    assert_eq!(spans.len(), 2);
    assert!(text_of(sql, &spans[0]).contains("SELECT 2"));
    assert_eq!(text_of(sql, &spans[1]), "SELECT 3;");
}

#[test]
fn open_string_and_comment_states() {
    let sql = "SELECT 'unfinished";
    let spans = determine_statement_ranges(sql, DEFAULT_DELIMITER, ServiceLanguage::MySql);
    assert_eq!(spans[0].state, StatementFinishState::OpenString);

    let sql = "SELECT 1; /* open";
    let spans = determine_statement_ranges(sql, DEFAULT_DELIMITER, ServiceLanguage::MySql);
    assert_eq!(spans.last().unwrap().state, StatementFinishState::OpenComment);
}

#[test]
fn sqlite_has_no_hash_comments() {
    // `#` is not a comment in SQLite; the delimiter inside must split.
    let sql = "SELECT 1 # not a comment;SELECT 2;";
    let spans = determine_statement_ranges(sql, DEFAULT_DELIMITER, ServiceLanguage::Sqlite);
    assert_eq!(spans.len(), 2);

    let spans = determine_statement_ranges(sql, DEFAULT_DELIMITER, ServiceLanguage::MySql);
    assert_eq!(spans.len(), 1);
}

#[test]
fn position_lookup_is_consistent_with_ranges() {
    let sql = "SELECT 1;  SELECT 22;   SELECT 333;";
    let spans = determine_statement_ranges(sql, DEFAULT_DELIMITER, ServiceLanguage::MySql);
    assert_eq!(spans.len(), 3);

    for (index, span) in spans.iter().enumerate() {
        let middle = span.span.start + span.span.length / 2;
        assert_eq!(statement_index_from_position(&spans, middle, false), Some(index));
    }
    assert_eq!(statement_index_from_position(&[], 0, false), None);
}
