use squill::lexer_python::ScriptLexer;
use squill::models::enums::TokenKind;

fn count(tokens: &[squill::Token], kind: TokenKind) -> usize {
    tokens.iter().filter(|t| t.kind == kind).count()
}

#[test]
fn indent_round_trip_over_consistent_buffers() {
    let buffers = [
        "x = 1\n",
        "if a:\n    b\n",
        "def f(x):\n    if x:\n        return 1\n    return 0\n",
        "class C:\n    def m(self):\n        pass\n\nc = C()\n",
        "for i in range(10):\n    while i:\n        i -= 1\n",
        "try:\n    f()\nexcept ValueError:\n    pass\nfinally:\n    done()\n",
    ];

    for source in buffers {
        let result = ScriptLexer::tokenize(source);
        assert!(result.errors.is_empty(), "unexpected errors in {source:?}");
        assert_eq!(
            count(&result.tokens, TokenKind::Indent),
            count(&result.tokens, TokenKind::Dedent),
            "INDENT/DEDENT mismatch in {source:?}"
        );
    }
}

#[test]
fn spec_scenario_token_sequence() {
    // "if x:\n    y\n    z\nw" produces exactly one INDENT/DEDENT pair
    // around the block.
    let result = ScriptLexer::tokenize("if x:\n    y\n    z\nw");
    let kinds: Vec<TokenKind> = result.tokens.iter().map(|t| t.kind).collect();

    let colon = kinds.iter().position(|k| *k == TokenKind::Colon).unwrap();
    assert_eq!(kinds[colon + 1], TokenKind::Newline);
    assert_eq!(kinds[colon + 2], TokenKind::Indent);

    let dedent = kinds.iter().position(|k| *k == TokenKind::Dedent).unwrap();
    assert_eq!(kinds[dedent - 1], TokenKind::Newline);
    // `w` follows the dedent.
    let w = result.tokens.iter().find(|t| t.text == "w").unwrap();
    assert!(w.start > result.tokens[dedent].start || result.tokens[dedent].is_empty());
    assert_eq!(count(&result.tokens, TokenKind::Indent), 1);
    assert_eq!(count(&result.tokens, TokenKind::Dedent), 1);
}

#[test]
fn continuation_inside_brackets_is_joined() {
    let source = "values = [\n    1,\n    2,\n]\nnext_line = 3\n";
    let result = ScriptLexer::tokenize(source);
    assert_eq!(count(&result.tokens, TokenKind::Indent), 0);
    assert_eq!(count(&result.tokens, TokenKind::Dedent), 0);
    // Exactly two logical lines.
    assert_eq!(count(&result.tokens, TokenKind::Newline), 2);
}

#[test]
fn dedent_to_unknown_level_reports_mismatch() {
    let result = ScriptLexer::tokenize("if a:\n      b\n   c\n");
    assert_eq!(result.errors.len(), 1);
    let error = &result.errors[0];
    assert!(error.message.contains("unindent"));
    assert!(error.char_offset > 0);
}

#[test]
fn multiple_dedents_at_end_of_stream() {
    let result = ScriptLexer::tokenize("if a:\n    if b:\n        c");
    assert_eq!(count(&result.tokens, TokenKind::Indent), 2);
    assert_eq!(count(&result.tokens, TokenKind::Dedent), 2);
    assert_eq!(result.tokens.last().unwrap().kind, TokenKind::Eof);
}

#[test]
fn strings_and_comments_do_not_confuse_indentation() {
    let source = "s = '''\n  not indentation\n'''\nif x:\n    y  # comment\n";
    let result = ScriptLexer::tokenize(source);
    assert!(result.errors.is_empty());
    assert_eq!(count(&result.tokens, TokenKind::Indent), 1);
    assert_eq!(count(&result.tokens, TokenKind::Dedent), 1);
}
