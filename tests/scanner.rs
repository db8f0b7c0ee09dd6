#[cfg(test)]
mod scanner_tests {
    use quill::scanner::Scanner;
    use quill::token::{Token, TokenType};

    fn scan(source: &str) -> (Vec<Token>, usize) {
        let (tokens, errors) = Scanner::new(source).scan_tokens();
        (tokens, errors.len())
    }

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let (tokens, error_count) = scan(source);

        assert_eq!(error_count, 0, "unexpected scan errors for {:?}", source);
        assert_eq!(tokens.len(), expected.len(), "token count for {:?}", source);

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn test_scanner_symbols() {
        assert_token_sequence(
            "({*.,+*})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_operators_and_compounds() {
        assert_token_sequence(
            "= == ! != < <= > >= + += - -= * *= / /=",
            &[
                (TokenType::EQUAL, "="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::BANG, "!"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::LESS, "<"),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER, ">"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::PLUS, "+"),
                (TokenType::PLUS_EQUAL, "+="),
                (TokenType::MINUS, "-"),
                (TokenType::MINUS_EQUAL, "-="),
                (TokenType::STAR, "*"),
                (TokenType::STAR_EQUAL, "*="),
                (TokenType::SLASH, "/"),
                (TokenType::SLASH_EQUAL, "/="),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_line_comment_runs_to_end_of_line() {
        assert_token_sequence(
            "var a = 1; // trailing words = () {}\nprint a;",
            &[
                (TokenType::VAR, "var"),
                (TokenType::IDENTIFIER, "a"),
                (TokenType::EQUAL, "="),
                (TokenType::NUMBER(1.0), "1"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::PRINT, "print"),
                (TokenType::IDENTIFIER, "a"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_slash_star_comment_also_runs_to_end_of_line() {
        // `/*` has no closing delimiter; it behaves exactly like `//`.
        assert_token_sequence(
            "/* not a block comment\nprint 1;",
            &[
                (TokenType::PRINT, "print"),
                (TokenType::NUMBER(1.0), "1"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_logical_aliases() {
        assert_token_sequence(
            "a && b || c",
            &[
                (TokenType::IDENTIFIER, "a"),
                (TokenType::AND, "&&"),
                (TokenType::IDENTIFIER, "b"),
                (TokenType::OR, "||"),
                (TokenType::IDENTIFIER, "c"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_lone_ampersand_and_pipe_are_dropped_silently() {
        let (tokens, error_count) = scan("a & b | c");

        assert_eq!(error_count, 0);

        let kinds: Vec<&TokenType> = tokens.iter().map(|t| &t.token_type).collect();
        assert_eq!(
            kinds,
            vec![
                &TokenType::IDENTIFIER,
                &TokenType::IDENTIFIER,
                &TokenType::IDENTIFIER,
                &TokenType::EOF,
            ]
        );
    }

    #[test]
    fn test_hyphens_continue_identifiers() {
        assert_token_sequence(
            "foo-bar a-1",
            &[
                (TokenType::IDENTIFIER, "foo-bar"),
                (TokenType::IDENTIFIER, "a-1"),
                (TokenType::EOF, ""),
            ],
        );

        // A digit-leading lexeme takes the number path, so subtraction
        // between literals still tokenizes as three tokens.
        assert_token_sequence(
            "3-2",
            &[
                (TokenType::NUMBER(3.0), "3"),
                (TokenType::MINUS, "-"),
                (TokenType::NUMBER(2.0), "2"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_keywords_override_identifiers() {
        assert_token_sequence(
            "and class else false for fun if nil or print return super this true var while andy",
            &[
                (TokenType::AND, "and"),
                (TokenType::CLASS, "class"),
                (TokenType::ELSE, "else"),
                (TokenType::FALSE, "false"),
                (TokenType::FOR, "for"),
                (TokenType::FUN, "fun"),
                (TokenType::IF, "if"),
                (TokenType::NIL, "nil"),
                (TokenType::OR, "or"),
                (TokenType::PRINT, "print"),
                (TokenType::RETURN, "return"),
                (TokenType::SUPER, "super"),
                (TokenType::THIS, "this"),
                (TokenType::TRUE, "true"),
                (TokenType::VAR, "var"),
                (TokenType::WHILE, "while"),
                (TokenType::IDENTIFIER, "andy"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_string_literal_payload() {
        let (tokens, error_count) = scan("\"hello quill\"");

        assert_eq!(error_count, 0);
        assert_eq!(tokens.len(), 2);

        match &tokens[0].token_type {
            TokenType::STRING(s) => assert_eq!(s, "hello quill"),
            other => panic!("expected STRING, got {:?}", other),
        }
    }

    #[test]
    fn test_multiline_string_bumps_line_counter() {
        let (tokens, error_count) = scan("\"a\nb\"\nprint");

        assert_eq!(error_count, 0);

        // String ends on line 2; `print` sits on line 3.
        assert_eq!(tokens[0].line, 2);
        assert_eq!(tokens[1].token_type, TokenType::PRINT);
        assert_eq!(tokens[1].line, 3);
    }

    #[test]
    fn test_unterminated_string_reports_and_scan_goes_on() {
        let (tokens, errors) = Scanner::new("var x = \"abc").scan_tokens();

        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("Unterminated string"));

        let kinds: Vec<&TokenType> = tokens.iter().map(|t| &t.token_type).collect();
        assert_eq!(
            kinds,
            vec![
                &TokenType::VAR,
                &TokenType::IDENTIFIER,
                &TokenType::EQUAL,
                &TokenType::EOF,
            ]
        );
    }

    #[test]
    fn test_number_literals() {
        let (tokens, error_count) = scan("12 3.14 3.");

        assert_eq!(error_count, 0);

        match tokens[0].token_type {
            TokenType::NUMBER(n) => assert_eq!(n, 12.0),
            ref other => panic!("expected NUMBER, got {:?}", other),
        }
        match tokens[1].token_type {
            TokenType::NUMBER(n) => assert_eq!(n, 3.14),
            ref other => panic!("expected NUMBER, got {:?}", other),
        }

        // A trailing '.' is not part of the literal.
        match tokens[2].token_type {
            TokenType::NUMBER(n) => assert_eq!(n, 3.0),
            ref other => panic!("expected NUMBER, got {:?}", other),
        }
        assert_eq!(tokens[3].token_type, TokenType::DOT);
    }

    #[test]
    fn test_unexpected_chars_do_not_stop_the_scan() {
        let (tokens, errors) = Scanner::new(",.$(#").scan_tokens();

        assert_eq!(errors.len(), 2, "expected 2 error messages");

        for err in &errors {
            assert!(
                err.to_string().contains("Unexpected character"),
                "error message should contain 'Unexpected character', got: {}",
                err
            );
        }

        let kinds: Vec<&TokenType> = tokens.iter().map(|t| &t.token_type).collect();
        assert_eq!(
            kinds,
            vec![
                &TokenType::COMMA,
                &TokenType::DOT,
                &TokenType::LEFT_PAREN,
                &TokenType::EOF,
            ]
        );
    }

    #[test]
    fn test_rescanning_is_idempotent() {
        let source = "fun Fib(n)\n{\n\tif (n <= 1) return n;\n\treturn Fib(n - 2) + Fib(n - 1);\n}\nprint \"done\"; // note\n";

        let (first, first_errors) = Scanner::new(source).scan_tokens();
        let (second, second_errors) = Scanner::new(source).scan_tokens();

        assert_eq!(first_errors.len(), 0);
        assert_eq!(second_errors.len(), 0);
        assert_eq!(first, second);

        // Token equality ignores literal payloads, so compare the rendered
        // form as well.
        let rendered_first: Vec<String> = first.iter().map(|t| t.to_string()).collect();
        let rendered_second: Vec<String> = second.iter().map(|t| t.to_string()).collect();
        assert_eq!(rendered_first, rendered_second);
    }
}
