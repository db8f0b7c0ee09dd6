#[cfg(test)]
mod interpreter_tests {
    use quill::error::QuillError;
    use quill::session::Session;

    /// Run a source unit that is expected to scan, parse, and execute
    /// cleanly, returning the printed lines.
    fn run_program(source: &str) -> Vec<String> {
        let mut session = Session::new();
        let report = session.run(source);

        assert!(
            report.errors.is_empty(),
            "unexpected scan/parse errors: {:?}",
            report.errors
        );
        assert!(
            report.failure.is_none(),
            "unexpected runtime failure: {:?}",
            report.failure
        );

        report.printed
    }

    /// Run a source unit expected to abort with a runtime error.
    fn run_expect_failure(source: &str) -> QuillError {
        let mut session = Session::new();
        let report = session.run(source);

        assert!(
            report.errors.is_empty(),
            "unexpected scan/parse errors: {:?}",
            report.errors
        );

        report.failure.expect("expected a runtime failure")
    }

    // ───────────────────────── expressions ─────────────────────────

    #[test]
    fn test_arithmetic_precedence() {
        assert_eq!(run_program("print 2 + 3 * 4;"), ["14"]);
    }

    #[test]
    fn test_grouping_overrides_precedence() {
        assert_eq!(run_program("print (2 + 3) * 4;"), ["20"]);
    }

    #[test]
    fn test_division_produces_fractions() {
        assert_eq!(run_program("print 10 / 4;"), ["2.5"]);
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(run_program("print \"a\" + \"b\";"), ["ab"]);
    }

    #[test]
    fn test_mixed_concatenation_is_a_type_error() {
        let failure = run_expect_failure("print \"a\" + 1;");
        assert!(failure
            .to_string()
            .contains("Operands must be two numbers or two strings"));
    }

    #[test]
    fn test_division_by_zero_is_its_own_error() {
        let failure = run_expect_failure("print 1 / 0;");
        assert!(matches!(failure, QuillError::DivideByZero { .. }));
        assert_eq!(failure.line(), Some(1));
    }

    #[test]
    fn test_unary_operators() {
        assert_eq!(
            run_program("print -(-3); print !nil; print !0;"),
            ["3", "true", "false"]
        );
    }

    #[test]
    fn test_unary_minus_needs_a_number() {
        let failure = run_expect_failure("print -\"a\";");
        assert!(failure.to_string().contains("Operand must be a number"));
    }

    #[test]
    fn test_equality_rules() {
        assert_eq!(
            run_program("print 1 == 1; print nil == nil; print 1 == \"1\"; print nil == false;"),
            ["true", "true", "false", "false"]
        );
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(
            run_program("print 1 < 2; print 2 <= 2; print 3 > 4;"),
            ["true", "true", "false"]
        );
    }

    #[test]
    fn test_zero_and_empty_string_are_truthy() {
        let printed = run_program(
            "if (0) print \"zero\";\nif (\"\") print \"empty\";\nif (nil) print \"nil\";",
        );
        assert_eq!(printed, ["zero", "empty"]);
    }

    #[test]
    fn test_logical_operators_short_circuit() {
        let printed = run_program(
            "fun SideEffect() { print \"boom\"; return true; }\n\
             print false && SideEffect();\n\
             print true || SideEffect();",
        );

        // The right operand is never evaluated, and the determining operand
        // itself is returned.
        assert_eq!(printed, ["false", "true"]);
    }

    #[test]
    fn test_logical_operators_return_the_deciding_operand() {
        assert_eq!(
            run_program("print nil || \"fallback\"; print 1 && 2;"),
            ["fallback", "2"]
        );
    }

    #[test]
    fn test_assignment_expression_yields_the_value() {
        assert_eq!(run_program("var a = 1; print a = 5; print a;"), ["5", "5"]);
    }

    #[test]
    fn test_number_stringification_strips_integral_suffix() {
        assert_eq!(
            run_program("print 1.0 + 2.0; print 3.14; print 0 - 5; print true; print nil;"),
            ["3", "3.14", "-5", "true", "nil"]
        );
    }

    // ───────────────────────── statements ─────────────────────────

    #[test]
    fn test_for_loop_prints_sequence() {
        assert_eq!(
            run_program("for (var i = 0; i < 3; i = i + 1) print i;"),
            ["0", "1", "2"]
        );
    }

    #[test]
    fn test_while_loop() {
        assert_eq!(
            run_program("var i = 0; while (i < 2) { print i; i = i + 1; }"),
            ["0", "1"]
        );
    }

    #[test]
    fn test_if_else_branches() {
        assert_eq!(
            run_program("if (1 < 2) print \"then\"; else print \"else\";"),
            ["then"]
        );
        assert_eq!(
            run_program("if (1 > 2) print \"then\"; else print \"else\";"),
            ["else"]
        );
    }

    #[test]
    fn test_top_level_redeclaration_overwrites() {
        assert_eq!(run_program("var a = 1; var a = 2; print a;"), ["2"]);
    }

    #[test]
    fn test_undefined_variable_reads_as_nil() {
        assert_eq!(run_program("print ghost;"), ["nil"]);
    }

    #[test]
    fn test_strict_sessions_reject_undefined_variables() {
        let mut session = Session::with_strict_variables(true);
        let report = session.run("print ghost;");

        let failure = report.failure.expect("expected a runtime failure");
        assert!(failure.to_string().contains("Undefined variable 'ghost'"));
    }

    #[test]
    fn test_globals_persist_across_runs() {
        let mut session = Session::new();

        let first = session.run("var a = 7;");
        assert!(first.succeeded());

        let second = session.run("print a;");
        assert!(second.succeeded());
        assert_eq!(second.printed, ["7"]);
    }

    #[test]
    fn test_runtime_error_keeps_earlier_prints() {
        let mut session = Session::new();
        let report = session.run("print \"before\"; print 1 / 0; print \"after\";");

        assert_eq!(report.printed, ["before"]);
        assert!(matches!(
            report.failure,
            Some(QuillError::DivideByZero { .. })
        ));
    }

    #[test]
    fn test_parse_recovery_still_runs_good_statements() {
        let mut session = Session::new();
        let report = session.run("var = 1; print \"ok\";");

        assert_eq!(report.errors.len(), 1);
        assert!(report.failure.is_none());
        assert_eq!(report.printed, ["ok"]);
    }

    // ───────────────────── functions and closures ─────────────────────

    #[test]
    fn test_counter_closure_ticks_across_calls() {
        let printed = run_program(
            "fun MakeCounter()\n\
             {\n\
             \tvar i = 0;\n\
             \tfun Count()\n\
             \t{\n\
             \t\ti += 1;\n\
             \t\tprint i;\n\
             \t}\n\
             \treturn Count;\n\
             }\n\
             \n\
             var counter = MakeCounter();\n\
             counter();\n\
             counter();",
        );

        assert_eq!(printed, ["1", "2"]);
    }

    #[test]
    fn test_closures_capture_a_definition_time_snapshot() {
        let printed = run_program(
            "var a = \"global\";\n\
             fun Show() { print a; }\n\
             Show();\n\
             a = \"changed\";\n\
             Show();",
        );

        assert_eq!(printed, ["global", "global"]);
    }

    #[test]
    fn test_global_mutation_inside_a_function_stays_in_the_closure() {
        let printed = run_program("var n = 0;\nfun Poke() { n = 99; }\nPoke();\nprint n;");
        assert_eq!(printed, ["0"]);
    }

    #[test]
    fn test_recursion() {
        let printed = run_program(
            "fun Fib(n)\n\
             {\n\
             \tif (n <= 1) return n;\n\
             \treturn Fib(n - 2) + Fib(n - 1);\n\
             }\n\
             print Fib(10);",
        );

        assert_eq!(printed, ["55"]);
    }

    #[test]
    fn test_falling_off_a_body_returns_nil() {
        assert_eq!(run_program("fun Noop() { } print Noop();"), ["nil"]);
    }

    #[test]
    fn test_arity_mismatch_names_both_counts() {
        let failure = run_expect_failure("fun F(a, b) { } F(1);");
        assert!(failure
            .to_string()
            .contains("Expected 2 arguments but got 1"));
    }

    #[test]
    fn test_calling_a_non_callable_fails() {
        let failure = run_expect_failure("var x = 5; x();");
        assert!(failure.to_string().contains("Can only call functions"));
    }

    #[test]
    fn test_duplicate_parameters_are_a_double_definition() {
        let failure = run_expect_failure("fun F(a, a) { } F(1, 2);");
        assert!(failure.to_string().contains("already defined"));
    }

    #[test]
    fn test_parameter_colliding_with_a_captured_name_is_rejected() {
        // Inner's closure snapshot already carries `n` from the enclosing
        // call, so binding the parameter is a duplicate definition.
        let failure = run_expect_failure(
            "fun Outer(n)\n\
             {\n\
             \tfun Inner(n) { return n; }\n\
             \treturn Inner(n + 1);\n\
             }\n\
             print Outer(1);",
        );

        assert!(failure.to_string().contains("already defined"));
    }

    #[test]
    fn test_unbounded_recursion_exhausts_the_call_ceiling() {
        let failure = run_expect_failure("fun Spin() { return Spin(); } Spin();");
        assert!(failure.to_string().contains("Stack exhausted"));
    }

    #[test]
    fn test_return_at_top_level_is_rejected() {
        let failure = run_expect_failure("return 5;");
        assert!(failure
            .to_string()
            .contains("Cannot return from top-level code"));
    }

    #[test]
    fn test_function_redefinition_inside_a_call_stays_invisible_locally() {
        // The call scope's snapshot still resolves `F` to the original; the
        // rebinding re-parents into the closure instead of overwriting.
        let printed = run_program(
            "fun F() { return 1; }\n\
             fun G()\n\
             {\n\
             \tfun F() { return 2; }\n\
             \treturn F();\n\
             }\n\
             print G();",
        );

        assert_eq!(printed, ["1"]);
    }

    #[test]
    fn test_clock_native_reports_subsecond_millis() {
        assert_eq!(
            run_program("print Clock() >= 0 && Clock() < 1;"),
            ["true"]
        );
    }

    // ───────────────────────── pinned quirks ─────────────────────────

    #[test]
    fn test_leading_var_in_a_block_runs_twice() {
        // The ticker increments once per call; a leading `var` in a block is
        // evaluated against the current scope and then again with the block
        // body, so `x` ends up with the second tick.
        let printed = run_program(
            "fun MakeTicker()\n\
             {\n\
             \tvar n = 0;\n\
             \tfun Tick()\n\
             \t{\n\
             \t\tn += 1;\n\
             \t\treturn n;\n\
             \t}\n\
             \treturn Tick;\n\
             }\n\
             \n\
             var tick = MakeTicker();\n\
             {\n\
             \tvar x = tick();\n\
             \tprint x;\n\
             }",
        );

        assert_eq!(printed, ["2"]);
    }

    #[test]
    fn test_block_without_leading_var_runs_once() {
        assert_eq!(
            run_program("{ print \"once\"; var x = 1; }"),
            ["once"]
        );
    }

    #[test]
    fn test_blocks_share_the_enclosing_scope() {
        // Blocks do not open a scope: the declaration inside remains
        // visible afterwards.
        assert_eq!(run_program("{ var a = 3; } print a;"), ["3"]);
    }

    #[test]
    fn test_hyphenated_identifiers_work_end_to_end() {
        assert_eq!(
            run_program("var my-total = 2; print my-total * 3;"),
            ["6"]
        );
    }

    #[test]
    fn test_compound_assignment_operates_in_place() {
        assert_eq!(
            run_program("var a = 10; a -= 4; a *= 2; print a;"),
            ["12"]
        );
    }

    #[test]
    fn test_both_comment_styles_run_to_end_of_line() {
        assert_eq!(
            run_program("// one\n/* two\nprint \"live\";"),
            ["live"]
        );
    }
}
