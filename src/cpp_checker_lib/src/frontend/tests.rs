use super::*;

/// Parse a source text that is expected to contain exactly one function
/// and return that function.
fn parse_single_function(source: &str) -> Function {
    let (unit, logs) = parse_translation_unit(source);
    assert!(logs.is_empty(), "unexpected diagnostics: {logs:?}");
    assert_eq!(unit.functions.len(), 1);
    unit.functions.into_values().next().unwrap().term
}

#[test]
fn parse_pointer_declarations() {
    let function = parse_single_function(
        r#"
        void test_direct_null() {
            int* ptr = nullptr;
            *ptr = 42;
        }
        "#,
    );
    assert_eq!(function.name, "test_direct_null");
    assert_eq!(function.body.len(), 2);
    match &function.body[0].term {
        Stmt::Decl { var, init } => {
            assert_eq!(var.name, "ptr");
            assert!(var.is_pointer);
            assert_eq!(*init, Some(Expression::Null));
        }
        other => panic!("expected declaration, got {other}"),
    }
    match &function.body[1].term {
        Stmt::Assign { target, value } => {
            assert_eq!(
                *target,
                Expression::Deref(Box::new(Expression::ptr_var("ptr")))
            );
            assert_eq!(*value, Expression::Const(42));
        }
        other => panic!("expected assignment, got {other}"),
    }
    // The dereference is on the second line of the body.
    assert_eq!(function.body[1].tid.location.line, 4);
}

#[test]
fn parse_address_of_initializer() {
    let function = parse_single_function(
        r#"
        void test_safe_pointer() {
            int value = 42;
            int* ptr = &value;
            *ptr = 100;
        }
        "#,
    );
    match &function.body[1].term {
        Stmt::Decl { var, init } => {
            assert!(var.is_pointer);
            assert_eq!(
                *init,
                Some(Expression::AddressOf(Variable::new("value", false)))
            );
        }
        other => panic!("expected declaration, got {other}"),
    }
}

#[test]
fn parse_if_else_and_for() {
    let function = parse_single_function(
        r#"
        void simpleMethod(int x) {
            int result = 0;
            if (x > 0) {
                result = 1;
            } else {
                result = -1;
            }
            for (int i = 0; i < 3; i++) {
                result = result + i;
            }
        }
        "#,
    );
    assert_eq!(function.parameters, vec![Variable::new("x", false)]);
    assert_eq!(function.body.len(), 3);
    match &function.body[1].term {
        Stmt::If {
            condition,
            then_body,
            else_body,
        } => {
            assert_eq!(
                *condition,
                Expression::BinOp {
                    op: BinOpType::Greater,
                    lhs: Box::new(Expression::var("x")),
                    rhs: Box::new(Expression::Const(0)),
                }
            );
            assert_eq!(then_body.len(), 1);
            assert_eq!(else_body.as_ref().unwrap().len(), 1);
        }
        other => panic!("expected if statement, got {other}"),
    }
    match &function.body[2].term {
        Stmt::For {
            init,
            condition,
            update,
            body,
        } => {
            assert!(matches!(
                init.as_ref().unwrap().term,
                Stmt::Decl { .. }
            ));
            assert!(condition.is_some());
            // `i++` is desugared to `i = i + 1`.
            assert!(matches!(
                update.as_ref().unwrap().term,
                Stmt::Assign { .. }
            ));
            assert_eq!(body.len(), 1);
        }
        other => panic!("expected for statement, got {other}"),
    }
}

#[test]
fn parse_while_and_switch() {
    let function = parse_single_function(
        r#"
        int complexMethod(int value) {
            if (value < 0) {
                return -1;
            }
            while (value > 10) {
                value = value / 2;
            }
            switch (value) {
                case 0:
                    return 0;
                case 1:
                    return 1;
                default:
                    return value * 2;
            }
        }
        "#,
    );
    assert_eq!(function.body.len(), 3);
    assert!(matches!(function.body[1].term, Stmt::While { .. }));
    match &function.body[2].term {
        Stmt::Switch {
            scrutinee,
            cases,
            default,
        } => {
            assert_eq!(*scrutinee, Expression::var("value"));
            assert_eq!(cases.len(), 2);
            assert_eq!(cases[0].value, 0);
            assert_eq!(cases[1].value, 1);
            assert!(default.is_some());
        }
        other => panic!("expected switch statement, got {other}"),
    }
}

#[test]
fn parse_guard_conditions() {
    let function = parse_single_function(
        r#"
        void test_with_check() {
            int* ptr = nullptr;
            if (ptr != nullptr) {
                *ptr = 42;
            }
            if (ptr) {
                *ptr = 1;
            }
            if (!ptr) {
                return;
            }
        }
        "#,
    );
    match &function.body[1].term {
        Stmt::If { condition, .. } => {
            assert_eq!(*condition, Expression::ptr_var("ptr").is_not_null());
        }
        other => panic!("expected if statement, got {other}"),
    }
    match &function.body[3].term {
        Stmt::If { condition, .. } => {
            assert_eq!(
                *condition,
                Expression::ptr_var("ptr").un_op(UnOpType::LogicalNot)
            );
        }
        other => panic!("expected if statement, got {other}"),
    }
}

#[test]
fn unbalanced_braces_are_syntax_errors() {
    let (unit, logs) = parse_translation_unit("void broken() { if (x) { return; ");
    assert!(unit.functions.is_empty());
    assert_eq!(logs.len(), 1);
    assert!(logs[0].text.contains("unbalanced braces"));
}

#[test]
fn unsupported_constructs_are_reported_not_skipped() {
    let (unit, logs) = parse_translation_unit(
        r#"
        void uses_goto() {
            goto done;
        }
        "#,
    );
    assert!(unit.functions.is_empty());
    assert_eq!(logs.len(), 1);
    assert!(logs[0].text.contains("unsupported construct"));
    assert!(logs[0].text.contains("goto"));
}

#[test]
fn parse_failure_does_not_abort_sibling_functions() {
    let (unit, logs) = parse_translation_unit(
        r#"
        void broken() {
            do { x = 1; } while (x < 2);
        }

        void intact() {
            int* ptr = nullptr;
            *ptr = 1;
        }
        "#,
    );
    assert_eq!(unit.functions.len(), 1);
    assert!(unit.find_function("intact").is_some());
    assert_eq!(logs.len(), 1);
    assert!(logs[0].text.contains("broken"));
}

#[test]
fn unsupported_toplevel_definitions_are_skipped_with_diagnostics() {
    let (unit, logs) = parse_translation_unit(
        r#"
        class Widget {
            int size;
        };

        void fine() {}
        "#,
    );
    assert_eq!(unit.functions.len(), 1);
    assert!(unit.find_function("fine").is_some());
    assert_eq!(logs.len(), 1);
    assert!(logs[0].text.contains("class"));
}

#[test]
fn pointer_parameters_are_tracked() {
    let function = parse_single_function(
        r#"
        void write_through(int* out, int value) {
            *out = value;
        }
        "#,
    );
    assert_eq!(
        function.parameters,
        vec![Variable::new("out", true), Variable::new("value", false)]
    );
    match &function.body[0].term {
        Stmt::Assign { target, .. } => {
            assert_eq!(
                *target,
                Expression::Deref(Box::new(Expression::ptr_var("out")))
            );
        }
        other => panic!("expected assignment, got {other}"),
    }
}
