//! End-to-end coverage of the core special forms, compiled from source text
//! through to a run result, rather than hand-built bytecode.

use smile::{run::CompileOutcome, Engine, Interns, NoopTracer, SmileArg};

fn eval(src: &str) -> SmileArg {
    let (mut interns, symbols) = Interns::new();
    let ast = smile::sexpr::read_one(src, &mut interns).expect("should parse");
    let CompileOutcome::Ready { body, tables, .. } = Engine::<NoopTracer>::compile(&ast, &symbols) else {
        panic!("expected successful compile of {src}")
    };
    Engine::new().run(interns, symbols, &body, &tables).expect("should run")
}

#[test]
fn scope_shadows_an_outer_binding() {
    // `($scope (x) ($set x 5) x)` declares `x` as a fresh local and assigns
    // to it, entirely independent of any same-named binding outside.
    assert_eq!(eval("($scope (x) ($set x 5) x)"), SmileArg::Int64(5));
}

#[test]
fn progn_yields_its_last_expression() {
    assert_eq!(eval("($progn 1 2 3)"), SmileArg::Int64(3));
}

#[test]
fn prog1_yields_its_first_expression() {
    assert_eq!(eval("($prog1 1 2 3)"), SmileArg::Int64(1));
}

#[test]
fn if_without_else_yields_null_on_the_false_branch() {
    // `null` is a heap singleton rather than an unboxed variant, so only its
    // shape is checked here, not a specific `HeapId`.
    assert!(matches!(eval("($if ($eq 1 2) 9)"), SmileArg::Heap(_)));
}

#[test]
fn or_short_circuits_to_the_first_truthy_operand() {
    assert_eq!(eval("($or ($eq 1 2) 7 8)"), SmileArg::Int64(7));
}

#[test]
fn and_short_circuits_to_false_on_the_first_falsy_operand() {
    assert_eq!(eval("($and 1 ($eq 1 2) 3)"), SmileArg::Bool(false));
}

#[test]
fn nested_scope_set_and_and_compose() {
    let result = eval("($scope (x) ($set x 1) ($and ($eq x 1) ($progn ($set x 2) x)))");
    assert_eq!(result, SmileArg::Int64(2));
}

#[test]
fn catch_binds_the_thrown_value_for_the_handler() {
    assert_eq!(eval("($catch ($throw 42) e e)"), SmileArg::Int64(42));
}

#[test]
fn catch_is_transparent_when_the_body_does_not_throw() {
    assert_eq!(eval("($catch 7 e e)"), SmileArg::Int64(7));
}

#[test]
fn catch_runs_the_handler_with_the_bound_exception_in_scope() {
    let result = eval("($catch ($throw 3) e ($if ($eq e 3) 99 0))");
    assert_eq!(result, SmileArg::Int64(99));
}

#[test]
fn throw_inside_a_nested_call_still_unwinds_to_an_enclosing_catch() {
    let result = eval("($catch (($fn () ($throw 9))) e e)");
    assert_eq!(result, SmileArg::Int64(9));
}

#[test]
fn quote_of_a_list_builds_a_real_cons_structure_at_run_time() {
    assert_eq!(eval("(($quote (1 2 3)) . a)"), SmileArg::Int64(1));
    assert_eq!(eval("((($quote (1 2 3)) . d) . a)"), SmileArg::Int64(2));
}
