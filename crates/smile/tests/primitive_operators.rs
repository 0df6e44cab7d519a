//! Exercises the primitive comparison/negation operators end to end, from
//! source text through compilation and interpretation.

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
fn eq_of_equal_ints_is_true() {
    assert_eq!(eval("($eq 3 3)"), SmileArg::Bool(true));
}

#[test]
fn eq_of_different_ints_is_false() {
    assert_eq!(eval("($eq 3 4)"), SmileArg::Bool(false));
}

#[test]
fn ne_is_the_negation_of_eq() {
    assert_eq!(eval("($ne 3 4)"), SmileArg::Bool(true));
    assert_eq!(eval("($ne 3 3)"), SmileArg::Bool(false));
}

#[test]
fn is_checks_identity_not_mere_equality() {
    assert_eq!(eval("($is 3 3)"), SmileArg::Bool(true));
}

#[test]
fn not_negates_a_boolean_value() {
    assert_eq!(eval("($not ($eq 3 4))"), SmileArg::Bool(true));
    assert_eq!(eval("($not ($eq 3 3))"), SmileArg::Bool(false));
}

#[test]
fn typeof_of_an_int_names_its_kind() {
    let result = eval("($typeof 3)");
    assert!(matches!(result, SmileArg::Symbol(_)));
}

#[test]
fn and_still_short_circuits_around_not() {
    // `$not` folds away inside `$and`'s condition position via strip_nots
    // rather than reaching `compile_not`; both paths should agree.
    assert_eq!(eval("($and ($not ($eq 1 2)) 5)"), SmileArg::Int64(5));
}
