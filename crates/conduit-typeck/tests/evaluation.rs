//! Partial evaluation of expressions and calls

mod common;

use common::builder;
use conduit_ast::{Argument, Assignee, DeclId, ExprId, ExprKind, InfixOperator, ModuleBuilder};
use conduit_typeck::*;

fn evaluate(b: ModuleBuilder, expr: ExprId) -> String {
    let module = b.finish();
    let analysis = Analysis::new(&module).unwrap();
    analysis.evaluate(expr).to_string()
}

/// `val name = expr;`
fn val(b: &mut ModuleBuilder, name: &str, expr: ExprId) -> DeclId {
    let placeholder = b.placeholder(name);
    b.assignment(vec![Assignee::Placeholder(placeholder)], expr);
    placeholder
}

/// `yield result = expr;` in the body of a segment
fn yield_result(b: &mut ModuleBuilder, segment: DeclId, result: DeclId, expr: ExprId) {
    let stmt = b.assignment(vec![Assignee::Yield(Some(result))], expr);
    b.push_body(segment, stmt);
}

/// `segment double(p) { yield r = p * 2; }`
fn double_segment(b: &mut ModuleBuilder) -> DeclId {
    let segment = b.segment("double");
    let p = b.parameter(segment, "p", None, None);
    let r = b.result(segment, "r", None);
    let p_ref = b.reference(p);
    let two = b.int(2);
    let product = b.infix(InfixOperator::Times, p_ref, two);
    yield_result(b, segment, r, product);
    segment
}

// =============================================================================
// Operators
// =============================================================================

#[test]
fn test_division_by_zero() {
    let (mut b, _) = builder();
    let one = b.int(1);
    let zero = b.int(0);
    let int_division = b.infix(InfixOperator::DividedBy, one, zero);
    let one_f = b.float(1.0);
    let zero_f = b.float(0.0);
    let float_division = b.infix(InfixOperator::DividedBy, one_f, zero_f);
    let zero_neg = b.float(-0.0);
    let negative_zero_division = b.infix(InfixOperator::DividedBy, one_f, zero_neg);
    let again = b.infix(InfixOperator::DividedBy, one, zero);
    let comparison = b.infix(InfixOperator::Equals, int_division, again);
    let module = b.finish();
    let analysis = Analysis::new(&module).unwrap();

    assert_eq!(analysis.evaluate(int_division), EvaluatedNode::Unknown);
    assert_eq!(analysis.evaluate(float_division), EvaluatedNode::Unknown);
    assert_eq!(analysis.evaluate(negative_zero_division), EvaluatedNode::Unknown);
    assert_eq!(analysis.evaluate(comparison), EvaluatedNode::Unknown);
}

#[test]
fn test_logical_operators_need_both_operands() {
    let (mut b, _) = builder();
    let yes = b.boolean(true);
    let no = b.boolean(false);
    let unknown = b.unresolved_reference();
    let or_unknown = b.infix(InfixOperator::Or, yes, unknown);
    let and_unknown = b.infix(InfixOperator::And, no, unknown);
    let and = b.infix(InfixOperator::And, yes, no);
    let module = b.finish();
    let analysis = Analysis::new(&module).unwrap();

    assert_eq!(analysis.evaluate(or_unknown), EvaluatedNode::Unknown);
    assert_eq!(analysis.evaluate(and_unknown), EvaluatedNode::Unknown);
    assert_eq!(analysis.evaluate(and).to_string(), "false");
}

#[test]
fn test_elvis() {
    let (mut b, _) = builder();
    let null = b.null();
    let one = b.int(1);
    let two = b.int(2);
    let unknown = b.unresolved_reference();
    let from_null = b.infix(InfixOperator::Elvis, null, one);
    let from_value = b.infix(InfixOperator::Elvis, two, one);
    let from_unknown = b.infix(InfixOperator::Elvis, unknown, one);
    let module = b.finish();
    let analysis = Analysis::new(&module).unwrap();

    assert_eq!(analysis.evaluate(from_null).to_string(), "1");
    assert_eq!(analysis.evaluate(from_value).to_string(), "2");
    assert_eq!(analysis.evaluate(from_unknown), EvaluatedNode::Unknown);
}

#[test]
fn test_template_strings() {
    let (mut b, _) = builder();
    let start = b.template_fragment("n = ");
    let one = b.int(1);
    let two = b.int(2);
    let sum = b.infix(InfixOperator::Plus, one, two);
    let end = b.template_fragment("!");
    let complete = b.template_string(vec![start, sum, end]);
    let unknown = b.unresolved_reference();
    let incomplete = b.template_string(vec![start, unknown, end]);
    let module = b.finish();
    let analysis = Analysis::new(&module).unwrap();

    assert_eq!(analysis.evaluate(complete).to_string(), "\"n = 3!\"");
    assert_eq!(analysis.evaluate(incomplete), EvaluatedNode::Unknown);
}

// =============================================================================
// Collections
// =============================================================================

#[test]
fn test_list_indexing() {
    let (mut b, _) = builder();
    let one = b.int(1);
    let text = b.string("a");
    let list = b.list(vec![one, text]);
    let index = b.int(1);
    let element = b.indexed_access(list, index);
    let out_of_bounds_index = b.int(5);
    let out_of_bounds = b.indexed_access(list, out_of_bounds_index);
    let string_index = b.string("0");
    let wrong_index = b.indexed_access(list, string_index);
    let module = b.finish();
    let analysis = Analysis::new(&module).unwrap();

    assert_eq!(analysis.evaluate(list).to_string(), "[1, \"a\"]");
    assert_eq!(analysis.evaluate(element).to_string(), "\"a\"");
    assert_eq!(analysis.evaluate(out_of_bounds), EvaluatedNode::Unknown);
    assert_eq!(analysis.evaluate(wrong_index), EvaluatedNode::Unknown);
}

#[test]
fn test_map_lookup_takes_last_entry() {
    let (mut b, _) = builder();
    let key = b.string("k");
    let first = b.int(1);
    let same_key = b.string("k");
    let second = b.int(2);
    let other_key = b.string("o");
    let third = b.boolean(false);
    let map = b.map(vec![(key, first), (same_key, second), (other_key, third)]);
    let lookup_key = b.string("k");
    let lookup = b.indexed_access(map, lookup_key);
    let missing_key = b.string("x");
    let missing = b.indexed_access(map, missing_key);
    let module = b.finish();
    let analysis = Analysis::new(&module).unwrap();

    assert_eq!(analysis.evaluate(map).to_string(), "{\"k\": 1, \"k\": 2, \"o\": false}");
    assert_eq!(analysis.evaluate(lookup).to_string(), "2");
    assert_eq!(analysis.evaluate(missing), EvaluatedNode::Unknown);
}

#[test]
fn test_null_safe_access() {
    let (mut b, _) = builder();
    let segment = double_segment(&mut b);
    let r = b.module_ref().results_of(segment)[0];
    let null = b.null();
    let zero = b.int(0);
    let indexed = b.push_expr(ExprKind::IndexedAccess {
        receiver: null,
        index: zero,
        is_null_safe: true,
    });
    let member = b.null_safe_member_access(null, Some(r));
    let called = b.call_with(null, Vec::new(), true);
    let unsafe_member = b.member_access(null, Some(r));
    let module = b.finish();
    let analysis = Analysis::new(&module).unwrap();

    assert_eq!(analysis.evaluate(indexed).to_string(), "null");
    assert_eq!(analysis.evaluate(member).to_string(), "null");
    assert_eq!(analysis.evaluate(called).to_string(), "null");
    assert_eq!(analysis.evaluate(unsafe_member), EvaluatedNode::Unknown);
}

// =============================================================================
// Enum variants
// =============================================================================

#[test]
fn test_enum_variant_instantiation() {
    let (mut b, std) = builder();
    let color = b.enumeration("Color");
    let red = b.variant(color, "Red");
    let rgb = b.variant(color, "Rgb");
    let int = b.named(std.int);
    let _r = b.constant_parameter(rgb, "r", Some(int), None);
    let zero = b.int(0);
    let g = b.constant_parameter(rgb, "g", Some(int), Some(zero));

    let color_ref = b.reference(color);
    let red_access = b.member_access(color_ref, Some(red));
    let rgb_access = b.member_access(color_ref, Some(rgb));
    let one = b.int(1);
    let positional = b.call(rgb_access, vec![one]);
    let five = b.int(5);
    let named = b.call_with(
        rgb_access,
        vec![
            Argument {
                parameter: None,
                value: one,
            },
            Argument {
                parameter: Some(g),
                value: five,
            },
        ],
        false,
    );
    let again = b.call(positional, vec![five]);
    let module = b.finish();
    let analysis = Analysis::new(&module).unwrap();

    assert_eq!(analysis.evaluate(red_access).to_string(), "Red");
    assert_eq!(analysis.evaluate(rgb_access).to_string(), "Rgb");
    assert_eq!(analysis.evaluate(positional).to_string(), "Rgb(r = 1, g = 0)");
    assert_eq!(analysis.evaluate(named).to_string(), "Rgb(r = 1, g = 5)");
    assert_eq!(analysis.evaluate(again), EvaluatedNode::Unknown);
    assert!(analysis.evaluate(positional).is_fully_evaluated());
}

#[test]
fn test_variant_with_missing_argument_is_partial() {
    let (mut b, _) = builder();
    let shape = b.enumeration("Shape");
    let circle = b.variant(shape, "Circle");
    b.parameter(circle, "radius", None, None);
    let circle_ref = b.reference(circle);
    let call = b.call(circle_ref, Vec::new());
    let module = b.finish();
    let analysis = Analysis::new(&module).unwrap();

    let value = analysis.evaluate(call);
    assert_eq!(value.to_string(), "Circle(radius = $unknown)");
    assert!(!value.is_fully_evaluated());
}

// =============================================================================
// Calls
// =============================================================================

#[test]
fn test_expression_lambda_call() {
    let (mut b, _) = builder();
    let x = b.free_parameter("x", None, None);
    let x_ref = b.reference(x);
    let two = b.int(2);
    let body = b.infix(InfixOperator::Times, x_ref, two);
    let lambda = b.expression_lambda(vec![x], body);
    let f = val(&mut b, "f", lambda);
    let f_ref = b.reference(f);
    let argument = b.int(21);
    let call = b.call(f_ref, vec![argument]);
    let module = b.finish();
    let analysis = Analysis::new(&module).unwrap();

    assert_eq!(analysis.evaluate(f_ref).to_string(), "$ExpressionLambdaClosure");
    assert_eq!(analysis.evaluate(call).to_string(), "42");
    // outside of a call the parameter is not bound
    assert_eq!(analysis.evaluate(x_ref), EvaluatedNode::Unknown);
    assert_eq!(analysis.evaluate(body), EvaluatedNode::Unknown);
}

#[test]
fn test_defaults_and_named_arguments() {
    let (mut b, _) = builder();
    let x = b.free_parameter("x", None, None);
    let ten = b.int(10);
    let y = b.free_parameter("y", None, Some(ten));
    let x_ref = b.reference(x);
    let y_ref = b.reference(y);
    let sum = b.infix(InfixOperator::Plus, x_ref, y_ref);
    let lambda = b.expression_lambda(vec![x, y], sum);
    let f = val(&mut b, "f", lambda);
    let f_ref = b.reference(f);

    let one = b.int(1);
    let with_default = b.call(f_ref, vec![one]);
    let five = b.int(5);
    let with_named = b.call_with(
        f_ref,
        vec![
            Argument {
                parameter: None,
                value: one,
            },
            Argument {
                parameter: Some(y),
                value: five,
            },
        ],
        false,
    );
    let missing_required = b.call(f_ref, Vec::new());
    let module = b.finish();
    let analysis = Analysis::new(&module).unwrap();

    assert_eq!(analysis.evaluate(with_default).to_string(), "11");
    assert_eq!(analysis.evaluate(with_named).to_string(), "6");
    assert_eq!(analysis.evaluate(missing_required), EvaluatedNode::Unknown);
}

#[test]
fn test_block_lambda_call() {
    let (mut b, _) = builder();
    let a = b.free_parameter("a", None, None);
    let c = b.free_parameter("c", None, None);

    let r1 = b.block_lambda_result("r1");
    let a_ref = b.reference(a);
    let two = b.int(2);
    let doubled_a = b.infix(InfixOperator::Times, a_ref, two);
    let first = b.assignment(vec![Assignee::BlockLambdaResult(r1)], doubled_a);

    let r2 = b.block_lambda_result("r2");
    let c_ref = b.reference(c);
    let doubled_c = b.infix(InfixOperator::Times, c_ref, two);
    let second = b.assignment(vec![Assignee::BlockLambdaResult(r2)], doubled_c);

    let lambda = b.block_lambda(vec![a, c], vec![first, second]);
    let f = val(&mut b, "f", lambda);
    let f_ref = b.reference(f);
    let arg_a = b.int(2);
    let arg_c = b.int(3);
    let call = b.call(f_ref, vec![arg_a, arg_c]);
    let second_result = b.member_access(call, Some(r2));
    let module = b.finish();
    let analysis = Analysis::new(&module).unwrap();

    assert_eq!(analysis.evaluate(f_ref).to_string(), "$BlockLambdaClosure");
    assert_eq!(analysis.evaluate(call).to_string(), "(r1 = 4, r2 = 6)");
    assert_eq!(analysis.evaluate(second_result).to_string(), "6");
}

#[test]
fn test_segment_call() {
    let (mut b, _) = builder();
    let segment = double_segment(&mut b);
    let r = b.module_ref().results_of(segment)[0];
    let segment_ref = b.reference(segment);
    let three = b.int(3);
    let call = b.call(segment_ref, vec![three]);
    let result = b.member_access(call, Some(r));
    let x = val(&mut b, "x", call);
    let x_ref = b.reference(x);
    let module = b.finish();
    let analysis = Analysis::new(&module).unwrap();

    assert_eq!(analysis.evaluate(segment_ref).to_string(), "$NamedCallable<double>");
    assert_eq!(analysis.evaluate(call).to_string(), "6");
    assert_eq!(analysis.evaluate(result).to_string(), "6");
    assert_eq!(analysis.evaluate(x_ref).to_string(), "6");
}

#[test]
fn test_placeholders_project_results() {
    let (mut b, _) = builder();
    let segment = b.segment("pair");
    let first = b.result(segment, "first", None);
    let second = b.result(segment, "second", None);
    let one = b.int(1);
    let text = b.string("two");
    yield_result(&mut b, segment, first, one);
    yield_result(&mut b, segment, second, text);

    let segment_ref = b.reference(segment);
    let call = b.call(segment_ref, Vec::new());
    let a = b.placeholder("a");
    let c = b.placeholder("c");
    b.assignment(vec![Assignee::Placeholder(a), Assignee::Placeholder(c)], call);
    let a_ref = b.reference(a);
    let c_ref = b.reference(c);
    let module = b.finish();
    let analysis = Analysis::new(&module).unwrap();

    assert_eq!(analysis.evaluate(call).to_string(), "(first = 1, second = \"two\")");
    assert_eq!(analysis.evaluate(a_ref).to_string(), "1");
    assert_eq!(analysis.evaluate(c_ref).to_string(), "\"two\"");
}

#[test]
fn test_closure_keeps_bindings_of_creation() {
    // segment adder(n) { yield f = (x) -> x + n; }
    let (mut b, _) = builder();
    let segment = b.segment("adder");
    let n = b.parameter(segment, "n", None, None);
    let f = b.result(segment, "f", None);
    let x = b.free_parameter("x", None, None);
    let x_ref = b.reference(x);
    let n_ref = b.reference(n);
    let sum = b.infix(InfixOperator::Plus, x_ref, n_ref);
    let lambda = b.expression_lambda(vec![x], sum);
    yield_result(&mut b, segment, f, lambda);

    let segment_ref = b.reference(segment);
    let one = b.int(1);
    let adder = b.call(segment_ref, vec![one]);
    let two = b.int(2);
    let direct = b.call(adder, vec![two]);
    let through_member = b.member_access(adder, Some(f));
    let via_member = b.call(through_member, vec![two]);
    let module = b.finish();
    let analysis = Analysis::new(&module).unwrap();

    assert_eq!(analysis.evaluate(adder).to_string(), "$ExpressionLambdaClosure");
    assert_eq!(analysis.evaluate(direct).to_string(), "3");
    assert_eq!(analysis.evaluate(via_member).to_string(), "3");
}

#[test]
fn test_nested_calls_of_the_same_segment() {
    // double(double(3))
    let (mut b, _) = builder();
    let segment = double_segment(&mut b);
    let inner_ref = b.reference(segment);
    let three = b.int(3);
    let inner = b.call(inner_ref, vec![three]);
    let outer_ref = b.reference(segment);
    let outer = b.call(outer_ref, vec![inner]);
    let module = b.finish();

    let analysis = Analysis::new(&module).unwrap();
    assert_eq!(analysis.evaluate(outer).to_string(), "12");
    assert_eq!(analysis.evaluate(inner).to_string(), "6");

    let analysis = Analysis::new(&module).unwrap();
    assert_eq!(analysis.evaluate(inner).to_string(), "6");
    assert_eq!(analysis.evaluate(outer).to_string(), "12");
}

#[test]
fn test_nested_calls_of_the_same_lambda() {
    // val f = (x) -> x + 1; f(f(1))
    let (mut b, _) = builder();
    let x = b.free_parameter("x", None, None);
    let x_ref = b.reference(x);
    let one = b.int(1);
    let body = b.infix(InfixOperator::Plus, x_ref, one);
    let lambda = b.expression_lambda(vec![x], body);
    let f = val(&mut b, "f", lambda);
    let inner_ref = b.reference(f);
    let inner = b.call(inner_ref, vec![one]);
    let outer_ref = b.reference(f);
    let outer = b.call(outer_ref, vec![inner]);
    let module = b.finish();
    let analysis = Analysis::new(&module).unwrap();

    assert_eq!(analysis.evaluate(outer).to_string(), "3");
    assert_eq!(analysis.evaluate(inner).to_string(), "2");
}

#[test]
fn test_call_limited_by_caller_is_not_memoized() {
    // val k = double(3);
    // segment shift(p) { yield r = p + k; }
    let (mut b, _) = builder();
    let segment = double_segment(&mut b);
    let segment_ref = b.reference(segment);
    let three = b.int(3);
    let call = b.call(segment_ref, vec![three]);
    let k = val(&mut b, "k", call);

    let shift = b.segment("shift");
    let p = b.parameter(shift, "p", None, None);
    let r = b.result(shift, "r", None);
    let p_ref = b.reference(p);
    let k_ref = b.reference(k);
    let sum = b.infix(InfixOperator::Plus, p_ref, k_ref);
    yield_result(&mut b, shift, r, sum);

    let shift_ref = b.reference(shift);
    let one = b.int(1);
    let shifted = b.call(shift_ref, vec![one]);
    let module = b.finish();

    let options = AnalysisOptions::default().with_max_call_depth(1);
    let analysis = Analysis::with_options(&module, options).unwrap();
    // inside `shift`, calling `double` would exceed the depth limit
    assert_eq!(analysis.evaluate(shifted), EvaluatedNode::Unknown);
    assert_eq!(analysis.evaluate(k_ref).to_string(), "6");
    assert_eq!(analysis.evaluate(call).to_string(), "6");
}

#[test]
fn test_recursive_calls_are_not_evaluated() {
    // segment loop(n) { yield r = loop(n); }
    let (mut b, _) = builder();
    let segment = b.segment("loop");
    let n = b.parameter(segment, "n", None, None);
    let r = b.result(segment, "r", None);
    let inner_ref = b.reference(segment);
    let n_ref = b.reference(n);
    let inner = b.call(inner_ref, vec![n_ref]);
    yield_result(&mut b, segment, r, inner);

    let outer_ref = b.reference(segment);
    let one = b.int(1);
    let outer = b.call(outer_ref, vec![one]);
    let module = b.finish();
    let analysis = Analysis::new(&module).unwrap();

    assert_eq!(analysis.evaluate(outer), EvaluatedNode::Unknown);
}

#[test]
fn test_call_depth_limit() {
    let (mut b, _) = builder();
    let segment = double_segment(&mut b);
    let segment_ref = b.reference(segment);
    let three = b.int(3);
    let call = b.call(segment_ref, vec![three]);
    let module = b.finish();

    let options = AnalysisOptions::default().with_max_call_depth(0);
    let analysis = Analysis::with_options(&module, options).unwrap();
    assert_eq!(analysis.evaluate(call), EvaluatedNode::Unknown);

    let analysis = Analysis::new(&module).unwrap();
    assert_eq!(analysis.evaluate(call).to_string(), "6");
}

#[test]
fn test_function_calls_are_not_evaluated() {
    let (mut b, _) = builder();
    let function = b.function("f");
    let function_ref = b.reference(function);
    let call = b.call(function_ref, Vec::new());

    assert_eq!(evaluate(b, call), "$unknown");
}

#[test]
fn test_self_referencing_placeholder() {
    // val a = a;
    let (mut b, _) = builder();
    let a = b.placeholder("a");
    let a_ref = b.reference(a);
    b.assignment(vec![Assignee::Placeholder(a)], a_ref);

    assert_eq!(evaluate(b, a_ref), "$unknown");
}

#[test]
fn test_unresolved_references() {
    let (mut b, _) = builder();
    let unresolved = b.unresolved_reference();
    let one = b.int(1);
    let member = b.member_access(one, None);
    let call = b.call(unresolved, vec![one]);
    let module = b.finish();
    let analysis = Analysis::new(&module).unwrap();

    assert_eq!(analysis.evaluate(unresolved), EvaluatedNode::Unknown);
    assert_eq!(analysis.evaluate(member), EvaluatedNode::Unknown);
    assert_eq!(analysis.evaluate(call), EvaluatedNode::Unknown);
}
