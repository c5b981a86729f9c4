//! End-to-end tests: interpreted rendering against compiled-artifact
//! execution over the same syntax trees.

use std::sync::Arc;

use indexmap::IndexMap;
use stencil_lang::expression::{BooleanExpression, ExpressionContext};
use stencil_lang::{
    Accessible, HelperNode, HelperResolver, MemoryCache, Node, ParsingState, RenderContext,
    TemplateCompiler, Value,
};

fn variables(entries: Vec<(&str, Value)>) -> Value {
    Value::Map(
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect::<IndexMap<_, _>>(),
    )
}

fn mixed_template() -> Node {
    Node::Root(vec![
        Node::text("Items: "),
        Node::Helper(
            HelperNode::new(Some("s"), "if")
                .with_argument("condition", Node::accessor("show"))
                .with_argument(
                    "then",
                    Node::Sequence(vec![Node::text("v:"), Node::accessor("count")]),
                )
                .with_argument("else", Node::text("hidden")),
        ),
        Node::text(" / "),
        Node::Expression(stencil_lang::expression::ExpressionNode::Boolean(
            BooleanExpression::parse("{count} > 2"),
        )),
        Node::text(" / "),
        Node::accessor("user.name"),
    ])
}

fn render_variables() -> Value {
    let mut user = IndexMap::new();
    user.insert("name".to_string(), Value::String("Ann".into()));
    variables(vec![
        ("show", Value::Bool(true)),
        ("count", Value::Number(3.0)),
        ("user", Value::Map(user)),
    ])
}

#[test]
fn interpreted_and_compiled_renders_agree() {
    let resolver = HelperResolver::default();
    let vars = render_variables();
    let ctx = RenderContext::new(&vars, &resolver);

    let mut state = ParsingState::new("mixed", mixed_template());
    let interpreted = state.render(&ctx).unwrap().to_output_string();
    assert_eq!(interpreted, "Items: v:3 / true / Ann");

    let mut compiler = TemplateCompiler::new(Some(Arc::new(MemoryCache::new())));
    compiler.store("mixed", &mut state, &resolver).unwrap();
    let artifact = compiler.get_compiled("mixed").unwrap();
    let compiled = artifact.render(&ctx).unwrap().to_output_string();

    assert_eq!(interpreted, compiled);
}

#[test]
fn lazy_branches_only_evaluate_when_taken() {
    // the else branch resolves an unknown helper; rendering still succeeds
    // because the then branch is taken and the else closure never runs
    let resolver = HelperResolver::default();
    let vars = variables(vec![("show", Value::Bool(true))]);
    let ctx = RenderContext::new(&vars, &resolver);

    let node = Node::Helper(
        HelperNode::new(Some("s"), "if")
            .with_argument("condition", Node::accessor("show"))
            .with_argument("then", Node::text("ok"))
            .with_argument(
                "else",
                Node::Helper(HelperNode::new(Some("s"), "doesnotexist")),
            ),
    );
    let state = ParsingState::new("lazy", Node::Root(vec![node]));
    assert_eq!(state.render(&ctx).unwrap(), Value::String("ok".into()));
}

#[test]
fn object_identity_equality_in_expressions() {
    struct Payload;

    impl Accessible for Payload {
        fn get(&self, _name: &str) -> Option<Value> {
            None
        }
    }

    let first: Arc<dyn Accessible> = Arc::new(Payload);
    let second: Arc<dyn Accessible> = Arc::new(Payload);
    let mut context = ExpressionContext::new();
    context.insert("a".to_string(), Value::Object(first.clone()));
    context.insert("b".to_string(), Value::Object(second));
    context.insert("same".to_string(), Value::Object(first));

    let expr = BooleanExpression::parse("{a} == {b}");
    assert_eq!(expr.evaluate(&context), Value::Bool(false));
    assert_eq!(expr.compile().execute(&context), Value::Bool(false));

    let expr = BooleanExpression::parse("{a} == {same}");
    assert_eq!(expr.evaluate(&context), Value::Bool(true));
}

#[test]
fn modulo_with_non_numeric_operand() {
    let mut context = ExpressionContext::new();
    context.insert("a".to_string(), Value::String("x".into()));
    context.insert("b".to_string(), Value::Number(2.0));

    let expr = BooleanExpression::parse("a % b");
    assert_eq!(expr.evaluate(&context), Value::Number(0.0));
    // the compiled form is the literal zero constant
    assert_eq!(
        expr.compile(),
        stencil_lang::expression::ExprCode::Const(Value::Number(0.0))
    );
}

#[test]
fn ignored_namespace_renders_literally_in_both_modes() {
    let mut resolver = HelperResolver::default();
    resolver.add_namespace("x", None);
    let vars = variables(vec![]);
    let ctx = RenderContext::new(&vars, &resolver);

    let root = Node::Root(vec![
        Node::text("before "),
        Node::Helper(HelperNode::new(Some("x"), "custom.tag")),
        Node::text(" after"),
    ]);
    let mut state = ParsingState::new("ignored", root);
    let interpreted = state.render(&ctx).unwrap().to_output_string();
    assert_eq!(interpreted, "before <x:custom.tag> after");

    let mut compiler = TemplateCompiler::new(Some(Arc::new(MemoryCache::new())));
    compiler.store("ignored", &mut state, &resolver).unwrap();
    let artifact = compiler.get_compiled("ignored").unwrap();
    assert_eq!(artifact.render(&ctx).unwrap().to_output_string(), interpreted);
}

#[test]
fn helper_argument_schema_violations_surface() {
    let resolver = HelperResolver::default();
    let vars = variables(vec![]);
    let ctx = RenderContext::new(&vars, &resolver);

    // "condition" is required by s:if
    let state = ParsingState::new(
        "invalid",
        Node::Root(vec![Node::Helper(HelperNode::new(Some("s"), "if"))]),
    );
    let err = state.render(&ctx).unwrap_err();
    assert_eq!(err.kind, stencil_lang::RenderErrorKind::Argument);
}
