//! The helper invocation layer.
//!
//! Validates the provided arguments against the helper's declared schema,
//! dispatches the call, and propagates any helper-raised error unchanged.

use crate::ast::value::Value;
use crate::error::RenderError;
use crate::render::RenderContext;

use super::{Helper, HelperArgument, HelperArguments};

/// Invoke a helper with validated arguments.
///
/// Validation rules:
/// - an argument not present in the schema is rejected
/// - a required argument that was not provided is rejected
/// - an eagerly evaluated argument whose type does not match the declared
///   expectation is rejected; lazy arguments are checked by the helper when
///   it evaluates them
pub fn invoke(
    helper: &dyn Helper,
    display_name: &str,
    arguments: &HelperArguments<'_>,
    ctx: &RenderContext<'_>,
) -> Result<Value, RenderError> {
    let definitions = helper.arguments();

    for name in arguments.names() {
        if !definitions.iter().any(|def| def.name == name) {
            return Err(RenderError::unknown_argument(display_name, name));
        }
    }

    for def in &definitions {
        match arguments.get(&def.name) {
            None => {
                if def.required {
                    return Err(RenderError::missing_argument(display_name, &def.name));
                }
            }
            Some(HelperArgument::Value(value)) => {
                if let Some(expected) = def.expected
                    && !expected.matches(value)
                {
                    return Err(RenderError::argument_type(
                        display_name,
                        &def.name,
                        expected.name(),
                        value.type_name(),
                    ));
                }
            }
            // lazy arguments are validated by the consumer after evaluation
            Some(HelperArgument::Lazy(_)) => {}
        }
    }

    helper.render(arguments, ctx)
}

#[cfg(test)]
mod tests {
    use crate::helper::{ArgumentDefinition, ClosureHelper, ValueType};
    use crate::resolver::HelperResolver;

    use super::*;

    fn test_helper() -> impl Helper {
        ClosureHelper::new(|arguments, ctx| {
            arguments
                .value("input", ctx)
                .map(|v| v.unwrap_or(Value::None))
        })
        .with_arguments(vec![
            ArgumentDefinition::required("input", ValueType::String),
            ArgumentDefinition::optional("extra"),
        ])
    }

    #[test]
    fn test_valid_invocation() {
        let resolver = HelperResolver::default();
        let variables = Value::Map(Default::default());
        let ctx = RenderContext::new(&variables, &resolver);

        let mut arguments = HelperArguments::new();
        arguments.insert("input", HelperArgument::Value(Value::String("ok".into())));
        let result = invoke(&test_helper(), "test", &arguments, &ctx).unwrap();
        assert_eq!(result, Value::String("ok".into()));
    }

    #[test]
    fn test_unknown_argument_rejected() {
        let resolver = HelperResolver::default();
        let variables = Value::Map(Default::default());
        let ctx = RenderContext::new(&variables, &resolver);

        let mut arguments = HelperArguments::new();
        arguments.insert("input", HelperArgument::Value(Value::String("ok".into())));
        arguments.insert("bogus", HelperArgument::Value(Value::Bool(true)));
        let err = invoke(&test_helper(), "test", &arguments, &ctx).unwrap_err();
        assert_eq!(err.kind, crate::error::RenderErrorKind::Argument);
    }

    #[test]
    fn test_missing_required_rejected() {
        let resolver = HelperResolver::default();
        let variables = Value::Map(Default::default());
        let ctx = RenderContext::new(&variables, &resolver);

        let arguments = HelperArguments::new();
        let err = invoke(&test_helper(), "test", &arguments, &ctx).unwrap_err();
        assert_eq!(err.kind, crate::error::RenderErrorKind::Argument);
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let resolver = HelperResolver::default();
        let variables = Value::Map(Default::default());
        let ctx = RenderContext::new(&variables, &resolver);

        let mut arguments = HelperArguments::new();
        arguments.insert("input", HelperArgument::Value(Value::Number(1.0)));
        let err = invoke(&test_helper(), "test", &arguments, &ctx).unwrap_err();
        assert_eq!(err.kind, crate::error::RenderErrorKind::Argument);
    }

    #[test]
    fn test_helper_error_propagates_unchanged() {
        let resolver = HelperResolver::default();
        let variables = Value::Map(Default::default());
        let ctx = RenderContext::new(&variables, &resolver);

        let failing = ClosureHelper::new(|_, _| Err(RenderError::helper("boom")));
        let err = invoke(&failing, "test", &HelperArguments::new(), &ctx).unwrap_err();
        assert_eq!(err.kind, crate::error::RenderErrorKind::Helper);
        assert_eq!(err.message, "boom");
    }
}
