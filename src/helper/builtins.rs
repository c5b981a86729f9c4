//! Built-in helpers registered under the default `s` namespace alias.

use crate::ast::value::Value;
use crate::error::RenderError;
use crate::render::RenderContext;

use super::{ArgumentDefinition, Helper, HelperArguments};

/// `s:if` renders one of two lazy branches based on a condition.
///
/// Arguments: `condition` (required), `then` and `else` (optional, lazy).
/// Without a `then` argument the child content is the then branch. Only the
/// taken branch is evaluated.
pub struct IfHelper;

impl Helper for IfHelper {
    fn arguments(&self) -> Vec<ArgumentDefinition> {
        vec![
            ArgumentDefinition::new("condition", None, true),
            ArgumentDefinition::optional("then"),
            ArgumentDefinition::optional("else"),
        ]
    }

    fn render(
        &self,
        arguments: &HelperArguments<'_>,
        ctx: &RenderContext<'_>,
    ) -> Result<Value, RenderError> {
        let condition = arguments
            .value("condition", ctx)?
            .unwrap_or(Value::None)
            .is_truthy();
        if condition {
            arguments.value_or_children("then", ctx)
        } else {
            Ok(arguments.value("else", ctx)?.unwrap_or(Value::None))
        }
    }
}

/// `s:format.cdata` wraps its content in a CDATA section.
pub struct CdataHelper;

impl Helper for CdataHelper {
    fn arguments(&self) -> Vec<ArgumentDefinition> {
        vec![ArgumentDefinition::optional("value")]
    }

    fn render(
        &self,
        arguments: &HelperArguments<'_>,
        ctx: &RenderContext<'_>,
    ) -> Result<Value, RenderError> {
        let content = arguments.value_or_children("value", ctx)?;
        Ok(Value::String(format!(
            "<![CDATA[{}]]>",
            content.to_output_string()
        )))
    }
}

#[cfg(test)]
mod tests {
    use crate::helper::HelperArgument;
    use crate::resolver::HelperResolver;

    use super::*;

    #[test]
    fn test_if_helper_branches() {
        let resolver = HelperResolver::default();
        let variables = Value::Map(Default::default());
        let ctx = RenderContext::new(&variables, &resolver);

        let mut arguments = HelperArguments::new();
        arguments.insert("condition", HelperArgument::Value(Value::Bool(true)));
        arguments.insert("then", HelperArgument::Value(Value::String("yes".into())));
        arguments.insert("else", HelperArgument::Value(Value::String("no".into())));
        assert_eq!(
            IfHelper.render(&arguments, &ctx).unwrap(),
            Value::String("yes".into())
        );

        let mut arguments = HelperArguments::new();
        arguments.insert("condition", HelperArgument::Value(Value::Bool(false)));
        arguments.insert("then", HelperArgument::Value(Value::String("yes".into())));
        arguments.insert("else", HelperArgument::Value(Value::String("no".into())));
        assert_eq!(
            IfHelper.render(&arguments, &ctx).unwrap(),
            Value::String("no".into())
        );
    }

    #[test]
    fn test_if_helper_without_else() {
        let resolver = HelperResolver::default();
        let variables = Value::Map(Default::default());
        let ctx = RenderContext::new(&variables, &resolver);

        let mut arguments = HelperArguments::new();
        arguments.insert("condition", HelperArgument::Value(Value::Bool(false)));
        assert_eq!(IfHelper.render(&arguments, &ctx).unwrap(), Value::None);
    }

    #[test]
    fn test_cdata_helper() {
        let resolver = HelperResolver::default();
        let variables = Value::Map(Default::default());
        let ctx = RenderContext::new(&variables, &resolver);

        let mut arguments = HelperArguments::new();
        arguments.insert("value", HelperArgument::Value(Value::String("raw & bold".into())));
        assert_eq!(
            CdataHelper.render(&arguments, &ctx).unwrap(),
            Value::String("<![CDATA[raw & bold]]>".into())
        );
    }
}
