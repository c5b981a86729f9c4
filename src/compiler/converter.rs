//! Node-to-code conversion.
//!
//! The converter turns syntax tree nodes into [`CodeBody`] units. Every
//! conversion produces zero or more initialization instructions and exactly
//! one value-yielding operand. Two closure builders wrap deferred content:
//! one for a full child-node list, one for a single named helper argument.
//! Both closures are stored in the artifact's closure table and execute
//! later against the ambient render context and the owning artifact.

use tracing::debug;

use crate::ast::{HelperNode, Node};
use crate::ast::value::Value;
use crate::error::CompileError;
use crate::render;
use crate::resolver::HelperResolver;

use super::program::{ClosureRef, CodeBody, CompiledArg, CompiledOp, Instr, Operand, Reg};

pub struct NodeConverter<'a> {
    resolver: &'a HelperResolver,
    counter: Reg,
    closures: Vec<CodeBody>,
}

impl<'a> NodeConverter<'a> {
    pub fn new(resolver: &'a HelperResolver) -> Self {
        Self {
            resolver,
            counter: 0,
            closures: Vec::new(),
        }
    }

    /// Reset the shared temporary counter. The compiler calls this once per
    /// stored template so register numbering is deterministic.
    pub fn set_variable_counter(&mut self, value: Reg) {
        self.counter = value;
    }

    /// Allocate the next globally unique register.
    pub fn variable_name(&mut self) -> Reg {
        let reg = self.counter;
        self.counter += 1;
        reg
    }

    /// The accumulated closure table, consumed when the artifact is built.
    pub fn into_closures(self) -> Vec<CodeBody> {
        self.closures
    }

    /// Convert one node into `{initialization, execution}`.
    pub fn convert(&mut self, node: &Node) -> Result<CodeBody, CompileError> {
        match node {
            Node::Text(text) => Ok(CodeBody::constant(Value::String(text.clone()))),
            Node::ObjectAccessor { path, accessors } => {
                let dst = self.variable_name();
                Ok(CodeBody {
                    init: vec![Instr {
                        dst,
                        op: CompiledOp::Variable {
                            path: path.clone(),
                            accessors: accessors.clone(),
                        },
                    }],
                    exec: Operand::Reg(dst),
                })
            }
            Node::Expression(expression) => {
                let dst = self.variable_name();
                Ok(CodeBody {
                    init: vec![Instr {
                        dst,
                        op: CompiledOp::Expression(expression.compile()),
                    }],
                    exec: Operand::Reg(dst),
                })
            }
            Node::Helper(helper) => self.convert_helper(helper),
            Node::Root(children) | Node::Sequence(children) => self.convert_list(children),
        }
    }

    /// Convert a node list; executions concatenate in order. A single node
    /// keeps its typed execution, mirroring the interpreter.
    pub fn convert_list(&mut self, nodes: &[Node]) -> Result<CodeBody, CompileError> {
        match nodes {
            [] => Ok(CodeBody::constant(Value::None)),
            [single] => self.convert(single),
            several => {
                let mut init = Vec::new();
                let mut operands = Vec::new();
                for node in several {
                    let converted = self.convert(node)?;
                    init.extend(converted.init);
                    operands.push(converted.exec);
                }
                let dst = self.variable_name();
                init.push(Instr {
                    dst,
                    op: CompiledOp::Concat(operands),
                });
                Ok(CodeBody {
                    init,
                    exec: Operand::Reg(dst),
                })
            }
        }
    }

    /// Wrap a full child-node list for deferred evaluation.
    pub fn wrap_child_nodes_in_closure(
        &mut self,
        nodes: &[Node],
    ) -> Result<ClosureRef, CompileError> {
        let body = self.convert_list(nodes)?;
        self.closures.push(body);
        Ok(ClosureRef(self.closures.len() - 1))
    }

    /// Wrap a single named helper argument for lazy per-argument evaluation.
    pub fn wrap_argument_in_closure(&mut self, node: &Node) -> Result<ClosureRef, CompileError> {
        let body = self.convert(node)?;
        self.closures.push(body);
        Ok(ClosureRef(self.closures.len() - 1))
    }

    fn convert_helper(&mut self, helper: &HelperNode) -> Result<CodeBody, CompileError> {
        if let Some(namespace) = helper.namespace.as_deref()
            && self.resolver.is_namespace_ignored(namespace)
        {
            // ignored tags compile to their literal markup
            return Ok(CodeBody::constant(Value::String(
                render::reconstruct_helper(helper),
            )));
        }

        // resolution errors surface through the compiler; an uncompilable
        // helper stops compilation outright
        let instance = self
            .resolver
            .create_helper(helper.namespace.as_deref(), &helper.name)?;
        if !instance.compilable() {
            debug!(name = %helper.name, "helper stopped compilation");
            return Err(CompileError::Stopped);
        }

        let mut arguments = indexmap::IndexMap::new();
        for (name, node) in &helper.arguments {
            let compiled = match node {
                Node::Text(text) => {
                    CompiledArg::Value(Operand::Const(Value::String(text.clone())))
                }
                other => CompiledArg::Lazy(self.wrap_argument_in_closure(other)?),
            };
            arguments.insert(name.clone(), compiled);
        }

        let children = if helper.children.is_empty() {
            None
        } else {
            Some(self.wrap_child_nodes_in_closure(&helper.children)?)
        };

        let dst = self.variable_name();
        Ok(CodeBody {
            init: vec![Instr {
                dst,
                op: CompiledOp::Helper {
                    namespace: helper.namespace.clone(),
                    name: helper.name.clone(),
                    arguments,
                    children,
                },
            }],
            exec: Operand::Reg(dst),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_converts_to_constant() {
        let resolver = HelperResolver::default();
        let mut converter = NodeConverter::new(&resolver);
        let body = converter.convert(&Node::text("hi")).unwrap();
        assert!(body.init.is_empty());
        assert_eq!(body.exec, Operand::Const(Value::String("hi".into())));
    }

    #[test]
    fn test_register_numbering_is_deterministic() {
        let resolver = HelperResolver::default();
        let nodes = vec![Node::accessor("a"), Node::text("-"), Node::accessor("b")];

        let mut first = NodeConverter::new(&resolver);
        first.set_variable_counter(0);
        let mut second = NodeConverter::new(&resolver);
        second.set_variable_counter(0);
        assert_eq!(
            first.convert_list(&nodes).unwrap(),
            second.convert_list(&nodes).unwrap()
        );
    }

    #[test]
    fn test_uncompilable_helper_stops_compilation() {
        struct Uncompilable;

        impl crate::helper::Helper for Uncompilable {
            fn compilable(&self) -> bool {
                false
            }

            fn render(
                &self,
                _arguments: &crate::helper::HelperArguments<'_>,
                _ctx: &crate::render::RenderContext<'_>,
            ) -> Result<Value, crate::error::RenderError> {
                Ok(Value::None)
            }
        }

        let mut resolver = HelperResolver::default();
        resolver.register("stencil.helpers", "StaticHelper", || Box::new(Uncompilable));
        let mut converter = NodeConverter::new(&resolver);
        let node = Node::Helper(HelperNode::new(Some("s"), "static"));
        let err = converter.convert(&node).unwrap_err();
        assert!(matches!(err, CompileError::Stopped));
    }

    #[test]
    fn test_unresolvable_helper_surfaces_resolution_error() {
        let resolver = HelperResolver::default();
        let mut converter = NodeConverter::new(&resolver);
        let node = Node::Helper(HelperNode::new(Some("s"), "missing"));
        let err = converter.convert(&node).unwrap_err();
        assert!(matches!(err, CompileError::Resolution(_)));
    }

    #[test]
    fn test_ignored_namespace_compiles_to_literal() {
        let mut resolver = HelperResolver::default();
        resolver.add_namespace("raw", None);
        let mut converter = NodeConverter::new(&resolver);
        let node = Node::Helper(HelperNode::new(Some("raw"), "tag"));
        let body = converter.convert(&node).unwrap();
        assert_eq!(
            body.exec,
            Operand::Const(Value::String("<raw:tag>".into()))
        );
    }
}
