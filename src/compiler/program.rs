//! The compiled template representation and its interpreter loop.
//!
//! A converted node is a [`CodeBody`]: zero or more initialization
//! instructions followed by one value-yielding operand. Instructions bind
//! globally unique registers; deferred content (helper children, lazy
//! arguments) lives in the owning artifact's closure table and is referenced
//! by index.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ast::value::Value;
use crate::error::RenderError;
use crate::expression::ExprCode;
use crate::helper::{HelperArgument, HelperArguments, invoke};
use crate::render::{LazyContent, RenderContext};
use crate::variables::{self, AccessorKind};

use super::artifact::CompiledArtifact;

/// A temporary binding slot. The converter's counter makes registers unique
/// across a whole artifact.
pub type Reg = u32;

/// Index into the owning artifact's closure table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosureRef(pub usize);

/// The compiled form of one node or node list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeBody {
    /// Statements executed before the value is produced.
    pub init: Vec<Instr>,
    /// The single expression yielding the body's value.
    pub exec: Operand,
}

impl CodeBody {
    /// A body yielding a constant without initialization.
    pub fn constant(value: Value) -> Self {
        Self {
            init: Vec::new(),
            exec: Operand::Const(value),
        }
    }
}

/// One initialization statement: evaluate an operation into a register.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instr {
    pub dst: Reg,
    pub op: CompiledOp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CompiledOp {
    /// Resolve a variable path against the render variables, exactly as the
    /// interpreter does.
    Variable {
        path: String,
        accessors: Vec<Option<AccessorKind>>,
    },
    /// Execute a compiled expression.
    Expression(ExprCode),
    /// Invoke a helper with compiled arguments and deferred children.
    Helper {
        namespace: Option<String>,
        name: String,
        arguments: IndexMap<String, CompiledArg>,
        children: Option<ClosureRef>,
    },
    /// Concatenate operand output strings.
    Concat(Vec<Operand>),
}

/// A value source: an inline constant or a previously bound register.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    Const(Value),
    Reg(Reg),
}

/// A compiled helper argument: eager operand or lazy closure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CompiledArg {
    Value(Operand),
    Lazy(ClosureRef),
}

/// Execute a compiled body against a fresh register file.
pub fn execute_body(
    body: &CodeBody,
    artifact: &CompiledArtifact,
    ctx: &RenderContext<'_>,
) -> Result<Value, RenderError> {
    let mut registers: HashMap<Reg, Value> = HashMap::new();
    for instr in &body.init {
        let value = execute_op(&instr.op, artifact, ctx, &registers)?;
        registers.insert(instr.dst, value);
    }
    operand_value(&body.exec, &registers)
}

fn operand_value(operand: &Operand, registers: &HashMap<Reg, Value>) -> Result<Value, RenderError> {
    match operand {
        Operand::Const(value) => Ok(value.clone()),
        Operand::Reg(reg) => registers
            .get(reg)
            .cloned()
            .ok_or_else(|| RenderError::invalid_artifact(format!("unbound register {reg}"))),
    }
}

fn execute_op(
    op: &CompiledOp,
    artifact: &CompiledArtifact,
    ctx: &RenderContext<'_>,
    registers: &HashMap<Reg, Value>,
) -> Result<Value, RenderError> {
    match op {
        CompiledOp::Variable { path, accessors } => Ok(variables::extract_with_hints(
            ctx.variables,
            path,
            accessors,
        )),
        CompiledOp::Expression(code) => Ok(code.execute(ctx.expression_context())),
        CompiledOp::Concat(operands) => match operands.as_slice() {
            [] => Ok(Value::None),
            [single] => operand_value(single, registers),
            several => {
                let mut output = String::new();
                for operand in several {
                    output.push_str(&operand_value(operand, registers)?.to_output_string());
                }
                Ok(Value::String(output))
            }
        },
        CompiledOp::Helper {
            namespace,
            name,
            arguments,
            children,
        } => {
            let instance = ctx
                .resolver
                .create_helper(namespace.as_deref(), name)?;

            let mut helper_arguments = HelperArguments::new();
            for (argument_name, compiled) in arguments {
                let argument = match compiled {
                    CompiledArg::Value(operand) => {
                        HelperArgument::Value(operand_value(operand, registers)?)
                    }
                    CompiledArg::Lazy(closure) => HelperArgument::Lazy(LazyContent::from_body(
                        artifact.closure(*closure)?,
                        artifact,
                    )),
                };
                helper_arguments.insert(argument_name.clone(), argument);
            }
            if let Some(closure) = children {
                helper_arguments.children =
                    Some(LazyContent::from_body(artifact.closure(*closure)?, artifact));
            }

            let display_name = match namespace {
                Some(ns) => format!("{ns}:{name}"),
                None => name.clone(),
            };
            invoke::invoke(instance.as_ref(), &display_name, &helper_arguments, ctx)
        }
    }
}
