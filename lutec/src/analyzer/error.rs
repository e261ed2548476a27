//!
//! Semantic Error Types
//!
//! First-violation diagnostics for the analyzer. Each variant renders the
//! exact user-visible message; analysis aborts on the first error and no
//! code is generated.
//!

use thiserror::Error;

use super::symbols::SourceType;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemanticError {
    #[error("Main function already declared")]
    MainAlreadyDeclared,

    #[error("Main function must have a body")]
    MainMissingBody,

    #[error("Function {0} already declared")]
    FunctionAlreadyDeclared(String),

    #[error("Function {0} must return a value")]
    FunctionMissingReturn(String),

    #[error("Function {0} must have a body")]
    FunctionMissingBody(String),

    #[error("Function {0} not declared")]
    FunctionNotDeclared(String),

    #[error("Variable {0} already declared")]
    VariableAlreadyDeclared(String),

    #[error("Variable {0} not declared")]
    VariableNotDeclared(String),

    #[error("Variable {name} must be initialized with a {expected}")]
    InvalidInitialization { name: String, expected: SourceType },

    #[error("If statement must have a condition")]
    IfMissingCondition,

    #[error("If statement must have a body")]
    IfMissingBody,

    #[error("Else statement must have a body")]
    ElseMissingBody,

    #[error("Loop statement must have a body")]
    LoopMissingBody,

    #[error("Invalid statement")]
    InvalidStatement,
}
