pub mod builtins;
pub mod format;
pub mod rpn_converter;
pub mod rpn_evaluator;
pub mod tokenizer;
pub mod variables;

use crate::rpn_converter::RpnConverter;
use crate::rpn_evaluator::RpnEvaluator;
use crate::variables::VarStore;

/// Everything that can go wrong while evaluating one line of input.
/// The first failure wins; later pipeline stages never run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalcError {
    Syntax,
    Overflow,
    UnknownToken(String),
    Undefined,
}

impl std::fmt::Display for CalcError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            CalcError::Syntax => write!(f, "Syntax error"),
            CalcError::Overflow => write!(f, "Overflow error"),
            CalcError::UnknownToken(text) => write!(f, "Unrecognized token \"{}\"", text),
            CalcError::Undefined => write!(f, "Undefined or out of bounds"),
        }
    }
}

impl std::error::Error for CalcError {}

/// Capacity bounds for one evaluation cycle. Exceeding any of them is an
/// [`CalcError::Overflow`], never an unbounded allocation.
#[derive(Debug, Clone)]
pub struct Limits {
    /// Longest accepted input line, in bytes.
    pub max_input_len: usize,
    /// Longest accepted numeric-literal lexeme.
    pub max_literal_len: usize,
    /// Operator stack and evaluation stack depth.
    pub max_stack_depth: usize,
    /// Longest postfix sequence.
    pub max_rpn_len: usize,
    /// Operand slots, named and anonymous combined.
    pub max_slots: usize,
    /// Unknown-token text kept for diagnostics before truncation.
    pub max_token_diag: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_input_len: 1024,
            max_literal_len: 32,
            max_stack_depth: 256,
            max_rpn_len: 512,
            max_slots: 128,
            max_token_diag: 32,
        }
    }
}

/// One interactive calculator session: the variable store plus the capacity
/// configuration. Named variables persist across lines; everything else is
/// rebuilt per call to [`Session::eval_line`].
pub struct Session {
    store: VarStore,
    limits: Limits,
}

impl Session {
    pub fn new() -> Self {
        Self::with_limits(Limits::default())
    }

    pub fn with_limits(limits: Limits) -> Self {
        Self {
            store: VarStore::new(limits.max_slots),
            limits,
        }
    }

    pub fn store(&self) -> &VarStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut VarStore {
        &mut self.store
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Runs one line through tokenize -> convert -> evaluate and stores the
    /// result in `ans`. A failed line leaves every named variable untouched.
    pub fn eval_line(&mut self, line: &str) -> Result<f64, CalcError> {
        if line.len() > self.limits.max_input_len {
            return Err(CalcError::Overflow);
        }
        self.store.clear_transients();
        let rpn = RpnConverter::convert(line, &mut self.store, &self.limits)?;
        let result = RpnEvaluator::evaluate(&rpn, &self.store, &self.limits)?;
        self.store.set_ans(result);
        Ok(result)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
