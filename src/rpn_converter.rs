use crate::tokenizer::{Op, Token, Tokenizer};
use crate::variables::VarStore;
use crate::{CalcError, Limits};

/// A postfix (Reverse Polish) encoding of one expression.
#[derive(Debug, PartialEq, Clone)]
pub struct RpnExpr(pub Vec<Token>);

impl std::ops::Deref for RpnExpr {
    type Target = Vec<Token>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::ops::DerefMut for RpnExpr {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

pub struct RpnConverter;

impl RpnConverter {
    /// Converts one infix input line to postfix with the shunting-yard
    /// algorithm, extended with implicit multiplication, unary-negation
    /// context and function-call grouping.
    pub fn convert(
        input: &str,
        store: &mut VarStore,
        limits: &Limits,
    ) -> Result<RpnExpr, CalcError> {
        let mut tokenizer = Tokenizer::new(input, limits);
        let mut output: Vec<Token> = Vec::new();
        let mut stack: Vec<Token> = Vec::new();

        // Set when the previous token could be the left factor of an
        // implicit multiplication, as in 3(5) or 2sin(0).
        let mut implicit_multiplication = false;
        // Whether the next '-' negates rather than subtracts.
        let mut unary_negation = true;

        while let Some(token) = tokenizer.next_token(unary_negation, store)? {
            match token {
                Token::ArgSeparator => {
                    // Reduce the argument so far. Running out of stack here
                    // means a misplaced separator; the evaluator's final
                    // shape check reports it.
                    while stack.last().is_some_and(|&top| top != Token::LParen) {
                        if let Some(top) = stack.pop() {
                            push_checked(&mut output, top, limits.max_rpn_len)?;
                        }
                    }
                    unary_negation = true;
                    implicit_multiplication = false;
                }
                Token::Op(op) if op.is_unary() => {
                    // Binds only to what follows; never pops siblings first.
                    push_checked(&mut stack, token, limits.max_stack_depth)?;
                }
                Token::Func(_) => {
                    if implicit_multiplication {
                        Self::push_operator(Op::Mul, &mut stack, &mut output, limits)?;
                    }
                    push_checked(&mut stack, token, limits.max_stack_depth)?;
                    implicit_multiplication = false;
                    unary_negation = true;
                }
                Token::Op(op) => {
                    Self::push_operator(op, &mut stack, &mut output, limits)?;
                    implicit_multiplication = false;
                    unary_negation = true;
                }
                Token::LParen => {
                    if implicit_multiplication {
                        Self::push_operator(Op::Mul, &mut stack, &mut output, limits)?;
                    }
                    push_checked(&mut stack, token, limits.max_stack_depth)?;
                    implicit_multiplication = false;
                    unary_negation = true;
                }
                Token::RParen => {
                    // Both flags survive a closing parenthesis, so (4)-3
                    // subtracts and (4)(3) multiplies.
                    while let Some(top) = stack.pop() {
                        if top == Token::LParen {
                            break;
                        }
                        push_checked(&mut output, top, limits.max_rpn_len)?;
                    }
                }
                Token::Number(_) | Token::Variable(_) => {
                    if implicit_multiplication {
                        Self::push_operator(Op::Mul, &mut stack, &mut output, limits)?;
                    }
                    push_checked(&mut output, token, limits.max_rpn_len)?;
                    implicit_multiplication = true;
                    unary_negation = false;
                }
            }
        }

        // Drain the stack. A leftover opening parenthesis lands in the
        // output and fails the evaluator's shape check.
        while let Some(top) = stack.pop() {
            push_checked(&mut output, top, limits.max_rpn_len)?;
        }

        Ok(RpnExpr(output))
    }

    /// Pops higher-precedence operators (and any functions) to the output,
    /// then pushes `op`. Exp pops only on strictly greater precedence,
    /// which makes it right-associative.
    fn push_operator(
        op: Op,
        stack: &mut Vec<Token>,
        output: &mut Vec<Token>,
        limits: &Limits,
    ) -> Result<(), CalcError> {
        while let Some(&top) = stack.last() {
            match top {
                Token::Func(_) => {
                    stack.pop();
                    push_checked(output, top, limits.max_rpn_len)?;
                }
                Token::Op(top_op) => {
                    let pops = if op == Op::Exp {
                        op.precedence() < top_op.precedence()
                    } else {
                        op.precedence() <= top_op.precedence()
                    };
                    if !pops {
                        break;
                    }
                    stack.pop();
                    push_checked(output, top, limits.max_rpn_len)?;
                }
                // A left parenthesis fences the scan.
                _ => break,
            }
        }
        push_checked(stack, Token::Op(op), limits.max_stack_depth)
    }
}

fn push_checked(seq: &mut Vec<Token>, token: Token, cap: usize) -> Result<(), CalcError> {
    if seq.len() >= cap {
        return Err(CalcError::Overflow);
    }
    seq.push(token);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::Func;

    fn convert(input: &str) -> Result<RpnExpr, CalcError> {
        let limits = Limits::default();
        let mut store = VarStore::new(limits.max_slots);
        RpnConverter::convert(input, &mut store, &limits)
    }

    #[test]
    fn test_precedence() {
        assert_eq!(
            convert("1 + 2 * 3").unwrap(),
            RpnExpr(vec![
                Token::Number(1),
                Token::Number(2),
                Token::Number(3),
                Token::Op(Op::Mul),
                Token::Op(Op::Add),
            ])
        );
    }

    #[test]
    fn test_parentheses() {
        assert_eq!(
            convert("(1 + 2) * 3").unwrap(),
            RpnExpr(vec![
                Token::Number(1),
                Token::Number(2),
                Token::Op(Op::Add),
                Token::Number(3),
                Token::Op(Op::Mul),
            ])
        );
    }

    #[test]
    fn test_exponent_is_right_associative() {
        assert_eq!(
            convert("2 ^ 3 ^ 2").unwrap(),
            RpnExpr(vec![
                Token::Number(1),
                Token::Number(2),
                Token::Number(3),
                Token::Op(Op::Exp),
                Token::Op(Op::Exp),
            ])
        );
    }

    #[test]
    fn test_unary_negation_binds_tight() {
        assert_eq!(
            convert("-1 * 2").unwrap(),
            RpnExpr(vec![
                Token::Number(1),
                Token::Op(Op::Neg),
                Token::Number(2),
                Token::Op(Op::Mul),
            ])
        );
    }

    #[test]
    fn test_negation_below_exponent() {
        assert_eq!(
            convert("-3 ^ 2").unwrap(),
            RpnExpr(vec![
                Token::Number(1),
                Token::Number(2),
                Token::Op(Op::Exp),
                Token::Op(Op::Neg),
            ])
        );
    }

    #[test]
    fn test_implicit_multiplication_with_parens() {
        assert_eq!(
            convert("3(5)").unwrap(),
            RpnExpr(vec![
                Token::Number(1),
                Token::Number(2),
                Token::Op(Op::Mul),
            ])
        );
    }

    #[test]
    fn test_implicit_multiplication_with_function() {
        assert_eq!(
            convert("2sin(0)").unwrap(),
            RpnExpr(vec![
                Token::Number(1),
                Token::Number(2),
                Token::Func(Func::Sin),
                Token::Op(Op::Mul),
            ])
        );
    }

    #[test]
    fn test_two_argument_function() {
        assert_eq!(
            convert("gcd(12, 18)").unwrap(),
            RpnExpr(vec![
                Token::Number(1),
                Token::Number(2),
                Token::Func(Func::Gcd),
            ])
        );
    }

    #[test]
    fn test_nested_function_arguments() {
        assert_eq!(
            convert("gcd(12, gcd(18, 24))").unwrap(),
            RpnExpr(vec![
                Token::Number(1),
                Token::Number(2),
                Token::Number(3),
                Token::Func(Func::Gcd),
                Token::Func(Func::Gcd),
            ])
        );
    }

    #[test]
    fn test_function_argument_expression() {
        // The separator reduces the first argument before the second starts.
        assert_eq!(
            convert("atan2(1 + 2, 3)").unwrap(),
            RpnExpr(vec![
                Token::Number(1),
                Token::Number(2),
                Token::Op(Op::Add),
                Token::Number(3),
                Token::Func(Func::Atan2),
            ])
        );
    }

    #[test]
    fn test_word_operator_is_infix() {
        assert_eq!(
            convert("1 and 0").unwrap(),
            RpnExpr(vec![
                Token::Number(1),
                Token::Number(2),
                Token::Op(Op::And),
            ])
        );
    }

    #[test]
    fn test_stray_left_paren_survives_to_output() {
        assert_eq!(
            convert("(1").unwrap(),
            RpnExpr(vec![Token::Number(1), Token::LParen])
        );
    }

    #[test]
    fn test_stack_capacity_is_enforced() {
        let limits = Limits {
            max_stack_depth: 4,
            ..Limits::default()
        };
        let mut store = VarStore::new(limits.max_slots);
        assert_eq!(
            RpnConverter::convert("(((((1)))))", &mut store, &limits).unwrap_err(),
            CalcError::Overflow
        );
    }

    #[test]
    fn test_rpn_capacity_is_enforced() {
        let limits = Limits {
            max_rpn_len: 4,
            ..Limits::default()
        };
        let mut store = VarStore::new(limits.max_slots);
        assert_eq!(
            RpnConverter::convert("1 + 2 + 3 + 4 + 5", &mut store, &limits).unwrap_err(),
            CalcError::Overflow
        );
    }
}
