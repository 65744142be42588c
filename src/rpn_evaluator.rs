use crate::builtins::{double_to_int, truth, truthy};
use crate::rpn_converter::RpnExpr;
use crate::tokenizer::{Func, Op, Token};
use crate::variables::VarStore;
use crate::{builtins, CalcError, Limits};

pub struct RpnEvaluator;

impl RpnEvaluator {
    /// Reduces a postfix sequence to a single value. Operand tokens read
    /// their slot from the store at this point, so a variable reflects the
    /// store's current value, not a snapshot taken while tokenizing.
    pub fn evaluate(rpn: &RpnExpr, store: &VarStore, limits: &Limits) -> Result<f64, CalcError> {
        let mut stack: Vec<f64> = Vec::new();

        for &token in rpn.iter() {
            match token {
                Token::Number(slot) | Token::Variable(slot) => {
                    if stack.len() >= limits.max_stack_depth {
                        return Err(CalcError::Overflow);
                    }
                    stack.push(store.get(slot));
                }
                Token::Op(op) => {
                    let value = if op.is_unary() {
                        let x = pop_operand(&mut stack)?;
                        Self::apply_unary_op(op, x)?
                    } else {
                        let right = pop_operand(&mut stack)?;
                        let left = pop_operand(&mut stack)?;
                        Self::apply_binary_op(op, left, right)?
                    };
                    stack.push(value);
                }
                Token::Func(func) => {
                    let value = if func.arity() == 2 {
                        let right = pop_operand(&mut stack)?;
                        let left = pop_operand(&mut stack)?;
                        Self::apply_binary_func(func, left, right)?
                    } else {
                        let x = pop_operand(&mut stack)?;
                        Self::apply_unary_func(func, x)?
                    };
                    stack.push(value);
                }
                // A parenthesis or separator that survived conversion means
                // the expression was malformed.
                _ => return Err(CalcError::Syntax),
            }
        }

        if stack.len() != 1 {
            // Leftover operands, or nothing at all: too few operators or a
            // misplaced argument separator.
            return Err(CalcError::Syntax);
        }
        let result = stack[0];
        if result.is_nan() || result.is_infinite() {
            return Err(CalcError::Undefined);
        }
        Ok(result)
    }

    fn apply_binary_op(op: Op, l: f64, r: f64) -> Result<f64, CalcError> {
        use Op::*;
        let value = match op {
            Add => l + r,
            Sub => l - r,
            Mul => l * r,
            Div => {
                if r == 0.0 {
                    return Err(CalcError::Undefined);
                }
                l / r
            }
            Exp => l.powf(r),
            IntDiv => {
                let divisor = double_to_int(r);
                if divisor == 0 {
                    return Err(CalcError::Undefined);
                }
                double_to_int(l).wrapping_div(divisor) as f64
            }
            Mod => {
                let divisor = double_to_int(r);
                if divisor == 0 {
                    return Err(CalcError::Undefined);
                }
                double_to_int(l).wrapping_rem(divisor) as f64
            }
            Eq => truth(l == r),
            Gt => truth(l > r),
            Lt => truth(l < r),
            Ge => truth(l >= r),
            Le => truth(l <= r),
            And => truth(truthy(l) && truthy(r)),
            Or => truth(truthy(l) || truthy(r)),
            Xor => truth(truthy(l) != truthy(r)),
            Implies => truth(!truthy(l) || truthy(r)),
            Iff => truth(truthy(l) == truthy(r)),
            ImpliedBy => truth(truthy(l) || !truthy(r)),
            Shl => double_to_int(l).wrapping_shl(double_to_int(r) as u32) as f64,
            Shr => double_to_int(l).wrapping_shr(double_to_int(r) as u32) as f64,
            BitAnd => (double_to_int(l) & double_to_int(r)) as f64,
            BitOr => (double_to_int(l) | double_to_int(r)) as f64,
            BitXor => (double_to_int(l) ^ double_to_int(r)) as f64,
            Neg | Not | BitNot => return Err(CalcError::Syntax),
        };
        Ok(value)
    }

    fn apply_unary_op(op: Op, x: f64) -> Result<f64, CalcError> {
        let value = match op {
            Op::Neg => -x,
            Op::Not => truth(!truthy(x)),
            Op::BitNot => (!double_to_int(x)) as f64,
            _ => return Err(CalcError::Syntax),
        };
        Ok(value)
    }

    fn apply_binary_func(func: Func, l: f64, r: f64) -> Result<f64, CalcError> {
        use Func::*;
        let value = match func {
            Gcd => builtins::gcd(r, l),
            Lcm => (r / builtins::gcd(r, l)) * l,
            // log(b, x) is the base-b logarithm of x.
            Log => r.log10() / l.log10(),
            // root(n, x) is the n-th root of x.
            Root => r.powf(1.0 / l),
            Hypot => l.hypot(r),
            Atan2 => l.atan2(r),
            // Equivalent resistance of two parallel resistors.
            Reqll => (l * r) / (l + r),
            // Relative error of l against the reference r, in percent.
            Perr => 100.0 * ((l - r).abs() / r),
            _ => return Err(CalcError::Syntax),
        };
        Ok(value)
    }

    fn apply_unary_func(func: Func, x: f64) -> Result<f64, CalcError> {
        use Func::*;
        let value = match func {
            Ceil => x.ceil(),
            Floor => x.floor(),
            Round => x.round(),
            Trunc => x.trunc(),
            Sign => {
                if x >= 0.0 {
                    1.0
                } else {
                    -1.0
                }
            }
            Abs => x.abs(),
            Ln => x.ln(),
            Log10 => x.log10(),
            Log2 => x.log2(),
            Sqrt => x.sqrt(),
            Cbrt => x.cbrt(),
            Sin => x.sin(),
            Cos => x.cos(),
            Tan => x.tan(),
            Sec => 1.0 / x.cos(),
            Csc => 1.0 / x.sin(),
            Cot => 1.0 / x.tan(),
            Asin => x.asin(),
            Acos => x.acos(),
            Atan => x.atan(),
            Asec => (1.0 / x).acos(),
            Acsc => (1.0 / x).asin(),
            Acot => builtins::acot(x),
            Sinh => x.sinh(),
            Cosh => x.cosh(),
            Tanh => x.tanh(),
            Sech => 1.0 / x.cosh(),
            Csch => 1.0 / x.sinh(),
            Coth => 1.0 / x.tanh(),
            Asinh => x.asinh(),
            Acosh => x.acosh(),
            Atanh => x.atanh(),
            Asech => (1.0 / x).acosh(),
            Acsch => (1.0 / x).asinh(),
            Acoth => (1.0 / x).atanh(),
            Sinc => builtins::sinc(x),
            Nsinc => builtins::nsinc(x),
            Erf => libm::erf(x),
            Erfc => libm::erfc(x),
            Gamma => libm::tgamma(x),
            LnGamma => libm::lgamma(x),
            Deg => x.to_degrees(),
            Rad => x.to_radians(),
            _ => return Err(CalcError::Syntax),
        };
        Ok(value)
    }
}

fn pop_operand(stack: &mut Vec<f64>) -> Result<f64, CalcError> {
    stack.pop().ok_or(CalcError::Syntax)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_tokens(build: impl FnOnce(&mut VarStore) -> Vec<Token>) -> Result<f64, CalcError> {
        let limits = Limits::default();
        let mut store = VarStore::new(limits.max_slots);
        let tokens = build(&mut store);
        RpnEvaluator::evaluate(&RpnExpr(tokens), &store, &limits)
    }

    fn num(store: &mut VarStore, value: f64) -> Token {
        Token::Number(store.alloc_literal(value).unwrap())
    }

    #[test]
    fn test_binary_chain() {
        let result = eval_tokens(|store| {
            vec![
                num(store, 1.0),
                num(store, 2.0),
                num(store, 3.0),
                Token::Op(Op::Mul),
                Token::Op(Op::Add),
            ]
        });
        assert_eq!(result.unwrap(), 7.0);
    }

    #[test]
    fn test_unary_then_binary() {
        let result = eval_tokens(|store| {
            vec![
                num(store, 1.0),
                num(store, 2.0),
                Token::Op(Op::Neg),
                Token::Op(Op::Add),
            ]
        });
        assert_eq!(result.unwrap(), -1.0);
    }

    #[test]
    fn test_two_argument_function() {
        let result = eval_tokens(|store| {
            vec![num(store, 12.0), num(store, 18.0), Token::Func(Func::Gcd)]
        });
        assert_eq!(result.unwrap(), 6.0);
    }

    #[test]
    fn test_division_by_zero_is_undefined() {
        let result = eval_tokens(|store| {
            vec![num(store, 5.0), num(store, 0.0), Token::Op(Op::Div)]
        });
        assert_eq!(result.unwrap_err(), CalcError::Undefined);
    }

    #[test]
    fn test_nan_result_is_undefined() {
        let result = eval_tokens(|store| vec![num(store, -1.0), Token::Func(Func::Sqrt)]);
        assert_eq!(result.unwrap_err(), CalcError::Undefined);
    }

    #[test]
    fn test_missing_operand_is_syntax_error() {
        let result = eval_tokens(|store| vec![num(store, 5.0), Token::Op(Op::Add)]);
        assert_eq!(result.unwrap_err(), CalcError::Syntax);
    }

    #[test]
    fn test_leftover_operand_is_syntax_error() {
        let result = eval_tokens(|store| vec![num(store, 5.0), num(store, 6.0)]);
        assert_eq!(result.unwrap_err(), CalcError::Syntax);
    }

    #[test]
    fn test_stray_paren_is_syntax_error() {
        let result = eval_tokens(|store| vec![num(store, 5.0), Token::LParen]);
        assert_eq!(result.unwrap_err(), CalcError::Syntax);
    }

    #[test]
    fn test_variable_reads_are_live() {
        let limits = Limits::default();
        let mut store = VarStore::new(limits.max_slots);
        let slot = store.define("x", 2.0).unwrap();
        let rpn = RpnExpr(vec![Token::Variable(slot), Token::Variable(slot), Token::Op(Op::Mul)]);
        assert_eq!(RpnEvaluator::evaluate(&rpn, &store, &limits).unwrap(), 4.0);

        store.define("x", 3.0).unwrap();
        assert_eq!(RpnEvaluator::evaluate(&rpn, &store, &limits).unwrap(), 9.0);
    }
}
