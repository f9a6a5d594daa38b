use crate::expr::Expr;
use crate::token::TokenType;

/// Renders an expression in parenthesized prefix form, mainly for parser
/// tests and debugging.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expr) -> String {
        match expr {
            Expr::Literal(token) => match &token.token_type {
                TokenType::NUMBER(n) => {
                    if n.fract() == 0.0 {
                        // 3 → 3.0, keeping literals distinguishable from
                        // identifiers in printed trees.
                        format!("{:.1}", n)
                    } else {
                        n.to_string()
                    }
                }

                TokenType::STRING(s) => s.clone(),

                TokenType::TRUE | TokenType::FALSE | TokenType::NIL => token.lexeme.clone(),

                _ => unreachable!("literal expressions only carry literal tokens"),
            },

            Expr::Grouping(inner) => format!("(group {})", Self::print(inner)),

            Expr::Unary { operator, right } => {
                format!("({} {})", operator.lexeme, Self::print(right))
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => format!(
                "({} {} {})",
                operator.lexeme,
                Self::print(left),
                Self::print(right)
            ),

            Expr::Logical {
                left,
                operator,
                right,
            } => format!(
                "({} {} {})",
                operator.lexeme,
                Self::print(left),
                Self::print(right)
            ),

            Expr::Variable { name, .. } => name.lexeme.clone(),

            Expr::Assign { name, value, .. } => {
                format!("(= {} {})", name.lexeme, Self::print(value))
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                let mut s = format!("(call {}", Self::print(callee));
                for argument in arguments {
                    s.push(' ');
                    s.push_str(&Self::print(argument));
                }
                s.push(')');
                s
            }

            Expr::Get { object, name } => format!("(. {} {})", Self::print(object), name.lexeme),

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "(.= {} {} {})",
                Self::print(object),
                name.lexeme,
                Self::print(value)
            ),

            Expr::This { .. } => "this".to_string(),

            Expr::Super { method, .. } => format!("(super {})", method.lexeme),
        }
    }
}
