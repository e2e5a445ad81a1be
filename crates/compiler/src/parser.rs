//! Recursive-descent parser for Norn
//!
//! Consumes the token sequence with one token of look-ahead and builds
//! an untyped [`Module`]. Binary expressions use precedence climbing;
//! assignment is handled above the climber because it is the only
//! right-associative level.
//!
//! Grammar of record for the keyword forms:
//!
//! ```text
//! if Cond then Expr [else Expr]      // `then` omitted when the branch is a block
//! while Cond do Expr                 // `do` omitted when the body is a block
//! ```

use crate::ast::{BinaryOp, Expr, ExprKind, FunDef, Module, Param, UnaryOp};
use crate::tokenizer::{Token, TokenKind};
use crate::types::Type;

/// Binary operator levels, loosest first. Assignment sits above the
/// table; unary operators bind tighter than every level here.
const BINARY_LEVELS: &[&[&str]] = &[
    &["or"],
    &["and"],
    &["==", "!="],
    &["<", "<=", ">", ">="],
    &["+", "-"],
    &["*", "/", "%"],
];

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// The token sequence must be terminated by an `End` token, as
    /// produced by [`crate::tokenizer::tokenize`].
    pub fn new(tokens: Vec<Token>) -> Self {
        debug_assert!(
            matches!(tokens.last(), Some(t) if t.kind == TokenKind::End),
            "token sequence must end with the End sentinel"
        );
        Parser { tokens, pos: 0 }
    }

    /// Parse a whole module: function definitions followed by an
    /// optional top-level expression sequence.
    pub fn parse_module(&mut self) -> Result<Module<()>, String> {
        let mut functions = Vec::new();
        while self.check_keyword("fun") {
            functions.push(self.parse_fun_def()?);
        }
        let top_level = if self.at_end() {
            None
        } else {
            Some(self.parse_top_level()?)
        };
        if !self.at_end() {
            return Err(self.error_expected("end of input"));
        }
        Ok(Module {
            functions,
            top_level,
        })
    }

    // ------------------------------------------------------------------
    // Cursor helpers
    // ------------------------------------------------------------------

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    /// The most recently consumed token. Only meaningful after at least
    /// one `advance`.
    fn previous(&self) -> &Token {
        &self.tokens[self.pos.saturating_sub(1)]
    }

    fn at_end(&self) -> bool {
        self.peek().kind == TokenKind::End
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if !self.at_end() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind, text: &str) -> bool {
        let t = self.peek();
        t.kind == kind && t.text == text
    }

    fn check_keyword(&self, kw: &str) -> bool {
        self.check(TokenKind::Keyword, kw)
    }

    fn check_punct(&self, p: &str) -> bool {
        self.check(TokenKind::Punct, p)
    }

    fn check_operator(&self, op: &str) -> bool {
        self.check(TokenKind::Operator, op)
    }

    fn consume(&mut self, kind: TokenKind, text: &str) -> bool {
        if self.check(kind, text) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, text: &str) -> Result<Token, String> {
        if self.check(kind, text) {
            Ok(self.advance())
        } else {
            Err(self.error_expected(&format!("'{}'", text)))
        }
    }

    fn expect_identifier(&mut self, what: &str) -> Result<Token, String> {
        if self.peek().kind == TokenKind::Identifier {
            Ok(self.advance())
        } else {
            Err(self.error_expected(what))
        }
    }

    fn error_expected(&self, expected: &str) -> String {
        let t = self.peek();
        format!("{}: expected {}, found {}", t.loc, expected, t.describe())
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    fn parse_fun_def(&mut self) -> Result<FunDef<()>, String> {
        let fun_tok = self.expect(TokenKind::Keyword, "fun")?;
        let name = self.expect_identifier("a function name")?;
        self.expect(TokenKind::Punct, "(")?;
        let mut params = Vec::new();
        if !self.check_punct(")") {
            loop {
                params.push(self.parse_param()?);
                if !self.consume(TokenKind::Punct, ",") {
                    break;
                }
            }
        }
        self.expect(TokenKind::Punct, ")")?;
        self.expect(TokenKind::Punct, ":")?;
        let return_type = self.parse_type()?;
        if !self.check_punct("{") {
            return Err(self.error_expected("a function body block"));
        }
        let body = self.parse_block()?;
        Ok(FunDef {
            name: name.text,
            params,
            return_type,
            body,
            loc: fun_tok.loc,
        })
    }

    fn parse_param(&mut self) -> Result<Param, String> {
        let name = self.expect_identifier("a parameter name")?;
        self.expect(TokenKind::Punct, ":")?;
        let ty = self.parse_type()?;
        Ok(Param {
            name: name.text,
            ty,
            loc: name.loc,
        })
    }

    fn parse_type(&mut self) -> Result<Type, String> {
        let token = self.expect_identifier("a type name")?;
        Type::from_name(&token.text)
            .ok_or_else(|| format!("{}: unknown type '{}'", token.loc, token.text))
    }

    // ------------------------------------------------------------------
    // Blocks and statement sequences
    // ------------------------------------------------------------------

    fn parse_block(&mut self) -> Result<Expr, String> {
        let open = self.expect(TokenKind::Punct, "{")?;
        let (statements, result) = self.parse_statement_sequence(false)?;
        self.expect(TokenKind::Punct, "}")?;
        Ok(Expr::new(
            open.loc,
            ExprKind::Block {
                statements,
                result: result.map(Box::new),
            },
        ))
    }

    /// The module's top-level expression is a braceless block running
    /// to end of input.
    fn parse_top_level(&mut self) -> Result<Expr, String> {
        let loc = self.peek().loc;
        let (statements, result) = self.parse_statement_sequence(true)?;
        Ok(Expr::new(
            loc,
            ExprKind::Block {
                statements,
                result: result.map(Box::new),
            },
        ))
    }

    fn at_sequence_end(&self, top_level: bool) -> bool {
        if top_level {
            self.at_end()
        } else {
            self.check_punct("}")
        }
    }

    /// Shared body of braced blocks and the top level: statements
    /// terminated by `;`, with an optional trailing result expression.
    /// A statement whose last token was `}` does not need the `;`.
    fn parse_statement_sequence(
        &mut self,
        top_level: bool,
    ) -> Result<(Vec<Expr>, Option<Expr>), String> {
        let mut statements = Vec::new();
        loop {
            if self.at_sequence_end(top_level) {
                return Ok((statements, None));
            }
            let expr = if self.check_keyword("var") {
                self.parse_var_decl()?
            } else {
                self.parse_expression()?
            };
            if self.consume(TokenKind::Punct, ";") {
                statements.push(expr);
                continue;
            }
            if self.at_sequence_end(top_level) {
                return Ok((statements, Some(expr)));
            }
            // `{ ... } stmt` is legal: a block-ended expression used as
            // a statement does not require a separating semicolon.
            if self.previous().kind == TokenKind::Punct && self.previous().text == "}" {
                statements.push(expr);
                continue;
            }
            return Err(self.error_expected(if top_level {
                "';' or end of input"
            } else {
                "';' or '}'"
            }));
        }
    }

    fn parse_var_decl(&mut self) -> Result<Expr, String> {
        let var_tok = self.expect(TokenKind::Keyword, "var")?;
        let name = self.expect_identifier("a variable name")?;
        let annotation = if self.consume(TokenKind::Punct, ":") {
            Some(self.parse_type()?)
        } else {
            None
        };
        self.expect(TokenKind::Operator, "=")?;
        let initializer = self.parse_expression()?;
        Ok(Expr::new(
            var_tok.loc,
            ExprKind::VarDecl {
                name: name.text,
                annotation,
                initializer: Box::new(initializer),
            },
        ))
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    /// Full expression: the right-associative assignment level on top
    /// of the precedence climber.
    fn parse_expression(&mut self) -> Result<Expr, String> {
        let left = self.parse_binary(0)?;
        if self.check_operator("=") {
            let eq = self.advance();
            let value = self.parse_expression()?;
            return Ok(Expr::new(
                eq.loc,
                ExprKind::Assign {
                    target: Box::new(left),
                    value: Box::new(value),
                },
            ));
        }
        Ok(left)
    }

    fn peek_binary_op(&self, level: usize) -> Option<BinaryOp> {
        let t = self.peek();
        if t.kind != TokenKind::Operator || !BINARY_LEVELS[level].contains(&t.text.as_str()) {
            return None;
        }
        BinaryOp::from_symbol(&t.text)
    }

    fn parse_binary(&mut self, level: usize) -> Result<Expr, String> {
        if level == BINARY_LEVELS.len() {
            return self.parse_unary();
        }
        let mut left = self.parse_binary(level + 1)?;
        while let Some(op) = self.peek_binary_op(level) {
            let op_tok = self.advance();
            let right = self.parse_binary(level + 1)?;
            left = Expr::new(
                op_tok.loc,
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
            );
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, String> {
        let op = if self.check_operator("-") {
            Some(UnaryOp::Neg)
        } else if self.check_operator("not") {
            Some(UnaryOp::Not)
        } else {
            None
        };
        if let Some(op) = op {
            let op_tok = self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expr::new(
                op_tok.loc,
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
            ));
        }
        self.parse_primary()
    }

    /// Can the current token begin an expression? Used for the optional
    /// operands of `break` and `return`.
    fn at_expression_start(&self) -> bool {
        let t = self.peek();
        match t.kind {
            TokenKind::IntLiteral | TokenKind::BoolLiteral | TokenKind::Identifier => true,
            TokenKind::Punct => matches!(t.text.as_str(), "(" | "{"),
            TokenKind::Operator => matches!(t.text.as_str(), "-" | "not"),
            TokenKind::Keyword => {
                matches!(t.text.as_str(), "if" | "while" | "break" | "continue" | "return")
            }
            TokenKind::End => false,
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, String> {
        let t = self.peek().clone();
        match t.kind {
            TokenKind::IntLiteral => {
                self.advance();
                let value: i64 = t
                    .text
                    .parse()
                    .map_err(|_| format!("{}: integer literal '{}' out of range", t.loc, t.text))?;
                Ok(Expr::new(t.loc, ExprKind::IntLit(value)))
            }
            TokenKind::BoolLiteral => {
                self.advance();
                Ok(Expr::new(t.loc, ExprKind::BoolLit(t.text == "true")))
            }
            TokenKind::Identifier => {
                self.advance();
                if self.check_punct("(") {
                    let args = self.parse_call_args()?;
                    Ok(Expr::new(
                        t.loc,
                        ExprKind::Call {
                            callee: t.text,
                            args,
                        },
                    ))
                } else {
                    Ok(Expr::new(t.loc, ExprKind::Ident(t.text)))
                }
            }
            TokenKind::Punct if t.text == "(" => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(TokenKind::Punct, ")")?;
                Ok(inner)
            }
            TokenKind::Punct if t.text == "{" => self.parse_block(),
            TokenKind::Keyword if t.text == "if" => self.parse_if(),
            TokenKind::Keyword if t.text == "while" => self.parse_while(),
            TokenKind::Keyword if t.text == "break" => {
                self.advance();
                let value = if self.at_expression_start() {
                    Some(Box::new(self.parse_expression()?))
                } else {
                    None
                };
                Ok(Expr::new(t.loc, ExprKind::Break { value }))
            }
            TokenKind::Keyword if t.text == "continue" => {
                self.advance();
                Ok(Expr::new(t.loc, ExprKind::Continue))
            }
            TokenKind::Keyword if t.text == "return" => {
                self.advance();
                let value = if self.at_expression_start() {
                    Some(Box::new(self.parse_expression()?))
                } else {
                    None
                };
                Ok(Expr::new(t.loc, ExprKind::Return { value }))
            }
            _ => Err(self.error_expected("an expression")),
        }
    }

    fn parse_call_args(&mut self) -> Result<Vec<Expr>, String> {
        self.expect(TokenKind::Punct, "(")?;
        let mut args = Vec::new();
        if !self.check_punct(")") {
            loop {
                args.push(self.parse_expression()?);
                if !self.consume(TokenKind::Punct, ",") {
                    break;
                }
            }
        }
        self.expect(TokenKind::Punct, ")")?;
        Ok(args)
    }

    fn parse_if(&mut self) -> Result<Expr, String> {
        let if_tok = self.expect(TokenKind::Keyword, "if")?;
        let condition = self.parse_expression()?;
        let then_branch = if self.check_punct("{") {
            self.parse_block()?
        } else {
            self.expect(TokenKind::Keyword, "then")?;
            self.parse_expression()?
        };
        let else_branch = if self.consume(TokenKind::Keyword, "else") {
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };
        Ok(Expr::new(
            if_tok.loc,
            ExprKind::If {
                condition: Box::new(condition),
                then_branch: Box::new(then_branch),
                else_branch,
            },
        ))
    }

    fn parse_while(&mut self) -> Result<Expr, String> {
        let while_tok = self.expect(TokenKind::Keyword, "while")?;
        let condition = self.parse_expression()?;
        let body = if self.check_punct("{") {
            self.parse_block()?
        } else {
            self.expect(TokenKind::Keyword, "do")?;
            self.parse_expression()?
        };
        Ok(Expr::new(
            while_tok.loc,
            ExprKind::While {
                condition: Box::new(condition),
                body: Box::new(body),
            },
        ))
    }
}

/// Convenience entry point: tokens in, module out.
pub fn parse(tokens: Vec<Token>) -> Result<Module<()>, String> {
    Parser::new(tokens).parse_module()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    fn parse_source(source: &str) -> Result<Module<()>, String> {
        parse(tokenize(source).expect("tokenize"))
    }

    /// The single top-level expression of a module whose top level is
    /// one trailing expression.
    fn top_expr(source: &str) -> Expr {
        let module = parse_source(source).expect("parse");
        let top = module.top_level.expect("top-level expression");
        match top.kind {
            ExprKind::Block {
                statements,
                result: Some(result),
            } if statements.is_empty() => *result,
            other => panic!("expected a single trailing expression, got {:?}", other),
        }
    }

    fn binary_parts(expr: Expr) -> (BinaryOp, Expr, Expr) {
        match expr.kind {
            ExprKind::Binary { op, left, right } => (op, *left, *right),
            other => panic!("expected a binary node, got {:?}", other),
        }
    }

    fn ident_name(expr: &Expr) -> &str {
        match &expr.kind {
            ExprKind::Ident(name) => name,
            other => panic!("expected an identifier, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_input_is_empty_module() {
        let module = parse_source("").unwrap();
        assert!(module.is_empty());
    }

    #[test]
    fn test_multiplication_binds_tighter_than_addition() {
        let (op, left, right) = binary_parts(top_expr("x + y * z"));
        assert_eq!(op, BinaryOp::Add);
        assert_eq!(ident_name(&left), "x");
        let (inner_op, l, r) = binary_parts(right);
        assert_eq!(inner_op, BinaryOp::Mul);
        assert_eq!(ident_name(&l), "y");
        assert_eq!(ident_name(&r), "z");

        // ... and on the other side.
        let (op, left, _) = binary_parts(top_expr("x * y + z"));
        assert_eq!(op, BinaryOp::Add);
        assert_eq!(binary_parts(left).0, BinaryOp::Mul);
    }

    #[test]
    fn test_comparison_binds_looser_than_arithmetic() {
        let (op, _, right) = binary_parts(top_expr("a < b + c"));
        assert_eq!(op, BinaryOp::Lt);
        assert_eq!(binary_parts(right).0, BinaryOp::Add);
    }

    #[test]
    fn test_equality_binds_looser_than_comparison() {
        let (op, _, right) = binary_parts(top_expr("a == b < c"));
        assert_eq!(op, BinaryOp::Eq);
        assert_eq!(binary_parts(right).0, BinaryOp::Lt);
    }

    #[test]
    fn test_logical_levels() {
        let (op, left, _) = binary_parts(top_expr("a and b or c"));
        assert_eq!(op, BinaryOp::Or);
        assert_eq!(binary_parts(left).0, BinaryOp::And);

        let (op, _, right) = binary_parts(top_expr("a or b and c"));
        assert_eq!(op, BinaryOp::Or);
        assert_eq!(binary_parts(right).0, BinaryOp::And);
    }

    #[test]
    fn test_left_associativity() {
        // a - b - c parses as (a - b) - c
        let (op, left, right) = binary_parts(top_expr("a - b - c"));
        assert_eq!(op, BinaryOp::Sub);
        assert_eq!(ident_name(&right), "c");
        let (_, l, r) = binary_parts(left);
        assert_eq!(ident_name(&l), "a");
        assert_eq!(ident_name(&r), "b");
    }

    #[test]
    fn test_assignment_is_right_associative() {
        // a = b = c parses as a = (b = c)
        let expr = top_expr("a = b = c");
        let ExprKind::Assign { target, value } = expr.kind else {
            panic!("expected assignment");
        };
        assert_eq!(ident_name(&target), "a");
        let ExprKind::Assign { target, value } = value.kind else {
            panic!("expected nested assignment");
        };
        assert_eq!(ident_name(&target), "b");
        assert_eq!(ident_name(&value), "c");
    }

    #[test]
    fn test_unary_binds_tighter_than_binary() {
        let (op, left, _) = binary_parts(top_expr("-x * y"));
        assert_eq!(op, BinaryOp::Mul);
        assert!(matches!(
            left.kind,
            ExprKind::Unary {
                op: UnaryOp::Neg,
                ..
            }
        ));

        let (op, left, _) = binary_parts(top_expr("not a and b"));
        assert_eq!(op, BinaryOp::And);
        assert!(matches!(
            left.kind,
            ExprKind::Unary {
                op: UnaryOp::Not,
                ..
            }
        ));
    }

    #[test]
    fn test_parentheses_override_precedence() {
        let (op, left, _) = binary_parts(top_expr("(x + y) * z"));
        assert_eq!(op, BinaryOp::Mul);
        assert_eq!(binary_parts(left).0, BinaryOp::Add);
    }

    #[test]
    fn test_if_then_else() {
        let expr = top_expr("if c then a else b");
        let ExprKind::If {
            condition,
            then_branch,
            else_branch,
        } = expr.kind
        else {
            panic!("expected if");
        };
        assert_eq!(ident_name(&condition), "c");
        assert_eq!(ident_name(&then_branch), "a");
        assert_eq!(ident_name(else_branch.as_deref().unwrap()), "b");
    }

    #[test]
    fn test_if_block_form_omits_then() {
        let expr = top_expr("if c { a }");
        let ExprKind::If {
            then_branch,
            else_branch,
            ..
        } = expr.kind
        else {
            panic!("expected if");
        };
        assert!(matches!(then_branch.kind, ExprKind::Block { .. }));
        assert!(else_branch.is_none());
    }

    #[test]
    fn test_if_non_block_requires_then() {
        let err = parse_source("if c a else b").unwrap_err();
        assert!(err.contains("'then'"), "got: {}", err);
    }

    #[test]
    fn test_while_do_and_block_forms() {
        let expr = top_expr("while c do f()");
        assert!(matches!(expr.kind, ExprKind::While { .. }));

        let expr = top_expr("while c { f(); }");
        let ExprKind::While { body, .. } = expr.kind else {
            panic!("expected while");
        };
        assert!(matches!(body.kind, ExprKind::Block { .. }));

        let err = parse_source("while c f()").unwrap_err();
        assert!(err.contains("'do'"), "got: {}", err);
    }

    #[test]
    fn test_else_if_chains() {
        let expr = top_expr("if a then 1 else if b then 2 else 3");
        let ExprKind::If { else_branch, .. } = expr.kind else {
            panic!("expected if");
        };
        assert!(matches!(
            else_branch.unwrap().kind,
            ExprKind::If { .. }
        ));
    }

    #[test]
    fn test_call_arguments() {
        let expr = top_expr("f(1, x, g())");
        let ExprKind::Call { callee, args } = expr.kind else {
            panic!("expected call");
        };
        assert_eq!(callee, "f");
        assert_eq!(args.len(), 3);
        assert!(matches!(args[2].kind, ExprKind::Call { .. }));
    }

    #[test]
    fn test_block_trailing_expression_vs_statement() {
        let expr = top_expr("{ f(); g() }");
        let ExprKind::Block { statements, result } = expr.kind else {
            panic!("expected block");
        };
        assert_eq!(statements.len(), 1);
        assert!(result.is_some());

        let expr = top_expr("{ f(); g(); }");
        let ExprKind::Block { statements, result } = expr.kind else {
            panic!("expected block");
        };
        assert_eq!(statements.len(), 2);
        assert!(result.is_none());
    }

    #[test]
    fn test_block_ended_statement_needs_no_semicolon() {
        // The inner if-block is a statement even without a `;` after `}`.
        let module = parse_source("while true { if i == 3 { break; } print_int(i); i = i + 1; }");
        assert!(module.is_ok(), "got: {:?}", module);
    }

    #[test]
    fn test_missing_semicolon_between_statements() {
        let err = parse_source("f() g()").unwrap_err();
        assert!(err.contains("';'"), "got: {}", err);
    }

    #[test]
    fn test_top_level_statement_sequence() {
        let module = parse_source("var x: Int = read_int(); print_int(x * x);").unwrap();
        let top = module.top_level.unwrap();
        let ExprKind::Block { statements, result } = top.kind else {
            panic!("expected top-level block");
        };
        assert_eq!(statements.len(), 2);
        assert!(result.is_none());
        assert!(matches!(
            statements[0].kind,
            ExprKind::VarDecl {
                annotation: Some(Type::Int),
                ..
            }
        ));
    }

    #[test]
    fn test_var_decl_without_annotation() {
        let module = parse_source("var flag = true;").unwrap();
        let ExprKind::Block { statements, .. } = module.top_level.unwrap().kind else {
            panic!("expected block");
        };
        assert!(matches!(
            statements[0].kind,
            ExprKind::VarDecl {
                annotation: None,
                ..
            }
        ));
    }

    #[test]
    fn test_fun_def() {
        let module = parse_source("fun sq(x: Int): Int { return x*x; }").unwrap();
        assert_eq!(module.functions.len(), 1);
        let f = &module.functions[0];
        assert_eq!(f.name, "sq");
        assert_eq!(f.params.len(), 1);
        assert_eq!(f.params[0].name, "x");
        assert_eq!(f.params[0].ty, Type::Int);
        assert_eq!(f.return_type, Type::Int);
        assert!(module.top_level.is_none());
    }

    #[test]
    fn test_fun_defs_followed_by_top_level() {
        let module =
            parse_source("fun sq(x: Int): Int { return x*x; } print_int(sq(3) + sq(4));").unwrap();
        assert_eq!(module.functions.len(), 1);
        assert!(module.top_level.is_some());
    }

    #[test]
    fn test_break_with_and_without_value() {
        let expr = top_expr("while true do break");
        let ExprKind::While { body, .. } = expr.kind else {
            panic!("expected while");
        };
        assert!(matches!(body.kind, ExprKind::Break { value: None }));

        let expr = top_expr("while true do break 42");
        let ExprKind::While { body, .. } = expr.kind else {
            panic!("expected while");
        };
        assert!(matches!(body.kind, ExprKind::Break { value: Some(_) }));
    }

    #[test]
    fn test_return_without_value_before_semicolon() {
        let module = parse_source("fun f(): Unit { return; }").unwrap();
        let ExprKind::Block { statements, .. } = &module.functions[0].body.kind else {
            panic!("expected block body");
        };
        assert!(matches!(
            statements[0].kind,
            ExprKind::Return { value: None }
        ));
    }

    #[test]
    fn test_premature_end_of_input() {
        let err = parse_source("(1 +").unwrap_err();
        assert!(err.contains("end of input"), "got: {}", err);
    }

    #[test]
    fn test_unknown_type_name() {
        let err = parse_source("var x: Float = 1;").unwrap_err();
        assert!(err.contains("unknown type 'Float'"), "got: {}", err);
    }

    #[test]
    fn test_error_carries_location() {
        let err = parse_source("var x = ;").unwrap_err();
        assert!(err.contains("line 1, column 9"), "got: {}", err);
    }

    #[test]
    fn test_integer_literal_out_of_range() {
        let err = parse_source("var x = 99999999999999999999;").unwrap_err();
        assert!(err.contains("out of range"), "got: {}", err);
    }
}
