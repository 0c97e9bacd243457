use crate::expr::{Expr, ExprVisitor};
use crate::stmt::{Stmt, StmtVisitor};

/// Returns a string representation of the expression in parentheses.
macro_rules! parenthesize {
    ( $self:ident, $name:expr, $( $x:expr ),+ ) => {
        {
            let mut string = String::new();
            string += "(";
            string += $name;
            $(
                string += " ";
                string += &$x.accept($self);
            )*
            string += ")";

            string
        }
    };
}

/// Renders the AST as s-expressions for debugging and tests.
pub struct ASTPrinter;

impl ASTPrinter {
    /// Prints the expression using the visitor pattern.
    pub fn print(&mut self, expr: &Expr) -> String {
        expr.accept(self)
    }
}

impl ExprVisitor<String> for ASTPrinter {
    fn visit_assign_expr(&mut self, expr: &Expr) -> String {
        let Expr::Assign(assign) = expr else { unreachable!() };

        parenthesize!(self, format!("= {}", assign.name.lexeme).as_str(), assign.value)
    }

    fn visit_binary_expr(&mut self, expr: &Expr) -> String {
        let Expr::Binary(binary) = expr else { unreachable!() };

        parenthesize!(self, &binary.operator.lexeme, binary.left, binary.right)
    }

    fn visit_call_expr(&mut self, expr: &Expr) -> String {
        let Expr::Call(call) = expr else { unreachable!() };

        let mut string = String::new();
        string += "(call ";
        string += &call.callee.accept(self);
        for argument in &call.arguments {
            string += " ";
            string += &argument.accept(self);
        }
        string += ")";
        string
    }

    fn visit_get_expr(&mut self, expr: &Expr) -> String {
        let Expr::Get(get) = expr else { unreachable!() };

        format!("(. {} {})", get.object.accept(self), get.name.lexeme)
    }

    fn visit_grouping_expr(&mut self, expr: &Expr) -> String {
        let Expr::Grouping(grouping) = expr else { unreachable!() };

        parenthesize!(self, "group", grouping.expr)
    }

    fn visit_literal_expr(&mut self, expr: &Expr) -> String {
        let Expr::Literal(literal) = expr else { unreachable!() };

        literal.to_string()
    }

    fn visit_logical_expr(&mut self, expr: &Expr) -> String {
        let Expr::Logical(logical) = expr else { unreachable!() };

        parenthesize!(self, &logical.operator.lexeme, logical.left, logical.right)
    }

    fn visit_set_expr(&mut self, expr: &Expr) -> String {
        let Expr::Set(set) = expr else { unreachable!() };

        format!(
            "(= (. {} {}) {})",
            set.object.accept(self),
            set.name.lexeme,
            set.value.accept(self),
        )
    }

    fn visit_super_expr(&mut self, expr: &Expr) -> String {
        let Expr::Super(super_expr) = expr else { unreachable!() };

        format!("(super {})", super_expr.method.lexeme)
    }

    fn visit_this_expr(&mut self, expr: &Expr) -> String {
        let Expr::This(_) = expr else { unreachable!() };

        String::from("this")
    }

    fn visit_unary_expr(&mut self, expr: &Expr) -> String {
        let Expr::Unary(unary) = expr else { unreachable!() };

        parenthesize!(self, &unary.operator.lexeme, unary.expr)
    }

    fn visit_variable_expr(&mut self, expr: &Expr) -> String {
        let Expr::Variable(variable) = expr else { unreachable!() };

        variable.name.lexeme.clone()
    }
}

impl StmtVisitor<String> for ASTPrinter {
    fn visit_block_stmt(&mut self, stmt: &Stmt) -> String {
        let Stmt::Block(block) = stmt else { unreachable!() };

        let mut string = String::new();
        string += "{";
        for stmt in &block.statements {
            string += " ";
            string += &stmt.accept(self);
        }
        string += " }";
        string
    }

    fn visit_class_stmt(&mut self, stmt: &Stmt) -> String {
        let Stmt::Class(class) = stmt else { unreachable!() };

        let mut string = String::new();
        string += "(class ";
        string += &class.name.lexeme;
        if let Some(Expr::Variable(superclass)) = &class.superclass {
            string += " < ";
            string += &superclass.name.lexeme;
        }
        for method in &class.methods {
            string += " ";
            string += &method.accept(self);
        }
        string += ")";
        string
    }

    fn visit_expression_stmt(&mut self, stmt: &Stmt) -> String {
        let Stmt::Expression(data) = stmt else { unreachable!() };

        parenthesize!(self, "expr", data.expr)
    }

    fn visit_function_stmt(&mut self, stmt: &Stmt) -> String {
        let Stmt::Function(function) = stmt else { unreachable!() };

        let mut string = String::new();
        string += "(fun ";
        string += &function.name.lexeme;
        string += "(";
        string += &function.params.iter()
            .map(|param| param.lexeme.clone())
            .collect::<Vec<String>>()
            .join(" ");
        string += ") {";
        for stmt in &function.body {
            string += " ";
            string += &stmt.accept(self);
        }
        string += " })";
        string
    }

    fn visit_if_stmt(&mut self, stmt: &Stmt) -> String {
        let Stmt::If(data) = stmt else { unreachable!() };

        let mut string = String::new();
        string += "(if ";
        string += &data.condition.accept(self);
        string += " ";
        string += &data.then_branch.accept(self);
        if let Some(else_branch) = &data.else_branch {
            string += " else ";
            string += &else_branch.accept(self);
        }
        string += ")";
        string
    }

    fn visit_print_stmt(&mut self, stmt: &Stmt) -> String {
        let Stmt::Print(data) = stmt else { unreachable!() };

        parenthesize!(self, "print", data.expr)
    }

    fn visit_return_stmt(&mut self, stmt: &Stmt) -> String {
        let Stmt::Return(data) = stmt else { unreachable!() };

        match &data.value {
            Some(value) => parenthesize!(self, "return", value),
            None => String::from("(return)"),
        }
    }

    fn visit_var_stmt(&mut self, stmt: &Stmt) -> String {
        let Stmt::Var(data) = stmt else { unreachable!() };

        let mut string = String::new();
        string += "(var ";
        string += &data.name.lexeme;
        if let Some(initializer) = &data.initializer {
            string += " = ";
            string += &initializer.accept(self);
        }
        string += ")";
        string
    }

    fn visit_while_stmt(&mut self, stmt: &Stmt) -> String {
        let Stmt::While(data) = stmt else { unreachable!() };

        parenthesize!(self, "while", data.condition, data.body)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::expr::{BinaryData, GroupingData, UnaryData};
    use crate::literal::Literal;
    use crate::token::{Location, Token, Type};

    #[test]
    fn print_nested_expression() {
        // -123 * (45.67)
        let expr = Expr::Binary(BinaryData {
            left: Box::new(Expr::Unary(UnaryData {
                operator: Token::new(Type::Minus, String::from("-"), None, Location::new(1, 0)),
                expr: Box::new(Expr::Literal(Literal::Number(123.0))),
            })),
            operator: Token::new(Type::Star, String::from("*"), None, Location::new(1, 5)),
            right: Box::new(Expr::Grouping(GroupingData {
                expr: Box::new(Expr::Literal(Literal::Number(45.67))),
            })),
        });

        assert_eq!(ASTPrinter.print(&expr), "(* (- 123) (group 45.67))");
    }
}
