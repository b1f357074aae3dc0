//! Pretty-printing for IR
//!
//! Renders target-shaped debug text. This is not the emitter: it makes no
//! formatting promises beyond being stable, and it prints source constructs that
//! have not been lowered yet (`when`, subjects) in a readable pseudo-syntax.

use crate::decl::{ClassKind, DeclKind, Declaration, FunctionStyle, SuperRelation};
use crate::expr::{Block, CallStyle, Expr, ExprKind, Literal, TypeOperator};
use crate::file::IrFile;
use crate::program::Program;
use crate::stmt::Stmt;
use crate::symbol::DeclId;
use crate::types::IrType;

/// Trait for pretty-printing IR constructs
pub trait PrettyPrint {
    /// Render as debug text, resolving symbols through `program`
    fn pretty_print(&self, program: &Program) -> String;
}

impl PrettyPrint for IrFile {
    fn pretty_print(&self, program: &Program) -> String {
        let mut printer = Printer::new(program);
        for directive in self.imports.directives() {
            printer.line(&directive.to_string());
        }
        if !self.imports.is_empty() {
            printer.out.push('\n');
        }
        for &id in &self.declarations {
            printer.declaration(id);
        }
        printer.out
    }
}

impl PrettyPrint for Declaration {
    fn pretty_print(&self, program: &Program) -> String {
        let mut printer = Printer::new(program);
        printer.declaration(self.id);
        printer.out
    }
}

impl PrettyPrint for Expr {
    fn pretty_print(&self, program: &Program) -> String {
        Printer::new(program).expr(self)
    }
}

struct Printer<'a> {
    program: &'a Program,
    out: String,
    indent: usize,
}

impl<'a> Printer<'a> {
    fn new(program: &'a Program) -> Self {
        Self {
            program,
            out: String::new(),
            indent: 0,
        }
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn name(&self, id: DeclId) -> String {
        match self.program.get(id) {
            Some(decl) => decl.effective_name().to_string(),
            None => format!("<unbound {}>", id),
        }
    }

    fn ty(&self, ty: &IrType) -> String {
        let prefix = ty
            .class_symbol()
            .and_then(|class| self.program.get(class))
            .and_then(|decl| decl.annotations.import_alias.as_deref())
            .map(|library| format!("{}.", crate::decl::Annotations::import_prefix(library)))
            .unwrap_or_default();
        format!("{}{}", prefix, ty)
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    fn declaration(&mut self, id: DeclId) {
        let program = self.program;
        let Some(decl) = program.get(id) else {
            self.line(&format!("// <unbound {}>", id));
            return;
        };
        if decl.annotations.builtin {
            return;
        }
        let name = decl.effective_name().to_string();
        match &decl.kind {
            DeclKind::Class(class) => {
                let mut header = String::new();
                if class.kind == ClassKind::Interface {
                    header.push_str("abstract ");
                }
                header.push_str("class ");
                header.push_str(&name);
                let extends: Vec<String> = class
                    .super_types
                    .iter()
                    .filter(|s| s.relation == SuperRelation::Extends)
                    .map(|s| self.ty(&s.ty))
                    .collect();
                let implements: Vec<String> = class
                    .super_types
                    .iter()
                    .filter(|s| s.relation != SuperRelation::Extends)
                    .map(|s| self.ty(&s.ty))
                    .collect();
                if !extends.is_empty() {
                    header.push_str(&format!(" extends {}", extends.join(", ")));
                }
                if !implements.is_empty() {
                    header.push_str(&format!(" implements {}", implements.join(", ")));
                }
                self.line(&format!("{} {{", header));
                self.indent += 1;
                for &member in &class.members {
                    self.declaration(member);
                }
                self.indent -= 1;
                self.line("}");
            }
            DeclKind::Function(f) => {
                let mut header = String::new();
                if f.is_static {
                    header.push_str("static ");
                }
                header.push_str(&self.ty(&f.return_type));
                match f.style {
                    FunctionStyle::Getter => header.push_str(&format!(" get {}", name)),
                    FunctionStyle::Setter => header.push_str(&format!(" set {}({})", name, self.params(&f.params))),
                    FunctionStyle::Regular => header.push_str(&format!(" {}({})", name, self.params(&f.params))),
                }
                self.body(&header, f.body.as_ref());
            }
            DeclKind::Constructor(c) => {
                let class_name = self
                    .program
                    .enclosing_class(id)
                    .map(|class| self.name(class))
                    .unwrap_or_default();
                let mut header = String::new();
                if c.is_const {
                    header.push_str("const ");
                }
                if c.is_factory {
                    header.push_str("factory ");
                }
                header.push_str(&class_name);
                if !name.is_empty() {
                    header.push('.');
                    header.push_str(&name);
                }
                header.push_str(&format!("({})", self.params(&c.params)));
                if let Some(delegation) = &c.delegation {
                    header.push_str(&format!(" : {}", self.expr(delegation)));
                }
                self.body(&header, c.body.as_ref());
            }
            DeclKind::Property(p) => {
                if let Some(field) = p.backing_field {
                    self.declaration(field);
                }
                for accessor in [p.getter, p.setter].into_iter().flatten() {
                    self.declaration(accessor);
                }
            }
            DeclKind::Field(f) => {
                let mut text = String::new();
                if f.is_static {
                    text.push_str("static ");
                }
                if f.is_const {
                    text.push_str("const ");
                } else if f.is_final {
                    text.push_str("final ");
                }
                text.push_str(&format!("{} {}", self.ty(&f.ty), name));
                if let Some(init) = &f.initializer {
                    text.push_str(&format!(" = {}", self.expr(init)));
                }
                text.push(';');
                self.line(&text);
            }
            DeclKind::ValueParameter(_) | DeclKind::Variable(_) => {
                let text = self.local(id);
                self.line(&text);
            }
        }
    }

    fn body(&mut self, header: &str, body: Option<&Block>) {
        match body {
            None => self.line(&format!("{};", header)),
            Some(block) => {
                self.line(&format!("{} {{", header));
                self.indent += 1;
                self.statements(block);
                self.indent -= 1;
                self.line("}");
            }
        }
    }

    fn params(&self, params: &[DeclId]) -> String {
        let rendered: Vec<String> = params
            .iter()
            .map(|&p| match self.program.get(p).and_then(|d| d.as_param().map(|pd| (d, pd))) {
                Some((decl, param)) => {
                    let mut text = match param.initializes {
                        Some(field) => format!("this.{}", self.name(field)),
                        None => format!("{} {}", self.ty(&param.ty), decl.effective_name()),
                    };
                    if let Some(default) = &param.default_value {
                        text.push_str(&format!(" = {}", self.expr(default)));
                    }
                    text
                }
                None => self.name(p),
            })
            .collect();
        rendered.join(", ")
    }

    fn local(&self, id: DeclId) -> String {
        let Some(decl) = self.program.get(id) else {
            return format!("<unbound {}>;", id);
        };
        match &decl.kind {
            DeclKind::Variable(v) => {
                let keyword = if v.is_mutable { "var" } else { "final" };
                match &v.initializer {
                    Some(init) => format!("{} {} {} = {};", keyword, self.ty(&v.ty), decl.effective_name(), self.expr(init)),
                    None => format!("{} {} {};", keyword, self.ty(&v.ty), decl.effective_name()),
                }
            }
            _ => format!("{};", decl.effective_name()),
        }
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn statements(&mut self, block: &Block) {
        for stmt in &block.statements {
            self.stmt(stmt);
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expr(expr) => {
                let text = format!("{};", self.expr(expr));
                self.line(&text);
            }
            Stmt::Decl(id) => {
                let text = self.local(*id);
                self.line(&text);
            }
            Stmt::If { .. } => self.if_chain(stmt, ""),
            Stmt::While { label, cond, body } => {
                let label = label.as_ref().map(|l| format!("{}: ", l)).unwrap_or_default();
                let text = format!("{}while ({}) {{", label, self.expr(cond));
                self.line(&text);
                self.indent += 1;
                self.statements(body);
                self.indent -= 1;
                self.line("}");
            }
            Stmt::Block(block) => {
                self.line("{");
                self.indent += 1;
                self.statements(block);
                self.indent -= 1;
                self.line("}");
            }
            Stmt::Break(label) => match label {
                Some(l) => self.line(&format!("break {};", l)),
                None => self.line("break;"),
            },
            Stmt::Continue(label) => match label {
                Some(l) => self.line(&format!("continue {};", l)),
                None => self.line("continue;"),
            },
        }
    }

    fn if_chain(&mut self, stmt: &Stmt, lead: &str) {
        let Stmt::If {
            cond,
            then,
            otherwise,
        } = stmt
        else {
            return;
        };
        let text = format!("{}if ({}) {{", lead, self.expr(cond));
        self.line(&text);
        self.indent += 1;
        self.statements(then);
        self.indent -= 1;
        match otherwise {
            Some(block) if block.statements.len() == 1 && matches!(block.statements[0], Stmt::If { .. }) => {
                self.if_chain(&block.statements[0], "} else ");
            }
            Some(block) => {
                self.line("} else {");
                self.indent += 1;
                self.statements(block);
                self.indent -= 1;
                self.line("}");
            }
            None => self.line("}"),
        }
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn operand(&self, expr: &Expr) -> String {
        match expr.kind {
            ExprKind::Conditional { .. } | ExprKind::Binary { .. } => format!("({})", self.expr(expr)),
            _ => self.expr(expr),
        }
    }

    fn receiver(&self, receiver: Option<&Expr>, safe: bool) -> String {
        match receiver {
            Some(r) => format!("{}{}", self.operand(r), if safe { "?." } else { "." }),
            None => String::new(),
        }
    }

    fn expr(&self, expr: &Expr) -> String {
        match &expr.kind {
            ExprKind::Const(literal) => match literal {
                Literal::Int(v) => v.to_string(),
                Literal::Double(v) => format!("{:?}", v),
                Literal::Bool(v) => v.to_string(),
                Literal::String(s) => format!("'{}'", s.replace('\'', "\\'")),
                Literal::Null => "null".to_string(),
            },
            ExprKind::GetValue(id) => self.name(*id),
            ExprKind::SetValue { target, value } => format!("{} = {}", self.name(*target), self.expr(value)),
            ExprKind::GetField { receiver, field } => {
                format!("{}{}", self.receiver(receiver.as_deref(), false), self.name(*field))
            }
            ExprKind::SetField {
                receiver,
                field,
                value,
            } => format!(
                "{}{} = {}",
                self.receiver(receiver.as_deref(), false),
                self.name(*field),
                self.expr(value)
            ),
            ExprKind::Call(call) => {
                let args: Vec<String> = call.args.iter().flatten().map(|a| self.expr(a)).collect();
                let receiver = self.receiver(call.receiver.as_deref(), call.safe);
                match self.program.get(call.target) {
                    Some(target) if target.is_constructor() => {
                        let class = self
                            .program
                            .enclosing_class(call.target)
                            .map(|c| self.name(c))
                            .unwrap_or_default();
                        let named = if target.effective_name().is_empty() {
                            String::new()
                        } else {
                            format!(".{}", target.effective_name())
                        };
                        let keyword = if call.explicit_const { "const " } else { "" };
                        format!("{}{}{}({})", keyword, class, named, args.join(", "))
                    }
                    _ => {
                        let name = self.name(call.target);
                        match call.style {
                            CallStyle::Getter => format!("{}{}", receiver, name),
                            CallStyle::Setter => format!("{}{} = {}", receiver, name, args.join(", ")),
                            CallStyle::Regular => format!("{}{}({})", receiver, name, args.join(", ")),
                        }
                    }
                }
            }
            ExprKind::Binary { op, lhs, rhs } => {
                format!("{} {} {}", self.operand(lhs), op.symbol(), self.operand(rhs))
            }
            ExprKind::Not(operand) => format!("!{}", self.operand(operand)),
            ExprKind::NotNull(operand) => format!("{}!", self.operand(operand)),
            ExprKind::TypeOp {
                op,
                operand,
                operand_ty,
            } => {
                let keyword = match op {
                    TypeOperator::Is => "is",
                    TypeOperator::NotIs => "is!",
                    TypeOperator::Cast => "as",
                    TypeOperator::SafeCast => "as?",
                };
                format!("{} {} {}", self.operand(operand), keyword, self.ty(operand_ty))
            }
            ExprKind::When(when) => {
                let subject = when
                    .subject
                    .as_ref()
                    .map(|s| format!(" ({})", self.expr(s)))
                    .unwrap_or_default();
                let branches: Vec<String> = when
                    .branches
                    .iter()
                    .map(|b| {
                        let test = if b.is_else() {
                            "else".to_string()
                        } else {
                            self.expr(&b.condition)
                        };
                        format!("{} -> {}", test, self.expr(&b.result))
                    })
                    .collect();
                format!("when{} {{ {} }}", subject, branches.join("; "))
            }
            ExprKind::Subject => "<subject>".to_string(),
            ExprKind::Conditional {
                cond,
                then,
                otherwise,
            } => format!(
                "{} ? {} : {}",
                self.operand(cond),
                self.operand(then),
                self.expr(otherwise)
            ),
            ExprKind::Block(block) => self.nested(block),
            ExprKind::FunctionExpr(id) => self.lambda(*id),
            ExprKind::FunctionRef(id) => self.name(*id),
            ExprKind::Invoke { callee, args } => {
                let args: Vec<String> = args.iter().map(|a| self.expr(a)).collect();
                match callee.kind {
                    ExprKind::FunctionExpr(_) => format!("{}.call({})", self.expr(callee), args.join(", ")),
                    _ => format!("{}({})", self.operand(callee), args.join(", ")),
                }
            }
            ExprKind::Return { value, .. } => match value {
                Some(v) => format!("return {}", self.expr(v)),
                None => "return".to_string(),
            },
            ExprKind::Throw(value) => format!("throw {}", self.expr(value)),
            ExprKind::StringConcat(parts) => {
                let inner: String = parts
                    .iter()
                    .map(|p| match &p.kind {
                        ExprKind::Const(Literal::String(s)) => s.clone(),
                        _ => format!("${{{}}}", self.expr(p)),
                    })
                    .collect();
                format!("'{}'", inner)
            }
            ExprKind::Identical(a, b) => format!("identical({}, {})", self.expr(a), self.expr(b)),
            ExprKind::This { .. } => "this".to_string(),
        }
    }

    fn nested(&self, block: &Block) -> String {
        let mut printer = Printer {
            program: self.program,
            out: String::new(),
            indent: self.indent + 1,
        };
        printer.statements(block);
        let closing = "  ".repeat(self.indent);
        format!("{{\n{}{}}}", printer.out, closing)
    }

    fn lambda(&self, id: DeclId) -> String {
        let Some(function) = self.program.get(id).and_then(|d| d.as_function()) else {
            return format!("<unbound {}>", id);
        };
        let params = self.params(&function.params);
        match &function.body {
            Some(body) => format!("({}) {}", params, self.nested(body)),
            None => format!("({}) {{}}", params),
        }
    }
}
