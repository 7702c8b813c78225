use super::buffer::{hex2, hex4, CodeBuf, Instr};
use super::callable::{Callable, Kind, Param};
use super::compile::Compiler;
use super::expr::{Access, Const, Place, Value};
use super::function::Function;
use super::library::LibItem;
use super::link::{data_label, LineRef};
use super::runtime::{DATA_INT1, DATA_INT2, DATA_STRING};
use super::structure::{Branch, CallableBody, Entry, ForLoop, IfBlock, Operand, SelectBlock, Structure};
use super::var::DataType;
use crate::error;
use crate::lang::ast::Expression;
use crate::lang::{Column, Error, Ident, Literal, Operator, Parser, Token, Word};

type Result<T> = std::result::Result<T, Error>;

const NO_COLUMN: Column = 0..0;

fn var_expr(name: &str) -> Expression {
    Expression::Var(NO_COLUMN, Ident::from_name(name.to_string()))
}

fn operand_expr(op: &Operand) -> Expression {
    match op {
        Operand::Const(c) => c.to_expression(NO_COLUMN),
        Operand::Cell(name) => var_expr(name),
    }
}

fn binary(
    make: fn(Column, Box<Expression>, Box<Expression>) -> Expression,
    l: Expression,
    r: Expression,
) -> Expression {
    make(NO_COLUMN, Box::new(l), Box::new(r))
}

fn is_negative(c: &Const) -> bool {
    match c {
        Const::Int2(n) => *n < 0,
        Const::Int4(n) => *n < 0,
        Const::Dec(d) => d.is_negative(),
        Const::Str(_) => false,
    }
}

fn target_expr(col: &Column, ident: &Ident, indices: &Option<Vec<Expression>>) -> Expression {
    match indices {
        Some(ix) => Expression::Index(col.clone(), ident.clone(), ix.clone()),
        None => Expression::Var(col.clone(), ident.clone()),
    }
}

fn parse_target(p: &mut Parser) -> Result<(Column, Ident, Option<Vec<Expression>>)> {
    let (col, ident) = p.ident()?;
    let indices = if p.peek() == Some(&Token::LParen) {
        Some(p.expression_list()?)
    } else {
        None
    };
    Ok((col, ident, indices))
}

fn comma_list(p: &mut Parser) -> Result<Vec<Expression>> {
    let mut v = vec![p.expression()?];
    while p.token(&Token::Comma) {
        v.push(p.expression()?);
    }
    Ok(v)
}

impl<'a> Compiler<'a> {
    /// Compiles one statement, leaving the cursor on its separator.
    pub(super) fn statement(&mut self, p: &mut Parser) -> Result<()> {
        let word = match p.peek() {
            Some(Token::Word(w)) => *w,
            Some(Token::Ident(ident)) => {
                let name = ident.name();
                if self.current.as_deref() != Some(name) && self.callables.contains(name) {
                    return self.bare_call(p);
                }
                return self.assignment(p);
            }
            _ => {
                let col = p.peek_column();
                return Err(error!(SyntaxError, ..&col));
            }
        };
        p.next();
        let col = p.column();
        match word {
            Word::Rem1 | Word::Rem2 => {
                p.rest();
                Ok(())
            }
            Word::Let => self.assignment(p),
            Word::Print1 | Word::Print2 => self.print(p),
            Word::Input => self.input(p),
            Word::If => self.if_statement(p),
            Word::ElseIf => self.elseif_statement(p, &col),
            Word::Else => self.else_statement(p, &col),
            Word::EndIf => self.endif_statement(p, &col),
            Word::Do => self.do_statement(p),
            Word::Loop => self.loop_statement(p, &col),
            Word::While => self.while_statement(p),
            Word::Wend => self.wend_statement(p, &col),
            Word::For => self.for_statement(p),
            Word::Next => self.next_statement(p, &col),
            Word::Select => self.select_statement(p),
            Word::Case => self.case_statement(p, &col),
            Word::EndSelect => self.end_select_statement(p, &col),
            Word::Exit => self.exit_statement(p),
            Word::Goto => self.goto(p, false),
            Word::Gosub => self.goto(p, true),
            Word::Return => self.return_statement(p, &col),
            Word::On => self.on_statement(p),
            Word::End => {
                p.expect_end_of_statement()?;
                self.jump_item("", LibItem::XEXIT);
                Ok(())
            }
            Word::Stop => {
                p.expect_end_of_statement()?;
                self.jump_item("", LibItem::E_STOP);
                Ok(())
            }
            Word::Dim => self.dim_statement(p, false),
            Word::Local => {
                if self.current.is_none() {
                    return Err(error!(SyntaxError, ..&col; "LOCAL OUTSIDE SUB OR FUNCTION"));
                }
                self.dim_statement(p, true)
            }
            Word::Declare => self.declare_statement(p),
            Word::Sub => self.callable_begin(p, &col, false),
            Word::Function => self.callable_begin(p, &col, true),
            Word::EndSub => self.callable_end(p, &col, false),
            Word::EndFunction => self.callable_end(p, &col, true),
            Word::Call => self.call_statement(p),
            Word::Data => self.data_statement(p),
            Word::Read => self.read_statement(p),
            Word::Restore => self.restore_statement(p),
            Word::Poke => self.poke_statement(p),
            Word::Doke => self.doke_statement(p),
            Word::Tab => self.int_argument_call(p, LibItem::P_TAB),
            Word::Out => self.out_statement(p),
            Word::Pause => self.pause_statement(p),
            Word::Cls => {
                self.require(self.target.cls(), &col, "CLS")?;
                p.expect_end_of_statement()?;
                self.call(LibItem::XCLS);
                Ok(())
            }
            Word::Locate => self.locate_statement(p, &col),
            Word::Color => self.color_statement(p, &col),
            Word::Border => {
                self.require(self.target.border(), &col, "BORDER")?;
                self.int_argument_call(p, LibItem::XBORDER)
            }
            Word::Cursor => {
                self.require(self.target.cursor(), &col, "CURSOR")?;
                self.int_argument_call(p, LibItem::XCURS)
            }
            Word::Include => Err(error!(SyntaxError, ..&col; "INCLUDE MUST STAND ALONE")),
            _ => Err(error!(SyntaxError, ..&col; &format!("UNEXPECTED {}", word))),
        }
    }

    fn require(&self, has: bool, col: &Column, what: &str) -> Result<()> {
        if has {
            Ok(())
        } else {
            Err(error!(Unsupported, ..col; what))
        }
    }

    fn assignment(&mut self, p: &mut Parser) -> Result<()> {
        let (col, ident, indices) = parse_target(p)?;
        p.expect(Token::Operator(Operator::Equal))?;
        let expr = p.expression()?;
        p.expect_end_of_statement()?;
        self.compile_assign(&ident, &col, indices.as_deref(), &expr)
    }

    fn print(&mut self, p: &mut Parser) -> Result<()> {
        let mut trailing = false;
        loop {
            if p.is_end_of_statement() {
                break;
            }
            if p.token(&Token::Semicolon) {
                trailing = true;
                continue;
            }
            if p.token(&Token::Comma) {
                self.call(LibItem::OUTSP);
                trailing = true;
                continue;
            }
            trailing = false;
            if p.word(Word::Tab) {
                let expr = p.expression()?;
                self.compile_as(&expr, DataType::Int2)?;
                self.call(LibItem::P_TAB);
                continue;
            }
            let expr = p.expression()?;
            if let Some(Const::Str(s)) = self.const_value(&expr)? {
                if !s.is_empty() {
                    self.call(LibItem::XOUTST);
                    self.code.append_string_literal(&s);
                }
                continue;
            }
            let info = self.compile_expr(&expr)?;
            match info.ty {
                DataType::Int2 => self.call(LibItem::P_I),
                DataType::Int4 => {
                    self.call(LibItem::F_D6_CDEC_I4);
                    self.call(LibItem::P_D6);
                }
                DataType::Dec6 => self.call(LibItem::P_D6),
                DataType::Str => {
                    self.consume(&info, false);
                    self.call(LibItem::XOUTS);
                }
            }
            self.flush_marks(None);
        }
        if !trailing {
            self.call(LibItem::XOUTNL);
        }
        Ok(())
    }

    fn input(&mut self, p: &mut Parser) -> Result<()> {
        let mut prompt = None;
        if let Some(Token::Literal(Literal::String(s))) = p.peek() {
            p.next();
            prompt = Some(s.clone());
            if !p.token(&Token::Semicolon) {
                p.expect(Token::Comma)?;
            }
        }
        loop {
            let (col, ident, indices) = parse_target(p)?;
            let text = prompt.take().unwrap_or_else(|| "? ".to_string());
            let retry = self.new_label();
            self.emit_label(&retry);
            if !text.is_empty() {
                self.call(LibItem::XOUTST);
                self.code.append_string_literal(&text);
            }
            let ty = self.type_of(&target_expr(&col, &ident, &indices))?;
            match ty {
                DataType::Int2 | DataType::Str => {
                    self.var_address(&ident, &col, indices.as_deref())?;
                    if ty == DataType::Str {
                        self.call(LibItem::INSV);
                    } else {
                        self.call(LibItem::INIV);
                        self.emit("JP", &format!("C,{}", retry));
                    }
                }
                _ => {
                    self.call(LibItem::INDV);
                    self.emit("JP", &format!("C,{}", retry));
                    let (place, ty) =
                        self.resolve_var(&ident, &col, indices.as_deref(), Access::Write)?;
                    if place == Place::Dynamic {
                        self.emit("PUSH", "HL");
                    }
                    self.convert(DataType::Dec6, ty, &col)?;
                    self.store_place(&place, ty, Value::Borrowed);
                }
            }
            if !p.token(&Token::Comma) {
                break;
            }
        }
        p.expect_end_of_statement()
    }

    /// Emits the test of an IF arm. Constant conditions switch emission.
    fn open_branch(&mut self, cond: &Expression, outer: bool) -> Result<Branch> {
        match self.const_value(cond)? {
            Some(Const::Str(_)) => Err(error!(TypeMismatch, ..&cond.column())),
            Some(c) if c.is_true() => {
                self.code.set_enabled(outer);
                Ok(Branch::Taken)
            }
            Some(_) => {
                self.code.set_enabled(false);
                Ok(Branch::Skipping)
            }
            None => {
                self.code.set_enabled(outer);
                let label = self.new_label();
                self.compile_condition(cond, &label)?;
                Ok(Branch::Open(label))
            }
        }
    }

    fn if_statement(&mut self, p: &mut Parser) -> Result<()> {
        let cond = p.expression()?;
        let single_line = if p.word(Word::Then) {
            !matches!(
                p.peek(),
                None | Some(Token::Word(Word::Rem1)) | Some(Token::Word(Word::Rem2))
            )
        } else if p.peek() == Some(&Token::Word(Word::Goto)) {
            true
        } else {
            let col = p.peek_column();
            return Err(error!(SyntaxError, ..&col; "EXPECTED THEN"));
        };
        let outer = self.code.is_enabled();
        let branch = self.open_branch(&cond, outer)?;
        let end = self.new_label();
        self.structs.push(Entry {
            structure: Structure::If(IfBlock {
                branch,
                end,
                end_used: false,
                outer_enabled: outer,
                had_else: false,
                single_line,
            }),
            at: self.at.clone(),
        })?;
        if let Some(Token::Literal(Literal::Integer(_))) = p.peek() {
            self.goto(p, false)?;
        }
        Ok(())
    }

    fn top_if(&self, allow_single: bool) -> Option<IfBlock> {
        match self.structs.last() {
            Some(Entry {
                structure: Structure::If(block),
                ..
            }) if !block.had_else && (allow_single || !block.single_line) => Some(block.clone()),
            _ => None,
        }
    }

    fn set_top_if(&mut self, block: IfBlock) {
        if let Some(Entry {
            structure: Structure::If(b),
            ..
        }) = self.structs.last_mut()
        {
            *b = block;
        }
    }

    /// Ends the live arm: jumps over the rest and places the false label.
    fn leave_arm(&mut self, block: &mut IfBlock, label: &str) {
        self.emit("JP", &block.end);
        block.end_used = true;
        self.emit_label(label);
    }

    fn elseif_statement(&mut self, p: &mut Parser, col: &Column) -> Result<()> {
        let mut block = match self.top_if(false) {
            Some(b) => b,
            None => return Err(error!(ElseWithoutIf, ..col)),
        };
        let cond = p.expression()?;
        p.expect_word(Word::Then)?;
        p.expect_end_of_statement()?;
        block.branch = match block.branch.clone() {
            Branch::Open(label) => {
                self.leave_arm(&mut block, &label);
                self.open_branch(&cond, block.outer_enabled)?
            }
            Branch::Taken | Branch::Done => {
                self.code.set_enabled(false);
                Branch::Done
            }
            Branch::Skipping => self.open_branch(&cond, block.outer_enabled)?,
        };
        self.set_top_if(block);
        Ok(())
    }

    fn else_statement(&mut self, p: &mut Parser, col: &Column) -> Result<()> {
        let mut block = match self.top_if(true) {
            Some(b) => b,
            None => return Err(error!(ElseWithoutIf, ..col)),
        };
        block.had_else = true;
        block.branch = match block.branch.clone() {
            Branch::Open(label) => {
                self.leave_arm(&mut block, &label);
                Branch::Taken
            }
            Branch::Taken | Branch::Done => {
                self.code.set_enabled(false);
                Branch::Done
            }
            Branch::Skipping => {
                self.code.set_enabled(block.outer_enabled);
                Branch::Taken
            }
        };
        let single_line = block.single_line;
        self.set_top_if(block);
        if !single_line {
            p.expect_end_of_statement()?;
        } else if let Some(Token::Literal(Literal::Integer(_))) = p.peek() {
            self.goto(p, false)?;
        }
        Ok(())
    }

    fn endif_statement(&mut self, p: &mut Parser, col: &Column) -> Result<()> {
        match self.structs.last() {
            Some(Entry {
                structure: Structure::If(block),
                ..
            }) if !block.single_line => {}
            _ => return Err(error!(EndIfWithoutIf, ..col)),
        }
        p.expect_end_of_statement()?;
        self.close_if()
    }

    /// Pops the innermost IF and places its pending labels.
    pub(super) fn close_if(&mut self) -> Result<()> {
        let block = match self.structs.pop()?.structure {
            Structure::If(block) => block,
            _ => return Err(error!(InternalError; "IF EXPECTED")),
        };
        self.code.set_enabled(block.outer_enabled);
        if let Branch::Open(label) = &block.branch {
            self.emit_label(label);
        }
        if block.end_used {
            self.emit_label(&block.end);
        }
        Ok(())
    }

    fn push(&mut self, structure: Structure) -> Result<()> {
        self.structs.push(Entry {
            structure,
            at: self.at.clone(),
        })
    }

    fn do_statement(&mut self, p: &mut Parser) -> Result<()> {
        let top = self.new_label();
        let exit = self.new_label();
        self.emit_label(&top);
        if p.word(Word::While) {
            let cond = p.expression()?;
            self.compile_condition(&cond, &exit)?;
        } else if p.word(Word::Until) {
            let cond = p.expression()?;
            self.compile_condition_true(&cond, &exit)?;
        }
        p.expect_end_of_statement()?;
        self.push(Structure::Do { top, exit })
    }

    fn loop_statement(&mut self, p: &mut Parser, col: &Column) -> Result<()> {
        let (top, exit) = match self.structs.last() {
            Some(Entry {
                structure: Structure::Do { top, exit },
                ..
            }) => (top.clone(), exit.clone()),
            _ => return Err(error!(LoopWithoutDo, ..col)),
        };
        self.structs.pop()?;
        self.break_check();
        if p.word(Word::While) {
            let cond = p.expression()?;
            self.compile_condition_true(&cond, &top)?;
        } else if p.word(Word::Until) {
            let cond = p.expression()?;
            self.compile_condition(&cond, &top)?;
        } else {
            self.emit("JP", &top);
        }
        self.emit_label(&exit);
        p.expect_end_of_statement()
    }

    fn while_statement(&mut self, p: &mut Parser) -> Result<()> {
        let top = self.new_label();
        let exit = self.new_label();
        self.emit_label(&top);
        let cond = p.expression()?;
        p.expect_end_of_statement()?;
        self.compile_condition(&cond, &exit)?;
        self.push(Structure::While { top, exit })
    }

    fn wend_statement(&mut self, p: &mut Parser, col: &Column) -> Result<()> {
        let (top, exit) = match self.structs.last() {
            Some(Entry {
                structure: Structure::While { top, exit },
                ..
            }) => (top.clone(), exit.clone()),
            _ => return Err(error!(WendWithoutWhile, ..col)),
        };
        p.expect_end_of_statement()?;
        self.structs.pop()?;
        self.break_check();
        self.emit("JP", &top);
        self.emit_label(&exit);
        Ok(())
    }

    /// A FOR bound: a constant, or a hidden cell holding the value.
    fn loop_operand(&mut self, expr: &Expression, ty: DataType) -> Result<Operand> {
        match self.const_value(expr)? {
            Some(c) => Ok(Operand::Const(
                c.convert(ty).map_err(|e| e.in_column(&expr.column()))?,
            )),
            None => {
                let cell = self.hidden_cell(ty)?;
                self.compile_assign(&cell, &NO_COLUMN, None, expr)?;
                Ok(Operand::Cell(cell.name().to_string()))
            }
        }
    }

    fn for_statement(&mut self, p: &mut Parser) -> Result<()> {
        let (col, ident) = p.ident()?;
        p.expect(Token::Operator(Operator::Equal))?;
        let init = p.expression()?;
        p.expect_word(Word::To)?;
        let limit = p.expression()?;
        let step = if p.word(Word::Step) {
            p.expression()?
        } else {
            Expression::Integer(NO_COLUMN, 1)
        };
        p.expect_end_of_statement()?;
        self.compile_assign(&ident, &col, None, &init)?;
        let ty = self.type_of(&Expression::Var(col.clone(), ident.clone()))?;
        if !ty.is_numeric() {
            return Err(error!(TypeMismatch, ..&col));
        }
        let limit = self.loop_operand(&limit, ty)?;
        let step = self.loop_operand(&step, ty)?;
        self.flush_marks(None);
        let top = self.new_label();
        let exit = self.new_label();
        self.emit_label(&top);
        self.push(Structure::For(ForLoop {
            var: ident.name().to_string(),
            ty,
            limit,
            step,
            top,
            exit,
        }))
    }

    fn next_statement(&mut self, p: &mut Parser, col: &Column) -> Result<()> {
        loop {
            let named = match p.peek() {
                Some(Token::Ident(_)) => Some(p.ident()?),
                _ => None,
            };
            let f = match self.structs.last() {
                Some(Entry {
                    structure: Structure::For(f),
                    ..
                }) => f.clone(),
                _ => return Err(error!(NextWithoutFor, ..col)),
            };
            if let Some((ncol, ident)) = &named {
                if ident.name() != f.var {
                    return Err(error!(NextWithoutFor, ..ncol; ident.name()));
                }
            }
            self.structs.pop()?;
            self.close_for(&f)?;
            if !p.token(&Token::Comma) {
                break;
            }
        }
        p.expect_end_of_statement()
    }

    /// Steps the control variable and jumps back while it is in range.
    fn close_for(&mut self, f: &ForLoop) -> Result<()> {
        let var = Ident::from_name(f.var.clone());
        let step = operand_expr(&f.step);
        let limit = operand_expr(&f.limit);
        let sum = binary(Expression::Add, var_expr(&f.var), step.clone());
        self.compile_assign(&var, &NO_COLUMN, None, &sum)?;
        let cond = match &f.step {
            Operand::Const(c) if is_negative(c) => {
                binary(Expression::GreaterEqual, var_expr(&f.var), limit)
            }
            Operand::Const(_) => binary(Expression::LessEqual, var_expr(&f.var), limit),
            Operand::Cell(_) => {
                let zero = Const::Int2(0).to_expression(NO_COLUMN);
                let up = binary(
                    Expression::And,
                    binary(Expression::GreaterEqual, step.clone(), zero.clone()),
                    binary(Expression::LessEqual, var_expr(&f.var), limit.clone()),
                );
                let down = binary(
                    Expression::And,
                    binary(Expression::Less, step, zero),
                    binary(Expression::GreaterEqual, var_expr(&f.var), limit),
                );
                binary(Expression::Or, up, down)
            }
        };
        self.compile_condition(&cond, &f.exit)?;
        self.break_check();
        self.emit("JP", &f.top);
        self.emit_label(&f.exit);
        Ok(())
    }

    fn select_statement(&mut self, p: &mut Parser) -> Result<()> {
        p.expect_word(Word::Case)?;
        let expr = p.expression()?;
        p.expect_end_of_statement()?;
        let ty = self.type_of(&expr)?;
        let cell = self.hidden_cell(ty)?;
        self.compile_assign(&cell, &NO_COLUMN, None, &expr)?;
        self.flush_marks(None);
        let end = self.new_label();
        self.push(Structure::Select(SelectBlock {
            cell: cell.name().to_string(),
            ty,
            end,
            next_test: None,
            had_else: false,
        }))
    }

    fn case_statement(&mut self, p: &mut Parser, col: &Column) -> Result<()> {
        let mut block = match self.structs.last() {
            Some(Entry {
                structure: Structure::Select(b),
                ..
            }) => b.clone(),
            _ => return Err(error!(CaseWithoutSelect, ..col)),
        };
        if block.had_else {
            return Err(error!(CaseWithoutSelect, ..col; "CASE AFTER CASE ELSE"));
        }
        if let Some(next) = block.next_test.take() {
            self.emit("JP", &block.end);
            self.emit_label(&next);
        }
        if p.word(Word::Else) {
            block.had_else = true;
        } else {
            let mut tests = vec![];
            loop {
                let a = p.expression()?;
                let cell = var_expr(&block.cell);
                if p.word(Word::To) {
                    let b = p.expression()?;
                    tests.push(binary(
                        Expression::And,
                        binary(Expression::GreaterEqual, cell.clone(), a),
                        binary(Expression::LessEqual, cell, b),
                    ));
                } else {
                    tests.push(binary(Expression::Equal, cell, a));
                }
                if !p.token(&Token::Comma) {
                    break;
                }
            }
            let next = self.new_label();
            if tests.len() == 1 {
                self.compile_condition(&tests[0], &next)?;
            } else {
                let body = self.new_label();
                for test in &tests {
                    self.compile_condition_true(test, &body)?;
                }
                self.emit("JP", &next);
                self.emit_label(&body);
            }
            block.next_test = Some(next);
        }
        if let Some(Entry {
            structure: Structure::Select(b),
            ..
        }) = self.structs.last_mut()
        {
            *b = block;
        }
        p.expect_end_of_statement()
    }

    fn end_select_statement(&mut self, p: &mut Parser, col: &Column) -> Result<()> {
        let block = match self.structs.last() {
            Some(Entry {
                structure: Structure::Select(b),
                ..
            }) => b.clone(),
            _ => return Err(error!(EndSelectWithoutSelect, ..col)),
        };
        p.expect_end_of_statement()?;
        self.structs.pop()?;
        if let Some(next) = &block.next_test {
            self.emit_label(next);
        }
        self.emit_label(&block.end);
        if block.ty == DataType::Str {
            let cell = Ident::from_name(block.cell.clone());
            let empty = Expression::String(NO_COLUMN, String::new());
            self.compile_assign(&cell, &NO_COLUMN, None, &empty)?;
        }
        Ok(())
    }

    fn exit_statement(&mut self, p: &mut Parser) -> Result<()> {
        let col = p.peek_column();
        let word = match p.next() {
            Some(Token::Word(w))
                if matches!(w, Word::Do | Word::For | Word::While | Word::Sub | Word::Function) =>
            {
                *w
            }
            _ => return Err(error!(SyntaxError, ..&col; "EXPECTED DO, FOR, WHILE, SUB OR FUNCTION")),
        };
        p.expect_end_of_statement()?;
        let leaves_callable = matches!(word, Word::Sub | Word::Function);
        // Nearest structure of the named kind, never past a SUB or FUNCTION.
        let mut label = None;
        for entry in self.structs.iter_rev() {
            let s = &entry.structure;
            if let Some(l) = s.exit_for(word) {
                label = Some(l.to_string());
                break;
            }
            if s.is_callable() {
                break;
            }
        }
        if leaves_callable {
            let is_function = matches!(
                self.current_callable().map(|c| c.kind),
                Some(Kind::Function(_))
            );
            if is_function != (word == Word::Function) {
                label = None;
            }
        }
        match label {
            Some(l) => {
                self.emit("JP", &l);
                Ok(())
            }
            None => Err(error!(ExitWithoutLoop, ..&col)),
        }
    }

    fn line_ref(&mut self, p: &mut Parser) -> Result<(LineRef, Column)> {
        match p.next() {
            Some(Token::Literal(Literal::Integer(s))) => match s.parse::<u16>() {
                Ok(n) if n <= 65529 => Ok((LineRef::Number(n), p.column())),
                _ => Err(error!(UndefinedLine, ..&p.column(); s)),
            },
            Some(Token::Ident(ident)) if ident.is_plain() => {
                Ok((LineRef::Name(ident.name().to_string()), p.column()))
            }
            _ => Err(error!(SyntaxError, ..&p.column(); "EXPECTED LINE NUMBER")),
        }
    }

    fn goto(&mut self, p: &mut Parser, gosub: bool) -> Result<()> {
        let (target, col) = self.line_ref(p)?;
        let label = target.label();
        self.link.reference(target, self.at.clone(), &col);
        if gosub {
            self.emit("CALL", &label);
        } else {
            self.break_check();
            self.emit("JP", &label);
        }
        Ok(())
    }

    fn return_statement(&mut self, p: &mut Parser, col: &Column) -> Result<()> {
        if self.current.is_some() {
            return Err(error!(SyntaxError, ..col; "RETURN INSIDE SUB OR FUNCTION"));
        }
        p.expect_end_of_statement()?;
        self.emit("RET", "");
        Ok(())
    }

    fn on_statement(&mut self, p: &mut Parser) -> Result<()> {
        let expr = p.expression()?;
        let gosub = if p.word(Word::Goto) {
            false
        } else if p.word(Word::Gosub) {
            true
        } else {
            let col = p.peek_column();
            return Err(error!(SyntaxError, ..&col; "EXPECTED GOTO OR GOSUB"));
        };
        let mut targets = vec![self.line_ref(p)?];
        while p.token(&Token::Comma) {
            targets.push(self.line_ref(p)?);
        }
        p.expect_end_of_statement()?;
        if targets.len() > 255 {
            return Err(error!(Overflow, ..&expr.column(); "TOO MANY TARGETS"));
        }
        self.compile_as(&expr, DataType::Int2)?;
        self.flush_marks(Some(DataType::Int2));
        let ret = if gosub {
            let ret = self.new_label();
            self.emit("LD", &format!("DE,{}", ret));
            self.emit("PUSH", "DE");
            Some(ret)
        } else {
            None
        };
        let skip = self.new_label();
        let short = self.opts.prefer_relative_jumps && targets.len() < 30;
        self.emit("LD", "A,H");
        self.emit("OR", "A");
        self.emit(if short { "JR" } else { "JP" }, &format!("NZ,{}", skip));
        self.emit("LD", "A,L");
        for (target, col) in targets {
            let label = target.label();
            self.link.reference(target, self.at.clone(), &col);
            self.emit("DEC", "A");
            self.emit("JP", &format!("Z,{}", label));
        }
        self.emit_label(&skip);
        if let Some(ret) = ret {
            self.emit("POP", "DE");
            self.emit_label(&ret);
        }
        Ok(())
    }

    fn parse_type(&mut self, p: &mut Parser) -> Result<Option<DataType>> {
        if !p.word(Word::As) {
            return Ok(None);
        }
        match p.next() {
            Some(Token::Word(w)) => match DataType::for_word(*w) {
                Some(ty) => Ok(Some(ty)),
                None => Err(error!(SyntaxError, ..&p.column(); "EXPECTED TYPE")),
            },
            _ => Err(error!(SyntaxError, ..&p.column(); "EXPECTED TYPE")),
        }
    }

    /// DIM outside, LOCAL and DIM inside a SUB or FUNCTION.
    fn dim_statement(&mut self, p: &mut Parser, local_only: bool) -> Result<()> {
        loop {
            let (col, ident) = p.ident()?;
            let mut dims = vec![];
            if !local_only && p.peek() == Some(&Token::LParen) {
                for e in p.expression_list()? {
                    match self.const_value(&e)?.map(|c| c.convert(DataType::Int2)) {
                        Some(Ok(Const::Int2(n))) if n >= 0 => dims.push(n as u16),
                        _ => {
                            return Err(error!(SubscriptOutOfRange, ..&e.column(); "DIMENSION"))
                        }
                    }
                }
                if dims.is_empty() || dims.len() > 2 {
                    return Err(error!(SyntaxError, ..&col; "ONE OR TWO DIMENSIONS"));
                }
            }
            let declared = self.parse_type(p)?;
            let ty = DataType::resolve(&ident, declared).map_err(|e| e.in_column(&col))?;
            self.declare_name(&ident, &col, ty, dims)?;
            if !p.token(&Token::Comma) {
                break;
            }
        }
        p.expect_end_of_statement()
    }

    fn declare_name(&mut self, ident: &Ident, col: &Column, ty: DataType, dims: Vec<u16>) -> Result<()> {
        let name = ident.name();
        if Function::is_reserved(name) {
            return Err(error!(ReservedWord, ..col; name));
        }
        if self.callables.contains(name) {
            return Err(error!(DuplicateDefinition, ..col; name));
        }
        let size: usize = dims.iter().map(|d| *d as usize + 1).product::<usize>() * ty.size();
        if size > 0xC000 {
            return Err(error!(OutOfMemory, ..col; name));
        }
        if let Some(current) = self.current.clone() {
            if !dims.is_empty() {
                return Err(error!(Unsupported, ..col; "LOCAL ARRAY"));
            }
            return match self.callables.get_mut(&current) {
                Some(c) => c.add_local(name, ty).map_err(|e| e.in_column(col)),
                None => Err(error!(InternalError, ..col)),
            };
        }
        self.vars
            .declare(ident, ty, dims, false)
            .map(|_| ())
            .map_err(|e| e.in_column(col))
    }

    fn signature(
        &mut self,
        p: &mut Parser,
        is_function: bool,
    ) -> Result<(Column, Ident, Kind, Vec<Param>)> {
        let (col, ident) = p.ident()?;
        if Function::is_reserved(ident.name()) {
            return Err(error!(ReservedWord, ..&col; ident.name()));
        }
        if !is_function && !ident.is_plain() {
            return Err(error!(SyntaxError, ..&col; "SUB WITH TYPE SUFFIX"));
        }
        let mut params: Vec<Param> = vec![];
        if p.token(&Token::LParen) && !p.token(&Token::RParen) {
            loop {
                let (pcol, pident) = p.ident()?;
                let declared = self.parse_type(p)?;
                let ty = DataType::resolve(&pident, declared).map_err(|e| e.in_column(&pcol))?;
                let name = pident.name();
                if name == ident.name() || params.iter().any(|q| q.name == name) {
                    return Err(error!(DuplicateDefinition, ..&pcol; name));
                }
                params.push(Param {
                    name: name.to_string(),
                    ty,
                });
                if p.token(&Token::RParen) {
                    break;
                }
                p.expect(Token::Comma)?;
            }
        }
        let kind = if is_function {
            let declared = self.parse_type(p)?;
            Kind::Function(DataType::resolve(&ident, declared).map_err(|e| e.in_column(&col))?)
        } else {
            Kind::Sub
        };
        Ok((col, ident, kind, params))
    }

    /// Enters a DECLARE or a definition into the callable table.
    fn register_callable(
        &mut self,
        col: &Column,
        ident: &Ident,
        kind: Kind,
        params: Vec<Param>,
        implementing: bool,
    ) -> Result<()> {
        let name = ident.name();
        if self.vars.contains(name) {
            return Err(error!(DuplicateDefinition, ..col; name));
        }
        let c = match self.callables.get_mut(name) {
            Some(c) => c,
            None => {
                let mut c = Callable::new(name, kind, params);
                c.declared = !implementing;
                c.implemented = implementing;
                return self.callables.insert(c).map_err(|e| e.in_column(col));
            }
        };
        if !c.same_signature(kind, &params) {
            return Err(error!(SignatureMismatch, ..col; name));
        }
        if implementing {
            if c.implemented {
                return Err(error!(DuplicateDefinition, ..col; name));
            }
            c.implemented = true;
            c.args = params;
        } else {
            c.declared = true;
        }
        c.inferred = false;
        Ok(())
    }

    fn declare_statement(&mut self, p: &mut Parser) -> Result<()> {
        let is_function = if p.word(Word::Function) {
            true
        } else {
            p.expect_word(Word::Sub)?;
            false
        };
        let (col, ident, kind, params) = self.signature(p, is_function)?;
        p.expect_end_of_statement()?;
        self.register_callable(&col, &ident, kind, params, false)
    }

    fn callable_begin(&mut self, p: &mut Parser, col: &Column, is_function: bool) -> Result<()> {
        if self.current.is_some() || !self.structs.is_empty() {
            return Err(error!(NestedCallable, ..col));
        }
        let (ncol, ident, kind, params) = self.signature(p, is_function)?;
        p.expect_end_of_statement()?;
        self.register_callable(&ncol, &ident, kind, params, true)?;
        let name = ident.name().to_string();
        let label = match self.callables.get(&name) {
            Some(c) => c.label(),
            None => return Err(error!(InternalError, ..&ncol)),
        };
        std::mem::swap(&mut self.code, &mut self.subs);
        self.emit_label(&label);
        let start = self.code.len();
        let exit = self.new_label();
        self.push(Structure::Callable(CallableBody {
            name: name.clone(),
            exit,
            start,
        }))?;
        self.current = Some(name);
        Ok(())
    }

    fn callable_end(&mut self, p: &mut Parser, col: &Column, is_function: bool) -> Result<()> {
        let err = if is_function {
            error!(EndFunctionWithoutFunction, ..col)
        } else {
            error!(EndSubWithoutSub, ..col)
        };
        let body = match self.structs.last() {
            Some(Entry {
                structure: Structure::Callable(b),
                ..
            }) => b.clone(),
            _ => return Err(err),
        };
        let callable = match self.callables.get(&body.name) {
            Some(c) => c.clone(),
            None => return Err(error!(InternalError, ..col)),
        };
        if matches!(callable.kind, Kind::Function(_)) != is_function {
            return Err(err);
        }
        p.expect_end_of_statement()?;
        self.structs.pop()?;
        self.emit_label(&body.exit);
        self.epilogue(&callable);
        let prologue = self.prologue(&callable);
        self.code.insert(body.start, prologue);
        std::mem::swap(&mut self.code, &mut self.subs);
        self.current = None;
        Ok(())
    }

    /// Offsets of frame strings the callable owns, result included.
    fn owned_strings(callable: &Callable) -> Vec<i32> {
        let mut v: Vec<i32> = callable
            .slots()
            .into_iter()
            .filter(|s| s.offset < 0 && s.ty == DataType::Str)
            .map(|s| s.offset)
            .collect();
        if let (Some(DataType::Str), Some(d)) = (callable.result_type(), callable.result_offset()) {
            v.insert(0, d);
        }
        v
    }

    /// Frame setup placed before the body once all locals are known.
    fn prologue(&mut self, callable: &Callable) -> Vec<Instr> {
        let mut buf = CodeBuf::new();
        if !callable.has_frame() {
            return vec![];
        }
        buf.append_instr("PUSH", "IY");
        buf.append_instr("LD", "IY,0000H");
        buf.append_instr("ADD", "IY,SP");
        if self.opts.check_stack {
            buf.append_instr("CALL", "CKSTK");
            self.use_item(LibItem::CKSTK);
        }
        let n = callable.local_size() as i64;
        if n > 0 {
            buf.append_hex4("LD", "HL,", -n);
            buf.append_instr("ADD", "HL,SP");
            buf.append_instr("LD", "SP,HL");
            let clear = self.new_label();
            buf.append_hex2("LD", "B,", n);
            buf.append_instr("XOR", "A");
            buf.append(Instr::new("LD", "(HL),A").with_label(&clear));
            buf.append_instr("INC", "HL");
            buf.append_instr("DJNZ", &clear);
            let strings = Compiler::owned_strings(callable);
            if !strings.is_empty() {
                buf.append_instr("LD", "HL,D_EMPT");
                self.use_item(LibItem::D_EMPT);
                for d in strings {
                    buf.append_instr("LD", &format!("{},L", super::expr::iy(d)));
                    buf.append_instr("LD", &format!("{},H", super::expr::iy(d + 1)));
                }
            }
        }
        buf.iter().cloned().collect()
    }

    fn epilogue(&mut self, callable: &Callable) {
        if let (Some(ty), Some(d)) = (callable.result_type(), callable.result_offset()) {
            self.load_place(&Place::Local(d), ty);
            match ty {
                DataType::Int2 | DataType::Str => self.emit("LD", "(M_FRET),HL"),
                DataType::Int4 => {
                    self.emit("LD", "(M_FRET),HL");
                    self.emit("LD", "(M_FRET+2),DE");
                }
                DataType::Dec6 => {}
            }
            if ty != DataType::Dec6 {
                self.use_item(LibItem::M_FRET);
            }
        }
        let result = callable.result_offset();
        for d in Compiler::owned_strings(callable) {
            if Some(d) == result {
                continue;
            }
            self.emit("LD", &format!("E,{}", super::expr::iy(d)));
            self.emit("LD", &format!("D,{}", super::expr::iy(d + 1)));
            self.call(LibItem::MFREE);
        }
        if callable.has_frame() {
            self.emit("LD", "SP,IY");
            self.emit("POP", "IY");
        }
        self.emit("RET", "");
    }

    fn call_statement(&mut self, p: &mut Parser) -> Result<()> {
        let (col, ident) = p.ident()?;
        let args = if p.peek() == Some(&Token::LParen) {
            p.expression_list()?
        } else {
            vec![]
        };
        p.expect_end_of_statement()?;
        self.call_sub(&ident, &col, &args, true)
    }

    /// `NAME a, b` or `NAME(a, b)` without CALL.
    fn bare_call(&mut self, p: &mut Parser) -> Result<()> {
        let (col, ident) = p.ident()?;
        let args = if p.is_end_of_statement() {
            vec![]
        } else if p.peek() == Some(&Token::LParen) {
            let save = p.position();
            match p.expression_list() {
                Ok(list) if p.is_end_of_statement() => list,
                _ => {
                    p.set_position(save);
                    comma_list(p)?
                }
            }
        } else {
            comma_list(p)?
        };
        p.expect_end_of_statement()?;
        self.call_sub(&ident, &col, &args, false)
    }

    fn call_sub(&mut self, ident: &Ident, col: &Column, args: &[Expression], infer: bool) -> Result<()> {
        let name = ident.name();
        if !self.callables.contains(name) {
            if !infer || Function::is_reserved(name) || self.vars.contains(name) {
                return Err(error!(UndefinedFunction, ..col; name));
            }
            let mut params = vec![];
            for (i, arg) in args.iter().enumerate() {
                params.push(Param {
                    name: format!("#{}", i + 1),
                    ty: self.type_of(arg)?,
                });
            }
            let mut c = Callable::new(name, Kind::Sub, params);
            c.inferred = true;
            self.callables.insert(c).map_err(|e| e.in_column(col))?;
        }
        self.compile_call(ident, args, col, false)?;
        Ok(())
    }

    fn data_statement(&mut self, p: &mut Parser) -> Result<()> {
        if let Some(n) = self.at.line() {
            if self.data_line != Some(n) {
                self.data.append_label(&data_label(n));
                self.link.data_line(n);
                self.data_line = Some(n);
            }
        }
        loop {
            let negative = p.token(&Token::Operator(Operator::Minus));
            let token = p.next();
            let col = p.column();
            let value = match token {
                Some(Token::Literal(Literal::Integer(s))) => s.parse::<i64>().ok(),
                Some(Token::Literal(Literal::Hex(s))) => i64::from_str_radix(s, 16).ok(),
                Some(Token::Literal(Literal::String(s))) if !negative => {
                    if s.len() as i64 > super::runtime::MAX_STR_LEN {
                        return Err(error!(StringTooLong, ..&col));
                    }
                    self.data.append_hex2("DB", "", DATA_STRING as i64);
                    self.data.append_string_literal(s);
                    None
                }
                Some(Token::Literal(Literal::Decimal(_))) => {
                    return Err(error!(TypeMismatch, ..&col; "DECIMAL DATA"))
                }
                _ => return Err(error!(SyntaxError, ..&col; "EXPECTED CONSTANT")),
            };
            if let Some(v) = value {
                let v = if negative { -v } else { v };
                if (0..=255).contains(&v) {
                    self.data
                        .append_instr("DB", &format!("{},{}", hex2(DATA_INT1 as i64), hex2(v)));
                } else if (-32768..=65535).contains(&v) {
                    self.data.append_instr(
                        "DB",
                        &format!("{},{},{}", hex2(DATA_INT2 as i64), hex2(v & 0xFF), hex2((v >> 8) & 0xFF)),
                    );
                } else {
                    return Err(error!(Overflow, ..&col));
                }
            } else if !matches!(token, Some(Token::Literal(Literal::String(_)))) {
                return Err(error!(Overflow, ..&col));
            }
            if !p.token(&Token::Comma) {
                break;
            }
        }
        p.expect_end_of_statement()
    }

    fn read_statement(&mut self, p: &mut Parser) -> Result<()> {
        loop {
            let (col, ident, indices) = parse_target(p)?;
            let ty = self.type_of(&target_expr(&col, &ident, &indices))?;
            self.use_item(LibItem::DINIT);
            match ty {
                DataType::Int2 => {
                    self.var_address(&ident, &col, indices.as_deref())?;
                    self.call(LibItem::DREADI);
                }
                DataType::Str => {
                    self.var_address(&ident, &col, indices.as_deref())?;
                    self.call(LibItem::DREADS);
                }
                _ => {
                    let (place, ty) =
                        self.resolve_var(&ident, &col, indices.as_deref(), Access::Write)?;
                    if place == Place::Dynamic {
                        self.emit("PUSH", "HL");
                    }
                    self.emit("LD", "HL,M_FRET");
                    self.call(LibItem::DREADI);
                    self.emit("LD", "HL,(M_FRET)");
                    self.convert(DataType::Int2, ty, &col)?;
                    self.store_place(&place, ty, Value::Borrowed);
                }
            }
            if !p.token(&Token::Comma) {
                break;
            }
        }
        p.expect_end_of_statement()
    }

    fn restore_statement(&mut self, p: &mut Parser) -> Result<()> {
        self.use_item(LibItem::DINIT);
        if p.is_end_of_statement() {
            self.call(LibItem::DINIT);
            return Ok(());
        }
        let (target, col) = self.line_ref(p)?;
        p.expect_end_of_statement()?;
        let n = match target {
            LineRef::Number(n) => n,
            LineRef::Name(_) => return Err(error!(SyntaxError, ..&col; "EXPECTED LINE NUMBER")),
        };
        self.link.restore(n, self.at.clone(), &col);
        self.emit("LD", &format!("HL,{}", data_label(n)));
        self.emit("LD", "(M_READ),HL");
        self.use_item(LibItem::M_READ);
        Ok(())
    }

    /// Two Int2 arguments: the first ends up in DE, the second in HL.
    fn two_ints(&mut self, p: &mut Parser) -> Result<()> {
        let first = p.expression()?;
        p.expect(Token::Comma)?;
        let second = p.expression()?;
        p.expect_end_of_statement()?;
        self.compile_as(&first, DataType::Int2)?;
        self.emit("PUSH", "HL");
        self.compile_as(&second, DataType::Int2)?;
        self.emit("POP", "DE");
        Ok(())
    }

    fn poke_statement(&mut self, p: &mut Parser) -> Result<()> {
        self.two_ints(p)?;
        self.emit("LD", "A,L");
        self.emit("LD", "(DE),A");
        Ok(())
    }

    fn doke_statement(&mut self, p: &mut Parser) -> Result<()> {
        let addr = p.expression()?;
        p.expect(Token::Comma)?;
        let value = p.expression()?;
        p.expect_end_of_statement()?;
        let fixed = match self.const_value(&addr)? {
            Some(c) => c.convert(DataType::Int2).ok(),
            None => None,
        };
        if let Some(Const::Int2(a)) = fixed {
            self.compile_as(&value, DataType::Int2)?;
            self.emit("LD", &format!("({}),HL", hex4(a as i64)));
            return Ok(());
        }
        self.compile_as(&addr, DataType::Int2)?;
        self.emit("PUSH", "HL");
        self.compile_as(&value, DataType::Int2)?;
        self.emit("POP", "DE");
        self.emit("EX", "DE,HL");
        self.emit("LD", "(HL),E");
        self.emit("INC", "HL");
        self.emit("LD", "(HL),D");
        Ok(())
    }

    fn out_statement(&mut self, p: &mut Parser) -> Result<()> {
        self.two_ints(p)?;
        self.emit("LD", "A,L");
        self.emit("LD", "B,D");
        self.emit("LD", "C,E");
        self.emit("OUT", "(C),A");
        Ok(())
    }

    fn pause_statement(&mut self, p: &mut Parser) -> Result<()> {
        if p.is_end_of_statement() {
            self.call(LibItem::XINCH);
            return Ok(());
        }
        self.int_argument_call(p, LibItem::PAUSE)
    }

    fn int_argument_call(&mut self, p: &mut Parser, item: LibItem) -> Result<()> {
        let expr = p.expression()?;
        p.expect_end_of_statement()?;
        self.compile_as(&expr, DataType::Int2)?;
        self.call(item);
        Ok(())
    }

    fn locate_statement(&mut self, p: &mut Parser, col: &Column) -> Result<()> {
        self.require(self.target.locate(), col, "LOCATE")?;
        self.two_ints(p)?;
        self.call(LibItem::XLOCATE);
        Ok(())
    }

    fn color_statement(&mut self, p: &mut Parser, col: &Column) -> Result<()> {
        self.require(self.target.color(), col, "COLOR")?;
        let fg = p.expression()?;
        let bg = if p.token(&Token::Comma) {
            Some(p.expression()?)
        } else {
            None
        };
        p.expect_end_of_statement()?;
        match bg {
            Some(bg) => {
                self.compile_as(&bg, DataType::Int2)?;
                self.emit("PUSH", "HL");
                self.compile_as(&fg, DataType::Int2)?;
                self.emit("POP", "DE");
            }
            None => {
                self.compile_as(&fg, DataType::Int2)?;
                self.emit("LD", "DE,0000H");
            }
        }
        self.call(LibItem::XCOLOR);
        Ok(())
    }
}
