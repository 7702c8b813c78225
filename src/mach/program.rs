use super::buffer::{hex4, CodeBuf, Instr};
use super::compile::Compiler;
use super::library::LibItem;
use super::runtime::{self, Env};
use super::target;
use super::var::{DataType, Var};

/// ## Program framing
///
/// Lays the compiled pieces out in their final order: header, origin,
/// target prolog, start-up code, body, SUB/FUNCTION bodies, runtime
/// library, DATA pool and literals, and the uninitialized storage up to
/// `M_TOP`.

/// Library items the start-up code refers to on its own.
pub(super) fn startup_items(vars: &Var, trace: bool) -> Vec<LibItem> {
    let mut items = vec![LibItem::XEXIT, LibItem::M_STCK];
    if trace {
        items.push(LibItem::M_SRLN);
    }
    if vars.by_label().iter().any(|d| d.ty == DataType::Str) {
        items.push(LibItem::D_EMPT);
    }
    items
}

pub(super) fn frame(c: &Compiler) -> (String, Option<String>) {
    let env = Env::new(c.target.as_ref(), c.opts);
    let mut out = CodeBuf::new();
    if c.opts.header {
        header(c, &mut out);
    }
    out.append_instr("ORG", &target::begin_addr(c.target.as_ref(), c.opts.begin_addr));
    let warning = c.target.append_prolog(&mut out, &c.opts.app_name);
    startup(c, &mut out);
    out.append_buf(&c.code);
    out.append_instr("CALL", "XEXIT");
    out.append_buf(&c.subs);
    c.lib.append_code(&env, &mut out);

    if !c.data.is_empty() || c.lib.is_used(LibItem::DINIT) {
        out.append_label("DBEG");
        out.append_buf(&c.data);
        out.append_hex2("DB", "", runtime::DATA_END as i64);
    }
    for (label, text) in &c.literals {
        out.append_label(label);
        out.append_string_literal(text);
    }
    c.lib.append_data(&env, &mut out);

    c.lib.append_bss(&env, &mut out);
    c.target.append_bss(&mut out);
    let vars = c.vars.by_label();
    if !vars.is_empty() {
        out.append_label("VARBEG");
        for d in &vars {
            out.append(
                Instr::new("DS", &hex4(d.storage_size() as i64))
                    .with_label(&d.label),
            );
        }
        out.append_label("VAREND");
    }
    if c.lib.is_used(LibItem::HEAPB) {
        runtime::append(LibItem::HEAPB, &mut out, &env);
    }
    if c.opts.stack_size > 0 {
        out.append_hex4("DS", "", c.opts.stack_size as i64);
    }
    out.append_label("M_TOP");
    log::debug!("program framed: {} lines", out.len());
    (out.to_string(), warning)
}

fn header(c: &Compiler, out: &mut CodeBuf) {
    out.append_comment(&format!(" {}", c.opts.app_name));
    out.append_comment(&format!(" target {}", c.target.name()));
    let generator = format!(" generated by {} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    match &c.stamp {
        Some(stamp) => out.append_comment(&format!("{} at {}", generator, stamp)),
        None => out.append_comment(&generator),
    }
}

fn startup(c: &Compiler, out: &mut CodeBuf) {
    out.append_label("MSTART");
    out.append_instr("LD", "(M_STCK),SP");
    if c.opts.stack_size > 0 {
        out.append_instr("LD", "SP,M_TOP");
    }
    c.target.append_init(out);
    if c.lib.is_used(LibItem::MINIT) {
        out.append_instr("CALL", "MINIT");
    }
    if c.lib.is_used(LibItem::DINIT) {
        out.append_instr("CALL", "DINIT");
    }
    if c.opts.trace_line_numbers {
        out.append_instr("LD", "HL,0000H");
        out.append_instr("LD", "(M_SRLN),HL");
    }
    let vars = c.vars.by_label();
    if vars.is_empty() {
        return;
    }
    out.append_instr("LD", "HL,VARBEG");
    out.append_instr("LD", "DE,VARBEG+1");
    out.append_instr("LD", "BC,VAREND-VARBEG-1");
    out.append_instr("LD", "(HL),00H");
    out.append_instr("LDIR", "");
    let strings: Vec<_> = vars.iter().filter(|d| d.ty == DataType::Str).collect();
    if strings.is_empty() {
        return;
    }
    out.append_instr("LD", "DE,D_EMPT");
    for (i, d) in strings.iter().enumerate() {
        if !d.is_array() {
            out.append_instr("LD", &format!("({}),DE", d.label));
            continue;
        }
        let top = format!("MSI{}", i + 1);
        out.append_instr("LD", &format!("HL,{}", d.label));
        out.append_hex4("LD", "BC,", d.element_count() as i64);
        out.append(Instr::new("LD", "(HL),E").with_label(&top));
        out.append_instr("INC", "HL");
        out.append_instr("LD", "(HL),D");
        out.append_instr("INC", "HL");
        out.append_instr("DEC", "BC");
        out.append_instr("LD", "A,B");
        out.append_instr("OR", "C");
        out.append_instr("JR", &format!("NZ,{}", top));
    }
}
