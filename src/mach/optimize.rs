use super::buffer::{CodeBuf, Instr};
use super::library::{LibItem, Library};

/// ## Peephole optimizer
///
/// Rewrites the main body and the SUB/FUNCTION bodies after the scan.
/// Every rule only looks at a few neighbouring records; the rules run
/// until none of them changes anything.

pub fn optimize(code: &mut CodeBuf, subs: &mut CodeBuf, lib: &mut Library) {
    let mut rounds = 0;
    loop {
        rounds += 1;
        let mut changed = 0;
        for buf in [&mut *code, &mut *subs] {
            changed += compare_jumps(buf, lib);
            changed += jumps_to_next(buf);
            changed += dead_code(buf, lib);
            changed += repeated_loads(buf);
        }
        changed += line_labels(code, subs);
        if changed == 0 {
            break;
        }
    }
    log::debug!("optimizer finished after {} rounds", rounds);
}

/// `CALL O_LT` and a flag test on HL become `CALL CPHLDE` and a carry
/// jump.
fn compare_jumps(buf: &mut CodeBuf, lib: &mut Library) -> usize {
    let mut n = 0;
    let mut pos = 0;
    while pos + 3 < buf.len() {
        let rewritten = match (buf.get(pos), buf.get(pos + 1), buf.get(pos + 2), buf.get(pos + 3)) {
            (Some(call), Some(a), Some(b), Some(jump))
                if call.is_op("CALL")
                    && a.is("LD", "A,H")
                    && b.is("OR", "L")
                    && jump.is_op("JP")
                    && a.label.is_none()
                    && b.label.is_none()
                    && jump.label.is_none() =>
            {
                let item = match call.args.as_str() {
                    "O_LT" => Some(LibItem::O_LT),
                    "O_GE" => Some(LibItem::O_GE),
                    _ => None,
                };
                let flag = jump.args.split(',').next().unwrap_or("");
                let target = jump.target().unwrap_or("").to_string();
                match (item, flag) {
                    (Some(item), "Z") | (Some(item), "NZ") => {
                        // O_LT is true on carry, O_GE on no carry.
                        let true_flag = if item == LibItem::O_LT { "C" } else { "NC" };
                        let false_flag = if item == LibItem::O_LT { "NC" } else { "C" };
                        let cond = if flag == "NZ" { true_flag } else { false_flag };
                        let label = call.label.clone();
                        Some((item, label, cond, target))
                    }
                    _ => None,
                }
            }
            _ => None,
        };
        if let Some((item, label, cond, target)) = rewritten {
            let mut call = Instr::new("CALL", "CPHLDE");
            call.label = label;
            buf.replace(pos, call);
            buf.remove(pos + 1);
            buf.remove(pos + 1);
            buf.replace(pos + 1, Instr::new("JP", &format!("{},{}", cond, target)));
            lib.unmark(item);
            lib.mark(LibItem::CPHLDE);
            log::debug!("compare via CPHLDE instead of {}", item.name());
            n += 1;
        }
        pos += 1;
    }
    n
}

/// `JP x` right before `x:`.
fn jumps_to_next(buf: &mut CodeBuf) -> usize {
    let mut n = 0;
    let mut pos = 0;
    while pos < buf.len() {
        let remove = match buf.get(pos) {
            Some(instr)
                if (instr.is_op("JP") || instr.is_op("JR")) && instr.label.is_none() =>
            {
                match instr.target() {
                    Some(target) => labels_ahead(buf, pos + 1).iter().any(|l| l == target),
                    None => false,
                }
            }
            _ => false,
        };
        if remove {
            log::debug!("jump to next line removed: {}", buf.get(pos).map(|i| i.to_string()).unwrap_or_default());
            buf.remove(pos);
            n += 1;
        } else {
            pos += 1;
        }
    }
    n
}

/// Labels placed before the next instruction, skipping comment lines.
fn labels_ahead(buf: &CodeBuf, mut pos: usize) -> Vec<String> {
    let mut labels = vec![];
    while let Some(instr) = buf.get(pos) {
        if let Some(l) = &instr.label {
            labels.push(l.clone());
        }
        if !instr.op.is_empty() {
            break;
        }
        pos += 1;
    }
    labels
}

/// Drops records after an unconditional jump up to the next label. A
/// dropped library call gives back its mark.
fn dead_code(buf: &mut CodeBuf, lib: &mut Library) -> usize {
    let mut n = 0;
    let mut pos = 0;
    while pos < buf.len() {
        let jump = matches!(buf.get(pos), Some(i) if i.is_unconditional_jump());
        pos += 1;
        if !jump {
            continue;
        }
        while let Some(next) = buf.get(pos) {
            if next.label.is_some() || next.is_comment_only() || next.is_op("DB") {
                break;
            }
            log::debug!("unreachable: {}", next);
            if next.is_op("CALL") {
                if let Some(item) = next.target().and_then(LibItem::from_name) {
                    lib.unmark(item);
                }
            }
            buf.remove(pos);
            n += 1;
        }
    }
    n
}

fn repeated_loads(buf: &mut CodeBuf) -> usize {
    let mut n = 0;
    let mut pos = 1;
    while pos < buf.len() {
        let repeat = match (buf.get(pos - 1), buf.get(pos)) {
            (Some(a), Some(b)) => {
                b.label.is_none() && a.is_op("LD") && a.args.starts_with("HL,") && a.op == b.op && a.args == b.args
            }
            _ => false,
        };
        if repeat {
            buf.remove(pos);
            n += 1;
        } else {
            pos += 1;
        }
    }
    n
}

fn is_line_label(label: &str) -> bool {
    match label.strip_prefix('L') {
        Some(rest) if rest.starts_with('_') => rest.len() > 1,
        Some(rest) => !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}

/// Drops `L<n>` and `L_<name>` labels nothing jumps to.
fn line_labels(code: &mut CodeBuf, subs: &mut CodeBuf) -> usize {
    let unused: Vec<String> = code
        .iter()
        .chain(subs.iter())
        .filter_map(|i| i.label.clone())
        .filter(|l| is_line_label(l))
        .filter(|l| code.count_references(l) + subs.count_references(l) == 0)
        .collect();
    if unused.is_empty() {
        return 0;
    }
    for buf in [code, subs] {
        buf.retain(|i| !(i.is_label_only() && matches!(&i.label, Some(l) if unused.contains(l))));
        for pos in 0..buf.len() {
            if let Some(instr) = buf.get_mut(pos) {
                if matches!(&instr.label, Some(l) if unused.contains(l)) {
                    instr.label = None;
                }
            }
        }
    }
    unused.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buf(text: &str) -> CodeBuf {
        let mut b = CodeBuf::new();
        b.append_text(text);
        b
    }

    fn run(text: &str) -> (String, Library) {
        let mut code = buf(text);
        let mut subs = CodeBuf::new();
        let mut lib = Library::new();
        lib.mark(LibItem::O_LT);
        optimize(&mut code, &mut subs, &mut lib);
        (code.to_string(), lib)
    }

    #[test]
    fn test_compare_rewrite_retracts_item() {
        let (text, lib) = run(
            "\tCALL\tO_LT\n\tLD\tA,H\n\tOR\tL\n\tJP\tZ,M2\n\tCALL\tP_I\nM2:\tRET\n",
        );
        assert!(text.contains("\tCALL\tCPHLDE\n\tJP\tNC,M2\n"));
        assert!(!text.contains("O_LT"));
        assert!(!lib.is_used(LibItem::O_LT));
        assert!(lib.is_used(LibItem::CPHLDE));
    }

    #[test]
    fn test_jump_to_next_and_dead_code() {
        let (text, _) = run("\tJP\tM1\nM1:\tCALL\tP_I\n\tRET\n\tCALL\tXOUTNL\n\tLD\tHL,0001H\nM3:\tRET\n");
        assert_eq!(text, "M1:\tCALL\tP_I\n\tRET\nM3:\tRET\n");
    }

    #[test]
    fn test_unreachable_call_retracts_item() {
        let mut code = buf("\tJP\tM1\n\tCALL\tO_MUL\nM1:\tCALL\tO_DIV\n\tRET\n");
        let mut subs = CodeBuf::new();
        let mut lib = Library::new();
        lib.mark(LibItem::O_MUL);
        lib.mark(LibItem::O_DIV);
        optimize(&mut code, &mut subs, &mut lib);
        assert!(!code.to_string().contains("O_MUL"));
        assert!(!lib.is_used(LibItem::O_MUL));
        assert!(lib.is_used(LibItem::O_DIV));
    }

    #[test]
    fn test_repeated_load_and_line_labels() {
        let (text, _) = run("L10:\n\tLD\tHL,(V_A)\n\tLD\tHL,(V_A)\nL20:\tCALL\tP_I\n\tJP\tL20\n");
        assert_eq!(text, "\tLD\tHL,(V_A)\nL20:\tCALL\tP_I\n\tJP\tL20\n");
    }

    #[test]
    fn test_line_label_names() {
        assert!(is_line_label("L10"));
        assert!(is_line_label("L_START"));
        assert!(!is_line_label("L_"));
        assert!(!is_line_label("LEN"));
        assert!(!is_line_label("M1"));
    }
}
