use super::buffer::CodeBuf;
use super::runtime::{self, Env};
use std::collections::{BTreeMap, BTreeSet};

macro_rules! lib_items {
    ($($item:ident),* $(,)?) => {
        /// Every routine and storage cell of the runtime library, in the
        /// order they are emitted.
        #[allow(non_camel_case_types)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum LibItem {
            $($item),*
        }

        impl LibItem {
            pub const ALL: &'static [LibItem] = &[$(LibItem::$item),*];

            /// The label the item defines.
            pub fn name(self) -> &'static str {
                match self {
                    $(LibItem::$item => stringify!($item)),*
                }
            }
        }
    };
}

lib_items!(
    XEXIT, XBREAK, XPAUSE, XOUTST, XOUTS, OUTSP, XOUTNL, XOUTCH, XINKEY, XINCH, XCKBRK,
    XCLS, XLOCATE, XCOLOR, XBORDER, XCURS,
    E_EXIT, E_STOP, E_NOV, E_DIV0, E_IDX, E_PARM, E_TYPE, E_DATA,
    PAUSE, CKSTK, INIV, INDV, INSV, INLNB, INLNR, P_I, P_D6, P_TAB, DINIT, DREADI, DREADS,
    CKIDX, O_AND, O_OR, O_XOR, O_NOT, O_LT, O_LE, O_GT, O_GE, O_EQ, O_NE, CPHLDE,
    O_INC, O_DEC, O_ADD, O_MUL, O_DIV, O_SHL, O_SHR, ABSHL, F_SGN, F_RND, F_SQR,
    I2_MAX, I2_MIN,
    I4_ADD, I4_SUB, I4_LT, I4_LE, I4_GT, I4_GE, I4_EQ, I4_NE, I4_CMP, I4_MAX, I4_MIN,
    I4_MUL, I4_DIV, I4_SIGNS, I4_NEG_DEHL, I4_ABS_DEHL, I4_AND, I4_OR, I4_XOR, I4_NOT,
    I4_LD_MEM, I4_ST_BC, F_I2_SGN_I4, CHECK_DEHL_FOR_I2,
    D6_ADD, D6_EQSC, D6_DECSC, D6_CLRUN, D6_CMP, D6_LT, D6_LE, D6_GT, D6_GE, D6_EQ,
    D6_NE, D6_MAX, D6_MIN, D6_MUL, D6_DIV, D6_MDUTIL, D6_ROUND, D6_STRUNC, D6_CLR,
    D6_NEG, D6_APPDG, D6_SCALE, D6_ISZ, D6_LDACC, D6_LDOP1, D6_STACC, D6_LDACN,
    D6_LDOPN, D6_ACCOP, D6_OPACC, D6_PUSHA, D6_POPA, D6_POPO,
    F_D6_ABS, F_D6_CDEC_I2, F_D6_CDEC_I4, F_I2_CINT_D6, F_I4_CLNG_D6, F_D6_FRAC,
    F_I2_SGN_D6, F_D6_TRUNC, F_D6_ROUND, F_D6_ROUNDM, F_D6_VAL_S, S_STR_D6,
    S_CAT, S_INKY, S_CHRL, S_LEFT, S_RIGHT, S_MIDN, S_STC, S_STR, F_LEN, F_VLI,
    S_UPR, S_LWR, S_LTRIM, S_RTRIM, S_TRIM, S_MIRR, S_HEX, S_HXA, S_BIN, S_STS, F_INSTR,
    O_STEQ, O_STNE, O_STLT, O_STLE, O_STGT, O_STGE, STCMP, STNCP,
    ASGSM, ASGSV, SMACP, SVDUP, SMARK, MRGC, MFREE, MFIND, MALLOC, MINIT,
    D_EMPT,
    M_SRLN, M_READ, M_FRET, M_INKB, M_STMP, M_CVTBUF, M_STCK, M_I4A, M_I4S,
    M_ACCU, M_OP1, M_REG1, M_REG2, M_MODE, M_SIGN, M_DTRUNC, M_GCLK, M_RND, HEAPB,
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Code,
    Data,
    Bss,
}

impl LibItem {
    pub fn section(self) -> Section {
        match self {
            LibItem::D_EMPT => Section::Data,
            LibItem::HEAPB => Section::Bss,
            _ if self.name().starts_with("M_") => Section::Bss,
            _ => Section::Code,
        }
    }

    pub fn from_name(name: &str) -> Option<LibItem> {
        LibItem::ALL.iter().copied().find(|i| i.name() == name)
    }
}

/// ## Runtime library usage
///
/// Items carry a reference count. The compiler marks what it calls,
/// `close` adds everything those fragments reach, and the emitters
/// write exactly the used set in declaration order.

#[derive(Debug, Default, Clone)]
pub struct Library {
    counts: BTreeMap<LibItem, u32>,
}

/// Operand words of one instruction that may name a label.
fn referenced_words(op: &str, args: &str) -> Vec<String> {
    if op == "DB" || op == "DS" {
        return vec![];
    }
    args.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|w| w.starts_with(|c: char| c.is_ascii_alphabetic()))
        .map(|w| w.to_string())
        .collect()
}

impl Library {
    pub fn new() -> Library {
        Library::default()
    }

    pub fn mark(&mut self, item: LibItem) {
        *self.counts.entry(item).or_insert(0) += 1;
    }

    /// Retracts one mark. The item is dropped once its count reaches zero.
    pub fn unmark(&mut self, item: LibItem) {
        if let Some(n) = self.counts.get_mut(&item) {
            *n -= 1;
            if *n == 0 {
                self.counts.remove(&item);
            }
        }
    }

    pub fn is_used(&self, item: LibItem) -> bool {
        self.counts.contains_key(&item)
    }

    pub fn count(&self, item: LibItem) -> u32 {
        self.counts.get(&item).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Used items in emission order.
    pub fn items(&self) -> Vec<LibItem> {
        self.counts.keys().copied().collect()
    }

    /// Maps every label some fragment defines to the item defining it.
    /// Where two fragments define one label the earlier item wins; a
    /// target may fold `XCKBRK` into its `XINKEY` routine that way.
    pub fn label_map(env: &Env) -> BTreeMap<String, LibItem> {
        let mut map = BTreeMap::new();
        for item in LibItem::ALL {
            let mut buf = CodeBuf::new();
            runtime::append(*item, &mut buf, env);
            for instr in buf.iter() {
                if let Some(label) = &instr.label {
                    map.entry(label.clone()).or_insert(*item);
                }
            }
        }
        map
    }

    /// Adds every item reachable from the marked ones and from the labels
    /// `body` refers to. Returns the number of items added.
    pub fn close(&mut self, env: &Env, body: &CodeBuf) -> usize {
        let before = self.counts.len();
        let map = Library::label_map(env);
        for instr in body.iter() {
            for word in referenced_words(&instr.op, &instr.args) {
                if let Some(item) = map.get(&word) {
                    if !self.is_used(*item) {
                        self.mark(*item);
                    }
                }
            }
        }
        let mut work = self.items();
        let mut seen = BTreeSet::new();
        while let Some(item) = work.pop() {
            if !seen.insert(item) {
                continue;
            }
            let mut reached = vec![];
            if let Some(owner) = map.get(item.name()) {
                reached.push(*owner);
            }
            let mut buf = CodeBuf::new();
            runtime::append(item, &mut buf, env);
            for instr in buf.iter() {
                for word in referenced_words(&instr.op, &instr.args) {
                    if let Some(owner) = map.get(&word) {
                        reached.push(*owner);
                    }
                }
            }
            for owner in reached {
                if !self.is_used(owner) {
                    log::trace!("{} pulls in {}", item.name(), owner.name());
                    self.mark(owner);
                }
                if !seen.contains(&owner) {
                    work.push(owner);
                }
            }
        }
        let added = self.counts.len() - before;
        log::debug!("library closure: {} items, {} added", self.counts.len(), added);
        added
    }

    fn append_section(&self, section: Section, env: &Env, buf: &mut CodeBuf) {
        for item in self.counts.keys() {
            if item.section() == section && *item != LibItem::HEAPB {
                runtime::append(*item, buf, env);
            }
        }
    }

    pub fn append_code(&self, env: &Env, buf: &mut CodeBuf) {
        self.append_section(Section::Code, env, buf)
    }

    pub fn append_data(&self, env: &Env, buf: &mut CodeBuf) {
        self.append_section(Section::Data, env, buf)
    }

    /// Storage cells. The heap itself is placed by the program framing
    /// behind the variables.
    pub fn append_bss(&self, env: &Env, buf: &mut CodeBuf) {
        self.append_section(Section::Bss, env, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mach::options::Options;
    use crate::mach::target;
    use proptest::prelude::*;
    use std::collections::HashMap;

    fn close_and_emit(lib: &mut Library, target_name: &str, body: &CodeBuf) -> CodeBuf {
        let t = target::lookup(target_name).unwrap();
        let opts = Options::new();
        let env = Env::new(t.as_ref(), &opts);
        lib.close(&env, body);
        let mut out = CodeBuf::new();
        lib.append_code(&env, &mut out);
        lib.append_data(&env, &mut out);
        lib.append_bss(&env, &mut out);
        if lib.is_used(LibItem::HEAPB) {
            runtime::append(LibItem::HEAPB, &mut out, &env);
        }
        out
    }

    fn definitions(buf: &CodeBuf) -> HashMap<String, usize> {
        let mut defs = HashMap::new();
        for instr in buf.iter() {
            if let Some(label) = &instr.label {
                *defs.entry(label.clone()).or_insert(0) += 1;
            }
        }
        defs
    }

    #[test]
    fn test_every_item_has_a_fragment() {
        let t = target::lookup("z9001").unwrap();
        let opts = Options::new();
        let env = Env::new(t.as_ref(), &opts);
        for item in LibItem::ALL {
            let mut buf = CodeBuf::new();
            assert!(runtime::append(*item, &mut buf, &env), "{}", item.name());
        }
    }

    #[test]
    fn test_unmark_drops_at_zero() {
        let mut lib = Library::new();
        lib.mark(LibItem::O_LT);
        lib.mark(LibItem::O_LT);
        lib.unmark(LibItem::O_LT);
        assert_eq!(lib.count(LibItem::O_LT), 1);
        lib.unmark(LibItem::O_LT);
        assert!(!lib.is_used(LibItem::O_LT));
        lib.unmark(LibItem::O_LT);
        assert!(lib.is_empty());
    }

    #[test]
    fn test_closure_follows_calls() {
        let mut lib = Library::new();
        lib.mark(LibItem::O_DIV);
        let out = close_and_emit(&mut lib, "z1013", &CodeBuf::new());
        assert!(lib.is_used(LibItem::ABSHL));
        assert!(lib.is_used(LibItem::E_DIV0));
        assert!(lib.is_used(LibItem::E_EXIT));
        assert!(lib.is_used(LibItem::XOUTST));
        assert!(lib.is_used(LibItem::XEXIT));
        assert!(!lib.is_used(LibItem::O_MUL));
        assert_eq!(out.get(0).and_then(|i| i.label.as_deref()), Some("XEXIT"));
    }

    #[test]
    fn test_body_references_are_roots() {
        let mut body = CodeBuf::new();
        body.append_instr("CALL", "P_I");
        body.append_instr("LD", "HL,D_EMPT");
        let mut lib = Library::new();
        let out = close_and_emit(&mut lib, "kc85", &body);
        assert!(lib.is_used(LibItem::S_STR));
        assert!(lib.is_used(LibItem::D_EMPT));
        assert_eq!(definitions(&out).get("D_EMPT"), Some(&1));
    }

    #[test]
    fn test_break_check_folds_into_inkey() {
        let mut lib = Library::new();
        lib.mark(LibItem::XCKBRK);
        let out = close_and_emit(&mut lib, "z1013", &CodeBuf::new());
        assert!(lib.is_used(LibItem::XINKEY));
        assert_eq!(definitions(&out).get("XCKBRK"), Some(&1));
    }

    #[test]
    fn test_heap_is_left_to_framing() {
        let mut lib = Library::new();
        lib.mark(LibItem::MFREE);
        let t = target::lookup("z1013").unwrap();
        let opts = Options::new();
        let env = Env::new(t.as_ref(), &opts);
        lib.close(&env, &CodeBuf::new());
        assert!(lib.is_used(LibItem::HEAPB));
        let mut bss = CodeBuf::new();
        lib.append_bss(&env, &mut bss);
        assert!(!definitions(&bss).contains_key("HEAPB"));
        assert_eq!(LibItem::HEAPB.section(), Section::Bss);
        assert_eq!(LibItem::D_EMPT.section(), Section::Data);
        assert_eq!(LibItem::M_ACCU.section(), Section::Bss);
        assert_eq!(LibItem::from_name("MALLOC"), Some(LibItem::MALLOC));
    }

    proptest! {
        #[test]
        fn test_closure_is_sound(
            picks in proptest::collection::vec(0..LibItem::ALL.len(), 0..12),
            target_index in 0..3usize,
        ) {
            let target_name = ["z1013", "z9001", "kc85"][target_index];
            let mut lib = Library::new();
            for i in &picks {
                lib.mark(LibItem::ALL[*i]);
            }
            let out = close_and_emit(&mut lib, target_name, &CodeBuf::new());
            let t = target::lookup(target_name).unwrap();
            let opts = Options::new();
            let map = Library::label_map(&Env::new(t.as_ref(), &opts));
            let defs = definitions(&out);
            for instr in out.iter() {
                for word in referenced_words(&instr.op, &instr.args) {
                    if map.contains_key(&word) {
                        prop_assert_eq!(defs.get(&word), Some(&1), "{}", word);
                    }
                }
            }
            for i in &picks {
                prop_assert!(lib.is_used(LibItem::ALL[*i]));
            }
            for (label, n) in defs {
                prop_assert_eq!(n, 1, "{}", label);
            }
        }
    }
}
