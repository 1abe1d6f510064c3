use std::collections::HashSet;

use anyhow::{Result, bail};

use super::cnf::{Cnf, Lit};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    pub cnf: Cnf,
    pub ind: Vec<u32>,
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
    line: u32,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            bytes: text.as_bytes(),
            pos: 0,
            line: 1,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) {
        if let Some(&b) = self.bytes.get(self.pos) {
            if b == b'\n' {
                self.line += 1;
            }
            self.pos += 1;
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b) if b.is_ascii_whitespace()) {
            self.bump();
        }
    }

    fn skip_line(&mut self) {
        while let Some(b) = self.peek() {
            self.bump();
            if b == b'\n' {
                return;
            }
        }
    }

    // consumes kw only when it is followed by whitespace or end of input
    fn eat_keyword(&mut self, kw: &str) -> bool {
        let end = self.pos + kw.len();
        if self.bytes.get(self.pos..end) != Some(kw.as_bytes()) {
            return false;
        }
        if matches!(self.bytes.get(end), Some(b) if !b.is_ascii_whitespace()) {
            return false;
        }
        self.pos = end;
        true
    }

    fn parse_int(&mut self) -> Result<i64> {
        self.skip_whitespace();
        let mut neg = false;
        match self.peek() {
            Some(b'-') => {
                neg = true;
                self.bump();
            }
            Some(b'+') => {
                self.bump();
            }
            _ => {}
        }
        match self.peek() {
            Some(b) if b.is_ascii_digit() => {}
            Some(b) => bail!(
                "unexpected character '{}' at line {}, expected a digit",
                b as char,
                self.line
            ),
            None => bail!("unexpected end of input at line {}, expected a digit", self.line),
        }
        let mut val = 0i64;
        while let Some(b) = self.peek() {
            if !b.is_ascii_digit() {
                break;
            }
            val = val * 10 + i64::from(b - b'0');
            if val > i64::from(i32::MAX) {
                bail!("integer too large at line {}", self.line);
            }
            self.bump();
        }
        Ok(if neg { -val } else { val })
    }
}

pub fn parse_dimacs(input: &str) -> Result<Instance> {
    let mut cur = Cursor::new(input);
    let mut clauses: Vec<Vec<Lit>> = Vec::new();
    let mut ind: Vec<u32> = Vec::new();
    let mut declared: HashSet<u32> = HashSet::new();
    let mut seen: Vec<u32> = Vec::new();
    let mut seen_set: HashSet<u32> = HashSet::new();
    let mut max_var = 0u32;

    loop {
        cur.skip_whitespace();
        let Some(b) = cur.peek() else { break };
        if b == b'p' {
            cur.skip_line();
        } else if b == b'c' {
            cur.bump();
            if cur.eat_keyword(" ind") {
                loop {
                    let v = cur.parse_int()?;
                    if v == 0 {
                        break;
                    }
                    if v < 0 {
                        bail!(
                            "independent variable must be positive, got {} at line {}",
                            v,
                            cur.line
                        );
                    }
                    let v = v as u32;
                    if declared.insert(v) {
                        ind.push(v);
                    }
                    max_var = max_var.max(v);
                }
            } else {
                cur.skip_line();
            }
        } else {
            let mut clause = Vec::new();
            loop {
                let l = cur.parse_int()?;
                if l == 0 {
                    break;
                }
                let var = l.unsigned_abs() as u32;
                clause.push(Lit::new(var, l > 0));
                max_var = max_var.max(var);
                if seen_set.insert(var) {
                    seen.push(var);
                }
            }
            clauses.push(clause);
        }
    }

    // no explicit declaration: project onto every variable a clause mentions
    let ind = if ind.is_empty() { seen } else { ind };
    let mut cnf = Cnf::new(max_var);
    for clause in clauses {
        cnf.add_clause(clause);
    }
    Ok(Instance { cnf, ind })
}

pub fn to_dimacs(cnf: &Cnf) -> String {
    let mut out = String::new();
    out.push_str(&format!("p cnf {} {}\n", cnf.num_vars, cnf.clauses.len()));
    for clause in &cnf.clauses {
        for &lit in clause {
            out.push_str(&format!("{} ", lit.to_dimacs()));
        }
        out.push_str("0\n");
    }
    out
}

pub fn sample_literal_line(ind: &[u32], bits: &str, count: usize) -> String {
    let mut out = String::new();
    for (&v, b) in ind.iter().zip(bits.bytes()) {
        if b == b'0' {
            out.push('-');
        }
        out.push_str(&format!("{} ", v));
    }
    out.push_str(&format!("0:{}", count));
    out
}
