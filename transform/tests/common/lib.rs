//! Minimal interpreter for the WebAssembly text subset the generator emits.
//!
//! Supports folded and flat instruction forms, `i32` locals and arithmetic,
//! `block`/`loop`/`if` with named or numeric labels, `br`, `br_if` and
//! `return`. Anything else is reported as an error rather than guessed at.

use std::collections::HashMap;

use anyhow::Context;
use anyhow::Result;
use anyhow::anyhow;
use anyhow::bail;

/// Instructions executed before a call is considered runaway.
const FUEL: u64 = 10_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Sexpr {
    Atom(String),
    Str(String),
    List(Vec<Sexpr>),
}

impl Sexpr {
    fn atom(&self) -> Option<&str> {
        match self {
            Sexpr::Atom(atom) => Some(atom),
            _ => None,
        }
    }

    fn head(&self) -> Option<&str> {
        match self {
            Sexpr::List(items) => items.first().and_then(Sexpr::atom),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Token {
    Open,
    Close,
    Atom(String),
    Str(String),
}

fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            ';' => {
                chars.next();
                if chars.next() != Some(';') {
                    bail!("stray ';'");
                }
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '(' => {
                chars.next();
                tokens.push(Token::Open);
            }
            ')' => {
                chars.next();
                tokens.push(Token::Close);
            }
            '"' => {
                chars.next();
                let mut text = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some(c) => text.push(c),
                        None => bail!("unterminated string"),
                    }
                }
                tokens.push(Token::Str(text));
            }
            _ => {
                let mut atom = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() || c == '(' || c == ')' {
                        break;
                    }
                    atom.push(c);
                    chars.next();
                }
                tokens.push(Token::Atom(atom));
            }
        }
    }
    Ok(tokens)
}

fn parse(source: &str) -> Result<Sexpr> {
    let tokens = tokenize(source)?;
    let mut pos = 0;
    let expr = parse_expr(&tokens, &mut pos)?;
    if pos != tokens.len() {
        bail!("trailing tokens after module");
    }
    Ok(expr)
}

fn parse_expr(tokens: &[Token], pos: &mut usize) -> Result<Sexpr> {
    let token = tokens.get(*pos).context("unexpected end of input")?;
    *pos += 1;
    match token {
        Token::Atom(atom) => Ok(Sexpr::Atom(atom.clone())),
        Token::Str(text) => Ok(Sexpr::Str(text.clone())),
        Token::Close => bail!("unexpected ')'"),
        Token::Open => {
            let mut items = Vec::new();
            loop {
                match tokens.get(*pos) {
                    Some(Token::Close) => {
                        *pos += 1;
                        return Ok(Sexpr::List(items));
                    }
                    Some(_) => items.push(parse_expr(tokens, pos)?),
                    None => bail!("unclosed '('"),
                }
            }
        }
    }
}

/// Parse `module_text`, call the function exported as `export` with `args`,
/// and return its single `i32` result.
pub fn invoke_export(module_text: &str, export: &str, args: &[i32]) -> Result<i32> {
    let module = parse(module_text)?;
    let Sexpr::List(fields) = &module else {
        bail!("module is not a list");
    };
    if module.head() != Some("module") {
        bail!("expected (module ...)");
    }
    let func = fields
        .iter()
        .find(|field| field.head() == Some("func") && exports(field, export))
        .ok_or_else(|| anyhow!("no function exported as {export:?}"))?;
    let Sexpr::List(items) = func else {
        bail!("func is not a list");
    };
    call(&items[1..], args)
}

fn exports(func: &Sexpr, name: &str) -> bool {
    let Sexpr::List(items) = func else {
        return false;
    };
    items.iter().any(|item| match item {
        Sexpr::List(parts) => {
            parts.first().and_then(Sexpr::atom) == Some("export")
                && parts.get(1) == Some(&Sexpr::Str(name.to_string()))
        }
        _ => false,
    })
}

fn call(items: &[Sexpr], args: &[i32]) -> Result<i32> {
    let mut machine = Machine::default();
    let mut params = 0;
    let mut body_start = 0;
    for (idx, item) in items.iter().enumerate() {
        match item.head() {
            Some("export") | Some("result") | Some("type") => {}
            Some("param") => params += machine.declare(item)?,
            Some("local") => {
                machine.declare(item)?;
            }
            None if item.atom().is_some_and(|atom| atom.starts_with('$')) => {}
            _ => {
                body_start = idx;
                break;
            }
        }
        body_start = idx + 1;
    }
    if params != args.len() {
        bail!("expected {params} arguments, got {}", args.len());
    }
    machine.locals[..params].copy_from_slice(args);

    match machine.run_seq(&items[body_start..])? {
        Flow::Next | Flow::Return | Flow::Branch(_) => machine.pop(),
    }
}

enum Flow {
    Next,
    Branch(usize),
    Return,
}

struct Machine {
    locals: Vec<i32>,
    names: HashMap<String, usize>,
    stack: Vec<i32>,
    labels: Vec<Option<String>>,
    fuel: u64,
}

impl Default for Machine {
    fn default() -> Self {
        Self {
            locals: Vec::new(),
            names: HashMap::new(),
            stack: Vec::new(),
            labels: Vec::new(),
            fuel: FUEL,
        }
    }
}

impl Machine {
    /// Register the slots of a `(param ...)` or `(local ...)` list.
    fn declare(&mut self, decl: &Sexpr) -> Result<usize> {
        let Sexpr::List(parts) = decl else {
            bail!("declaration is not a list");
        };
        let mut count = 0;
        let mut iter = parts[1..].iter();
        while let Some(part) = iter.next() {
            let atom = part.atom().context("malformed declaration")?;
            if atom.starts_with('$') {
                let ty = iter.next().and_then(Sexpr::atom);
                if ty != Some("i32") {
                    bail!("unsupported type for {atom}");
                }
                self.names.insert(atom.to_string(), self.locals.len());
            } else if atom != "i32" {
                bail!("unsupported type {atom}");
            }
            self.locals.push(0);
            count += 1;
        }
        Ok(count)
    }

    fn pop(&mut self) -> Result<i32> {
        self.stack.pop().context("operand stack underflow")
    }

    fn local_index(&self, immediate: Option<&str>) -> Result<usize> {
        let immediate = immediate.context("missing local index")?;
        let index = match self.names.get(immediate) {
            Some(index) => *index,
            None => immediate
                .parse()
                .with_context(|| format!("unknown local {immediate}"))?,
        };
        if index >= self.locals.len() {
            bail!("local index {index} out of range");
        }
        Ok(index)
    }

    fn label_depth(&self, immediate: Option<&str>) -> Result<usize> {
        let immediate = immediate.context("missing branch label")?;
        if immediate.starts_with('$') {
            return self
                .labels
                .iter()
                .rev()
                .position(|label| label.as_deref() == Some(immediate))
                .with_context(|| format!("unknown label {immediate}"));
        }
        immediate
            .parse()
            .with_context(|| format!("bad label {immediate}"))
    }

    fn run_seq(&mut self, items: &[Sexpr]) -> Result<Flow> {
        let mut idx = 0;
        while idx < items.len() {
            let flow = match &items[idx] {
                Sexpr::List(list) => {
                    idx += 1;
                    self.run_folded(list)?
                }
                Sexpr::Atom(op) => {
                    let immediate = if takes_immediate(op) {
                        let immediate = items.get(idx + 1).and_then(Sexpr::atom);
                        idx += 2;
                        immediate
                    } else {
                        idx += 1;
                        None
                    };
                    self.exec(op, immediate)?
                }
                Sexpr::Str(text) => bail!("unexpected string {text:?} in body"),
            };
            if !matches!(flow, Flow::Next) {
                return Ok(flow);
            }
        }
        Ok(Flow::Next)
    }

    fn run_folded(&mut self, list: &[Sexpr]) -> Result<Flow> {
        let op = list
            .first()
            .and_then(Sexpr::atom)
            .context("folded instruction without opcode")?;
        match op {
            "block" | "loop" => {
                let (label, rest) = split_label(&list[1..]);
                let body = skip_result(rest);
                self.run_block(op == "loop", label, body)
            }
            "if" => self.run_if(&list[1..]),
            _ => {
                let mut immediate = None;
                for item in &list[1..] {
                    match item {
                        Sexpr::Atom(atom) if immediate.is_none() => immediate = Some(atom.as_str()),
                        Sexpr::List(child) => {
                            let flow = self.run_folded(child)?;
                            if !matches!(flow, Flow::Next) {
                                return Ok(flow);
                            }
                        }
                        other => bail!("unexpected operand {other:?} for {op}"),
                    }
                }
                self.exec(op, immediate)
            }
        }
    }

    fn run_if(&mut self, rest: &[Sexpr]) -> Result<Flow> {
        let (label, rest) = split_label(rest);
        let rest = skip_result(rest);
        let mut then_branch: &[Sexpr] = &[];
        let mut else_branch: &[Sexpr] = &[];
        for item in rest {
            match (item.head(), item) {
                (Some("then"), Sexpr::List(items)) => then_branch = &items[1..],
                (Some("else"), Sexpr::List(items)) => else_branch = &items[1..],
                (_, Sexpr::List(cond)) => {
                    let flow = self.run_folded(cond)?;
                    if !matches!(flow, Flow::Next) {
                        return Ok(flow);
                    }
                }
                _ => bail!("malformed if"),
            }
        }
        let branch = if self.pop()? != 0 {
            then_branch
        } else {
            else_branch
        };
        self.labels.push(label.map(str::to_string));
        let flow = self.run_seq(branch);
        self.labels.pop();
        Ok(match flow? {
            Flow::Branch(0) => Flow::Next,
            Flow::Branch(depth) => Flow::Branch(depth - 1),
            other => other,
        })
    }

    fn run_block(&mut self, is_loop: bool, label: Option<&str>, body: &[Sexpr]) -> Result<Flow> {
        let height = self.stack.len();
        self.labels.push(label.map(str::to_string));
        let flow = loop {
            match self.run_seq(body) {
                Ok(Flow::Branch(0)) if is_loop => self.stack.truncate(height),
                Ok(Flow::Branch(0)) => {
                    self.stack.truncate(height);
                    break Ok(Flow::Next);
                }
                Ok(Flow::Branch(depth)) => break Ok(Flow::Branch(depth - 1)),
                other => break other,
            }
        };
        self.labels.pop();
        flow
    }

    fn exec(&mut self, op: &str, immediate: Option<&str>) -> Result<Flow> {
        self.fuel = self
            .fuel
            .checked_sub(1)
            .context("fuel exhausted; module does not terminate")?;
        match op {
            "nop" => {}
            "drop" => {
                self.pop()?;
            }
            "i32.const" => {
                let literal = immediate.context("i32.const without value")?;
                let value: i64 = literal
                    .parse()
                    .with_context(|| format!("bad i32 literal {literal}"))?;
                if !(i64::from(i32::MIN)..=i64::from(u32::MAX)).contains(&value) {
                    bail!("i32 literal {literal} out of range");
                }
                self.stack.push(value as i32);
            }
            "local.get" => {
                let index = self.local_index(immediate)?;
                self.stack.push(self.locals[index]);
            }
            "local.set" => {
                let index = self.local_index(immediate)?;
                self.locals[index] = self.pop()?;
            }
            "local.tee" => {
                let index = self.local_index(immediate)?;
                self.locals[index] = *self.stack.last().context("operand stack underflow")?;
            }
            "i32.eqz" => {
                let value = self.pop()?;
                self.stack.push(i32::from(value == 0));
            }
            "br" => return Ok(Flow::Branch(self.label_depth(immediate)?)),
            "br_if" => {
                let depth = self.label_depth(immediate)?;
                if self.pop()? != 0 {
                    return Ok(Flow::Branch(depth));
                }
            }
            "return" => return Ok(Flow::Return),
            _ => {
                let rhs = self.pop()?;
                let lhs = self.pop()?;
                self.stack.push(binary(op, lhs, rhs)?);
            }
        }
        Ok(Flow::Next)
    }
}

fn binary(op: &str, lhs: i32, rhs: i32) -> Result<i32> {
    Ok(match op {
        "i32.add" => lhs.wrapping_add(rhs),
        "i32.sub" => lhs.wrapping_sub(rhs),
        "i32.mul" => lhs.wrapping_mul(rhs),
        "i32.div_s" => lhs
            .checked_div(rhs)
            .context("integer divide by zero or overflow")?,
        "i32.rem_s" => {
            if rhs == 0 {
                bail!("integer remainder by zero");
            }
            lhs.wrapping_rem(rhs)
        }
        "i32.and" => lhs & rhs,
        "i32.or" => lhs | rhs,
        "i32.eq" => i32::from(lhs == rhs),
        "i32.ne" => i32::from(lhs != rhs),
        "i32.lt_s" => i32::from(lhs < rhs),
        "i32.gt_s" => i32::from(lhs > rhs),
        "i32.le_s" => i32::from(lhs <= rhs),
        "i32.ge_s" => i32::from(lhs >= rhs),
        _ => bail!("unsupported instruction {op}"),
    })
}

fn takes_immediate(op: &str) -> bool {
    matches!(
        op,
        "i32.const" | "local.get" | "local.set" | "local.tee" | "br" | "br_if"
    )
}

fn split_label(items: &[Sexpr]) -> (Option<&str>, &[Sexpr]) {
    match items.first().and_then(Sexpr::atom) {
        Some(label) if label.starts_with('$') => (Some(label), &items[1..]),
        _ => (None, items),
    }
}

fn skip_result(items: &[Sexpr]) -> &[Sexpr] {
    match items.first() {
        Some(item) if item.head() == Some("result") => &items[1..],
        _ => items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_constant() {
        let module = r#"(module
  ;; constant
  (func (export "main") (param $dummy i32) (result i32)
    i32.const 42
  )
)"#;
        assert_eq!(invoke_export(module, "main", &[0]).unwrap(), 42);
    }

    #[test]
    fn loop_with_named_labels() {
        let module = r#"(module
  (func (export "sum") (param $n i32) (result i32)
    (local $acc i32)
    (block $done
      (loop $again
        (br_if $done (i32.eq (local.get $n) (i32.const 0)))
        (local.set $acc (i32.add (local.get $acc) (local.get $n)))
        (local.set $n (i32.sub (local.get $n) (i32.const 1)))
        (br $again)
      )
    )
    (local.get $acc)
  )
)"#;
        assert_eq!(invoke_export(module, "sum", &[4]).unwrap(), 10);
    }

    #[test]
    fn early_return_from_if() {
        let module = r#"(module
  (func (export "main") (param i32) (result i32)
    (if (i32.lt_s (local.get 0) (i32.const 2))
      (then (return (i32.const 7)))
      (else (local.set 0 (i32.const 9)))
    )
    (local.get 0)
  )
)"#;
        assert_eq!(invoke_export(module, "main", &[1]).unwrap(), 7);
        assert_eq!(invoke_export(module, "main", &[5]).unwrap(), 9);
    }

    #[test]
    fn runaway_loop_is_an_error() {
        let module = r#"(module
  (func (export "main") (param $x i32) (result i32)
    (loop $forever (br $forever))
    (i32.const 0)
  )
)"#;
        assert!(invoke_export(module, "main", &[0]).is_err());
    }

    #[test]
    fn missing_export_is_an_error() {
        let module = r#"(module (func (export "other") (result i32) (i32.const 1)))"#;
        assert!(invoke_export(module, "main", &[]).is_err());
    }
}
