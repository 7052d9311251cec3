//! Renders WebAssembly text modules for fingerprinted algorithms.
//!
//! Every module exports a single `main` taking one (ignored) `i32` and
//! returning one `i32`. The operand is baked in as a constant; only integer
//! arithmetic and structured control flow are used.

use sha2::Digest;
use sha2::Sha256;

use crate::catalog::UNRECOGNIZED_SENTINEL;
use crate::fingerprint::AlgorithmFingerprint;
use crate::fingerprint::fingerprint;

/// A rendered module. Identical fingerprints render identical modules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedModule {
    /// Content-derived identifier (truncated SHA-256 of `text`).
    pub id: String,
    pub text: String,
    pub size: usize,
}

impl GeneratedModule {
    fn from_text(text: String) -> Self {
        let digest = Sha256::digest(text.as_bytes());
        let id = digest
            .iter()
            .take(8)
            .map(|byte| format!("{byte:02x}"))
            .collect::<String>();
        let size = text.len();
        Self { id, text, size }
    }
}

pub fn generate(fingerprint: AlgorithmFingerprint) -> GeneratedModule {
    let text = match fingerprint {
        AlgorithmFingerprint::PrimalityCheck { n } => render_primality(n),
        AlgorithmFingerprint::CollatzSteps { n } => render_collatz(n),
        AlgorithmFingerprint::DigitalRoot { n } => render_digital_root(n),
        AlgorithmFingerprint::Fibonacci { n } => render_fibonacci(n),
        AlgorithmFingerprint::Factorial { n } => render_factorial(n),
        AlgorithmFingerprint::Gcd { a, b } => render_gcd(a, b),
        AlgorithmFingerprint::Unrecognized => render_fallback(),
    };
    GeneratedModule::from_text(text)
}

/// Fingerprint `source` as given and render the matching module.
pub fn generate_from_source(source: &str) -> GeneratedModule {
    generate(fingerprint(source))
}

fn render_primality(value: i32) -> String {
    format!(
        r#"(module
  ;; Prime checker for {value} - REAL ALGORITHM
  (func (export "main") (param $dummy i32) (result i32)
    (local $n i32)
    (local $i i32)

    ;; Set n = {value}
    (local.set $n (i32.const {value}))

    ;; Check if less than 2
    (if (i32.lt_s (local.get $n) (i32.const 2))
      (then (return (i32.const 0)))
    )

    ;; Check if equals 2
    (if (i32.eq (local.get $n) (i32.const 2))
      (then (return (i32.const 1)))
    )

    ;; Check if even
    (if (i32.eq (i32.rem_s (local.get $n) (i32.const 2)) (i32.const 0))
      (then (return (i32.const 0)))
    )

    ;; Loop from 3 to sqrt(n)
    (local.set $i (i32.const 3))
    (block $exit
      (loop $continue
        ;; If i > n / i (i.e. i*i > n without overflow), exit loop
        (br_if $exit (i32.gt_s (local.get $i) (i32.div_s (local.get $n) (local.get $i))))

        ;; If n % i == 0, not prime
        (if (i32.eq (i32.rem_s (local.get $n) (local.get $i)) (i32.const 0))
          (then (return (i32.const 0)))
        )

        ;; i += 2
        (local.set $i (i32.add (local.get $i) (i32.const 2)))
        (br $continue)
      )
    )

    ;; Is prime
    (i32.const 1)
  )
)"#
    )
}

fn render_collatz(value: i32) -> String {
    format!(
        r#"(module
  ;; Collatz sequence steps for {value} - REAL ALGORITHM
  (func (export "main") (param $dummy i32) (result i32)
    (local $n i32)
    (local $steps i32)

    ;; Initialize
    (local.set $n (i32.const {value}))
    (local.set $steps (i32.const 0))

    ;; Loop until n = 1
    (block $exit
      (loop $continue
        ;; Exit if n = 1
        (br_if $exit (i32.eq (local.get $n) (i32.const 1)))

        ;; Exit if steps > 1000 (safety)
        (br_if $exit (i32.gt_s (local.get $steps) (i32.const 1000)))

        ;; If even: n = n / 2
        ;; If odd: n = 3n + 1
        (if (i32.eq (i32.rem_s (local.get $n) (i32.const 2)) (i32.const 0))
          (then
            ;; Even: n = n / 2
            (local.set $n (i32.div_s (local.get $n) (i32.const 2)))
          )
          (else
            ;; Odd: n = 3n + 1
            (local.set $n
              (i32.add
                (i32.mul (local.get $n) (i32.const 3))
                (i32.const 1)
              )
            )
          )
        )

        ;; Increment steps
        (local.set $steps (i32.add (local.get $steps) (i32.const 1)))

        (br $continue)
      )
    )

    (local.get $steps)
  )
)"#
    )
}

fn render_digital_root(value: i32) -> String {
    format!(
        r#"(module
  ;; Digital root calculator for {value} - REAL ALGORITHM
  (func (export "main") (param $dummy i32) (result i32)
    (local $n i32)
    (local $sum i32)
    (local $digit i32)

    ;; Initialize
    (local.set $n (i32.const {value}))

    ;; Loop until single digit
    (block $outer_exit
      (loop $outer_continue
        ;; Exit if n < 10 (single digit)
        (br_if $outer_exit (i32.lt_s (local.get $n) (i32.const 10)))

        ;; Calculate digit sum
        (local.set $sum (i32.const 0))
        (block $inner_exit
          (loop $inner_continue
            ;; Exit if n = 0
            (br_if $inner_exit (i32.eq (local.get $n) (i32.const 0)))

            ;; Get last digit
            (local.set $digit (i32.rem_s (local.get $n) (i32.const 10)))
            ;; Add to sum
            (local.set $sum (i32.add (local.get $sum) (local.get $digit)))
            ;; Remove last digit
            (local.set $n (i32.div_s (local.get $n) (i32.const 10)))

            (br $inner_continue)
          )
        )

        ;; Set n to sum for next iteration
        (local.set $n (local.get $sum))

        (br $outer_continue)
      )
    )

    (local.get $n)
  )
)"#
    )
}

fn render_fibonacci(value: i32) -> String {
    format!(
        r#"(module
  ;; Fibonacci calculator for n={value} - ITERATIVE
  (func (export "main") (param $dummy i32) (result i32)
    (local $n i32)
    (local $a i32)
    (local $b i32)
    (local $temp i32)
    (local $i i32)

    (local.set $n (i32.const {value}))

    ;; Base cases
    (if (i32.le_s (local.get $n) (i32.const 1))
      (then (return (local.get $n)))
    )

    ;; Initialize
    (local.set $a (i32.const 0))
    (local.set $b (i32.const 1))
    (local.set $i (i32.const 2))

    ;; Loop
    (block $exit
      (loop $continue
        ;; temp = a + b
        (local.set $temp (i32.add (local.get $a) (local.get $b)))
        ;; a = b
        (local.set $a (local.get $b))
        ;; b = temp
        (local.set $b (local.get $temp))
        ;; i++
        (local.set $i (i32.add (local.get $i) (i32.const 1)))
        ;; Continue if i <= n
        (br_if $continue (i32.le_s (local.get $i) (local.get $n)))
      )
    )

    (local.get $b)
  )
)"#
    )
}

fn render_factorial(value: i32) -> String {
    format!(
        r#"(module
  ;; Factorial calculator for n={value}
  (func (export "main") (param $dummy i32) (result i32)
    (local $n i32)
    (local $result i32)
    (local $i i32)

    (local.set $n (i32.const {value}))
    (local.set $result (i32.const 1))
    (local.set $i (i32.const 1))

    ;; Handle 0! = 1
    (if (i32.eq (local.get $n) (i32.const 0))
      (then (return (i32.const 1)))
    )

    ;; Loop from 1 to n
    (block $exit
      (loop $continue
        ;; result *= i
        (local.set $result (i32.mul (local.get $result) (local.get $i)))
        ;; i++
        (local.set $i (i32.add (local.get $i) (i32.const 1)))
        ;; Continue if i <= n
        (br_if $continue (i32.le_s (local.get $i) (local.get $n)))
      )
    )

    (local.get $result)
  )
)"#
    )
}

fn render_gcd(a: i32, b: i32) -> String {
    format!(
        r#"(module
  ;; GCD calculator for {a} and {b} - Euclidean algorithm
  (func (export "main") (param $dummy i32) (result i32)
    (local $a i32)
    (local $b i32)
    (local $temp i32)

    (local.set $a (i32.const {a}))
    (local.set $b (i32.const {b}))

    ;; Euclidean algorithm
    (block $exit
      (loop $continue
        ;; Exit if b = 0
        (br_if $exit (i32.eq (local.get $b) (i32.const 0)))

        ;; temp = a % b
        (local.set $temp (i32.rem_s (local.get $a) (local.get $b)))
        ;; a = b
        (local.set $a (local.get $b))
        ;; b = temp
        (local.set $b (local.get $temp))

        (br $continue)
      )
    )

    (local.get $a)
  )
)"#
    )
}

fn render_fallback() -> String {
    format!(
        r#"(module
  ;; Default computation
  (func (export "main") (param $dummy i32) (result i32)
    i32.const {UNRECOGNIZED_SENTINEL}
  )
)"#
    )
}
