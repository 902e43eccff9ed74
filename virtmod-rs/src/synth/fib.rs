//! `virtual:fib`: exports an iterative Fibonacci function.

/// Source of the `virtual:fib` module.
///
/// JavaScript numbers represent every Fibonacci value up to `fib(78)` exactly.
pub fn fib_module() -> String {
    r#"export default function fib(n) {
  if (!Number.isInteger(n) || n < 0) {
    throw new RangeError(`fib expects a non-negative integer, got ${n}`);
  }
  let a = 0;
  let b = 1;
  for (let i = 0; i < n; i++) {
    const next = a + b;
    a = b;
    b = next;
  }
  return a;
}
"#
    .to_string()
}

/// Same recurrence as the generated module, for build-time use and tests.
///
/// Returns `None` once the value no longer fits in a `u64` (n > 93).
pub fn fib(n: u32) -> Option<u64> {
    let (mut a, mut b) = (0u64, Some(1u64));
    for _ in 0..n {
        let next = b.and_then(|b| a.checked_add(b));
        a = b?;
        b = next;
    }
    Some(a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fib_base_cases() {
        assert_eq!(fib(0), Some(0));
        assert_eq!(fib(1), Some(1));
        assert_eq!(fib(10), Some(55));
    }

    #[test]
    fn test_fib_matches_recurrence_up_to_40() {
        let mut expected = vec![0u64, 1];
        for i in 2..=40 {
            expected.push(expected[i - 1] + expected[i - 2]);
        }
        for (n, value) in expected.iter().enumerate() {
            assert_eq!(fib(n as u32), Some(*value), "fib({})", n);
        }
        assert_eq!(fib(40), Some(102_334_155));
    }

    #[test]
    fn test_fib_overflow_boundary() {
        assert_eq!(fib(93), Some(12_200_160_415_121_876_738));
        assert_eq!(fib(94), None);
    }

    #[test]
    fn test_fib_module_is_iterative() {
        let src = fib_module();
        assert!(src.starts_with("export default function fib(n)"));
        assert!(src.contains("for (let i = 0; i < n; i++)"));
        // No self-call inside the body
        assert_eq!(src.matches("fib(").count(), 1);
    }
}
