//! 버전 정렬 -- 패키지 스토어 고유의 버전 비교
//!
//! 버전 문자열을 숫자 묶음과 비숫자 묶음(토큰)으로 나눈 뒤 앞에서부터
//! 한 쌍씩 비교합니다. `.` 과 `-` 는 구분자로만 쓰이고 토큰이 되지 않습니다.
//!
//! # 토큰 순서
//!
//! `"pre"` < 기타 문자열 토큰 (사전순) < 빈 토큰 < 숫자 토큰 (정수값)
//!
//! 따라서 `1.0pre1 < 1.0`, `1.0-rc1 < 1.0`, `2.3a < 2.3.1`, `2.3.4 < 2.3.10` 입니다.

use std::cmp::Ordering;

/// 두 버전 문자열을 비교합니다.
///
/// 처음으로 다른 토큰 쌍이 전체 결과를 결정합니다. 한쪽 토큰이 먼저
/// 끝나면 그쪽은 빈 토큰으로 취급합니다.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    let mut left = Components::new(a);
    let mut right = Components::new(b);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (l, r) => {
                let ord = compare_component(l.unwrap_or(""), r.unwrap_or(""));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

/// 버전 문자열의 토큰을 지연 생성하는 반복자
#[derive(Debug, Clone)]
pub struct Components<'a> {
    rest: &'a str,
}

impl<'a> Components<'a> {
    /// 새 토큰 반복자를 생성합니다.
    pub fn new(version: &'a str) -> Self {
        Self { rest: version }
    }
}

impl<'a> Iterator for Components<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        self.rest = self.rest.trim_start_matches(is_separator);
        let first = self.rest.chars().next()?;

        let end = if first.is_ascii_digit() {
            self.rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(self.rest.len())
        } else {
            self.rest
                .find(|c: char| c.is_ascii_digit() || is_separator(c))
                .unwrap_or(self.rest.len())
        };

        let (token, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(token)
    }
}

fn is_separator(c: char) -> bool {
    c == '.' || c == '-'
}

/// 토큰 분류 (선언 순서가 곧 정렬 순서)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Rank {
    Pre,
    Word,
    Empty,
    Number,
}

fn rank(token: &str) -> Rank {
    if token.is_empty() {
        Rank::Empty
    } else if token == "pre" {
        Rank::Pre
    } else if token.bytes().all(|b| b.is_ascii_digit()) {
        Rank::Number
    } else {
        Rank::Word
    }
}

fn compare_component(a: &str, b: &str) -> Ordering {
    let (ra, rb) = (rank(a), rank(b));
    if ra != rb {
        return ra.cmp(&rb);
    }
    match ra {
        Rank::Number => compare_numeric(a, b),
        Rank::Word => a.cmp(b),
        Rank::Pre | Rank::Empty => Ordering::Equal,
    }
}

/// 길이 제한 없이 10진 숫자 문자열을 값으로 비교합니다.
fn compare_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(v: &str) -> Vec<&str> {
        Components::new(v).collect()
    }

    #[test]
    fn tokenizes_digit_and_word_runs() {
        assert_eq!(tokens("2.12.1"), vec!["2", "12", "1"]);
        assert_eq!(tokens("1.0pre1"), vec!["1", "0", "pre", "1"]);
        assert_eq!(tokens("1.0-rc1"), vec!["1", "0", "rc", "1"]);
        assert_eq!(tokens("--1..2"), vec!["1", "2"]);
        assert!(tokens("").is_empty());
        assert!(tokens(".-.").is_empty());
    }

    #[test]
    fn equal_strings_are_equal() {
        for v in ["", "1", "1.0", "2.3.4", "1.0pre1", "unstable-2023-01-01"] {
            assert_eq!(compare_versions(v, v), Ordering::Equal, "{v}");
        }
    }

    #[test]
    fn pre_release_sorts_below_release() {
        assert_eq!(compare_versions("1.0", "1.0pre1"), Ordering::Greater);
        assert_eq!(compare_versions("1.0pre1", "1.0"), Ordering::Less);
    }

    #[test]
    fn numeric_components_compare_by_value() {
        assert_eq!(compare_versions("2.3.4", "2.3.10"), Ordering::Less);
        assert_eq!(compare_versions("10", "9"), Ordering::Greater);
        assert_eq!(compare_versions("1.01", "1.1"), Ordering::Equal);
    }

    #[test]
    fn release_candidate_sorts_below_release() {
        assert_eq!(compare_versions("1.0-rc1", "1.0"), Ordering::Less);
        assert_eq!(compare_versions("1.0", "1.0-rc1"), Ordering::Greater);
    }

    #[test]
    fn word_suffix_sorts_below_numeric_component() {
        assert_eq!(compare_versions("2.3a", "2.3.1"), Ordering::Less);
    }

    #[test]
    fn words_compare_lexicographically() {
        assert_eq!(compare_versions("1.0alpha", "1.0beta"), Ordering::Less);
        assert_eq!(compare_versions("1.0pre", "1.0alpha"), Ordering::Less);
    }

    #[test]
    fn longer_numeric_tail_is_newer() {
        assert_eq!(compare_versions("1.0", "1.0.1"), Ordering::Less);
        assert_eq!(compare_versions("1", "1.0"), Ordering::Less);
    }

    #[test]
    fn separators_alone_do_not_matter() {
        assert_eq!(compare_versions("1.2", "1-2"), Ordering::Equal);
    }

    #[test]
    fn huge_numbers_do_not_overflow() {
        let big = "99999999999999999999999999999";
        assert_eq!(compare_versions(big, "1"), Ordering::Greater);
        assert_eq!(compare_versions("1.0", &format!("1.{big}")), Ordering::Less);
    }

    #[test]
    fn antisymmetric_and_transitive_over_sample() {
        let sample = [
            "", "0", "1", "1.0pre1", "1.0-rc1", "1.0", "1.0.1", "1.0a", "2.3a", "2.3.1", "2.3.4",
            "2.3.10", "2.12", "10", "pre", "alpha", "unstable-2023-01-01",
        ];
        for a in sample {
            for b in sample {
                assert_eq!(
                    compare_versions(a, b),
                    compare_versions(b, a).reverse(),
                    "antisymmetry: {a} vs {b}"
                );
                for c in sample {
                    if compare_versions(a, b) != Ordering::Greater
                        && compare_versions(b, c) != Ordering::Greater
                    {
                        assert_ne!(
                            compare_versions(a, c),
                            Ordering::Greater,
                            "transitivity: {a} <= {b} <= {c}"
                        );
                    }
                }
            }
        }
    }
}
