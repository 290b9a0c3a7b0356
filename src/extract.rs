//! Strict regular-expression extraction.
//!
//! Used for the compiler version banner and the generated release header.
//! A non-match is always an error: it means the toolchain or build system
//! produced output this builder does not understand.

use regex_lite::Regex;

use crate::error::{BuildError, Result};

/// Leading clause of a clang version banner, e.g. `clang version 14.0.6`.
pub const CLANG_VERSION_PATTERN: &str = r"(.*?clang version \d+(\.\d+)*).*";

/// Quoted release string in `include/generated/utsrelease.h`.
pub const UTS_RELEASE_PATTERN: &str = r#"UTS_RELEASE\s+"([^"]*)""#;

/// Compile one of the builder's fixed patterns.
pub fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| BuildError::PatternMatch {
        pattern: pattern.to_string(),
        text: format!("<pattern does not compile: {}>", e),
    })
}

/// Return capture group 1 of the first match of `pattern` in `text`.
pub fn extract_first_group(pattern: &Regex, text: &str) -> Result<String> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| BuildError::PatternMatch {
            pattern: pattern.as_str().to_string(),
            text: text.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clang_banner() {
        let re = compile(CLANG_VERSION_PATTERN).unwrap();
        let version = extract_first_group(&re, "clang version 14.0.6 (abc)").unwrap();
        assert_eq!(version, "clang version 14.0.6");
    }

    #[test]
    fn test_clang_banner_with_vendor_prefix() {
        let re = compile(CLANG_VERSION_PATTERN).unwrap();
        let banner = "Android (8508608, based on r450784e) clang version 14.0.7 (https://android.googlesource.com/toolchain/llvm-project 4c603efb0cca074e9238af8b4106c30add4418f6)\n\
                      Target: aarch64-unknown-linux-gnu\n\
                      Thread model: posix\n";
        let version = extract_first_group(&re, banner).unwrap();
        assert_eq!(
            version,
            "Android (8508608, based on r450784e) clang version 14.0.7"
        );
    }

    #[test]
    fn test_no_clang_banner() {
        let re = compile(CLANG_VERSION_PATTERN).unwrap();
        let err = extract_first_group(&re, "gcc version 12.2.0 (GCC)").unwrap_err();
        match err {
            BuildError::PatternMatch { pattern, text } => {
                assert_eq!(pattern, CLANG_VERSION_PATTERN);
                assert_eq!(text, "gcc version 12.2.0 (GCC)");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_uts_release_header() {
        let re = compile(UTS_RELEASE_PATTERN).unwrap();
        let header = "#define UTS_RELEASE \"4.14.113-Grass-v2.1\"\n";
        assert_eq!(
            extract_first_group(&re, header).unwrap(),
            "4.14.113-Grass-v2.1"
        );
    }

    #[test]
    fn test_uts_release_missing() {
        let re = compile(UTS_RELEASE_PATTERN).unwrap();
        let err = extract_first_group(&re, "#define LINUX_VERSION_CODE 265842\n").unwrap_err();
        assert!(matches!(err, BuildError::PatternMatch { .. }));
    }
}
