//! Runtime flags that make the executed program emit JIT diagnostics.
//!
//! The conditional part is a fixed table evaluated top to bottom, so the
//! flag order for a given [`SandboxConfig`] never changes.

use std::fmt;
use std::path::Path;

use crate::config::{
    DEFAULT_COMPILER_THRESHOLD, DEFAULT_FREQ_INLINE_SIZE, DEFAULT_MAX_INLINE_SIZE, SandboxConfig,
    TriState,
};

/// Flags present on every run, ahead of the log file flag.
const ALWAYS: &[&str] = &[
    "-XX:+UnlockDiagnosticVMOptions",
    "-XX:+TraceClassLoading",
    "-XX:+LogCompilation",
];

/// A conditional table entry: when `applies` holds, `flag` is appended.
struct OptionRule {
    applies: fn(&SandboxConfig) -> bool,
    flag: fn(&SandboxConfig) -> String,
}

const RULES: &[OptionRule] = &[
    OptionRule {
        applies: |c| c.print_assembly,
        flag: |_| "-XX:+PrintAssembly".to_string(),
    },
    OptionRule {
        applies: |c| c.print_assembly && c.intel_syntax,
        flag: |_| "-XX:PrintAssemblyOptions=intel".to_string(),
    },
    OptionRule {
        applies: |c| c.tiered_compilation == TriState::ForceOn,
        flag: |_| "-XX:+TieredCompilation".to_string(),
    },
    OptionRule {
        applies: |c| c.tiered_compilation == TriState::ForceOff,
        flag: |_| "-XX:-TieredCompilation".to_string(),
    },
    OptionRule {
        applies: |c| c.compressed_oops == TriState::ForceOn,
        flag: |_| "-XX:+UseCompressedOops".to_string(),
    },
    OptionRule {
        applies: |c| c.compressed_oops == TriState::ForceOff,
        flag: |_| "-XX:-UseCompressedOops".to_string(),
    },
    OptionRule {
        applies: |c| c.freq_inline_size != DEFAULT_FREQ_INLINE_SIZE,
        flag: |c| format!("-XX:FreqInlineSize={}", c.freq_inline_size),
    },
    OptionRule {
        applies: |c| c.max_inline_size != DEFAULT_MAX_INLINE_SIZE,
        flag: |c| format!("-XX:MaxInlineSize={}", c.max_inline_size),
    },
    OptionRule {
        applies: |c| c.compiler_threshold != DEFAULT_COMPILER_THRESHOLD,
        flag: |c| format!("-XX:CompilerThreshold={}", c.compiler_threshold),
    },
];

/// Ordered runtime flags for one run. Rebuilt every run, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticOptions {
    flags: Vec<String>,
}

impl DiagnosticOptions {
    /// Build the flag list for `config`, logging to `log_file`.
    pub fn build(config: &SandboxConfig, log_file: &Path) -> Self {
        let mut flags: Vec<String> = ALWAYS.iter().map(|f| f.to_string()).collect();
        flags.push(format!("-XX:LogFile={}", log_file.display()));

        flags.extend(
            RULES
                .iter()
                .filter(|rule| (rule.applies)(config))
                .map(|rule| (rule.flag)(config)),
        );

        Self { flags }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.flags
    }

    pub fn into_vec(self) -> Vec<String> {
        self.flags
    }
}

impl fmt::Display for DiagnosticOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.flags.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn build(config: &SandboxConfig) -> Vec<String> {
        DiagnosticOptions::build(config, Path::new("/ws/sandbox/sandbox.log")).into_vec()
    }

    #[test]
    fn test_defaults_yield_base_flags_only() {
        assert_eq!(
            build(&SandboxConfig::default()),
            vec![
                "-XX:+UnlockDiagnosticVMOptions",
                "-XX:+TraceClassLoading",
                "-XX:+LogCompilation",
                "-XX:LogFile=/ws/sandbox/sandbox.log",
            ]
        );
    }

    #[test]
    fn test_intel_syntax_needs_print_assembly() {
        let config = SandboxConfig {
            intel_syntax: true,
            ..Default::default()
        };
        assert_eq!(build(&config).len(), 4);

        let config = SandboxConfig {
            print_assembly: true,
            intel_syntax: true,
            ..Default::default()
        };
        assert_eq!(
            &build(&config)[4..],
            ["-XX:+PrintAssembly", "-XX:PrintAssemblyOptions=intel"]
        );
    }

    #[test]
    fn test_tristate_modes() {
        let config = SandboxConfig {
            tiered_compilation: TriState::ForceOff,
            compressed_oops: TriState::ForceOn,
            ..Default::default()
        };
        assert_eq!(
            &build(&config)[4..],
            ["-XX:-TieredCompilation", "-XX:+UseCompressedOops"]
        );

        let config = SandboxConfig {
            tiered_compilation: TriState::ForceOn,
            compressed_oops: TriState::ForceOff,
            ..Default::default()
        };
        assert_eq!(
            &build(&config)[4..],
            ["-XX:+TieredCompilation", "-XX:-UseCompressedOops"]
        );
    }

    #[test]
    fn test_thresholds_only_when_changed() {
        let config = SandboxConfig {
            freq_inline_size: DEFAULT_FREQ_INLINE_SIZE,
            max_inline_size: 70,
            compiler_threshold: 1500,
            ..Default::default()
        };
        assert_eq!(
            &build(&config)[4..],
            ["-XX:MaxInlineSize=70", "-XX:CompilerThreshold=1500"]
        );

        let config = SandboxConfig {
            freq_inline_size: 100,
            ..Default::default()
        };
        assert_eq!(&build(&config)[4..], ["-XX:FreqInlineSize=100"]);
    }

    #[test]
    fn test_full_order_and_no_duplicates() {
        let config = SandboxConfig {
            print_assembly: true,
            intel_syntax: true,
            tiered_compilation: TriState::ForceOn,
            compressed_oops: TriState::ForceOn,
            freq_inline_size: 1,
            max_inline_size: 2,
            compiler_threshold: 3,
            ..Default::default()
        };
        let flags = build(&config);
        assert_eq!(
            &flags[4..],
            [
                "-XX:+PrintAssembly",
                "-XX:PrintAssemblyOptions=intel",
                "-XX:+TieredCompilation",
                "-XX:+UseCompressedOops",
                "-XX:FreqInlineSize=1",
                "-XX:MaxInlineSize=2",
                "-XX:CompilerThreshold=3",
            ]
        );

        let unique: HashSet<&String> = flags.iter().collect();
        assert_eq!(unique.len(), flags.len());
        assert_eq!(flags, build(&config), "output must be deterministic");
    }

    #[test]
    fn test_display_joins_with_spaces() {
        let options = DiagnosticOptions::build(&SandboxConfig::default(), Path::new("x.log"));
        assert!(options.to_string().ends_with("-XX:+LogCompilation -XX:LogFile=x.log"));
    }
}
