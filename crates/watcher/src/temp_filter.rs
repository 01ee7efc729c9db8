//! Recognizes in-progress download and editor lock files

use std::sync::OnceLock;

use regex::Regex;

fn suffix_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\.(part|partial|crdownload|download|opdownload|tmp|temp|!ut|aria2)$")
            .expect("temp suffix pattern is valid")
    })
}

fn prefix_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(~\$|\.~lock\.|\.com\.google\.Chrome\.)").expect("temp prefix pattern is valid")
    })
}

/// Decides which inbox names are write-in-progress artifacts
#[derive(Debug, Clone, Default)]
pub struct TempFilter {
    extra_suffixes: Vec<String>,
}

impl TempFilter {
    /// Extra suffixes are matched case-insensitively, with or without a
    /// leading dot in configuration
    pub fn new<S: AsRef<str>>(extra_suffixes: &[S]) -> Self {
        let extra_suffixes = extra_suffixes
            .iter()
            .map(|s| s.as_ref().trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|s| !s.is_empty())
            .map(|s| format!(".{s}"))
            .collect();
        Self { extra_suffixes }
    }

    pub fn is_temp(&self, name: &str) -> bool {
        suffix_pattern().is_match(name)
            || prefix_pattern().is_match(name)
            || self.extra_suffix_len(name).is_some()
    }

    /// The final name a temp file stands in for, e.g. `a.pdf.part` → `a.pdf`.
    ///
    /// Prefix patterns such as Chrome's scratch files have no final name.
    pub fn companion_base<'a>(&self, name: &'a str) -> Option<&'a str> {
        let cut = suffix_pattern()
            .find(name)
            .map(|m| m.start())
            .or_else(|| self.extra_suffix_len(name).map(|len| name.len() - len))?;

        let base = &name[..cut];
        (!base.is_empty() && !prefix_pattern().is_match(name)).then_some(base)
    }

    fn extra_suffix_len(&self, name: &str) -> Option<usize> {
        self.extra_suffixes.iter().find_map(|suffix| {
            let start = name.len().checked_sub(suffix.len())?;
            (name.is_char_boundary(start) && name[start..].eq_ignore_ascii_case(suffix))
                .then_some(suffix.len())
        })
    }
}
