//! Ordered pattern→replacement correction rules.
//!
//! A rule table is plain data: an ordered `Vec<CorrectionRule>`. Rules run
//! top to bottom, each one scanning the whole current text, so a later rule
//! always sees the output of every earlier rule.

use indexmap::IndexMap;
use regex::{Captures, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::CorrectionConfig;
use crate::document::Document;
use crate::error::{ReconcileError, Result};
use crate::tables;

/// What a rule puts in place of each match.
#[derive(Debug, Clone)]
pub enum Transform {
    /// Replacement template; `$1`, `${name}` expand capture groups, `$$` is a literal `$`.
    Template(String),
    /// Delete every match of the inner pattern inside the outer match.
    Strip(Regex),
}

/// One entry of a correction table.
#[derive(Debug, Clone)]
pub struct CorrectionRule {
    name: String,
    pattern: Regex,
    transform: Transform,
    /// Only rewrite matches that fall inside a match of this pattern.
    context: Option<Regex>,
}

impl CorrectionRule {
    /// Rule from a pre-compiled pattern; the rule is named after its pattern.
    pub fn from_regex(pattern: Regex, replacement: impl Into<String>) -> Self {
        Self {
            name: pattern.as_str().to_string(),
            pattern,
            transform: Transform::Template(replacement.into()),
            context: None,
        }
    }

    /// Rule that deletes `inner` wherever `pattern` matches.
    pub fn stripping(pattern: Regex, inner: Regex) -> Self {
        Self {
            name: pattern.as_str().to_string(),
            pattern,
            transform: Transform::Strip(inner),
            context: None,
        }
    }

    /// Compile a rule from a pattern string.
    pub fn new(pattern: &str, replacement: impl Into<String>) -> Result<Self> {
        Ok(Self::from_regex(Regex::new(pattern)?, replacement))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_context(mut self, context: Regex) -> Self {
        self.context = Some(context);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// Apply this rule to the whole text. Returns the new text and the number
    /// of matches whose replacement actually differed from the matched text.
    pub fn apply(&self, text: &str) -> (String, u64) {
        let mut count = 0u64;
        let result = match &self.context {
            Some(ctx) => ctx
                .replace_all(text, |caps: &Captures| {
                    self.rewrite(&caps[0], &mut count)
                })
                .into_owned(),
            None => self.rewrite(text, &mut count),
        };
        (result, count)
    }

    fn rewrite(&self, text: &str, count: &mut u64) -> String {
        self.pattern
            .replace_all(text, |caps: &Captures| {
                let matched = &caps[0];
                let out = match &self.transform {
                    Transform::Template(template) => {
                        let mut out = String::new();
                        caps.expand(template, &mut out);
                        out
                    }
                    Transform::Strip(inner) => inner.replace_all(matched, "").into_owned(),
                };
                if out != matched {
                    *count += 1;
                }
                out
            })
            .into_owned()
    }
}

/// Serializable description of a rule, for tables supplied as configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSpec {
    /// Label used in reports; defaults to the pattern.
    pub name: Option<String>,
    pub pattern: String,
    pub replacement: String,
    pub case_insensitive: bool,
    /// Anchor the pattern on word boundaries at both ends.
    pub whole_word: bool,
    /// Treat `pattern` and `replacement` as plain text rather than regex/template.
    pub literal: bool,
    /// Optional context pattern the match must fall inside.
    pub context: Option<String>,
}

impl RuleSpec {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
            ..Self::default()
        }
    }

    pub fn compile(&self) -> Result<CorrectionRule> {
        if self.pattern.is_empty() {
            return Err(ReconcileError::Config(
                "correction rule pattern must not be empty".to_string(),
            ));
        }

        let mut source = if self.literal {
            regex::escape(&self.pattern)
        } else {
            self.pattern.clone()
        };
        if self.whole_word {
            source = format!(r"\b(?:{source})\b");
        }
        let pattern = build(&source, self.case_insensitive)?;

        let replacement = if self.literal {
            self.replacement.replace('$', "$$")
        } else {
            self.replacement.clone()
        };

        let mut rule = CorrectionRule::from_regex(pattern, replacement);
        if let Some(name) = &self.name {
            rule = rule.with_name(name.clone());
        }
        if let Some(ctx) = &self.context {
            rule = rule.with_context(build(ctx, self.case_insensitive)?);
        }
        Ok(rule)
    }
}

fn build(source: &str, case_insensitive: bool) -> Result<Regex> {
    Ok(RegexBuilder::new(source)
        .case_insensitive(case_insensitive)
        .multi_line(true)
        .build()?)
}

/// Substitution counts for one application of a table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleStats {
    pub substitutions: u64,
    /// Rules that fired, in table order.
    pub by_rule: IndexMap<String, u64>,
}

impl RuleStats {
    fn record(&mut self, name: &str, count: u64) {
        if count == 0 {
            return;
        }
        self.substitutions += count;
        *self.by_rule.entry(name.to_string()).or_insert(0) += count;
    }

    fn merge(&mut self, other: RuleStats) {
        for (name, count) in other.by_rule {
            self.record(&name, count);
        }
    }
}

/// Apply an ordered rule table to `text`.
///
/// Each rule runs to completion over the entire text before the next starts.
/// An empty match set is not an error.
pub fn apply_rules(text: &str, rules: &[CorrectionRule]) -> (String, RuleStats) {
    let mut result = text.to_string();
    let mut stats = RuleStats::default();

    for rule in rules {
        let (next, count) = rule.apply(&result);
        if count > 0 {
            debug!(rule = rule.name(), substitutions = count, "correction rule fired");
            result = next;
        }
        stats.record(rule.name(), count);
    }

    (result, stats)
}

/// Outcome of correcting one document.
#[derive(Debug, Clone)]
pub struct Correction {
    pub document: Document,
    pub stats: RuleStats,
    /// Whole passes run, including the final pass that changed nothing.
    pub passes: usize,
    /// False when the pass limit was reached while text was still changing.
    pub converged: bool,
}

/// Two-stage correction: domain vocabulary first, generic OCR repairs second.
///
/// Both stages are repeated as a unit until a pass leaves the text unchanged,
/// so applying the engine to its own output is a no-op.
#[derive(Debug, Clone)]
pub struct CorrectionEngine {
    domain: Vec<CorrectionRule>,
    generic: Vec<CorrectionRule>,
    max_passes: usize,
}

impl Default for CorrectionEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl CorrectionEngine {
    pub const DEFAULT_MAX_PASSES: usize = 5;

    pub fn new(domain: Vec<CorrectionRule>, generic: Vec<CorrectionRule>) -> Self {
        Self {
            domain,
            generic,
            max_passes: Self::DEFAULT_MAX_PASSES,
        }
    }

    /// Engine loaded with the built-in domain and generic tables.
    pub fn with_defaults() -> Self {
        Self::new(
            tables::DOMAIN_RULES.clone(),
            tables::GENERIC_RULES.clone(),
        )
    }

    /// Built-in tables (unless disabled) followed by configured extra rules.
    pub fn from_config(config: &CorrectionConfig) -> Result<Self> {
        let (mut domain, mut generic) = if config.use_default_rules {
            (
                tables::DOMAIN_RULES.clone(),
                tables::GENERIC_RULES.clone(),
            )
        } else {
            (Vec::new(), Vec::new())
        };
        for spec in &config.domain_rules {
            domain.push(spec.compile()?);
        }
        for spec in &config.generic_rules {
            generic.push(spec.compile()?);
        }
        Ok(Self::new(domain, generic).with_max_passes(config.max_passes))
    }

    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes.max(1);
        self
    }

    pub fn domain_rules(&self) -> &[CorrectionRule] {
        &self.domain
    }

    pub fn generic_rules(&self) -> &[CorrectionRule] {
        &self.generic
    }

    /// Correct a document, returning a new document with the same provenance.
    pub fn correct(&self, document: &Document) -> Correction {
        let (text, stats, passes, converged) = self.run(document.content());
        if !converged {
            warn!(
                source = document.id(),
                passes, "correction did not converge within the pass limit"
            );
        }
        Correction {
            document: document.derive(text),
            stats,
            passes,
            converged,
        }
    }

    /// Correct raw text; returns the text and total substitutions.
    pub fn correct_text(&self, text: &str) -> (String, u64) {
        let (text, stats, _, _) = self.run(text);
        (text, stats.substitutions)
    }

    fn run(&self, text: &str) -> (String, RuleStats, usize, bool) {
        let mut current = text.to_string();
        let mut stats = RuleStats::default();

        for pass in 1..=self.max_passes {
            let (after_domain, domain_stats) = apply_rules(&current, &self.domain);
            let (after_generic, generic_stats) = apply_rules(&after_domain, &self.generic);
            stats.merge(domain_stats);
            stats.merge(generic_stats);

            if after_generic == current {
                return (current, stats, pass, true);
            }
            current = after_generic;
        }

        (current, stats, self.max_passes, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_later_rules_see_earlier_output() {
        let rules = vec![
            CorrectionRule::new(r"\bNichrn\b", "Nichiren").unwrap(),
            CorrectionRule::new(r"\bNichiren Daysonan\b", "Nichiren Daishonin").unwrap(),
        ];
        let (text, stats) = apply_rules("Nichrn Daysonan said", &rules);
        assert_eq!(text, "Nichiren Daishonin said");
        assert_eq!(stats.substitutions, 2);
        assert_eq!(stats.by_rule.len(), 2);
    }

    #[test]
    fn test_noop_matches_are_not_counted() {
        let rules = vec![CorrectionRule::new(r"\bSutra\b", "Sutra").unwrap()];
        let (text, stats) = apply_rules("Lotus Sutra", &rules);
        assert_eq!(text, "Lotus Sutra");
        assert_eq!(stats.substitutions, 0);
        assert!(stats.by_rule.is_empty());
    }

    #[test]
    fn test_context_restricts_rule() {
        let rule = CorrectionRule::new(r"\bSaka\b", "Soka")
            .unwrap()
            .with_context(Regex::new(r"\bSaka\s+(?:University|Gakkai)\b").unwrap());
        let (text, count) = rule.apply("Saka Gakkai members met Mr. Saka.");
        assert_eq!(text, "Soka Gakkai members met Mr. Saka.");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_template_expands_captures() {
        let rule = CorrectionRule::new(r"[ \t]+([.,;:])", "$1").unwrap();
        let (text, _) = rule.apply("one , two ; three .");
        assert_eq!(text, "one, two; three.");
    }

    #[test]
    fn test_rule_spec_literal_whole_word() {
        let spec = RuleSpec {
            pattern: "lotw".to_string(),
            replacement: "Lotus $".to_string(),
            whole_word: true,
            literal: true,
            ..RuleSpec::default()
        };
        let rule = spec.compile().unwrap();
        let (text, count) = rule.apply("the lotw flower, lotwx");
        assert_eq!(text, "the Lotus $ flower, lotwx");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_rule_spec_case_insensitive() {
        let spec = RuleSpec {
            case_insensitive: true,
            ..RuleSpec::new(r"\bnichrn\b", "Nichiren")
        };
        let rule = spec.compile().unwrap();
        assert_eq!(rule.apply("NICHRN and nichrn").0, "Nichiren and Nichiren");
    }

    #[test]
    fn test_rule_spec_rejects_empty_pattern() {
        assert!(RuleSpec::new("", "x").compile().is_err());
        assert!(RuleSpec::new("(", "x").compile().is_err());
    }

    #[test]
    fn test_engine_runs_domain_before_generic() {
        let domain = vec![CorrectionRule::new(r"\bNam\s+Yoho\b", "Nam-myoho").unwrap()];
        let generic = vec![CorrectionRule::new(r"[ \t]{2,}", " ").unwrap()];
        let engine = CorrectionEngine::new(domain, generic);
        let (text, subs) = engine.correct_text("Nam   Yoho  chant");
        assert_eq!(text, "Nam-myoho chant");
        assert_eq!(subs, 2);
    }

    #[test]
    fn test_engine_repeats_until_stable() {
        // The generic join exposes a new domain match on the second pass.
        let domain = vec![CorrectionRule::new(r"\bNammyoho\b", "Nam-myoho").unwrap()];
        let generic = vec![CorrectionRule::new(r"(\w)-\n(\w)", "$1$2").unwrap()];
        let engine = CorrectionEngine::new(domain, generic);

        let correction = engine.correct(&Document::new("t", 0, "Nam-\nmyoho"));
        assert_eq!(correction.document.content(), "Nam-myoho");
        assert!(correction.converged);
        assert_eq!(correction.passes, 3);
    }

    #[test]
    fn test_engine_reports_non_convergence() {
        let domain = vec![CorrectionRule::new("a", "aa").unwrap()];
        let engine = CorrectionEngine::new(domain, Vec::new()).with_max_passes(2);
        let correction = engine.correct(&Document::new("t", 0, "a"));
        assert!(!correction.converged);
        assert_eq!(correction.passes, 2);
        assert_eq!(correction.document.content(), "aaaa");
    }
}
