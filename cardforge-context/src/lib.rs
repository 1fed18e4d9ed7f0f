//! Cardforge Context - Prompt Assembly and Token Budget Management
//!
//! Assembles the prompts sent to the LLM provider mediation layer
//! (deck-construction prompts, refinement prompts, quality-improvement
//! prompts) within a fixed token budget, truncating the lowest-priority
//! sections first. The card name/quantity list is never truncated — every
//! other section degrades before it does.

use cardforge_core::Timestamp;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// PROMPT PACKAGE
// ============================================================================

/// All inputs for one prompt assembly pass. `card_list` is mandatory and
/// always highest priority; every other field is optional and ordered by
/// priority from highest to lowest: format rules, metrics, suggestions,
/// oracle-text excerpts.
#[derive(Debug, Clone, Default)]
pub struct PromptPackage {
    pub system_instructions: Option<String>,
    pub user_prompt: Option<String>,
    pub card_list: String,
    pub format_rules_summary: Option<String>,
    pub metrics_summary: Option<String>,
    pub suggestions: Vec<String>,
    pub oracle_excerpts: Vec<String>,
}

impl PromptPackage {
    pub fn new(card_list: impl Into<String>) -> Self {
        Self {
            card_list: card_list.into(),
            ..Default::default()
        }
    }

    pub fn with_system(mut self, text: impl Into<String>) -> Self {
        self.system_instructions = Some(text.into());
        self
    }

    pub fn with_user_prompt(mut self, text: impl Into<String>) -> Self {
        self.user_prompt = Some(text.into());
        self
    }

    pub fn with_format_rules_summary(mut self, text: impl Into<String>) -> Self {
        self.format_rules_summary = Some(text.into());
        self
    }

    pub fn with_metrics_summary(mut self, text: impl Into<String>) -> Self {
        self.metrics_summary = Some(text.into());
        self
    }

    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }

    pub fn with_oracle_excerpts(mut self, excerpts: Vec<String>) -> Self {
        self.oracle_excerpts = excerpts;
        self
    }
}

// ============================================================================
// CONTEXT WINDOW AND SECTION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionType {
    System,
    User,
    CardList,
    FormatRules,
    Metrics,
    Suggestions,
    OracleExcerpts,
}

/// Priority order, highest first. The card list is deliberately the only
/// non-compressible section — everything else degrades before it does.
impl SectionType {
    fn default_priority(self) -> i32 {
        match self {
            SectionType::System => 100,
            SectionType::CardList => 95,
            SectionType::User => 90,
            SectionType::FormatRules => 70,
            SectionType::Metrics => 60,
            SectionType::Suggestions => 40,
            SectionType::OracleExcerpts => 10,
        }
    }

    fn compressible(self) -> bool {
        !matches!(self, SectionType::CardList | SectionType::System)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSection {
    pub section_id: Uuid,
    pub section_type: SectionType,
    pub content: String,
    pub token_count: i32,
    pub priority: i32,
    pub compressible: bool,
}

impl ContextSection {
    pub fn new(section_type: SectionType, content: String) -> Self {
        let token_count = estimate_tokens(&content);
        Self {
            section_id: Uuid::now_v7(),
            section_type,
            token_count,
            priority: section_type.default_priority(),
            compressible: section_type.compressible(),
            content,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssemblyAction {
    Include,
    Exclude,
    Truncate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyDecision {
    pub timestamp: Timestamp,
    pub action: AssemblyAction,
    pub section_type: SectionType,
    pub reason: String,
    pub tokens_affected: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextWindow {
    pub window_id: Uuid,
    pub assembled_at: Timestamp,
    pub max_tokens: i32,
    pub used_tokens: i32,
    pub sections: Vec<ContextSection>,
    pub truncated: bool,
    pub assembly_trace: Vec<AssemblyDecision>,
}

impl ContextWindow {
    pub fn new(max_tokens: i32) -> Self {
        Self {
            window_id: Uuid::now_v7(),
            assembled_at: Utc::now(),
            max_tokens,
            used_tokens: 0,
            sections: Vec::new(),
            truncated: false,
            assembly_trace: Vec::new(),
        }
    }

    pub fn remaining_tokens(&self) -> i32 {
        self.max_tokens - self.used_tokens
    }

    pub fn has_room(&self) -> bool {
        self.used_tokens < self.max_tokens
    }

    /// Returns `true` if the section was added in full.
    pub fn add_section(&mut self, section: ContextSection) -> bool {
        if section.token_count <= self.remaining_tokens() {
            self.used_tokens += section.token_count;
            self.assembly_trace.push(AssemblyDecision {
                timestamp: Utc::now(),
                action: AssemblyAction::Include,
                section_type: section.section_type,
                reason: "fits within budget".to_string(),
                tokens_affected: section.token_count,
            });
            self.sections.push(section);
            true
        } else {
            self.assembly_trace.push(AssemblyDecision {
                timestamp: Utc::now(),
                action: AssemblyAction::Exclude,
                section_type: section.section_type,
                reason: format!(
                    "needs {} tokens, only {} available",
                    section.token_count,
                    self.remaining_tokens()
                ),
                tokens_affected: 0,
            });
            false
        }
    }

    pub fn add_truncated_section(&mut self, mut section: ContextSection) {
        let available = self.remaining_tokens();
        if available <= 0 {
            self.assembly_trace.push(AssemblyDecision {
                timestamp: Utc::now(),
                action: AssemblyAction::Exclude,
                section_type: section.section_type,
                reason: "no budget remaining".to_string(),
                tokens_affected: 0,
            });
            return;
        }

        let original_tokens = section.token_count;
        section.content = truncate_to_token_budget(&section.content, available);
        section.token_count = estimate_tokens(&section.content);

        self.used_tokens += section.token_count;
        self.truncated = true;
        self.assembly_trace.push(AssemblyDecision {
            timestamp: Utc::now(),
            action: AssemblyAction::Truncate,
            section_type: section.section_type,
            reason: format!("truncated from {} to {} tokens", original_tokens, section.token_count),
            tokens_affected: section.token_count,
        });
        self.sections.push(section);
    }

    /// The assembled sections in the order they were added, joined for
    /// direct use as an LLM prompt body.
    pub fn as_text(&self) -> String {
        self.sections
            .iter()
            .map(|s| s.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl std::fmt::Display for ContextWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_text())
    }
}

// ============================================================================
// TOKEN UTILITIES
// ============================================================================

/// ~0.75 tokens per character — the same heuristic ratio as
/// [`cardforge_core::estimate_tokens`], duplicated here rather than
/// imported so this crate's budget math stays self-contained and
/// independent of which tokenizer the core crate picks for its own
/// purposes.
pub fn estimate_tokens(text: &str) -> i32 {
    if text.is_empty() {
        return 0;
    }
    (text.len() as f32 * 0.75).ceil() as i32
}

/// Truncate text to fit within a token budget, preferring a sentence
/// boundary, then a word boundary, then a hard UTF-8-safe cut.
pub fn truncate_to_token_budget(text: &str, budget: i32) -> String {
    if budget <= 0 {
        return String::new();
    }

    let max_chars = (budget as f32 / 0.75).floor() as usize;
    if text.len() <= max_chars {
        return text.to_string();
    }

    let truncated = safe_truncate(text, max_chars);

    let last_sentence = [truncated.rfind('.'), truncated.rfind('?'), truncated.rfind('!')]
        .into_iter()
        .flatten()
        .max();

    if let Some(pos) = last_sentence {
        if pos > max_chars / 2 {
            return truncated[..=pos].to_string();
        }
    }

    if let Some(pos) = truncated.rfind(' ') {
        if pos > max_chars * 4 / 5 {
            return truncated[..pos].to_string();
        }
    }

    truncated.to_string()
}

fn safe_truncate(s: &str, max_chars: usize) -> &str {
    if s.len() <= max_chars {
        return s;
    }
    let mut end = max_chars;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

// ============================================================================
// CONTEXT ASSEMBLER
// ============================================================================

/// Builds a [`ContextWindow`] from a [`PromptPackage`], adding sections in
/// priority order until the token budget runs out.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    token_budget: i32,
}

impl ContextAssembler {
    pub fn new(token_budget: i32) -> Self {
        Self { token_budget }
    }

    pub fn token_budget(&self) -> i32 {
        self.token_budget
    }

    pub fn assemble(&self, pkg: PromptPackage) -> ContextWindow {
        let mut window = ContextWindow::new(self.token_budget);
        let mut sections = self.build_sections(&pkg);
        sections.sort_by(|a, b| b.priority.cmp(&a.priority));

        for section in sections {
            if window.remaining_tokens() <= 0 {
                window.assembly_trace.push(AssemblyDecision {
                    timestamp: Utc::now(),
                    action: AssemblyAction::Exclude,
                    section_type: section.section_type,
                    reason: "budget exhausted".to_string(),
                    tokens_affected: 0,
                });
                continue;
            }

            if section.token_count <= window.remaining_tokens() {
                window.add_section(section);
            } else if section.compressible {
                window.add_truncated_section(section);
            } else {
                window.assembly_trace.push(AssemblyDecision {
                    timestamp: Utc::now(),
                    action: AssemblyAction::Exclude,
                    section_type: section.section_type,
                    reason: format!("exceeds budget ({} tokens) and is not compressible", section.token_count),
                    tokens_affected: 0,
                });
            }
        }

        window
    }

    fn build_sections(&self, pkg: &PromptPackage) -> Vec<ContextSection> {
        let mut sections = Vec::new();

        if let Some(system) = &pkg.system_instructions {
            sections.push(ContextSection::new(SectionType::System, system.clone()));
        }
        sections.push(ContextSection::new(SectionType::CardList, pkg.card_list.clone()));
        if let Some(user) = &pkg.user_prompt {
            sections.push(ContextSection::new(SectionType::User, user.clone()));
        }
        if let Some(rules) = &pkg.format_rules_summary {
            sections.push(ContextSection::new(SectionType::FormatRules, rules.clone()));
        }
        if let Some(metrics) = &pkg.metrics_summary {
            sections.push(ContextSection::new(SectionType::Metrics, metrics.clone()));
        }
        if !pkg.suggestions.is_empty() {
            sections.push(ContextSection::new(SectionType::Suggestions, pkg.suggestions.join("\n")));
        }
        if !pkg.oracle_excerpts.is_empty() {
            sections.push(ContextSection::new(SectionType::OracleExcerpts, pkg.oracle_excerpts.join("\n")));
        }

        sections
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_tokens_empty_is_zero() {
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn truncate_respects_budget() {
        let text = "a".repeat(1000);
        let truncated = truncate_to_token_budget(&text, 10);
        assert!(estimate_tokens(&truncated) <= 10);
    }

    #[test]
    fn card_list_survives_when_oracle_excerpts_are_dropped() {
        let pkg = PromptPackage::new("4 Lightning Bolt\n4 Mountain".repeat(50))
            .with_oracle_excerpts(vec!["a".repeat(5000)]);
        let assembler = ContextAssembler::new(200);
        let window = assembler.assemble(pkg.clone());

        assert!(window.sections.iter().any(|s| s.section_type == SectionType::CardList));
        let card_list_section = window
            .sections
            .iter()
            .find(|s| s.section_type == SectionType::CardList)
            .unwrap();
        assert_eq!(card_list_section.content, pkg.card_list);
    }

    #[test]
    fn oracle_excerpts_drop_before_suggestions_under_tight_budget() {
        let pkg = PromptPackage::new("4 Lightning Bolt")
            .with_suggestions(vec!["add more removal".to_string()])
            .with_oracle_excerpts(vec!["a".repeat(2000)]);
        let assembler = ContextAssembler::new(30);
        let window = assembler.assemble(pkg);

        assert!(!window.sections.iter().any(|s| s.section_type == SectionType::OracleExcerpts));
    }

    #[test]
    fn sections_ordered_by_descending_priority_in_assembly_trace() {
        let pkg = PromptPackage::new("4 Lightning Bolt")
            .with_metrics_summary("overall: 0.8")
            .with_suggestions(vec!["add lands".to_string()]);
        let assembler = ContextAssembler::new(10_000);
        let window = assembler.assemble(pkg);

        let priorities: Vec<i32> = window.sections.iter().map(|s| s.priority).collect();
        let mut sorted = priorities.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(priorities, sorted);
    }
}
