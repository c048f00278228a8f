use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use crate::contract::ContactSubmission;

/// Messages carrying more links than this are treated as link flooding.
pub const MAX_LINKS: usize = 3;

/// Named keyword patterns; matching is case-insensitive.
pub const SPAM_PATTERNS: &[(&str, &str)] = &[
    (
        "pharmaceuticals",
        r"\b(viagra|cialis|levitra|xanax|tramadol|oxycodone)\b",
    ),
    (
        "gambling",
        r"\b(online\s+casino|casino\s+bonus|poker\s+online|sports\s*betting|slot\s+machines?)\b",
    ),
    (
        "prize_claim",
        r"\b(you\s+(have\s+)?won|lottery\s+winner|claim\s+your\s+(prize|reward))\b",
    ),
    ("buy_now", r"\bbuy\s+now\b"),
    ("click_here", r"\bclick\s+here\b"),
    (
        "easy_money",
        r"\b(free\s+money|make\s+money\s+fast|easy\s+money|get\s+rich\s+quick)\b",
    ),
    (
        "crypto_pitch",
        r"\b(crypto(currency)?|bitcoin|forex)\s+(investment|trading\s+signals?|opportunit(y|ies)|profits?)\b",
    ),
    (
        "seo_services",
        r"\b(seo\s+(services|package|agency|expert)|(buy|cheap|quality)\s+backlinks|first\s+page\s+(of|on)\s+google)\b",
    ),
    (
        "work_from_home",
        r"\b(work\s+from\s+home|earn\s+(money\s+)?from\s+home)\b",
    ),
    (
        "urgency",
        r"\b(act\s+now|limited\s+time\s+offer|order\s+now)\b",
    ),
    ("percent_free", r"\b100\s*%\s*free\b"),
    ("earn_amount", r"\bearn\s+(up\s+to\s+)?\$\s?\d"),
    (
        "weight_loss",
        r"\b(weight\s+loss\s+(pills?|supplements?)|lose\s+\d+\s*(lbs|pounds|kg)\b)",
    ),
    ("adult", r"\b(adult\s+dating|hot\s+singles)\b"),
];

static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bhttps?://").expect("link pattern should compile"));

static STANDARD_FILTER: LazyLock<SpamFilter> = LazyLock::new(|| {
    SpamFilter::new(SPAM_PATTERNS, MAX_LINKS).expect("built-in spam patterns should compile")
});

#[derive(Debug, Clone)]
struct SpamRule {
    name: &'static str,
    pattern: Regex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpamVerdict {
    pub rule: &'static str,
}

#[derive(Debug, Clone)]
pub struct SpamFilter {
    rules: Vec<SpamRule>,
    max_links: usize,
}

impl SpamFilter {
    pub fn new(patterns: &[(&'static str, &str)], max_links: usize) -> Result<Self, regex::Error> {
        let rules = patterns
            .iter()
            .map(|&(name, pattern)| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map(|pattern| SpamRule { name, pattern })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules, max_links })
    }

    /// The built-in filter, compiled once per process.
    pub fn standard() -> &'static SpamFilter {
        &STANDARD_FILTER
    }

    pub fn rule_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|rule| rule.name)
    }

    /// Returns the first rule the submission trips, if any.
    pub fn check(&self, submission: &ContactSubmission) -> Option<SpamVerdict> {
        self.check_text(&format!("{}\n{}", submission.name(), submission.message()))
    }

    pub fn check_text(&self, text: &str) -> Option<SpamVerdict> {
        if let Some(rule) = self.rules.iter().find(|rule| rule.pattern.is_match(text)) {
            return Some(SpamVerdict { rule: rule.name });
        }

        if LINK.find_iter(text).count() > self.max_links {
            return Some(SpamVerdict { rule: "link_flood" });
        }

        None
    }
}
