//! Skill catalog.
//!
//! A skill is a named instruction fragment a user can select to steer the
//! generated copy toward a specific task (ad copy, subject lines, captions).
//! Selection is per request and carries no persisted state; the composer in
//! `copyforge-dispatch` stitches the selected fragments into the system
//! instruction in catalog order.

use serde::Serialize;

/// A single skill catalog entry.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SkillInfo {
    /// Stable skill identifier, referenced by requests.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Instruction text appended to the system prompt when selected.
    pub instruction: &'static str,
}

/// The compiled-in skill catalog, in composition order.
static SKILLS: &[SkillInfo] = &[
    SkillInfo {
        id: "ad-copy-synapse",
        name: "Ad Copy Synapse",
        instruction: "Write punchy, conversion-focused ad copy. Lead with the \
            strongest benefit, keep sentences short, and end with a clear call \
            to action.",
    },
    SkillInfo {
        id: "headline-hooks",
        name: "Headline Hooks",
        instruction: "Craft headlines that open a curiosity gap or make a bold, \
            specific promise. Offer concrete numbers over vague superlatives.",
    },
    SkillInfo {
        id: "email-subject-lab",
        name: "Email Subject Lab",
        instruction: "Optimize for inbox open rates: under 50 characters, \
            front-load the value, avoid spam-trigger words and all-caps.",
    },
    SkillInfo {
        id: "social-captions",
        name: "Social Captions",
        instruction: "Write platform-native social captions with a \
            scroll-stopping first line and a conversational, human tone.",
    },
    SkillInfo {
        id: "product-storyteller",
        name: "Product Storyteller",
        instruction: "Describe products through the customer's transformation: \
            the before state, the after state, and the product as the bridge.",
    },
    SkillInfo {
        id: "seo-meta",
        name: "SEO Meta",
        instruction: "Produce title tags and meta descriptions that fit SERP \
            length limits and place the primary keyword naturally near the front.",
    },
    SkillInfo {
        id: "brand-voice-keeper",
        name: "Brand Voice Keeper",
        instruction: "Hold a consistent brand voice across every variant; never \
            drift in register, vocabulary, or formality between outputs.",
    },
    SkillInfo {
        id: "cta-optimizer",
        name: "CTA Optimizer",
        instruction: "Make every call to action specific and low-friction: \
            verb-first, outcome-oriented, one action per CTA.",
    },
];

/// All catalog entries, in composition order.
pub fn all_skills() -> &'static [SkillInfo] {
    SKILLS
}

/// Look up a skill by id.
pub fn find_skill(id: &str) -> Option<&'static SkillInfo> {
    SKILLS.iter().find(|s| s.id == id)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
