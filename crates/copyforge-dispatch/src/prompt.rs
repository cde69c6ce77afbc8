//! System instruction composer.
//!
//! Merges the base copywriting instruction with the instruction text of each
//! selected skill, in catalog order, so two requests selecting the same
//! skills always produce byte-identical instructions regardless of selection
//! order.  Unknown skill ids are skipped, not rejected; the UI catalog and
//! this one may drift briefly during a deploy.

use copyforge_catalog::skills::all_skills;

/// Always-present opening instruction.
const BASE_INSTRUCTION: &str = "You are a senior marketing copywriter. Write \
    copy that is specific, benefit-led, and free of filler. Match the \
    requested format exactly and never invent product claims.";

/// Appended when no known skill is selected.
const DEFAULT_MODE_DIRECTIVE: &str = "No copy modules are active. Respond as \
    a versatile generalist copywriter and choose the most fitting format for \
    the request.";

/// Header above the per-skill lines.
const MODULE_HEADER: &str = "Apply the following copy modules:";

/// Closing directive when skills are selected.
const SYNTHESIS_DIRECTIVE: &str = "Blend every active module into a single \
    cohesive piece of copy; do not produce separate outputs per module.";

/// Compose the system instruction for a skill selection.
///
/// Pure over the static catalog: same selection in, same string out.
pub fn compose_instruction(selected: &[String]) -> String {
    for id in selected {
        if all_skills().iter().all(|s| s.id != id.as_str()) {
            tracing::debug!(skill_id = %id, "unknown skill id in selection, skipping");
        }
    }

    // Catalog order, not selection order.
    let matched: Vec<_> = all_skills()
        .iter()
        .filter(|s| selected.iter().any(|id| id == s.id))
        .collect();

    let mut out = String::from(BASE_INSTRUCTION);
    if matched.is_empty() {
        out.push_str("\n\n");
        out.push_str(DEFAULT_MODE_DIRECTIVE);
    } else {
        out.push_str("\n\n");
        out.push_str(MODULE_HEADER);
        for skill in &matched {
            out.push_str("\n- ");
            out.push_str(skill.name);
            out.push_str(": ");
            out.push_str(skill.instruction);
        }
        out.push_str("\n\n");
        out.push_str(SYNTHESIS_DIRECTIVE);
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn empty_selection_uses_default_mode() {
        let out = compose_instruction(&[]);
        assert!(out.starts_with(BASE_INSTRUCTION));
        assert!(out.contains(DEFAULT_MODE_DIRECTIVE));
        assert!(!out.contains(MODULE_HEADER));
    }

    #[test]
    fn composition_is_deterministic() {
        assert_eq!(compose_instruction(&[]), compose_instruction(&[]));
        let sel = ids(&["ad-copy-synapse", "seo-meta"]);
        assert_eq!(compose_instruction(&sel), compose_instruction(&sel));
    }

    #[test]
    fn selected_skills_appear_with_name_and_instruction() {
        let out = compose_instruction(&ids(&["ad-copy-synapse"]));
        assert!(out.contains(MODULE_HEADER));
        assert!(out.contains("- Ad Copy Synapse: "));
        assert!(out.contains(SYNTHESIS_DIRECTIVE));
        assert!(!out.contains(DEFAULT_MODE_DIRECTIVE));
    }

    #[test]
    fn unknown_ids_are_skipped() {
        let out = compose_instruction(&ids(&["definitely-not-a-skill"]));
        // Nothing matched, so the default-mode directive applies.
        assert!(out.contains(DEFAULT_MODE_DIRECTIVE));

        let out = compose_instruction(&ids(&["typo-id", "seo-meta"]));
        assert!(out.contains("- SEO Meta: "));
        assert!(!out.contains("typo-id"));
    }

    #[test]
    fn skills_render_in_catalog_order_not_selection_order() {
        let forward = compose_instruction(&ids(&["headline-hooks", "cta-optimizer"]));
        let reversed = compose_instruction(&ids(&["cta-optimizer", "headline-hooks"]));
        assert_eq!(forward, reversed);

        let hooks_at = forward.find("Headline Hooks").unwrap();
        let cta_at = forward.find("CTA Optimizer").unwrap();
        assert!(hooks_at < cta_at, "catalog order must win");
    }
}
