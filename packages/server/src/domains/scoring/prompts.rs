//! Fixed prompt templates for the two classification calls.
//!
//! Both prompts demand bare JSON; anything else fails schema parsing and
//! degrades to the empty verdict.

/// SDG relevance scoring prompt.
pub const SDG_SCORING_PROMPT: &str = r#"
Analyse this image submitted for a sustainable social media platform.

1. Does this image relate to any UN Sustainable Development Goals (SDGs)?
2. If yes, which SDG numbers (1-17)?
3. Give an SDG Impact Score from 0-100:
   - 0-20: No SDG relevance
   - 21-50: Mild relevance
   - 51-80: Clear, meaningful SDG action
   - 81-100: Exceptional direct impact
4. Short reason (1-2 sentences, encouraging tone).

Return ONLY valid JSON:
{
  "is_sdg_related": true,
  "sdg_goals": [4, 12],
  "score": 75,
  "reason": "This image shows..."
}
"#;

/// Safety / moderation prompt.
pub const SAFETY_PROMPT: &str = r#"
Is this image safe and appropriate for a family-friendly social platform?
Return ONLY: {"is_safe": true, "reason": "..."}
"#;
