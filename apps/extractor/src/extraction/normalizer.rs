use crate::extraction::models::{CvRecord, ParsedPayload, SkillEntry};

/// Pairs skill names with proficiencies by position.
///
/// Pairing stops at the shorter sequence; trailing entries of the longer one
/// are dropped.
pub fn normalize(filename: &str, payload: ParsedPayload) -> CvRecord {
    let skills = payload
        .skill_names
        .into_iter()
        .zip(payload.skill_proficiencies)
        .map(|(skill, proficiency)| SkillEntry { skill, proficiency })
        .collect();

    CvRecord {
        filename: filename.to_string(),
        skills,
    }
}
