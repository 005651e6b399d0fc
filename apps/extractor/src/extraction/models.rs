use serde::{Deserialize, Serialize};

/// One CV as handed over by ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub filename: String,
    pub content: String,
}

/// Structured payload decoded from the model's reply.
///
/// The two sequences are paired positionally during normalization and may
/// legitimately differ in length.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ParsedPayload {
    #[serde(rename = "Technical Skills", default)]
    pub skill_names: Vec<String>,
    #[serde(rename = "Proficiency level of Technical Skills", default)]
    pub skill_proficiencies: Vec<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillEntry {
    #[serde(rename = "Skill")]
    pub skill: String,
    #[serde(rename = "Proficiency")]
    pub proficiency: Option<String>,
}

/// Canonical per-document output. Written once to the incremental store and
/// once to the run accumulation; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CvRecord {
    #[serde(rename = "CV_Filename")]
    pub filename: String,
    #[serde(rename = "Skills")]
    pub skills: Vec<SkillEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_missing_keys_default_to_empty() {
        let payload: ParsedPayload = serde_json::from_str(r#"{"Soft Skills": ["Teamwork"]}"#).unwrap();
        assert!(payload.skill_names.is_empty());
        assert!(payload.skill_proficiencies.is_empty());
    }

    #[test]
    fn test_payload_null_proficiency_is_absent() {
        let payload: ParsedPayload = serde_json::from_str(
            r#"{
                "Technical Skills": ["Rust", "Go"],
                "Proficiency level of Technical Skills": ["Expert", null]
            }"#,
        )
        .unwrap();
        assert_eq!(
            payload.skill_proficiencies,
            vec![Some("Expert".to_string()), None]
        );
    }

    #[test]
    fn test_cv_record_serializes_with_export_field_names() {
        let record = CvRecord {
            filename: "cv1.txt".to_string(),
            skills: vec![SkillEntry {
                skill: "Python".to_string(),
                proficiency: Some("Advanced".to_string()),
            }],
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "CV_Filename": "cv1.txt",
                "Skills": [{"Skill": "Python", "Proficiency": "Advanced"}]
            })
        );
    }

    #[test]
    fn test_absent_proficiency_serializes_as_null() {
        let entry = SkillEntry {
            skill: "SQL".to_string(),
            proficiency: None,
        };
        assert_eq!(
            serde_json::to_string(&entry).unwrap(),
            r#"{"Skill":"SQL","Proficiency":null}"#
        );
    }
}
