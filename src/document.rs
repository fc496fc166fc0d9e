use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ContextError, ErrorKind};

/// Contact details shown at the top of the résumé.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct PersonalInfo {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub portfolio: String,
    pub linkedin: String,
    pub github: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct EducationEntry {
    pub school_name: String,
    pub school_location: String,
    pub degree: String,
    pub major: String,
    /// Free-form display text, `None` when the GPA should not be shown.
    pub gpa: Option<String>,
    pub start_date: String,
    pub end_date: String,
}

impl EducationEntry {
    /// The GPA to display, if any. An empty or blank value counts as absent.
    pub fn displayed_gpa(&self) -> Option<&str> {
        self.gpa
            .as_deref()
            .map(str::trim)
            .filter(|gpa| !gpa.is_empty())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ExperienceEntry {
    pub company_name: String,
    pub company_location: String,
    pub job_title: String,
    pub start_date: String,
    pub end_date: String,
    pub responsibilities: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct SkillCategory {
    pub name: String,
    pub details: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ProjectEntry {
    pub project_name: String,
    pub link: String,
    pub genre: String,
    pub start_date: String,
    pub end_date: String,
    pub description_bullets: Vec<String>,
    pub tools_used: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct AwardEntry {
    pub award_name: String,
    pub award_date: String,
    pub awarder: String,
    pub summary: String,
}

/// The whole résumé: the editable section headings followed by the ordered entry lists.
///
/// Every field may be omitted from the JSON input, in which case it takes its default value.
/// Fields that are not part of the schema are ignored when reading a document.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ResumeData {
    pub section_personal: String,
    pub section_education: String,
    pub section_experience: String,
    pub section_skills: String,
    pub section_projects: String,
    pub section_awards: String,

    pub personal: PersonalInfo,
    pub education: Vec<EducationEntry>,
    pub experience: Vec<ExperienceEntry>,
    pub skills: Vec<SkillCategory>,
    pub projects: Vec<ProjectEntry>,
    pub awards: Vec<AwardEntry>,
}

impl Default for ResumeData {
    fn default() -> Self {
        ResumeData {
            section_personal: "Your Personal Info".into(),
            section_education: "Education".into(),
            section_experience: "Work Experience".into(),
            section_skills: "Skills".into(),
            section_projects: "Selected Projects".into(),
            section_awards: "Awards and Honors".into(),
            personal: PersonalInfo::default(),
            education: Vec::new(),
            experience: Vec::new(),
            skills: Vec::new(),
            projects: Vec::new(),
            awards: Vec::new(),
        }
    }
}

impl ResumeData {
    /// Validate an untyped JSON value against the schema.
    pub fn from_json_value(value: serde_json::Value) -> Result<ResumeData, ContextError> {
        serde_json::from_value(value).map_err(|error| {
            ContextError::with_error(
                ErrorKind::Validation,
                "The document does not match the résumé schema",
                &error,
            )
        })
    }

    /// Parse and validate a JSON document. Syntax errors and schema mismatches are both
    /// reported as validation errors, including the line and column serde_json points at.
    pub fn from_json_str(contents: &str) -> Result<ResumeData, ContextError> {
        serde_json::from_str(contents).map_err(|error| {
            ContextError::with_error(
                ErrorKind::Validation,
                "The document does not match the résumé schema",
                &error,
            )
        })
    }

    pub fn from_path(document_path: &Path) -> Result<ResumeData, ContextError> {
        let document_content = std::fs::read_to_string(document_path).map_err(|error| {
            ContextError::with_error(
                ErrorKind::Io,
                format!("Unable to read the document {:?}", document_path),
                &error,
            )
        })?;
        let resume = ResumeData::from_json_str(&document_content).map_err(|error| {
            ContextError {
                context: format!("Unable to load the document {:?}", document_path),
                ..error
            }
        })?;

        Ok(resume)
    }

    /// Serialize into the pretty-printed JSON shape accepted by `from_json_str`.
    pub fn to_json_string(&self) -> Result<String, ContextError> {
        serde_json::to_string_pretty(self).map_err(|error| {
            ContextError::with_error(
                ErrorKind::Validation,
                "Unable to serialize the document",
                &error,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng as _;

    fn sample_resume() -> ResumeData {
        ResumeData {
            personal: PersonalInfo {
                full_name: "Ada Lovelace".into(),
                email: "ada@example.org".into(),
                location: "London".into(),
                ..Default::default()
            },
            education: vec![
                EducationEntry {
                    school_name: "University of London".into(),
                    degree: "BSc".into(),
                    major: "Mathematics".into(),
                    gpa: Some("3.9".into()),
                    ..Default::default()
                },
                EducationEntry {
                    school_name: "Home tutoring".into(),
                    ..Default::default()
                },
            ],
            experience: vec![ExperienceEntry {
                company_name: "Analytical Engine".into(),
                job_title: "Programmer".into(),
                responsibilities: vec!["Wrote note G".into(), "Computed Bernoulli numbers".into()],
                ..Default::default()
            }],
            skills: vec![SkillCategory {
                name: "Languages".into(),
                details: vec!["English".into(), "French".into()],
            }],
            ..Default::default()
        }
    }

    #[test]
    fn serialized_document_validates_back_to_itself() {
        let resume = sample_resume();
        let json = resume.to_json_string().unwrap();

        assert_eq!(ResumeData::from_json_str(&json).unwrap(), resume);
    }

    #[test]
    fn absent_gpa_serializes_as_null() {
        let resume = sample_resume();
        let value = serde_json::to_value(&resume).unwrap();

        assert_eq!(value["education"][0]["gpa"], "3.9");
        assert!(value["education"][1]["gpa"].is_null());
    }

    #[test]
    fn missing_fields_take_their_defaults() {
        let resume = ResumeData::from_json_str(r#"{ "personal": { "full_name": "Ada" } }"#).unwrap();

        assert_eq!(resume.personal.full_name, "Ada");
        assert_eq!(resume.personal.email, "");
        assert_eq!(resume.section_projects, "Selected Projects");
        assert!(resume.education.is_empty());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let resume = ResumeData::from_json_str(
            r#"{ "theme": "dark", "personal": { "full_name": "Ada", "nickname": "A" } }"#,
        )
        .unwrap();

        assert_eq!(resume.personal.full_name, "Ada");
        let json = resume.to_json_string().unwrap();
        assert!(!json.contains("theme"));
        assert!(!json.contains("nickname"));
    }

    #[test]
    fn list_where_string_expected_is_rejected() {
        let error = ResumeData::from_json_str(r#"{ "personal": { "full_name": ["Ada"] } }"#)
            .unwrap_err();

        assert_eq!(error.kind, ErrorKind::Validation);
        assert!(error
            .source_error
            .as_deref()
            .unwrap()
            .contains("invalid type: sequence, expected a string"));
    }

    #[test]
    fn untyped_value_is_validated() {
        let value = serde_json::json!({ "skills": [{ "name": "Rust", "details": "fast" }] });
        let error = ResumeData::from_json_value(value).unwrap_err();

        assert_eq!(error.kind, ErrorKind::Validation);
    }

    #[test]
    fn blank_gpa_is_not_displayed() {
        let mut entry = EducationEntry::default();
        assert_eq!(entry.displayed_gpa(), None);
        entry.gpa = Some("  ".into());
        assert_eq!(entry.displayed_gpa(), None);
        entry.gpa = Some("3.9".into());
        assert_eq!(entry.displayed_gpa(), Some("3.9"));
    }

    fn random_string(rng: &mut rand::rngs::ThreadRng) -> String {
        let length = rng.gen_range(0..=24);
        rand_utf8::rand_utf8(rng, length).to_string()
    }

    fn random_strings(rng: &mut rand::rngs::ThreadRng) -> Vec<String> {
        (0..rng.gen_range(0..5)).map(|_| random_string(rng)).collect()
    }

    fn random_resume(rng: &mut rand::rngs::ThreadRng) -> ResumeData {
        ResumeData {
            section_personal: random_string(rng),
            section_education: random_string(rng),
            section_experience: random_string(rng),
            section_skills: random_string(rng),
            section_projects: random_string(rng),
            section_awards: random_string(rng),
            personal: PersonalInfo {
                full_name: random_string(rng),
                email: random_string(rng),
                phone: random_string(rng),
                location: random_string(rng),
                portfolio: random_string(rng),
                linkedin: random_string(rng),
                github: random_string(rng),
            },
            education: (0..rng.gen_range(0..4))
                .map(|_| EducationEntry {
                    school_name: random_string(rng),
                    school_location: random_string(rng),
                    degree: random_string(rng),
                    major: random_string(rng),
                    gpa: if rng.gen_bool(0.5) {
                        Some(random_string(rng))
                    } else {
                        None
                    },
                    start_date: random_string(rng),
                    end_date: random_string(rng),
                })
                .collect(),
            experience: (0..rng.gen_range(0..4))
                .map(|_| ExperienceEntry {
                    company_name: random_string(rng),
                    company_location: random_string(rng),
                    job_title: random_string(rng),
                    start_date: random_string(rng),
                    end_date: random_string(rng),
                    responsibilities: random_strings(rng),
                })
                .collect(),
            skills: (0..rng.gen_range(0..4))
                .map(|_| SkillCategory {
                    name: random_string(rng),
                    details: random_strings(rng),
                })
                .collect(),
            projects: (0..rng.gen_range(0..4))
                .map(|_| ProjectEntry {
                    project_name: random_string(rng),
                    link: random_string(rng),
                    genre: random_string(rng),
                    start_date: random_string(rng),
                    end_date: random_string(rng),
                    description_bullets: random_strings(rng),
                    tools_used: random_strings(rng),
                })
                .collect(),
            awards: (0..rng.gen_range(0..4))
                .map(|_| AwardEntry {
                    award_name: random_string(rng),
                    award_date: random_string(rng),
                    awarder: random_string(rng),
                    summary: random_string(rng),
                })
                .collect(),
        }
    }

    #[test]
    fn randomized_documents_round_trip() {
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let resume = random_resume(&mut rng);
            let json = resume.to_json_string().unwrap();
            let reloaded = ResumeData::from_json_str(&json).unwrap();

            assert_eq!(reloaded, resume, "round trip changed the document {}", json);
        }
    }
}
