//! Form state for an editor surface.
//!
//! Every field is kept as the raw text the user typed. `gather` turns the whole form into a
//! fresh `ResumeData`, trimming values, dropping blank lines from multi-line fields and
//! treating an empty GPA as absent. `ResumeForm::from_resume` goes the other way.

use std::collections::BTreeMap;

use crate::document::{
    AwardEntry, EducationEntry, ExperienceEntry, PersonalInfo, ProjectEntry, ResumeData,
    SkillCategory,
};

/// A stable identifier for one entry of a list. Identifiers are never reused within a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId(u64);

/// An ordered list of entries addressed by stable identifiers.
///
/// Identifiers grow monotonically, so iterating the map in key order is insertion order,
/// and removing one entry leaves the others and their identifiers untouched.
#[derive(Debug, Clone)]
pub struct EntryList<T> {
    entries: BTreeMap<EntryId, T>,
    next_id: u64,
}

impl<T> Default for EntryList<T> {
    fn default() -> Self {
        EntryList {
            entries: BTreeMap::new(),
            next_id: 0,
        }
    }
}

impl<T> EntryList<T> {
    pub fn push(&mut self, entry: T) -> EntryId {
        let id = EntryId(self.next_id);
        self.next_id += 1;
        self.entries.insert(id, entry);
        id
    }

    pub fn remove(&mut self, id: EntryId) -> Option<T> {
        self.entries.remove(&id)
    }

    pub fn get(&self, id: EntryId) -> Option<&T> {
        self.entries.get(&id)
    }

    pub fn get_mut(&mut self, id: EntryId) -> Option<&mut T> {
        self.entries.get_mut(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = EntryId> + '_ {
        self.entries.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntryId, &T)> {
        self.entries.iter().map(|(id, entry)| (*id, entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> FromIterator<T> for EntryList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = EntryList::default();
        for entry in iter {
            list.push(entry);
        }
        list
    }
}

/// Split a multi-line text field into its trimmed, non-blank lines.
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

fn join_lines(lines: &[String]) -> String {
    lines.join("\n")
}

fn field(text: &str) -> String {
    text.trim().to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonalForm {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub portfolio: String,
    pub linkedin: String,
    pub github: String,
}

impl PersonalForm {
    fn from_entry(personal: &PersonalInfo) -> Self {
        PersonalForm {
            full_name: personal.full_name.clone(),
            email: personal.email.clone(),
            phone: personal.phone.clone(),
            location: personal.location.clone(),
            portfolio: personal.portfolio.clone(),
            linkedin: personal.linkedin.clone(),
            github: personal.github.clone(),
        }
    }

    fn gather(&self) -> PersonalInfo {
        PersonalInfo {
            full_name: field(&self.full_name),
            email: field(&self.email),
            phone: field(&self.phone),
            location: field(&self.location),
            portfolio: field(&self.portfolio),
            linkedin: field(&self.linkedin),
            github: field(&self.github),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EducationForm {
    pub school_name: String,
    pub school_location: String,
    pub degree: String,
    pub major: String,
    pub gpa: String,
    pub start_date: String,
    pub end_date: String,
}

impl EducationForm {
    fn from_entry(education: &EducationEntry) -> Self {
        EducationForm {
            school_name: education.school_name.clone(),
            school_location: education.school_location.clone(),
            degree: education.degree.clone(),
            major: education.major.clone(),
            gpa: education.gpa.clone().unwrap_or_default(),
            start_date: education.start_date.clone(),
            end_date: education.end_date.clone(),
        }
    }

    fn gather(&self) -> EducationEntry {
        let gpa = field(&self.gpa);
        EducationEntry {
            school_name: field(&self.school_name),
            school_location: field(&self.school_location),
            degree: field(&self.degree),
            major: field(&self.major),
            gpa: (!gpa.is_empty()).then_some(gpa),
            start_date: field(&self.start_date),
            end_date: field(&self.end_date),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExperienceForm {
    pub company_name: String,
    pub company_location: String,
    pub job_title: String,
    pub start_date: String,
    pub end_date: String,
    /// One responsibility per line.
    pub responsibilities: String,
}

impl ExperienceForm {
    fn from_entry(experience: &ExperienceEntry) -> Self {
        ExperienceForm {
            company_name: experience.company_name.clone(),
            company_location: experience.company_location.clone(),
            job_title: experience.job_title.clone(),
            start_date: experience.start_date.clone(),
            end_date: experience.end_date.clone(),
            responsibilities: join_lines(&experience.responsibilities),
        }
    }

    fn gather(&self) -> ExperienceEntry {
        ExperienceEntry {
            company_name: field(&self.company_name),
            company_location: field(&self.company_location),
            job_title: field(&self.job_title),
            start_date: field(&self.start_date),
            end_date: field(&self.end_date),
            responsibilities: split_lines(&self.responsibilities),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkillForm {
    pub name: String,
    /// One item per line, rendered comma-separated.
    pub details: String,
}

impl SkillForm {
    fn from_entry(skill: &SkillCategory) -> Self {
        SkillForm {
            name: skill.name.clone(),
            details: join_lines(&skill.details),
        }
    }

    fn gather(&self) -> SkillCategory {
        SkillCategory {
            name: field(&self.name),
            details: split_lines(&self.details),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectForm {
    pub project_name: String,
    pub link: String,
    pub genre: String,
    pub start_date: String,
    pub end_date: String,
    pub description_bullets: String,
    pub tools_used: String,
}

impl ProjectForm {
    fn from_entry(project: &ProjectEntry) -> Self {
        ProjectForm {
            project_name: project.project_name.clone(),
            link: project.link.clone(),
            genre: project.genre.clone(),
            start_date: project.start_date.clone(),
            end_date: project.end_date.clone(),
            description_bullets: join_lines(&project.description_bullets),
            tools_used: join_lines(&project.tools_used),
        }
    }

    fn gather(&self) -> ProjectEntry {
        ProjectEntry {
            project_name: field(&self.project_name),
            link: field(&self.link),
            genre: field(&self.genre),
            start_date: field(&self.start_date),
            end_date: field(&self.end_date),
            description_bullets: split_lines(&self.description_bullets),
            tools_used: split_lines(&self.tools_used),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AwardForm {
    pub award_name: String,
    pub award_date: String,
    pub awarder: String,
    pub summary: String,
}

impl AwardForm {
    fn from_entry(award: &AwardEntry) -> Self {
        AwardForm {
            award_name: award.award_name.clone(),
            award_date: award.award_date.clone(),
            awarder: award.awarder.clone(),
            summary: award.summary.clone(),
        }
    }

    fn gather(&self) -> AwardEntry {
        AwardEntry {
            award_name: field(&self.award_name),
            award_date: field(&self.award_date),
            awarder: field(&self.awarder),
            summary: field(&self.summary),
        }
    }
}

/// The complete editable form.
#[derive(Debug, Clone)]
pub struct ResumeForm {
    pub section_personal: String,
    pub section_education: String,
    pub section_experience: String,
    pub section_skills: String,
    pub section_projects: String,
    pub section_awards: String,
    pub personal: PersonalForm,
    pub education: EntryList<EducationForm>,
    pub experience: EntryList<ExperienceForm>,
    pub skills: EntryList<SkillForm>,
    pub projects: EntryList<ProjectForm>,
    pub awards: EntryList<AwardForm>,
}

impl Default for ResumeForm {
    /// A form over the default document, headings included.
    fn default() -> Self {
        ResumeForm::from_resume(&ResumeData::default())
    }
}

impl ResumeForm {
    pub fn from_resume(resume: &ResumeData) -> Self {
        ResumeForm {
            section_personal: resume.section_personal.clone(),
            section_education: resume.section_education.clone(),
            section_experience: resume.section_experience.clone(),
            section_skills: resume.section_skills.clone(),
            section_projects: resume.section_projects.clone(),
            section_awards: resume.section_awards.clone(),
            personal: PersonalForm::from_entry(&resume.personal),
            education: resume.education.iter().map(EducationForm::from_entry).collect(),
            experience: resume.experience.iter().map(ExperienceForm::from_entry).collect(),
            skills: resume.skills.iter().map(SkillForm::from_entry).collect(),
            projects: resume.projects.iter().map(ProjectForm::from_entry).collect(),
            awards: resume.awards.iter().map(AwardForm::from_entry).collect(),
        }
    }

    /// Read every field of the form into a new document.
    pub fn gather(&self) -> ResumeData {
        ResumeData {
            section_personal: self.section_personal.trim().to_string(),
            section_education: self.section_education.trim().to_string(),
            section_experience: self.section_experience.trim().to_string(),
            section_skills: self.section_skills.trim().to_string(),
            section_projects: self.section_projects.trim().to_string(),
            section_awards: self.section_awards.trim().to_string(),
            personal: self.personal.gather(),
            education: self.education.iter().map(|(_, form)| form.gather()).collect(),
            experience: self.experience.iter().map(|(_, form)| form.gather()).collect(),
            skills: self.skills.iter().map(|(_, form)| form.gather()).collect(),
            projects: self.projects.iter().map(|(_, form)| form.gather()).collect(),
            awards: self.awards.iter().map(|(_, form)| form.gather()).collect(),
        }
    }
}
