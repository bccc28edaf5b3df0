//! Patient directory backed by a JSON file of discharge reports.
//!
//! When the file is missing or underpopulated it is reseeded with synthetic
//! nephrology discharge reports so the assistant always has someone to find.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rand::seq::IndexedRandom;
use rand::Rng;
use tracing::info;

use crate::error::{AssistError, Result};
use crate::models::PatientReport;

#[async_trait]
pub trait PatientDirectory: Send + Sync {
    /// Case-insensitive substring match against the patient name.
    async fn lookup_by_name(&self, name: &str) -> Result<Vec<PatientReport>>;
}

const DIAGNOSES: &[&str] = &[
    "Chronic Kidney Disease Stage 3",
    "Acute Kidney Injury",
    "Nephrotic Syndrome",
    "Hypertensive Nephrosclerosis",
    "Diabetic Nephropathy",
];

const MEDICATION_POOL: &[&str] = &[
    "ACE inhibitor",
    "ARB",
    "Diuretic",
    "Erythropoietin",
    "Vitamin D",
    "Phosphate binder",
];

const DIET_POOL: &[&str] = &[
    "Low sodium",
    "Low potassium",
    "Fluid restriction",
    "Low phosphorus",
];

const FOLLOW_UP_POOL: &[&str] = &[
    "Check BMP in 1 week",
    "Follow up with nephrology in 2 weeks",
    "Monitor blood pressure daily",
    "Bring medication list to next visit",
];

const WARNINGS_POOL: &[&str] = &[
    "Shortness of breath",
    "Swelling in legs or face",
    "Decreased urine output",
    "Chest pain",
];

const DISCHARGE_POOL: &[&str] = &[
    "Take medications as prescribed",
    "Record daily weight",
    "Avoid NSAIDs",
    "Keep low-salt diet",
];

const FIRST_NAMES: &[&str] = &[
    "Alex", "Sam", "Taylor", "Jordan", "Morgan", "Riley", "Casey", "Jamie", "Avery", "Quinn",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Lee", "Brown", "Davis", "Miller", "Wilson", "Moore", "Taylor", "Anderson",
];

fn sample<R: Rng>(rng: &mut R, pool: &[&str], min: usize, max: usize) -> Vec<String> {
    let k = rng.random_range(min..=max);
    pool.choose_multiple(rng, k).map(|s| s.to_string()).collect()
}

fn synthetic_reports(n: usize) -> Vec<PatientReport> {
    let mut rng = rand::rng();
    let today = Utc::now();
    (0..n)
        .map(|_| {
            let first = FIRST_NAMES.choose(&mut rng).copied().unwrap_or("Alex");
            let last = LAST_NAMES.choose(&mut rng).copied().unwrap_or("Smith");
            let days_ago = rng.random_range(1..=60);
            PatientReport {
                patient_name: format!("{first} {last}"),
                discharge_date: (today - Duration::days(days_ago)).date_naive().to_string(),
                diagnosis: DIAGNOSES
                    .choose(&mut rng)
                    .copied()
                    .unwrap_or(DIAGNOSES[0])
                    .to_string(),
                medications: sample(&mut rng, MEDICATION_POOL, 2, 4),
                dietary_restrictions: sample(&mut rng, DIET_POOL, 1, 3),
                follow_up_instructions: sample(&mut rng, FOLLOW_UP_POOL, 2, 3),
                warning_signs: sample(&mut rng, WARNINGS_POOL, 2, 3),
                discharge_instructions: sample(&mut rng, DISCHARGE_POOL, 2, 3),
            }
        })
        .collect()
}

pub struct JsonPatientDirectory {
    path: PathBuf,
    min_records: usize,
}

impl JsonPatientDirectory {
    pub fn new(path: PathBuf, min_records: usize) -> Self {
        Self { path, min_records }
    }

    async fn seed(&self, n: usize) -> Result<Vec<PatientReport>> {
        let reports = synthetic_reports(n);
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let raw = serde_json::to_string_pretty(&reports)?;
        tokio::fs::write(&self.path, raw).await?;
        info!(count = n, path = %self.path.display(), "seeded patient reports");
        Ok(reports)
    }

    pub async fn load_reports(&self) -> Result<Vec<PatientReport>> {
        if !Path::new(&self.path).exists() {
            return self.seed(self.min_records.max(30)).await;
        }
        let raw = tokio::fs::read_to_string(&self.path).await?;
        if raw.trim().is_empty() {
            return self.seed(self.min_records.max(30)).await;
        }
        let reports: Vec<PatientReport> = serde_json::from_str(&raw)
            .map_err(|e| AssistError::DirectoryUnavailable(e.to_string()))?;
        if reports.len() < self.min_records {
            return self.seed(self.min_records).await;
        }
        Ok(reports)
    }
}

#[async_trait]
impl PatientDirectory for JsonPatientDirectory {
    async fn lookup_by_name(&self, name: &str) -> Result<Vec<PatientReport>> {
        let needle = name.trim().to_lowercase();
        let reports = self.load_reports().await?;
        Ok(reports
            .into_iter()
            .filter(|r| r.patient_name.to_lowercase().contains(&needle))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(name: &str) -> PatientReport {
        PatientReport {
            patient_name: name.to_string(),
            discharge_date: "2026-08-01".to_string(),
            diagnosis: "Acute Kidney Injury".to_string(),
            medications: vec!["Diuretic".to_string()],
            dietary_restrictions: vec!["Low sodium".to_string()],
            follow_up_instructions: vec!["Check BMP in 1 week".to_string()],
            warning_signs: vec!["Chest pain".to_string()],
            discharge_instructions: vec!["Record daily weight".to_string()],
        }
    }

    async fn directory_with(reports: &[PatientReport]) -> (tempfile::TempDir, JsonPatientDirectory) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patient_reports.json");
        tokio::fs::write(&path, serde_json::to_string(reports).unwrap())
            .await
            .unwrap();
        (dir, JsonPatientDirectory::new(path, 1))
    }

    #[tokio::test]
    async fn lookup_is_case_insensitive_substring() {
        let (_guard, directory) =
            directory_with(&[report("Jordan Lee"), report("Morgan Miller")]).await;
        let matches = directory.lookup_by_name("jordan").await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].patient_name, "Jordan Lee");

        let matches = directory.lookup_by_name("LEE").await.unwrap();
        assert_eq!(matches.len(), 1);

        assert!(directory.lookup_by_name("Nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_file_triggers_seeding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patient_reports.json");
        let directory = JsonPatientDirectory::new(path.clone(), 25);
        let reports = directory.load_reports().await.unwrap();
        assert!(reports.len() >= 25);
        assert!(path.exists());
        for r in &reports {
            assert!(!r.diagnosis.is_empty());
            assert!(!r.follow_up_instructions.is_empty());
        }
    }

    #[tokio::test]
    async fn underpopulated_file_is_reseeded() {
        let (_guard, mut directory) = directory_with(&[report("Jordan Lee")]).await;
        directory.min_records = 10;
        let reports = directory.load_reports().await.unwrap();
        assert!(reports.len() >= 10);
    }
}
