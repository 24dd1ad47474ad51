use crate::config::{FetchTarget, EHI_BASE_URL};
use crate::services::store::{unix_now, StoreError};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const OBSERVATIONS_FILE: &str = "price_observations.jsonl";

#[derive(Debug, Serialize)]
pub struct Leg {
    pub city: String,
    pub date: String,
}

/// One line of the observation log.
#[derive(Debug, Serialize)]
pub struct Observation {
    pub ts: u64,
    pub car_name: String,
    pub mode: &'static str,
    pub url: &'static str,
    pub pickup: Leg,
    #[serde(rename = "return")]
    pub return_leg: Leg,
    pub price: f64,
    pub last_price: Option<f64>,
    pub alert_price: Option<f64>,
}

impl Observation {
    pub fn new(
        target: &FetchTarget,
        price: f64,
        last_price: Option<f64>,
        alert_price: Option<f64>,
    ) -> Self {
        Self {
            ts: unix_now(),
            car_name: target.car_name.clone(),
            mode: "form",
            url: EHI_BASE_URL,
            pickup: Leg {
                city: target.pickup_city.clone(),
                date: target.pickup_date.to_string(),
            },
            return_leg: Leg {
                city: target.return_city.clone(),
                date: target.return_date.to_string(),
            },
            price,
            last_price,
            alert_price,
        }
    }
}

/// Append-only JSONL log of every price seen.
pub struct ObservationLog {
    path: PathBuf,
}

impl ObservationLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(logs_dir: impl AsRef<Path>) -> Self {
        Self::new(logs_dir.as_ref().join(OBSERVATIONS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, observation: &Observation) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let mut line = serde_json::to_string(observation)?;
        line.push('\n');
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn target() -> FetchTarget {
        FetchTarget {
            car_name: "大众新探影".into(),
            pickup_city: "敦煌".into(),
            return_city: "德令哈".into(),
            pickup_date: NaiveDate::from_ymd_opt(2025, 10, 4).unwrap(),
            return_date: NaiveDate::from_ymd_opt(2025, 10, 8).unwrap(),
            headful: false,
            debug: false,
        }
    }

    #[test]
    fn appends_one_json_object_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let log = ObservationLog::in_dir(dir.path().join("logs"));

        log.append(&Observation::new(&target(), 698.0, None, Some(700.0)))
            .unwrap();
        log.append(&Observation::new(&target(), 650.0, Some(698.0), Some(700.0)))
            .unwrap();

        let raw = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<serde_json::Value> = raw
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);

        let second = &lines[1];
        assert_eq!(second["mode"], "form");
        assert_eq!(second["url"], EHI_BASE_URL);
        assert_eq!(second["pickup"]["city"], "敦煌");
        assert_eq!(second["return"]["date"], "2025-10-08");
        assert_eq!(second["price"], 650.0);
        assert_eq!(second["last_price"], 698.0);
        assert!(lines[0]["last_price"].is_null());
    }
}
