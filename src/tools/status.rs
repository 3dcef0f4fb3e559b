//! MyFood Status Tool
//!
//! Provides runtime status information about the MyFood service.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;

/// Runtime status information
#[derive(Debug, Clone, Serialize)]
pub struct MyFoodStatus {
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    pub database_path: String,
    pub database_size_bytes: Option<u64>,

    /// Timezone named periods are resolved in
    pub timezone: String,
    pub selected_period: String,
    pub analytics_loading: bool,

    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Tracks service start time and static paths
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
    timezone: String,
}

impl StatusTracker {
    pub fn new(database_path: PathBuf, timezone: impl Into<String>) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
            timezone: timezone.into(),
        }
    }

    /// Snapshot the current status
    pub fn get_status(&self, selected_period: String, analytics_loading: bool) -> MyFoodStatus {
        let build_info = BuildInfo::current();

        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        MyFoodStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            timezone: self.timezone.clone(),
            selected_period,
            analytics_loading,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_for_missing_database() {
        let tracker = StatusTracker::new(PathBuf::from("/nonexistent/myfood.db"), "UTC");
        let status = tracker.get_status("week".to_string(), false);
        assert!(status.database_size_bytes.is_none());
        assert_eq!(status.timezone, "UTC");
        assert_eq!(status.selected_period, "week");
        assert_eq!(status.process_id, std::process::id());
    }
}
