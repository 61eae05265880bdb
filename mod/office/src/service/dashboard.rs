//! Dashboard aggregation queries.
//!
//! All date arithmetic happens in Rust; SQL only compares RFC 3339 TEXT
//! columns, which keeps every query identical on both backends.

use chrono::{Duration, Utc};
use serde::Serialize;

use praxis_sql::{SqlExecutor, Value};

use crate::model::ScheduleEntry;
use crate::service::{OfficeError, OfficeService};

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub period: String,
    pub leads_new: i64,
    pub leads_previous: i64,
    pub appointments_scheduled: i64,
    pub appointments_previous: i64,
    pub schedule_today: i64,
    pub schedule_tomorrow: i64,
    pub new_clients: i64,
    pub conversion_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartPoint {
    pub day: String,
    pub leads: i64,
    pub converted: i64,
    pub conversion_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceCount {
    pub source: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityItem {
    pub id: i64,
    pub action: String,
    pub user_name: String,
    pub created_at: String,
}

fn days_ago(days: i64) -> String {
    (Utc::now() - Duration::days(days)).to_rfc3339()
}

fn day_prefix(offset_days: i64) -> String {
    (Utc::now() + Duration::days(offset_days))
        .format("%Y-%m-%d")
        .to_string()
}

fn period_days(period: &str) -> i64 {
    match period {
        "week" => 7,
        _ => 30,
    }
}

fn rate(part: i64, whole: i64) -> f64 {
    if whole > 0 {
        (part as f64 / whole as f64 * 1000.0).round() / 10.0
    } else {
        0.0
    }
}

impl OfficeService {
    /// Headline numbers for the selected period, with previous-period
    /// values for trend arrows.
    pub fn dashboard_stats(&self, period: &str) -> Result<DashboardStats, OfficeError> {
        let days = period_days(period);
        let cutoff = days_ago(days);
        let previous_cutoff = days_ago(days * 2);
        let today = format!("{}%", day_prefix(0));
        let tomorrow = format!("{}%", day_prefix(1));

        let leads_new = self.count(
            "SELECT COUNT(*) AS cnt FROM leads WHERE entered_at >= ?1",
            &[Value::from(cutoff.as_str())],
        )?;
        let leads_previous = self.count(
            "SELECT COUNT(*) AS cnt FROM leads WHERE entered_at >= ?1 AND entered_at < ?2",
            &[Value::from(previous_cutoff.as_str()), Value::from(cutoff.as_str())],
        )?;
        let leads_converted = self.count(
            "SELECT COUNT(*) AS cnt FROM leads WHERE status = 'converted' AND entered_at >= ?1",
            &[Value::from(cutoff.as_str())],
        )?;

        let appointments_scheduled = self.count(
            "SELECT COUNT(*) AS cnt FROM appointments \
             WHERE status = 'scheduled' AND created_at >= ?1",
            &[Value::from(cutoff.as_str())],
        )?;
        let appointments_previous = self.count(
            "SELECT COUNT(*) AS cnt FROM appointments \
             WHERE status = 'scheduled' AND created_at >= ?1 AND created_at < ?2",
            &[Value::from(previous_cutoff.as_str()), Value::from(cutoff.as_str())],
        )?;

        let schedule_today = self.count(
            "SELECT COUNT(*) AS cnt FROM schedule_entries \
             WHERE starts_at LIKE ?1 AND status != 'cancelled'",
            &[Value::from(today)],
        )?;
        let schedule_tomorrow = self.count(
            "SELECT COUNT(*) AS cnt FROM schedule_entries \
             WHERE starts_at LIKE ?1 AND status != 'cancelled'",
            &[Value::from(tomorrow)],
        )?;

        let new_clients = self.count(
            "SELECT COUNT(*) AS cnt FROM clients WHERE created_at >= ?1",
            &[Value::from(cutoff.as_str())],
        )?;

        Ok(DashboardStats {
            period: if period == "week" { "week" } else { "month" }.to_string(),
            leads_new,
            leads_previous,
            appointments_scheduled,
            appointments_previous,
            schedule_today,
            schedule_tomorrow,
            new_clients,
            conversion_rate: rate(leads_converted, leads_new),
        })
    }

    /// Daily lead/conversion series for the chart.
    pub fn dashboard_chart(&self, period: &str) -> Result<Vec<ChartPoint>, OfficeError> {
        let cutoff = days_ago(period_days(period));
        let rows = self.sql.query(
            "SELECT substr(entered_at, 1, 10) AS day, COUNT(*) AS leads, \
             SUM(CASE WHEN status = 'converted' THEN 1 ELSE 0 END) AS converted \
             FROM leads WHERE entered_at >= ?1 \
             GROUP BY substr(entered_at, 1, 10) ORDER BY day ASC",
            &[Value::from(cutoff)],
        )?;

        Ok(rows
            .iter()
            .map(|row| {
                let leads = row.get_i64("leads").unwrap_or(0);
                let converted = row.get_i64("converted").unwrap_or(0);
                ChartPoint {
                    day: row.get_string("day").unwrap_or_default(),
                    leads,
                    converted,
                    conversion_rate: rate(converted, leads),
                }
            })
            .collect())
    }

    /// The next schedule entries, for the dashboard sidebar.
    pub fn dashboard_upcoming(&self, limit: u32) -> Result<Vec<ScheduleEntry>, OfficeError> {
        self.schedule_upcoming(limit)
    }

    /// Lead counts per acquisition source, largest first.
    pub fn leads_by_source(&self) -> Result<Vec<SourceCount>, OfficeError> {
        let rows = self.sql.query(
            "SELECT COALESCE(source, 'unknown') AS source, COUNT(*) AS cnt \
             FROM leads GROUP BY COALESCE(source, 'unknown') ORDER BY cnt DESC",
            &[],
        )?;
        Ok(rows
            .iter()
            .map(|row| SourceCount {
                source: row.get_string("source").unwrap_or_default(),
                count: row.get_i64("cnt").unwrap_or(0),
            })
            .collect())
    }

    /// Recent audit activity joined with user names.
    pub fn recent_activity(&self, limit: u32) -> Result<Vec<ActivityItem>, OfficeError> {
        let rows = self.sql.query(
            "SELECT a.id, a.action, a.created_at, u.name AS user_name \
             FROM audit_log a JOIN users u ON u.id = a.user_id \
             ORDER BY a.created_at DESC, a.id DESC LIMIT ?1",
            &[Value::from(limit.min(100) as i64)],
        )?;
        Ok(rows
            .iter()
            .map(|row| ActivityItem {
                id: row.get_i64("id").unwrap_or(0),
                action: row.get_string("action").unwrap_or_default(),
                user_name: row.get_string("user_name").unwrap_or_default(),
                created_at: row.get_string("created_at").unwrap_or_default(),
            })
            .collect())
    }
}
