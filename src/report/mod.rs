//! Report rendering.
//!
//! Assembles the four sections into Markdown in a fixed, non-negotiable
//! order: 基础设施状态, LLM 状态矩阵, 异常深度穿透, 定时任务追踪. A section
//! with no data renders an explicit placeholder line instead of
//! disappearing, so downstream consumers that parse the report see a stable
//! structure. The assembled document makes one final pass through the
//! redactor before being returned.

use crate::cron::CronJobStatus;
use crate::health::ModelStatusRow;
use crate::infra::InfraSummary;
use crate::ingest::Window;
use crate::redact::Redactor;
use crate::timeline::Timeline;
use crate::timezone::TimeNormalizer;
use comfy_table::{presets::ASCII_MARKDOWN, Cell, Table};
use std::fmt::Write;

/// Everything the renderer needs for one run.
pub struct ReportInputs<'a> {
    pub window: &'a Window,
    pub tz: &'a TimeNormalizer,
    pub infra: &'a InfraSummary,
    pub matrix: &'a [ModelStatusRow],
    pub timeline: &'a Timeline,
    pub cron: &'a [CronJobStatus],
}

const MAX_RESTART_DETAILS: usize = 5;

fn render_preamble(out: &mut String, inputs: &ReportInputs<'_>) {
    writeln!(out, "📊 网关健康审计报告").unwrap();
    writeln!(
        out,
        "({} | 过去 {} 小时 | 时区 {})",
        inputs.tz.format(inputs.window.now),
        inputs.window.hours,
        inputs.tz.zone_name()
    )
    .unwrap();
    if inputs.tz.fallback_used() {
        writeln!(
            out,
            "⚠️ 时区回退：配置未提供有效时区，已使用默认 {}。",
            inputs.tz.zone_name()
        )
        .unwrap();
    }
    writeln!(out).unwrap();
}

fn render_infra(out: &mut String, inputs: &ReportInputs<'_>) {
    let infra = inputs.infra;
    writeln!(out, "### 🛰️ 基础设施状态").unwrap();
    writeln!(out, "- Gateway 重启: {} 次。", infra.restarts.len()).unwrap();
    if !infra.breakdown.is_empty() {
        let breakdown = infra
            .breakdown
            .iter()
            .map(|(reason, count)| format!("{} x{}", reason, count))
            .collect::<Vec<_>>()
            .join("，");
        writeln!(out, "- 重启原因分布: {}。", breakdown).unwrap();
        writeln!(
            out,
            "- 最近重启明细 (最多 {} 条):",
            MAX_RESTART_DETAILS
        )
        .unwrap();
        for detail in infra.restarts.iter().take(MAX_RESTART_DETAILS) {
            writeln!(
                out,
                "  - [{}] {}",
                inputs.tz.format(detail.timestamp),
                detail.reason
            )
            .unwrap();
        }
    }
    let journal_status = if infra.journal_present {
        "journal-present"
    } else {
        "journal-missing"
    };
    writeln!(
        out,
        "- Watchdog: {}（近 {} 小时事件 {} 条）。",
        journal_status, inputs.window.hours, infra.journal_event_count
    )
    .unwrap();
    let skipped = infra.stats.skipped_no_timestamp + infra.stats.malformed_journal;
    if skipped > 0 {
        writeln!(out, "- 数据质量: 跳过不可解析记录 {} 条。", skipped).unwrap();
    }
    writeln!(out).unwrap();
}

fn render_matrix(out: &mut String, inputs: &ReportInputs<'_>) {
    writeln!(out, "### 🧠 LLM 状态矩阵").unwrap();
    if inputs.matrix.is_empty() {
        writeln!(out, "- 窗口内无模型事件，配置中也未声明模型。").unwrap();
        writeln!(out).unwrap();
        return;
    }

    let mut table = Table::new();
    table.load_preset(ASCII_MARKDOWN);
    table.set_header(vec![
        "Provider",
        "模型 (Model)",
        "状态",
        "最近成功",
        "最近失败",
        "窗口内失败",
        "平均延迟",
    ]);
    for row in inputs.matrix {
        let fmt_ts = |ts: Option<chrono::DateTime<chrono::Utc>>| {
            ts.map(|t| inputs.tz.format(t)).unwrap_or_else(|| "-".to_string())
        };
        table.add_row(vec![
            Cell::new(&row.provider),
            Cell::new(&row.model),
            Cell::new(row.status.label()),
            Cell::new(fmt_ts(row.last_success_at)),
            Cell::new(fmt_ts(row.last_failure_at)),
            Cell::new(row.failure_count),
            Cell::new(
                row.avg_latency_ms
                    .map(|ms| format!("{}ms", ms))
                    .unwrap_or_else(|| "-".to_string()),
            ),
        ]);
    }
    writeln!(out, "{}", table).unwrap();
    writeln!(out).unwrap();
}

fn render_timeline(out: &mut String, inputs: &ReportInputs<'_>) {
    writeln!(out, "### 🔍 异常深度穿透").unwrap();
    let timeline = inputs.timeline;
    if timeline.entries.is_empty() {
        writeln!(out, "- 近窗口内未捕获到异常事件。").unwrap();
    } else {
        for entry in &timeline.entries {
            writeln!(
                out,
                "- [{}] [{}] {} ({})",
                inputs.tz.format(entry.timestamp),
                entry.severity.as_str(),
                entry.description,
                entry.source.as_str()
            )
            .unwrap();
        }
        if timeline.suppressed > 0 {
            writeln!(
                out,
                "- …… {} additional anomalies suppressed（另有 {} 条异常已省略）。",
                timeline.suppressed, timeline.suppressed
            )
            .unwrap();
        }
    }
    writeln!(out).unwrap();
}

fn render_cron(out: &mut String, inputs: &ReportInputs<'_>) {
    writeln!(out, "### 🕒 定时任务追踪").unwrap();
    if inputs.cron.is_empty() {
        writeln!(out, "- 未检测到 Cron 任务。").unwrap();
    } else {
        for job in inputs.cron {
            let last_run = job
                .last_run_at
                .map(|t| inputs.tz.format(t))
                .unwrap_or_else(|| "无记录".to_string());
            let next_due = job
                .next_due
                .map(|t| inputs.tz.format(t))
                .unwrap_or_else(|| "未知".to_string());
            let suffix = if job.enabled { "" } else { "（已停用）" };
            writeln!(
                out,
                "- {}: {}，上次运行 {}，下次预计 {}。{}",
                job.job_id,
                job.last_outcome.label(),
                last_run,
                next_due,
                suffix
            )
            .unwrap();
        }
    }
}

/// Render the full report. Section order is part of the output contract.
pub fn render(inputs: &ReportInputs<'_>, redactor: &Redactor) -> String {
    let mut out = String::new();
    render_preamble(&mut out, inputs);
    render_infra(&mut out, inputs);
    render_matrix(&mut out, inputs);
    render_timeline(&mut out, inputs);
    render_cron(&mut out, inputs);

    let document = out.trim_end().to_string() + "\n";
    // Last-resort sweep; aggregates were already redacted at ingest.
    redactor.redact(&document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::ModelStatus;
    use crate::ingest::IngestStats;
    use chrono::{TimeZone, Utc};

    fn window() -> Window {
        Window::ending_at(Utc.with_ymd_and_hms(2026, 2, 7, 12, 0, 0).unwrap(), 2)
    }

    fn render_empty(tz: &TimeNormalizer) -> String {
        let window = window();
        let infra = InfraSummary {
            stats: IngestStats::default(),
            ..Default::default()
        };
        let timeline = Timeline::default();
        let inputs = ReportInputs {
            window: &window,
            tz,
            infra: &infra,
            matrix: &[],
            timeline: &timeline,
            cron: &[],
        };
        render(&inputs, &Redactor::default())
    }

    #[test]
    fn test_section_order_fixed_even_when_empty() {
        let tz = TimeNormalizer::resolve(Some("UTC"));
        let report = render_empty(&tz);
        let infra = report.find("基础设施状态").unwrap();
        let matrix = report.find("LLM 状态矩阵").unwrap();
        let anomalies = report.find("异常深度穿透").unwrap();
        let cron = report.find("定时任务追踪").unwrap();
        assert!(infra < matrix);
        assert!(matrix < anomalies);
        assert!(anomalies < cron);
    }

    #[test]
    fn test_empty_sections_have_placeholders() {
        let tz = TimeNormalizer::resolve(Some("UTC"));
        let report = render_empty(&tz);
        assert!(report.contains("窗口内无模型事件"));
        assert!(report.contains("未捕获到异常事件"));
        assert!(report.contains("未检测到 Cron 任务"));
    }

    #[test]
    fn test_fallback_caveat_surfaced() {
        let tz = TimeNormalizer::resolve(None);
        let report = render_empty(&tz);
        assert!(report.contains("时区回退"));
        assert!(report.contains("Asia/Shanghai"));
    }

    #[test]
    fn test_no_fallback_caveat_when_zone_resolves() {
        let tz = TimeNormalizer::resolve(Some("UTC"));
        let report = render_empty(&tz);
        assert!(!report.contains("时区回退"));
    }

    #[test]
    fn test_matrix_has_provider_column() {
        let tz = TimeNormalizer::resolve(Some("UTC"));
        let window = window();
        let infra = InfraSummary::default();
        let timeline = Timeline::default();
        let rows = vec![ModelStatusRow {
            model: "gemini-3-pro".to_string(),
            provider: "google-gemini-cli".to_string(),
            last_success_at: Some(Utc.with_ymd_and_hms(2026, 2, 7, 11, 30, 0).unwrap()),
            last_failure_at: None,
            failure_count: 0,
            avg_latency_ms: Some(420),
            status: ModelStatus::Healthy,
        }];
        let inputs = ReportInputs {
            window: &window,
            tz: &tz,
            infra: &infra,
            matrix: &rows,
            timeline: &timeline,
            cron: &[],
        };
        let report = render(&inputs, &Redactor::new(["google-gemini-cli".to_string()]));
        assert!(report.contains("| Provider"));
        assert!(report.contains("google-gemini-cli"));
        assert!(report.contains("🟢 健康"));
        assert!(report.contains("420ms"));
    }

    #[test]
    fn test_final_sweep_catches_late_secrets() {
        // A credential smuggled into a row must not survive rendering.
        let tz = TimeNormalizer::resolve(Some("UTC"));
        let window = window();
        let infra = InfraSummary::default();
        let timeline = Timeline::default();
        let rows = vec![ModelStatusRow {
            model: "sk-abcdef1234567890abcdef".to_string(),
            provider: "unknown".to_string(),
            last_success_at: None,
            last_failure_at: None,
            failure_count: 0,
            avg_latency_ms: None,
            status: ModelStatus::Unknown,
        }];
        let inputs = ReportInputs {
            window: &window,
            tz: &tz,
            infra: &infra,
            matrix: &rows,
            timeline: &timeline,
            cron: &[],
        };
        let report = render(&inputs, &Redactor::default());
        assert!(!report.contains("sk-abcdef"));
        assert!(report.contains("[REDACTED:api-key]"));
    }
}
